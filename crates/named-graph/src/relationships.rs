use std::collections::{HashMap, HashSet};

use named_types::model::types::{is_special_address, RelType, Relationship, ServerConfig, Zone};

/// Work out how a set of servers relate to each other.
///
/// Addresses are mapped back to server names where possible (see
/// `AddressIndex::resolve_address`); any which cannot be are kept
/// as-is, and show up as external nodes in the graph.  Relationships
/// from a server to itself are dropped.
pub fn resolve(servers: &[ServerConfig]) -> Vec<Relationship> {
    let index = AddressIndex::new(servers);
    let mut relationships = Vec::new();

    for server in servers {
        for zone in &server.zones {
            let edge =
                |address: &str, rel_type| from_server(&index, server, zone, address, rel_type);

            if zone.is_slave() {
                master_slave(&index, server, zone, &mut relationships);
            }

            if zone.is_master() {
                for address in or_global(&zone.also_notify, &server.global_also_notify) {
                    relationships.push(edge(address, RelType::AlsoNotify));
                }
                for address in or_global(&zone.allow_transfer, &server.global_allow_transfer)
                    .iter()
                    .filter(|a| !is_special_address(a))
                {
                    relationships.push(edge(address, RelType::AllowTransfer));
                }
            }

            if zone.is_forward() {
                for address in or_global(&zone.forwarders, &server.global_forwarders) {
                    relationships.push(edge(address, RelType::Forward));
                }
            }
        }
    }

    for server in servers {
        for view in &server.view_server_ips {
            for address in &view.addresses {
                relationships.push(Relationship {
                    source: server.name.clone(),
                    target: index.resolve_address(address).to_string(),
                    rel_type: RelType::Peer,
                    zone_name: String::new(),
                    view_name: view.view.clone(),
                });
            }
        }
    }

    relationships.retain(|r| r.source != r.target);

    tracing::debug!(count = relationships.len(), "resolved relationships");
    relationships
}

/// An edge from the master of a slave zone to the slave.
///
/// If some server has a master zone of the same name, that is the
/// master, whatever the slave's `masters` list says.  Otherwise there
/// is an edge from each distinct server (or unresolved address) in the
/// `masters` list.
fn master_slave(
    index: &AddressIndex,
    server: &ServerConfig,
    zone: &Zone,
    relationships: &mut Vec<Relationship>,
) {
    let sources = if let Some(master) = index.master_zones.get(zone.name.as_str()) {
        vec![*master]
    } else {
        let mut seen = HashSet::new();
        zone.masters
            .iter()
            .map(|address| index.resolve_address(address))
            .filter(|source| seen.insert(*source))
            .collect()
    };

    for source in sources {
        relationships.push(Relationship {
            source: source.to_string(),
            target: server.name.clone(),
            rel_type: RelType::MasterSlave,
            zone_name: zone.name.clone(),
            view_name: zone.view.clone().unwrap_or_default(),
        });
    }
}

fn from_server(
    index: &AddressIndex,
    server: &ServerConfig,
    zone: &Zone,
    address: &str,
    rel_type: RelType,
) -> Relationship {
    Relationship {
        source: server.name.clone(),
        target: index.resolve_address(address).to_string(),
        rel_type,
        zone_name: zone.name.clone(),
        view_name: zone.view.clone().unwrap_or_default(),
    }
}

fn or_global<'a>(own: &'a [String], global: &'a [String]) -> &'a [String] {
    if own.is_empty() {
        global
    } else {
        own
    }
}

/// Lookup tables for turning addresses into server names.  Where two
/// servers claim the same zone or address, the first one wins.
pub(crate) struct AddressIndex<'a> {
    server_names: HashSet<&'a str>,
    /// Zone name to the server with a master zone of that name.
    master_zones: HashMap<&'a str, &'a str>,
    /// Listen address to server.
    ip_to_server: HashMap<&'a str, &'a str>,
}

impl<'a> AddressIndex<'a> {
    pub(crate) fn new(servers: &'a [ServerConfig]) -> Self {
        let mut index = Self {
            server_names: HashSet::new(),
            master_zones: HashMap::new(),
            ip_to_server: HashMap::new(),
        };

        for server in servers {
            index.server_names.insert(&server.name);
            for zone in server.zones.iter().filter(|z| z.is_master()) {
                index.master_zones.entry(&zone.name).or_insert(&server.name);
            }
            for address in &server.listen_on {
                index.ip_to_server.entry(address).or_insert(&server.name);
            }
        }

        index
    }

    /// A server name is returned unchanged, as is an address no server
    /// listens on.
    pub(crate) fn resolve_address<'b>(&self, address: &'b str) -> &'b str
    where
        'a: 'b,
    {
        if self.server_names.contains(address) {
            address
        } else if let Some(&server) = self.ip_to_server.get(address) {
            server
        } else {
            address
        }
    }

    pub(crate) fn is_server(&self, name: &str) -> bool {
        self.server_names.contains(name)
    }
}
