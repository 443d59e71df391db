use std::collections::{BTreeMap, BTreeSet, HashMap};

use named_types::model::graph::*;
use named_types::model::types::{RelType, ServerConfig};

use crate::relationships::{self, AddressIndex};

/// Build the graph of a set of servers.
///
/// Nodes are, in order:
///
/// - the servers themselves, in the order given
/// - addresses from views' `server` statements which are not any known
///   server, as slave servers, sorted
/// - every other relationship endpoint which is not a known server, as
///   external nodes, sorted
///
/// Relationships with the same source, target, and type are merged
/// into a single link.
pub fn build(servers: &[ServerConfig]) -> GraphData {
    let relationships = relationships::resolve(servers);
    let index = AddressIndex::new(servers);

    let mut view_servers = BTreeSet::new();
    for server in servers {
        for address in server.view_server_ips.iter().flat_map(|v| &v.addresses) {
            let resolved = index.resolve_address(address);
            if !index.is_server(resolved) {
                view_servers.insert(resolved);
            }
        }
    }

    let external: BTreeSet<&str> = relationships
        .iter()
        .flat_map(|r| [r.source.as_str(), r.target.as_str()])
        .filter(|id| !index.is_server(id) && !view_servers.contains(id))
        .collect();

    let mut nodes: Vec<Node> = servers.iter().map(|s| Node::Server(server_node(s))).collect();
    nodes.extend(view_servers.iter().map(|id| Node::Server(view_server_node(id))));
    nodes.extend(external.iter().map(|id| Node::External(ExternalNode::new(id))));

    let mut links: Vec<Link> = Vec::new();
    let mut positions: HashMap<(&str, &str, RelType), usize> = HashMap::new();
    for relationship in &relationships {
        let key = (
            relationship.source.as_str(),
            relationship.target.as_str(),
            relationship.rel_type,
        );
        let i = *positions.entry(key).or_insert_with(|| {
            links.push(Link {
                source: relationship.source.clone(),
                target: relationship.target.clone(),
                rel_type: relationship.rel_type,
                zones: Vec::new(),
                count: 0,
            });
            links.len() - 1
        });
        links[i].zones.push(relationship.zone_name.clone());
        links[i].count += 1;
    }

    tracing::debug!(
        nodes = nodes.len(),
        links = links.len(),
        external = external.len(),
        "built graph"
    );

    GraphData {
        nodes,
        links,
        zones: servers
            .iter()
            .flat_map(|s| s.zones.iter().map(ZoneSummary::from))
            .collect(),
        servers: servers.iter().map(|s| s.name.clone()).collect(),
    }
}

fn server_node(server: &ServerConfig) -> ServerNode {
    let mut zone_counts = BTreeMap::new();
    for zone in &server.zones {
        *zone_counts
            .entry(zone.normalised_type().to_string())
            .or_insert(0) += 1;
    }

    ServerNode {
        id: server.name.clone(),
        role: Role::of_zones(&server.zones),
        zone_count: server.zones.len(),
        zone_counts,
        zones: server.zones.iter().map(ZoneSummary::from).collect(),
        listen_on: server.listen_on.clone(),
    }
}

/// A server only known by the address a view's `server` statement
/// gives for it.
fn view_server_node(address: &str) -> ServerNode {
    ServerNode {
        id: address.to_string(),
        role: Role::Slave,
        zone_count: 0,
        zone_counts: BTreeMap::new(),
        zones: Vec::new(),
        listen_on: vec![address.to_string()],
    }
}
