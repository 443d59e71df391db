use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;

/// Literals which can appear in an address list but never name a
/// server.
pub const SPECIAL_ADDRESSES: [&str; 3] = ["any", "none", "localhost"];

/// Whether an address-list entry is one of `any`, `none`, or
/// `localhost`.
pub fn is_special_address(address: &str) -> bool {
    SPECIAL_ADDRESSES.contains(&address)
}

/// A zone, as configured on one server.
///
/// The type is stored exactly as written (`primary` is not rewritten
/// to `master`), so it can be shown to the user as-is.  Use
/// `normalised_type` when classifying.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Zone {
    pub name: String,
    /// Empty if the zone has no `type` statement.
    pub zone_type: String,
    pub server_name: String,
    pub view: Option<String>,
    pub masters: Vec<String>,
    pub forwarders: Vec<String>,
    pub allow_transfer: Vec<String>,
    pub also_notify: Vec<String>,
    /// Informational only: zone files are never read.
    pub file: Option<String>,
}

impl Zone {
    pub fn new(name: &str, zone_type: &str, server_name: &str) -> Self {
        Self {
            name: name.to_string(),
            zone_type: zone_type.to_string(),
            server_name: server_name.to_string(),
            ..Self::default()
        }
    }

    /// The type with `primary` and `secondary` replaced by their older
    /// names.
    pub fn normalised_type(&self) -> &str {
        match self.zone_type.as_str() {
            "primary" => "master",
            "secondary" => "slave",
            other => other,
        }
    }

    pub fn is_master(&self) -> bool {
        self.normalised_type() == "master"
    }

    pub fn is_slave(&self) -> bool {
        self.normalised_type() == "slave"
    }

    pub fn is_forward(&self) -> bool {
        self.zone_type == "forward"
    }
}

/// Everything about one server which matters for working out how it
/// relates to other servers.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ServerConfig {
    pub name: String,
    /// In parse order.
    pub zones: Vec<Zone>,
    /// `listen-on` and `listen-on-v6` addresses, without `any`, `none`,
    /// or `localhost`.
    pub listen_on: Vec<String>,
    /// ACL name to literal entries.  References to other ACLs are not
    /// expanded.
    pub acls: BTreeMap<String, Vec<String>>,
    pub global_forwarders: Vec<String>,
    pub global_also_notify: Vec<String>,
    pub global_allow_transfer: Vec<String>,
    /// One entry per view name, in the order views are first declared.
    pub view_server_ips: Vec<ViewServers>,
}

impl ServerConfig {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            ..Self::default()
        }
    }

    /// The `server` addresses of a view, if it has any.
    pub fn view_servers(&self, view: &str) -> Option<&[String]> {
        self.view_server_ips
            .iter()
            .find(|v| v.view == view)
            .map(|v| v.addresses.as_slice())
    }

    /// Add `server` addresses to a view, after any it already has.
    pub fn add_view_servers<I: IntoIterator<Item = String>>(&mut self, view: &str, addresses: I) {
        if let Some(existing) = self.view_server_ips.iter_mut().find(|v| v.view == view) {
            existing.addresses.extend(addresses);
        } else {
            self.view_server_ips.push(ViewServers {
                view: view.to_string(),
                addresses: addresses.into_iter().collect(),
            });
        }
    }
}

/// The addresses of one view's `server` statements, in order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ViewServers {
    pub view: String,
    pub addresses: Vec<String>,
}

/// A directed edge between two servers, or between a server and an
/// address which could not be resolved to one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Relationship {
    pub source: String,
    pub target: String,
    pub rel_type: RelType,
    /// Empty for `peer` edges, which belong to a view, not a zone.
    pub zone_name: String,
    /// Empty for zones outside any view.
    pub view_name: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RelType {
    /// From the master of a zone to a slave of it.
    MasterSlave,
    AlsoNotify,
    AllowTransfer,
    Forward,
    /// From a server to a `server` declared in one of its views.
    Peer,
}

impl fmt::Display for RelType {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            RelType::MasterSlave => write!(f, "master_slave"),
            RelType::AlsoNotify => write!(f, "also_notify"),
            RelType::AllowTransfer => write!(f, "allow_transfer"),
            RelType::Forward => write!(f, "forward"),
            RelType::Peer => write!(f, "peer"),
        }
    }
}
