use serde::Serialize;
use std::collections::BTreeMap;

use crate::model::types::{RelType, Zone};

/// Everything a visualisation needs: ready to be serialised as-is.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct GraphData {
    /// Servers in discovery order, then synthetic peer servers, then
    /// external endpoints, the latter two sorted by id.
    pub nodes: Vec<Node>,
    /// In order of first appearance.
    pub links: Vec<Link>,
    pub zones: Vec<ZoneSummary>,
    /// Server names, in discovery order.
    pub servers: Vec<String>,
}

impl GraphData {
    /// The node of a server, real or synthetic.
    pub fn server_node(&self, name: &str) -> Option<&ServerNode> {
        self.nodes.iter().find_map(|node| match node {
            Node::Server(server) if server.id == name => Some(server),
            _ => None,
        })
    }

    pub fn external_nodes(&self) -> impl Iterator<Item = &ExternalNode> {
        self.nodes.iter().filter_map(|node| match node {
            Node::External(external) => Some(external),
            Node::Server(_) => None,
        })
    }

    pub fn links_of_type(&self, rel_type: RelType) -> impl Iterator<Item = &Link> {
        self.links.iter().filter(move |link| link.rel_type == rel_type)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Node {
    Server(ServerNode),
    External(ExternalNode),
}

impl Node {
    pub fn id(&self) -> &str {
        match self {
            Node::Server(server) => &server.id,
            Node::External(external) => &external.id,
        }
    }
}

/// A server, either one which was parsed or one only known from a
/// view's `server` statement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ServerNode {
    pub id: String,
    pub role: Role,
    pub zone_count: usize,
    /// Keyed by normalised type.
    pub zone_counts: BTreeMap<String, usize>,
    pub zones: Vec<ZoneSummary>,
    pub listen_on: Vec<String>,
}

/// An address which appears in a relationship but could not be
/// resolved to any server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExternalNode {
    pub id: String,
    pub zone_count: usize,
    pub zones: Vec<ZoneSummary>,
}

impl ExternalNode {
    pub fn new(id: &str) -> Self {
        Self {
            id: id.to_string(),
            zone_count: 0,
            zones: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Master,
    Slave,
    /// Both master and slave zones.
    Mixed,
    /// No zones, or only other types.
    Other,
}

impl Role {
    pub fn of_zones(zones: &[Zone]) -> Self {
        let has_master = zones.iter().any(Zone::is_master);
        let has_slave = zones.iter().any(Zone::is_slave);
        match (has_master, has_slave) {
            (true, true) => Role::Mixed,
            (true, false) => Role::Master,
            (false, true) => Role::Slave,
            (false, false) => Role::Other,
        }
    }
}

/// All the relationships sharing a source, target, and type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Link {
    pub source: String,
    pub target: String,
    pub rel_type: RelType,
    /// One entry per contributing relationship, in order.
    pub zones: Vec<String>,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ZoneSummary {
    pub name: String,
    /// The raw type.
    #[serde(rename = "type")]
    pub zone_type: String,
    pub server: String,
    pub view: Option<String>,
}

impl From<&Zone> for ZoneSummary {
    fn from(zone: &Zone) -> Self {
        Self {
            name: zone.name.clone(),
            zone_type: zone.zone_type.clone(),
            server: zone.server_name.clone(),
            view: zone.view.clone(),
        }
    }
}
