/// A parsed `named.conf`: the top-level statements in source order.
///
/// Only the directives which say something about how servers relate
/// to each other are kept in any detail.  Everything else becomes an
/// `Unknown` statement, recording only its keyword.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Config {
    pub statements: Vec<Statement>,
}

impl Config {
    pub fn zones(&self) -> impl Iterator<Item = &ZoneBlock> {
        self.statements.iter().filter_map(|s| match s {
            Statement::Zone(zone) => Some(zone),
            _ => None,
        })
    }

    pub fn views(&self) -> impl Iterator<Item = &ViewBlock> {
        self.statements.iter().filter_map(|s| match s {
            Statement::View(view) => Some(view),
            _ => None,
        })
    }

    pub fn unknown_keywords(&self) -> impl Iterator<Item = &str> {
        self.statements.iter().filter_map(|s| match s {
            Statement::Unknown(unknown) => Some(unknown.keyword.as_str()),
            _ => None,
        })
    }
}

/// A top-level statement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Statement {
    Zone(ZoneBlock),
    Options(OptionsBlock),
    Acl(AclBlock),
    View(ViewBlock),
    Include(IncludeDirective),
    Unknown(UnknownStatement),
}

/// ```text
/// zone "<name>" [<class>] { ... };
/// ```
///
/// Address lists are kept as written: IPs, ACL names, or literals
/// like `any`.  If a statement is repeated, the last one wins.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ZoneBlock {
    pub name: String,
    pub class: Option<String>,
    pub zone_type: Option<String>,
    pub file: Option<String>,
    /// `masters` or its alias `primaries`.
    pub masters: Vec<String>,
    pub forwarders: Vec<String>,
    pub also_notify: Vec<String>,
    pub allow_transfer: Vec<String>,
}

/// ```text
/// options { ... };
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OptionsBlock {
    pub forwarders: Vec<String>,
    pub also_notify: Vec<String>,
    pub allow_transfer: Vec<String>,
    pub listen_on: Vec<ListenOn>,
    pub listen_on_v6: Vec<ListenOn>,
}

/// ```text
/// listen-on [port <port>] { <address>; ... };
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListenOn {
    pub port: Option<String>,
    pub addresses: Vec<String>,
}

/// ```text
/// acl "<name>" { <entry>; ... };
/// ```
///
/// Entries are literal and unresolved: an entry naming another ACL is
/// kept as that name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AclBlock {
    pub name: String,
    pub entries: Vec<String>,
}

/// ```text
/// view "<name>" [<class>] { ... };
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ViewBlock {
    pub name: String,
    pub class: Option<String>,
    pub zones: Vec<ZoneBlock>,
    pub also_notify: Vec<String>,
    pub allow_transfer: Vec<String>,
    pub forwarders: Vec<String>,
    /// Addresses from `server <ip> [{ ... }];` statements, in order.
    pub servers: Vec<String>,
}

/// ```text
/// include "<path>";
/// ```
///
/// Includes are normally inlined before parsing, so this only shows up
/// when raw, unresolved text is parsed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IncludeDirective {
    pub path: String,
}

/// Any other top-level statement, such as `logging` or `controls`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownStatement {
    pub keyword: String,
}
