use serde::Serialize;
use std::fmt;

/// How serious a diagnostic is.  Neither level aborts processing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Level {
    Info,
    Warn,
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Level::Info => write!(f, "info"),
            Level::Warn => write!(f, "warn"),
        }
    }
}

/// A single message produced while loading a configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Diagnostic {
    pub level: Level,
    pub message: String,
}

/// An ordered collection of diagnostics.
///
/// One of these is owned by each top-level parse and passed by
/// mutable reference to every stage which can report something, so
/// there is no shared state between two parses.
///
/// Every recorded message is also emitted as a `tracing` event at the
/// matching level.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Diagnostics {
    entries: Vec<Diagnostic>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn info(&mut self, message: impl Into<String>) {
        let message = message.into();
        tracing::info!(%message, "config diagnostic");
        self.entries.push(Diagnostic {
            level: Level::Info,
            message,
        });
    }

    pub fn warn(&mut self, message: impl Into<String>) {
        let message = message.into();
        tracing::warn!(%message, "config diagnostic");
        self.entries.push(Diagnostic {
            level: Level::Warn,
            message,
        });
    }

    /// Append all of `other`, preserving order.  The entries are not
    /// logged a second time.
    pub fn extend(&mut self, other: Diagnostics) {
        self.entries.extend(other.entries);
    }

    /// Prefix every message with `[<owner>] `, the convention for
    /// attributing diagnostics to a server.
    pub fn prefixed(self, owner: &str) -> Self {
        Self {
            entries: self
                .entries
                .into_iter()
                .map(|d| Diagnostic {
                    level: d.level,
                    message: format!("[{owner}] {}", d.message),
                })
                .collect(),
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &Diagnostic> {
        self.entries.iter()
    }

    pub fn warnings(&self) -> impl Iterator<Item = &Diagnostic> {
        self.entries.iter().filter(|d| d.level == Level::Warn)
    }

    /// Messages only, in order.  Mostly useful for tests.
    pub fn messages(&self) -> Vec<&str> {
        self.entries.iter().map(|d| d.message.as_str()).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
