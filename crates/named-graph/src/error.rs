use std::io;
use std::path::PathBuf;

use named_types::conf::deserialise;

/// A failure which stops one server's config from being loaded.
/// Everything less serious is a diagnostic instead.
#[derive(Debug)]
pub enum Error {
    /// The path given to discovery does not exist.
    NotFound { path: PathBuf },
    Io { path: PathBuf, error: io::Error },
    Parse {
        path: PathBuf,
        error: deserialise::Error,
    },
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            Error::NotFound { path } => write!(f, "config path not found: {}", path.display()),
            Error::Io { path, error } => write!(f, "could not read {}: {error}", path.display()),
            Error::Parse { path, error } => write!(f, "could not parse {}: {error}", path.display()),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::NotFound { .. } => None,
            Error::Io { error, .. } => Some(error),
            Error::Parse { error, .. } => Some(error),
        }
    }
}
