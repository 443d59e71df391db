use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crate::Error;

/// Names a server directory's top-level config file may have, in order
/// of preference.
pub const SERVER_CONFIG_NAMES: [&str; 2] = ["named.conf", "named.conf.local"];

/// One server's top-level config file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscoveredServer {
    pub name: String,
    pub path: PathBuf,
}

/// Find the servers under a path:
///
/// - if it is a file, it is the only server, named after its stem
/// - otherwise, every immediate subdirectory containing a
///   `named.conf` or `named.conf.local` is a server, named after the
///   directory
/// - if there are no such subdirectories, every `*.conf` file directly
///   inside it is a server, named after its stem
///
/// Entries are considered in lexicographic order.
///
/// # Errors
///
/// If the path does not exist, or if the directory cannot be listed.
pub fn discover(path: &Path) -> Result<Vec<DiscoveredServer>, Error> {
    if !path.exists() {
        return Err(Error::NotFound {
            path: path.to_path_buf(),
        });
    }

    if path.is_file() {
        return Ok(vec![DiscoveredServer {
            name: file_stem(path),
            path: path.to_path_buf(),
        }]);
    }

    let entries = get_entries_from_dir(path).map_err(|error| Error::Io {
        path: path.to_path_buf(),
        error,
    })?;

    let mut servers = Vec::new();
    for entry in entries.iter().filter(|entry| entry.is_dir()) {
        if let Some(config) = SERVER_CONFIG_NAMES
            .iter()
            .map(|name| entry.join(name))
            .find(|candidate| candidate.is_file())
        {
            tracing::debug!(path = ?config, "found server directory");
            servers.push(DiscoveredServer {
                name: file_name(entry),
                path: config,
            });
        }
    }

    if servers.is_empty() {
        for entry in entries
            .iter()
            .filter(|entry| entry.is_file() && entry.extension().is_some_and(|ext| ext == "conf"))
        {
            tracing::debug!(path = ?entry, "found server file");
            servers.push(DiscoveredServer {
                name: file_stem(entry),
                path: entry.clone(),
            });
        }
    }

    Ok(servers)
}

/// The directory includes are resolved against: the path itself, or
/// its parent if it is a file.
pub fn root_dir(path: &Path) -> PathBuf {
    if path.is_file() {
        path.parent().map_or_else(PathBuf::new, Path::to_path_buf)
    } else {
        path.to_path_buf()
    }
}

/// Get entries from a directory, sorted.
fn get_entries_from_dir(dir: &Path) -> io::Result<Vec<PathBuf>> {
    let mut out = Vec::new();
    for entry in fs::read_dir(dir)? {
        out.push(entry?.path());
    }

    out.sort();
    Ok(out)
}

fn file_stem(path: &Path) -> String {
    path.file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_default()
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn discover_missing_path() {
        let dir = TempDir::new().unwrap();
        let missing = dir.path().join("nope");

        assert!(matches!(discover(&missing), Err(Error::NotFound { path }) if path == missing));
    }

    #[test]
    fn discover_single_file() {
        let dir = TempDir::new().unwrap();
        write(&dir, "ns1.conf");

        assert_eq!(
            vec![DiscoveredServer {
                name: "ns1".to_string(),
                path: dir.path().join("ns1.conf"),
            }],
            discover(&dir.path().join("ns1.conf")).unwrap()
        );
    }

    #[test]
    fn discover_subdirectories() {
        let dir = TempDir::new().unwrap();
        write(&dir, "server2/named.conf.local");
        write(&dir, "server1/named.conf");
        write(&dir, "server1/named.conf.local");
        write(&dir, "empty/README");
        write(&dir, "stray.conf");

        assert_eq!(
            vec![
                DiscoveredServer {
                    name: "server1".to_string(),
                    path: dir.path().join("server1/named.conf"),
                },
                DiscoveredServer {
                    name: "server2".to_string(),
                    path: dir.path().join("server2/named.conf.local"),
                },
            ],
            discover(dir.path()).unwrap()
        );
    }

    #[test]
    fn discover_flat_files() {
        let dir = TempDir::new().unwrap();
        write(&dir, "b.conf");
        write(&dir, "a.conf");
        write(&dir, "notes.txt");
        write(&dir, "empty/README");

        assert_eq!(
            vec!["a", "b"],
            discover(dir.path())
                .unwrap()
                .iter()
                .map(|s| s.name.as_str())
                .collect::<Vec<_>>()
        );
    }

    #[test]
    fn discover_nothing() {
        let dir = TempDir::new().unwrap();

        assert!(discover(dir.path()).unwrap().is_empty());
    }

    #[test]
    fn root_dir_of_file_and_dir() {
        let dir = TempDir::new().unwrap();
        write(&dir, "ns1.conf");

        assert_eq!(dir.path(), root_dir(&dir.path().join("ns1.conf")));
        assert_eq!(dir.path(), root_dir(dir.path()));
    }

    fn write(dir: &TempDir, name: &str) {
        let path = dir.path().join(name);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(path, "").unwrap();
    }
}
