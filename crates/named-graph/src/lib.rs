#![warn(clippy::pedantic)]
// Don't care enough to fix
#![allow(clippy::match_same_arms)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::too_many_lines)]
#![allow(clippy::wildcard_imports)]

pub mod discovery;
pub mod error;
pub mod extract;
pub mod graph;
pub mod include;
pub mod query;
pub mod relationships;

use std::path::Path;

use named_types::conf::types::Config;
use named_types::diagnostics::Diagnostics;
use named_types::model::types::ServerConfig;

pub use self::error::Error;

/// Read a config file, inline its includes, and parse it.
///
/// `root_dir` is where includes which cannot be found relative to the
/// including file are searched for: normally the directory which was
/// given to discovery.
///
/// # Errors
///
/// If the file cannot be read, or is structurally broken.
pub fn parse(file_path: &Path, root_dir: &Path) -> Result<(Config, Diagnostics), Error> {
    let mut diagnostics = Diagnostics::new();
    let config = parse_into(file_path, root_dir, &mut diagnostics)?;
    Ok((config, diagnostics))
}

/// Parse one server's config file, and extract the parts of it which
/// relate it to other servers.
///
/// # Errors
///
/// As `parse`.
pub fn parse_and_extract(
    server_name: &str,
    file_path: &Path,
    root_dir: &Path,
) -> Result<(ServerConfig, Diagnostics), Error> {
    let (config, diagnostics) = parse(file_path, root_dir)?;
    Ok((
        extract::extract_server_config(server_name, &config),
        diagnostics,
    ))
}

fn parse_into(
    file_path: &Path,
    root_dir: &Path,
    diagnostics: &mut Diagnostics,
) -> Result<Config, Error> {
    let text =
        include::resolve_includes(file_path, root_dir, diagnostics).map_err(|error| Error::Io {
            path: file_path.to_path_buf(),
            error,
        })?;

    Config::deserialise(&text, diagnostics).map_err(|error| Error::Parse {
        path: file_path.to_path_buf(),
        error,
    })
}

/// The result of loading every server under some path.
#[derive(Debug, Default)]
pub struct Extraction {
    /// The servers which loaded, in discovery order.
    pub servers: Vec<ServerConfig>,
    /// Diagnostics of all servers, each prefixed with `[<server>] `.
    pub diagnostics: Diagnostics,
    pub failures: Vec<Failure>,
}

/// A server which could not be loaded.
#[derive(Debug)]
pub struct Failure {
    pub server: String,
    pub error: Error,
}

/// Discover, parse, and extract every server under a path.
///
/// A server which fails to load is recorded in `failures` and skipped:
/// it does not stop the others from loading.
///
/// # Errors
///
/// If discovery fails.
pub fn extract_all(path: &Path) -> Result<Extraction, Error> {
    let root_dir = discovery::root_dir(path);
    let mut extraction = Extraction::default();

    for discovered in discovery::discover(path)? {
        let name = discovered.name;
        let _span = tracing::info_span!("server", %name).entered();

        let mut diagnostics = Diagnostics::new();
        let result = parse_into(&discovered.path, &root_dir, &mut diagnostics);
        extraction.diagnostics.extend(diagnostics.prefixed(&name));

        match result {
            Ok(config) => {
                let server = extract::extract_server_config(&name, &config);
                extraction
                    .diagnostics
                    .info(format!("[{name}] Parsed {} zone(s)", server.zones.len()));
                extraction.servers.push(server);
            }
            Err(error) => {
                extraction
                    .diagnostics
                    .warn(format!("[{name}] Failed to parse: {error}"));
                extraction.failures.push(Failure {
                    server: name,
                    error,
                });
            }
        }
    }

    Ok(extraction)
}
