use clap::{Parser, ValueEnum};
use serde::Serialize;
use std::path::PathBuf;
use std::process;
use tracing_subscriber::filter::{EnvFilter, LevelFilter};

use named_graph::query::{filter_zones, ZoneFilter};
use named_graph::{extract_all, graph, Extraction};
use named_types::diagnostics::Diagnostics;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Output {
    /// Nodes, links, zones, and servers
    Graph,
    /// Zone summaries, optionally filtered
    Zones,
    /// Everything extracted about one server
    Server,
    /// Server names, graph size, and every diagnostic
    Servers,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum LogFormat {
    Plain,
    Json,
}

// the doc comments for this struct turn into the CLI help text
#[derive(Debug, Parser)]
/// Read a set of BIND `named.conf` files, one per server, and work out
/// how the servers relate to each other: which are masters and slaves
/// of which zones, which notify or allow transfers to which, and which
/// forward to which.
///
/// The path can be a single config file, a directory with one
/// subdirectory per server (each containing a `named.conf` or
/// `named.conf.local`), or a directory of `*.conf` files.
///
/// The result is printed to stdout as JSON.  Logs go to stderr.
struct Args {
    /// Config file or directory
    path: PathBuf,

    /// What to print
    #[clap(short, long, value_enum, env = "NAMEDVIZ_OUTPUT", default_value_t = Output::Graph)]
    output: Output,

    /// Only print zones on this server (with `--output zones`)
    #[clap(long)]
    server: Option<String>,

    /// Only print zones of this type, exactly as written (with `--output zones`)
    #[clap(long = "type")]
    zone_type: Option<String>,

    /// Only print zones whose name contains this, ignoring case (with `--output zones`)
    #[clap(long)]
    name: Option<String>,

    /// Server to print (with `--output server`)
    #[clap(long, required_if_eq("output", "server"))]
    server_name: Option<String>,

    /// Format of the logs on stderr
    #[clap(long, value_enum, env = "NAMEDVIZ_LOG_FORMAT", default_value_t = LogFormat::Plain)]
    log_format: LogFormat,

    /// Indent the JSON output
    #[clap(long)]
    pretty: bool,
}

/// What `--output servers` prints.
#[derive(Debug, Serialize)]
struct Summary<'a> {
    servers: &'a [String],
    node_count: usize,
    link_count: usize,
    failed: Vec<&'a str>,
    logs: &'a Diagnostics,
}

fn main() {
    let args = Args::parse();

    init_tracing(args.log_format);

    let extraction = match extract_all(&args.path) {
        Ok(extraction) => extraction,
        Err(error) => {
            tracing::error!(%error, "could not load configuration");
            process::exit(1);
        }
    };

    if let Err(error) = print_output(&args, &extraction) {
        tracing::error!(%error, "could not write output");
        process::exit(1);
    }
}

fn print_output(args: &Args, extraction: &Extraction) -> Result<(), serde_json::Error> {
    match args.output {
        Output::Graph => print_json(&graph::build(&extraction.servers), args.pretty),
        Output::Zones => {
            let filter = ZoneFilter {
                server: args.server.clone(),
                zone_type: args.zone_type.clone(),
                name: args.name.clone(),
            };
            let graph = graph::build(&extraction.servers);
            print_json(&filter_zones(&graph.zones, &filter), args.pretty)
        }
        Output::Server => {
            let name = args.server_name.as_deref().unwrap_or_default();
            if let Some(server) = extraction.servers.iter().find(|s| s.name == name) {
                print_json(server, args.pretty)
            } else {
                tracing::error!(server = %name, "server not found");
                process::exit(1);
            }
        }
        Output::Servers => {
            let graph = graph::build(&extraction.servers);
            let summary = Summary {
                servers: &graph.servers,
                node_count: graph.nodes.len(),
                link_count: graph.links.len(),
                failed: extraction
                    .failures
                    .iter()
                    .map(|f| f.server.as_str())
                    .collect(),
                logs: &extraction.diagnostics,
            };
            print_json(&summary, args.pretty)
        }
    }
}

fn print_json<T: Serialize + ?Sized>(value: &T, pretty: bool) -> Result<(), serde_json::Error> {
    let rendered = if pretty {
        serde_json::to_string_pretty(value)?
    } else {
        serde_json::to_string(value)?
    };
    println!("{rendered}");
    Ok(())
}

fn init_tracing(format: LogFormat) {
    let filter = EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy();
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);

    match format {
        LogFormat::Plain => subscriber.init(),
        LogFormat::Json => subscriber.json().init(),
    }
}
