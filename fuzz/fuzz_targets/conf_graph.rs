#![no_main]
use libfuzzer_sys::fuzz_target;

use named_graph::{extract, graph};
use named_types::conf::types::Config;
use named_types::diagnostics::Diagnostics;

fuzz_target!(|data: &str| {
    let mut diagnostics = Diagnostics::new();
    if let Ok(config) = Config::deserialise(data, &mut diagnostics) {
        let a = extract::extract_server_config("a", &config);
        let b = extract::extract_server_config("b", &config);
        let graph = graph::build(&[a, b]);
        for link in &graph.links {
            assert_ne!(link.source, link.target);
            assert_eq!(link.count, link.zones.len());
        }
    }
});
