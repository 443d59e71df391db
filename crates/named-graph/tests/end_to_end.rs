use std::fs;
use std::path::Path;
use tempfile::TempDir;

use named_graph::query::{filter_zones, ZoneFilter};
use named_graph::{extract_all, graph, parse_and_extract, Error};
use named_types::diagnostics::Level;
use named_types::model::graph::{Node, Role};
use named_types::model::types::RelType;

#[test]
fn two_servers_master_and_slave() {
    let dir = TempDir::new().unwrap();
    write(
        dir.path(),
        "server1/named.conf",
        r#"
        options { listen-on { 10.0.0.1; }; };
        zone "example.com" { type master; file "x"; also-notify { 10.0.0.2; }; };
        "#,
    );
    write(
        dir.path(),
        "server2/named.conf",
        r#"
        options { listen-on { 10.0.0.2; }; };
        zone "example.com" { type slave; masters { 10.0.0.1; }; };
        "#,
    );

    let extraction = extract_all(dir.path()).unwrap();
    assert!(extraction.failures.is_empty());

    let graph = graph::build(&extraction.servers);

    assert_eq!(vec!["server1", "server2"], graph.servers);
    assert_eq!(
        2,
        graph
            .nodes
            .iter()
            .filter(|n| matches!(n, Node::Server(_)))
            .count()
    );
    assert_eq!(0, graph.external_nodes().count());

    let master_slave: Vec<_> = graph.links_of_type(RelType::MasterSlave).collect();
    assert_eq!(1, master_slave.len());
    assert_eq!("server1", master_slave[0].source);
    assert_eq!("server2", master_slave[0].target);

    let also_notify: Vec<_> = graph.links_of_type(RelType::AlsoNotify).collect();
    assert_eq!(1, also_notify.len());
    assert_eq!("server1", also_notify[0].source);
    assert_eq!("server2", also_notify[0].target);

    assert_eq!(2, graph.links.len());
    assert_eq!(Role::Master, graph.server_node("server1").unwrap().role);
    assert_eq!(Role::Slave, graph.server_node("server2").unwrap().role);

    assert_eq!(
        vec!["[server1] Parsed 1 zone(s)", "[server2] Parsed 1 zone(s)"],
        extraction.diagnostics.messages()
    );
}

#[test]
fn broken_server_does_not_block_the_others() {
    let dir = TempDir::new().unwrap();
    write(
        dir.path(),
        "a/named.conf",
        r#"zone "example.com" { type master; also-notify { 192.0.2.1; }; };"#,
    );
    write(dir.path(), "b/named.conf", r#"zone "broken" { type slave;"#);
    write(
        dir.path(),
        "c/named.conf",
        r#"zone "example.com" { type slave; masters { 10.9.9.9; }; };"#,
    );

    let extraction = extract_all(dir.path()).unwrap();

    assert_eq!(
        vec!["a", "c"],
        extraction
            .servers
            .iter()
            .map(|s| s.name.as_str())
            .collect::<Vec<_>>()
    );
    assert_eq!(1, extraction.failures.len());
    assert_eq!("b", extraction.failures[0].server);
    assert!(matches!(
        extraction.failures[0].error,
        Error::Parse { .. }
    ));
    assert!(extraction
        .diagnostics
        .iter()
        .any(|d| d.level == Level::Warn && d.message.starts_with("[b] Failed to parse: ")));

    let graph = graph::build(&extraction.servers);
    let master_slave: Vec<_> = graph.links_of_type(RelType::MasterSlave).collect();
    assert_eq!(1, master_slave.len());
    assert_eq!("a", master_slave[0].source);
    assert_eq!("c", master_slave[0].target);
    assert_eq!(
        vec!["192.0.2.1"],
        graph
            .external_nodes()
            .map(|n| n.id.as_str())
            .collect::<Vec<_>>()
    );
}

#[test]
fn flat_files_with_includes_and_views() {
    let dir = TempDir::new().unwrap();
    write(
        dir.path(),
        "ns1.conf",
        r#"
        include "/etc/bind/ns1-options.conf";
        logging { channel x { syslog; }; };
        view "internal" {
            server 10.0.0.50;
            also-notify { 10.0.0.2; };
            zone "int.example.com" { type master; };
        };
        "#,
    );
    write(
        dir.path(),
        "shared/ns1-options.conf",
        "options { listen-on { 10.0.0.1; }; };\n",
    );
    write(
        dir.path(),
        "ns2.conf",
        r#"
        options { listen-on port 53 { 10.0.0.2; }; };
        view "internal" { zone "int.example.com" { type secondary; masters { 10.0.0.1; }; }; };
        "#,
    );

    let extraction = extract_all(dir.path()).unwrap();
    assert!(extraction.failures.is_empty());

    let messages = extraction.diagnostics.messages();
    assert!(messages.contains(&"[ns1] Resolved include: /etc/bind/ns1-options.conf"));
    assert!(messages.contains(&"[ns1] Irrelevant statement skipped: logging"));

    let ns1 = &extraction.servers[0];
    assert_eq!(vec!["10.0.0.1"], ns1.listen_on);
    assert_eq!(vec!["10.0.0.2"], ns1.zones[0].also_notify);
    assert_eq!(Some("internal".to_string()), ns1.zones[0].view);

    let graph = graph::build(&extraction.servers);
    assert_eq!(
        vec!["ns1", "ns2", "10.0.0.50"],
        graph.nodes.iter().map(Node::id).collect::<Vec<_>>()
    );
    assert_eq!(1, graph.links_of_type(RelType::MasterSlave).count());
    assert_eq!(1, graph.links_of_type(RelType::AlsoNotify).count());
    assert_eq!(1, graph.links_of_type(RelType::Peer).count());

    let slaves = filter_zones(
        &graph.zones,
        &ZoneFilter {
            zone_type: Some("secondary".to_string()),
            ..ZoneFilter::default()
        },
    );
    assert_eq!(1, slaves.len());
    assert_eq!("ns2", slaves[0].server);
}

#[test]
fn tsig_keys_are_not_endpoints() {
    let dir = TempDir::new().unwrap();
    write(
        dir.path(),
        "ns1.conf",
        r#"zone "a" { type master; allow-transfer { key "xfer"; }; also-notify { key "n"; }; };"#,
    );

    let extraction = extract_all(dir.path()).unwrap();
    let graph = graph::build(&extraction.servers);

    assert!(extraction.servers[0].zones[0].allow_transfer.is_empty());
    assert!(extraction.servers[0].zones[0].also_notify.is_empty());
    assert_eq!(vec!["ns1"], graph.nodes.iter().map(Node::id).collect::<Vec<_>>());
    assert!(graph.links.is_empty());
}

#[test]
fn circular_include_completes() {
    let dir = TempDir::new().unwrap();
    write(
        dir.path(),
        "ns1/named.conf",
        "include \"a.conf\";\nzone \"top\" { type master; };\n",
    );
    write(
        dir.path(),
        "ns1/a.conf",
        "include \"named.conf\";\nzone \"a\" { type master; };\n",
    );

    let extraction = extract_all(dir.path()).unwrap();

    assert_eq!(2, extraction.servers[0].zones.len());
    assert_eq!(
        1,
        extraction
            .diagnostics
            .messages()
            .iter()
            .filter(|m| m.contains("Circular include skipped"))
            .count()
    );
}

#[test]
fn single_file_mode() {
    let dir = TempDir::new().unwrap();
    write(
        dir.path(),
        "primary.conf",
        r#"zone "example.com" { type master; };"#,
    );

    let (server, diagnostics) = parse_and_extract(
        "primary",
        &dir.path().join("primary.conf"),
        dir.path(),
    )
    .unwrap();
    assert_eq!("primary", server.name);
    assert!(diagnostics.is_empty());

    let extraction = extract_all(&dir.path().join("primary.conf")).unwrap();
    assert_eq!(1, extraction.servers.len());
    assert_eq!("primary", extraction.servers[0].name);
}

#[test]
fn graph_serialises_for_collaborators() {
    let dir = TempDir::new().unwrap();
    write(
        dir.path(),
        "ns1.conf",
        r#"zone "example.com" { type primary; allow-transfer { 192.0.2.9; }; };"#,
    );

    let extraction = extract_all(dir.path()).unwrap();
    let json = serde_json::to_value(graph::build(&extraction.servers)).unwrap();

    assert_eq!("server", json["nodes"][0]["type"]);
    assert_eq!("master", json["nodes"][0]["role"]);
    assert_eq!(1, json["nodes"][0]["zone_counts"]["master"]);
    assert_eq!("external", json["nodes"][1]["type"]);
    assert_eq!("allow_transfer", json["links"][0]["rel_type"]);
    assert_eq!("primary", json["zones"][0]["type"]);
    assert_eq!(serde_json::Value::Null, json["zones"][0]["view"]);
}

#[test]
fn missing_path() {
    let dir = TempDir::new().unwrap();

    assert!(matches!(
        extract_all(&dir.path().join("nope")),
        Err(Error::NotFound { .. })
    ));
}

fn write(root: &Path, name: &str, contents: &str) {
    let path = root.join(name);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(path, contents).unwrap();
}
