use named_types::conf::types::*;
use named_types::model::types::{is_special_address, ServerConfig, Zone};

/// Turn the parse tree of one server's config into a `ServerConfig`.
///
/// A zone with an empty `also-notify`, `allow-transfer`, or
/// `forwarders` list takes the list of the view it is in, if that is
/// non-empty.  The global `options` lists are not applied here: they
/// stay on the `ServerConfig` and are consulted when resolving
/// relationships.
pub fn extract_server_config(name: &str, config: &Config) -> ServerConfig {
    let mut server = ServerConfig::new(name);

    for statement in &config.statements {
        match statement {
            Statement::Zone(block) => {
                if let Some(zone) = extract_zone(name, block, None) {
                    server.zones.push(zone);
                }
            }
            Statement::Options(options) => extract_options(&mut server, options),
            Statement::Acl(acl) => {
                if !acl.name.is_empty() {
                    server.acls.insert(acl.name.clone(), acl.entries.clone());
                }
            }
            Statement::View(view) => extract_view(&mut server, view),
            Statement::Include(_) | Statement::Unknown(_) => (),
        }
    }

    server
}

fn extract_view(server: &mut ServerConfig, view: &ViewBlock) {
    if !view.servers.is_empty() && !view.name.is_empty() {
        server.add_view_servers(&view.name, view.servers.iter().cloned());
    }

    for block in &view.zones {
        if let Some(zone) = extract_zone(&server.name, block, Some(view)) {
            server.zones.push(zone);
        }
    }
}

fn extract_zone(server_name: &str, block: &ZoneBlock, view: Option<&ViewBlock>) -> Option<Zone> {
    if block.name.is_empty() {
        return None;
    }

    Some(Zone {
        name: block.name.clone(),
        zone_type: block.zone_type.clone().unwrap_or_default(),
        server_name: server_name.to_string(),
        view: view.map(|v| v.name.clone()),
        masters: block.masters.clone(),
        forwarders: inherit(&block.forwarders, view.map(|v| v.forwarders.as_slice())),
        allow_transfer: inherit(
            &block.allow_transfer,
            view.map(|v| v.allow_transfer.as_slice()),
        ),
        also_notify: inherit(&block.also_notify, view.map(|v| v.also_notify.as_slice())),
        file: block.file.clone(),
    })
}

/// A zone's own list if it has one, else its view's.
fn inherit(own: &[String], from_view: Option<&[String]>) -> Vec<String> {
    match from_view {
        Some(list) if own.is_empty() => list.to_vec(),
        _ => own.to_vec(),
    }
}

/// Later `options` blocks override earlier ones, but only with
/// non-empty lists.  Listen addresses accumulate.
fn extract_options(server: &mut ServerConfig, options: &OptionsBlock) {
    if !options.forwarders.is_empty() {
        server.global_forwarders.clone_from(&options.forwarders);
    }
    if !options.also_notify.is_empty() {
        server.global_also_notify.clone_from(&options.also_notify);
    }
    if !options.allow_transfer.is_empty() {
        server.global_allow_transfer.clone_from(&options.allow_transfer);
    }

    for listen in options.listen_on.iter().chain(&options.listen_on_v6) {
        server.listen_on.extend(
            listen
                .addresses
                .iter()
                .filter(|address| !is_special_address(address))
                .cloned(),
        );
    }
}
