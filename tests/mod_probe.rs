mod common;

use bson::doc;
use std::collections::HashMap;
use telemetry_gateway::GatewayConfig;
use telemetry_gateway::probe::probe_field_keys;
use telemetry_gateway::store::{MemoryServer, MemoryTransport, Transport};

fn database(server: &MemoryServer) -> Box<dyn telemetry_gateway::store::Database> {
    let t = MemoryTransport::new();
    t.register("mem://probe", server.clone());
    t.open("mem://probe").unwrap().database("db").unwrap()
}

#[test]
fn nested_keys_expand_one_level() {
    let server = MemoryServer::new();
    server.insert("db", "c", doc! { "a": 1, "b": { "c": 2, "d": 3 } });
    let keys = probe_field_keys(database(&server).as_ref(), "c", 0).unwrap();
    assert_eq!(keys, vec!["a", "b.c", "b.d"]);
}

#[test]
fn id_is_projected_out_and_deeper_levels_are_not_expanded() {
    let server = MemoryServer::new();
    server.insert("db", "c", doc! { "_id": 7, "x": { "y": { "z": 1 } }, "t": "s" });
    let keys = probe_field_keys(database(&server).as_ref(), "c", 0).unwrap();
    assert_eq!(keys, vec!["x.y", "t"]);
}

#[test]
fn skip_selects_the_sampled_document() {
    let server = MemoryServer::new();
    server.insert_many("db", "c", [doc! { "first": 1 }, doc! { "second": 1 }]);
    let db = database(&server);
    assert_eq!(probe_field_keys(db.as_ref(), "c", 1).unwrap(), vec!["second"]);
    assert!(probe_field_keys(db.as_ref(), "c", 2).unwrap().is_empty());
    assert!(probe_field_keys(db.as_ref(), "missing", 0).unwrap().is_empty());
    assert!(probe_field_keys(db.as_ref(), "", 0).is_err());
}

#[test]
fn gateway_uses_configured_probe_skip() {
    let server = common::seeded_server();
    server.insert_many(
        common::DB,
        "tech_performance",
        (0..8).map(|i| if i == 6 { doc! { "frame": i, "gpu": { "ms": 4.0 } } } else { doc! { "frame": i } }),
    );
    let mut cfg = GatewayConfig::default();
    cfg.probe_skip = HashMap::from([("tech_performance".to_string(), 6)]);
    let (gw, _) = common::gateway_with(cfg, &server);
    assert_eq!(gw.list_field_keys("tech_performance").unwrap(), vec!["frame", "gpu.ms"]);
    // other collections sample the first document
    assert_eq!(gw.list_field_keys("tick").unwrap(), vec!["tick", "score", "session_id", "params.level_key", "params.position"]);
}

#[test]
fn array_keys_expand_to_indices_and_resolve_on_fetch() {
    let server = common::seeded_server();
    server.insert(common::DB, "combat", doc! { "a": 1, "hits": [10, 20], "none": [] });
    let (gw, _) = common::gateway_with(GatewayConfig::default(), &server);
    let keys = gw.list_field_keys("combat").unwrap();
    assert_eq!(keys, vec!["a", "hits.0", "hits.1"]);

    let set = gw.fetch_documents("combat", &keys, &telemetry_gateway::FetchOptions::default()).unwrap();
    assert_eq!(set.to_json(), serde_json::json!({ "a": [1.0], "hits.0": [10.0], "hits.1": [20.0] }));
}
