mod common;

use bson::doc;
use common::{ADDR, DB, gateway, gateway_with, seeded_server, strings};
use std::sync::Arc;
use telemetry_gateway::store::MemoryTransport;
use telemetry_gateway::utils::devlog;
use telemetry_gateway::{Cell, FetchOptions, Gateway, GatewayConfig, GatewayError};

fn numbers(cells: &[Cell]) -> Vec<f64> {
    cells.iter().map(|c| c.as_f64().unwrap_or(f64::NAN)).collect()
}

#[test]
fn fetch_sorted_by_tick_only() {
    let (gw, _) = gateway();
    let opts = FetchOptions { sort_flags: vec![true, false], ..FetchOptions::default() };
    let set = gw.fetch_documents("tick", &strings(&["tick", "score"]), &opts).unwrap();
    assert_eq!(numbers(set.values("tick").unwrap()), vec![0.0, 1.0, 2.0, 3.0, 4.0, 5.0]);
    assert_eq!(numbers(set.values("score").unwrap()), vec![10.0, 9.0, 8.0, 7.0, 6.0, 5.0]);
}

#[test]
fn fetch_without_sort_keeps_store_order() {
    let (gw, _) = gateway();
    let set = gw.fetch_documents("tick", &strings(&["tick"]), &FetchOptions::default()).unwrap();
    assert_eq!(numbers(set.values("tick").unwrap()), vec![3.0, 1.0, 5.0, 0.0, 2.0, 4.0]);
}

#[test]
fn column_lengths_track_documents_scanned() {
    let (gw, _) = gateway();
    let fields = strings(&["tick", "params.position", "missing"]);
    let set = gw.fetch_documents("tick", &fields, &FetchOptions::default()).unwrap();
    assert_eq!(set.documents(), 6);
    assert_eq!(set.values("tick").unwrap().len(), 6);
    assert_eq!(set.values("missing").unwrap().len(), 6);
    assert_eq!(set.values("params.position").unwrap().len(), 18);
    // tick 4 has no position: a null triple at its row
    let pos = set.values("params.position").unwrap();
    assert!(pos[15..18].iter().all(Cell::is_null));
    assert_eq!(numbers(&pos[0..3]), vec![3.5, 0.0, -3.0]);
}

#[test]
fn session_filter_matches_listed_sessions_with_position() {
    let (gw, _) = gateway();
    let opts = FetchOptions {
        sort_flags: vec![true],
        session_ids: Some(strings(&["s1", "s3"])),
        ..FetchOptions::default()
    };
    let set = gw.fetch_documents("tick", &strings(&["tick", "session_id"]), &opts).unwrap();
    // s3's tick 4 has no position and is excluded
    assert_eq!(numbers(set.values("tick").unwrap()), vec![0.0, 3.0, 5.0]);
    let sessions: Vec<&str> = set.values("session_id").unwrap().iter().filter_map(Cell::as_str).collect();
    assert_eq!(sessions, vec!["s1", "s1", "s3"]);
    assert_eq!(gw.count_documents("tick", &opts).unwrap(), 3);
}

#[test]
fn limit_and_skip_apply_after_sort() {
    let (gw, _) = gateway();
    let opts = FetchOptions { limit: 2, skip: 1, sort_flags: vec![true], ..FetchOptions::default() };
    let set = gw.fetch_documents("tick", &strings(&["tick"]), &opts).unwrap();
    assert_eq!(numbers(set.values("tick").unwrap()), vec![1.0, 2.0]);
}

#[test]
fn fetch_validates_before_touching_the_store() {
    let (gw, _) = gateway();
    let eleven: Vec<String> = (0..11).map(|i| format!("f{i}")).collect();
    assert!(matches!(
        gw.fetch_documents("tick", &eleven, &FetchOptions::default()),
        Err(GatewayError::TooManyFields { .. })
    ));
    assert!(matches!(
        gw.fetch_documents("", &strings(&["tick"]), &FetchOptions::default()),
        Err(GatewayError::EmptyCollectionName)
    ));
}

#[test]
fn fetch_requires_connection_and_database() {
    let server = seeded_server();
    let t = MemoryTransport::new();
    t.register(ADDR, server);
    let gw = Gateway::new(Arc::new(t), GatewayConfig::default());
    let fields = strings(&["tick"]);
    assert!(matches!(gw.fetch_documents("tick", &fields, &FetchOptions::default()), Err(GatewayError::NotConnected)));
    gw.connect(ADDR).unwrap();
    assert!(matches!(gw.fetch_documents("tick", &fields, &FetchOptions::default()), Err(GatewayError::NoDatabase)));
    gw.select_database(DB).unwrap();
    assert!(gw.fetch_documents("tick", &fields, &FetchOptions::default()).is_ok());
}

#[test]
fn find_failure_yields_empty_columns() {
    let (gw, server) = gateway();
    server.set_find_failure(true);
    let set = gw.fetch_documents("tick", &strings(&["tick", "params.position"]), &FetchOptions::default()).unwrap();
    assert_eq!(set.columns().len(), 2);
    assert!(set.columns().iter().all(|c| c.values.is_empty()));
}

#[test]
fn cursor_errors_do_not_abort_fetch() {
    let (gw, server) = gateway();
    server.inject_cursor_error(DB, "tick", 2);
    let set = gw.fetch_documents("tick", &strings(&["tick"]), &FetchOptions::default()).unwrap();
    assert_eq!(set.cursor_errors(), 1);
    assert_eq!(set.documents(), 6);
}

#[test]
fn fetch_emits_query_timing_lines() {
    let _guard = devlog::enable_thread_sink();
    let (gw, _) = gateway();
    devlog::drain();
    gw.fetch_documents("tick", &strings(&["tick"]), &FetchOptions { limit: 4, ..FetchOptions::default() }).unwrap();
    let lines = devlog::drain();
    assert!(lines.iter().any(|l| l.contains("\"op\":\"count\"") && l.contains("\"collection\":\"tick\"")));
    let find = lines.iter().find(|l| l.contains("\"op\":\"find\"")).unwrap();
    let v: serde_json::Value = serde_json::from_str(find).unwrap();
    assert_eq!(v["result_count"], 4);
    assert_eq!(v["limit"], 4);
}

#[test]
fn session_ids_for_level_skip_non_string_ids() {
    let (gw, _) = gateway();
    assert_eq!(gw.fetch_session_ids("arena").unwrap(), vec!["s1", "s2"]);
    assert_eq!(gw.fetch_session_ids("forest").unwrap(), vec!["s3"]);
    assert!(gw.fetch_session_ids("swamp").unwrap().is_empty());
    assert!(matches!(gw.fetch_session_ids(""), Err(GatewayError::InvalidArgument(_))));
}

#[test]
fn session_ids_never_exceed_scan_cap() {
    let server = seeded_server();
    server.insert_many(
        DB,
        "session_start",
        (0..50).map(|i| doc! { "session_id": format!("bulk-{i}"), "params": { "level_key": "bulk" } }),
    );
    let cfg = GatewayConfig { session_scan_cap: 20, ..GatewayConfig::default() };
    let (gw, _) = gateway_with(cfg, &server);
    let ids = gw.fetch_session_ids("bulk").unwrap();
    assert_eq!(ids.len(), 20);
    assert_eq!(ids[0], "bulk-0");
}

#[test]
fn list_collections_and_failure() {
    let (gw, server) = gateway();
    assert_eq!(gw.list_collections().unwrap(), vec!["empty", "session_start", "tick"]);
    server.set_listing_failure(true);
    assert!(gw.list_collections().unwrap().is_empty());
}

#[test]
fn reconnect_waits_for_state_lock_and_invalidates_database() {
    let (gw, _) = gateway();
    let gw = Arc::new(gw);
    let handles: Vec<_> = (0..4)
        .map(|i| {
            let gw = Arc::clone(&gw);
            std::thread::spawn(move || {
                if i % 2 == 0 {
                    gw.fetch_documents("tick", &strings(&["tick"]), &FetchOptions::default()).map(|s| s.documents())
                } else {
                    gw.connect(if i == 1 { common::OTHER_ADDR } else { ADDR }).map(usize::from)
                }
            })
        })
        .collect();
    for h in handles {
        match h.join().unwrap() {
            Ok(_) | Err(GatewayError::NoDatabase) => {}
            Err(e) => panic!("unexpected error: {e}"),
        }
    }
    let generation = gw.with_state(|s| s.generation());
    assert!(generation >= 2);
}

#[test]
fn connect_configured_selects_database() {
    let server = seeded_server();
    let t = MemoryTransport::new();
    t.register(ADDR, server);
    let cfg = GatewayConfig { address: ADDR.into(), database: Some(DB.into()), ..GatewayConfig::default() };
    let gw = Gateway::new(Arc::new(t), cfg);
    let out = gw.connect_configured().unwrap();
    assert!(out.changed);
    assert_eq!(gw.with_state(|s| s.database_name().map(str::to_string)), Some(DB.to_string()));
    assert!(gw.disconnect());
}
