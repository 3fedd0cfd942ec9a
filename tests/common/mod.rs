#![allow(dead_code)]

use bson::doc;
use std::sync::Arc;
use telemetry_gateway::store::{MemoryServer, MemoryTransport};
use telemetry_gateway::{Gateway, GatewayConfig};

pub const ADDR: &str = "mem://primary";
pub const OTHER_ADDR: &str = "mem://replica";
pub const DB: &str = "telemetry";

/// `tick` holds six frames across three sessions, inserted out of order.
/// Frame 4 has no position. `session_start` holds sessions for two levels
/// plus two records without a usable string id.
pub fn seeded_server() -> MemoryServer {
    let server = MemoryServer::new();
    for (tick, session) in [(3, "s1"), (1, "s2"), (5, "s3"), (0, "s1"), (2, "s2"), (4, "s3")] {
        let mut params = doc! { "level_key": "arena" };
        if tick != 4 {
            params.insert("position", format!("Vector3({tick}.5, 0, -{tick})"));
        }
        server.insert(DB, "tick", doc! { "tick": tick, "score": 10 - tick, "session_id": session, "params": params });
    }
    server.insert_many(
        DB,
        "session_start",
        [
            doc! { "session_id": "s1", "params": { "level_key": "arena" } },
            doc! { "session_id": "s2", "params": { "level_key": "arena" } },
            doc! { "session_id": "s3", "params": { "level_key": "forest" } },
            doc! { "session_id": 42, "params": { "level_key": "arena" } },
            doc! { "params": { "level_key": "arena" } },
        ],
    );
    server.create_collection(DB, "empty");
    server
}

pub fn transport_with(server: &MemoryServer) -> MemoryTransport {
    let t = MemoryTransport::new();
    t.register(ADDR, server.clone());
    t.register(OTHER_ADDR, server.clone());
    t
}

pub fn gateway_with(config: GatewayConfig, server: &MemoryServer) -> (Gateway, MemoryTransport) {
    let t = transport_with(server);
    let gw = Gateway::new(Arc::new(t.clone()), config);
    assert!(gw.connect(ADDR).unwrap());
    assert!(gw.select_database(DB).unwrap().changed);
    (gw, t)
}

/// Connected gateway over [`seeded_server`] with default configuration.
pub fn gateway() -> (Gateway, MemoryServer) {
    let server = seeded_server();
    let (gw, _) = gateway_with(GatewayConfig::default(), &server);
    (gw, server)
}

pub fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| (*s).to_string()).collect()
}
