use serde_json::Value;
use std::sync::Arc;

use crate::config::GatewayConfig;
use crate::errors::GatewayError;
use crate::gateway::Gateway;
use crate::store::{MemoryServer, MemoryTransport, load_fixtures};

/// Gateway over the in-process store, seeded from `config.fixtures` and
/// reachable at `config.address`.
///
/// # Errors
/// Returns an I/O error if the fixture directory cannot be loaded.
pub fn gateway_from_config(config: GatewayConfig) -> Result<Gateway, GatewayError> {
    let server = MemoryServer::new();
    if let Some(dir) = config.fixtures.as_deref() {
        load_fixtures(&server, dir)?;
    } else {
        log::warn!("no fixture directory configured; the store is empty");
    }
    let transport = MemoryTransport::new();
    transport.register(&config.address, server);
    Ok(Gateway::new(Arc::new(transport), config))
}

/// Parse `call` arguments: a JSON array, or any other JSON value as the single argument.
///
/// # Errors
/// Returns the JSON parse error.
pub fn parse_call_args(s: &str) -> Result<Vec<Value>, GatewayError> {
    Ok(match serde_json::from_str::<Value>(s)? {
        Value::Array(items) => items,
        other => vec![other],
    })
}
