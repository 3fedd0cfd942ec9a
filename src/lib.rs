pub mod api;
pub mod args;
pub mod cli;
pub mod config;
pub mod connection;
pub mod decode;
pub mod errors;
pub mod gateway;
pub mod lister;
pub mod probe;
pub mod query;
pub mod store;
pub mod utils;

pub use config::GatewayConfig;
pub use decode::{Cell, ColumnSet, Decoder};
pub use errors::GatewayError;
pub use gateway::Gateway;
pub use query::{FetchOptions, QueryBuilder, QuerySpec};

/// Configure logging from the environment (`TELEMETRY_GATEWAY_LOG_*`) with defaults otherwise.
///
/// # Errors
/// Returns an error if the log directory or appenders cannot be set up.
pub fn init() -> Result<(), Box<dyn std::error::Error>> {
    utils::logger::configure_logging(&utils::logger::logging_from_env(config::LoggingConfig::default()))
}
