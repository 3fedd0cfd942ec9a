use thiserror::Error;

#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serde JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("BSON: {0}")]
    Bson(#[from] bson::error::Error),

    #[error("TOML: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Server address is empty")]
    EmptyAddress,

    #[error("Database name is empty")]
    EmptyDatabaseName,

    #[error("Collection name is empty")]
    EmptyCollectionName,

    #[error("Field path is empty at index {0}")]
    EmptyFieldPath(usize),

    #[error("Too many fields requested: {count} (max {max})")]
    TooManyFields { count: usize, max: usize },

    #[error("Sort flags ({flags}) do not align with requested fields ({fields})")]
    SortFlagsMisaligned { flags: usize, fields: usize },

    #[error("Not connected to a server")]
    NotConnected,

    #[error("No database selected")]
    NoDatabase,

    #[error("Database handle '{database}' is stale (generation {handle}, connection {current})")]
    StaleHandle { database: String, handle: u64, current: u64 },

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Unknown native function: {0}")]
    UnknownFunction(String),

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Config error: {0}")]
    Config(String),
}

impl GatewayError {
    /// Caller-side mistakes or missing setup; the request was never sent.
    #[must_use]
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            Self::EmptyAddress
                | Self::EmptyDatabaseName
                | Self::EmptyCollectionName
                | Self::EmptyFieldPath(_)
                | Self::SortFlagsMisaligned { .. }
                | Self::NotConnected
                | Self::NoDatabase
                | Self::StaleHandle { .. }
                | Self::InvalidArgument(_)
                | Self::Config(_)
        )
    }

    #[must_use]
    pub fn is_capacity(&self) -> bool {
        matches!(self, Self::TooManyFields { .. })
    }
}
