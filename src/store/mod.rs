//! Driver contract for the document database.
//!
//! A [`Transport`] opens [`Connection`]s by address; a connection hands out
//! [`Database`] handles by name; a database lists collections and runs
//! read-only `find`/`count` against one collection.

pub mod fixtures;
pub mod memory;

use crate::errors::GatewayError;
use crate::query::{Cursor, Filter, FindOptions};

pub use fixtures::{FixtureReport, load_fixtures};
pub use memory::{MemoryServer, MemoryTransport};

pub trait Transport: Send + Sync {
    /// # Errors
    /// Returns a transport error if the address cannot be opened.
    fn open(&self, address: &str) -> Result<Box<dyn Connection>, GatewayError>;
}

pub trait Connection: Send {
    fn address(&self) -> &str;

    /// # Errors
    /// Returns a transport error if a handle cannot be created.
    fn database(&self, name: &str) -> Result<Box<dyn Database>, GatewayError>;
}

pub trait Database: Send {
    fn name(&self) -> &str;

    /// # Errors
    /// Returns a transport error if the server cannot list collections.
    fn list_collection_names(&self) -> Result<Vec<String>, GatewayError>;

    /// # Errors
    /// Returns a transport error if the query cannot be started.
    fn find(&self, collection: &str, filter: &Filter, options: &FindOptions) -> Result<Cursor, GatewayError>;

    /// # Errors
    /// Returns a transport error if the count fails.
    fn count(&self, collection: &str, filter: &Filter) -> Result<u64, GatewayError>;
}
