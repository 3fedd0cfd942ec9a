//! Connection manager: at most one live server connection and at most one
//! database handle scoped to it.
//!
//! Both are replaced only when a *different* target is requested. Every
//! connection gets a fresh generation number; a database handle remembers the
//! generation it was opened against and is refused once that no longer matches.

use crate::errors::GatewayError;
use crate::lister::list_collections;
use crate::store::{Connection, Database, Transport};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConnectOutcome {
    pub changed: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SelectOutcome {
    pub changed: bool,
    /// Collections of the newly selected database; empty on a no-op.
    pub collection_names: Vec<String>,
}

struct ActiveConnection {
    inner: Box<dyn Connection>,
    generation: u64,
}

/// A database handle tagged with the connection generation it belongs to.
pub struct DatabaseHandle {
    inner: Box<dyn Database>,
    generation: u64,
}

impl DatabaseHandle {
    #[must_use]
    pub fn name(&self) -> &str {
        self.inner.name()
    }

    #[must_use]
    pub fn generation(&self) -> u64 {
        self.generation
    }

    #[must_use]
    pub fn database(&self) -> &dyn Database {
        self.inner.as_ref()
    }
}

#[derive(Default)]
pub struct GatewayState {
    connection: Option<ActiveConnection>,
    database: Option<DatabaseHandle>,
    generation: u64,
}

impl std::fmt::Debug for GatewayState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GatewayState")
            .field("address", &self.address())
            .field("database", &self.database_name())
            .field("generation", &self.generation)
            .finish()
    }
}

impl GatewayState {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Connect to `address`, replacing the current connection if it differs.
    ///
    /// The new connection is opened before the old one is dropped; if opening
    /// fails the current state is left untouched.
    ///
    /// # Errors
    /// `EmptyAddress`, or the transport's error.
    pub fn connect(&mut self, transport: &dyn Transport, address: &str) -> Result<ConnectOutcome, GatewayError> {
        if address.is_empty() {
            return Err(GatewayError::EmptyAddress);
        }
        if self.address() == Some(address) {
            log::debug!("already connected to {address}");
            return Ok(ConnectOutcome { changed: false });
        }
        let inner = transport.open(address)?;
        let generation = self.generation + 1;
        if let Some(old) = self.connection.as_ref() {
            log::info!("replacing connection {} with {}", old.inner.address(), address);
        } else {
            log::info!("connected to {address}");
        }
        // Handle goes first: it must never outlive its connection.
        self.database = None;
        self.connection = Some(ActiveConnection { inner, generation });
        self.generation = generation;
        Ok(ConnectOutcome { changed: true })
    }

    /// Select database `name` on the current connection.
    ///
    /// Without a connection this is a logged no-op. A new or replaced handle
    /// lists its collections; selecting the current database again does not.
    ///
    /// # Errors
    /// `EmptyDatabaseName`, `StaleHandle`, or the transport's error.
    pub fn select_database(&mut self, name: &str) -> Result<SelectOutcome, GatewayError> {
        if name.is_empty() {
            return Err(GatewayError::EmptyDatabaseName);
        }
        let Some(conn) = self.connection.as_ref() else {
            log::warn!("select_database('{name}') ignored: not connected");
            return Ok(SelectOutcome::default());
        };
        if let Some(current) = self.database.as_ref() {
            Self::check_generation(current, conn.generation)?;
            if current.name() == name {
                log::debug!("database '{name}' already selected");
                return Ok(SelectOutcome::default());
            }
        }
        let handle = DatabaseHandle { inner: conn.inner.database(name)?, generation: conn.generation };
        let collection_names = list_collections(handle.database());
        log::info!("selected database '{}' ({} collections)", name, collection_names.len());
        self.database = Some(handle);
        Ok(SelectOutcome { changed: true, collection_names })
    }

    /// The selected database, validated against the live connection.
    ///
    /// # Errors
    /// `NotConnected`, `NoDatabase` or `StaleHandle`.
    pub fn active_database(&self) -> Result<&DatabaseHandle, GatewayError> {
        let conn = self.connection.as_ref().ok_or(GatewayError::NotConnected)?;
        let db = self.database.as_ref().ok_or(GatewayError::NoDatabase)?;
        Self::check_generation(db, conn.generation)?;
        Ok(db)
    }

    fn check_generation(db: &DatabaseHandle, current: u64) -> Result<(), GatewayError> {
        if db.generation == current {
            Ok(())
        } else {
            Err(GatewayError::StaleHandle { database: db.name().to_string(), handle: db.generation, current })
        }
    }

    #[must_use]
    pub fn address(&self) -> Option<&str> {
        self.connection.as_ref().map(|c| c.inner.address())
    }

    #[must_use]
    pub fn database_name(&self) -> Option<&str> {
        self.database.as_ref().map(DatabaseHandle::name)
    }

    /// Generation of the current connection; 0 before the first connect.
    #[must_use]
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Drop the handle and the connection. Returns whether anything was open.
    pub fn disconnect(&mut self) -> bool {
        self.database = None;
        match self.connection.take() {
            Some(c) => {
                log::info!("disconnected from {}", c.inner.address());
                true
            }
            None => false,
        }
    }
}
