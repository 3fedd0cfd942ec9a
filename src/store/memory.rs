//! In-process document store implementing the driver contract.
//!
//! Servers are registered on a [`MemoryTransport`] under an address; each holds
//! databases of named collections in insertion order. Queries are evaluated
//! locally with the same filter/sort/projection rules the gateway emits.

use bson::Document;
use parking_lot::RwLock;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use crate::errors::GatewayError;
use crate::query::{Cursor, Filter, FindOptions, count_docs, find_docs};

use super::{Connection, Database, Transport};

type Collections = BTreeMap<String, Vec<Document>>;

#[derive(Default)]
struct ServerData {
    databases: RwLock<HashMap<String, Collections>>,
    fail_listing: AtomicBool,
    fail_find: AtomicBool,
    // (database, collection) -> result positions that yield a cursor error first
    cursor_errors: RwLock<HashMap<(String, String), Vec<usize>>>,
}

#[derive(Clone, Default)]
pub struct MemoryServer {
    data: Arc<ServerData>,
}

impl MemoryServer {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn create_collection(&self, database: &str, collection: &str) {
        self.data
            .databases
            .write()
            .entry(database.to_string())
            .or_default()
            .entry(collection.to_string())
            .or_default();
    }

    pub fn insert(&self, database: &str, collection: &str, doc: Document) {
        self.insert_many(database, collection, std::iter::once(doc));
    }

    pub fn insert_many<I>(&self, database: &str, collection: &str, docs: I)
    where
        I: IntoIterator<Item = Document>,
    {
        self.data
            .databases
            .write()
            .entry(database.to_string())
            .or_default()
            .entry(collection.to_string())
            .or_default()
            .extend(docs);
    }

    #[must_use]
    pub fn document_count(&self, database: &str, collection: &str) -> usize {
        self.data.databases.read().get(database).and_then(|c| c.get(collection)).map_or(0, Vec::len)
    }

    /// Make `list_collection_names` fail on every database of this server.
    pub fn set_listing_failure(&self, fail: bool) {
        self.data.fail_listing.store(fail, Ordering::SeqCst);
    }

    /// Make `find` fail before returning a cursor.
    pub fn set_find_failure(&self, fail: bool) {
        self.data.fail_find.store(fail, Ordering::SeqCst);
    }

    /// Yield a cursor error just before the result at `position` of every find on this collection.
    pub fn inject_cursor_error(&self, database: &str, collection: &str, position: usize) {
        self.data
            .cursor_errors
            .write()
            .entry((database.to_string(), collection.to_string()))
            .or_default()
            .push(position);
    }
}

#[derive(Default)]
struct Counters {
    opened: AtomicU64,
    closed: AtomicU64,
}

/// Transport resolving addresses to registered [`MemoryServer`]s.
#[derive(Clone, Default)]
pub struct MemoryTransport {
    servers: Arc<RwLock<HashMap<String, MemoryServer>>>,
    counters: Arc<Counters>,
}

impl MemoryTransport {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&self, address: &str, server: MemoryServer) {
        self.servers.write().insert(address.to_string(), server);
    }

    #[must_use]
    pub fn server(&self, address: &str) -> Option<MemoryServer> {
        self.servers.read().get(address).cloned()
    }

    /// Connections opened so far.
    #[must_use]
    pub fn opened(&self) -> u64 {
        self.counters.opened.load(Ordering::SeqCst)
    }

    /// Connections dropped so far.
    #[must_use]
    pub fn closed(&self) -> u64 {
        self.counters.closed.load(Ordering::SeqCst)
    }
}

impl Transport for MemoryTransport {
    fn open(&self, address: &str) -> Result<Box<dyn Connection>, GatewayError> {
        let server = self
            .server(address)
            .ok_or_else(|| GatewayError::Transport(format!("no server at '{address}'")))?;
        self.counters.opened.fetch_add(1, Ordering::SeqCst);
        log::debug!("memory transport: opened {address}");
        Ok(Box::new(MemoryConnection { address: address.to_string(), server, counters: self.counters.clone() }))
    }
}

struct MemoryConnection {
    address: String,
    server: MemoryServer,
    counters: Arc<Counters>,
}

impl Drop for MemoryConnection {
    fn drop(&mut self) {
        self.counters.closed.fetch_add(1, Ordering::SeqCst);
        log::debug!("memory transport: closed {}", self.address);
    }
}

impl Connection for MemoryConnection {
    fn address(&self) -> &str {
        &self.address
    }

    fn database(&self, name: &str) -> Result<Box<dyn Database>, GatewayError> {
        Ok(Box::new(MemoryDatabase { name: name.to_string(), server: self.server.clone() }))
    }
}

struct MemoryDatabase {
    name: String,
    server: MemoryServer,
}

impl Database for MemoryDatabase {
    fn name(&self) -> &str {
        &self.name
    }

    fn list_collection_names(&self) -> Result<Vec<String>, GatewayError> {
        if self.server.data.fail_listing.load(Ordering::SeqCst) {
            return Err(GatewayError::Transport(format!("listCollections failed on '{}'", self.name)));
        }
        Ok(self.server.data.databases.read().get(&self.name).map(|c| c.keys().cloned().collect()).unwrap_or_default())
    }

    fn find(&self, collection: &str, filter: &Filter, options: &FindOptions) -> Result<Cursor, GatewayError> {
        if self.server.data.fail_find.load(Ordering::SeqCst) {
            return Err(GatewayError::Transport(format!("find failed on '{}.{}'", self.name, collection)));
        }
        let cursor = {
            let dbs = self.server.data.databases.read();
            match dbs.get(&self.name).and_then(|c| c.get(collection)) {
                Some(docs) => find_docs(collection, docs, filter, options),
                None => Cursor::empty(),
            }
        };
        let key = (self.name.clone(), collection.to_string());
        let Some(mut positions) = self.server.data.cursor_errors.read().get(&key).cloned() else {
            return Ok(cursor);
        };
        positions.sort_unstable();
        let mut items = Vec::new();
        for (i, doc) in cursor.enumerate() {
            for _ in positions.iter().filter(|p| **p == i) {
                items.push(Err(GatewayError::Transport(format!("cursor error at position {i}"))));
            }
            items.push(doc);
        }
        Ok(Cursor::new(items))
    }

    fn count(&self, collection: &str, filter: &Filter) -> Result<u64, GatewayError> {
        let dbs = self.server.data.databases.read();
        Ok(dbs.get(&self.name).and_then(|c| c.get(collection)).map_or(0, |docs| count_docs(collection, docs, filter)))
    }
}
