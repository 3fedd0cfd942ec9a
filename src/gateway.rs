//! The gateway: connection state plus the read-only query operations.
//!
//! All operations take the state lock for their whole duration, so a
//! reconnect issued while a fetch is running waits for the fetch to finish.

use bson::Bson;
use parking_lot::Mutex;
use std::sync::Arc;

use crate::config::GatewayConfig;
use crate::connection::{GatewayState, SelectOutcome};
use crate::decode::{ColumnSet, Decoder};
use crate::errors::GatewayError;
use crate::lister::list_collections;
use crate::probe::probe_field_keys;
use crate::query::{FetchOptions, Filter, FindOptions, Projection, QueryBuilder, get_path};
use crate::store::Transport;

pub struct Gateway {
    transport: Arc<dyn Transport>,
    config: GatewayConfig,
    builder: QueryBuilder,
    decoder: Decoder,
    state: Mutex<GatewayState>,
}

impl std::fmt::Debug for Gateway {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Gateway").field("config", &self.config).field("state", &*self.state.lock()).finish()
    }
}

impl Gateway {
    pub fn new(transport: Arc<dyn Transport>, config: GatewayConfig) -> Self {
        let builder = QueryBuilder::from_config(&config);
        let decoder = Decoder::new(config.vector_key.clone());
        Self { transport, config, builder, decoder, state: Mutex::new(GatewayState::new()) }
    }

    #[must_use]
    pub fn config(&self) -> &GatewayConfig {
        &self.config
    }

    #[must_use]
    pub fn builder(&self) -> &QueryBuilder {
        &self.builder
    }

    #[must_use]
    pub fn decoder(&self) -> &Decoder {
        &self.decoder
    }

    /// Connect to `address`. Returns whether the connection changed.
    ///
    /// # Errors
    /// `EmptyAddress` or a transport error; the previous connection is kept.
    pub fn connect(&self, address: &str) -> Result<bool, GatewayError> {
        Ok(self.state.lock().connect(self.transport.as_ref(), address)?.changed)
    }

    /// # Errors
    /// `EmptyDatabaseName` or a transport error.
    pub fn select_database(&self, name: &str) -> Result<SelectOutcome, GatewayError> {
        self.state.lock().select_database(name)
    }

    /// Connect to the configured address and select the configured database, if any.
    ///
    /// # Errors
    /// As [`Gateway::connect`] and [`Gateway::select_database`].
    pub fn connect_configured(&self) -> Result<SelectOutcome, GatewayError> {
        let mut state = self.state.lock();
        state.connect(self.transport.as_ref(), &self.config.address)?;
        match self.config.database.as_deref() {
            Some(db) => state.select_database(db),
            None => Ok(SelectOutcome::default()),
        }
    }

    /// # Errors
    /// `NotConnected`, `NoDatabase` or `StaleHandle`. Listing failures yield an empty list.
    pub fn list_collections(&self) -> Result<Vec<String>, GatewayError> {
        let state = self.state.lock();
        Ok(list_collections(state.active_database()?.database()))
    }

    /// Field keys of one sampled document; the skip offset comes from `probe_skip`.
    ///
    /// # Errors
    /// Missing connection or database, empty collection name, or a store error.
    pub fn list_field_keys(&self, collection: &str) -> Result<Vec<String>, GatewayError> {
        let state = self.state.lock();
        let db = state.active_database()?.database();
        probe_field_keys(db, collection, self.config.probe_skip_for(collection))
    }

    /// Number of documents the filter part of `opts` matches in `collection`.
    ///
    /// # Errors
    /// Missing connection or database, empty collection name, or a store error.
    pub fn count_documents(&self, collection: &str, opts: &FetchOptions) -> Result<u64, GatewayError> {
        if collection.is_empty() {
            return Err(GatewayError::EmptyCollectionName);
        }
        let filter = self.builder.filter_for(opts);
        let state = self.state.lock();
        state.active_database()?.database().count(collection, &filter)
    }

    /// Fetch `fields` from `collection` into columns.
    ///
    /// Validation happens before anything is sent. Once the query is valid,
    /// store failures are logged: a failed `find` yields empty columns and
    /// cursor errors are skipped.
    ///
    /// # Errors
    /// Configuration errors, `TooManyFields`, or a missing connection/database.
    pub fn fetch_documents(
        &self,
        collection: &str,
        fields: &[String],
        opts: &FetchOptions,
    ) -> Result<ColumnSet, GatewayError> {
        let spec = self.builder.build(collection, fields, opts)?;
        let state = self.state.lock();
        let db = state.active_database()?.database();
        log::info!("Fetch data from the database and process");
        log::debug!("find {}: filter={} options={}", spec.collection, spec.filter_document(), spec.options_document());

        let expected = match db.count(&spec.collection, &spec.filter) {
            Ok(n) => {
                let n = n.saturating_sub(opts.skip);
                let n = if opts.limit > 0 { n.min(opts.limit) } else { n };
                usize::try_from(n).unwrap_or(usize::MAX)
            }
            Err(e) => {
                log::warn!("count on '{}' failed, decoding without size hint: {}", spec.collection, e);
                0
            }
        };

        let cursor = match db.find(&spec.collection, &spec.filter, &spec.options) {
            Ok(c) => c,
            Err(e) => {
                log::error!("find on '{}' failed: {}", spec.collection, e);
                return Ok(ColumnSet::empty(spec.fields.as_slice(), &self.decoder));
            }
        };
        let set = self.decoder.decode_with_hint(cursor, spec.fields.as_slice(), expected);
        log::debug!(
            "fetched {} document(s) from '{}' ({} cursor error(s))",
            set.documents(),
            spec.collection,
            set.cursor_errors()
        );
        Ok(set)
    }

    /// Session ids recorded for `level_key`, at most `session_scan_cap` of them.
    ///
    /// Documents whose session id is missing or not a string are skipped.
    ///
    /// # Errors
    /// `InvalidArgument` for an empty key, or a missing connection/database.
    pub fn fetch_session_ids(&self, level_key: &str) -> Result<Vec<String>, GatewayError> {
        if level_key.is_empty() {
            return Err(GatewayError::InvalidArgument("level key is empty".into()));
        }
        let cfg = &self.config;
        let filter = Filter::Eq { path: cfg.level_key_field.clone(), value: Bson::String(level_key.to_string()) };
        let opts = FindOptions {
            projection: Some(Projection::include([cfg.session_field.as_str()])),
            sort: Vec::new(),
            limit: cfg.session_scan_cap,
            skip: 0,
        };
        let cap = usize::try_from(cfg.session_scan_cap).unwrap_or(usize::MAX);

        let state = self.state.lock();
        let db = state.active_database()?.database();
        let cursor = match db.find(&cfg.session_collection, &filter, &opts) {
            Ok(c) => c,
            Err(e) => {
                log::error!("session lookup in '{}' failed: {}", cfg.session_collection, e);
                return Ok(Vec::new());
            }
        };

        let mut ids = Vec::new();
        for item in cursor.take(cap) {
            match item {
                Ok(doc) => match get_path(&doc, &cfg.session_field) {
                    Some(Bson::String(s)) => ids.push(s.clone()),
                    other => log::debug!("skipping session document without string id: {other:?}"),
                },
                Err(e) => log::warn!("session cursor error: {e}"),
            }
        }
        Ok(ids)
    }

    pub fn disconnect(&self) -> bool {
        self.state.lock().disconnect()
    }

    /// Run `f` with the state locked.
    pub fn with_state<R>(&self, f: impl FnOnce(&GatewayState) -> R) -> R {
        f(&self.state.lock())
    }
}
