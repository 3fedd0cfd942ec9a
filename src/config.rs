//! Gateway configuration.
//!
//! Precedence: CLI > environment > config files > defaults. Config files are
//! looked up in order (explicit path, `$TELEMETRY_GATEWAY_CONFIG`,
//! `<config dir>/telemetry-gateway.toml`, `./telemetry-gateway.toml`) and the
//! first file to set a key wins.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::errors::GatewayError;
use crate::query::MAX_FIELDS;

pub const CONFIG_FILE_NAME: &str = "telemetry-gateway.toml";
pub const DEFAULT_ADDRESS: &str = "mongodb://localhost:27017";
pub const DEFAULT_SESSION_SCAN_CAP: u64 = 3000;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoggingConfig {
    pub dir: Option<PathBuf>,
    pub level: Option<String>,
    pub retention: Option<usize>,
}

/// Resolved configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GatewayConfig {
    pub address: String,
    pub database: Option<String>,
    pub max_fields: usize,
    /// Leaf key whose values are `Vector3(x, y, z)` strings.
    pub vector_key: String,
    /// Field that must exist when filtering by session ids.
    pub position_path: String,
    pub session_field: String,
    pub session_collection: String,
    pub level_key_field: String,
    pub session_scan_cap: u64,
    /// Per-collection skip offset for schema probing.
    pub probe_skip: HashMap<String, u64>,
    pub fixtures: Option<PathBuf>,
    pub logging: LoggingConfig,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            address: DEFAULT_ADDRESS.to_string(),
            database: None,
            max_fields: MAX_FIELDS,
            vector_key: "position".to_string(),
            position_path: "params.position".to_string(),
            session_field: "session_id".to_string(),
            session_collection: "session_start".to_string(),
            level_key_field: "params.level_key".to_string(),
            session_scan_cap: DEFAULT_SESSION_SCAN_CAP,
            probe_skip: HashMap::new(),
            fixtures: None,
            logging: LoggingConfig::default(),
        }
    }
}

impl GatewayConfig {
    #[must_use]
    pub fn probe_skip_for(&self, collection: &str) -> u64 {
        self.probe_skip.get(collection).copied().unwrap_or(0)
    }

    /// # Errors
    /// Rejects zero bounds and empty key names.
    pub fn validate(&self) -> Result<(), GatewayError> {
        if self.max_fields == 0 {
            return Err(GatewayError::Config("max_fields must be at least 1".into()));
        }
        if self.session_scan_cap == 0 {
            return Err(GatewayError::Config("session_scan_cap must be at least 1".into()));
        }
        for (name, v) in [
            ("vector_key", &self.vector_key),
            ("position_path", &self.position_path),
            ("session_field", &self.session_field),
            ("session_collection", &self.session_collection),
            ("level_key_field", &self.level_key_field),
        ] {
            if v.is_empty() {
                return Err(GatewayError::Config(format!("{name} must not be empty")));
            }
        }
        Ok(())
    }
}

/// One configuration layer; unset keys fall through to the next layer.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfigLayer {
    pub address: Option<String>,
    pub database: Option<String>,
    pub max_fields: Option<usize>,
    pub vector_key: Option<String>,
    pub position_path: Option<String>,
    pub session_field: Option<String>,
    pub session_collection: Option<String>,
    pub level_key_field: Option<String>,
    pub session_scan_cap: Option<u64>,
    #[serde(default)]
    pub probe_skip: HashMap<String, u64>,
    pub fixtures: Option<PathBuf>,
    pub logging: Option<LoggingConfig>,
}

impl ConfigLayer {
    /// # Errors
    /// Returns the TOML parse error.
    pub fn from_toml_str(s: &str) -> Result<Self, GatewayError> {
        Ok(toml::from_str(s)?)
    }

    /// Fill keys still unset from a lower-precedence layer.
    pub fn fill_from(&mut self, lower: Self) {
        fn fill<T>(slot: &mut Option<T>, v: Option<T>) {
            if slot.is_none() {
                *slot = v;
            }
        }
        fill(&mut self.address, lower.address);
        fill(&mut self.database, lower.database);
        fill(&mut self.max_fields, lower.max_fields);
        fill(&mut self.vector_key, lower.vector_key);
        fill(&mut self.position_path, lower.position_path);
        fill(&mut self.session_field, lower.session_field);
        fill(&mut self.session_collection, lower.session_collection);
        fill(&mut self.level_key_field, lower.level_key_field);
        fill(&mut self.session_scan_cap, lower.session_scan_cap);
        fill(&mut self.fixtures, lower.fixtures);
        match (self.logging.as_mut(), lower.logging) {
            (Some(mine), Some(theirs)) => {
                fill(&mut mine.dir, theirs.dir);
                fill(&mut mine.level, theirs.level);
                fill(&mut mine.retention, theirs.retention);
            }
            (None, theirs) => self.logging = theirs,
            (Some(_), None) => {}
        }
        for (k, v) in lower.probe_skip {
            self.probe_skip.entry(k).or_insert(v);
        }
    }

    /// Layer built from `TELEMETRY_GATEWAY_*` variables, read through `var`.
    pub fn from_env_with<F>(var: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        Self {
            address: var("TELEMETRY_GATEWAY_ADDRESS"),
            database: var("TELEMETRY_GATEWAY_DATABASE"),
            max_fields: var("TELEMETRY_GATEWAY_MAX_FIELDS").and_then(|s| s.parse().ok()),
            session_scan_cap: var("TELEMETRY_GATEWAY_SESSION_SCAN_CAP").and_then(|s| s.parse().ok()),
            fixtures: var("TELEMETRY_GATEWAY_FIXTURES").map(PathBuf::from),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn from_env() -> Self {
        Self::from_env_with(|k| std::env::var(k).ok())
    }

    /// Apply defaults for unset keys.
    #[must_use]
    pub fn resolve(self) -> GatewayConfig {
        let d = GatewayConfig::default();
        GatewayConfig {
            address: self.address.unwrap_or(d.address),
            database: self.database,
            max_fields: self.max_fields.unwrap_or(d.max_fields),
            vector_key: self.vector_key.unwrap_or(d.vector_key),
            position_path: self.position_path.unwrap_or(d.position_path),
            session_field: self.session_field.unwrap_or(d.session_field),
            session_collection: self.session_collection.unwrap_or(d.session_collection),
            level_key_field: self.level_key_field.unwrap_or(d.level_key_field),
            session_scan_cap: self.session_scan_cap.unwrap_or(d.session_scan_cap),
            probe_skip: self.probe_skip,
            fixtures: self.fixtures,
            logging: self.logging.unwrap_or_default(),
        }
    }
}

/// Candidate config files, highest precedence first.
#[must_use]
pub fn config_paths(explicit: Option<&Path>) -> Vec<PathBuf> {
    let mut paths = Vec::new();
    if let Some(p) = explicit {
        paths.push(p.to_path_buf());
    }
    if let Ok(p) = std::env::var("TELEMETRY_GATEWAY_CONFIG") {
        paths.push(PathBuf::from(p));
    }
    if let Some(dir) = dirs_next::config_dir() {
        paths.push(dir.join(CONFIG_FILE_NAME));
    }
    if let Ok(cur) = std::env::current_dir() {
        paths.push(cur.join(CONFIG_FILE_NAME));
    }
    paths
}

/// Merge the given files (highest precedence first). Missing or unparsable
/// files are skipped, except the explicitly named one.
///
/// # Errors
/// Returns a read or parse error for `explicit`.
pub fn load_file_layers(paths: &[PathBuf], explicit: Option<&Path>) -> Result<ConfigLayer, GatewayError> {
    let mut merged = ConfigLayer::default();
    for p in paths {
        let is_explicit = explicit.is_some_and(|e| e == p.as_path());
        if !p.exists() {
            if is_explicit {
                return Err(GatewayError::Config(format!("config file not found: {}", p.display())));
            }
            continue;
        }
        let parsed = std::fs::read_to_string(p)
            .map_err(GatewayError::from)
            .and_then(|s| ConfigLayer::from_toml_str(&s));
        match parsed {
            Ok(layer) => merged.fill_from(layer),
            Err(e) if is_explicit => return Err(e),
            Err(e) => log::warn!("ignoring config file {}: {}", p.display(), e),
        }
    }
    Ok(merged)
}

/// Load configuration: `cli` overrides, then environment, then files, then defaults.
///
/// # Errors
/// Returns an error for an unreadable explicit file or an invalid result.
pub fn load_config(explicit: Option<&Path>, cli: ConfigLayer) -> Result<GatewayConfig, GatewayError> {
    let mut layer = cli;
    layer.fill_from(ConfigLayer::from_env());
    layer.fill_from(load_file_layers(&config_paths(explicit), explicit)?);
    let cfg = layer.resolve();
    cfg.validate()?;
    Ok(cfg)
}
