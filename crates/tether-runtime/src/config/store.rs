//! JSON-backed configuration store.
//!
//! The store owns a single JSON file. On first run the file is created
//! with built-in defaults; an existing file is loaded and rewritten once
//! so keys added since it was written appear with their defaults.
//!
//! Every persist serializes the full configuration to a temp file and
//! renames it over the original, so the file on disk is valid JSON at all
//! times and a partial write can never corrupt prior content.

use std::fs;
use std::path::{Path, PathBuf};

use parking_lot::RwLock;
use serde_json::Value;
use tracing::{debug, info};

use super::error::{ConfigError, ConfigResult};
use super::schema::BotConfig;

/// Default location of the configuration file, relative to the working
/// directory.
pub const DEFAULT_CONFIG_PATH: &str = "tether.json";

/// Loads, caches, and persists the bot configuration.
pub struct ConfigStore {
    path: PathBuf,
    cache: RwLock<BotConfig>,
}

impl ConfigStore {
    /// Loads the store from `path`, creating the file with built-in
    /// defaults if it does not exist.
    ///
    /// # Errors
    ///
    /// Fails with [`ConfigError::Parse`] if the file exists but is not
    /// valid JSON for the schema, or with an I/O variant if the file
    /// cannot be read or written.
    pub fn load(path: impl AsRef<Path>) -> ConfigResult<Self> {
        let path = path.as_ref().to_path_buf();

        let config = if path.exists() {
            let raw = fs::read_to_string(&path).map_err(|source| ConfigError::Read {
                path: path.clone(),
                source,
            })?;
            serde_json::from_str(&raw).map_err(|source| ConfigError::Parse {
                path: path.clone(),
                source,
            })?
        } else {
            info!(
                path = %path.display(),
                "configuration file not found, creating it with defaults"
            );
            BotConfig::default()
        };

        let store = Self {
            path,
            cache: RwLock::new(config),
        };
        // Rewrite unconditionally so newly introduced built-in keys show
        // up in the file with their defaults.
        store.persist()?;
        Ok(store)
    }

    /// The file this store reads and writes.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// A snapshot of the current configuration.
    pub fn snapshot(&self) -> BotConfig {
        self.cache.read().clone()
    }

    /// Returns the token, failing if it was never filled in.
    pub fn token(&self) -> ConfigResult<String> {
        let token = self.cache.read().token.clone();
        if token.is_empty() {
            Err(ConfigError::MissingToken {
                path: self.path.clone(),
            })
        } else {
            Ok(token)
        }
    }

    /// Returns a custom key's value, if present.
    pub fn get(&self, key: &str) -> Option<Value> {
        self.cache.read().extra.get(key).cloned()
    }

    /// Returns a custom key's value, or `default` when absent.
    pub fn get_or(&self, key: &str, default: Value) -> Value {
        self.get(key).unwrap_or(default)
    }

    /// Sets a custom key and synchronously persists the whole file.
    pub fn set(&self, key: impl Into<String>, value: Value) -> ConfigResult<()> {
        self.cache.write().extra.insert(key.into(), value);
        self.persist()
    }

    /// Serializes the full configuration and atomically replaces the file.
    fn persist(&self) -> ConfigResult<()> {
        let config = self.cache.read().clone();
        let json = serde_json::to_string_pretty(&config).map_err(ConfigError::Serialize)?;

        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, json).map_err(|source| ConfigError::Write {
            path: tmp.clone(),
            source,
        })?;
        fs::rename(&tmp, &self.path).map_err(|source| ConfigError::Write {
            path: self.path.clone(),
            source,
        })?;

        debug!(path = %self.path.display(), "configuration persisted");
        Ok(())
    }
}

impl std::fmt::Debug for ConfigStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConfigStore")
            .field("path", &self.path)
            .finish_non_exhaustive()
    }
}
