//! Application-level configuration loading: local storage medium and store tunables.

use std::{env, fs, io::ErrorKind, path::PathBuf, sync::Arc};

use serde::Deserialize;
use tracing::{info, warn};

use crate::{
    dao::kv::{FileKvBackend, KeyValueBackend, MemoryKvBackend},
    state::{DEFAULT_EVENT_CAPACITY, DEFAULT_SESSION_LIMIT, RenamePolicy, StoreOptions},
};

/// Default location on disk where the server looks for the JSON configuration.
const DEFAULT_CONFIG_PATH: &str = "config/app.json";
/// Environment variable that overrides [`DEFAULT_CONFIG_PATH`].
const CONFIG_PATH_ENV: &str = "TAROT_TRACKER_CONFIG_PATH";
const DEFAULT_DATA_DIR: &str = "data";

/// Where the local documents live.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum StorageConfig {
    /// One JSON file per key under `path`.
    File {
        /// Directory holding the documents.
        #[serde(default = "default_data_dir")]
        path: PathBuf,
    },
    /// Lost on exit.
    Memory,
}

impl Default for StorageConfig {
    fn default() -> Self {
        StorageConfig::File {
            path: default_data_dir(),
        }
    }
}

fn default_data_dir() -> PathBuf {
    PathBuf::from(DEFAULT_DATA_DIR)
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
/// Immutable runtime configuration shared across the application.
pub struct AppConfig {
    /// Local storage medium.
    pub storage: StorageConfig,
    /// Sessions a free-tier user may keep.
    pub session_limit: usize,
    /// Remote rows touched by a player rename.
    pub rename_scope: RenamePolicy,
    /// Events buffered per change-feed subscriber.
    pub event_capacity: usize,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            storage: StorageConfig::default(),
            session_limit: DEFAULT_SESSION_LIMIT,
            rename_scope: RenamePolicy::default(),
            event_capacity: DEFAULT_EVENT_CAPACITY,
        }
    }
}

impl AppConfig {
    /// Load the application configuration from disk, falling back to built-in defaults.
    pub fn load() -> Self {
        let path = resolve_config_path();
        match fs::read_to_string(&path) {
            Ok(contents) => match serde_json::from_str::<Self>(&contents) {
                Ok(config) => {
                    info!(
                        path = %path.display(),
                        storage = ?config.storage,
                        session_limit = config.session_limit,
                        "loaded configuration"
                    );
                    config
                }
                Err(err) => {
                    warn!(
                        path = %path.display(),
                        error = %err,
                        "failed to parse config; falling back to defaults"
                    );
                    Self::default()
                }
            },
            Err(err) if err.kind() == ErrorKind::NotFound => {
                info!(
                    path = %path.display(),
                    "config file not found; using built-in defaults"
                );
                Self::default()
            }
            Err(err) => {
                warn!(
                    path = %path.display(),
                    error = %err,
                    "failed to read config; falling back to defaults"
                );
                Self::default()
            }
        }
    }

    /// Session store tunables derived from this configuration.
    pub fn store_options(&self) -> StoreOptions {
        StoreOptions {
            session_limit: self.session_limit,
            rename_policy: self.rename_scope,
            event_capacity: self.event_capacity,
        }
    }

    /// Instantiate the configured key-value backend.
    pub fn kv_backend(&self) -> Arc<dyn KeyValueBackend> {
        match &self.storage {
            StorageConfig::File { path } => Arc::new(FileKvBackend::new(path.clone())),
            StorageConfig::Memory => Arc::new(MemoryKvBackend::new()),
        }
    }
}

/// Resolve the configuration path taking the environment override into account.
fn resolve_config_path() -> PathBuf {
    env::var_os(CONFIG_PATH_ENV)
        .map(PathBuf::from)
        .filter(|path| !path.as_os_str().is_empty())
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_fields_use_defaults() {
        let config: AppConfig = serde_json::from_str(r#"{"session_limit": 3}"#).unwrap();
        assert_eq!(config.session_limit, 3);
        assert_eq!(config.storage, StorageConfig::default());
        assert_eq!(config.rename_scope, RenamePolicy::Everywhere);
        assert_eq!(config.event_capacity, DEFAULT_EVENT_CAPACITY);
    }

    #[test]
    fn storage_kind_is_tagged() {
        let config: AppConfig = serde_json::from_str(
            r#"{"storage": {"kind": "memory"}, "rename_scope": "linked_sessions"}"#,
        )
        .unwrap();
        assert_eq!(config.storage, StorageConfig::Memory);
        assert_eq!(
            config.store_options().rename_policy,
            RenamePolicy::LinkedSessions
        );

        let config: AppConfig =
            serde_json::from_str(r#"{"storage": {"kind": "file"}}"#).unwrap();
        assert_eq!(
            config.storage,
            StorageConfig::File {
                path: PathBuf::from("data")
            }
        );
    }
}
