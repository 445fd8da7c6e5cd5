//! Loads and caches the application configuration.
//!
//! The configuration lives in `config.toml` under the confab config
//! directory (see [`ConfabPaths`]). The file is parsed once and served from
//! an in-memory cache until [`ConfigService::invalidate_cache`] is called.

use crate::dto::ConfigRoot;
use crate::paths::ConfabPaths;
use crate::storage::AtomicTomlFile;
use confab_core::config::ChatDefaults;
use std::path::PathBuf;
use std::sync::{Arc, RwLock};

/// Loads the application configuration and hands out cached copies.
pub struct ConfigService {
    /// Parsed configuration, populated on first read.
    config: Arc<RwLock<Option<ConfigRoot>>>,
    /// Location of the configuration file, if it could be resolved.
    path: Option<PathBuf>,
}

impl ConfigService {
    /// Creates a service reading from the platform config location.
    pub fn new() -> Self {
        Self {
            config: Arc::new(RwLock::new(None)),
            path: ConfabPaths::config_file().ok(),
        }
    }

    /// Creates a service reading from an explicit file path.
    pub fn with_path(path: PathBuf) -> Self {
        Self {
            config: Arc::new(RwLock::new(None)),
            path: Some(path),
        }
    }

    /// Returns the configuration, loading it on first access.
    pub fn get_config(&self) -> ConfigRoot {
        // Cached read first
        {
            let cached = self.config.read().unwrap();
            if let Some(config) = cached.as_ref() {
                return config.clone();
            }
        }

        let config = self.load_config().unwrap_or_default();

        // Store for later calls
        {
            let mut slot = self.config.write().unwrap();
            *slot = Some(config.clone());
        }

        config
    }

    /// Returns the chat defaults section of the configuration.
    pub fn chat_defaults(&self) -> ChatDefaults {
        self.get_config().chat
    }

    /// Drops the cached configuration so the next access re-reads the file.
    pub fn invalidate_cache(&self) {
        let mut slot = self.config.write().unwrap();
        *slot = None;
    }

    /// Loads the configuration file, materializing a default one if missing.
    fn load_config(&self) -> Option<ConfigRoot> {
        let path = self.path.clone()?;
        let file = AtomicTomlFile::<ConfigRoot>::new(path);

        match file.load() {
            Ok(Some(config)) => Some(config),
            Ok(None) => {
                let default_config = ConfigRoot::default();
                if let Err(e) = file.save(&default_config) {
                    tracing::warn!("[ConfigService] Failed to write default config: {}", e);
                }
                Some(default_config)
            }
            Err(e) => {
                tracing::warn!("[ConfigService] Failed to load config, using defaults: {}", e);
                None
            }
        }
    }
}

impl Default for ConfigService {
    fn default() -> Self {
        Self::new()
    }
}
