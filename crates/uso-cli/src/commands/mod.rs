//! CLI command implementations.
//!
//! Every command loads the configuration, opens the cache and store, and
//! connects a [`SyncEngine`] before doing its work.

pub mod cache;
pub mod chart;
pub mod import_charts;
pub mod profile;

use std::path::Path;

use anyhow::{Context, Result};
use tracing::{info, warn};
use uso_core::{CacheStore, Config, LocalStore, OsuApi, RosuEngine, SyncEngine};

/// Load the config file, falling back to defaults when it does not exist
pub fn load_config(path: &Path, api_key: Option<String>) -> Result<Config> {
    let mut config = if path.exists() {
        let config = Config::load(path)
            .with_context(|| format!("Failed to load config from {}", path.display()))?;
        info!("Loaded config from {:?}", path);
        config
    } else {
        warn!("Config file {:?} not found, using defaults", path);
        Config::default()
    };

    if let Some(key) = api_key {
        config.api.key = key;
    }
    Ok(config)
}

/// Open the chart cache with the configured directory and capacity
pub fn open_cache(config: &Config) -> Result<CacheStore> {
    CacheStore::open(&config.cache.directory, config.cache.capacity).with_context(|| {
        format!(
            "Failed to open chart cache at {}",
            config.cache.directory.display()
        )
    })
}

/// Build a connected sync engine
pub fn connect(config: &Config) -> Result<SyncEngine> {
    if config.api.key.is_empty() {
        warn!("No API key configured, requests will be rejected by the service");
    }

    let store = LocalStore::open(&config.store.path).with_context(|| {
        format!("Failed to open store at {}", config.store.path.display())
    })?;
    let sync = SyncEngine::new(open_cache(config)?, RosuEngine::new(), config.sync_settings()?);
    sync.connect(OsuApi::new(&config.api), store);
    Ok(sync)
}
