//! Configuration and tuning constants.
//!
//! This module contains:
//! - `Config` - the TOML configuration file (API, cache, store, sync sections)
//! - `SyncSettings` - the runtime knobs consumed by the sync engine
//! - Default constants for the cache and sync policies

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

use crate::error::{Error, Result};

/// Remote API defaults.
pub mod api {
    /// Base URL of the osu! web service.
    pub const DEFAULT_BASE_URL: &str = "https://osu.ppy.sh";

    /// Request timeout in seconds.
    pub const DEFAULT_TIMEOUT_SECS: u64 = 30;
}

/// Chart payload cache defaults.
pub mod cache {
    /// Default cache directory, relative to the working directory.
    pub const DEFAULT_DIRECTORY: &str = "cache/charts";

    /// Default maximum number of cached chart files.
    pub const DEFAULT_CAPACITY: usize = 1_000_000;

    /// The cache always keeps room for at least one entry.
    pub const MIN_CAPACITY: usize = 1;
}

/// Record synchronization policy.
pub mod sync {
    /// A stored profile older than this many hours is refreshed on request.
    pub const PROFILE_FRESHNESS_HOURS: i64 = 24;

    /// Minimum increase of raw pp before profile stats are recomputed.
    pub const PROFILE_PP_THRESHOLD: f64 = 5.0;

    /// Bounds of the best-play sample used for profile statistics.
    pub const MIN_SAMPLE_SIZE: u32 = 1;
    pub const MAX_SAMPLE_SIZE: u32 = 100;

    /// Default best-play sample size.
    pub const DEFAULT_SAMPLE_SIZE: u32 = 100;
}

/// Default local store file.
pub const DEFAULT_STORE_PATH: &str = "uso-store.json";

/// Top-level configuration file.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub api: ApiConfig,
    pub cache: CacheConfig,
    pub store: StoreConfig,
    pub sync: SyncConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    pub key: String,
    pub base_url: String,
    pub timeout_secs: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            key: String::new(),
            base_url: api::DEFAULT_BASE_URL.to_string(),
            timeout_secs: api::DEFAULT_TIMEOUT_SECS,
        }
    }
}

impl ApiConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    pub directory: PathBuf,
    pub capacity: usize,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            directory: PathBuf::from(cache::DEFAULT_DIRECTORY),
            capacity: cache::DEFAULT_CAPACITY,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    pub path: PathBuf,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from(DEFAULT_STORE_PATH),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
    pub profile_freshness_hours: i64,
    pub profile_pp_threshold: f64,
    pub best_sample_size: u32,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            profile_freshness_hours: sync::PROFILE_FRESHNESS_HOURS,
            profile_pp_threshold: sync::PROFILE_PP_THRESHOLD,
            best_sample_size: sync::DEFAULT_SAMPLE_SIZE,
        }
    }
}

impl Config {
    /// Load configuration from a TOML file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Self::parse(&content)
    }

    /// Parse configuration from TOML text
    pub fn parse(content: &str) -> Result<Self> {
        let config: Config =
            toml::from_str(content).map_err(|e| Error::ConfigParseError(e.to_string()))?;
        config.sync_settings()?;
        Ok(config)
    }

    pub fn sync_settings(&self) -> Result<SyncSettings> {
        let hours = self.sync.profile_freshness_hours;
        let profile_freshness = chrono::Duration::try_hours(hours).ok_or_else(|| {
            Error::ConfigParseError(format!("profile_freshness_hours out of range: {}", hours))
        })?;

        Ok(SyncSettings {
            profile_freshness,
            profile_pp_threshold: self.sync.profile_pp_threshold,
            sample_size: self.sync.best_sample_size,
        })
    }
}

/// Policy knobs used by [`crate::sync::SyncEngine`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SyncSettings {
    pub profile_freshness: chrono::Duration,
    pub profile_pp_threshold: f64,
    pub sample_size: u32,
}

impl Default for SyncSettings {
    fn default() -> Self {
        Self {
            profile_freshness: chrono::Duration::hours(sync::PROFILE_FRESHNESS_HOURS),
            profile_pp_threshold: sync::PROFILE_PP_THRESHOLD,
            sample_size: sync::DEFAULT_SAMPLE_SIZE,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.api.base_url, "https://osu.ppy.sh");
        assert_eq!(config.api.timeout(), Duration::from_secs(30));
        assert_eq!(config.cache.capacity, 1_000_000);
        assert_eq!(config.store.path, PathBuf::from("uso-store.json"));

        let settings = config.sync_settings().unwrap();
        assert_eq!(settings, SyncSettings::default());
        assert_eq!(settings.profile_freshness, chrono::Duration::days(1));
        assert_eq!(settings.profile_pp_threshold, 5.0);
        assert_eq!(settings.sample_size, 100);
    }

    #[test]
    fn test_parse_partial_file() {
        let config = Config::parse(
            r#"
            [api]
            key = "secret"

            [cache]
            capacity = 50

            [sync]
            best_sample_size = 20
            "#,
        )
        .unwrap();

        assert_eq!(config.api.key, "secret");
        assert_eq!(config.api.base_url, api::DEFAULT_BASE_URL);
        assert_eq!(config.cache.capacity, 50);
        assert_eq!(config.cache.directory, PathBuf::from(cache::DEFAULT_DIRECTORY));
        assert_eq!(config.sync.best_sample_size, 20);
        assert_eq!(config.sync.profile_freshness_hours, 24);
    }

    #[test]
    fn test_parse_error() {
        let result = Config::parse("[api\nkey = 1");
        assert!(matches!(result, Err(Error::ConfigParseError(_))));
    }

    #[test]
    fn test_out_of_range_freshness_is_rejected() {
        let result = Config::parse("[sync]\nprofile_freshness_hours = 9223372036854775807\n");
        assert!(matches!(result, Err(Error::ConfigParseError(_))));

        let mut config = Config::default();
        config.sync.profile_freshness_hours = i64::MIN;
        assert!(matches!(config.sync_settings(), Err(Error::ConfigParseError(_))));
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("uso.toml");
        fs::write(&path, "[store]\npath = \"records.json\"\n").unwrap();

        let config = Config::load(&path).unwrap();
        assert_eq!(config.store.path, PathBuf::from("records.json"));
    }
}
