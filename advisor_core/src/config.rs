//! Advisor configuration.
//!
//! Loaded from JSON with support for an environment variable override
//! (`ADVISOR_CONFIG_PATH`); every section falls back to built-in defaults so
//! a missing or partial file is never fatal.

use std::{
    env, fs, io,
    path::{Path, PathBuf},
    time::Duration,
};

use serde::Deserialize;
use thiserror::Error;

/// Root configuration for the consumer pipeline.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AdvisorConfig {
    pub fog: FogTrimConfig,
    pub minimap: MiniMapConfig,
    pub watcher: WatcherConfig,
    pub report: ReportConfig,
}

impl AdvisorConfig {
    pub fn from_json_str(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config = AdvisorConfig::from_json_str(&contents)?;
        Ok(config)
    }

    /// Load from `ADVISOR_CONFIG_PATH` when set, falling back to defaults.
    pub fn load_from_env() -> (AdvisorConfig, ConfigMetadata) {
        if let Some(path) = env::var("ADVISOR_CONFIG_PATH").ok().map(PathBuf::from) {
            match AdvisorConfig::from_file(&path) {
                Ok(config) => {
                    tracing::info!(
                        target: "turn_advisor::config",
                        path = %path.display(),
                        "advisor_config.loaded=file"
                    );
                    return (config, ConfigMetadata::new(Some(path)));
                }
                Err(err) => {
                    tracing::warn!(
                        target: "turn_advisor::config",
                        path = %path.display(),
                        error = %err,
                        "advisor_config.load_failed"
                    );
                }
            }
        }
        tracing::info!(target: "turn_advisor::config", "advisor_config.loaded=builtin");
        (AdvisorConfig::default(), ConfigMetadata::new(None))
    }
}

/// Fog trimming budget: how many tile observations survive per section and
/// how much yield a plain tile needs to stay interesting. The yield floor is
/// deliberately configurable; the default of 2 is inherited tuning, not law.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct FogTrimConfig {
    pub visible_tile_cap: usize,
    pub foreign_tile_cap: usize,
    pub interest_yield_floor: i32,
}

impl Default for FogTrimConfig {
    fn default() -> Self {
        Self {
            visible_tile_cap: 150,
            foreign_tile_cap: 100,
            interest_yield_floor: 2,
        }
    }
}

/// Mini-map bounds: cells rendered in each direction from the capital.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct MiniMapConfig {
    pub radius: i32,
}

impl Default for MiniMapConfig {
    fn default() -> Self {
        Self { radius: 7 }
    }
}

/// Log watcher cadence and maintenance policy.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct WatcherConfig {
    pub poll_interval_ms: u64,
    /// Rewrite the log keeping the most recent quarter once it grows past
    /// this size. The host keeps appending forever otherwise.
    pub max_log_bytes: u64,
    pub trim_oversized: bool,
    /// Trim checks run every this many polls, not on every wake.
    pub trim_check_every: u32,
    /// Upper bound on buffered unextracted text between polls.
    pub max_pending_bytes: usize,
}

impl Default for WatcherConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: 1000,
            max_log_bytes: 5 * 1024 * 1024,
            trim_oversized: true,
            trim_check_every: 30,
            max_pending_bytes: 50_000,
        }
    }
}

impl WatcherConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms.max(10))
    }
}

/// Producer-side framing limits.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ReportConfig {
    /// Payloads longer than this travel as numbered chunk lines.
    pub max_chunk_len: usize,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self { max_chunk_len: 4000 }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to parse advisor config: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("failed to read advisor config from {path:?}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Where the active configuration came from.
#[derive(Debug, Clone)]
pub struct ConfigMetadata {
    path: Option<PathBuf>,
}

impl ConfigMetadata {
    pub fn new(path: Option<PathBuf>) -> Self {
        Self { path }
    }

    pub fn path(&self) -> Option<&PathBuf> {
        self.path.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_tuned_budgets() {
        let config = AdvisorConfig::default();
        assert_eq!(config.fog.visible_tile_cap, 150);
        assert_eq!(config.fog.foreign_tile_cap, 100);
        assert_eq!(config.fog.interest_yield_floor, 2);
        assert_eq!(config.minimap.radius, 7);
        assert_eq!(config.watcher.poll_interval_ms, 1000);
    }

    #[test]
    fn partial_json_keeps_defaults_elsewhere() {
        let config =
            AdvisorConfig::from_json_str("{\"fog\":{\"visible_tile_cap\":40}}").unwrap();
        assert_eq!(config.fog.visible_tile_cap, 40);
        assert_eq!(config.fog.foreign_tile_cap, 100);
        assert_eq!(config.minimap.radius, 7);
    }

    #[test]
    fn malformed_json_is_a_typed_error() {
        assert!(AdvisorConfig::from_json_str("{\"fog\":").is_err());
    }

    #[test]
    fn poll_interval_never_busy_spins() {
        let config = WatcherConfig {
            poll_interval_ms: 0,
            ..WatcherConfig::default()
        };
        assert!(config.poll_interval() >= Duration::from_millis(10));
    }
}
