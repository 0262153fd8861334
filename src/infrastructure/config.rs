//! Configuration management for the relay
//!
//! Loads configuration from config.toml at startup.
//! Every value has a default, so a missing file or section is fine.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

use crate::relay::reaper::DEFAULT_INACTIVITY_TIMEOUT_MS;
use crate::relay::retention::DEFAULT_MAX_MESSAGE_OFFSET;

/// Relay configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    /// Retention and liveness settings
    #[serde(default)]
    pub relay: RelayConfig,

    /// API server settings
    #[serde(default)]
    pub api: ApiConfig,

    /// Snapshot storage settings
    #[serde(default)]
    pub storage: StorageConfig,
}

/// Retention and liveness tuning
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RelayConfig {
    /// How far a cursor may lag the log tail before it is clamped
    #[serde(default = "default_max_message_offset")]
    pub max_message_offset: i64,

    /// Idle time after which a connection is evicted
    #[serde(default = "default_inactivity_timeout_ms")]
    pub inactivity_timeout_ms: u64,

    /// Inactivity check period
    #[serde(default = "default_reaper_interval_ms")]
    pub reaper_interval_ms: u64,

    /// Retention + persist period
    #[serde(default = "default_cleanup_interval_ms")]
    pub cleanup_interval_ms: u64,
}

/// API server configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ApiConfig {
    /// Port for HTTP API server
    #[serde(default = "default_api_port")]
    pub port: u16,
}

/// Snapshot storage configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StorageConfig {
    /// JSON snapshot file
    #[serde(default = "default_db_path")]
    pub db_path: PathBuf,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            max_message_offset: default_max_message_offset(),
            inactivity_timeout_ms: default_inactivity_timeout_ms(),
            reaper_interval_ms: default_reaper_interval_ms(),
            cleanup_interval_ms: default_cleanup_interval_ms(),
        }
    }
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            port: default_api_port(),
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            db_path: default_db_path(),
        }
    }
}

fn default_max_message_offset() -> i64 {
    DEFAULT_MAX_MESSAGE_OFFSET
}

fn default_inactivity_timeout_ms() -> u64 {
    DEFAULT_INACTIVITY_TIMEOUT_MS
}

fn default_reaper_interval_ms() -> u64 {
    5_000
}

fn default_cleanup_interval_ms() -> u64 {
    10_000
}

fn default_api_port() -> u16 {
    12000
}

fn default_db_path() -> PathBuf {
    PathBuf::from("db.json")
}

impl RelayConfig {
    pub fn reaper_interval(&self) -> Duration {
        Duration::from_millis(self.reaper_interval_ms)
    }

    pub fn cleanup_interval(&self) -> Duration {
        Duration::from_millis(self.cleanup_interval_ms)
    }
}

impl Config {
    /// Load configuration from the file named by `CONFIG_PATH` (default config.toml)
    ///
    /// If the file doesn't exist, returns default configuration.
    /// # Errors
    /// Returns error if file exists but cannot be read or parsed.
    pub fn load() -> Result<Self, ConfigError> {
        let config_path =
            std::env::var("CONFIG_PATH").unwrap_or_else(|_| "config.toml".to_string());
        Self::load_from(&config_path)
    }

    pub fn load_from(path: impl AsRef<std::path::Path>) -> Result<Self, ConfigError> {
        match std::fs::read_to_string(path.as_ref()) {
            Ok(contents) => Self::parse(&contents),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Config::default()),
            Err(e) => Err(ConfigError::IoError(e)),
        }
    }

    pub fn parse(contents: &str) -> Result<Self, ConfigError> {
        let config: Config =
            toml::from_str(contents).map_err(|e| ConfigError::ParseError(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Reject values the periodic tasks cannot run with
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.relay.reaper_interval_ms == 0 {
            return Err(ConfigError::Invalid("relay.reaper_interval_ms must be > 0"));
        }
        if self.relay.cleanup_interval_ms == 0 {
            return Err(ConfigError::Invalid("relay.cleanup_interval_ms must be > 0"));
        }
        if self.relay.max_message_offset < 0 {
            return Err(ConfigError::Invalid("relay.max_message_offset must be >= 0"));
        }
        Ok(())
    }
}

/// Configuration loading errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// IO error reading file
    #[error("Failed to read config file: {0}")]
    IoError(#[from] std::io::Error),
    /// Parse error (invalid TOML)
    #[error("Failed to parse config: {0}")]
    ParseError(String),
    /// Value out of range
    #[error("Invalid config: {0}")]
    Invalid(&'static str),
}
