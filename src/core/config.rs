//! Configuration management for the database core.
//!
//! Defaults are applied first, then an optional TOML file, then
//! environment variable overrides, following the layered shape the
//! teacher's configuration module used for its own server settings.

use crate::core::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Top-level configuration for an embedded database instance.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Storage (repository/blob file) configuration.
    pub storage: StorageConfig,

    /// Delta-mirroring client configuration.
    pub mirror: MirrorConfig,

    /// Logging configuration.
    pub logging: LoggingConfig,
}

/// Storage configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Working directory holding `.cache`/`.store`/`.dat`/`.idx` files.
    pub data_dir: PathBuf,

    /// Application name, used to resolve the ADP profile file name.
    pub app_name: String,

    /// Interval between forced syncs of append-only repository files.
    #[serde(deserialize_with = "deserialize_duration")]
    pub sync_interval: Duration,
}

/// Delta-mirroring client configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MirrorConfig {
    /// Whether the delta client is attached at all. Disabled by default
    /// so tests and offline tools don't need a mirror daemon running.
    pub enabled: bool,

    /// Path to the cluster-wide mirror daemon address/port file.
    pub cluster_config_path: PathBuf,

    /// Send/receive timeout.
    #[serde(deserialize_with = "deserialize_duration")]
    pub timeout: Duration,
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error).
    pub level: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            storage: StorageConfig::default(),
            mirror: MirrorConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("./data"),
            app_name: "app".to_string(),
            sync_interval: Duration::from_secs(5),
        }
    }
}

impl Default for MirrorConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            cluster_config_path: PathBuf::from(crate::constants::CLUSTER_CONFIG_PATH),
            timeout: Duration::from_secs(crate::constants::DELTA_CLIENT_TIMEOUT_SECS),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

impl Config {
    /// Load configuration: defaults, then an optional TOML file at
    /// `hadronstore.toml` in the current directory, then environment
    /// variable overrides.
    pub fn load() -> Result<Self> {
        let mut config = match Self::from_file("hadronstore.toml") {
            Ok(file_config) => file_config,
            Err(_) => Config::default(),
        };

        config.apply_env_overrides()?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a TOML file.
    pub fn from_file(path: impl AsRef<std::path::Path>) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("failed to read config file: {e}")))?;

        toml::from_str(&contents).map_err(|e| Error::Config(format!("failed to parse config file: {e}")))
    }

    /// Apply environment variable overrides.
    fn apply_env_overrides(&mut self) -> Result<()> {
        use std::env;

        if let Ok(dir) = env::var("HDB_DATA_DIR") {
            self.storage.data_dir = PathBuf::from(dir);
        }

        if let Ok(name) = env::var("HDB_APP_NAME") {
            self.storage.app_name = name;
        }

        if let Ok(interval) = env::var("HDB_SYNC_INTERVAL") {
            self.storage.sync_interval =
                parse_duration(&interval).map_err(|e| Error::Config(format!("invalid HDB_SYNC_INTERVAL: {e}")))?;
        }

        if let Ok(flag) = env::var("HDB_MIRROR_ENABLED") {
            self.mirror.enabled = matches!(flag.as_str(), "1" | "true" | "yes");
        }

        if let Ok(path) = env::var("HDB_CLUSTER_CONFIG") {
            self.mirror.cluster_config_path = PathBuf::from(path);
        }

        if let Ok(level) = env::var("HDB_LOG_LEVEL") {
            self.logging.level = level;
        }

        Ok(())
    }

    /// Validate configuration values.
    fn validate(&self) -> Result<()> {
        if self.storage.app_name.is_empty() {
            return Err(Error::Config("app_name must not be empty".to_string()));
        }

        match self.logging.level.as_str() {
            "trace" | "debug" | "info" | "warn" | "error" => {}
            _ => return Err(Error::Config("invalid log level".to_string())),
        }

        Ok(())
    }
}

use serde::de::{self, Deserializer, Visitor};
use std::fmt;

fn deserialize_duration<'de, D>(deserializer: D) -> std::result::Result<Duration, D::Error>
where
    D: Deserializer<'de>,
{
    struct DurationVisitor;

    impl<'de> Visitor<'de> for DurationVisitor {
        type Value = Duration;

        fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
            formatter.write_str("a duration string like '30s' or '5m'")
        }

        fn visit_str<E>(self, value: &str) -> std::result::Result<Duration, E>
        where
            E: de::Error,
        {
            parse_duration(value).map_err(E::custom)
        }
    }

    deserializer.deserialize_str(DurationVisitor)
}

/// Parses durations of the form `"30s"`, `"5m"`, `"2h"`, `"250ms"`, or a
/// bare integer number of seconds.
fn parse_duration(s: &str) -> std::result::Result<Duration, String> {
    if let Some(ms) = s.strip_suffix("ms") {
        return ms.parse().map(Duration::from_millis).map_err(|_| "invalid milliseconds".to_string());
    }
    if let Some(secs) = s.strip_suffix('s') {
        return secs.parse().map(Duration::from_secs).map_err(|_| "invalid seconds".to_string());
    }
    if let Some(mins) = s.strip_suffix('m') {
        return mins
            .parse::<u64>()
            .map(|m| Duration::from_secs(m * 60))
            .map_err(|_| "invalid minutes".to_string());
    }
    if let Some(hours) = s.strip_suffix('h') {
        return hours
            .parse::<u64>()
            .map(|h| Duration::from_secs(h * 3600))
            .map_err(|_| "invalid hours".to_string());
    }
    s.parse().map(Duration::from_secs).map_err(|_| "invalid duration format".to_string())
}
