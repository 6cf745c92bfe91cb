//! Configuration loading and management
//!
//! Configuration is loaded from `~/.config/mobeacon/config.toml`
//!
//! This module follows the XDG Base Directory Specification:
//! - Config: `$XDG_CONFIG_HOME/mobeacon/` (~/.config/mobeacon/)
//! - Data: `$XDG_DATA_HOME/mobeacon/` (~/.local/share/mobeacon/)
//! - State/Logs: `$XDG_STATE_HOME/mobeacon/` (~/.local/state/mobeacon/)

use crate::error::{Error, Result};
use serde::Deserialize;
use std::path::PathBuf;

/// Returns a best-effort home directory path.
fn home_dir() -> PathBuf {
    std::env::var_os("HOME")
        .map(PathBuf::from)
        .or_else(dirs::home_dir)
        .unwrap_or_else(|| PathBuf::from("."))
}

/// Returns XDG_CONFIG_HOME or ~/.config
fn xdg_config_home() -> PathBuf {
    std::env::var("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| home_dir().join(".config"))
}

/// Returns XDG_DATA_HOME or ~/.local/share
fn xdg_data_home() -> PathBuf {
    std::env::var("XDG_DATA_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| home_dir().join(".local/share"))
}

/// Returns XDG_STATE_HOME or ~/.local/state
fn xdg_state_home() -> PathBuf {
    std::env::var("XDG_STATE_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| home_dir().join(".local/state"))
}

/// Main configuration struct
#[derive(Debug, Deserialize, Default)]
pub struct Config {
    /// Collector endpoint configuration
    #[serde(default)]
    pub collector: CollectorConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Config {
    /// Load configuration from the default path
    ///
    /// A missing config file is not an error; defaults apply.
    pub fn load() -> Result<Self> {
        let path = Self::config_path();
        if !path.exists() {
            return Ok(Config::default());
        }

        let contents = std::fs::read_to_string(&path)?;
        toml::from_str(&contents)
            .map_err(|e| Error::Config(format!("failed to parse {}: {}", path.display(), e)))
    }

    /// Returns the config file path
    pub fn config_path() -> PathBuf {
        xdg_config_home().join("mobeacon").join("config.toml")
    }

    /// Returns the default database path
    pub fn database_path() -> PathBuf {
        xdg_data_home().join("mobeacon").join("mobeacon.db")
    }

    /// Returns the state directory (logs)
    pub fn state_dir() -> PathBuf {
        xdg_state_home().join("mobeacon")
    }

    /// Returns the log file path
    pub fn log_path() -> PathBuf {
        Self::state_dir().join("mobeacon.log")
    }
}

/// Analytics collector endpoint configuration
///
/// The agent only ever talks to one collector host; beacons are GET requests
/// against its `__utm.gif` endpoint.
#[derive(Debug, Deserialize, Clone)]
pub struct CollectorConfig {
    /// Collector hostname the beacon URLs point at
    #[serde(default = "default_collector_host")]
    pub host: String,

    /// HTTP request timeout in seconds
    #[serde(default = "default_collector_timeout")]
    pub timeout_secs: u64,
}

impl Default for CollectorConfig {
    fn default() -> Self {
        Self {
            host: default_collector_host(),
            timeout_secs: default_collector_timeout(),
        }
    }
}

impl CollectorConfig {
    /// Validate configuration, returning error message if invalid
    pub fn validate(&self) -> Result<()> {
        if self.host.is_empty() {
            return Err(Error::Config(
                "collector.host must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}

fn default_collector_host() -> String {
    "www.google-analytics.com".to_string()
}

fn default_collector_timeout() -> u64 {
    30
}

/// Logging configuration
#[derive(Debug, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.collector.host, "www.google-analytics.com");
        assert_eq!(config.collector.timeout_secs, 30);
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_parse_partial_config() {
        let config: Config = toml::from_str(
            r#"
            [collector]
            host = "collector.example.com"
            "#,
        )
        .unwrap();
        assert_eq!(config.collector.host, "collector.example.com");
        assert_eq!(config.collector.timeout_secs, 30);
    }

    #[test]
    fn test_collector_validate_rejects_empty_host() {
        let config = CollectorConfig {
            host: String::new(),
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_paths_are_namespaced() {
        assert!(Config::config_path().ends_with("mobeacon/config.toml"));
        assert!(Config::database_path().ends_with("mobeacon/mobeacon.db"));
        assert!(Config::log_path().ends_with("mobeacon/mobeacon.log"));
    }
}
