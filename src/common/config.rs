//! Configuration file handling

use serde::Deserialize;
use std::path::Path;

use super::paths::config_path;
use super::Result;

/// Main configuration structure
#[derive(Debug, Deserialize, Default, Clone)]
pub struct Config {
    /// Timeout settings
    #[serde(default)]
    pub timeouts: Timeouts,

    /// Bootstrap settings
    #[serde(default)]
    pub bootstrap: BootstrapSettings,

    /// Log collection settings
    #[serde(default)]
    pub logs: LogSettings,
}

/// Timeout settings in seconds
#[derive(Debug, Deserialize, Clone)]
pub struct Timeouts {
    /// How long `wait_for_started` polls before giving up
    #[serde(default = "default_started")]
    pub started_secs: u64,

    /// Delay between two status polls
    #[serde(default = "default_status_interval")]
    pub status_interval_secs: u64,
}

impl Default for Timeouts {
    fn default() -> Self {
        Self {
            started_secs: default_started(),
            status_interval_secs: default_status_interval(),
        }
    }
}

fn default_started() -> u64 {
    1200
}
fn default_status_interval() -> u64 {
    5
}

/// Bootstrap settings
#[derive(Debug, Deserialize, Clone)]
pub struct BootstrapSettings {
    /// Constraints passed to `juju bootstrap`
    #[serde(default = "default_constraints")]
    pub constraints: String,
}

impl Default for BootstrapSettings {
    fn default() -> Self {
        Self {
            constraints: default_constraints(),
        }
    }
}

fn default_constraints() -> String {
    "mem=2G".to_string()
}

/// Log collection settings
#[derive(Debug, Deserialize, Clone)]
pub struct LogSettings {
    /// Number of `debug-log` lines collected at teardown
    #[serde(default = "default_debug_log_lines")]
    pub debug_log_lines: u32,
}

impl Default for LogSettings {
    fn default() -> Self {
        Self {
            debug_log_lines: default_debug_log_lines(),
        }
    }
}

fn default_debug_log_lines() -> u32 {
    1000
}

impl Config {
    /// Load configuration from the default config file
    ///
    /// Returns default configuration if file doesn't exist
    pub fn load() -> Result<Self> {
        match config_path() {
            Some(path) if path.exists() => Self::load_from(&path),
            _ => Ok(Self::default()),
        }
    }

    /// Load configuration from an explicit file
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| super::Error::FileRead {
            path: path.display().to_string(),
            error: e.to_string(),
        })?;
        toml::from_str(&content).map_err(|e| super::Error::ConfigParse(e.to_string()))
    }
}
