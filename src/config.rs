//! Application configuration
//!
//! Loaded from a TOML file. Probe timings are protocol constants and
//! deliberately not configurable.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Top-level configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub store: StoreConfig,

    #[serde(default)]
    pub log: LogConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            store: StoreConfig::default(),
            log: LogConfig::default(),
        }
    }
}

/// Settings-store backing configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Directory holding the SQLite settings database.
    #[serde(default = "default_store_path")]
    pub path: PathBuf,

    /// Namespace the server settings documents live under.
    #[serde(default = "default_namespace")]
    pub namespace: String,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            path: default_store_path(),
            namespace: default_namespace(),
        }
    }
}

/// Log output configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogConfig {
    /// "stdout" or "file".
    #[serde(default = "default_log_output")]
    pub output: String,

    /// Directory for log files when output = "file".
    #[serde(default = "default_log_path")]
    pub path: String,

    /// Daily rotation when output = "file"; append otherwise.
    #[serde(default)]
    pub rotate: bool,

    /// EnvFilter directive used when RUST_LOG is unset.
    #[serde(default = "default_filter_level")]
    pub filter_level: String,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            output: default_log_output(),
            path: default_log_path(),
            rotate: false,
            filter_level: default_filter_level(),
        }
    }
}

fn default_store_path() -> PathBuf {
    PathBuf::from("data")
}

fn default_namespace() -> String {
    "talk".to_string()
}

fn default_log_output() -> String {
    "stdout".to_string()
}

fn default_log_path() -> String {
    "logs".to_string()
}

fn default_filter_level() -> String {
    "info".to_string()
}

impl AppConfig {
    pub fn from_file(path: &Path) -> Result<Self> {
        if !path.is_file() {
            return Err(Error::config(format!(
                "configuration file does not exist: {}",
                path.display()
            )));
        }

        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| Error::config(e.to_string()))
    }

    /// Collects every problem instead of failing on the first.
    pub fn validate(&self) -> std::result::Result<(), Vec<String>> {
        let mut errors = Vec::new();

        if !["stdout", "file"].contains(&self.log.output.as_str()) {
            errors.push(format!(
                "Invalid log output '{}', must be one of: stdout, file",
                self.log.output
            ));
        }

        if self.log.output == "file" && self.log.path.trim().is_empty() {
            errors.push("Log path cannot be empty when output = \"file\"".to_string());
        }

        let main_level = self
            .log
            .filter_level
            .split(',')
            .next()
            .unwrap_or("")
            .trim()
            .to_ascii_lowercase();
        if !["trace", "debug", "info", "warn", "error", "off"].contains(&main_level.as_str()) {
            errors.push(format!(
                "Invalid filter level '{}', must start with one of: trace, debug, info, warn, error, off",
                self.log.filter_level
            ));
        }

        if self.store.namespace.trim().is_empty() {
            errors.push("Store namespace cannot be empty".to_string());
        }

        if errors.is_empty() { Ok(()) } else { Err(errors) }
    }
}
