// src/config.rs

//! Configuration loading
//!
//! Settings come from an optional TOML file; command-line flags are applied
//! on top by the CLI layer.
//!
//! ```toml
//! cache_dir = "/var/cache/plugdeps"
//! legacy_version_packing = false
//!
//! [network]
//! connect_timeout_secs = 20
//! max_retries = 3
//! retry_delay_ms = 1000
//! max_retry_time_secs = 60
//! jobs = 4
//!
//! [remote]
//! plugins_url = "https://updates.jenkins.io/download/plugins"
//! core_url = "https://updates.jenkins.io/download/war"
//! ```

use crate::error::{Error, Result};
use crate::version::VersionOrdering;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::debug;

/// Top-level configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Local artifact cache; an ephemeral directory is used when unset
    pub cache_dir: Option<PathBuf>,
    /// Downgrade fatal errors to warnings at the command level
    pub force: bool,
    /// Order versions with the legacy packed-integer key
    pub legacy_version_packing: bool,
    pub network: NetworkConfig,
    pub remote: RemoteConfig,
}

/// Timeout and retry tuning for remote fetches
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NetworkConfig {
    pub connect_timeout_secs: u64,
    pub max_retries: u32,
    pub retry_delay_ms: u64,
    pub max_retry_time_secs: u64,
    /// Parallel fetch workers per resolution batch
    pub jobs: usize,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            connect_timeout_secs: 20,
            max_retries: 3,
            retry_delay_ms: 1000,
            max_retry_time_secs: 60,
            jobs: 4,
        }
    }
}

impl NetworkConfig {
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }

    pub fn retry_delay(&self) -> Duration {
        Duration::from_millis(self.retry_delay_ms)
    }

    pub fn max_retry_time(&self) -> Duration {
        Duration::from_secs(self.max_retry_time_secs)
    }
}

/// Remote base locations
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RemoteConfig {
    /// Base for plugin listings and packages
    pub plugins_url: String,
    /// Base for host application listings and packages
    pub core_url: String,
    /// File stem of the host application package
    pub core_artifact: String,
    pub plugin_extension: String,
    pub core_extension: String,
    /// Advisory feed document
    pub feed_url: String,
}

impl Default for RemoteConfig {
    fn default() -> Self {
        Self {
            plugins_url: "https://updates.jenkins.io/download/plugins".to_string(),
            core_url: "https://updates.jenkins.io/download/war".to_string(),
            core_artifact: "jenkins".to_string(),
            plugin_extension: "hpi".to_string(),
            core_extension: "war".to_string(),
            feed_url: "https://updates.jenkins.io/update-center.json".to_string(),
        }
    }
}

impl Config {
    /// Default config file location (`$XDG_CONFIG_HOME/plugdeps/config.toml`)
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("plugdeps").join("config.toml"))
    }

    /// Load configuration
    ///
    /// An explicit path must exist. Without one, the default location is
    /// read if present and built-in defaults are used otherwise.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::from_file(path),
            None => match Self::default_path() {
                Some(default) if default.exists() => Self::from_file(&default),
                _ => {
                    debug!("No configuration file, using defaults");
                    Ok(Self::default())
                }
            },
        }
    }

    /// Parse a TOML configuration file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            Error::ConfigError(format!("Failed to read {}: {}", path.display(), e))
        })?;
        let config = Self::parse(&content)
            .map_err(|e| Error::ConfigError(format!("{}: {}", path.display(), e)))?;
        debug!("Loaded configuration from {}", path.display());
        Ok(config)
    }

    /// Parse configuration from TOML text
    pub fn parse(content: &str) -> Result<Self> {
        let config: Config =
            toml::from_str(content).map_err(|e| Error::ConfigError(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.network.jobs == 0 {
            return Err(Error::ConfigError(
                "network.jobs must be at least 1".to_string(),
            ));
        }
        if self.network.max_retries == 0 {
            return Err(Error::ConfigError(
                "network.max_retries must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    /// Version ordering selected by `legacy_version_packing`
    pub fn ordering(&self) -> VersionOrdering {
        VersionOrdering::from_legacy_flag(self.legacy_version_packing)
    }
}
