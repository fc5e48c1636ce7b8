// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Station configuration loaded from `medsync.toml`

use crate::audit::Actor;
use crate::queue::BackoffPolicy;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

/// Default configuration file name
pub const CONFIG_FILE: &str = "medsync.toml";

/// Path of the records endpoint relative to the server base URL
pub const RECORDS_PATH: &str = "/api/medical/records";

/// Path probed to decide whether the server is reachable
pub const HEALTH_PATH: &str = "/api/health";

/// Errors from loading or validating configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("invalid config: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("missing required setting: {0}")]
    Missing(&'static str),
    #[error("server_url must start with http:// or https://, got {0}")]
    InvalidUrl(String),
    #[error("sync.max_attempts must be at least 1")]
    NoAttempts,
}

/// Sync pipeline tuning
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
    /// Period of the background drain
    #[serde(with = "humantime_serde")]
    pub interval: Duration,
    /// Unit of the exponential backoff
    #[serde(with = "humantime_serde")]
    pub backoff_base: Duration,
    /// Failed attempts before a queue item needs manual retry
    pub max_attempts: u32,
    /// Per-request timeout for the sync POST
    #[serde(with = "humantime_serde")]
    pub request_timeout: Duration,
    /// How often the daemon probes the server for reachability
    #[serde(with = "humantime_serde")]
    pub probe_interval: Duration,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(30),
            backoff_base: Duration::from_secs(2),
            max_attempts: 5,
            request_timeout: Duration::from_secs(15),
            probe_interval: Duration::from_secs(10),
        }
    }
}

/// Audit trail settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AuditConfig {
    /// How long entries are kept before the retention sweep removes them
    #[serde(with = "humantime_serde")]
    pub retention: Duration,
}

impl Default for AuditConfig {
    fn default() -> Self {
        // 7 years
        Self {
            retention: Duration::from_secs(7 * 365 * 24 * 60 * 60),
        }
    }
}

/// Everything a station needs to run the store
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    pub server_url: String,
    pub station_id: String,
    pub user_id: String,
    /// Where the local tables live; relative paths resolve against the
    /// config file's directory
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_dir: Option<PathBuf>,
    #[serde(default)]
    pub sync: SyncConfig,
    #[serde(default)]
    pub audit: AuditConfig,
}

impl Config {
    /// Build a config with default tuning
    pub fn new(
        server_url: impl Into<String>,
        station_id: impl Into<String>,
        user_id: impl Into<String>,
    ) -> Self {
        Self {
            server_url: server_url.into(),
            station_id: station_id.into(),
            user_id: user_id.into(),
            data_dir: None,
            sync: SyncConfig::default(),
            audit: AuditConfig::default(),
        }
    }

    /// Parse and validate a TOML document
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: Config = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load from a file, resolving a relative `data_dir` against the
    /// file's directory
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let mut config = Self::from_toml(&content)?;
        if let (Some(dir), Some(parent)) = (&config.data_dir, path.parent()) {
            if dir.is_relative() {
                config.data_dir = Some(parent.join(dir));
            }
        }
        Ok(config)
    }

    /// Check required settings
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.server_url.trim().is_empty() {
            return Err(ConfigError::Missing("server_url"));
        }
        if !(self.server_url.starts_with("http://") || self.server_url.starts_with("https://")) {
            return Err(ConfigError::InvalidUrl(self.server_url.clone()));
        }
        if self.station_id.trim().is_empty() {
            return Err(ConfigError::Missing("station_id"));
        }
        if self.user_id.trim().is_empty() {
            return Err(ConfigError::Missing("user_id"));
        }
        if self.sync.max_attempts == 0 {
            return Err(ConfigError::NoAttempts);
        }
        Ok(())
    }

    /// Full URL records are POSTed to
    pub fn records_endpoint(&self) -> String {
        format!("{}{}", self.server_url.trim_end_matches('/'), RECORDS_PATH)
    }

    /// Full URL probed for reachability
    pub fn health_endpoint(&self) -> String {
        format!("{}{}", self.server_url.trim_end_matches('/'), HEALTH_PATH)
    }

    /// Retry schedule derived from the sync settings
    pub fn backoff_policy(&self) -> BackoffPolicy {
        BackoffPolicy {
            base: self.sync.backoff_base,
            max_attempts: self.sync.max_attempts,
        }
    }

    /// Identity stamped on audit entries
    pub fn actor(&self) -> Actor {
        Actor::new(self.user_id.clone(), self.station_id.clone())
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
