// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Resolve configuration and build the store

use crate::error::CliError;
use anyhow::{Context, Result};
use fs2::FileExt;
use medsync_adapters::{HttpTransport, TracedTransport};
use medsync_core::config::CONFIG_FILE;
use medsync_core::{Config, SystemClock, UuidIdGen};
use medsync_engine::{MedicalStore, MedicalStoreDeps};
use medsync_storage::JsonStore;
use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};

/// Data directory used when neither the config nor the flags name one
pub const DEFAULT_DATA_DIR: &str = ".medsync";

/// Lock file that serializes drains across processes sharing a data directory
pub const LOCK_FILE: &str = "medsync.pid";

/// The store as the CLI runs it
pub type Store = MedicalStore<JsonStore, TracedTransport<HttpTransport>, SystemClock, UuidIdGen>;

/// Global options shared by every command
#[derive(Debug, Clone, Default)]
pub struct Paths {
    pub config: Option<PathBuf>,
    pub data_dir: Option<PathBuf>,
}

impl Paths {
    fn config_path(&self) -> PathBuf {
        self.config
            .clone()
            .unwrap_or_else(|| PathBuf::from(CONFIG_FILE))
    }

    /// Load the config, with `--data-dir` taking precedence over the file
    pub fn load(&self) -> Result<Config> {
        let path = self.config_path();
        if !path.exists() {
            return Err(CliError::config_not_found(&path).into());
        }
        let mut config = Config::load(&path)?;
        config.data_dir = Some(self.resolve_data_dir(&config, &path));
        Ok(config)
    }

    fn resolve_data_dir(&self, config: &Config, config_path: &Path) -> PathBuf {
        if let Some(dir) = &self.data_dir {
            return dir.clone();
        }
        if let Some(dir) = &config.data_dir {
            return dir.clone();
        }
        let base = config_path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));
        base.join(DEFAULT_DATA_DIR)
    }
}

/// Directory the resolved config stores data in
pub fn data_dir(config: &Config) -> PathBuf {
    config
        .data_dir
        .clone()
        .unwrap_or_else(|| PathBuf::from(DEFAULT_DATA_DIR))
}

/// Try to take the exclusive data-directory lock
///
/// Returns `None` while another process holds it. The lock is released
/// when the returned file is dropped.
pub fn try_lock(data_dir: &Path) -> Result<Option<File>> {
    std::fs::create_dir_all(data_dir)
        .with_context(|| format!("failed to create {}", data_dir.display()))?;
    let lock_path = data_dir.join(LOCK_FILE);
    let file = OpenOptions::new()
        .create(true)
        .truncate(false)
        .write(true)
        .open(&lock_path)
        .with_context(|| format!("failed to open {}", lock_path.display()))?;
    match file.try_lock_exclusive() {
        Ok(()) => Ok(Some(file)),
        Err(_) => Ok(None),
    }
}

/// Open the on-disk tables and wire up the engine
pub fn open_store(config: Config) -> Result<Store> {
    let store = JsonStore::open(data_dir(&config))?;
    let transport = TracedTransport::new(HttpTransport::from_config(&config));
    Ok(MedicalStore::new(
        MedicalStoreDeps {
            store,
            transport,
            clock: SystemClock,
            id_gen: UuidIdGen,
        },
        config,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const MINIMAL: &str = r#"
server_url = "http://127.0.0.1:9"
station_id = "station-1"
user_id = "nurse-1"
"#;

    #[test]
    fn missing_config_is_a_friendly_error() {
        let dir = TempDir::new().unwrap();
        let paths = Paths {
            config: Some(dir.path().join("nope.toml")),
            data_dir: None,
        };
        let err = paths.load().unwrap_err();
        assert!(err.downcast_ref::<CliError>().is_some());
    }

    #[test]
    fn data_dir_defaults_next_to_config() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("medsync.toml");
        std::fs::write(&path, MINIMAL).unwrap();
        let paths = Paths {
            config: Some(path),
            data_dir: None,
        };
        let config = paths.load().unwrap();
        assert_eq!(data_dir(&config), dir.path().join(DEFAULT_DATA_DIR));
    }

    #[test]
    fn data_dir_flag_wins() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("medsync.toml");
        std::fs::write(&path, format!("{}data_dir = \"store\"\n", MINIMAL)).unwrap();
        let paths = Paths {
            config: Some(path.clone()),
            data_dir: Some(dir.path().join("override")),
        };
        assert_eq!(data_dir(&paths.load().unwrap()), dir.path().join("override"));

        let paths = Paths {
            config: Some(path),
            data_dir: None,
        };
        assert_eq!(data_dir(&paths.load().unwrap()), dir.path().join("store"));
    }
}
