// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! JSON file-based storage
//!
//! Layout: `<base>/<table>/<key>.json`. A write goes to a temp file in
//! the same directory, is fsynced, and is renamed over the target, so a
//! crash leaves either the old or the new value and never a torn one.

use crate::{StorageError, Store, Table};
use serde_json::Value;
use std::fs::{self, File};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

static TEMP_COUNTER: AtomicU64 = AtomicU64::new(0);

/// JSON file-based storage
#[derive(Clone, Debug)]
pub struct JsonStore {
    base_path: PathBuf,
}

impl JsonStore {
    /// Open a store at the given path, creating the table directories
    pub fn open(base_path: impl Into<PathBuf>) -> Result<Self, StorageError> {
        let base_path = base_path.into();
        for table in Table::ALL {
            fs::create_dir_all(base_path.join(table.as_str()))?;
        }
        Ok(Self { base_path })
    }

    /// Root directory of the store
    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    fn table_dir(&self, table: Table) -> PathBuf {
        self.base_path.join(table.as_str())
    }

    fn path_for(&self, table: Table, key: &str) -> Result<PathBuf, StorageError> {
        validate_key(table, key)?;
        Ok(self.table_dir(table).join(format!("{}.json", key)))
    }
}

/// Keys become file names, so anything that could escape the table
/// directory or collide with temp files is refused
fn validate_key(table: Table, key: &str) -> Result<(), StorageError> {
    let bad = key.is_empty()
        || key.starts_with('.')
        || key.contains(['/', '\\', '\0'])
        || key.contains("..");
    if bad {
        return Err(StorageError::InvalidKey {
            table,
            key: key.to_string(),
        });
    }
    Ok(())
}

impl Store for JsonStore {
    fn put(&self, table: Table, key: &str, value: &Value) -> Result<(), StorageError> {
        let path = self.path_for(table, key)?;
        let dir = self.table_dir(table);
        fs::create_dir_all(&dir)?;

        let n = TEMP_COUNTER.fetch_add(1, Ordering::Relaxed);
        let tmp = dir.join(format!(".{}.{}.{}.tmp", key, std::process::id(), n));
        let json = serde_json::to_vec_pretty(value)?;

        let write = || -> io::Result<()> {
            let mut file = File::create(&tmp)?;
            file.write_all(&json)?;
            file.sync_all()?;
            fs::rename(&tmp, &path)?;
            sync_dir(&dir)
        };
        if let Err(e) = write() {
            let _ = fs::remove_file(&tmp);
            return Err(e.into());
        }
        Ok(())
    }

    fn get(&self, table: Table, key: &str) -> Result<Option<Value>, StorageError> {
        let path = self.path_for(table, key)?;
        let bytes = match fs::read(&path) {
            Ok(b) => b,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        Ok(Some(serde_json::from_slice(&bytes)?))
    }

    fn get_all(&self, table: Table) -> Result<Vec<Value>, StorageError> {
        let dir = self.table_dir(table);
        let entries = match fs::read_dir(&dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut paths = Vec::new();
        for entry in entries {
            let path = entry?.path();
            let is_json = path.extension().map(|e| e == "json").unwrap_or(false);
            let hidden = path
                .file_name()
                .map(|n| n.to_string_lossy().starts_with('.'))
                .unwrap_or(true);
            if is_json && !hidden {
                paths.push(path);
            }
        }
        paths.sort();

        let mut values = Vec::with_capacity(paths.len());
        for path in paths {
            let parsed = fs::read(&path)
                .map_err(StorageError::from)
                .and_then(|bytes| serde_json::from_slice(&bytes).map_err(StorageError::from));
            match parsed {
                Ok(value) => values.push(value),
                Err(e) => tracing::warn!(path = %path.display(), error = %e, "skipping unreadable entry"),
            }
        }
        Ok(values)
    }

    fn delete(&self, table: Table, key: &str) -> Result<(), StorageError> {
        let path = self.path_for(table, key)?;
        match fs::remove_file(&path) {
            Ok(()) => sync_dir(&self.table_dir(table)).map_err(StorageError::from),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

/// Persist a rename or unlink by syncing the containing directory
#[cfg(unix)]
fn sync_dir(dir: &Path) -> io::Result<()> {
    File::open(dir)?.sync_all()
}

#[cfg(not(unix))]
fn sync_dir(_dir: &Path) -> io::Result<()> {
    Ok(())
}

#[cfg(test)]
#[path = "json_tests.rs"]
mod tests;
