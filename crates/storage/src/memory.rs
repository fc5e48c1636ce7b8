// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! In-memory storage for tests

use crate::{StorageError, Store, Table};
use serde_json::Value;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::{Arc, Mutex};

#[derive(Default)]
struct Inner {
    tables: HashMap<Table, BTreeMap<String, Value>>,
    unavailable: HashSet<Table>,
}

/// Store backed by maps in memory
///
/// Clones share the same data. Tables can be marked unavailable to
/// exercise storage failure paths.
#[derive(Clone, Default)]
pub struct MemoryStore {
    inner: Arc<Mutex<Inner>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every table fail (or recover)
    pub fn set_unavailable(&self, unavailable: bool) {
        for table in Table::ALL {
            self.set_table_unavailable(table, unavailable);
        }
    }

    /// Make a single table fail (or recover)
    pub fn set_table_unavailable(&self, table: Table, unavailable: bool) {
        let mut inner = self.lock();
        if unavailable {
            inner.unavailable.insert(table);
        } else {
            inner.unavailable.remove(&table);
        }
    }

    /// Number of entries in a table
    pub fn len(&self, table: Table) -> usize {
        self.lock().tables.get(&table).map(|t| t.len()).unwrap_or(0)
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl Inner {
    fn check(&self, table: Table) -> Result<(), StorageError> {
        if self.unavailable.contains(&table) {
            return Err(StorageError::Unavailable(format!("{} is unavailable", table)));
        }
        Ok(())
    }
}

impl Store for MemoryStore {
    fn put(&self, table: Table, key: &str, value: &Value) -> Result<(), StorageError> {
        let mut inner = self.lock();
        inner.check(table)?;
        inner
            .tables
            .entry(table)
            .or_default()
            .insert(key.to_string(), value.clone());
        Ok(())
    }

    fn get(&self, table: Table, key: &str) -> Result<Option<Value>, StorageError> {
        let inner = self.lock();
        inner.check(table)?;
        Ok(inner.tables.get(&table).and_then(|t| t.get(key)).cloned())
    }

    fn get_all(&self, table: Table) -> Result<Vec<Value>, StorageError> {
        let inner = self.lock();
        inner.check(table)?;
        Ok(inner
            .tables
            .get(&table)
            .map(|t| t.values().cloned().collect())
            .unwrap_or_default())
    }

    fn delete(&self, table: Table, key: &str) -> Result<(), StorageError> {
        let mut inner = self.lock();
        inner.check(table)?;
        if let Some(t) = inner.tables.get_mut(&table) {
            t.remove(key);
        }
        Ok(())
    }
}
