// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Typed access to the tables

use crate::{StorageError, Store, Table};
use medsync_core::{AuditEntry, Record, SettingsEntry, SyncQueueItem};
use serde::{de::DeserializeOwned, Serialize};

/// A value stored in one fixed table under its own key
pub trait Entity: Serialize + DeserializeOwned {
    const TABLE: Table;

    fn key(&self) -> &str;
}

impl Entity for Record {
    const TABLE: Table = Table::Records;

    fn key(&self) -> &str {
        &self.id
    }
}

impl Entity for SyncQueueItem {
    const TABLE: Table = Table::SyncQueue;

    fn key(&self) -> &str {
        &self.id
    }
}

impl Entity for AuditEntry {
    const TABLE: Table = Table::AuditLog;

    fn key(&self) -> &str {
        &self.id
    }
}

impl Entity for SettingsEntry {
    const TABLE: Table = Table::Settings;

    fn key(&self) -> &str {
        &self.key
    }
}

/// Serialize entities in and out of any `Store`
pub trait StoreExt: Store {
    /// Save an entity under its key
    fn save<E: Entity>(&self, entity: &E) -> Result<(), StorageError> {
        let value = serde_json::to_value(entity)?;
        self.put(E::TABLE, entity.key(), &value)
    }

    /// Load an entity by key
    fn load<E: Entity>(&self, key: &str) -> Result<Option<E>, StorageError> {
        match self.get(E::TABLE, key)? {
            Some(value) => Ok(Some(serde_json::from_value(value)?)),
            None => Ok(None),
        }
    }

    /// Load every entity in the entity's table
    ///
    /// Values that no longer deserialize are skipped with a warning so
    /// one bad entry cannot hide the rest of the table.
    fn load_all<E: Entity>(&self) -> Result<Vec<E>, StorageError> {
        let values = self.get_all(E::TABLE)?;
        let mut entities = Vec::with_capacity(values.len());
        for value in values {
            match serde_json::from_value(value) {
                Ok(entity) => entities.push(entity),
                Err(e) => tracing::warn!(table = %E::TABLE, error = %e, "skipping undecodable entry"),
            }
        }
        Ok(entities)
    }

    /// Remove an entity by key
    fn remove<E: Entity>(&self, key: &str) -> Result<(), StorageError> {
        self.delete(E::TABLE, key)
    }
}

impl<S: Store> StoreExt for S {}

#[cfg(test)]
#[path = "entity_tests.rs"]
mod tests;
