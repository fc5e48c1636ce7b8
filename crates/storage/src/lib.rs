// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! Durable storage for records, the sync queue, the audit log and settings
//!
//! Every operation touches exactly one logical table and either fully
//! succeeds or fails; callers never see partial writes.

mod entity;
mod error;
mod json;
mod memory;
mod table;

pub use entity::{Entity, StoreExt};
pub use error::StorageError;
pub use json::JsonStore;
pub use memory::MemoryStore;
pub use table::Table;

use serde_json::Value;

/// Key/value access to the four logical tables
pub trait Store: Clone + Send + Sync + 'static {
    /// Insert or replace the value stored under `key`
    fn put(&self, table: Table, key: &str, value: &Value) -> Result<(), StorageError>;

    /// Fetch the value stored under `key`
    fn get(&self, table: Table, key: &str) -> Result<Option<Value>, StorageError>;

    /// Fetch every value in the table
    fn get_all(&self, table: Table) -> Result<Vec<Value>, StorageError>;

    /// Remove `key`; removing a missing key is not an error
    fn delete(&self, table: Table, key: &str) -> Result<(), StorageError>;
}
