// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use crate::Table;
use thiserror::Error;

/// Errors from storage operations
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("invalid key {key:?} for table {table}")]
    InvalidKey { table: Table, key: String },
    #[error("storage unavailable: {0}")]
    Unavailable(String),
}
