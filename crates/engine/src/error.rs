// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Error types for the sync engine

use medsync_storage::StorageError;
use thiserror::Error;

/// Errors surfaced to callers of the engine
///
/// Transport failures never appear here; they turn into backoff state
/// and `SyncFailed` events instead.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),
    #[error("record not found: {0}")]
    RecordNotFound(String),
}
