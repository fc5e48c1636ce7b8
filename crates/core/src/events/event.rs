// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Events emitted by the record store

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Notifications the UI layer subscribes to
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum SyncEvent {
    /// A record was committed locally
    RecordSaved {
        record_id: String,
        record_type: String,
    },

    /// A record's payload was replaced locally
    RecordUpdated {
        record_id: String,
        record_type: String,
    },

    /// The server accepted a record (or won a conflict)
    RecordSynced {
        record_id: String,
        server_timestamp: DateTime<Utc>,
        conflict_resolved: bool,
    },

    /// A delivery attempt failed
    SyncFailed {
        record_id: String,
        error: String,
        attempts: u32,
        exhausted: bool,
    },

    /// The connection monitor saw a transition
    ConnectionChanged { online: bool },

    /// A drain pass finished
    DrainCompleted {
        attempted: usize,
        synced: usize,
        failed: usize,
    },
}

impl SyncEvent {
    /// Colon-separated name used for subscription patterns
    pub fn name(&self) -> &'static str {
        match self {
            SyncEvent::RecordSaved { .. } => "record:saved",
            SyncEvent::RecordUpdated { .. } => "record:updated",
            SyncEvent::RecordSynced { .. } => "sync:record:synced",
            SyncEvent::SyncFailed { .. } => "sync:record:failed",
            SyncEvent::ConnectionChanged { .. } => "connection:changed",
            SyncEvent::DrainCompleted { .. } => "sync:drain:completed",
        }
    }

    /// The record this event is about, if any
    pub fn record_id(&self) -> Option<&str> {
        match self {
            SyncEvent::RecordSaved { record_id, .. }
            | SyncEvent::RecordUpdated { record_id, .. }
            | SyncEvent::RecordSynced { record_id, .. }
            | SyncEvent::SyncFailed { record_id, .. } => Some(record_id),
            SyncEvent::ConnectionChanged { .. } | SyncEvent::DrainCompleted { .. } => None,
        }
    }
}
