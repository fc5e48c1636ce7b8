// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Key/value settings owned by the sync worker

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Time of the last completed drain pass
pub const LAST_SYNC_KEY: &str = "lastSync";

/// One setting
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SettingsEntry {
    pub key: String,
    pub value: Value,
}

impl SettingsEntry {
    pub fn new(key: impl Into<String>, value: Value) -> Self {
        Self {
            key: key.into(),
            value,
        }
    }

    /// Build the `lastSync` entry
    pub fn last_sync(at: DateTime<Utc>) -> Self {
        Self::new(LAST_SYNC_KEY, Value::String(at.to_rfc3339()))
    }

    /// Read the value as a timestamp, if it is one
    pub fn as_timestamp(&self) -> Option<DateTime<Utc>> {
        let s = self.value.as_str()?;
        DateTime::parse_from_rfc3339(s)
            .ok()
            .map(|t| t.with_timezone(&Utc))
    }
}
