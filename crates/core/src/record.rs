// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Clinical records
//!
//! A record is owned by the durable store. Queue items and audit entries
//! point at it by id; the record never points back.

use crate::checksum;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// Where a record stands relative to the remote server
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SyncStatus {
    Pending,
    Syncing,
    Synced,
    Failed,
    Conflict,
}

impl SyncStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SyncStatus::Pending => "pending",
            SyncStatus::Syncing => "syncing",
            SyncStatus::Synced => "synced",
            SyncStatus::Failed => "failed",
            SyncStatus::Conflict => "conflict",
        }
    }
}

impl fmt::Display for SyncStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for SyncStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(SyncStatus::Pending),
            "syncing" => Ok(SyncStatus::Syncing),
            "synced" => Ok(SyncStatus::Synced),
            "failed" => Ok(SyncStatus::Failed),
            "conflict" => Ok(SyncStatus::Conflict),
            other => Err(format!("unknown sync status: {}", other)),
        }
    }
}

/// A clinical record as stored locally and sent to the server
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Record {
    pub id: String,
    pub record_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub patient_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub device_id: Option<String>,
    pub station_id: String,
    pub payload: Value,
    pub created_at: DateTime<Utc>,
    pub created_by: String,
    pub updated_at: DateTime<Utc>,
    pub sync_status: SyncStatus,
    pub sync_attempts: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_sync_attempt: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub server_timestamp: Option<DateTime<Utc>>,
    pub checksum: String,
}

impl Record {
    /// Create a new pending record with its checksum computed
    pub fn new(
        id: impl Into<String>,
        record_type: impl Into<String>,
        payload: Value,
        station_id: impl Into<String>,
        created_by: impl Into<String>,
        now: DateTime<Utc>,
    ) -> Self {
        let checksum = checksum::hash(&payload);
        Self {
            id: id.into(),
            record_type: record_type.into(),
            patient_id: None,
            device_id: None,
            station_id: station_id.into(),
            payload,
            created_at: now,
            created_by: created_by.into(),
            updated_at: now,
            sync_status: SyncStatus::Pending,
            sync_attempts: 0,
            last_sync_attempt: None,
            server_timestamp: None,
            checksum,
        }
    }

    /// Attach the patient this record belongs to
    pub fn with_patient(self, patient_id: Option<String>) -> Self {
        Self { patient_id, ..self }
    }

    /// Attach the device that produced this record
    pub fn with_device(self, device_id: Option<String>) -> Self {
        Self { device_id, ..self }
    }

    /// Replace the payload, recompute the checksum and mark the record
    /// as needing sync again
    pub fn set_payload(&mut self, payload: Value, now: DateTime<Utc>) {
        self.checksum = checksum::hash(&payload);
        self.payload = payload;
        self.updated_at = now;
        self.sync_status = SyncStatus::Pending;
        self.sync_attempts = 0;
    }

    /// True if both copies carry the same local edit
    pub fn same_version(&self, other: &Record) -> bool {
        self.checksum == other.checksum && self.updated_at == other.updated_at
    }

    /// Mark the record as in flight
    pub fn mark_syncing(&mut self, now: DateTime<Utc>) {
        self.sync_status = SyncStatus::Syncing;
        self.last_sync_attempt = Some(now);
    }

    /// Mark the record as accepted by the server
    pub fn mark_synced(&mut self, server_timestamp: DateTime<Utc>) {
        self.sync_status = SyncStatus::Synced;
        self.server_timestamp = Some(server_timestamp);
    }

    /// Mark a failed delivery attempt
    pub fn mark_failed(&mut self, attempts: u32) {
        self.sync_status = SyncStatus::Failed;
        self.sync_attempts = attempts;
    }

    /// Overwrite local content with the server's version of this record
    ///
    /// The local id and station are kept; everything the server owns
    /// (payload, ownership metadata) is taken from `server`, and the
    /// checksum is recomputed from the new payload.
    pub fn adopt_server_version(&mut self, server: Record, server_timestamp: DateTime<Utc>) {
        self.record_type = server.record_type;
        self.patient_id = server.patient_id;
        self.device_id = server.device_id;
        self.created_by = server.created_by;
        self.checksum = checksum::hash(&server.payload);
        self.payload = server.payload;
        self.updated_at = server.updated_at;
        self.sync_status = SyncStatus::Synced;
        self.server_timestamp = Some(server_timestamp);
    }

    /// Check that the stored checksum matches the payload
    pub fn verify(&self) -> bool {
        self.checksum == checksum::hash(&self.payload)
    }
}

#[cfg(test)]
#[path = "record_tests.rs"]
mod tests;
