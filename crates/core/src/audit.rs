// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Audit trail entries
//!
//! Entries are append-only. Each carries an integrity stamp over its
//! summary, timestamp and outcome so an edited entry can be detected.

use crate::checksum;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// The kind of action an audit entry records
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AuditAction {
    Create,
    Read,
    Update,
    Sync,
    Export,
    /// Expired entries were purged by the retention sweep
    Retention,
}

impl AuditAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            AuditAction::Create => "create",
            AuditAction::Read => "read",
            AuditAction::Update => "update",
            AuditAction::Sync => "sync",
            AuditAction::Export => "export",
            AuditAction::Retention => "retention",
        }
    }
}

impl fmt::Display for AuditAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for AuditAction {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "create" => Ok(AuditAction::Create),
            "read" => Ok(AuditAction::Read),
            "update" => Ok(AuditAction::Update),
            "sync" => Ok(AuditAction::Sync),
            "export" => Ok(AuditAction::Export),
            "retention" => Ok(AuditAction::Retention),
            other => Err(format!("unknown audit action: {}", other)),
        }
    }
}

/// Who performed an audited action
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Actor {
    pub user_id: String,
    pub station_id: String,
}

impl Actor {
    pub fn new(user_id: impl Into<String>, station_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            station_id: station_id.into(),
        }
    }
}

/// One immutable line of the audit trail
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditEntry {
    pub id: String,
    pub action: AuditAction,
    pub record_id: String,
    pub record_type: String,
    pub user_id: String,
    pub station_id: String,
    pub timestamp: DateTime<Utc>,
    #[serde(default)]
    pub details: Value,
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
    pub integrity: String,
}

impl AuditEntry {
    /// Create a successful entry
    pub fn new(
        id: impl Into<String>,
        action: AuditAction,
        record_id: impl Into<String>,
        record_type: impl Into<String>,
        actor: &Actor,
        timestamp: DateTime<Utc>,
    ) -> Self {
        let mut entry = Self {
            id: id.into(),
            action,
            record_id: record_id.into(),
            record_type: record_type.into(),
            user_id: actor.user_id.clone(),
            station_id: actor.station_id.clone(),
            timestamp,
            details: Value::Null,
            success: true,
            error_message: None,
            integrity: String::new(),
        };
        entry.integrity = entry.compute_integrity();
        entry
    }

    /// Attach free-form details
    pub fn with_details(self, details: Value) -> Self {
        Self { details, ..self }
    }

    /// Mark the entry as recording a failed action
    pub fn with_error(self, message: impl Into<String>) -> Self {
        let mut entry = Self {
            success: false,
            error_message: Some(message.into()),
            ..self
        };
        entry.integrity = entry.compute_integrity();
        entry
    }

    /// Short "action:type:record" line covered by the integrity stamp
    pub fn summary(&self) -> String {
        format!("{}:{}:{}", self.action, self.record_type, self.record_id)
    }

    /// Check the integrity stamp against the entry's contents
    pub fn verify(&self) -> bool {
        self.integrity == self.compute_integrity()
    }

    fn compute_integrity(&self) -> String {
        checksum::audit_stamp(&self.summary(), self.timestamp, self.success)
    }
}

#[cfg(test)]
#[path = "audit_tests.rs"]
mod tests;
