// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Append-only audit trail
//!
//! Logging is best-effort: a failed append is reported through tracing
//! and never fails the operation being audited.

use chrono::{DateTime, Utc};
use medsync_core::clock::sub_duration;
use medsync_core::id::AUDIT_PREFIX;
use medsync_core::{Actor, AuditAction, AuditEntry, Clock, IdGen};
use medsync_storage::{StorageError, Store, StoreExt};
use serde_json::{json, Value};
use std::time::Duration;

/// Filter for reading the audit trail
#[derive(Debug, Clone, Default)]
pub struct AuditQuery {
    pub record_id: Option<String>,
    pub action: Option<AuditAction>,
    /// Inclusive lower bound
    pub from: Option<DateTime<Utc>>,
    /// Inclusive upper bound
    pub to: Option<DateTime<Utc>>,
    pub limit: Option<usize>,
}

impl AuditQuery {
    fn matches(&self, entry: &AuditEntry) -> bool {
        self.record_id.as_ref().is_none_or(|id| &entry.record_id == id)
            && self.action.is_none_or(|a| entry.action == a)
            && self.from.is_none_or(|from| entry.timestamp >= from)
            && self.to.is_none_or(|to| entry.timestamp <= to)
    }
}

/// Writes and reads audit entries for one station and user
#[derive(Clone)]
pub struct AuditLogger<S, C, I> {
    store: S,
    clock: C,
    id_gen: I,
    actor: Actor,
}

impl<S: Store, C: Clock, I: IdGen> AuditLogger<S, C, I> {
    pub fn new(store: S, clock: C, id_gen: I, actor: Actor) -> Self {
        Self {
            store,
            clock,
            id_gen,
            actor,
        }
    }

    /// Append one entry; `error` marks the action as failed
    ///
    /// Returns the stored entry, or `None` if it could not be written.
    pub fn log(
        &self,
        action: AuditAction,
        record_id: &str,
        record_type: &str,
        details: Value,
        error: Option<&str>,
    ) -> Option<AuditEntry> {
        let mut entry = AuditEntry::new(
            self.id_gen.next(AUDIT_PREFIX),
            action,
            record_id,
            record_type,
            &self.actor,
            self.clock.now(),
        )
        .with_details(details);
        if let Some(message) = error {
            entry = entry.with_error(message);
        }

        match self.store.save(&entry) {
            Ok(()) => {
                tracing::trace!(id = %entry.id, summary = %entry.summary(), "audited");
                Some(entry)
            }
            Err(e) => {
                tracing::warn!(summary = %entry.summary(), error = %e, "failed to write audit entry");
                None
            }
        }
    }

    /// Entries matching the query, newest first
    pub fn entries(&self, query: &AuditQuery) -> Result<Vec<AuditEntry>, StorageError> {
        let mut entries: Vec<AuditEntry> = self
            .store
            .load_all::<AuditEntry>()?
            .into_iter()
            .filter(|e| query.matches(e))
            .collect();
        entries.sort_by(|a, b| b.timestamp.cmp(&a.timestamp).then_with(|| b.id.cmp(&a.id)));
        if let Some(limit) = query.limit {
            entries.truncate(limit);
        }
        Ok(entries)
    }

    /// Remove entries older than `retention` and record the sweep
    ///
    /// Returns the number of entries removed.
    pub fn purge_expired(&self, retention: Duration) -> Result<usize, StorageError> {
        let cutoff = sub_duration(self.clock.now(), retention);
        let mut purged = 0;
        for entry in self.store.load_all::<AuditEntry>()? {
            if entry.timestamp < cutoff {
                self.store.remove::<AuditEntry>(&entry.id)?;
                purged += 1;
            }
        }

        tracing::info!(purged, %cutoff, "audit retention sweep");
        self.log(
            AuditAction::Retention,
            "*",
            "audit_log",
            json!({ "purged": purged, "cutoff": cutoff.to_rfc3339() }),
            None,
        );
        Ok(purged)
    }
}

#[cfg(test)]
#[path = "audit_tests.rs"]
mod tests;
