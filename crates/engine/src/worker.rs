// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Sync worker: delivers queued records to the server
//!
//! Per item: `pending -> syncing -> {synced | failed}`. A failed item
//! goes back to pending with a later `nextRetryAt` until its attempts run
//! out, after which it waits for a manual retry.

use crate::audit::AuditLogger;
use crate::monitor::ConnectionMonitor;
use crate::queue::SyncQueueManager;
use crate::EngineError;
use medsync_adapters::{SyncOutcome, SyncTransport, TransportError};
use medsync_core::{
    AuditAction, Clock, EventBus, IdGen, Record, SettingsEntry, SyncEvent, SyncQueueItem,
};
use medsync_storage::{Store, StoreExt};
use serde_json::json;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Why a pass did nothing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    AlreadyRunning,
    Offline,
}

/// Summary of one pass over the queue
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DrainReport {
    pub attempted: usize,
    pub synced: usize,
    pub failed: usize,
    /// Stale items whose record no longer exists
    pub dropped: usize,
    /// Pushes that went out while a newer local edit was being saved
    pub superseded: usize,
    pub skipped: Option<SkipReason>,
}

impl DrainReport {
    pub fn skipped(reason: SkipReason) -> Self {
        Self {
            skipped: Some(reason),
            ..Self::default()
        }
    }
}

enum ItemOutcome {
    Synced,
    Failed,
    Dropped,
    Superseded,
}

/// Releases the drain flag when dropped
struct DrainGuard {
    flag: Arc<AtomicBool>,
}

impl DrainGuard {
    fn acquire(flag: &Arc<AtomicBool>) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self {
                flag: Arc::clone(flag),
            })
    }
}

impl Drop for DrainGuard {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::Release);
    }
}

/// Drains the sync queue through a transport
#[derive(Clone)]
pub struct SyncWorker<S, T, C, I> {
    store: S,
    transport: T,
    clock: C,
    queue: SyncQueueManager<S, C, I>,
    audit: AuditLogger<S, C, I>,
    monitor: ConnectionMonitor,
    events: EventBus,
    draining: Arc<AtomicBool>,
}

impl<S, T, C, I> SyncWorker<S, T, C, I>
where
    S: Store,
    T: SyncTransport,
    C: Clock,
    I: IdGen,
{
    pub fn new(
        store: S,
        transport: T,
        clock: C,
        queue: SyncQueueManager<S, C, I>,
        audit: AuditLogger<S, C, I>,
        monitor: ConnectionMonitor,
        events: EventBus,
    ) -> Self {
        Self {
            store,
            transport,
            clock,
            queue,
            audit,
            monitor,
            events,
            draining: Arc::new(AtomicBool::new(false)),
        }
    }

    /// True while a pass holds the drain guard
    pub fn is_draining(&self) -> bool {
        self.draining.load(Ordering::Acquire)
    }

    /// Deliver every ready item, in priority order
    pub async fn drain(&self) -> Result<DrainReport, EngineError> {
        let Some(_guard) = DrainGuard::acquire(&self.draining) else {
            tracing::debug!("drain already in progress");
            return Ok(DrainReport::skipped(SkipReason::AlreadyRunning));
        };
        if !self.monitor.is_online() {
            tracing::debug!("offline, skipping drain");
            return Ok(DrainReport::skipped(SkipReason::Offline));
        }

        let items = self.queue.ready()?;
        let report = self.deliver(items).await?;

        self.store.save(&SettingsEntry::last_sync(self.clock.now()))?;
        self.events.publish(SyncEvent::DrainCompleted {
            attempted: report.attempted,
            synced: report.synced,
            failed: report.failed,
        });
        if report.attempted > 0 {
            tracing::info!(
                attempted = report.attempted,
                synced = report.synced,
                failed = report.failed,
                "drain completed"
            );
        }
        Ok(report)
    }

    /// Deliver the ready items of a single record
    pub async fn sync_one(&self, record_id: &str) -> Result<DrainReport, EngineError> {
        let Some(_guard) = DrainGuard::acquire(&self.draining) else {
            return Ok(DrainReport::skipped(SkipReason::AlreadyRunning));
        };
        if !self.monitor.is_online() {
            return Ok(DrainReport::skipped(SkipReason::Offline));
        }

        let items = self.queue.ready_for(record_id)?;
        self.deliver(items).await
    }

    async fn deliver(&self, items: Vec<SyncQueueItem>) -> Result<DrainReport, EngineError> {
        let mut report = DrainReport::default();
        for item in items {
            match self.deliver_item(item).await? {
                ItemOutcome::Synced => {
                    report.attempted += 1;
                    report.synced += 1;
                }
                ItemOutcome::Failed => {
                    report.attempted += 1;
                    report.failed += 1;
                }
                ItemOutcome::Dropped => report.dropped += 1,
                ItemOutcome::Superseded => {
                    report.attempted += 1;
                    report.superseded += 1;
                }
            }
        }
        Ok(report)
    }

    async fn deliver_item(&self, mut item: SyncQueueItem) -> Result<ItemOutcome, EngineError> {
        let Some(mut record) = self.store.load::<Record>(&item.record_id)? else {
            tracing::warn!(item = %item.id, record_id = %item.record_id, "dropping queue item for missing record");
            self.queue.complete(&item)?;
            return Ok(ItemOutcome::Dropped);
        };

        record.mark_syncing(self.clock.now());
        self.store.save(&record)?;
        tracing::debug!(item = %item.id, record_id = %record.id, attempt = item.attempts + 1, "syncing");

        let result = self.transport.push(&record).await;

        // The record may have been edited while the push was in flight
        let Some(current) = self.store.load::<Record>(&record.id)? else {
            tracing::warn!(item = %item.id, record_id = %record.id, "record removed during push");
            self.queue.complete(&item)?;
            return Ok(ItemOutcome::Dropped);
        };
        if !current.same_version(&record) {
            return self.on_superseded(&mut item, &record, result);
        }

        match result {
            Ok(outcome) => {
                self.on_delivered(&item, current, outcome)?;
                Ok(ItemOutcome::Synced)
            }
            Err(e) => {
                self.on_failed(&mut item, current, e)?;
                Ok(ItemOutcome::Failed)
            }
        }
    }

    /// A local edit landed mid-push; the stored copy is left alone and
    /// goes out with its own queue item
    fn on_superseded(
        &self,
        item: &mut SyncQueueItem,
        pushed: &Record,
        result: Result<SyncOutcome, TransportError>,
    ) -> Result<ItemOutcome, EngineError> {
        match result {
            Ok(outcome) => {
                let server_timestamp = outcome.server_timestamp();
                self.queue.complete(item)?;
                self.audit.log(
                    AuditAction::Sync,
                    &pushed.id,
                    &pushed.record_type,
                    json!({
                        "serverTimestamp": server_timestamp.to_rfc3339(),
                        "checksum": pushed.checksum,
                        "superseded": true,
                    }),
                    None,
                );
                tracing::info!(record_id = %pushed.id, %server_timestamp, "delivered an older version, newer edit stays queued");
                Ok(ItemOutcome::Superseded)
            }
            Err(e) => {
                self.queue.record_failure(item)?;
                tracing::warn!(
                    record_id = %pushed.id,
                    attempts = item.attempts,
                    error = %e,
                    "push of an older version failed, newer edit stays queued"
                );
                self.events.publish(SyncEvent::SyncFailed {
                    record_id: pushed.id.clone(),
                    error: e.to_string(),
                    attempts: item.attempts,
                    exhausted: item.is_exhausted(),
                });
                Ok(ItemOutcome::Failed)
            }
        }
    }

    fn on_delivered(
        &self,
        item: &SyncQueueItem,
        mut record: Record,
        outcome: SyncOutcome,
    ) -> Result<(), EngineError> {
        let (server_timestamp, details, conflict_resolved) = match outcome {
            SyncOutcome::Accepted { server_timestamp } => {
                record.mark_synced(server_timestamp);
                let details = json!({ "serverTimestamp": server_timestamp.to_rfc3339() });
                (server_timestamp, details, false)
            }
            SyncOutcome::Conflict {
                server_timestamp,
                server_record,
            } => {
                record.adopt_server_version(*server_record, server_timestamp);
                let details = json!({
                    "serverTimestamp": server_timestamp.to_rfc3339(),
                    "resolution": "server_wins",
                });
                (server_timestamp, details, true)
            }
        };

        self.store.save(&record)?;
        self.queue.complete(item)?;
        self.audit.log(
            AuditAction::Sync,
            &record.id,
            &record.record_type,
            details,
            None,
        );
        tracing::info!(record_id = %record.id, %server_timestamp, conflict_resolved, "record synced");
        self.events.publish(SyncEvent::RecordSynced {
            record_id: record.id,
            server_timestamp,
            conflict_resolved,
        });
        Ok(())
    }

    fn on_failed(
        &self,
        item: &mut SyncQueueItem,
        mut record: Record,
        error: TransportError,
    ) -> Result<(), EngineError> {
        let exhausted = self.queue.record_failure(item)?;
        record.mark_failed(item.attempts);
        self.store.save(&record)?;

        let message = error.to_string();
        if exhausted {
            tracing::warn!(
                record_id = %record.id,
                attempts = item.attempts,
                error = %message,
                "sync attempts exhausted, waiting for manual retry"
            );
            self.audit.log(
                AuditAction::Sync,
                &record.id,
                &record.record_type,
                json!({ "attempts": item.attempts }),
                Some(&message),
            );
        } else {
            tracing::warn!(
                record_id = %record.id,
                attempts = item.attempts,
                next_retry_at = %item.next_retry_at,
                error = %message,
                "sync failed, will retry"
            );
        }

        self.events.publish(SyncEvent::SyncFailed {
            record_id: record.id,
            error: message,
            attempts: item.attempts,
            exhausted,
        });
        Ok(())
    }
}

#[cfg(test)]
#[path = "worker_tests.rs"]
mod tests;
