// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Persistent sync queue

use medsync_core::id::QUEUE_PREFIX;
use medsync_core::queue::select_ready;
use medsync_core::{
    BackoffPolicy, Clock, IdGen, Priority, Record, SyncOperation, SyncQueueItem, SyncStatus,
};
use std::collections::HashSet;
use medsync_storage::{StorageError, Store, StoreExt};

/// Which items a manual retry resets
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResetFilter {
    All,
    Exhausted,
}

/// Owns the sync queue table
#[derive(Clone)]
pub struct SyncQueueManager<S, C, I> {
    store: S,
    clock: C,
    id_gen: I,
    policy: BackoffPolicy,
}

impl<S: Store, C: Clock, I: IdGen> SyncQueueManager<S, C, I> {
    pub fn new(store: S, clock: C, id_gen: I, policy: BackoffPolicy) -> Self {
        Self {
            store,
            clock,
            id_gen,
            policy,
        }
    }

    pub fn policy(&self) -> &BackoffPolicy {
        &self.policy
    }

    /// Queue a delivery that is ready immediately
    pub fn enqueue(
        &self,
        record_id: &str,
        operation: SyncOperation,
        priority: Priority,
    ) -> Result<SyncQueueItem, StorageError> {
        let item = SyncQueueItem::new(
            self.id_gen.next(QUEUE_PREFIX),
            record_id,
            operation,
            priority,
            self.policy.max_attempts,
            self.clock.now(),
        );
        self.store.save(&item)?;
        tracing::debug!(id = %item.id, record_id, %operation, %priority, "enqueued");
        Ok(item)
    }

    /// Every item, exhausted ones included
    pub fn all(&self) -> Result<Vec<SyncQueueItem>, StorageError> {
        self.store.load_all()
    }

    /// Items due now, in delivery order
    pub fn ready(&self) -> Result<Vec<SyncQueueItem>, StorageError> {
        Ok(select_ready(&self.all()?, self.clock.now()))
    }

    /// Items for one record that are due now, in delivery order
    pub fn ready_for(&self, record_id: &str) -> Result<Vec<SyncQueueItem>, StorageError> {
        let mut ready = self.ready()?;
        ready.retain(|item| item.record_id == record_id);
        Ok(ready)
    }

    /// Count a failed delivery and persist the new schedule
    ///
    /// Returns true if the item is now exhausted.
    pub fn record_failure(&self, item: &mut SyncQueueItem) -> Result<bool, StorageError> {
        let exhausted = item.record_failure(self.clock.now(), &self.policy);
        self.store.save(item)?;
        Ok(exhausted)
    }

    /// Drop a delivered (or stale) item
    pub fn complete(&self, item: &SyncQueueItem) -> Result<(), StorageError> {
        self.store.remove::<SyncQueueItem>(&item.id)
    }

    /// Items still scheduled for automatic delivery
    pub fn pending_count(&self) -> Result<usize, StorageError> {
        Ok(self.all()?.iter().filter(|i| !i.is_exhausted()).count())
    }

    /// Items waiting for a manual retry
    pub fn exhausted_count(&self) -> Result<usize, StorageError> {
        Ok(self.all()?.iter().filter(|i| i.is_exhausted()).count())
    }

    /// Queue every unsynced record that has no queue item
    ///
    /// Such a record is left behind when its enqueue failed after the
    /// record itself was written. Returns the number of items created.
    pub fn requeue_orphans(&self) -> Result<usize, StorageError> {
        let queued: HashSet<String> = self.all()?.into_iter().map(|i| i.record_id).collect();
        let mut count = 0;
        for record in self.store.load_all::<Record>()? {
            if record.sync_status == SyncStatus::Synced || queued.contains(&record.id) {
                continue;
            }
            let operation = if record.server_timestamp.is_some() {
                SyncOperation::Update
            } else {
                SyncOperation::Create
            };
            self.enqueue(&record.id, operation, Priority::Normal)?;
            count += 1;
        }
        if count > 0 {
            tracing::warn!(count, "requeued records that had no queue item");
        }
        Ok(count)
    }

    /// Make matching items ready now with a clean attempt count
    ///
    /// Returns the number of items reset.
    pub fn reset(&self, filter: ResetFilter) -> Result<usize, StorageError> {
        let now = self.clock.now();
        let mut count = 0;
        for mut item in self.all()? {
            if filter == ResetFilter::Exhausted && !item.is_exhausted() {
                continue;
            }
            item.reset(now);
            self.store.save(&item)?;
            count += 1;
        }
        tracing::info!(count, ?filter, "queue reset");
        Ok(count)
    }
}

#[cfg(test)]
#[path = "queue_tests.rs"]
mod tests;
