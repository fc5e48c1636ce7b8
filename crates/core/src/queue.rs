// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Sync queue items with priority ordering and exponential backoff
//!
//! Every local write produces one queue item. Items are delivered in
//! priority order, FIFO within a tier, and rescheduled with a growing
//! delay when delivery fails. An item whose attempts reached its maximum
//! is exhausted: it stays in the queue but is never selected again until
//! it is manually reset.

use crate::clock::add_duration;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// What a queue item asks the server to do with its record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SyncOperation {
    Create,
    Update,
    Delete,
}

impl fmt::Display for SyncOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SyncOperation::Create => f.write_str("create"),
            SyncOperation::Update => f.write_str("update"),
            SyncOperation::Delete => f.write_str("delete"),
        }
    }
}

/// Delivery priority; the derived order puts `Critical` first
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Critical,
    High,
    #[default]
    Normal,
    Low,
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Priority::Critical => f.write_str("critical"),
            Priority::High => f.write_str("high"),
            Priority::Normal => f.write_str("normal"),
            Priority::Low => f.write_str("low"),
        }
    }
}

impl std::str::FromStr for Priority {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "critical" => Ok(Priority::Critical),
            "high" => Ok(Priority::High),
            "normal" => Ok(Priority::Normal),
            "low" => Ok(Priority::Low),
            other => Err(format!("unknown priority: {}", other)),
        }
    }
}

/// Retry schedule for failed deliveries
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BackoffPolicy {
    /// Delay unit; the n-th consecutive failure waits `base * 2^n`
    pub base: Duration,
    /// Attempts allowed before an item is exhausted
    pub max_attempts: u32,
}

impl Default for BackoffPolicy {
    fn default() -> Self {
        Self {
            base: Duration::from_secs(2),
            max_attempts: 5,
        }
    }
}

impl BackoffPolicy {
    /// Delay before the next attempt after `attempts` consecutive failures
    pub fn delay_for(&self, attempts: u32) -> Duration {
        let factor = 1u32.checked_shl(attempts).unwrap_or(u32::MAX);
        self.base.saturating_mul(factor)
    }
}

/// A pending delivery of one record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncQueueItem {
    pub id: String,
    pub record_id: String,
    pub operation: SyncOperation,
    pub priority: Priority,
    pub attempts: u32,
    pub max_attempts: u32,
    pub next_retry_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

impl SyncQueueItem {
    /// Create an item that is ready immediately
    pub fn new(
        id: impl Into<String>,
        record_id: impl Into<String>,
        operation: SyncOperation,
        priority: Priority,
        max_attempts: u32,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: id.into(),
            record_id: record_id.into(),
            operation,
            priority,
            attempts: 0,
            max_attempts,
            next_retry_at: now,
            created_at: now,
        }
    }

    /// True once the item may no longer be scheduled automatically
    pub fn is_exhausted(&self) -> bool {
        self.attempts >= self.max_attempts
    }

    /// True if the item should be delivered in a pass running at `now`
    pub fn is_ready(&self, now: DateTime<Utc>) -> bool {
        !self.is_exhausted() && self.next_retry_at <= now
    }

    /// Count a failed delivery and push the next attempt out
    ///
    /// Returns true if this failure exhausted the item.
    pub fn record_failure(&mut self, now: DateTime<Utc>, policy: &BackoffPolicy) -> bool {
        if !self.is_exhausted() {
            self.attempts += 1;
        }
        self.next_retry_at = add_duration(now, policy.delay_for(self.attempts));
        self.is_exhausted()
    }

    /// Manual retry: forget past failures and make the item ready now
    pub fn reset(&mut self, now: DateTime<Utc>) {
        self.attempts = 0;
        self.next_retry_at = now;
    }
}

/// Items that a pass running at `now` should deliver, in delivery order
///
/// Sorted by priority, then by creation time so each tier is FIFO. The id
/// breaks ties between items created in the same instant.
pub fn select_ready(items: &[SyncQueueItem], now: DateTime<Utc>) -> Vec<SyncQueueItem> {
    let mut ready: Vec<SyncQueueItem> = items
        .iter()
        .filter(|i| i.is_ready(now))
        .cloned()
        .collect();
    sort_for_delivery(&mut ready);
    ready
}

/// Sort items by priority, then by created_at (ascending)
pub fn sort_for_delivery(items: &mut [SyncQueueItem]) {
    items.sort_by(|a, b| {
        a.priority
            .cmp(&b.priority)
            .then(a.created_at.cmp(&b.created_at))
            .then_with(|| a.id.cmp(&b.id))
    });
}

#[cfg(test)]
#[path = "queue_tests.rs"]
mod tests;
