// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! ID generation abstractions
//!
//! Every entity kind gets its own prefix so a bare id in a log line or an
//! audit export says what it points at.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Prefix for record ids
pub const RECORD_PREFIX: &str = "rec";
/// Prefix for sync queue item ids
pub const QUEUE_PREFIX: &str = "sq";
/// Prefix for audit entry ids
pub const AUDIT_PREFIX: &str = "aud";

/// Generates unique identifiers
pub trait IdGen: Clone + Send + Sync + 'static {
    fn next(&self, prefix: &str) -> String;
}

/// UUID-based ID generator for production use
#[derive(Clone, Default)]
pub struct UuidIdGen;

impl IdGen for UuidIdGen {
    fn next(&self, prefix: &str) -> String {
        format!("{}_{}", prefix, uuid::Uuid::new_v4().simple())
    }
}

/// Sequential ID generator for testing
///
/// The counter is shared across prefixes, so ids stay unique and their
/// numeric suffix reflects creation order.
#[derive(Clone, Default)]
pub struct SequentialIdGen {
    counter: Arc<AtomicU64>,
}

impl SequentialIdGen {
    pub fn new() -> Self {
        Self::default()
    }
}

impl IdGen for SequentialIdGen {
    fn next(&self, prefix: &str) -> String {
        let n = self.counter.fetch_add(1, Ordering::SeqCst) + 1;
        format!("{}-{}", prefix, n)
    }
}
