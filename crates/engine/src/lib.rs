// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! medsync sync engine
//!
//! Ties the durable store, the sync queue, the audit trail and the
//! transport together behind the `MedicalStore` facade.

mod audit;
mod error;
mod monitor;
mod queue;
mod service;
mod worker;

pub use audit::{AuditLogger, AuditQuery};
pub use error::EngineError;
pub use monitor::ConnectionMonitor;
pub use queue::{ResetFilter, SyncQueueManager};
pub use service::{
    ExportBundle, MedicalStore, MedicalStoreDeps, RecordQuery, SaveOptions, SyncStatusReport,
    UpdateOptions,
};
pub use worker::{DrainReport, SkipReason, SyncWorker};
