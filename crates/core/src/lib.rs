// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! medsync-core: domain model for the local-first medical record store
//!
//! This crate provides:
//! - Records, sync queue items, audit entries and settings
//! - Payload checksums and audit integrity stamps
//! - Priority ordering and exponential backoff for the sync queue
//! - Clock and ID abstractions for deterministic tests
//! - Domain events and the event bus
//! - TOML configuration

pub mod clock;
pub mod id;

pub mod checksum;
pub mod config;
pub mod events;

// Entities (order matters for dependencies)
pub mod record;
pub mod queue;
pub mod audit;
pub mod settings;

// Re-exports
pub use audit::{Actor, AuditAction, AuditEntry};
pub use clock::{Clock, FakeClock, SystemClock};
pub use config::{AuditConfig, Config, ConfigError, SyncConfig};
pub use events::{EventBus, EventPattern, EventReceiver, Subscription, SyncEvent};
pub use id::{IdGen, SequentialIdGen, UuidIdGen};
pub use queue::{select_ready, BackoffPolicy, Priority, SyncOperation, SyncQueueItem};
pub use record::{Record, SyncStatus};
pub use settings::{SettingsEntry, LAST_SYNC_KEY};
