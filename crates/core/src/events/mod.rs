// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Domain events and their delivery
//!
//! This module provides:
//! - `SyncEvent` - What the store reports to the UI layer
//! - `EventBus` - Fan events out to listeners by name pattern
//! - `EventPattern` - Pattern matching for event subscriptions

mod bus;
mod event;
mod subscription;

pub use bus::{EventBus, EventReceiver};
pub use event::SyncEvent;
pub use subscription::{EventPattern, SubscriberId, Subscription};
