// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Fan-out of sync events to in-process listeners

use super::event::SyncEvent;
use super::subscription::Subscription;
use std::sync::{Arc, Mutex};
use tokio::sync::mpsc;

/// Receiving end handed to a listener
pub type EventReceiver = mpsc::UnboundedReceiver<SyncEvent>;

struct Listener {
    subscription: Subscription,
    tx: mpsc::UnboundedSender<SyncEvent>,
}

/// Delivers each published event to every listener whose patterns match
///
/// Publishing never blocks. A listener goes away when its receiver is
/// dropped; it is pruned on the next publish.
#[derive(Clone, Default)]
pub struct EventBus {
    listeners: Arc<Mutex<Vec<Listener>>>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&self, subscription: Subscription) -> EventReceiver {
        let (tx, rx) = mpsc::unbounded_channel();
        tracing::trace!(listener = %subscription.id.0, "subscribed");
        self.lock().push(Listener { subscription, tx });
        rx
    }

    pub fn publish(&self, event: SyncEvent) {
        let name = event.name();
        tracing::trace!(event = name, record_id = ?event.record_id(), "publish");
        self.lock().retain(|listener| {
            if listener.tx.is_closed() {
                return false;
            }
            !listener.subscription.matches(name) || listener.tx.send(event.clone()).is_ok()
        });
    }

    /// Listeners still attached
    pub fn listener_count(&self) -> usize {
        self.lock().len()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<Listener>> {
        self.listeners.lock().unwrap_or_else(|e| e.into_inner())
    }
}

#[cfg(test)]
#[path = "bus_tests.rs"]
mod tests;
