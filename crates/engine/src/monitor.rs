// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Connection state tracking

use medsync_core::{EventBus, SyncEvent};
use tokio::sync::watch;

/// Tracks whether the sync server is believed reachable
///
/// The host signals transitions through `set_online`. Receivers from
/// `subscribe` see every change, which is how the background loop knows
/// to drain on reconnect.
#[derive(Clone)]
pub struct ConnectionMonitor {
    online: watch::Sender<bool>,
    events: EventBus,
}

impl ConnectionMonitor {
    pub fn new(initially_online: bool, events: EventBus) -> Self {
        let (online, _) = watch::channel(initially_online);
        Self { online, events }
    }

    pub fn is_online(&self) -> bool {
        *self.online.borrow()
    }

    /// Record the current connectivity
    ///
    /// Returns true if this was a transition.
    pub fn set_online(&self, online: bool) -> bool {
        let changed = self.online.send_if_modified(|current| {
            if *current == online {
                return false;
            }
            *current = online;
            true
        });

        if changed {
            if online {
                tracing::info!("connection restored");
            } else {
                tracing::warn!("connection lost");
            }
            self.events.publish(SyncEvent::ConnectionChanged { online });
        }
        changed
    }

    /// Receiver that wakes on every transition
    pub fn subscribe(&self) -> watch::Receiver<bool> {
        self.online.subscribe()
    }
}
