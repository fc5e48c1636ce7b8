// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Fake transport for testing
#![cfg_attr(coverage_nightly, coverage(off))]

use super::{SyncOutcome, SyncTransport, TransportError};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use medsync_core::Record;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use tokio::sync::Notify;

/// Recorded transport call
#[derive(Debug, Clone, PartialEq)]
pub enum TransportCall {
    Push {
        record_id: String,
        checksum: String,
        station_id: String,
    },
    Probe,
}

/// A scripted answer to one push
#[derive(Debug, Clone)]
pub enum FakeResponse {
    Accept,
    Conflict(Box<Record>),
    Fail(TransportError),
}

struct FakeState {
    script: VecDeque<FakeResponse>,
    calls: Vec<TransportCall>,
    reachable: bool,
    server_time: DateTime<Utc>,
    gate: Option<Arc<Notify>>,
}

/// Fake transport that accepts everything unless told otherwise
///
/// While unreachable every push fails with a network error and scripted
/// responses are left untouched.
#[derive(Clone)]
pub struct FakeTransport {
    state: Arc<Mutex<FakeState>>,
    entered: Arc<Notify>,
}

impl Default for FakeTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl FakeTransport {
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(FakeState {
                script: VecDeque::new(),
                calls: Vec::new(),
                reachable: true,
                server_time: Utc::now(),
                gate: None,
            })),
            entered: Arc::new(Notify::new()),
        }
    }

    /// Queue the answer for the next push
    pub fn respond(&self, response: FakeResponse) {
        self.lock().script.push_back(response);
    }

    /// Queue the same failure `n` times
    pub fn fail_times(&self, n: usize, error: TransportError) {
        let mut state = self.lock();
        for _ in 0..n {
            state.script.push_back(FakeResponse::Fail(error.clone()));
        }
    }

    pub fn set_reachable(&self, reachable: bool) {
        self.lock().reachable = reachable;
    }

    /// Timestamp the fake server stamps on acknowledgements
    pub fn set_server_time(&self, time: DateTime<Utc>) {
        self.lock().server_time = time;
    }

    pub fn server_time(&self) -> DateTime<Utc> {
        self.lock().server_time
    }

    /// Make pushes wait inside the transport until `release`
    pub fn hold(&self) {
        self.lock().gate = Some(Arc::new(Notify::new()));
    }

    /// Let a held push finish and stop holding new ones
    pub fn release(&self) {
        if let Some(gate) = self.lock().gate.take() {
            gate.notify_one();
        }
    }

    /// Wait until a held push has entered the transport
    pub async fn push_started(&self) {
        self.entered.notified().await;
    }

    /// Get all recorded calls
    pub fn calls(&self) -> Vec<TransportCall> {
        self.lock().calls.clone()
    }

    /// Ids of pushed records, in push order
    pub fn pushed(&self) -> Vec<String> {
        self.lock()
            .calls
            .iter()
            .filter_map(|c| match c {
                TransportCall::Push { record_id, .. } => Some(record_id.clone()),
                TransportCall::Probe => None,
            })
            .collect()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, FakeState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }
}

#[async_trait]
impl SyncTransport for FakeTransport {
    async fn push(&self, record: &Record) -> Result<SyncOutcome, TransportError> {
        let gate = {
            let mut state = self.lock();
            state.calls.push(TransportCall::Push {
                record_id: record.id.clone(),
                checksum: record.checksum.clone(),
                station_id: record.station_id.clone(),
            });
            state.gate.clone()
        };
        if let Some(gate) = gate {
            self.entered.notify_one();
            gate.notified().await;
        }

        let mut state = self.lock();

        if !state.reachable {
            return Err(TransportError::Network("connection refused".to_string()));
        }

        let server_timestamp = state.server_time;
        match state.script.pop_front().unwrap_or(FakeResponse::Accept) {
            FakeResponse::Accept => Ok(SyncOutcome::Accepted { server_timestamp }),
            FakeResponse::Conflict(server_record) => Ok(SyncOutcome::Conflict {
                server_timestamp,
                server_record,
            }),
            FakeResponse::Fail(e) => Err(e),
        }
    }

    async fn probe(&self) -> bool {
        let mut state = self.lock();
        state.calls.push(TransportCall::Probe);
        state.reachable
    }
}

#[cfg(test)]
#[path = "fake_tests.rs"]
mod tests;
