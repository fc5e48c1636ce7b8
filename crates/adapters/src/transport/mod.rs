// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Delivery of records to the remote server

mod http;

pub use http::HttpTransport;

// Test support - only compiled for tests or when explicitly requested
#[cfg(any(test, feature = "test-support"))]
mod fake;
#[cfg(any(test, feature = "test-support"))]
pub use fake::{FakeResponse, FakeTransport, TransportCall};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use medsync_core::Record;
use thiserror::Error;

/// Errors from delivering a record
///
/// All of these are retryable from the queue's point of view.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    #[error("network error: {0}")]
    Network(String),
    #[error("request timed out")]
    Timeout,
    #[error("server answered {code}")]
    Status { code: u16 },
    #[error("server rejected checksum")]
    ChecksumRejected,
    #[error("invalid server response: {0}")]
    Decode(String),
}

/// How the server settled a pushed record
#[derive(Debug, Clone, PartialEq)]
pub enum SyncOutcome {
    /// The server stored our version
    Accepted { server_timestamp: DateTime<Utc> },
    /// The server already holds a different version, which wins
    Conflict {
        server_timestamp: DateTime<Utc>,
        server_record: Box<Record>,
    },
}

impl SyncOutcome {
    pub fn server_timestamp(&self) -> DateTime<Utc> {
        match self {
            SyncOutcome::Accepted { server_timestamp }
            | SyncOutcome::Conflict {
                server_timestamp, ..
            } => *server_timestamp,
        }
    }
}

/// Adapter for talking to the sync server
#[async_trait]
pub trait SyncTransport: Clone + Send + Sync + 'static {
    /// Push one record, sending its checksum alongside
    async fn push(&self, record: &Record) -> Result<SyncOutcome, TransportError>;

    /// Check whether the server is reachable at all
    async fn probe(&self) -> bool;
}
