// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Traced transport wrapper for consistent observability

use crate::transport::{SyncOutcome, SyncTransport, TransportError};
use async_trait::async_trait;
use medsync_core::Record;
use tracing::Instrument;

/// Wrapper that adds tracing to any SyncTransport
#[derive(Clone)]
pub struct TracedTransport<T> {
    inner: T,
}

impl<T> TracedTransport<T> {
    pub fn new(inner: T) -> Self {
        Self { inner }
    }

    pub fn inner(&self) -> &T {
        &self.inner
    }
}

#[async_trait]
impl<T: SyncTransport> SyncTransport for TracedTransport<T> {
    async fn push(&self, record: &Record) -> Result<SyncOutcome, TransportError> {
        let span = tracing::info_span!(
            "transport.push",
            record_id = %record.id,
            record_type = %record.record_type
        );

        async {
            tracing::debug!(checksum = %record.checksum, "pushing");

            let start = std::time::Instant::now();
            let result = self.inner.push(record).await;
            let elapsed_ms = start.elapsed().as_millis() as u64;

            match &result {
                Ok(SyncOutcome::Accepted { server_timestamp }) => {
                    tracing::info!(elapsed_ms, %server_timestamp, "accepted")
                }
                Ok(SyncOutcome::Conflict {
                    server_timestamp, ..
                }) => tracing::info!(elapsed_ms, %server_timestamp, "conflict, server wins"),
                Err(e) => tracing::warn!(elapsed_ms, error = %e, "push failed"),
            }

            result
        }
        .instrument(span)
        .await
    }

    async fn probe(&self) -> bool {
        let reachable = self.inner.probe().await;
        tracing::trace!(reachable, "probed");
        reachable
    }
}

#[cfg(test)]
#[path = "traced_tests.rs"]
mod tests;
