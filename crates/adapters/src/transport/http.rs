// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! HTTP transport built on a blocking ureq agent

use super::{SyncOutcome, SyncTransport, TransportError};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use medsync_core::Record;
use serde::Deserialize;
use std::time::Duration;
use ureq::Agent;

/// Header carrying the submitting station
pub const STATION_HEADER: &str = "X-Station-ID";
/// Header carrying the payload checksum
pub const CHECKSUM_HEADER: &str = "X-Checksum";

#[derive(Deserialize)]
struct Ack {
    timestamp: DateTime<Utc>,
}

#[derive(Deserialize)]
struct ConflictBody {
    timestamp: DateTime<Utc>,
    record: Record,
}

/// Pushes records to `POST <records_url>` and probes `GET <health_url>`
#[derive(Clone)]
pub struct HttpTransport {
    agent: Agent,
    records_url: String,
    health_url: String,
}

impl HttpTransport {
    /// Build a transport whose every request gives up after `timeout`
    pub fn new(
        records_url: impl Into<String>,
        health_url: impl Into<String>,
        timeout: Duration,
    ) -> Self {
        let config = Agent::config_builder()
            .timeout_global(Some(timeout))
            .http_status_as_error(false)
            .build();
        Self {
            agent: config.into(),
            records_url: records_url.into(),
            health_url: health_url.into(),
        }
    }

    /// Build from station configuration
    pub fn from_config(config: &medsync_core::Config) -> Self {
        Self::new(
            config.records_endpoint(),
            config.health_endpoint(),
            config.sync.request_timeout,
        )
    }

    fn push_blocking(&self, record: &Record) -> Result<SyncOutcome, TransportError> {
        let body = serde_json::to_vec(record).map_err(|e| TransportError::Decode(e.to_string()))?;
        let mut response = self
            .agent
            .post(self.records_url.as_str())
            .header(STATION_HEADER, record.station_id.as_str())
            .header(CHECKSUM_HEADER, record.checksum.as_str())
            .header("Content-Type", "application/json")
            .send(&body[..])
            .map_err(from_ureq)?;

        let status = response.status().as_u16();
        let text = response
            .body_mut()
            .read_to_string()
            .map_err(from_ureq)?;
        classify(status, &text)
    }
}

/// Map a server answer onto a sync outcome
pub(crate) fn classify(status: u16, body: &str) -> Result<SyncOutcome, TransportError> {
    match status {
        200..=299 => {
            let ack: Ack =
                serde_json::from_str(body).map_err(|e| TransportError::Decode(e.to_string()))?;
            Ok(SyncOutcome::Accepted {
                server_timestamp: ack.timestamp,
            })
        }
        409 => {
            let conflict: ConflictBody =
                serde_json::from_str(body).map_err(|e| TransportError::Decode(e.to_string()))?;
            Ok(SyncOutcome::Conflict {
                server_timestamp: conflict.timestamp,
                server_record: Box::new(conflict.record),
            })
        }
        412 => Err(TransportError::ChecksumRejected),
        code => Err(TransportError::Status { code }),
    }
}

fn from_ureq(err: ureq::Error) -> TransportError {
    match err {
        ureq::Error::Timeout(_) => TransportError::Timeout,
        other => TransportError::Network(other.to_string()),
    }
}

#[async_trait]
impl SyncTransport for HttpTransport {
    async fn push(&self, record: &Record) -> Result<SyncOutcome, TransportError> {
        let this = self.clone();
        let record = record.clone();
        tokio::task::spawn_blocking(move || this.push_blocking(&record))
            .await
            .map_err(|e| TransportError::Network(format!("request task failed: {}", e)))?
    }

    async fn probe(&self) -> bool {
        let agent = self.agent.clone();
        let url = self.health_url.clone();
        // Any HTTP answer means the server is reachable
        tokio::task::spawn_blocking(move || agent.get(url.as_str()).call().is_ok())
            .await
            .unwrap_or(false)
    }
}

#[cfg(test)]
#[path = "http_tests.rs"]
mod tests;
