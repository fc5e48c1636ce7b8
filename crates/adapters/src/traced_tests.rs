// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::transport::{FakeResponse, FakeTransport};
use chrono::Utc;
use serde_json::json;
use std::sync::{Arc, Mutex};
use tracing_subscriber::fmt::MakeWriter;

/// A writer that captures log output for testing
#[derive(Clone, Default)]
struct CapturedLogs {
    logs: Arc<Mutex<Vec<u8>>>,
}

impl CapturedLogs {
    fn contents(&self) -> String {
        let logs = self.logs.lock().unwrap();
        String::from_utf8_lossy(&logs).to_string()
    }
}

impl std::io::Write for CapturedLogs {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.logs.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

impl<'a> MakeWriter<'a> for CapturedLogs {
    type Writer = CapturedLogs;

    fn make_writer(&'a self) -> Self::Writer {
        self.clone()
    }
}

/// Run a test with captured tracing output
fn with_tracing<F, Fut>(f: F) -> (String, Fut::Output)
where
    F: FnOnce() -> Fut,
    Fut: std::future::Future,
{
    let logs = CapturedLogs::default();

    let subscriber = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::TRACE)
        .with_writer(logs.clone())
        .with_ansi(false)
        .without_time()
        .finish();

    let result = tracing::subscriber::with_default(subscriber, || {
        tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap()
            .block_on(f())
    });

    (logs.contents(), result)
}

fn record() -> Record {
    Record::new(
        "rec-42",
        "vitals",
        json!({"bp": "120/80"}),
        "station-1",
        "nurse-1",
        Utc::now(),
    )
}

#[tokio::test]
async fn traced_passes_results_through() {
    let fake = FakeTransport::new();
    fake.respond(FakeResponse::Fail(TransportError::Status { code: 503 }));
    let traced = TracedTransport::new(fake.clone());

    assert_eq!(
        traced.push(&record()).await,
        Err(TransportError::Status { code: 503 })
    );
    assert!(traced.push(&record()).await.is_ok());
    assert!(traced.probe().await);
    assert_eq!(traced.inner().pushed().len(), 2);
}

#[test]
fn traced_push_logs_span_and_completion() {
    let (logs, result) = with_tracing(|| async {
        let traced = TracedTransport::new(FakeTransport::new());
        traced.push(&record()).await
    });

    assert!(result.is_ok(), "push should succeed: {:?}", result);
    assert!(
        logs.contains("transport.push"),
        "Should log span name. Logs:\n{}",
        logs
    );
    assert!(
        logs.contains("rec-42"),
        "Should log record id. Logs:\n{}",
        logs
    );
    assert!(
        logs.contains("accepted"),
        "Should log completion. Logs:\n{}",
        logs
    );
    assert!(
        logs.contains("elapsed_ms"),
        "Should log timing. Logs:\n{}",
        logs
    );
}

#[test]
fn traced_push_logs_failure() {
    let (logs, result) = with_tracing(|| async {
        let fake = FakeTransport::new();
        fake.respond(FakeResponse::Fail(TransportError::ChecksumRejected));
        TracedTransport::new(fake).push(&record()).await
    });

    assert!(result.is_err());
    assert!(
        logs.contains("push failed") && logs.contains("checksum"),
        "Should log failure. Logs:\n{}",
        logs
    );
}

#[test]
fn traced_push_logs_conflict() {
    let (logs, _) = with_tracing(|| async {
        let fake = FakeTransport::new();
        fake.respond(FakeResponse::Conflict(Box::new(record())));
        TracedTransport::new(fake).push(&record()).await
    });

    assert!(
        logs.contains("server wins"),
        "Should log conflict. Logs:\n{}",
        logs
    );
}
