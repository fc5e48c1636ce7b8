// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use serde_json::json;

fn record(id: &str) -> Record {
    Record::new(id, "vitals", json!({"spo2": 97}), "station-1", "nurse-1", Utc::now())
}

#[tokio::test]
async fn accepts_by_default_with_server_time() {
    let fake = FakeTransport::new();
    let outcome = fake.push(&record("rec-1")).await.unwrap();
    assert_eq!(outcome.server_timestamp(), fake.server_time());
    assert_eq!(fake.pushed(), vec!["rec-1".to_string()]);
}

#[tokio::test]
async fn scripted_responses_are_used_in_order() {
    let fake = FakeTransport::new();
    fake.fail_times(2, TransportError::Timeout);
    fake.respond(FakeResponse::Conflict(Box::new(record("rec-srv"))));

    assert_eq!(fake.push(&record("a")).await, Err(TransportError::Timeout));
    assert_eq!(fake.push(&record("a")).await, Err(TransportError::Timeout));
    assert!(matches!(
        fake.push(&record("a")).await,
        Ok(SyncOutcome::Conflict { .. })
    ));
    assert!(matches!(
        fake.push(&record("a")).await,
        Ok(SyncOutcome::Accepted { .. })
    ));
}

#[tokio::test]
async fn unreachable_fails_without_consuming_script() {
    let fake = FakeTransport::new();
    fake.respond(FakeResponse::Fail(TransportError::ChecksumRejected));
    fake.set_reachable(false);

    assert!(matches!(
        fake.push(&record("a")).await,
        Err(TransportError::Network(_))
    ));
    assert!(!fake.probe().await);

    fake.set_reachable(true);
    assert_eq!(
        fake.push(&record("a")).await,
        Err(TransportError::ChecksumRejected)
    );
}

#[tokio::test]
async fn records_push_headers() {
    let fake = FakeTransport::new();
    let rec = record("rec-9");
    fake.push(&rec).await.unwrap();
    assert_eq!(
        fake.calls(),
        vec![TransportCall::Push {
            record_id: "rec-9".to_string(),
            checksum: rec.checksum.clone(),
            station_id: "station-1".to_string(),
        }]
    );
}

#[tokio::test]
async fn held_push_waits_for_release() {
    let fake = FakeTransport::new();
    fake.hold();

    let pusher = fake.clone();
    let task = tokio::spawn(async move { pusher.push(&record("rec-1")).await });
    fake.push_started().await;
    assert!(!task.is_finished());

    fake.release();
    let outcome = task.await.unwrap().unwrap();
    assert_eq!(outcome.server_timestamp(), fake.server_time());
}
