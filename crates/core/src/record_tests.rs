// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::clock::{Clock, FakeClock};
use serde_json::json;
use std::time::Duration;

fn make_record(clock: &FakeClock) -> Record {
    Record::new(
        "rec-1",
        "vitals",
        json!({"heartRate": 72}),
        "station-1",
        "nurse-1",
        clock.now(),
    )
}

#[test]
fn new_record_is_pending_with_valid_checksum() {
    let clock = FakeClock::new();
    let record = make_record(&clock);
    assert_eq!(record.sync_status, SyncStatus::Pending);
    assert_eq!(record.sync_attempts, 0);
    assert!(record.verify());
    assert_eq!(record.created_at, record.updated_at);
}

#[test]
fn set_payload_recomputes_checksum_and_resets_status() {
    let clock = FakeClock::new();
    let mut record = make_record(&clock);
    record.mark_failed(2);
    let before = record.checksum.clone();

    clock.advance(Duration::from_secs(5));
    record.set_payload(json!({"heartRate": 90}), clock.now());

    assert_ne!(record.checksum, before);
    assert!(record.verify());
    assert_eq!(record.sync_status, SyncStatus::Pending);
    assert_eq!(record.sync_attempts, 0);
    assert!(record.updated_at > record.created_at);
}

#[test]
fn tampered_payload_fails_verification() {
    let clock = FakeClock::new();
    let mut record = make_record(&clock);
    record.payload = json!({"heartRate": 10});
    assert!(!record.verify());
}

#[test]
fn serializes_with_camel_case_fields() {
    let clock = FakeClock::new();
    let record = make_record(&clock).with_patient(Some("pat-9".to_string()));
    let value = serde_json::to_value(&record).unwrap();

    assert_eq!(value["recordType"], "vitals");
    assert_eq!(value["patientId"], "pat-9");
    assert_eq!(value["syncStatus"], "pending");
    assert!(value.get("deviceId").is_none());
    assert!(value.get("serverTimestamp").is_none());
}

#[test]
fn adopt_server_version_keeps_id_and_takes_payload() {
    let clock = FakeClock::new();
    let mut local = make_record(&clock);
    let mut server = make_record(&clock);
    server.id = "server-side-id".to_string();
    server.payload = json!({"heartRate": 64, "reviewed": true});
    server.patient_id = Some("pat-2".to_string());

    let ts = clock.now();
    local.adopt_server_version(server, ts);

    assert_eq!(local.id, "rec-1");
    assert_eq!(local.payload["reviewed"], true);
    assert_eq!(local.patient_id.as_deref(), Some("pat-2"));
    assert_eq!(local.sync_status, SyncStatus::Synced);
    assert_eq!(local.server_timestamp, Some(ts));
    assert!(local.verify());
}

#[test]
fn sync_status_parses_and_displays() {
    for status in [
        SyncStatus::Pending,
        SyncStatus::Syncing,
        SyncStatus::Synced,
        SyncStatus::Failed,
        SyncStatus::Conflict,
    ] {
        assert_eq!(status.to_string().parse::<SyncStatus>().unwrap(), status);
    }
    assert!("bogus".parse::<SyncStatus>().is_err());
}
