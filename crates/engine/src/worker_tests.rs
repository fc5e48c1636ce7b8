// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::audit::AuditQuery;
use medsync_adapters::{FakeResponse, FakeTransport, TransportCall};
use medsync_core::{
    Actor, BackoffPolicy, FakeClock, Priority, SequentialIdGen, Subscription, SyncOperation,
    SyncStatus, LAST_SYNC_KEY,
};
use medsync_storage::MemoryStore;
use std::time::Duration;

type Worker = SyncWorker<MemoryStore, FakeTransport, FakeClock, SequentialIdGen>;

struct Harness {
    store: MemoryStore,
    transport: FakeTransport,
    clock: FakeClock,
    queue: SyncQueueManager<MemoryStore, FakeClock, SequentialIdGen>,
    audit: AuditLogger<MemoryStore, FakeClock, SequentialIdGen>,
    monitor: ConnectionMonitor,
    events: EventBus,
    worker: Worker,
}

fn setup(max_attempts: u32) -> Harness {
    let store = MemoryStore::new();
    let transport = FakeTransport::new();
    let clock = FakeClock::new();
    let id_gen = SequentialIdGen::new();
    let events = EventBus::new();
    let queue = SyncQueueManager::new(
        store.clone(),
        clock.clone(),
        id_gen.clone(),
        BackoffPolicy {
            base: Duration::from_secs(2),
            max_attempts,
        },
    );
    let audit = AuditLogger::new(
        store.clone(),
        clock.clone(),
        id_gen,
        Actor::new("nurse-1", "station-1"),
    );
    let monitor = ConnectionMonitor::new(true, events.clone());
    let worker = SyncWorker::new(
        store.clone(),
        transport.clone(),
        clock.clone(),
        queue.clone(),
        audit.clone(),
        monitor.clone(),
        events.clone(),
    );
    Harness {
        store,
        transport,
        clock,
        queue,
        audit,
        monitor,
        events,
        worker,
    }
}

impl Harness {
    fn add(&self, id: &str, priority: Priority) -> Record {
        let record = Record::new(
            id,
            "vitals",
            json!({"id": id, "pulse": 80}),
            "station-1",
            "nurse-1",
            self.clock.now(),
        );
        self.store.save(&record).unwrap();
        self.queue
            .enqueue(id, SyncOperation::Create, priority)
            .unwrap();
        self.clock.advance(Duration::from_millis(1));
        record
    }

    fn record(&self, id: &str) -> Record {
        self.store.load(id).unwrap().unwrap()
    }

    fn sync_audits(&self) -> Vec<medsync_core::AuditEntry> {
        self.audit
            .entries(&AuditQuery {
                action: Some(AuditAction::Sync),
                ..Default::default()
            })
            .unwrap()
    }
}

#[tokio::test]
async fn drain_skips_when_offline() {
    let h = setup(5);
    h.add("rec-1", Priority::Critical);
    h.monitor.set_online(false);

    let report = h.worker.drain().await.unwrap();
    assert_eq!(report, DrainReport::skipped(SkipReason::Offline));
    assert!(h.transport.pushed().is_empty());
    assert_eq!(h.record("rec-1").sync_status, SyncStatus::Pending);
}

#[tokio::test]
async fn drain_syncs_and_removes_item() {
    let h = setup(5);
    let mut rx = h.events.subscribe(Subscription::everything("test"));
    h.add("rec-1", Priority::Normal);

    let report = h.worker.drain().await.unwrap();
    assert_eq!(report.attempted, 1);
    assert_eq!(report.synced, 1);

    let record = h.record("rec-1");
    assert_eq!(record.sync_status, SyncStatus::Synced);
    assert_eq!(record.server_timestamp, Some(h.transport.server_time()));
    assert!(record.last_sync_attempt.is_some());
    assert!(h.queue.all().unwrap().is_empty());

    let audits = h.sync_audits();
    assert_eq!(audits.len(), 1);
    assert!(audits[0].success);

    let last_sync: SettingsEntry = h.store.load(LAST_SYNC_KEY).unwrap().unwrap();
    assert_eq!(last_sync.as_timestamp(), Some(h.clock.now()));

    assert!(matches!(
        rx.try_recv().unwrap(),
        SyncEvent::RecordSynced {
            conflict_resolved: false,
            ..
        }
    ));
    assert!(matches!(
        rx.try_recv().unwrap(),
        SyncEvent::DrainCompleted { synced: 1, .. }
    ));
}

#[tokio::test]
async fn drain_delivers_in_priority_order() {
    let h = setup(5);
    h.add("low", Priority::Low);
    h.add("critical", Priority::Critical);
    h.add("normal", Priority::Normal);

    h.worker.drain().await.unwrap();
    assert_eq!(h.transport.pushed(), vec!["critical", "normal", "low"]);
}

#[tokio::test]
async fn conflict_adopts_server_version() {
    let h = setup(5);
    let local = h.add("rec-1", Priority::High);
    let mut server = local.clone();
    server.payload = json!({"pulse": 95, "note": "server copy"});
    server.created_by = "doctor-2".to_string();
    h.transport.respond(FakeResponse::Conflict(Box::new(server)));

    let report = h.worker.drain().await.unwrap();
    assert_eq!(report.synced, 1);

    let record = h.record("rec-1");
    assert_eq!(record.payload, json!({"pulse": 95, "note": "server copy"}));
    assert_eq!(record.created_by, "doctor-2");
    assert_eq!(record.sync_status, SyncStatus::Synced);
    assert_ne!(record.checksum, local.checksum);
    assert!(record.verify());
    assert!(h.queue.all().unwrap().is_empty());

    let audits = h.sync_audits();
    assert_eq!(audits.len(), 1);
    assert_eq!(audits[0].details["resolution"], json!("server_wins"));
}

#[tokio::test]
async fn failure_reschedules_without_audit() {
    let h = setup(5);
    let mut rx = h.events.subscribe(Subscription::new(
        "failures",
        vec!["sync:record:failed".into()],
        "failures",
    ));
    h.add("rec-1", Priority::Normal);
    h.transport.fail_times(1, TransportError::Timeout);

    let report = h.worker.drain().await.unwrap();
    assert_eq!(report.failed, 1);

    let record = h.record("rec-1");
    assert_eq!(record.sync_status, SyncStatus::Failed);
    assert_eq!(record.sync_attempts, 1);

    let items = h.queue.all().unwrap();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0].attempts, 1);
    assert!(items[0].next_retry_at > h.clock.now());
    assert!(h.sync_audits().is_empty());

    assert_eq!(
        rx.try_recv().unwrap(),
        SyncEvent::SyncFailed {
            record_id: "rec-1".to_string(),
            error: "request timed out".to_string(),
            attempts: 1,
            exhausted: false,
        }
    );

    // Not due yet, so the next pass attempts nothing
    let report = h.worker.drain().await.unwrap();
    assert_eq!(report.attempted, 0);
}

#[tokio::test]
async fn exhaustion_writes_one_failure_audit() {
    let h = setup(3);
    h.add("rec-1", Priority::Normal);
    h.transport
        .fail_times(3, TransportError::Status { code: 500 });

    for _ in 0..3 {
        let report = h.worker.drain().await.unwrap();
        assert_eq!(report.failed, 1);
        h.clock.advance(Duration::from_secs(3600));
    }

    let report = h.worker.drain().await.unwrap();
    assert_eq!(report.attempted, 0);
    assert_eq!(h.queue.exhausted_count().unwrap(), 1);
    assert_eq!(h.record("rec-1").sync_attempts, 3);

    let audits = h.sync_audits();
    assert_eq!(audits.len(), 1);
    assert!(!audits[0].success);
    assert_eq!(audits[0].error_message.as_deref(), Some("server answered 500"));
}

#[tokio::test]
async fn missing_record_drops_stale_item() {
    let h = setup(5);
    h.queue
        .enqueue("ghost", SyncOperation::Update, Priority::Normal)
        .unwrap();

    let report = h.worker.drain().await.unwrap();
    assert_eq!(report.dropped, 1);
    assert_eq!(report.attempted, 0);
    assert!(h.queue.all().unwrap().is_empty());
    assert!(h.transport.pushed().is_empty());
}

#[tokio::test]
async fn concurrent_drain_is_skipped() {
    let h = setup(5);
    h.add("rec-1", Priority::Normal);

    let guard = DrainGuard::acquire(&h.worker.draining).unwrap();
    assert!(h.worker.is_draining());
    assert_eq!(
        h.worker.drain().await.unwrap(),
        DrainReport::skipped(SkipReason::AlreadyRunning)
    );
    assert_eq!(
        h.worker.sync_one("rec-1").await.unwrap(),
        DrainReport::skipped(SkipReason::AlreadyRunning)
    );

    drop(guard);
    assert!(!h.worker.is_draining());
    assert_eq!(h.worker.drain().await.unwrap().synced, 1);
}

#[tokio::test]
async fn sync_one_only_touches_its_record() {
    let h = setup(5);
    h.add("rec-1", Priority::Normal);
    h.add("rec-2", Priority::Critical);

    let report = h.worker.sync_one("rec-1").await.unwrap();
    assert_eq!(report.synced, 1);
    assert_eq!(h.transport.pushed(), vec!["rec-1"]);
    assert_eq!(h.record("rec-2").sync_status, SyncStatus::Pending);
    assert!(h.store.load::<SettingsEntry>(LAST_SYNC_KEY).unwrap().is_none());
}

#[tokio::test]
async fn storage_failure_aborts_the_pass() {
    let h = setup(5);
    h.add("rec-1", Priority::Normal);
    h.store.set_unavailable(true);

    assert!(matches!(
        h.worker.drain().await,
        Err(EngineError::Storage(_))
    ));
    h.store.set_unavailable(false);
    assert!(!h.worker.is_draining());
}

impl Harness {
    /// Hold the next push, replace the payload while it is in flight, then let it finish
    async fn drain_with_edit_in_flight(&self, id: &str, payload: serde_json::Value) -> DrainReport {
        self.transport.hold();
        let worker = self.worker.clone();
        let task = tokio::spawn(async move { worker.drain().await });
        self.transport.push_started().await;

        let mut record = self.record(id);
        record.set_payload(payload, self.clock.now());
        self.store.save(&record).unwrap();
        self.queue
            .enqueue(id, SyncOperation::Update, Priority::Normal)
            .unwrap();

        self.transport.release();
        task.await.unwrap().unwrap()
    }
}

#[tokio::test]
async fn edit_during_push_is_not_overwritten() {
    let h = setup(5);
    h.add("rec-1", Priority::Normal);
    h.clock.advance(Duration::from_secs(1));

    let report = h.drain_with_edit_in_flight("rec-1", json!({"pulse": 140})).await;
    assert_eq!(report.superseded, 1);
    assert_eq!(report.synced, 0);

    let record = h.record("rec-1");
    assert_eq!(record.payload, json!({"pulse": 140}));
    assert_eq!(record.sync_status, SyncStatus::Pending);
    assert!(record.server_timestamp.is_none());

    let items = h.queue.all().unwrap();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0].operation, SyncOperation::Update);

    // The edit goes out on the next pass
    let report = h.worker.drain().await.unwrap();
    assert_eq!(report.synced, 1);
    let record = h.record("rec-1");
    assert_eq!(record.sync_status, SyncStatus::Synced);
    assert_eq!(record.payload, json!({"pulse": 140}));
    assert!(matches!(
        h.transport.calls().last(),
        Some(TransportCall::Push { checksum, .. }) if *checksum == record.checksum
    ));
}

#[tokio::test]
async fn failed_push_of_an_older_version_keeps_the_edit() {
    let h = setup(5);
    h.add("rec-1", Priority::Normal);
    h.clock.advance(Duration::from_secs(1));
    h.transport.fail_times(1, TransportError::Timeout);

    let report = h.drain_with_edit_in_flight("rec-1", json!({"pulse": 55})).await;
    assert_eq!(report.failed, 1);

    let record = h.record("rec-1");
    assert_eq!(record.payload, json!({"pulse": 55}));
    assert_eq!(record.sync_status, SyncStatus::Pending);
    assert_eq!(record.sync_attempts, 0);
    assert!(h.sync_audits().is_empty());
}
