// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `MedicalStore`: the public face of the engine
//!
//! Every write commits to the local store first; delivery happens later
//! through the sync queue. Only a critical save made while online asks
//! for delivery right away, and even then the caller does not wait.

use crate::audit::{AuditLogger, AuditQuery};
use crate::monitor::ConnectionMonitor;
use crate::queue::{ResetFilter, SyncQueueManager};
use crate::worker::{DrainReport, SyncWorker};
use crate::EngineError;
use chrono::{DateTime, Utc};
use medsync_adapters::SyncTransport;
use medsync_core::id::RECORD_PREFIX;
use medsync_core::{
    AuditAction, AuditEntry, Clock, Config, EventBus, EventPattern, EventReceiver, IdGen,
    Priority, Record, SettingsEntry, Subscription, SyncEvent, SyncOperation, SyncStatus,
    LAST_SYNC_KEY,
};
use medsync_storage::{Store, StoreExt};
use serde::Serialize;
use serde_json::{json, Value};
use std::sync::Mutex;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

/// Adapter dependencies of the store
pub struct MedicalStoreDeps<S, T, C, I> {
    pub store: S,
    pub transport: T,
    pub clock: C,
    pub id_gen: I,
}

/// Optional attributes of a new record
#[derive(Debug, Clone, Default)]
pub struct SaveOptions {
    pub patient_id: Option<String>,
    pub device_id: Option<String>,
    pub priority: Priority,
}

/// Options for replacing a record's payload
#[derive(Debug, Clone, Default)]
pub struct UpdateOptions {
    pub priority: Priority,
}

/// Filter for `query_records`; unset fields match everything
#[derive(Debug, Clone, Default)]
pub struct RecordQuery {
    pub record_type: Option<String>,
    pub patient_id: Option<String>,
    pub device_id: Option<String>,
    /// Inclusive lower bound on `createdAt`
    pub from: Option<DateTime<Utc>>,
    /// Inclusive upper bound on `createdAt`
    pub to: Option<DateTime<Utc>>,
    pub status: Option<SyncStatus>,
    pub limit: Option<usize>,
}

impl RecordQuery {
    fn matches(&self, record: &Record) -> bool {
        self.record_type
            .as_ref()
            .is_none_or(|t| &record.record_type == t)
            && self
                .patient_id
                .as_ref()
                .is_none_or(|p| record.patient_id.as_ref() == Some(p))
            && self
                .device_id
                .as_ref()
                .is_none_or(|d| record.device_id.as_ref() == Some(d))
            && self.from.is_none_or(|from| record.created_at >= from)
            && self.to.is_none_or(|to| record.created_at <= to)
            && self.status.is_none_or(|s| record.sync_status == s)
    }
}

/// Snapshot of sync health
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncStatusReport {
    /// Queue items still scheduled for automatic delivery
    pub pending: usize,
    /// Records whose last delivery attempt failed
    pub failed: usize,
    /// Queue items waiting for a manual retry
    pub exhausted: usize,
    pub last_sync: Option<DateTime<Utc>>,
    pub is_online: bool,
    pub draining: bool,
}

/// Everything a station holds, for compliance export
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportBundle {
    pub exported_at: DateTime<Utc>,
    pub station_id: String,
    pub exported_by: String,
    pub records: Vec<Record>,
    pub audit_log: Vec<AuditEntry>,
}

struct SyncLoop {
    shutdown: oneshot::Sender<()>,
    handle: JoinHandle<()>,
}

/// Local-first record store with background sync
pub struct MedicalStore<S, T, C, I> {
    config: Config,
    store: S,
    transport: T,
    clock: C,
    id_gen: I,
    events: EventBus,
    queue: SyncQueueManager<S, C, I>,
    audit: AuditLogger<S, C, I>,
    monitor: ConnectionMonitor,
    worker: SyncWorker<S, T, C, I>,
    sync_loop: Mutex<Option<SyncLoop>>,
}

impl<S, T, C, I> MedicalStore<S, T, C, I>
where
    S: Store,
    T: SyncTransport,
    C: Clock,
    I: IdGen,
{
    /// Wire up the store; it starts offline until told otherwise
    pub fn new(deps: MedicalStoreDeps<S, T, C, I>, config: Config) -> Self {
        let MedicalStoreDeps {
            store,
            transport,
            clock,
            id_gen,
        } = deps;
        let events = EventBus::new();
        let queue = SyncQueueManager::new(
            store.clone(),
            clock.clone(),
            id_gen.clone(),
            config.backoff_policy(),
        );
        let audit = AuditLogger::new(store.clone(), clock.clone(), id_gen.clone(), config.actor());
        let monitor = ConnectionMonitor::new(false, events.clone());
        let worker = SyncWorker::new(
            store.clone(),
            transport.clone(),
            clock.clone(),
            queue.clone(),
            audit.clone(),
            monitor.clone(),
            events.clone(),
        );

        tracing::info!(station_id = %config.station_id, server = %config.server_url, "medical store initialized");
        Self {
            config,
            store,
            transport,
            clock,
            id_gen,
            events,
            queue,
            audit,
            monitor,
            worker,
            sync_loop: Mutex::new(None),
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Commit a new record and queue it for delivery
    pub async fn save_record(
        &self,
        record_type: &str,
        payload: Value,
        options: SaveOptions,
    ) -> Result<Record, EngineError> {
        let record = Record::new(
            self.id_gen.next(RECORD_PREFIX),
            record_type,
            payload,
            self.config.station_id.clone(),
            self.config.user_id.clone(),
            self.clock.now(),
        )
        .with_patient(options.patient_id)
        .with_device(options.device_id);

        self.store.save(&record)?;
        if let Err(e) = self
            .queue
            .enqueue(&record.id, SyncOperation::Create, options.priority)
        {
            // Never leave a record behind that nothing will deliver
            if let Err(undo) = self.store.remove::<Record>(&record.id) {
                tracing::warn!(record_id = %record.id, error = %undo, "failed to roll back unqueued record");
            }
            return Err(e.into());
        }
        self.audit.log(
            AuditAction::Create,
            &record.id,
            &record.record_type,
            json!({ "priority": options.priority, "checksum": record.checksum }),
            None,
        );
        self.events.publish(SyncEvent::RecordSaved {
            record_id: record.id.clone(),
            record_type: record.record_type.clone(),
        });
        tracing::debug!(record_id = %record.id, priority = %options.priority, "record saved");

        if options.priority == Priority::Critical && self.monitor.is_online() {
            self.spawn_immediate_sync(record.id.clone());
        }
        Ok(record)
    }

    fn spawn_immediate_sync(&self, record_id: String) {
        let worker = self.worker.clone();
        tokio::spawn(async move {
            if let Err(e) = worker.sync_one(&record_id).await {
                tracing::warn!(%record_id, error = %e, "immediate sync failed");
            }
        });
    }

    /// Read one record
    pub async fn get_record(&self, id: &str) -> Result<Option<Record>, EngineError> {
        let record = self.store.load::<Record>(id)?;
        let record_type = record.as_ref().map(|r| r.record_type.as_str()).unwrap_or("unknown");
        self.audit.log(
            AuditAction::Read,
            id,
            record_type,
            json!({ "found": record.is_some() }),
            None,
        );
        Ok(record)
    }

    /// Records matching the query, newest first
    pub async fn query_records(&self, query: &RecordQuery) -> Result<Vec<Record>, EngineError> {
        let mut records: Vec<Record> = self
            .store
            .load_all::<Record>()?
            .into_iter()
            .filter(|r| query.matches(r))
            .collect();
        records.sort_by(|a, b| b.created_at.cmp(&a.created_at).then_with(|| b.id.cmp(&a.id)));
        if let Some(limit) = query.limit {
            records.truncate(limit);
        }

        self.audit.log(
            AuditAction::Read,
            "*",
            query.record_type.as_deref().unwrap_or("*"),
            json!({ "query": true, "count": records.len() }),
            None,
        );
        Ok(records)
    }

    /// Replace a record's payload and queue the change
    pub async fn update_record(
        &self,
        id: &str,
        payload: Value,
        options: UpdateOptions,
    ) -> Result<Record, EngineError> {
        let mut record = self
            .store
            .load::<Record>(id)?
            .ok_or_else(|| EngineError::RecordNotFound(id.to_string()))?;
        let original = record.clone();
        record.set_payload(payload, self.clock.now());

        self.store.save(&record)?;
        if let Err(e) = self
            .queue
            .enqueue(&record.id, SyncOperation::Update, options.priority)
        {
            if let Err(undo) = self.store.save(&original) {
                tracing::warn!(record_id = %record.id, error = %undo, "failed to roll back unqueued update");
            }
            return Err(e.into());
        }
        self.audit.log(
            AuditAction::Update,
            &record.id,
            &record.record_type,
            json!({ "previousChecksum": original.checksum, "checksum": record.checksum }),
            None,
        );
        self.events.publish(SyncEvent::RecordUpdated {
            record_id: record.id.clone(),
            record_type: record.record_type.clone(),
        });

        if options.priority == Priority::Critical && self.monitor.is_online() {
            self.spawn_immediate_sync(record.id.clone());
        }
        Ok(record)
    }

    /// Queue items still scheduled for delivery
    pub async fn get_pending_sync_count(&self) -> Result<usize, EngineError> {
        Ok(self.queue.pending_count()?)
    }

    pub async fn get_sync_status(&self) -> Result<SyncStatusReport, EngineError> {
        let items = self.queue.all()?;
        let exhausted = items.iter().filter(|i| i.is_exhausted()).count();
        let failed = self
            .store
            .load_all::<Record>()?
            .iter()
            .filter(|r| r.sync_status == SyncStatus::Failed)
            .count();
        let last_sync = self
            .store
            .load::<SettingsEntry>(LAST_SYNC_KEY)?
            .and_then(|s| s.as_timestamp());

        Ok(SyncStatusReport {
            pending: items.len() - exhausted,
            failed,
            exhausted,
            last_sync,
            is_online: self.monitor.is_online(),
            draining: self.worker.is_draining(),
        })
    }

    /// Queue unsynced records that lost their queue item
    ///
    /// Returns the number of records queued.
    pub async fn requeue_unsynced(&self) -> Result<usize, EngineError> {
        Ok(self.queue.requeue_orphans()?)
    }

    /// Forget all backoff and drain now
    pub async fn force_sync(&self) -> Result<DrainReport, EngineError> {
        self.queue.requeue_orphans()?;
        self.queue.reset(ResetFilter::All)?;
        self.worker.drain().await
    }

    /// Make exhausted items eligible again
    ///
    /// Returns the number of items reset. They go out on the next pass.
    pub async fn retry_failed(&self) -> Result<usize, EngineError> {
        Ok(self.queue.reset(ResetFilter::Exhausted)?)
    }

    /// Run one drain pass now
    pub async fn drain(&self) -> Result<DrainReport, EngineError> {
        self.worker.drain().await
    }

    pub async fn get_audit_log(&self, query: &AuditQuery) -> Result<Vec<AuditEntry>, EngineError> {
        Ok(self.audit.entries(query)?)
    }

    /// Snapshot every record and audit entry
    pub async fn export_data(&self) -> Result<ExportBundle, EngineError> {
        let mut records = self.store.load_all::<Record>()?;
        records.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id)));
        let mut audit_log = self.store.load_all::<AuditEntry>()?;
        audit_log.sort_by(|a, b| a.timestamp.cmp(&b.timestamp).then_with(|| a.id.cmp(&b.id)));

        let bundle = ExportBundle {
            exported_at: self.clock.now(),
            station_id: self.config.station_id.clone(),
            exported_by: self.config.user_id.clone(),
            records,
            audit_log,
        };
        self.audit.log(
            AuditAction::Export,
            "*",
            "export",
            json!({ "records": bundle.records.len(), "auditEntries": bundle.audit_log.len() }),
            None,
        );
        Ok(bundle)
    }

    /// Remove audit entries older than the configured retention
    pub async fn enforce_audit_retention(&self) -> Result<usize, EngineError> {
        Ok(self.audit.purge_expired(self.config.audit.retention)?)
    }

    /// Receive every event the store publishes
    pub fn subscribe(&self) -> EventReceiver {
        self.events
            .subscribe(Subscription::everything(self.id_gen.next("sub")))
    }

    /// Receive events whose names match any of `patterns`
    pub fn subscribe_to(&self, patterns: &[&str]) -> EventReceiver {
        let patterns: Vec<EventPattern> = patterns.iter().map(|p| EventPattern::new(p)).collect();
        self.events.subscribe(Subscription::new(
            self.id_gen.next("sub"),
            patterns,
            "filtered",
        ))
    }

    pub fn is_online(&self) -> bool {
        self.monitor.is_online()
    }

    /// Host connectivity signal; returns true on a transition
    pub fn set_online(&self, online: bool) -> bool {
        self.monitor.set_online(online)
    }

    /// Ask the server whether it is reachable and record the answer
    pub async fn probe_connection(&self) -> bool {
        let reachable = self.transport.probe().await;
        self.monitor.set_online(reachable);
        reachable
    }

    /// Start the periodic drain
    ///
    /// The loop drains every `sync.interval` and immediately after each
    /// offline to online transition. With `probe` set it also probes the
    /// server every `sync.probe_interval` to drive the connection state.
    /// Calling this while a loop is running does nothing.
    pub fn spawn_sync_loop(&self, probe: bool) {
        let mut slot = self.sync_loop.lock().unwrap_or_else(|e| e.into_inner());
        if slot.is_some() {
            return;
        }

        let (shutdown, mut shutdown_rx) = oneshot::channel();
        let worker = self.worker.clone();
        let monitor = self.monitor.clone();
        let transport = self.transport.clone();
        let mut online = monitor.subscribe();
        let mut drain_tick = tokio::time::interval(self.config.sync.interval);
        drain_tick.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut probe_tick = tokio::time::interval(self.config.sync.probe_interval);
        probe_tick.set_missed_tick_behavior(MissedTickBehavior::Delay);

        let handle = tokio::spawn(async move {
            tracing::info!("sync loop started");
            loop {
                tokio::select! {
                    _ = &mut shutdown_rx => break,
                    _ = drain_tick.tick() => run_drain(&worker).await,
                    changed = online.changed() => {
                        if changed.is_err() {
                            break;
                        }
                        if *online.borrow_and_update() {
                            run_drain(&worker).await;
                        }
                    }
                    _ = probe_tick.tick(), if probe => {
                        monitor.set_online(transport.probe().await);
                    }
                }
            }
            tracing::info!("sync loop stopped");
        });

        *slot = Some(SyncLoop { shutdown, handle });
    }

    /// Stop the background loop, letting an in-flight pass finish
    pub async fn destroy(&self) {
        let sync_loop = self
            .sync_loop
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .take();
        if let Some(SyncLoop { shutdown, handle }) = sync_loop {
            let _ = shutdown.send(());
            if let Err(e) = handle.await {
                tracing::warn!(error = %e, "sync loop ended abnormally");
            }
        }
    }
}

async fn run_drain<S, T, C, I>(worker: &SyncWorker<S, T, C, I>)
where
    S: Store,
    T: SyncTransport,
    C: Clock,
    I: IdGen,
{
    if let Err(e) = worker.drain().await {
        tracing::warn!(error = %e, "drain failed");
    }
}

#[cfg(test)]
#[path = "service_tests.rs"]
mod tests;
