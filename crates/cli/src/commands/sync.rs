// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Sync commands: status, sync, retry

use crate::context::{self, Store, LOCK_FILE};
use crate::error::CliError;
use crate::output::{self, OutputFormat};
use anyhow::Result;
use chrono::Utc;
use medsync_engine::{DrainReport, SkipReason, SyncStatusReport};
use serde::Serialize;
use std::fmt;
use std::fs::File;

#[derive(clap::Args)]
pub struct SyncArgs {
    /// Reset every backoff timer before draining
    #[arg(long)]
    pub force: bool,
}

#[derive(Serialize)]
#[serde(transparent)]
struct StatusView(SyncStatusReport);

impl fmt::Display for StatusView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = &self.0;
        writeln!(f, "Online:    {}", if s.is_online { "yes" } else { "no" })?;
        writeln!(f, "Pending:   {}", s.pending)?;
        writeln!(f, "Failed:    {}", s.failed)?;
        writeln!(f, "Exhausted: {}", s.exhausted)?;
        match s.last_sync {
            Some(at) => {
                let ago = (Utc::now() - at).to_std().unwrap_or_default();
                let ago = std::time::Duration::from_secs(ago.as_secs());
                write!(f, "Last sync: {} ({} ago)", at.to_rfc3339(), humantime::format_duration(ago))
            }
            None => write!(f, "Last sync: never"),
        }
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct DrainView {
    attempted: usize,
    synced: usize,
    failed: usize,
    dropped: usize,
    superseded: usize,
    skipped: Option<&'static str>,
}

impl From<&DrainReport> for DrainView {
    fn from(report: &DrainReport) -> Self {
        Self {
            attempted: report.attempted,
            synced: report.synced,
            failed: report.failed,
            dropped: report.dropped,
            superseded: report.superseded,
            skipped: report.skipped.map(|reason| match reason {
                SkipReason::AlreadyRunning => "already-running",
                SkipReason::Offline => "offline",
            }),
        }
    }
}

impl fmt::Display for DrainView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.skipped {
            Some("offline") => write!(f, "Server unreachable, nothing sent"),
            Some(reason) => write!(f, "Skipped: {}", reason),
            None => write!(
                f,
                "Attempted {}, synced {}, failed {}",
                self.attempted, self.synced, self.failed
            ),
        }
    }
}

/// Hold the data-directory lock for a drain; refuses while the daemon runs
fn lock_queue(store: &Store) -> Result<File> {
    let data_dir = context::data_dir(store.config());
    match context::try_lock(&data_dir)? {
        Some(lock) => Ok(lock),
        None => Err(CliError::daemon_owns_queue(&data_dir.join(LOCK_FILE)).into()),
    }
}

pub async fn status(store: &Store, format: OutputFormat) -> Result<()> {
    store.probe_connection().await;
    let report = store.get_sync_status().await?;
    output::print(&StatusView(report), format);
    Ok(())
}

pub async fn sync(store: &Store, args: SyncArgs, format: OutputFormat) -> Result<()> {
    let _lock = lock_queue(store)?;
    store.probe_connection().await;
    let report = if args.force {
        store.force_sync().await?
    } else {
        store.drain().await?
    };
    output::print(&DrainView::from(&report), format);
    Ok(())
}

pub async fn retry(store: &Store, format: OutputFormat) -> Result<()> {
    let _lock = lock_queue(store)?;
    let reset = store.retry_failed().await?;
    if matches!(format, OutputFormat::Text) {
        println!("Reset {} exhausted item(s)", reset);
    }
    store.probe_connection().await;
    let report = store.drain().await?;
    output::print(&DrainView::from(&report), format);
    Ok(())
}
