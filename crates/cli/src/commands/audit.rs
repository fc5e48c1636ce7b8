// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Audit commands: audit, export, purge-audit

use crate::context::Store;
use crate::output::{self, OutputFormat};
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use medsync_core::{AuditAction, AuditEntry};
use medsync_engine::AuditQuery;
use serde::Serialize;
use std::fmt;
use std::path::PathBuf;

#[derive(clap::Args)]
pub struct AuditArgs {
    /// Only entries about this record
    #[arg(long)]
    pub record: Option<String>,
    /// create, read, update, sync, export or retention
    #[arg(long)]
    pub action: Option<AuditAction>,
    #[arg(long)]
    pub since: Option<DateTime<Utc>>,
    #[arg(long)]
    pub until: Option<DateTime<Utc>>,
    #[arg(long, default_value = "50")]
    pub limit: usize,
    /// Check each entry's integrity stamp
    #[arg(long)]
    pub verify: bool,
}

#[derive(clap::Args)]
pub struct ExportArgs {
    /// Write the bundle here instead of stdout
    #[arg(long, short)]
    pub output: Option<PathBuf>,
}

#[derive(Serialize)]
#[serde(transparent)]
struct EntryRow(AuditEntry);

impl fmt::Display for EntryRow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let e = &self.0;
        write!(
            f,
            "{} {:<9} {:<7} {}",
            e.timestamp.format("%Y-%m-%d %H:%M:%S"),
            e.action,
            if e.success { "ok" } else { "FAILED" },
            e.summary()
        )?;
        if let Some(message) = &e.error_message {
            write!(f, " ({})", message)?;
        }
        Ok(())
    }
}

const AUDIT_HEADER: &str = "TIME                ACTION    OUTCOME SUMMARY";

pub async fn audit(store: &Store, args: AuditArgs, format: OutputFormat) -> Result<()> {
    let entries = store
        .get_audit_log(&AuditQuery {
            record_id: args.record,
            action: args.action,
            from: args.since,
            to: args.until,
            limit: Some(args.limit),
        })
        .await?;

    if args.verify {
        let tampered: Vec<&AuditEntry> = entries.iter().filter(|e| !e.verify()).collect();
        for entry in &tampered {
            eprintln!("integrity mismatch: {} ({})", entry.id, entry.summary());
        }
        if !tampered.is_empty() {
            anyhow::bail!("{} audit entries failed verification", tampered.len());
        }
    }

    let rows: Vec<EntryRow> = entries.into_iter().map(EntryRow).collect();
    output::print_list(&rows, AUDIT_HEADER, "No audit entries", format);
    Ok(())
}

pub async fn export(store: &Store, args: ExportArgs) -> Result<()> {
    let bundle = store.export_data().await?;
    let json = serde_json::to_string_pretty(&bundle)?;
    match args.output {
        Some(path) => {
            std::fs::write(&path, json)
                .with_context(|| format!("failed to write {}", path.display()))?;
            eprintln!(
                "Exported {} records and {} audit entries to {}",
                bundle.records.len(),
                bundle.audit_log.len(),
                path.display()
            );
        }
        None => println!("{}", json),
    }
    Ok(())
}

pub async fn purge(store: &Store) -> Result<()> {
    let purged = store.enforce_audit_retention().await?;
    println!("Purged {} expired audit entries", purged);
    Ok(())
}
