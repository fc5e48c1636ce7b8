// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Record commands: save, get, query, update

use crate::context::Store;
use crate::error::CliError;
use crate::output::{self, OutputFormat};
use anyhow::Result;
use chrono::{DateTime, Utc};
use medsync_core::{Priority, Record, SyncStatus};
use medsync_engine::{EngineError, RecordQuery, SaveOptions, UpdateOptions};
use serde::Serialize;
use serde_json::Value;
use std::fmt;
use std::path::PathBuf;

#[derive(clap::Args)]
pub struct SaveArgs {
    /// Record type (vitals, labs, alarm, ...)
    pub record_type: String,
    /// Payload as a JSON document; omit to read --file
    pub payload: Option<String>,
    /// Read the payload from a file
    #[arg(long, conflicts_with = "payload")]
    pub file: Option<PathBuf>,
    #[arg(long)]
    pub patient: Option<String>,
    #[arg(long)]
    pub device: Option<String>,
    /// critical, high, normal or low
    #[arg(long, default_value = "normal")]
    pub priority: Priority,
}

#[derive(clap::Args)]
pub struct GetArgs {
    pub id: String,
}

#[derive(clap::Args)]
pub struct QueryArgs {
    #[arg(long = "type")]
    pub record_type: Option<String>,
    #[arg(long)]
    pub patient: Option<String>,
    #[arg(long)]
    pub device: Option<String>,
    /// pending, syncing, synced, failed or conflict
    #[arg(long)]
    pub status: Option<SyncStatus>,
    /// Only records created at or after this RFC 3339 time
    #[arg(long)]
    pub since: Option<DateTime<Utc>>,
    /// Only records created at or before this RFC 3339 time
    #[arg(long)]
    pub until: Option<DateTime<Utc>>,
    #[arg(long)]
    pub limit: Option<usize>,
}

#[derive(clap::Args)]
pub struct UpdateArgs {
    pub id: String,
    /// New payload as a JSON document; omit to read --file
    pub payload: Option<String>,
    #[arg(long, conflicts_with = "payload")]
    pub file: Option<PathBuf>,
    #[arg(long, default_value = "normal")]
    pub priority: Priority,
}

/// One line per record in text mode
#[derive(Serialize)]
#[serde(transparent)]
struct RecordRow(Record);

impl fmt::Display for RecordRow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let r = &self.0;
        write!(
            f,
            "{:<38} {:<12} {:<10} {:<8} {}",
            r.id,
            r.record_type,
            r.sync_status,
            r.sync_attempts,
            r.created_at.format("%Y-%m-%d %H:%M:%S")
        )
    }
}

const RECORD_HEADER: &str = "ID                                     TYPE         STATUS     ATTEMPTS CREATED";

fn read_payload(inline: Option<String>, file: Option<PathBuf>) -> Result<Value> {
    let text = match (inline, file) {
        (Some(text), _) => text,
        (None, Some(path)) => std::fs::read_to_string(&path)?,
        (None, None) => return Err(CliError::invalid_payload("no payload given").into()),
    };
    serde_json::from_str(&text).map_err(|e| CliError::invalid_payload(&e.to_string()).into())
}

pub async fn save(store: &Store, args: SaveArgs, format: OutputFormat) -> Result<()> {
    let payload = read_payload(args.payload, args.file)?;
    let record = store
        .save_record(
            &args.record_type,
            payload,
            SaveOptions {
                patient_id: args.patient,
                device_id: args.device,
                priority: args.priority,
            },
        )
        .await?;

    match format {
        OutputFormat::Text => println!("{}", record.id),
        OutputFormat::Json => output::print(&RecordRow(record), format),
    }
    Ok(())
}

pub async fn get(store: &Store, args: GetArgs) -> Result<()> {
    let record = store
        .get_record(&args.id)
        .await?
        .ok_or_else(|| CliError::record_not_found(&args.id))?;
    // A single record is always shown in full
    println!("{}", serde_json::to_string_pretty(&record)?);
    Ok(())
}

pub async fn query(store: &Store, args: QueryArgs, format: OutputFormat) -> Result<()> {
    let records = store
        .query_records(&RecordQuery {
            record_type: args.record_type,
            patient_id: args.patient,
            device_id: args.device,
            from: args.since,
            to: args.until,
            status: args.status,
            limit: args.limit,
        })
        .await?;
    let rows: Vec<RecordRow> = records.into_iter().map(RecordRow).collect();
    output::print_list(&rows, RECORD_HEADER, "No records", format);
    Ok(())
}

pub async fn update(store: &Store, args: UpdateArgs, format: OutputFormat) -> Result<()> {
    let payload = read_payload(args.payload, args.file)?;
    let record = match store
        .update_record(
            &args.id,
            payload,
            UpdateOptions {
                priority: args.priority,
            },
        )
        .await
    {
        Ok(record) => record,
        Err(EngineError::RecordNotFound(id)) => return Err(CliError::record_not_found(&id).into()),
        Err(e) => return Err(e.into()),
    };

    match format {
        OutputFormat::Text => println!("{} {}", record.id, record.checksum),
        OutputFormat::Json => output::print(&RecordRow(record), format),
    }
    Ok(())
}
