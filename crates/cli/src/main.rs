// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! medsync - local-first medical record store

mod commands;
mod context;
mod error;
mod logging;
mod output;

use anyhow::Result;
use clap::{Parser, Subcommand};
use commands::{audit, record, run, sync};
use context::Paths;
use output::OutputFormat;
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "medsync",
    version,
    about = "Local-first medical record store with background sync"
)]
struct Cli {
    /// Configuration file
    #[arg(long, global = true, default_value = "medsync.toml")]
    config: PathBuf,

    /// Directory holding the local tables (overrides the config file)
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    /// Output format
    #[arg(long, global = true, value_enum, default_value_t = OutputFormat::Text)]
    format: OutputFormat,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Save a new record
    Save(record::SaveArgs),
    /// Show one record
    Get(record::GetArgs),
    /// List records, newest first
    Query(record::QueryArgs),
    /// Replace a record's payload
    Update(record::UpdateArgs),
    /// Show sync health
    Status,
    /// Drain the sync queue now
    Sync(sync::SyncArgs),
    /// Reset exhausted queue items and drain
    Retry,
    /// Show the audit trail, newest first
    Audit(audit::AuditArgs),
    /// Export every record and audit entry as JSON
    Export(audit::ExportArgs),
    /// Remove audit entries past the retention period
    PurgeAudit,
    /// Run the background sync daemon
    Run(run::RunArgs),
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let paths = Paths {
        config: Some(cli.config),
        data_dir: cli.data_dir,
    };

    // The daemon sets up its own file logging
    if let Commands::Run(args) = cli.command {
        return run::handle(&paths, args).await;
    }

    logging::init_stderr();
    let store = context::open_store(paths.load()?)?;
    let format = cli.format;

    match cli.command {
        Commands::Save(args) => record::save(&store, args, format).await?,
        Commands::Get(args) => record::get(&store, args).await?,
        Commands::Query(args) => record::query(&store, args, format).await?,
        Commands::Update(args) => record::update(&store, args, format).await?,
        Commands::Status => sync::status(&store, format).await?,
        Commands::Sync(args) => sync::sync(&store, args, format).await?,
        Commands::Retry => sync::retry(&store, format).await?,
        Commands::Audit(args) => audit::audit(&store, args, format).await?,
        Commands::Export(args) => audit::export(&store, args).await?,
        Commands::PurgeAudit => audit::purge(&store).await?,
        Commands::Run(_) => {}
    }

    Ok(())
}
