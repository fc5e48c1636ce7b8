// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Background sync daemon

use crate::context::{self, Paths, LOCK_FILE};
use crate::error::CliError;
use crate::logging;
use anyhow::Result;
use std::fs::File;
use std::io::Write;
use std::path::Path;
use tracing::info;

#[derive(clap::Args)]
pub struct RunArgs {
    /// Treat the server as reachable instead of probing it
    #[arg(long)]
    pub assume_online: bool,
}

/// Take the data-directory lock and record our pid in it
fn acquire_lock(data_dir: &Path) -> Result<File> {
    let Some(mut file) = context::try_lock(data_dir)? else {
        return Err(CliError::daemon_running(&data_dir.join(LOCK_FILE)).into());
    };
    file.set_len(0)?;
    writeln!(file, "{}", std::process::id())?;
    Ok(file)
}

#[cfg(unix)]
async fn shutdown_signal() -> Result<()> {
    use tokio::signal::unix::{signal, SignalKind};

    let mut sigterm = signal(SignalKind::terminate())?;
    tokio::select! {
        _ = sigterm.recv() => info!("received SIGTERM, shutting down"),
        result = tokio::signal::ctrl_c() => {
            result?;
            info!("received SIGINT, shutting down");
        }
    }
    Ok(())
}

#[cfg(not(unix))]
async fn shutdown_signal() -> Result<()> {
    tokio::signal::ctrl_c().await?;
    info!("received ctrl-c, shutting down");
    Ok(())
}

pub async fn handle(paths: &Paths, args: RunArgs) -> Result<()> {
    let config = paths.load()?;
    let data_dir = context::data_dir(&config);
    let _lock = acquire_lock(&data_dir)?;
    let _log_guard = logging::init_file(&data_dir)?;

    info!(
        pid = std::process::id(),
        data_dir = %data_dir.display(),
        "starting medsync daemon"
    );

    let store = context::open_store(config)?;
    match store.enforce_audit_retention().await {
        Ok(purged) => info!(purged, "startup retention sweep"),
        Err(e) => tracing::warn!(error = %e, "startup retention sweep failed"),
    }
    match store.requeue_unsynced().await {
        Ok(0) => {}
        Ok(requeued) => info!(requeued, "requeued unsynced records"),
        Err(e) => tracing::warn!(error = %e, "startup requeue failed"),
    }

    if args.assume_online {
        store.set_online(true);
    }
    store.spawn_sync_loop(!args.assume_online);

    eprintln!("medsync daemon running, logging to {}", data_dir.join(logging::LOG_FILE).display());
    shutdown_signal().await?;

    store.destroy().await;
    info!("daemon stopped");
    Ok(())
}
