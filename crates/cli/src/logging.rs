// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Tracing setup
//!
//! One-shot commands log to stderr at `warn` unless `RUST_LOG` says
//! otherwise. The daemon logs to `<data_dir>/medsync.log` at `info`.

use anyhow::{Context, Result};
use std::path::Path;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Log file name inside the data directory
pub const LOG_FILE: &str = "medsync.log";

fn filter(default: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default))
}

/// Stderr logging for one-shot commands
pub fn init_stderr() {
    let _ = tracing_subscriber::registry()
        .with(filter("warn"))
        .with(fmt::layer().with_writer(std::io::stderr))
        .try_init();
}

/// File logging for the daemon; keep the guard alive until exit
pub fn init_file(data_dir: &Path) -> Result<WorkerGuard> {
    std::fs::create_dir_all(data_dir)
        .with_context(|| format!("failed to create {}", data_dir.display()))?;
    let appender = tracing_appender::rolling::never(data_dir, LOG_FILE);
    let (writer, guard) = tracing_appender::non_blocking(appender);

    tracing_subscriber::registry()
        .with(filter("info"))
        .with(fmt::layer().with_ansi(false).with_writer(writer))
        .try_init()
        .context("failed to install log subscriber")?;
    Ok(guard)
}
