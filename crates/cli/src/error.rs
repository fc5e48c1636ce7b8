// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! User-friendly error display with context and suggestions

use std::fmt;
use std::path::Path;

/// Error with context and recovery suggestions for user-friendly display
#[derive(Debug)]
pub struct CliError {
    /// What went wrong
    pub message: String,
    /// Why it might have happened
    pub context: Vec<String>,
    /// How to fix it
    pub suggestions: Vec<String>,
}

impl CliError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            context: Vec::new(),
            suggestions: Vec::new(),
        }
    }

    pub fn with_context(mut self, ctx: impl Into<String>) -> Self {
        self.context.push(ctx.into());
        self
    }

    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestions.push(suggestion.into());
        self
    }

    /// No configuration file where one was expected
    pub fn config_not_found(path: &Path) -> Self {
        CliError::new(format!("configuration not found at {}", path.display()))
            .with_context("medsync needs server_url, station_id and user_id to run")
            .with_suggestion(format!(
                "Create {} with server_url, station_id and user_id",
                path.display()
            ))
            .with_suggestion("Point at another file: medsync --config <path> ...")
    }

    /// Another `medsync run` holds the data directory
    pub fn daemon_running(lock_path: &Path) -> Self {
        CliError::new("another medsync daemon is already running")
            .with_context(format!("Lock held on {}", lock_path.display()))
            .with_suggestion("Stop the running daemon before starting a new one")
            .with_suggestion("Use a different data directory: medsync --data-dir <dir> run")
    }

    /// A one-shot drain while `medsync run` owns the queue
    pub fn daemon_owns_queue(lock_path: &Path) -> Self {
        CliError::new("a medsync daemon is syncing this data directory")
            .with_context(format!("Lock held on {}", lock_path.display()))
            .with_suggestion("The daemon drains the queue on its own; check progress with: medsync status")
            .with_suggestion("Stop the daemon to sync by hand")
    }

    /// A record id that does not exist
    pub fn record_not_found(id: &str) -> Self {
        CliError::new(format!("record '{}' not found", id))
            .with_suggestion("List records: medsync query")
    }

    /// A payload argument that is not JSON
    pub fn invalid_payload(reason: &str) -> Self {
        CliError::new("payload is not valid JSON")
            .with_context(reason.to_string())
            .with_suggestion("Quote the payload: medsync save vitals '{\"pulse\": 72}'")
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", self.message)?;

        if !self.context.is_empty() {
            writeln!(f)?;
            for ctx in &self.context {
                writeln!(f, "  -> {}", ctx)?;
            }
        }

        if !self.suggestions.is_empty() {
            writeln!(f)?;
            writeln!(f, "suggestions:")?;
            for (i, suggestion) in self.suggestions.iter().enumerate() {
                writeln!(f, "  {}. {}", i + 1, suggestion)?;
            }
        }

        Ok(())
    }
}

impl std::error::Error for CliError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_lists_context_and_numbered_suggestions() {
        let err = CliError::new("Something went wrong")
            .with_context("First context")
            .with_context("Second context")
            .with_suggestion("Try this")
            .with_suggestion("Or this");

        let output = format!("{}", err);
        assert!(output.starts_with("Something went wrong"));
        assert!(output.contains("-> First context"));
        assert!(output.contains("-> Second context"));
        assert!(output.contains("1. Try this"));
        assert!(output.contains("2. Or this"));
    }

    #[test]
    fn config_not_found_names_the_path() {
        let output = CliError::config_not_found(Path::new("/etc/medsync.toml")).to_string();
        assert!(output.contains("/etc/medsync.toml"));
        assert!(output.contains("--config"));
    }
}
