// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::fmt;

/// The logical tables of the store
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Table {
    Records,
    SyncQueue,
    AuditLog,
    Settings,
}

impl Table {
    pub const ALL: [Table; 4] = [
        Table::Records,
        Table::SyncQueue,
        Table::AuditLog,
        Table::Settings,
    ];

    /// Directory / table name on disk
    pub fn as_str(&self) -> &'static str {
        match self {
            Table::Records => "records",
            Table::SyncQueue => "sync_queue",
            Table::AuditLog => "audit_log",
            Table::Settings => "settings",
        }
    }
}

impl fmt::Display for Table {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
