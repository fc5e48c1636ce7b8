// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Payload checksums and audit integrity stamps
//!
//! CRC-32 over the canonical JSON serialization. This detects corruption
//! and casual tampering; it is not a cryptographic proof.

use chrono::{DateTime, SecondsFormat, Utc};
use serde_json::Value;

/// Checksum of a JSON payload as 8 lowercase hex digits
///
/// serde_json serializes object keys in sorted order, so two payloads
/// with the same content always hash the same regardless of how they
/// were built.
pub fn hash(payload: &Value) -> String {
    // to_string cannot fail for a Value; the empty-string fallback is never hashed
    let json = serde_json::to_string(payload).unwrap_or_default();
    hash_bytes(json.as_bytes())
}

/// Checksum of raw bytes as 8 lowercase hex digits
pub fn hash_bytes(bytes: &[u8]) -> String {
    format!("{:08x}", crc32fast::hash(bytes))
}

/// Integrity stamp for an audit entry
///
/// Covers the action summary, the timestamp and the outcome, so editing
/// any of them after the fact breaks verification.
pub fn audit_stamp(summary: &str, timestamp: DateTime<Utc>, success: bool) -> String {
    let stamp = serde_json::json!({
        "summary": summary,
        "timestamp": timestamp.to_rfc3339_opts(SecondsFormat::Micros, true),
        "outcome": if success { "success" } else { "failure" },
    });
    hash(&stamp)
}

#[cfg(test)]
#[path = "checksum_tests.rs"]
mod tests;
