// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Journal entry structure with checksum verification
//!
//! Each entry records one outbox operation together with a sequence
//! number, timestamp, originating device id, and a CRC32 checksum so a
//! torn or corrupted line is detected on replay instead of silently
//! reconstructing a wrong queue.

use hearth_core::outbox::{ActionId, OutboxAction};
use serde::{Deserialize, Serialize};
use std::time::{SystemTime, UNIX_EPOCH};
use thiserror::Error;

/// Errors from entry encoding/decoding
#[derive(Debug, Error)]
pub enum EntryError {
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// One durable outbox operation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum OutboxOp {
    /// A user intent entered the queue
    Enqueued { action: OutboxAction },
    /// The intent applied remotely; its key is settled
    Applied { action_id: ActionId },
    /// The remote definitively refused the intent; settled without effect
    Rejected { action_id: ActionId, reason: String },
}

/// A single entry in the outbox journal
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JournalEntry {
    /// Monotonically increasing sequence number
    pub sequence: u64,
    /// Microseconds since Unix epoch
    pub timestamp_micros: u64,
    /// Device that wrote the entry (households sync from several phones)
    pub device_id: String,
    /// The operation being recorded
    pub op: OutboxOp,
    /// CRC32 checksum of the serialized operation
    pub checksum: u32,
}

impl JournalEntry {
    /// Create a new entry with computed checksum
    pub fn new(sequence: u64, device_id: &str, op: OutboxOp) -> Self {
        let checksum = Self::calculate_checksum(&op);
        let timestamp_micros = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_micros() as u64)
            .unwrap_or(0);

        Self {
            sequence,
            timestamp_micros,
            device_id: device_id.to_string(),
            op,
            checksum,
        }
    }

    /// Calculate the CRC32 checksum of the operation
    fn calculate_checksum(op: &OutboxOp) -> u32 {
        // OutboxOp only holds strings, maps, and JSON values, so
        // serialization cannot fail
        let json = serde_json::to_string(op).unwrap_or_else(|_| String::new());
        crc32fast::hash(json.as_bytes())
    }

    /// Verify the checksum matches the operation
    pub fn verify(&self) -> bool {
        self.checksum == Self::calculate_checksum(&self.op)
    }

    /// Serialize to one newline-delimited JSON line
    pub fn to_line(&self) -> Result<String, EntryError> {
        Ok(serde_json::to_string(self)?)
    }

    /// Parse from a single line of JSON
    pub fn from_line(line: &str) -> Result<Self, EntryError> {
        Ok(serde_json::from_str(line)?)
    }
}

#[cfg(test)]
#[path = "entry_tests.rs"]
mod tests;
