// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Append-only outbox journal
//!
//! One JSON entry per line, fsynced on append. Replay tolerates corrupt
//! or torn lines by skipping them with a warning: losing one action to
//! disk corruption beats refusing to start.

use crate::entry::{EntryError, JournalEntry, OutboxOp};
use std::fs::{File, OpenOptions};
use std::io::{self, BufRead, BufReader, Write};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors from journal operations
#[derive(Debug, Error)]
pub enum JournalError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
    #[error("entry encoding error: {0}")]
    Entry(#[from] EntryError),
}

/// Durable, ordered log of outbox operations
pub struct OutboxJournal {
    file: File,
    path: PathBuf,
    device_id: String,
    sequence: u64,
}

impl OutboxJournal {
    /// Open or create a journal; the device id is minted fresh, which
    /// is fine because entries are only compared by content
    pub fn open(path: &Path) -> Result<Self, JournalError> {
        Self::open_with_device(path, &uuid::Uuid::new_v4().to_string())
    }

    /// Open or create a journal with a fixed device id
    pub fn open_with_device(path: &Path, device_id: &str) -> Result<Self, JournalError> {
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .read(true)
            .open(path)?;

        // Resume the sequence from existing entries
        let reader = BufReader::new(File::open(path)?);
        let sequence = reader.lines().map_while(Result::ok).filter(|l| !l.is_empty()).count() as u64;

        Ok(Self {
            file,
            path: path.to_path_buf(),
            device_id: device_id.to_string(),
            sequence,
        })
    }

    /// Append an operation; flushed to disk before returning
    pub fn append(&mut self, op: OutboxOp) -> Result<u64, JournalError> {
        self.sequence += 1;
        let entry = JournalEntry::new(self.sequence, &self.device_id, op);
        let line = entry.to_line()?;
        writeln!(self.file, "{}", line)?;
        self.file.sync_all()?;
        Ok(self.sequence)
    }

    /// Current sequence number
    pub fn sequence(&self) -> u64 {
        self.sequence
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Replay all valid operations from the journal in write order.
    /// A missing file is an empty journal; unparseable or checksum-
    /// failing lines are skipped with a warning.
    pub fn replay(path: &Path) -> Result<Vec<OutboxOp>, JournalError> {
        let file = match File::open(path) {
            Ok(f) => f,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let reader = BufReader::new(file);
        let mut ops = Vec::new();

        for (index, line) in reader.lines().enumerate() {
            let line = line?;
            if line.is_empty() {
                continue;
            }
            match JournalEntry::from_line(&line) {
                Ok(entry) if entry.verify() => ops.push(entry.op),
                Ok(_) => {
                    tracing::warn!(line = index + 1, "journal entry failed checksum, skipping");
                }
                Err(err) => {
                    tracing::warn!(line = index + 1, error = %err, "unparseable journal entry, skipping");
                }
            }
        }

        Ok(ops)
    }
}

#[cfg(test)]
#[path = "journal_tests.rs"]
mod tests;
