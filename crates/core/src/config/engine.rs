// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Engine configuration
//!
//! Loaded from a TOML file; every field has a default so a missing or
//! partial file still yields a working engine.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

/// Errors that can occur loading configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
}

/// Tunable engine settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Base URL of the remote document store
    #[serde(default = "default_remote_url")]
    pub remote_url: String,
    /// Bound on each remote call; a timeout is a transient failure
    #[serde(with = "humantime_serde", default = "default_remote_timeout")]
    pub remote_timeout: Duration,
    /// Cadence of the periodic recompute-and-flush tick
    #[serde(with = "humantime_serde", default = "default_tick_interval")]
    pub tick_interval: Duration,
    /// Durable outbox journal location
    #[serde(default = "default_journal_path")]
    pub journal_path: PathBuf,
}

fn default_remote_url() -> String {
    "http://127.0.0.1:8080".to_string()
}

fn default_remote_timeout() -> Duration {
    Duration::from_secs(10)
}

fn default_tick_interval() -> Duration {
    Duration::from_secs(60)
}

fn default_journal_path() -> PathBuf {
    PathBuf::from("outbox.jsonl")
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            remote_url: default_remote_url(),
            remote_timeout: default_remote_timeout(),
            tick_interval: default_tick_interval(),
            journal_path: default_journal_path(),
        }
    }
}

impl EngineConfig {
    /// Parse configuration from TOML text
    pub fn from_toml(text: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(text)?)
    }

    /// Load configuration from a file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_toml(&text)
    }
}
