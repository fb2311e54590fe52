// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Remote document store adapter
//!
//! The store owns task records and serializes writes per task id; the
//! client sends user intents and expects applying the same idempotency
//! key twice to be harmless.

mod http;
mod noop;

pub use http::HttpRemoteStore;
pub use noop::NoOpRemoteStore;

// Test support - only compiled for tests or when explicitly requested
#[cfg(any(test, feature = "test-support"))]
mod fake;
#[cfg(any(test, feature = "test-support"))]
pub use fake::{FakeRemoteStore, RemoteCall};

use async_trait::async_trait;
use hearth_core::outbox::OutboxAction;
use thiserror::Error;

/// Errors from remote apply operations
#[derive(Debug, Clone, Error)]
pub enum RemoteError {
    /// Network trouble or timeout; worth retrying on the next flush
    #[error("transient remote failure: {0}")]
    Transient(String),
    /// The referenced record vanished; retrying cannot help
    #[error("remote record not found: {0}")]
    NotFound(String),
    /// The store refused the intent; retrying cannot help
    #[error("remote rejected action: {0}")]
    Rejected(String),
}

impl RemoteError {
    /// Whether the action should stay queued for another attempt
    pub fn is_transient(&self) -> bool {
        matches!(self, RemoteError::Transient(_))
    }
}

/// Adapter for the remote document store
#[async_trait]
pub trait RemoteStore: Clone + Send + Sync + 'static {
    /// Apply one user intent. Must be idempotent for a repeated action
    /// id: the store dedups on the idempotency key.
    async fn apply(&self, action: &OutboxAction) -> Result<(), RemoteError>;
}
