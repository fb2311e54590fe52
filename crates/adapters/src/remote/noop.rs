// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! No-op remote store for local-only operation

use super::{RemoteError, RemoteStore};
use async_trait::async_trait;
use hearth_core::outbox::OutboxAction;

/// Accepts every action without talking to anything
#[derive(Clone, Default)]
pub struct NoOpRemoteStore;

#[async_trait]
impl RemoteStore for NoOpRemoteStore {
    async fn apply(&self, action: &OutboxAction) -> Result<(), RemoteError> {
        tracing::debug!(action = %action.id, kind = %action.kind, "no-op remote apply");
        Ok(())
    }
}
