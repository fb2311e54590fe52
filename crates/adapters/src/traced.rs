// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Traced adapter wrappers for consistent observability

use crate::remote::{RemoteError, RemoteStore};
use async_trait::async_trait;
use hearth_core::outbox::OutboxAction;

/// Wrapper that adds tracing to any RemoteStore
#[derive(Clone)]
pub struct TracedRemoteStore<R> {
    inner: R,
}

impl<R> TracedRemoteStore<R> {
    pub fn new(inner: R) -> Self {
        Self { inner }
    }
}

#[async_trait]
impl<R: RemoteStore> RemoteStore for TracedRemoteStore<R> {
    async fn apply(&self, action: &OutboxAction) -> Result<(), RemoteError> {
        let span = tracing::info_span!(
            "remote.apply",
            action = %action.id,
            kind = %action.kind,
            task = %action.task_id,
        );
        let _guard = span.enter();

        tracing::info!(attempt = action.attempts + 1, "sending");

        let start = std::time::Instant::now();
        let result = self.inner.apply(action).await;
        let elapsed = start.elapsed();

        match &result {
            Ok(()) => tracing::info!(elapsed_ms = elapsed.as_millis() as u64, "applied"),
            Err(e) => tracing::warn!(
                elapsed_ms = elapsed.as_millis() as u64,
                transient = e.is_transient(),
                error = %e,
                "apply failed"
            ),
        }

        result
    }
}

#[cfg(test)]
#[path = "traced_tests.rs"]
mod tests;
