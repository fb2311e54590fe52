// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! No-op notification adapter

use super::{NotifyAdapter, NotifyError};
use async_trait::async_trait;
use hearth_core::config::Notification;

/// Swallows notifications; useful headless and in tests that don't
/// care about delivery
#[derive(Clone, Default)]
pub struct NoOpNotifyAdapter;

#[async_trait]
impl NotifyAdapter for NoOpNotifyAdapter {
    async fn send(&self, notification: &Notification) -> Result<(), NotifyError> {
        tracing::debug!(title = %notification.title, "dropping notification");
        Ok(())
    }
}
