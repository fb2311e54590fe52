// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Fake remote store for testing
//!
//! Records every call, dedups applies by idempotency key the way the
//! real store does, and supports scripted failures so flush ordering
//! and retry behavior can be exercised.

use super::{RemoteError, RemoteStore};
use async_trait::async_trait;
use hearth_core::outbox::{ActionId, ActionKind, OutboxAction};
use hearth_core::task::TaskId;
use std::collections::{HashSet, VecDeque};
use std::sync::{Arc, Mutex};

/// Recorded remote call
#[derive(Debug, Clone)]
pub struct RemoteCall {
    pub action_id: ActionId,
    pub kind: ActionKind,
    pub task_id: TaskId,
}

/// Fake remote store for testing
#[derive(Clone, Default)]
pub struct FakeRemoteStore {
    applied: Arc<Mutex<Vec<ActionId>>>,
    calls: Arc<Mutex<Vec<RemoteCall>>>,
    scripted_failures: Arc<Mutex<VecDeque<RemoteError>>>,
    rejected_ids: Arc<Mutex<HashSet<ActionId>>>,
}

impl FakeRemoteStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Script the next call to fail with the given error
    pub fn fail_next(&self, error: RemoteError) {
        self.scripted_failures
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push_back(error);
    }

    /// Script the next `n` calls to fail transiently
    pub fn fail_next_times(&self, n: usize) {
        for _ in 0..n {
            self.fail_next(RemoteError::Transient("scripted outage".to_string()));
        }
    }

    /// Make every apply of this key fail definitively
    pub fn reject_id(&self, id: impl Into<ActionId>) {
        self.rejected_ids
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .insert(id.into());
    }

    /// All recorded calls, including failed ones
    pub fn calls(&self) -> Vec<RemoteCall> {
        self.calls.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    /// Keys applied at least once, in first-apply order
    pub fn applied_keys(&self) -> Vec<ActionId> {
        self.applied
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    /// How many times a key was attempted
    pub fn attempt_count(&self, id: &ActionId) -> usize {
        self.calls
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .iter()
            .filter(|c| &c.action_id == id)
            .count()
    }
}

#[async_trait]
impl RemoteStore for FakeRemoteStore {
    async fn apply(&self, action: &OutboxAction) -> Result<(), RemoteError> {
        self.calls
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(RemoteCall {
                action_id: action.id.clone(),
                kind: action.kind,
                task_id: action.task_id.clone(),
            });

        if let Some(error) = self
            .scripted_failures
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .pop_front()
        {
            return Err(error);
        }

        if self
            .rejected_ids
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .contains(&action.id)
        {
            return Err(RemoteError::Rejected(format!(
                "{} refused by script",
                action.id
            )));
        }

        // Server-side dedup on the idempotency key
        let mut applied = self.applied.lock().unwrap_or_else(|e| e.into_inner());
        if !applied.contains(&action.id) {
            applied.push(action.id.clone());
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "fake_tests.rs"]
mod tests;
