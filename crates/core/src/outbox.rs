// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Outbox queue state machine
//!
//! A client-held, ordered queue of user actions performed while
//! disconnected. Each action carries a client-generated idempotency key;
//! per action the lifecycle is `pending -> in_flight -> settled` or back
//! to `pending` on a transient failure. Actions are never dropped on
//! failure, and settled keys are remembered so a replayed enqueue or
//! apply is a no-op.
//!
//! Durability lives in `hearth-storage`; this type is the in-memory
//! truth the sync loop operates on.

use crate::task::{HouseholdId, MemberId, TaskId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use thiserror::Error;

/// Client-generated idempotency key for one user action
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ActionId(pub String);

impl ActionId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }
}

impl fmt::Display for ActionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for ActionId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for ActionId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// The user intents that reconcile through the outbox
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionKind {
    Accept,
    Release,
    Complete,
    Comment,
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ActionKind::Accept => write!(f, "accept"),
            ActionKind::Release => write!(f, "release"),
            ActionKind::Complete => write!(f, "complete"),
            ActionKind::Comment => write!(f, "comment"),
        }
    }
}

/// One queued user action (the client-persisted wire item)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutboxAction {
    /// Idempotency key; the remote apply is safe to invoke twice with it
    pub id: ActionId,
    pub kind: ActionKind,
    pub household_id: HouseholdId,
    pub task_id: TaskId,
    pub actor: MemberId,
    /// Kind-specific extras (e.g. comment text)
    #[serde(default)]
    pub payload: serde_json::Value,
    pub created_at: DateTime<Utc>,
    /// Remote apply attempts so far
    #[serde(default)]
    pub attempts: u32,
}

impl OutboxAction {
    pub fn new(
        id: impl Into<ActionId>,
        kind: ActionKind,
        household_id: HouseholdId,
        task_id: TaskId,
        actor: MemberId,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: id.into(),
            kind,
            household_id,
            task_id,
            actor,
            payload: serde_json::Value::Null,
            created_at,
            attempts: 0,
        }
    }

    pub fn with_payload(mut self, payload: serde_json::Value) -> Self {
        self.payload = payload;
        self
    }
}

/// Per-action flush state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionState {
    Pending,
    InFlight,
}

/// Errors from queue transitions
#[derive(Debug, Error, PartialEq, Eq)]
pub enum OutboxError {
    #[error("action not queued: {0}")]
    NotQueued(ActionId),
}

/// Ordered queue of unsettled actions plus the settled-key set
#[derive(Debug, Clone, Default)]
pub struct OutboxQueue {
    items: Vec<(OutboxAction, ActionState)>,
    settled: BTreeSet<ActionId>,
}

impl OutboxQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild from journal replay: unsettled actions in enqueue order
    /// plus the keys that already applied remotely
    pub fn restore(pending: Vec<OutboxAction>, settled: BTreeSet<ActionId>) -> Self {
        Self {
            items: pending
                .into_iter()
                .map(|a| (a, ActionState::Pending))
                .collect(),
            settled,
        }
    }

    /// Queue an action. Returns false (and changes nothing) when the
    /// key is already queued or already settled.
    pub fn enqueue(&mut self, action: OutboxAction) -> bool {
        if self.settled.contains(&action.id) || self.contains(&action.id) {
            return false;
        }
        self.items.push((action, ActionState::Pending));
        true
    }

    /// Number of unsettled actions, surfaced as the pending-sync badge
    pub fn pending_count(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn contains(&self, id: &ActionId) -> bool {
        self.items.iter().any(|(a, _)| &a.id == id)
    }

    pub fn is_settled(&self, id: &ActionId) -> bool {
        self.settled.contains(id)
    }

    /// Snapshot of pending actions in enqueue order
    pub fn pending_actions(&self) -> Vec<OutboxAction> {
        self.items
            .iter()
            .filter(|(_, state)| *state == ActionState::Pending)
            .map(|(a, _)| a.clone())
            .collect()
    }

    /// Unsettled actions for one task, in enqueue order
    pub fn actions_for(&self, task_id: &TaskId) -> Vec<&OutboxAction> {
        self.items
            .iter()
            .filter(|(a, _)| &a.task_id == task_id)
            .map(|(a, _)| a)
            .collect()
    }

    /// Mark an action in-flight for a flush round
    pub fn begin(&mut self, id: &ActionId) -> Result<(), OutboxError> {
        let item = self
            .items
            .iter_mut()
            .find(|(a, _)| &a.id == id)
            .ok_or_else(|| OutboxError::NotQueued(id.clone()))?;
        item.1 = ActionState::InFlight;
        Ok(())
    }

    /// Remove a successfully applied (or definitively rejected) action
    /// and remember its key
    pub fn settle(&mut self, id: &ActionId) -> Result<OutboxAction, OutboxError> {
        let index = self
            .items
            .iter()
            .position(|(a, _)| &a.id == id)
            .ok_or_else(|| OutboxError::NotQueued(id.clone()))?;
        let (action, _) = self.items.remove(index);
        self.settled.insert(action.id.clone());
        Ok(action)
    }

    /// Return a failed action to pending without reordering; bumps its
    /// attempt counter
    pub fn retry(&mut self, id: &ActionId) -> Result<u32, OutboxError> {
        let item = self
            .items
            .iter_mut()
            .find(|(a, _)| &a.id == id)
            .ok_or_else(|| OutboxError::NotQueued(id.clone()))?;
        item.0.attempts += 1;
        item.1 = ActionState::Pending;
        Ok(item.0.attempts)
    }
}

#[cfg(test)]
#[path = "outbox_tests.rs"]
mod tests;
