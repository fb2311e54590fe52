// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Materialized outbox state from journal replay

use crate::entry::OutboxOp;
use hearth_core::outbox::{ActionId, OutboxAction, OutboxQueue};
use std::collections::BTreeSet;

/// Outbox state rebuilt from replayed operations: unsettled actions in
/// enqueue order plus every idempotency key that already settled
#[derive(Debug, Default)]
pub struct MaterializedOutbox {
    pending: Vec<OutboxAction>,
    settled: BTreeSet<ActionId>,
}

impl MaterializedOutbox {
    /// Fold a sequence of journal operations into outbox state
    pub fn from_ops(ops: Vec<OutboxOp>) -> Self {
        let mut state = Self::default();
        for op in ops {
            state.apply(op);
        }
        state
    }

    /// Apply one operation to the state
    pub fn apply(&mut self, op: OutboxOp) {
        match op {
            OutboxOp::Enqueued { action } => {
                // A replayed enqueue for a settled or queued key is a
                // duplicate and must not re-apply
                if self.settled.contains(&action.id)
                    || self.pending.iter().any(|a| a.id == action.id)
                {
                    return;
                }
                self.pending.push(action);
            }
            OutboxOp::Applied { action_id } | OutboxOp::Rejected { action_id, .. } => {
                self.pending.retain(|a| a.id != action_id);
                self.settled.insert(action_id);
            }
        }
    }

    pub fn pending(&self) -> &[OutboxAction] {
        &self.pending
    }

    pub fn settled(&self) -> &BTreeSet<ActionId> {
        &self.settled
    }

    /// Hand the state to the in-memory queue the sync loop drives
    pub fn into_queue(self) -> OutboxQueue {
        OutboxQueue::restore(self.pending, self.settled)
    }
}

#[cfg(test)]
#[path = "state_tests.rs"]
mod tests;
