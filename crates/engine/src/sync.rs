// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Outbox flush
//!
//! Replays pending actions against the remote store. Within one task
//! actions apply strictly in enqueue order: the first failure for a
//! task stalls that task's remaining actions until the next flush, so
//! a `complete` can never overtake the `accept` it depends on. Across
//! tasks no ordering is guaranteed or required.

use hearth_adapters::RemoteStore;
use hearth_core::event::Event;
use hearth_core::outbox::OutboxQueue;
use hearth_core::task::TaskId;
use hearth_storage::{JournalError, OutboxJournal, OutboxOp};
use std::collections::HashSet;

/// Result of one flush pass
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FlushReport {
    pub ok: usize,
    pub failed: usize,
}

/// Drain the queue against the remote store.
///
/// Transient failures keep the action pending for the next flush;
/// definitive refusals settle it without effect and surface an
/// `outbox:rejected` event.
pub async fn flush<R: RemoteStore>(
    queue: &mut OutboxQueue,
    journal: &mut OutboxJournal,
    remote: &R,
) -> Result<(FlushReport, Vec<Event>), JournalError> {
    let mut report = FlushReport::default();
    let mut events = Vec::new();
    let mut stalled: HashSet<TaskId> = HashSet::new();

    for action in queue.pending_actions() {
        if stalled.contains(&action.task_id) {
            continue;
        }
        if queue.begin(&action.id).is_err() {
            continue;
        }

        match remote.apply(&action).await {
            Ok(()) => {
                if let Err(err) = queue.settle(&action.id) {
                    tracing::error!(action = %action.id, error = %err, "settle after apply failed");
                    continue;
                }
                journal.append(OutboxOp::Applied {
                    action_id: action.id.clone(),
                })?;
                events.push(Event::OutboxApplied {
                    action_id: action.id.clone(),
                });
                report.ok += 1;
            }
            Err(err) if err.is_transient() => {
                let attempts = queue.retry(&action.id).unwrap_or_default();
                tracing::debug!(
                    action = %action.id,
                    attempts,
                    error = %err,
                    "flush attempt failed, action stays pending"
                );
                stalled.insert(action.task_id.clone());
                report.failed += 1;
            }
            Err(err) => {
                if let Err(settle_err) = queue.settle(&action.id) {
                    tracing::error!(action = %action.id, error = %settle_err, "settle after rejection failed");
                    continue;
                }
                journal.append(OutboxOp::Rejected {
                    action_id: action.id.clone(),
                    reason: err.to_string(),
                })?;
                events.push(Event::OutboxRejected {
                    action_id: action.id.clone(),
                    reason: err.to_string(),
                });
                report.failed += 1;
            }
        }
    }

    if report.ok > 0 || report.failed > 0 {
        events.push(Event::OutboxFlushed {
            ok: report.ok,
            failed: report.failed,
        });
    }
    Ok((report, events))
}
