// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Events emitted by the scheduling engine
//!
//! Events are facts about what happened; the runtime publishes them on
//! the bus and routes a configured subset to the notification adapter.

use crate::outbox::ActionId;
use crate::reschedule::ShiftReason;
use crate::task::{MemberId, TaskId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Events emitted by household mutations and outbox sync
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Event {
    // Task lifecycle
    TaskCreated {
        id: TaskId,
    },
    TaskUpdated {
        id: TaskId,
    },
    TaskRemoved {
        id: TaskId,
    },
    TaskBlocked {
        id: TaskId,
        blockers: Vec<TaskId>,
    },
    TaskUnblocked {
        id: TaskId,
    },
    TaskAccepted {
        id: TaskId,
        member: MemberId,
    },
    TaskReleased {
        id: TaskId,
        member: MemberId,
    },
    TaskCompleted {
        id: TaskId,
        member: MemberId,
    },
    TaskVerified {
        id: TaskId,
    },
    TaskRejected {
        id: TaskId,
    },
    TaskSnoozed {
        id: TaskId,
        minutes: i64,
    },

    // Dependencies
    DependencyAdded {
        id: TaskId,
        blocker: TaskId,
    },
    DependencyRemoved {
        id: TaskId,
        blocker: TaskId,
    },

    // Occurrences
    OccurrenceScheduled {
        id: TaskId,
        at: DateTime<Utc>,
    },
    OccurrenceRescheduled {
        id: TaskId,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
        reason: ShiftReason,
    },
    OccurrenceDue {
        id: TaskId,
        at: DateTime<Utc>,
    },
    SeriesFinished {
        id: TaskId,
    },
    RotationAdvanced {
        id: TaskId,
        assignee: Option<MemberId>,
    },

    // Outbox sync
    OutboxEnqueued {
        action_id: ActionId,
        task_id: TaskId,
    },
    OutboxApplied {
        action_id: ActionId,
    },
    OutboxRejected {
        action_id: ActionId,
        reason: String,
    },
    OutboxFlushed {
        ok: usize,
        failed: usize,
    },
}

impl Event {
    /// Stable event name used for subscription and notification patterns
    pub fn name(&self) -> String {
        match self {
            Event::TaskCreated { .. } => "task:created".to_string(),
            Event::TaskUpdated { .. } => "task:updated".to_string(),
            Event::TaskRemoved { .. } => "task:removed".to_string(),
            Event::TaskBlocked { .. } => "task:blocked".to_string(),
            Event::TaskUnblocked { .. } => "task:unblocked".to_string(),
            Event::TaskAccepted { .. } => "task:accepted".to_string(),
            Event::TaskReleased { .. } => "task:released".to_string(),
            Event::TaskCompleted { .. } => "task:completed".to_string(),
            Event::TaskVerified { .. } => "task:verified".to_string(),
            Event::TaskRejected { .. } => "task:rejected".to_string(),
            Event::TaskSnoozed { .. } => "task:snoozed".to_string(),
            Event::DependencyAdded { .. } => "dependency:added".to_string(),
            Event::DependencyRemoved { .. } => "dependency:removed".to_string(),
            Event::OccurrenceScheduled { .. } => "occurrence:scheduled".to_string(),
            Event::OccurrenceRescheduled { .. } => "occurrence:rescheduled".to_string(),
            Event::OccurrenceDue { .. } => "occurrence:due".to_string(),
            Event::SeriesFinished { .. } => "series:finished".to_string(),
            Event::RotationAdvanced { .. } => "rotation:advanced".to_string(),
            Event::OutboxEnqueued { .. } => "outbox:enqueued".to_string(),
            Event::OutboxApplied { .. } => "outbox:applied".to_string(),
            Event::OutboxRejected { .. } => "outbox:rejected".to_string(),
            Event::OutboxFlushed { .. } => "outbox:flushed".to_string(),
        }
    }
}
