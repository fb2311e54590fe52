// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Automatic reschedule policy
//!
//! Runs after recomputation or an unblocking event. If the materialized
//! occurrence now lies in the past, the occurrence is advanced to the
//! next valid slot and the move is recorded for user-facing audit.
//! Never fires on blocked tasks, opted-out tasks, or one-offs; an
//! overdue one-off is information, not a scheduling error.

use crate::recurrence::{next_occurrence, NextOccurrence, RecurrenceRule, RuleError};
use crate::task::Task;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Why an occurrence was moved automatically
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShiftReason {
    /// The occurrence elapsed while the app was inactive
    PastDue,
    /// A dependency resolved after the occurrence time had passed
    UnblockedPast,
}

impl fmt::Display for ShiftReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ShiftReason::PastDue => write!(f, "past_due"),
            ShiftReason::UnblockedPast => write!(f, "unblocked_past"),
        }
    }
}

/// Audit record of one automatic move
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AutoShift {
    pub at: DateTime<Utc>,
    pub from: DateTime<Utc>,
    pub to: DateTime<Utc>,
    pub reason: ShiftReason,
}

/// Outcome of one policy evaluation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShiftOutcome {
    /// Occurrence moved forward; caller applies the shift to the task
    Shifted(AutoShift),
    /// Re-expansion found no further occurrences
    Finished,
    /// Nothing to do
    NoOp,
}

/// Evaluate the policy for one task at `now`.
///
/// The caller picks the reason from context: `PastDue` on plain
/// recomputation, `UnblockedPast` when a dependency just resolved.
pub fn maybe_shift(
    task: &Task,
    now: DateTime<Utc>,
    reason: ShiftReason,
) -> Result<ShiftOutcome, RuleError> {
    if task.auto_reschedule_disabled || task.is_blocked() || task.series_finished {
        return Ok(ShiftOutcome::NoOp);
    }
    let Some(current) = task.next_occurrence_at else {
        return Ok(ShiftOutcome::NoOp);
    };
    if current >= now {
        return Ok(ShiftOutcome::NoOp);
    }
    let Some(rule_text) = &task.rrule else {
        return Ok(ShiftOutcome::NoOp);
    };

    let rule = RecurrenceRule::parse(rule_text)?;
    match next_occurrence(&rule, task.series_anchor(), &task.exceptions(), now) {
        NextOccurrence::At(to) => Ok(ShiftOutcome::Shifted(AutoShift {
            at: now,
            from: current,
            to,
            reason,
        })),
        NextOccurrence::Paused => Ok(ShiftOutcome::NoOp),
        NextOccurrence::Finished => Ok(ShiftOutcome::Finished),
    }
}

#[cfg(test)]
#[path = "reschedule_tests.rs"]
mod tests;
