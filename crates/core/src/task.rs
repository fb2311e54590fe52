// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Task record and status lifecycle
//!
//! A task is the central entity of a household: one-off or recurring,
//! possibly blocked behind other tasks, possibly assigned by rotation.
//! The record here is the boundary contract with the UI and the remote
//! document store; the scheduling components operate on it.

use crate::reschedule::AutoShift;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

/// Unique identifier for a task
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TaskId(pub String);

impl TaskId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for TaskId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for TaskId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Tenant scope: every task belongs to exactly one household
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct HouseholdId(pub String);

impl fmt::Display for HouseholdId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for HouseholdId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for HouseholdId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// A household member (or child) eligible to claim and complete tasks
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct MemberId(pub String);

impl fmt::Display for MemberId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for MemberId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for MemberId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Task lifecycle status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    /// Actionable, nobody has claimed the current occurrence
    Open,
    /// At least one member has claimed the current occurrence
    InProgress,
    /// At least one dependency has not reached a terminal status
    Blocked,
    /// Work reported finished; terminal unless approval is required
    Done,
    /// Approver confirmed the completion
    Verified,
}

impl TaskStatus {
    /// Terminal statuses no longer block dependents
    pub fn is_terminal(&self) -> bool {
        matches!(self, TaskStatus::Done | TaskStatus::Verified)
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TaskStatus::Open => write!(f, "open"),
            TaskStatus::InProgress => write!(f, "in_progress"),
            TaskStatus::Blocked => write!(f, "blocked"),
            TaskStatus::Done => write!(f, "done"),
            TaskStatus::Verified => write!(f, "verified"),
        }
    }
}

impl std::str::FromStr for TaskStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "open" => Ok(TaskStatus::Open),
            "in_progress" => Ok(TaskStatus::InProgress),
            "blocked" => Ok(TaskStatus::Blocked),
            "done" => Ok(TaskStatus::Done),
            "verified" => Ok(TaskStatus::Verified),
            _ => Err(format!("unknown task status: {}", s)),
        }
    }
}

/// A household task, one-off or recurring
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    pub id: TaskId,
    pub household_id: HouseholdId,
    pub title: String,
    #[serde(default)]
    pub notes: Option<String>,
    pub status: TaskStatus,

    /// Recurrence rule text (iCalendar RRULE grammar); absent for one-offs.
    /// Exceptions never mutate this string.
    #[serde(default)]
    pub rrule: Option<String>,
    /// Calendar dates excluded from the recurrence
    #[serde(default)]
    pub skip_dates: BTreeSet<NaiveDate>,
    /// Per-instance time-of-day shifts in minutes, keyed by the
    /// originally-scheduled date
    #[serde(default)]
    pub exception_shifts: BTreeMap<NaiveDate, i64>,
    /// While in the future, no new occurrence is computed
    #[serde(default)]
    pub paused_until: Option<DateTime<Utc>>,

    /// The currently materialized occurrence
    #[serde(default)]
    pub next_occurrence_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub due_at: Option<DateTime<Utc>>,
    /// Series start; carries the time-of-day for recurring tasks
    #[serde(default)]
    pub start_at: Option<DateTime<Utc>>,
    /// Lead time the UI surfaces before an occurrence
    #[serde(default)]
    pub prep_window_hours: u32,

    /// Tasks that must reach done/verified before this one may leave blocked
    #[serde(default)]
    pub depends_on: BTreeSet<TaskId>,

    /// Ordered candidates for sequential assignment
    #[serde(default)]
    pub rotation_pool: Vec<MemberId>,
    /// Index into the (virtual, weight-expanded) rotation sequence
    #[serde(default)]
    pub rotation_index: Option<usize>,
    /// Per-candidate integer weight biasing selection frequency
    #[serde(default)]
    pub rotation_weights: BTreeMap<MemberId, u32>,

    /// Members who have claimed the current occurrence
    #[serde(default)]
    pub accepted_by: BTreeSet<MemberId>,
    /// Member who reported the current occurrence done
    #[serde(default)]
    pub completed_by: Option<MemberId>,
    /// Completions per member, for the fairness report
    #[serde(default)]
    pub completion_counts: BTreeMap<MemberId, u64>,

    #[serde(default)]
    pub approval_required: bool,
    #[serde(default)]
    pub auto_reschedule_disabled: bool,
    /// Audit of the most recent automatic move, shown to the user
    #[serde(default)]
    pub last_auto_shift: Option<AutoShift>,

    /// Bounded rule exhausted; no further auto-recompute
    #[serde(default)]
    pub series_finished: bool,
    /// Instant the previous occurrence was finalized; base for renewal
    #[serde(default)]
    pub last_completed_at: Option<DateTime<Utc>>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Task {
    /// Create a task from its draft; scheduling fields are filled in by
    /// the household pipeline afterwards
    pub fn new(id: TaskId, household_id: HouseholdId, draft: TaskDraft, now: DateTime<Utc>) -> Self {
        let rotation_index = if draft.rotation_pool.is_empty() {
            None
        } else {
            Some(0)
        };
        Self {
            id,
            household_id,
            title: draft.title,
            notes: draft.notes,
            status: TaskStatus::Open,
            rrule: draft.rrule,
            skip_dates: BTreeSet::new(),
            exception_shifts: BTreeMap::new(),
            paused_until: None,
            next_occurrence_at: None,
            due_at: draft.due_at,
            start_at: draft.start_at,
            prep_window_hours: draft.prep_window_hours,
            depends_on: draft.depends_on,
            rotation_pool: draft.rotation_pool,
            rotation_index,
            rotation_weights: draft.rotation_weights,
            accepted_by: BTreeSet::new(),
            completed_by: None,
            completion_counts: BTreeMap::new(),
            approval_required: draft.approval_required,
            auto_reschedule_disabled: draft.auto_reschedule_disabled,
            last_auto_shift: None,
            series_finished: false,
            last_completed_at: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Apply a partial update; the caller validates first
    pub fn apply_patch(&mut self, patch: TaskPatch) {
        if let Some(title) = patch.title {
            self.title = title;
        }
        if let Some(notes) = patch.notes {
            self.notes = notes;
        }
        if let Some(rrule) = patch.rrule {
            self.rrule = rrule;
        }
        if let Some(skip_dates) = patch.skip_dates {
            self.skip_dates = skip_dates;
        }
        if let Some(shifts) = patch.exception_shifts {
            self.exception_shifts = shifts;
        }
        if let Some(paused_until) = patch.paused_until {
            self.paused_until = paused_until;
        }
        if let Some(due_at) = patch.due_at {
            self.due_at = due_at;
        }
        if let Some(start_at) = patch.start_at {
            self.start_at = start_at;
        }
        if let Some(hours) = patch.prep_window_hours {
            self.prep_window_hours = hours;
        }
        if let Some(pool) = patch.rotation_pool {
            self.rotation_pool = pool;
        }
        if let Some(weights) = patch.rotation_weights {
            self.rotation_weights = weights;
        }
        if let Some(approval) = patch.approval_required {
            self.approval_required = approval;
        }
        if let Some(disabled) = patch.auto_reschedule_disabled {
            self.auto_reschedule_disabled = disabled;
        }
    }

    /// Whether a recurrence rule is attached
    pub fn is_recurring(&self) -> bool {
        self.rrule.is_some()
    }

    /// Whether the current occurrence has reached a terminal status
    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }

    pub fn is_blocked(&self) -> bool {
        self.status == TaskStatus::Blocked
    }

    /// The instant the recurrence expands from; carries the time-of-day
    pub fn series_anchor(&self) -> DateTime<Utc> {
        self.start_at.or(self.due_at).unwrap_or(self.created_at)
    }

    /// Exceptions view handed to the recurrence engine
    pub fn exceptions(&self) -> crate::recurrence::ExceptionSet {
        crate::recurrence::ExceptionSet {
            skip_dates: self.skip_dates.clone(),
            shifts: self.exception_shifts.clone(),
            paused_until: self.paused_until,
        }
    }
}

/// Fields supplied when creating a task
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TaskDraft {
    pub title: String,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub rrule: Option<String>,
    #[serde(default)]
    pub due_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub start_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub prep_window_hours: u32,
    #[serde(default)]
    pub depends_on: BTreeSet<TaskId>,
    #[serde(default)]
    pub rotation_pool: Vec<MemberId>,
    #[serde(default)]
    pub rotation_weights: BTreeMap<MemberId, u32>,
    #[serde(default)]
    pub approval_required: bool,
    #[serde(default)]
    pub auto_reschedule_disabled: bool,
}

impl TaskDraft {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Self::default()
        }
    }

    pub fn with_rrule(mut self, rrule: impl Into<String>) -> Self {
        self.rrule = Some(rrule.into());
        self
    }

    pub fn with_due(mut self, due_at: DateTime<Utc>) -> Self {
        self.due_at = Some(due_at);
        self
    }

    pub fn with_start(mut self, start_at: DateTime<Utc>) -> Self {
        self.start_at = Some(start_at);
        self
    }

    pub fn with_dependencies(mut self, ids: impl IntoIterator<Item = TaskId>) -> Self {
        self.depends_on = ids.into_iter().collect();
        self
    }

    pub fn with_rotation(mut self, pool: Vec<MemberId>) -> Self {
        self.rotation_pool = pool;
        self
    }

    pub fn with_weights(mut self, weights: BTreeMap<MemberId, u32>) -> Self {
        self.rotation_weights = weights;
        self
    }

    pub fn with_approval(mut self) -> Self {
        self.approval_required = true;
        self
    }
}

/// Partial update to a task; `None` leaves a field untouched.
/// Nullable fields use a nested `Option` so "clear" is expressible.
#[derive(Debug, Clone, Default)]
pub struct TaskPatch {
    pub title: Option<String>,
    pub notes: Option<Option<String>>,
    pub rrule: Option<Option<String>>,
    pub skip_dates: Option<BTreeSet<NaiveDate>>,
    pub exception_shifts: Option<BTreeMap<NaiveDate, i64>>,
    pub paused_until: Option<Option<DateTime<Utc>>>,
    pub due_at: Option<Option<DateTime<Utc>>>,
    pub start_at: Option<Option<DateTime<Utc>>>,
    pub prep_window_hours: Option<u32>,
    pub rotation_pool: Option<Vec<MemberId>>,
    pub rotation_weights: Option<BTreeMap<MemberId, u32>>,
    pub approval_required: Option<bool>,
    pub auto_reschedule_disabled: Option<bool>,
}

impl TaskPatch {
    /// Whether applying this patch requires re-running the scheduling pipeline
    pub fn touches_schedule(&self) -> bool {
        self.rrule.is_some()
            || self.skip_dates.is_some()
            || self.exception_shifts.is_some()
            || self.paused_until.is_some()
            || self.due_at.is_some()
            || self.start_at.is_some()
            || self.auto_reschedule_disabled.is_some()
    }

    /// Whether the rotation pool or weights change
    pub fn touches_rotation(&self) -> bool {
        self.rotation_pool.is_some() || self.rotation_weights.is_some()
    }
}

#[cfg(test)]
#[path = "task_tests.rs"]
mod tests;
