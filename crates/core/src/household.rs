// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Household aggregate
//!
//! The arena of one household's task records plus their dependency
//! graph, passed explicitly into every engine call. Each operation
//! applies a mutation, re-runs the scheduling pipeline (recurrence ->
//! blocked status -> auto-reschedule) where needed, and returns the
//! events describing what changed.
//!
//! The aggregate is the computation, not the lock holder: the remote
//! store serializes writes per task id.

use crate::event::Event;
use crate::graph::{CycleError, DependencyGraph, StatusSource};
use crate::recurrence::{next_occurrence, ExceptionSet, NextOccurrence, RecurrenceRule, RuleError};
use crate::reschedule::{maybe_shift, ShiftOutcome, ShiftReason};
use crate::rotation::{self, FairnessEntry, RotationError};
use crate::task::{HouseholdId, MemberId, Task, TaskDraft, TaskId, TaskPatch, TaskStatus};
use chrono::{DateTime, Duration, Utc};
use std::collections::BTreeMap;
use thiserror::Error;

/// Errors surfaced to callers of household operations
#[derive(Debug, Error)]
pub enum HouseholdError {
    #[error(transparent)]
    Cycle(#[from] CycleError),
    #[error("task not found: {0}")]
    NotFound(TaskId),
    #[error("invalid recurrence rule: {0}")]
    Rule(#[from] RuleError),
    #[error(transparent)]
    Rotation(#[from] RotationError),
    #[error("task {id} is not actionable while {status}")]
    NotActionable { id: TaskId, status: TaskStatus },
    #[error("task {0} is not awaiting approval")]
    NotAwaitingApproval(TaskId),
    #[error("task {0} has no scheduled occurrence")]
    NothingScheduled(TaskId),
}

/// One household's tasks and their dependency edges
#[derive(Debug, Clone)]
pub struct Household {
    id: HouseholdId,
    tasks: BTreeMap<TaskId, Task>,
    graph: DependencyGraph,
}

fn status_source(tasks: &BTreeMap<TaskId, Task>) -> impl StatusSource + '_ {
    |id: &TaskId| tasks.get(id).map(|t| t.status)
}

impl Household {
    pub fn new(id: HouseholdId) -> Self {
        Self {
            id,
            tasks: BTreeMap::new(),
            graph: DependencyGraph::new(),
        }
    }

    pub fn id(&self) -> &HouseholdId {
        &self.id
    }

    pub fn task(&self, id: &TaskId) -> Option<&Task> {
        self.tasks.get(id)
    }

    pub fn tasks(&self) -> impl Iterator<Item = &Task> {
        self.tasks.values()
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    fn get(&self, id: &TaskId) -> Result<&Task, HouseholdError> {
        self.tasks
            .get(id)
            .ok_or_else(|| HouseholdError::NotFound(id.clone()))
    }

    fn get_mut(&mut self, id: &TaskId) -> Result<&mut Task, HouseholdError> {
        self.tasks
            .get_mut(id)
            .ok_or_else(|| HouseholdError::NotFound(id.clone()))
    }

    /// Insert a new task and run the scheduling pipeline on it
    pub fn create_task(
        &mut self,
        id: TaskId,
        draft: TaskDraft,
        now: DateTime<Utc>,
    ) -> Result<Vec<Event>, HouseholdError> {
        if let Some(rule) = &draft.rrule {
            RecurrenceRule::parse(rule)?;
        }
        rotation::validate_weights(&draft.rotation_weights)?;
        for dep in &draft.depends_on {
            if !self.tasks.contains_key(dep) {
                return Err(HouseholdError::NotFound(dep.clone()));
            }
        }

        let depends_on: Vec<TaskId> = draft.depends_on.iter().cloned().collect();
        let task = Task::new(id.clone(), self.id.clone(), draft, now);
        self.tasks.insert(id.clone(), task);

        for dep in &depends_on {
            // A brand-new task cannot be depended upon yet, so this
            // only rejects self-references; still, unwind on failure.
            let add_result = self.graph.add_edge(&id, dep, &status_source(&self.tasks));
            if let Err(err) = add_result {
                for added in &depends_on {
                    self.graph.remove_edge(&id, added);
                }
                self.tasks.remove(&id);
                return Err(err.into());
            }
        }

        let mut events = vec![Event::TaskCreated { id: id.clone() }];
        events.extend(self.recompute(&id, now)?);
        Ok(events)
    }

    /// Apply a partial update; scheduling fields re-run the pipeline
    pub fn update_task(
        &mut self,
        id: &TaskId,
        patch: TaskPatch,
        now: DateTime<Utc>,
    ) -> Result<Vec<Event>, HouseholdError> {
        if let Some(Some(rule)) = &patch.rrule {
            RecurrenceRule::parse(rule)?;
        }
        if let Some(weights) = &patch.rotation_weights {
            rotation::validate_weights(weights)?;
        }
        self.get(id)?;

        let touches_schedule = patch.touches_schedule();
        let touches_rotation = patch.touches_rotation();
        let rule_changed = patch.rrule.is_some();

        let task = self.get_mut(id)?;
        task.apply_patch(patch);
        if rule_changed {
            // A replaced rule starts a fresh series
            task.series_finished = false;
            task.last_auto_shift = None;
        }
        if touches_rotation {
            task.rotation_index = match task.rotation_index {
                Some(index) => {
                    rotation::clamp_index(&task.rotation_pool, &task.rotation_weights, index)
                }
                None if !task.rotation_pool.is_empty() => Some(0),
                None => None,
            };
        }
        task.updated_at = now;

        let mut events = vec![Event::TaskUpdated { id: id.clone() }];
        if touches_schedule {
            events.extend(self.recompute(id, now)?);
        }
        Ok(events)
    }

    /// Remove a task; edges to and from it dissolve and dependents are
    /// re-evaluated
    pub fn remove_task(
        &mut self,
        id: &TaskId,
        now: DateTime<Utc>,
    ) -> Result<Vec<Event>, HouseholdError> {
        self.get(id)?;
        let dependents = self.graph.dependents_of(id);
        self.graph.remove_task(id);
        self.tasks.remove(id);
        for task in self.tasks.values_mut() {
            task.depends_on.remove(id);
        }

        let mut events = vec![Event::TaskRemoved { id: id.clone() }];
        events.extend(self.recompute_dependents(&dependents, now));
        Ok(events)
    }

    /// Claim the current occurrence; claims are a set, so concurrent
    /// accepts commute
    pub fn accept(
        &mut self,
        id: &TaskId,
        member: &MemberId,
        now: DateTime<Utc>,
    ) -> Result<Vec<Event>, HouseholdError> {
        let task = self.get_mut(id)?;
        match task.status {
            TaskStatus::Blocked | TaskStatus::Done | TaskStatus::Verified => {
                Err(HouseholdError::NotActionable {
                    id: id.clone(),
                    status: task.status,
                })
            }
            TaskStatus::Open | TaskStatus::InProgress => {
                task.accepted_by.insert(member.clone());
                task.status = TaskStatus::InProgress;
                task.updated_at = now;
                Ok(vec![Event::TaskAccepted {
                    id: id.clone(),
                    member: member.clone(),
                }])
            }
        }
    }

    /// Drop a claim; the occurrence reopens when the last claim goes
    pub fn release(
        &mut self,
        id: &TaskId,
        member: &MemberId,
        now: DateTime<Utc>,
    ) -> Result<Vec<Event>, HouseholdError> {
        let task = self.get_mut(id)?;
        if task.is_terminal() {
            return Err(HouseholdError::NotActionable {
                id: id.clone(),
                status: task.status,
            });
        }
        if !task.accepted_by.remove(member) {
            // Releasing a claim that is not held is a no-op so replays
            // are harmless
            return Ok(vec![]);
        }
        if task.accepted_by.is_empty() && task.status == TaskStatus::InProgress {
            task.status = TaskStatus::Open;
        }
        task.updated_at = now;
        Ok(vec![Event::TaskReleased {
            id: id.clone(),
            member: member.clone(),
        }])
    }

    /// Report the current occurrence done. Without an approval
    /// requirement the occurrence finalizes immediately (tally, rotation
    /// advance, renewal for recurring tasks); otherwise it waits for
    /// `approve`/`reject`.
    pub fn complete(
        &mut self,
        id: &TaskId,
        member: &MemberId,
        now: DateTime<Utc>,
    ) -> Result<Vec<Event>, HouseholdError> {
        let task = self.get_mut(id)?;
        match task.status {
            TaskStatus::Blocked => {
                return Err(HouseholdError::NotActionable {
                    id: id.clone(),
                    status: task.status,
                });
            }
            // Replayed completion: already terminal, nothing to do
            TaskStatus::Done | TaskStatus::Verified => return Ok(vec![]),
            TaskStatus::Open | TaskStatus::InProgress => {}
        }

        let approval_required = task.approval_required;
        task.status = TaskStatus::Done;
        task.completed_by = Some(member.clone());
        task.updated_at = now;

        let mut events = vec![Event::TaskCompleted {
            id: id.clone(),
            member: member.clone(),
        }];

        // Dependents unblock the moment the blocker reaches done, before
        // any renewal reopens it
        let dependents = self.graph.dependents_of(id);
        events.extend(self.recompute_dependents(&dependents, now));

        if !approval_required {
            events.extend(self.finalize_occurrence(id, now)?);
        }
        Ok(events)
    }

    /// Approver confirms a completion awaiting approval
    pub fn approve(&mut self, id: &TaskId, now: DateTime<Utc>) -> Result<Vec<Event>, HouseholdError> {
        let task = self.get_mut(id)?;
        if task.status != TaskStatus::Done || !task.approval_required {
            return Err(HouseholdError::NotAwaitingApproval(id.clone()));
        }
        task.status = TaskStatus::Verified;
        task.updated_at = now;

        let mut events = vec![Event::TaskVerified { id: id.clone() }];
        events.extend(self.finalize_occurrence(id, now)?);
        Ok(events)
    }

    /// Approver sends a completion back; the same occurrence reopens
    /// and no rotation turn is consumed
    pub fn reject(&mut self, id: &TaskId, now: DateTime<Utc>) -> Result<Vec<Event>, HouseholdError> {
        let task = self.get_mut(id)?;
        if task.status != TaskStatus::Done || !task.approval_required {
            return Err(HouseholdError::NotAwaitingApproval(id.clone()));
        }
        task.completed_by = None;
        task.status = if task.accepted_by.is_empty() {
            TaskStatus::Open
        } else {
            TaskStatus::InProgress
        };
        task.updated_at = now;

        let mut events = vec![Event::TaskRejected { id: id.clone() }];
        // Dependents that unblocked on `done` re-block against the
        // reopened task
        let dependents = self.graph.dependents_of(id);
        events.extend(self.recompute_dependents(&dependents, now));
        Ok(events)
    }

    /// Add a blocking edge; rejected when it would create a cycle
    pub fn add_dependency(
        &mut self,
        id: &TaskId,
        blocker: &TaskId,
        now: DateTime<Utc>,
    ) -> Result<Vec<Event>, HouseholdError> {
        self.get(id)?;
        self.get(blocker)?;
        if self.get(id)?.depends_on.contains(blocker) {
            return Ok(vec![]);
        }

        self.graph
            .add_edge(id, blocker, &status_source(&self.tasks))?;
        self.get_mut(id)?.depends_on.insert(blocker.clone());

        let mut events = vec![Event::DependencyAdded {
            id: id.clone(),
            blocker: blocker.clone(),
        }];
        events.extend(self.recompute(id, now)?);
        Ok(events)
    }

    /// Remove a blocking edge; always succeeds and may unblock
    pub fn remove_dependency(
        &mut self,
        id: &TaskId,
        blocker: &TaskId,
        now: DateTime<Utc>,
    ) -> Result<Vec<Event>, HouseholdError> {
        self.get(id)?;
        if !self.get(id)?.depends_on.contains(blocker) {
            return Ok(vec![]);
        }
        self.graph.remove_edge(id, blocker);
        self.get_mut(id)?.depends_on.remove(blocker);

        let mut events = vec![Event::DependencyRemoved {
            id: id.clone(),
            blocker: blocker.clone(),
        }];
        events.extend(self.recompute_with_reason(id, now, ShiftReason::UnblockedPast)?);
        Ok(events)
    }

    /// Push the current occurrence by whole minutes without touching the
    /// rule: recurring tasks get an exception entry keyed by the
    /// occurrence's original date, one-offs move their due time
    pub fn snooze(
        &mut self,
        id: &TaskId,
        minutes: i64,
        now: DateTime<Utc>,
    ) -> Result<Vec<Event>, HouseholdError> {
        let task = self.get(id)?;
        let Some(current) = task.next_occurrence_at else {
            return Err(HouseholdError::NothingScheduled(id.clone()));
        };

        let mut events = Vec::new();
        if let Some(rule_text) = task.rrule.clone() {
            let rule = RecurrenceRule::parse(&rule_text)?;
            // Resolve the unshifted date of the current occurrence so a
            // second snooze stacks onto the same exception entry
            let bare = ExceptionSet {
                skip_dates: task.skip_dates.clone(),
                shifts: BTreeMap::new(),
                paused_until: None,
            };
            let base = recurrence_base(task);
            let date = match next_occurrence(&rule, task.series_anchor(), &bare, base) {
                NextOccurrence::At(raw) => raw.date_naive(),
                _ => current.date_naive(),
            };

            let task = self.get_mut(id)?;
            *task.exception_shifts.entry(date).or_insert(0) += minutes;
            task.updated_at = now;
            events.push(Event::TaskSnoozed {
                id: id.clone(),
                minutes,
            });
            events.extend(self.recompute(id, now)?);
        } else {
            let task = self.get_mut(id)?;
            let moved = current + Duration::minutes(minutes);
            task.due_at = Some(moved);
            task.next_occurrence_at = Some(moved);
            task.updated_at = now;
            events.push(Event::TaskSnoozed {
                id: id.clone(),
                minutes,
            });
            events.push(Event::OccurrenceScheduled {
                id: id.clone(),
                at: moved,
            });
        }
        Ok(events)
    }

    /// Fairness report for one task's rotation pool
    pub fn fairness_report(&self, id: &TaskId) -> Result<Vec<FairnessEntry>, HouseholdError> {
        let task = self.get(id)?;
        Ok(rotation::fairness_report(
            &task.rotation_pool,
            &task.rotation_weights,
            &task.completion_counts,
        ))
    }

    /// The member the rotation currently points at
    pub fn current_assignee(&self, id: &TaskId) -> Result<Option<MemberId>, HouseholdError> {
        let task = self.get(id)?;
        Ok(task.rotation_index.and_then(|index| {
            rotation::assignee(&task.rotation_pool, &task.rotation_weights, index).cloned()
        }))
    }

    /// Run the scheduling pipeline for one task
    pub fn recompute(
        &mut self,
        id: &TaskId,
        now: DateTime<Utc>,
    ) -> Result<Vec<Event>, HouseholdError> {
        self.recompute_with_reason(id, now, ShiftReason::PastDue)
    }

    /// Run the pipeline for every task; errors are logged and skipped
    /// so one bad record cannot stall the household
    pub fn recompute_all(&mut self, now: DateTime<Utc>) -> Vec<Event> {
        let ids: Vec<TaskId> = self.tasks.keys().cloned().collect();
        let mut events = Vec::new();
        for id in ids {
            match self.recompute(&id, now) {
                Ok(batch) => events.extend(batch),
                Err(err) => {
                    tracing::warn!(task = %id, error = %err, "recompute failed");
                }
            }
        }
        events
    }

    /// Tasks whose occurrence is inside their prep window (or overdue)
    /// and still actionable
    pub fn due_tasks(&self, now: DateTime<Utc>) -> Vec<(TaskId, DateTime<Utc>)> {
        self.tasks
            .values()
            .filter(|task| {
                matches!(task.status, TaskStatus::Open | TaskStatus::InProgress)
            })
            .filter_map(|task| {
                let at = task.next_occurrence_at?;
                let window = Duration::hours(i64::from(task.prep_window_hours));
                (at - window <= now).then(|| (task.id.clone(), at))
            })
            .collect()
    }

    fn recompute_with_reason(
        &mut self,
        id: &TaskId,
        now: DateTime<Utc>,
        reason: ShiftReason,
    ) -> Result<Vec<Event>, HouseholdError> {
        let mut events = Vec::new();
        let mut reason = reason;

        // 1. Recurrence: materialize the next occurrence
        let task = self.get(id)?;
        if !task.is_terminal() {
            if let Some(rule_text) = task.rrule.clone() {
                if !task.series_finished {
                    let rule = RecurrenceRule::parse(&rule_text)?;
                    let base = recurrence_base(task);
                    // The pause is judged against now, not the historical
                    // expansion base, or a lapsed pause would never lift
                    let mut exceptions = task.exceptions();
                    let still_paused = exceptions.paused_until.is_some_and(|p| p > now);
                    exceptions.paused_until = None;
                    let computed = if still_paused {
                        NextOccurrence::Paused
                    } else {
                        next_occurrence(&rule, task.series_anchor(), &exceptions, base)
                    };

                    let task = self.get_mut(id)?;
                    match computed {
                        NextOccurrence::At(at) => {
                            if task.next_occurrence_at != Some(at) {
                                task.next_occurrence_at = Some(at);
                                task.due_at = Some(at);
                                events.push(Event::OccurrenceScheduled {
                                    id: id.clone(),
                                    at,
                                });
                            }
                        }
                        NextOccurrence::Paused => {
                            // Series pause: nothing new is computed
                        }
                        NextOccurrence::Finished => {
                            task.series_finished = true;
                            task.next_occurrence_at = None;
                            events.push(Event::SeriesFinished { id: id.clone() });
                        }
                    }
                }
            } else if task.next_occurrence_at != task.due_at {
                // One-off: the materialized occurrence mirrors the due time
                let due = task.due_at;
                let task = self.get_mut(id)?;
                task.next_occurrence_at = due;
                if let Some(at) = due {
                    events.push(Event::OccurrenceScheduled { id: id.clone(), at });
                }
            }
        }

        // 2. Blocked status derived from the dependency graph
        let blocked = {
            let source = status_source(&self.tasks);
            self.graph.blocked_status(id, &source)
        };
        let task = self.get_mut(id)?;
        if !task.is_terminal() {
            if blocked.blocked && task.status != TaskStatus::Blocked {
                task.status = TaskStatus::Blocked;
                events.push(Event::TaskBlocked {
                    id: id.clone(),
                    blockers: blocked.unresolved_blockers,
                });
            } else if !blocked.blocked && task.status == TaskStatus::Blocked {
                task.status = if task.accepted_by.is_empty() {
                    TaskStatus::Open
                } else {
                    TaskStatus::InProgress
                };
                events.push(Event::TaskUnblocked { id: id.clone() });
                // A task freed after its slot passed moves with the
                // unblock reason, not plain lateness
                reason = ShiftReason::UnblockedPast;
            }
        }

        // 3. Auto-reschedule elapsed occurrences
        let task = self.get(id)?;
        match maybe_shift(task, now, reason)? {
            ShiftOutcome::Shifted(shift) => {
                let task = self.get_mut(id)?;
                task.next_occurrence_at = Some(shift.to);
                task.due_at = Some(shift.to);
                task.last_auto_shift = Some(shift);
                events.push(Event::OccurrenceRescheduled {
                    id: id.clone(),
                    from: shift.from,
                    to: shift.to,
                    reason: shift.reason,
                });
            }
            ShiftOutcome::Finished => {
                let task = self.get_mut(id)?;
                task.series_finished = true;
                task.next_occurrence_at = None;
                events.push(Event::SeriesFinished { id: id.clone() });
            }
            ShiftOutcome::NoOp => {}
        }

        Ok(events)
    }

    /// Terminal point of an occurrence: tally the completion, advance
    /// the rotation exactly once, and renew recurring tasks
    fn finalize_occurrence(
        &mut self,
        id: &TaskId,
        now: DateTime<Utc>,
    ) -> Result<Vec<Event>, HouseholdError> {
        let mut events = Vec::new();

        let task = self.get_mut(id)?;
        let terminal_status = task.status;
        if let Some(member) = task.completed_by.take() {
            *task.completion_counts.entry(member).or_default() += 1;
        }
        task.last_completed_at = Some(now);
        task.updated_at = now;

        if task.is_recurring() && !task.series_finished {
            // Renewal: the next occurrence opens with a fresh claim set
            // and the next assignee. The finished occurrence is gone; a
            // paused series leaves nothing materialized until it lapses.
            task.next_occurrence_at = None;
            task.accepted_by.clear();
            if let Some(current) = task.rotation_index {
                if let Some(next) =
                    rotation::advance(&task.rotation_pool, &task.rotation_weights, current)
                {
                    task.rotation_index = Some(next);
                    let assignee =
                        rotation::assignee(&task.rotation_pool, &task.rotation_weights, next)
                            .cloned();
                    events.push(Event::RotationAdvanced {
                        id: id.clone(),
                        assignee,
                    });
                }
            }
            task.status = TaskStatus::Open;
            events.extend(self.recompute(id, now)?);

            // A bounded series can exhaust exactly at renewal; the task
            // then rests in its terminal state
            let task = self.get_mut(id)?;
            if task.series_finished && task.next_occurrence_at.is_none() {
                task.status = terminal_status;
            }
        }
        Ok(events)
    }

    fn recompute_dependents(&mut self, dependents: &[TaskId], now: DateTime<Utc>) -> Vec<Event> {
        let mut events = Vec::new();
        for dependent in dependents {
            match self.recompute_with_reason(dependent, now, ShiftReason::UnblockedPast) {
                Ok(batch) => events.extend(batch),
                Err(err) => {
                    tracing::warn!(task = %dependent, error = %err, "dependent recompute failed");
                }
            }
        }
        events
    }

    /// Assert the structural invariants the aggregate maintains after
    /// every mutation; test support
    pub fn verify_invariants(&self, now: DateTime<Utc>) -> Result<(), String> {
        if !self.graph.is_acyclic(&status_source(&self.tasks)) {
            return Err("dependency graph contains a cycle".to_string());
        }
        for task in self.tasks.values() {
            let blocked = self
                .graph
                .blocked_status(&task.id, &status_source(&self.tasks));

            if !task.is_terminal() {
                let should_block = blocked.blocked;
                let is_blocked = task.status == TaskStatus::Blocked;
                if should_block != is_blocked {
                    return Err(format!(
                        "task {}: status {} but {} unresolved blockers",
                        task.id,
                        task.status,
                        blocked.unresolved_blockers.len()
                    ));
                }
            }

            let len = rotation::rotation_len(&task.rotation_pool, &task.rotation_weights);
            match task.rotation_index {
                Some(index) if len == 0 => {
                    return Err(format!("task {}: rotation index {} with empty pool", task.id, index));
                }
                Some(index) if index >= len => {
                    return Err(format!(
                        "task {}: rotation index {} out of range {}",
                        task.id, index, len
                    ));
                }
                _ => {}
            }

            if let Some(at) = task.next_occurrence_at {
                if task.skip_dates.contains(&at.date_naive()) {
                    return Err(format!("task {}: occurrence on a skipped date", task.id));
                }
                let paused = task
                    .paused_until
                    .map(|until| until > now)
                    .unwrap_or(false);
                if task.is_recurring()
                    && at < now
                    && !paused
                    && !task.auto_reschedule_disabled
                    && !task.is_blocked()
                    && !task.is_terminal()
                {
                    return Err(format!("task {}: occurrence in the past", task.id));
                }
            }
        }
        Ok(())
    }
}

/// The instant rule expansion resumes from. The anchor itself must stay
/// eligible as the first occurrence, and an auto-shifted occurrence must
/// not fall back to the slot it was moved off of.
fn recurrence_base(task: &Task) -> DateTime<Utc> {
    let mut base = task
        .last_completed_at
        .unwrap_or_else(|| task.series_anchor() - Duration::seconds(1));
    if let Some(shift) = &task.last_auto_shift {
        if shift.at > base {
            base = shift.at;
        }
    }
    base
}

#[cfg(test)]
#[path = "household_tests.rs"]
mod tests;
