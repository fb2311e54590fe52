// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Tracker engine runtime
//!
//! One instance per signed-in household. Structural edits (create,
//! update, dependencies, snooze, approve, reject) mutate the local
//! aggregate directly; the four user intents (accept, release,
//! complete, comment) also mirror to the remote store, falling back to
//! the durable outbox when the network is down. A definitive remote
//! refusal rolls the optimistic local apply back and surfaces the
//! error.
//!
//! The engine runs cooperatively: nothing here spawns timers. The host
//! shell calls `tick()` at `EngineConfig::tick_interval` cadence and on
//! reconnect; everything else happens inside the operation that caused
//! it.

use crate::error::EngineError;
use crate::sync::{self, FlushReport};
use hearth_adapters::{NotifyAdapter, RemoteStore};
use hearth_core::clock::Clock;
use hearth_core::config::{EngineConfig, NotifyConfig};
use hearth_core::event::Event;
use hearth_core::events::{EventBus, EventPattern, EventReceiver, Subscription};
use hearth_core::household::{Household, HouseholdError};
use hearth_core::id::IdGen;
use hearth_core::outbox::{ActionKind, OutboxAction, OutboxQueue};
use hearth_core::rotation::FairnessEntry;
use hearth_core::task::{MemberId, Task, TaskDraft, TaskId, TaskPatch};
use hearth_storage::{MaterializedOutbox, OutboxJournal, OutboxOp};
use chrono::{DateTime, Utc};
use std::collections::HashMap;

/// The engine orchestrates the household aggregate, the outbox, and
/// the external adapters
pub struct TrackerEngine<R: RemoteStore, N: NotifyAdapter, C: Clock, I: IdGen> {
    config: EngineConfig,
    household: Household,
    queue: OutboxQueue,
    journal: OutboxJournal,
    remote: R,
    notify: N,
    clock: C,
    ids: I,
    bus: EventBus,
    notify_config: NotifyConfig,
    /// Occurrence instants already announced as due, per task
    due_announced: HashMap<TaskId, DateTime<Utc>>,
}

impl<R: RemoteStore, N: NotifyAdapter, C: Clock, I: IdGen> TrackerEngine<R, N, C, I> {
    /// Open the journal, replay it into the outbox queue, and wire the
    /// engine together
    pub fn new(
        config: EngineConfig,
        household: Household,
        remote: R,
        notify: N,
        clock: C,
        ids: I,
    ) -> Result<Self, EngineError> {
        let ops = OutboxJournal::replay(&config.journal_path)?;
        let queue = MaterializedOutbox::from_ops(ops).into_queue();
        let journal = OutboxJournal::open(&config.journal_path)?;

        Ok(Self {
            config,
            household,
            queue,
            journal,
            remote,
            notify,
            clock,
            ids,
            bus: EventBus::new(),
            notify_config: NotifyConfig::default_config(),
            due_announced: HashMap::new(),
        })
    }

    pub fn with_notify_config(mut self, notify_config: NotifyConfig) -> Self {
        self.notify_config = notify_config;
        self
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn household(&self) -> &Household {
        &self.household
    }

    pub fn task(&self, id: &TaskId) -> Option<&Task> {
        self.household.task(id)
    }

    /// Queue length shown as the pending-sync badge
    pub fn pending_sync_count(&self) -> usize {
        self.queue.pending_count()
    }

    /// Subscribe to engine events by name patterns
    pub fn subscribe(&self, name: &str, patterns: &[&str]) -> EventReceiver {
        let patterns = patterns.iter().map(|p| EventPattern::new(p)).collect();
        self.bus.subscribe(Subscription::new(name, patterns))
    }

    // ---- structural operations (local aggregate) ----

    pub async fn create_task(&mut self, draft: TaskDraft) -> Result<TaskId, EngineError> {
        let id = TaskId::from(self.ids.next());
        let now = self.clock.now();
        let events = self.household.create_task(id.clone(), draft, now)?;
        self.dispatch(events).await;
        Ok(id)
    }

    pub async fn update_task(&mut self, id: &TaskId, patch: TaskPatch) -> Result<(), EngineError> {
        let now = self.clock.now();
        let events = self.household.update_task(id, patch, now)?;
        self.dispatch(events).await;
        Ok(())
    }

    pub async fn remove_task(&mut self, id: &TaskId) -> Result<(), EngineError> {
        let now = self.clock.now();
        let events = self.household.remove_task(id, now)?;
        self.due_announced.remove(id);
        self.dispatch(events).await;
        Ok(())
    }

    pub async fn add_dependency(
        &mut self,
        id: &TaskId,
        blocker: &TaskId,
    ) -> Result<(), EngineError> {
        let now = self.clock.now();
        let events = self.household.add_dependency(id, blocker, now)?;
        self.dispatch(events).await;
        Ok(())
    }

    pub async fn remove_dependency(
        &mut self,
        id: &TaskId,
        blocker: &TaskId,
    ) -> Result<(), EngineError> {
        let now = self.clock.now();
        let events = self.household.remove_dependency(id, blocker, now)?;
        self.dispatch(events).await;
        Ok(())
    }

    pub async fn snooze_task(&mut self, id: &TaskId, minutes: i64) -> Result<(), EngineError> {
        let now = self.clock.now();
        let events = self.household.snooze(id, minutes, now)?;
        self.dispatch(events).await;
        Ok(())
    }

    pub async fn approve(&mut self, id: &TaskId) -> Result<(), EngineError> {
        let now = self.clock.now();
        let events = self.household.approve(id, now)?;
        self.dispatch(events).await;
        Ok(())
    }

    pub async fn reject(&mut self, id: &TaskId) -> Result<(), EngineError> {
        let now = self.clock.now();
        let events = self.household.reject(id, now)?;
        self.dispatch(events).await;
        Ok(())
    }

    pub fn fairness_report(&self, id: &TaskId) -> Result<Vec<FairnessEntry>, EngineError> {
        Ok(self.household.fairness_report(id)?)
    }

    // ---- user intents (local apply + remote mirror) ----

    pub async fn accept_task(&mut self, id: &TaskId, member: &MemberId) -> Result<(), EngineError> {
        let now = self.clock.now();
        let rollback = self.household.clone();
        let events = self.household.accept(id, member, now)?;
        self.dispatch(events).await;
        self.send_intent(ActionKind::Accept, id, member, serde_json::Value::Null, rollback)
            .await
    }

    pub async fn release_task(&mut self, id: &TaskId, member: &MemberId) -> Result<(), EngineError> {
        let now = self.clock.now();
        let rollback = self.household.clone();
        let events = self.household.release(id, member, now)?;
        self.dispatch(events).await;
        self.send_intent(ActionKind::Release, id, member, serde_json::Value::Null, rollback)
            .await
    }

    pub async fn complete_task(&mut self, id: &TaskId, member: &MemberId) -> Result<(), EngineError> {
        let now = self.clock.now();
        let rollback = self.household.clone();
        let events = self.household.complete(id, member, now)?;
        self.dispatch(events).await;
        self.send_intent(ActionKind::Complete, id, member, serde_json::Value::Null, rollback)
            .await
    }

    pub async fn comment(
        &mut self,
        id: &TaskId,
        member: &MemberId,
        text: &str,
    ) -> Result<(), EngineError> {
        if self.household.task(id).is_none() {
            return Err(HouseholdError::NotFound(id.clone()).into());
        }
        // Comments are owned by the task but live outside the engine;
        // only the remote intent matters here
        let rollback = self.household.clone();
        self.send_intent(
            ActionKind::Comment,
            id,
            member,
            serde_json::json!({ "text": text }),
            rollback,
        )
        .await
    }

    // ---- sync ----

    /// Replay pending outbox actions against the remote store
    pub async fn flush(&mut self) -> Result<FlushReport, EngineError> {
        let (report, events) = sync::flush(&mut self.queue, &mut self.journal, &self.remote).await?;
        self.dispatch(events).await;
        Ok(report)
    }

    /// Periodic tick: recompute every task, announce due occurrences,
    /// and flush the outbox
    pub async fn tick(&mut self) -> Result<FlushReport, EngineError> {
        let now = self.clock.now();
        let events = self.household.recompute_all(now);
        self.dispatch(events).await;

        let mut due_events = Vec::new();
        for (id, at) in self.household.due_tasks(now) {
            if self.due_announced.get(&id) != Some(&at) {
                self.due_announced.insert(id.clone(), at);
                due_events.push(Event::OccurrenceDue { id, at });
            }
        }
        self.dispatch(due_events).await;

        self.flush().await
    }

    /// Mirror a user intent to the remote store: straight through when
    /// online, durable outbox on transient failure, rollback on a
    /// definitive refusal
    async fn send_intent(
        &mut self,
        kind: ActionKind,
        id: &TaskId,
        member: &MemberId,
        payload: serde_json::Value,
        rollback: Household,
    ) -> Result<(), EngineError> {
        let action = OutboxAction::new(
            self.ids.next(),
            kind,
            self.household.id().clone(),
            id.clone(),
            member.clone(),
            self.clock.now(),
        )
        .with_payload(payload);

        match self.remote.apply(&action).await {
            Ok(()) => Ok(()),
            Err(err) if err.is_transient() => {
                tracing::debug!(action = %action.id, error = %err, "remote unreachable, queueing intent");
                self.journal.append(OutboxOp::Enqueued {
                    action: action.clone(),
                })?;
                let action_id = action.id.clone();
                self.queue.enqueue(action);
                self.dispatch(vec![Event::OutboxEnqueued {
                    action_id,
                    task_id: id.clone(),
                }])
                .await;
                Ok(())
            }
            Err(err) => {
                tracing::warn!(action = %action.id, error = %err, "remote refused intent, rolling back");
                self.household = rollback;
                self.dispatch(vec![Event::TaskUpdated { id: id.clone() }]).await;
                Err(err.into())
            }
        }
    }

    async fn dispatch(&self, events: Vec<Event>) {
        for event in events {
            tracing::debug!(event = %event.name(), "dispatch");
            self.bus.publish(&event);
            if let Some(notification) = self.notify_config.to_notification(&event) {
                if let Err(err) = self.notify.send(&notification).await {
                    tracing::warn!(error = %err, "notification delivery failed");
                }
            }
        }
    }
}
