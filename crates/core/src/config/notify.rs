// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Notification configuration
//!
//! Maps engine events to notifications based on pattern matching rules.
//! Delivery itself is an adapter concern; this decides what is worth
//! telling the household about.

use crate::event::Event;
use crate::events::EventPattern;

/// How prominently a notification should be delivered
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotifyUrgency {
    Low,
    Normal,
    Important,
}

/// A notification ready for an adapter to deliver
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub title: String,
    pub body: String,
    pub urgency: NotifyUrgency,
}

impl Notification {
    pub fn new(title: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            body: body.into(),
            urgency: NotifyUrgency::Normal,
        }
    }

    pub fn with_urgency(mut self, urgency: NotifyUrgency) -> Self {
        self.urgency = urgency;
        self
    }
}

/// A rule mapping an event pattern to a notification urgency
#[derive(Debug, Clone)]
pub struct NotifyRule {
    pub pattern: EventPattern,
    pub urgency: NotifyUrgency,
    /// If false, matching events are suppressed
    pub enabled: bool,
}

/// Configuration for which events trigger notifications
#[derive(Debug, Clone)]
pub struct NotifyConfig {
    rules: Vec<NotifyRule>,
}

impl NotifyConfig {
    pub fn new() -> Self {
        Self { rules: Vec::new() }
    }

    /// Default rules: surface unblocks, due occurrences, and rejected
    /// completions; suppress the rest
    pub fn default_config() -> Self {
        let mut config = Self::new();
        config.add_rule("task:unblocked", NotifyUrgency::Normal, true);
        config.add_rule("occurrence:due", NotifyUrgency::Normal, true);
        config.add_rule("task:rejected", NotifyUrgency::Important, true);
        config.add_rule("occurrence:rescheduled", NotifyUrgency::Low, false);
        config
    }

    /// Add a notification rule; first matching rule wins
    pub fn add_rule(&mut self, pattern: &str, urgency: NotifyUrgency, enabled: bool) {
        self.rules.push(NotifyRule {
            pattern: EventPattern::new(pattern),
            urgency,
            enabled,
        });
    }

    /// Check if an event should trigger a notification
    pub fn should_notify(&self, event: &Event) -> Option<NotifyUrgency> {
        let event_name = event.name();

        for rule in &self.rules {
            if rule.pattern.matches(&event_name) {
                if rule.enabled {
                    return Some(rule.urgency);
                } else {
                    return None;
                }
            }
        }

        None
    }

    /// Convert an event to a notification if configured
    pub fn to_notification(&self, event: &Event) -> Option<Notification> {
        let urgency = self.should_notify(event)?;
        Some(event_to_notification(event, urgency))
    }
}

impl Default for NotifyConfig {
    fn default() -> Self {
        Self::default_config()
    }
}

/// Render an event as user-facing notification text
fn event_to_notification(event: &Event, urgency: NotifyUrgency) -> Notification {
    match event {
        Event::TaskUnblocked { id } => {
            Notification::new("Task Ready", format!("{} is no longer waiting on anything", id))
                .with_urgency(urgency)
        }
        Event::OccurrenceDue { id, at } => Notification::new(
            "Task Due Soon",
            format!("{} is due at {}", id, at.format("%H:%M")),
        )
        .with_urgency(urgency),
        Event::TaskRejected { id } => {
            Notification::new("Completion Rejected", format!("{} needs another pass", id))
                .with_urgency(urgency)
        }
        Event::OccurrenceRescheduled { id, to, reason, .. } => Notification::new(
            "Task Rescheduled",
            format!("{} moved to {} ({})", id, to.format("%Y-%m-%d %H:%M"), reason),
        )
        .with_urgency(urgency),
        other => {
            Notification::new("Hearth", other.name()).with_urgency(urgency)
        }
    }
}
