// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Recurrence engine
//!
//! This module computes, for a recurring task, the next actionable
//! occurrence: the rule text is parsed (`rule`), expanded forward, and
//! reconciled with the task's exception set of skipped dates,
//! per-instance time shifts, and a series pause (`engine`). Exceptions are stored
//! separately from the rule so the original recurrence always remains
//! reconstructable.

mod engine;
mod rule;



pub use engine::{next_occurrence, ExceptionSet, NextOccurrence, MAX_RULE_SCAN};
pub use rule::{Freq, RecurrenceRule, RuleError};
