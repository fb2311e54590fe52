// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Next-occurrence computation
//!
//! Expands a recurrence rule forward from an instant and reconciles the
//! raw candidates with the task's exception set. COUNT and UNTIL bound
//! the rule expansion itself, so a skipped date still consumes COUNT
//! (RFC 5545 applies exceptions after expansion).

use super::rule::{Freq, RecurrenceRule};
use chrono::{DateTime, Datelike, Duration, NaiveDate, NaiveTime, Utc};
use std::collections::{BTreeMap, BTreeSet};

/// Upper bound on raw candidates examined per computation.
/// A rule whose remaining candidates are all skipped terminates here.
pub const MAX_RULE_SCAN: u32 = 4096;

/// Per-task exceptions the engine reconciles against the rule
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExceptionSet {
    /// Calendar dates excluded from the recurrence
    pub skip_dates: BTreeSet<NaiveDate>,
    /// Minute offsets applied to single instances, keyed by the
    /// originally-scheduled date
    pub shifts: BTreeMap<NaiveDate, i64>,
    /// While in the future, no occurrence is computed
    pub paused_until: Option<DateTime<Utc>>,
}

/// Outcome of a next-occurrence computation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NextOccurrence {
    /// The next actionable instant
    At(DateTime<Utc>),
    /// Series is paused; nothing is scheduled until the pause lapses
    Paused,
    /// Bounded rule exhausted; no further occurrences exist
    Finished,
}

/// Compute the first occurrence strictly after `after`.
///
/// `anchor` is the series start and carries the time-of-day every
/// occurrence inherits. A shift changes only the instance's time, never
/// which date recurs; a skip removes the instance entirely.
pub fn next_occurrence(
    rule: &RecurrenceRule,
    anchor: DateTime<Utc>,
    exceptions: &ExceptionSet,
    after: DateTime<Utc>,
) -> NextOccurrence {
    if let Some(paused_until) = exceptions.paused_until {
        if paused_until > after {
            return NextOccurrence::Paused;
        }
    }

    let mut candidates = Candidates::new(rule, anchor);
    let mut emitted: u32 = 0;

    for _ in 0..MAX_RULE_SCAN {
        let Some(raw) = candidates.next() else {
            return NextOccurrence::Finished;
        };
        if let Some(count) = rule.count {
            if emitted >= count {
                return NextOccurrence::Finished;
            }
        }
        emitted += 1;
        if let Some(until) = rule.until {
            if raw > until {
                return NextOccurrence::Finished;
            }
        }

        let date = raw.date_naive();
        if exceptions.skip_dates.contains(&date) {
            continue;
        }
        let occurrence = match exceptions.shifts.get(&date) {
            Some(minutes) => raw + Duration::minutes(*minutes),
            None => raw,
        };
        if occurrence > after {
            return NextOccurrence::At(occurrence);
        }
    }

    NextOccurrence::Finished
}

/// Raw rule expansion: yields unshifted occurrences in order, starting
/// at the anchor, with no knowledge of exceptions or bounds.
struct Candidates<'a> {
    rule: &'a RecurrenceRule,
    anchor: DateTime<Utc>,
    time: NaiveTime,
    /// Period counter (days/weeks/months/years blocks, pre-interval)
    period: u32,
    /// Position within the current period (BYDAY / BYMONTHDAY slots)
    slot: usize,
}

impl<'a> Candidates<'a> {
    fn new(rule: &'a RecurrenceRule, anchor: DateTime<Utc>) -> Self {
        Self {
            rule,
            anchor,
            time: anchor.time(),
            period: 0,
            slot: 0,
        }
    }

    fn next(&mut self) -> Option<DateTime<Utc>> {
        // Bounded: every period either yields or shrinks the remaining
        // scan budget, and invalid dates (Feb 30) only occur a bounded
        // number of periods in a row.
        for _ in 0..MAX_RULE_SCAN {
            let candidate = match self.rule.freq {
                Freq::Daily => self.daily(),
                Freq::Weekly => self.weekly(),
                Freq::Monthly => self.monthly(),
                Freq::Yearly => self.yearly(),
            };
            match candidate {
                Step::Yield(instant) => return Some(instant),
                Step::Skip => continue,
            }
        }
        None
    }

    fn daily(&mut self) -> Step {
        let days = i64::from(self.period) * i64::from(self.rule.interval);
        self.period += 1;
        let date = self.anchor.date_naive() + Duration::days(days);
        Step::Yield(date.and_time(self.time).and_utc())
    }

    fn weekly(&mut self) -> Step {
        if self.rule.by_day.is_empty() {
            let weeks = i64::from(self.period) * i64::from(self.rule.interval);
            self.period += 1;
            let date = self.anchor.date_naive() + Duration::weeks(weeks);
            return Step::Yield(date.and_time(self.time).and_utc());
        }

        let anchor_date = self.anchor.date_naive();
        let week_start =
            anchor_date - Duration::days(i64::from(anchor_date.weekday().num_days_from_monday()));

        let weekday = self.rule.by_day[self.slot];
        let weeks = i64::from(self.period) * i64::from(self.rule.interval);
        let date = week_start
            + Duration::weeks(weeks)
            + Duration::days(i64::from(weekday.num_days_from_monday()));

        self.advance_slot(self.rule.by_day.len());

        let instant = date.and_time(self.time).and_utc();
        if instant < self.anchor {
            // Earlier weekday in the anchor's own week
            Step::Skip
        } else {
            Step::Yield(instant)
        }
    }

    fn monthly(&mut self) -> Step {
        let (day, slots) = if self.rule.by_month_day.is_empty() {
            (self.anchor.day(), 1)
        } else {
            (self.rule.by_month_day[self.slot], self.rule.by_month_day.len())
        };

        let months = self.period * self.rule.interval;
        let (year, month) = add_months(self.anchor.year(), self.anchor.month(), months);

        self.advance_slot(slots);

        match NaiveDate::from_ymd_opt(year, month, day) {
            Some(date) => {
                let instant = date.and_time(self.time).and_utc();
                if instant < self.anchor {
                    Step::Skip
                } else {
                    Step::Yield(instant)
                }
            }
            // Month without that day (Feb 31): the instance does not exist
            None => Step::Skip,
        }
    }

    fn yearly(&mut self) -> Step {
        let years = self.period * self.rule.interval;
        self.period += 1;
        let year = self.anchor.year() + years as i32;
        match NaiveDate::from_ymd_opt(year, self.anchor.month(), self.anchor.day()) {
            Some(date) => Step::Yield(date.and_time(self.time).and_utc()),
            // Feb 29 in a non-leap year
            None => Step::Skip,
        }
    }

    fn advance_slot(&mut self, len: usize) {
        self.slot += 1;
        if self.slot >= len {
            self.slot = 0;
            self.period += 1;
        }
    }
}

enum Step {
    Yield(DateTime<Utc>),
    Skip,
}

fn add_months(year: i32, month: u32, delta: u32) -> (i32, u32) {
    let total = year * 12 + (month as i32 - 1) + delta as i32;
    (total.div_euclid(12), (total.rem_euclid(12) + 1) as u32)
}
