// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Recurrence rule parsing (iCalendar RRULE grammar)
//!
//! Parses the subset of RFC 5545 recurrence rules the tracker supports:
//! FREQ, INTERVAL, BYDAY (weekly), BYMONTHDAY (monthly), COUNT, UNTIL.
//! WKST is accepted and ignored; anything else is rejected so a typo in
//! a rule surfaces immediately instead of silently recurring wrong.

use chrono::{DateTime, NaiveDate, NaiveTime, Utc, Weekday};
use thiserror::Error;

/// Errors that can occur during rule parsing
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RuleError {
    #[error("empty recurrence rule")]
    Empty,
    #[error("missing FREQ part")]
    MissingFreq,
    #[error("unknown FREQ: {0}")]
    UnknownFreq(String),
    #[error("malformed rule part: {0}")]
    MalformedPart(String),
    #[error("unsupported rule part: {0}")]
    UnsupportedPart(String),
    #[error("invalid {key} value: {value}")]
    InvalidValue { key: &'static str, value: String },
}

/// Recurrence frequency
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Freq {
    Daily,
    Weekly,
    Monthly,
    Yearly,
}

/// A parsed recurrence rule
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecurrenceRule {
    pub freq: Freq,
    /// Periods between occurrences; at least 1
    pub interval: u32,
    /// Weekdays within the week (weekly rules), sorted Monday-first
    pub by_day: Vec<Weekday>,
    /// Days of the month (monthly rules), sorted, each 1..=31
    pub by_month_day: Vec<u32>,
    /// Total instances the rule produces, counted before exceptions
    pub count: Option<u32>,
    /// Last instant an instance may fall on, inclusive
    pub until: Option<DateTime<Utc>>,
}

impl RecurrenceRule {
    /// Parse a rule from its text form, e.g. `FREQ=WEEKLY;BYDAY=MO,TH`
    pub fn parse(text: &str) -> Result<Self, RuleError> {
        let text = text.trim();
        let text = text.strip_prefix("RRULE:").unwrap_or(text);
        if text.is_empty() {
            return Err(RuleError::Empty);
        }

        let mut freq = None;
        let mut interval: u32 = 1;
        let mut by_day = Vec::new();
        let mut by_month_day = Vec::new();
        let mut count = None;
        let mut until = None;

        for part in text.split(';') {
            if part.is_empty() {
                continue;
            }
            let (key, value) = part
                .split_once('=')
                .ok_or_else(|| RuleError::MalformedPart(part.to_string()))?;

            match key.to_ascii_uppercase().as_str() {
                "FREQ" => {
                    freq = Some(parse_freq(value)?);
                }
                "INTERVAL" => {
                    interval = parse_positive(value, "INTERVAL")?;
                }
                "BYDAY" => {
                    for day in value.split(',') {
                        by_day.push(parse_weekday(day)?);
                    }
                    by_day.sort_by_key(|d| d.num_days_from_monday());
                    by_day.dedup();
                }
                "BYMONTHDAY" => {
                    for day in value.split(',') {
                        let day: u32 = parse_positive(day, "BYMONTHDAY")?;
                        if day > 31 {
                            return Err(RuleError::InvalidValue {
                                key: "BYMONTHDAY",
                                value: day.to_string(),
                            });
                        }
                        by_month_day.push(day);
                    }
                    by_month_day.sort_unstable();
                    by_month_day.dedup();
                }
                "COUNT" => {
                    count = Some(parse_positive(value, "COUNT")?);
                }
                "UNTIL" => {
                    until = Some(parse_until(value)?);
                }
                // Week start only matters for expansions we don't support
                "WKST" => {}
                _ => {
                    return Err(RuleError::UnsupportedPart(key.to_string()));
                }
            }
        }

        Ok(Self {
            freq: freq.ok_or(RuleError::MissingFreq)?,
            interval,
            by_day,
            by_month_day,
            count,
            until,
        })
    }

    /// Whether the rule is bounded by COUNT or UNTIL
    pub fn is_bounded(&self) -> bool {
        self.count.is_some() || self.until.is_some()
    }
}

impl std::str::FromStr for RecurrenceRule {
    type Err = RuleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

fn parse_freq(value: &str) -> Result<Freq, RuleError> {
    match value.to_ascii_uppercase().as_str() {
        "DAILY" => Ok(Freq::Daily),
        "WEEKLY" => Ok(Freq::Weekly),
        "MONTHLY" => Ok(Freq::Monthly),
        "YEARLY" => Ok(Freq::Yearly),
        other => Err(RuleError::UnknownFreq(other.to_string())),
    }
}

fn parse_positive(value: &str, key: &'static str) -> Result<u32, RuleError> {
    let n: u32 = value.parse().map_err(|_| RuleError::InvalidValue {
        key,
        value: value.to_string(),
    })?;
    if n == 0 {
        return Err(RuleError::InvalidValue {
            key,
            value: value.to_string(),
        });
    }
    Ok(n)
}

fn parse_weekday(value: &str) -> Result<Weekday, RuleError> {
    match value.to_ascii_uppercase().as_str() {
        "MO" => Ok(Weekday::Mon),
        "TU" => Ok(Weekday::Tue),
        "WE" => Ok(Weekday::Wed),
        "TH" => Ok(Weekday::Thu),
        "FR" => Ok(Weekday::Fri),
        "SA" => Ok(Weekday::Sat),
        "SU" => Ok(Weekday::Sun),
        other => Err(RuleError::InvalidValue {
            key: "BYDAY",
            value: other.to_string(),
        }),
    }
}

/// UNTIL accepts a date (`20240601`, inclusive through end of day) or a
/// UTC timestamp (`20240601T090000Z`)
fn parse_until(value: &str) -> Result<DateTime<Utc>, RuleError> {
    let invalid = || RuleError::InvalidValue {
        key: "UNTIL",
        value: value.to_string(),
    };

    if let Some((date_part, time_part)) = value.split_once('T') {
        let time_part = time_part.strip_suffix('Z').ok_or_else(invalid)?;
        let date = NaiveDate::parse_from_str(date_part, "%Y%m%d").map_err(|_| invalid())?;
        let time = NaiveTime::parse_from_str(time_part, "%H%M%S").map_err(|_| invalid())?;
        Ok(date.and_time(time).and_utc())
    } else {
        let date = NaiveDate::parse_from_str(value, "%Y%m%d").map_err(|_| invalid())?;
        let end_of_day = NaiveTime::from_hms_opt(23, 59, 59).ok_or_else(invalid)?;
        Ok(date.and_time(end_of_day).and_utc())
    }
}
