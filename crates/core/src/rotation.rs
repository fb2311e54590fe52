// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Rotation assignment
//!
//! Deterministically picks the next assignee from an ordered, optionally
//! weighted pool. Weights act as repeat counts in a virtual expanded
//! sequence: weight `w` means the candidate occupies `w` consecutive
//! slots of the cycle, which keeps long-run frequency proportional to
//! weight using integer math only. The stored index addresses that
//! virtual sequence; with no weights it is exactly a pool index.

use crate::task::MemberId;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;

/// Errors from rotation configuration
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RotationError {
    #[error("rotation weight for {member} must be at least 1")]
    ZeroWeight { member: MemberId },
}

/// One row of the fairness report, for display only
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FairnessEntry {
    pub id: MemberId,
    pub completed: u64,
    /// `weight / total_weight * total_completions`
    pub expected_share: f64,
    /// `completed - expected_share`
    pub delta: f64,
}

/// Reject zero weights before they reach the cycle math
pub fn validate_weights(weights: &BTreeMap<MemberId, u32>) -> Result<(), RotationError> {
    for (member, weight) in weights {
        if *weight == 0 {
            return Err(RotationError::ZeroWeight {
                member: member.clone(),
            });
        }
    }
    Ok(())
}

fn weight_of(weights: &BTreeMap<MemberId, u32>, member: &MemberId) -> u64 {
    u64::from(weights.get(member).copied().unwrap_or(1))
}

/// Length of the virtual weighted sequence
pub fn rotation_len(pool: &[MemberId], weights: &BTreeMap<MemberId, u32>) -> usize {
    pool.iter().map(|m| weight_of(weights, m) as usize).sum()
}

/// Advance one slot in the virtual sequence; exactly once per
/// occurrence renewal
pub fn advance(pool: &[MemberId], weights: &BTreeMap<MemberId, u32>, current: usize) -> Option<usize> {
    let len = rotation_len(pool, weights);
    if len == 0 {
        return None;
    }
    Some((current + 1) % len)
}

/// Re-anchor a stored index after a pool or weight edit
pub fn clamp_index(
    pool: &[MemberId],
    weights: &BTreeMap<MemberId, u32>,
    current: usize,
) -> Option<usize> {
    let len = rotation_len(pool, weights);
    if len == 0 {
        return None;
    }
    Some(current % len)
}

/// Map a virtual slot back to the pool member occupying it
pub fn assignee<'a>(
    pool: &'a [MemberId],
    weights: &BTreeMap<MemberId, u32>,
    index: usize,
) -> Option<&'a MemberId> {
    let len = rotation_len(pool, weights);
    if len == 0 {
        return None;
    }
    let mut slot = (index % len) as u64;
    for member in pool {
        let w = weight_of(weights, member);
        if slot < w {
            return Some(member);
        }
        slot -= w;
    }
    None
}

/// Expected-vs-actual completion shares; never alters assignment
pub fn fairness_report(
    pool: &[MemberId],
    weights: &BTreeMap<MemberId, u32>,
    completion_counts: &BTreeMap<MemberId, u64>,
) -> Vec<FairnessEntry> {
    let total_weight = rotation_len(pool, weights) as f64;
    let total_completions: u64 = pool
        .iter()
        .map(|m| completion_counts.get(m).copied().unwrap_or(0))
        .sum();

    pool.iter()
        .map(|member| {
            let completed = completion_counts.get(member).copied().unwrap_or(0);
            let expected_share = if total_weight == 0.0 {
                0.0
            } else {
                weight_of(weights, member) as f64 / total_weight * total_completions as f64
            };
            FairnessEntry {
                id: member.clone(),
                completed,
                expected_share,
                delta: completed as f64 - expected_share,
            }
        })
        .collect()
}

#[cfg(test)]
#[path = "rotation_tests.rs"]
mod tests;
