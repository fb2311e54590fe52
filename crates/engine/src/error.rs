// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Error types for the engine runtime

use hearth_adapters::RemoteError;
use hearth_core::household::HouseholdError;
use hearth_storage::JournalError;
use thiserror::Error;

/// Errors surfaced by engine operations
#[derive(Debug, Error)]
pub enum EngineError {
    #[error(transparent)]
    Household(#[from] HouseholdError),
    #[error("journal error: {0}")]
    Journal(#[from] JournalError),
    /// A definitive remote refusal; the local apply was rolled back
    #[error("remote error: {0}")]
    Remote(#[from] RemoteError),
}
