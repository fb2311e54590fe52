// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! Adapters for external I/O
//!
//! The engine computes; these deliver. The remote document store holds
//! the source of truth for task records and serializes writes per task,
//! and the notification adapter hands selected events to whatever push
//! mechanism the platform offers.

pub mod notify;
pub mod remote;
pub mod traced;

pub use notify::{NoOpNotifyAdapter, NotifyAdapter, NotifyError};
pub use remote::{HttpRemoteStore, NoOpRemoteStore, RemoteError, RemoteStore};
pub use traced::TracedRemoteStore;

// Test support - only compiled for tests or when explicitly requested
#[cfg(any(test, feature = "test-support"))]
pub use notify::FakeNotifyAdapter;
#[cfg(any(test, feature = "test-support"))]
pub use remote::{FakeRemoteStore, RemoteCall};
