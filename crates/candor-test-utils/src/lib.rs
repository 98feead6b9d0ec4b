// SPDX-FileCopyrightText: 2026 Candor Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test utilities for Candor integration tests.
//!
//! Provides mock collaborators and harness infrastructure for fast,
//! deterministic, CI-runnable tests without a live model host.
//!
//! # Components
//!
//! - [`MockHost`] - Mock model host with scripted replies, call recording,
//!   and failure injection
//! - [`RecordingSink`] - Status sink that captures events for assertions
//! - [`GuardHarness`] - A guard wired to both, built in one call

pub mod harness;
pub mod mock_host;
pub mod recording_sink;

pub use harness::GuardHarness;
pub use mock_host::{HostCall, MockHost};
pub use recording_sink::RecordingSink;
