// SPDX-FileCopyrightText: 2026 Candor Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core library for the Candor refusal-guard middleware.
//!
//! This crate provides the foundational trait definitions, error types, and
//! conversation types used throughout the Candor workspace. Host adapters
//! and the guard orchestration are built against the seams defined here.

pub mod error;
pub mod traits;
pub mod types;

// Re-export key items at crate root for ergonomic imports.
pub use error::CandorError;
pub use traits::{ModelHost, StatusSink};
pub use types::{ChatTurn, Conversation, Role, StatusEvent, StatusPhase, Verdict};
