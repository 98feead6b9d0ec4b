// SPDX-FileCopyrightText: 2026 Candor Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Trait seams between the guard orchestration and its collaborators.

pub mod host;
pub mod status;

pub use host::ModelHost;
pub use status::StatusSink;
