// SPDX-FileCopyrightText: 2026 Candor Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Refusal detection and fallback-model swap orchestration.
//!
//! [`RefusalGuard`] wraps one model-generation round: it asks a judge model
//! whether the primary reply is a refusal and, if so, swaps in a permissive
//! fallback model to regenerate the answer before restoring the primary.
//! Progress is reported through a fire-and-forget [`candor_core::StatusSink`].

pub mod judge;
pub mod status;
pub mod swapper;

pub use judge::Judge;
pub use status::{ChannelSink, NullSink, TracingSink};
pub use swapper::{GuardAction, GuardedReply, RefusalGuard, SwapPhase};
