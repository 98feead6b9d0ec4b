// SPDX-FileCopyrightText: 2026 Candor Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Model host trait for runtimes exposing load/unload/generate operations.

use async_trait::async_trait;

use crate::error::CandorError;
use crate::types::Conversation;

/// A model-serving runtime with a single "currently resident model" slot.
///
/// The guard treats [`load`](ModelHost::load) / [`unload`](ModelHost::unload)
/// as an acquire/release pair over that slot: whoever unloads the primary
/// model is responsible for loading it back on every exit path.
#[async_trait]
pub trait ModelHost: Send + Sync {
    /// Human-readable name of this host, used in logs and diagnostics.
    fn name(&self) -> &str;

    /// Makes `model` resident on the host.
    async fn load(&self, model: &str) -> Result<(), CandorError>;

    /// Evicts `model` from the host.
    async fn unload(&self, model: &str) -> Result<(), CandorError>;

    /// Runs a chat completion over the full conversation and returns the
    /// assistant's reply text.
    async fn generate(
        &self,
        model: &str,
        conversation: &Conversation,
    ) -> Result<String, CandorError>;

    /// One-shot raw-prompt completion with deterministic sampling.
    ///
    /// Used for short classification calls (the judge) where conversation
    /// framing and sampling temperature would only add noise.
    async fn complete(&self, model: &str, prompt: &str) -> Result<String, CandorError>;
}
