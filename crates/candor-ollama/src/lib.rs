// SPDX-FileCopyrightText: 2026 Candor Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Ollama model-host adapter for Candor.
//!
//! This crate implements [`candor_core::ModelHost`] against the Ollama HTTP
//! API: residency control through `keep_alive` probes, chat generation via
//! `/api/chat`, and deterministic one-shot completions via `/api/generate`.

pub mod client;
pub mod types;

pub use client::OllamaHost;
