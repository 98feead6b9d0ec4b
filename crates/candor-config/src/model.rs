// SPDX-FileCopyrightText: 2026 Candor Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration model structs for Candor.
//!
//! All structs use `#[serde(deny_unknown_fields)]` to reject unrecognized
//! config keys at startup, providing actionable error messages.

use serde::{Deserialize, Serialize};

/// Top-level Candor configuration.
///
/// Loaded from TOML files following the XDG hierarchy, with environment
/// variable overrides. All sections are optional and default to sensible
/// values -- an empty `candor.toml` yields a working local setup.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct CandorConfig {
    /// Process identity and logging settings.
    #[serde(default)]
    pub agent: AgentConfig,

    /// Model host (Ollama) endpoint settings.
    #[serde(default)]
    pub host: HostConfig,

    /// Refusal-guard behavior settings.
    #[serde(default)]
    pub guard: GuardConfig,
}

/// Process identity and logging configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct AgentConfig {
    /// Display name used in logs and diagnostics.
    #[serde(default = "default_agent_name")]
    pub name: String,

    /// Logging level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            name: default_agent_name(),
            log_level: default_log_level(),
        }
    }
}

fn default_agent_name() -> String {
    "candor".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Model host endpoint configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct HostConfig {
    /// Base URL of the Ollama API.
    ///
    /// Use `http://host.docker.internal:11434` when the caller runs inside
    /// Docker and Ollama runs on the host machine.
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Per-request timeout in seconds. Model loads and generations can be
    /// slow on cold starts, so this defaults generously.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for HostConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

fn default_base_url() -> String {
    "http://127.0.0.1:11434".to_string()
}

fn default_timeout_secs() -> u64 {
    300
}

/// Refusal-guard behavior configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct GuardConfig {
    /// Enable the guard. When false, replies pass through untouched with
    /// zero judge or host calls.
    #[serde(default = "default_guard_enabled")]
    pub enabled: bool,

    /// Small, fast model used to classify whether a reply is a refusal
    /// (e.g. llama3.2, gemma:2b).
    #[serde(default = "default_judge_model")]
    pub judge_model: String,

    /// Permissive model loaded to regenerate refused replies.
    #[serde(default = "default_fallback_model")]
    pub fallback_model: String,

    /// Retries when reloading the primary model after a swap. Must be at
    /// least 1: leaving the wrong model resident corrupts later turns.
    #[serde(default = "default_restore_retries")]
    pub restore_retries: u32,
}

impl Default for GuardConfig {
    fn default() -> Self {
        Self {
            enabled: default_guard_enabled(),
            judge_model: default_judge_model(),
            fallback_model: default_fallback_model(),
            restore_retries: default_restore_retries(),
        }
    }
}

fn default_guard_enabled() -> bool {
    true
}

fn default_judge_model() -> String {
    "llama3.2".to_string()
}

fn default_fallback_model() -> String {
    "dolphin-mistral".to_string()
}

fn default_restore_retries() -> u32 {
    1
}
