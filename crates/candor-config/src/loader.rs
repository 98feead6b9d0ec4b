// SPDX-FileCopyrightText: 2026 Candor Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration loader using Figment for layered config merging.
//!
//! Supports XDG hierarchy: `./candor.toml` > `~/.config/candor/candor.toml` > `/etc/candor/candor.toml`
//! with environment variable overrides via `CANDOR_` prefix.

#![allow(clippy::result_large_err)] // figment::Error is external and cannot be boxed without wrapper

use std::path::Path;

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};

use crate::model::CandorConfig;

/// Load configuration from the standard XDG hierarchy with env var overrides.
///
/// Merge order (later overrides earlier):
/// 1. Compiled defaults
/// 2. `/etc/candor/candor.toml` (system-wide)
/// 3. `~/.config/candor/candor.toml` (user XDG config)
/// 4. `./candor.toml` (local directory)
/// 5. `CANDOR_*` environment variables
pub fn load_config() -> Result<CandorConfig, figment::Error> {
    build_figment().extract()
}

/// Load configuration from a TOML string only (no XDG lookup, no env vars).
///
/// Useful for testing and explicit configuration.
pub fn load_config_from_str(toml_content: &str) -> Result<CandorConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(CandorConfig::default()))
        .merge(Toml::string(toml_content))
        .extract()
}

/// Load configuration from a specific file path with env var overrides.
pub fn load_config_from_path(path: &Path) -> Result<CandorConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(CandorConfig::default()))
        .merge(Toml::file(path))
        .merge(env_provider())
        .extract()
}

/// Build the Figment used internally for config loading (exposed for diagnostic use).
///
/// Returns the Figment before extraction so callers can inspect metadata.
pub fn build_figment() -> Figment {
    Figment::new()
        .merge(Serialized::defaults(CandorConfig::default()))
        .merge(Toml::file("/etc/candor/candor.toml"))
        .merge(Toml::file(
            dirs::config_dir()
                .map(|d| d.join("candor/candor.toml"))
                .unwrap_or_default(),
        ))
        .merge(Toml::file("candor.toml"))
        .merge(env_provider())
}

/// Create the environment variable provider using explicit `map()` for section-to-dot mapping.
///
/// Uses `Env::map()` NOT `Env::split("_")` to avoid ambiguity with
/// underscore-containing key names. For example, `CANDOR_GUARD_FALLBACK_MODEL`
/// must map to `guard.fallback_model`, not `guard.fallback.model`.
fn env_provider() -> Env {
    Env::prefixed("CANDOR_").map(|key| {
        // `key` is the lowercased env var name with prefix stripped.
        // Example: CANDOR_GUARD_FALLBACK_MODEL -> "guard_fallback_model"
        let key_str = key.as_str();
        let mapped = key_str
            .replacen("agent_", "agent.", 1)
            .replacen("host_", "host.", 1)
            .replacen("guard_", "guard.", 1);
        mapped.into()
    })
}
