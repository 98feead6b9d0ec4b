// SPDX-FileCopyrightText: 2026 Candor Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Post-deserialization validation for configuration values.
//!
//! Validates semantic constraints that cannot be expressed via serde
//! attributes, such as non-empty model identifiers and a plausible host URL.

use crate::diagnostic::ConfigError;
use crate::model::CandorConfig;

/// Validate a deserialized configuration for semantic correctness.
///
/// Returns `Ok(())` if all validations pass, or `Err(Vec<ConfigError>)` with
/// all collected validation errors (does not fail fast).
pub fn validate_config(config: &CandorConfig) -> Result<(), Vec<ConfigError>> {
    let mut errors = Vec::new();

    let base_url = config.host.base_url.trim();
    if base_url.is_empty() {
        errors.push(ConfigError::Validation {
            message: "host.base_url must not be empty".to_string(),
        });
    } else if !base_url.starts_with("http://") && !base_url.starts_with("https://") {
        errors.push(ConfigError::Validation {
            message: format!(
                "host.base_url `{base_url}` must start with http:// or https://"
            ),
        });
    }

    if config.host.timeout_secs == 0 {
        errors.push(ConfigError::Validation {
            message: "host.timeout_secs must be at least 1".to_string(),
        });
    }

    if config.guard.judge_model.trim().is_empty() {
        errors.push(ConfigError::Validation {
            message: "guard.judge_model must not be empty".to_string(),
        });
    }

    if config.guard.fallback_model.trim().is_empty() {
        errors.push(ConfigError::Validation {
            message: "guard.fallback_model must not be empty".to_string(),
        });
    }

    // The restore step must get at least one retry before giving up, else a
    // single transient failure leaves the fallback model resident.
    if config.guard.restore_retries < 1 {
        errors.push(ConfigError::Validation {
            message: format!(
                "guard.restore_retries must be at least 1, got {}",
                config.guard.restore_retries
            ),
        });
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
