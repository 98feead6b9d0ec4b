// SPDX-FileCopyrightText: 2026 Candor Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types for the Candor refusal-guard middleware.

use std::time::Duration;

use thiserror::Error;

/// The primary error type used across the Candor workspace.
#[derive(Debug, Error)]
pub enum CandorError {
    /// Configuration errors (invalid TOML, missing fields, API misuse).
    #[error("configuration error: {0}")]
    Config(String),

    /// Model host errors (connection failure, bad status, malformed body).
    #[error("host error: {message}")]
    Host {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// A host call exceeded the client timeout.
    #[error("host call timed out after {duration:?}")]
    Timeout { duration: Duration },

    /// The judge model could not be reached or did not answer.
    ///
    /// Callers are expected to fail open on this variant: a missed refusal
    /// is recoverable, a blocked legitimate answer is not.
    #[error("judge unavailable: {message}")]
    JudgeUnavailable {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// A load or unload failed partway through the swap sequence.
    ///
    /// The swap is aborted and the primary model restored; the caller
    /// receives the original reply rather than this error.
    #[error("model swap failed during {stage}: {message}")]
    SwapFailed { stage: String, message: String },

    /// The primary model could not be reloaded after the swap.
    ///
    /// The only fatal guard error: leaving the wrong model resident would
    /// silently corrupt every subsequent turn in the session.
    #[error("failed to restore primary model `{model}` after {attempts} attempts")]
    RestoreFailed {
        model: String,
        attempts: u32,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// The caller cancelled mid-flight. Restore is attempted first.
    #[error("operation cancelled")]
    Cancelled,

    /// Internal or unexpected errors.
    #[error("internal error: {0}")]
    Internal(String),
}
