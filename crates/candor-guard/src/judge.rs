// SPDX-FileCopyrightText: 2026 Candor Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! LLM-judge refusal classification.
//!
//! The judge is deliberately kept behind [`ModelHost::complete`]: free-text
//! YES/NO parsing is fragile, and isolating it here lets the policy be
//! hardened without touching the swap orchestration.

use std::sync::Arc;

use candor_core::{CandorError, ModelHost, Verdict};
use tracing::debug;

/// Maximum number of reply characters sent to the judge. Refusals announce
/// themselves in the first sentences; judging the full reply only slows the
/// check down.
const PREVIEW_CHARS: usize = 1000;

/// Classifies a reply as a refusal or not using a small judge model.
pub struct Judge {
    host: Arc<dyn ModelHost>,
    model: String,
}

impl Judge {
    pub fn new(host: Arc<dyn ModelHost>, model: impl Into<String>) -> Self {
        Self {
            host,
            model: model.into(),
        }
    }

    /// Returns the judge model identifier.
    pub fn model(&self) -> &str {
        &self.model
    }

    /// Asks the judge model whether `reply` is a refusal.
    ///
    /// Empty replies are never refusals and short-circuit without a host
    /// call. A transport failure becomes [`CandorError::JudgeUnavailable`];
    /// callers are expected to fail open on it.
    pub async fn classify(&self, reply: &str) -> Result<Verdict, CandorError> {
        if reply.trim().is_empty() {
            return Ok(Verdict::NotRefusal);
        }

        let prompt = judge_prompt(preview(reply, PREVIEW_CHARS));
        debug!(model = %self.model, "asking judge to classify reply");

        let raw = self
            .host
            .complete(&self.model, &prompt)
            .await
            .map_err(|e| CandorError::JudgeUnavailable {
                message: format!("judge call failed: {e}"),
                source: Some(Box::new(e)),
            })?;

        let verdict = parse_verdict(&raw);
        debug!(raw = raw.trim(), verdict = %verdict, "judge answered");
        Ok(verdict)
    }
}

/// Builds the fixed classification prompt around a reply preview.
fn judge_prompt(reply_preview: &str) -> String {
    format!(
        "Analyze the following AI response text. Does it represent a refusal to \
         answer a request due to ethical, safety, moral, or policy guidelines? \
         Typical refusals sound like 'I cannot fulfill', 'I apologize', 'I cannot comply'.\n\n\
         Text: \"{reply_preview}\"\n\n\
         Answer with exactly one word: 'YES' or 'NO'."
    )
}

/// Clips `text` to its first `limit` characters on a char boundary.
fn preview(text: &str, limit: usize) -> &str {
    match text.char_indices().nth(limit) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

/// Parses the judge's free-text answer into a verdict.
///
/// Only the first whitespace-delimited token counts, with surrounding
/// punctuation stripped and case ignored. Anything that is not a clean
/// YES or NO reads as [`Verdict::NotRefusal`]: a misfiring judge must
/// never trigger a swap.
fn parse_verdict(raw: &str) -> Verdict {
    let token = raw
        .split_whitespace()
        .next()
        .unwrap_or("")
        .trim_matches(|c: char| !c.is_ascii_alphanumeric());

    if token.eq_ignore_ascii_case("yes") {
        Verdict::Refusal
    } else if token.eq_ignore_ascii_case("no") {
        Verdict::NotRefusal
    } else {
        // Fail open on anything else.
        Verdict::NotRefusal
    }
}
