// SPDX-FileCopyrightText: 2026 Candor Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The swap state machine.
//!
//! One guard invocation walks `Idle -> Judging -> (Done | UnloadingPrimary
//! -> LoadingFallback -> GeneratingFallback -> RestoringPrimary -> Done)`.
//! The host's single "resident model" slot is treated as an acquire/release
//! pair: once the primary model has been unloaded, every exit path (success,
//! swap failure, cancellation) runs through [`RefusalGuard::restore_primary`].

use std::sync::Arc;

use candor_config::GuardConfig;
use candor_core::{
    CandorError, ChatTurn, Conversation, ModelHost, StatusEvent, StatusSink, Verdict,
};
use strum::Display;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::judge::Judge;

/// Phases of one guard invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[strum(serialize_all = "snake_case")]
pub enum SwapPhase {
    Idle,
    Judging,
    UnloadingPrimary,
    LoadingFallback,
    GeneratingFallback,
    RestoringPrimary,
    Done,
}

impl SwapPhase {
    /// Legal successor phases.
    ///
    /// The only forward skip is `Judging -> Done` (verdict: not a refusal).
    /// The extra edges into `RestoringPrimary` are the abort paths: once the
    /// swap has started, failure at any step must still route through the
    /// restore phase.
    pub fn can_transition(self, next: SwapPhase) -> bool {
        use SwapPhase::*;
        matches!(
            (self, next),
            (Idle, Judging)
                | (Judging, Done)
                | (Judging, UnloadingPrimary)
                | (UnloadingPrimary, LoadingFallback)
                | (LoadingFallback, GeneratingFallback)
                | (GeneratingFallback, RestoringPrimary)
                | (RestoringPrimary, Done)
                // Abort edges.
                | (UnloadingPrimary, RestoringPrimary)
                | (LoadingFallback, RestoringPrimary)
        )
    }
}

/// Moves the state machine to `next`, enforcing the transition table.
fn advance(phase: &mut SwapPhase, next: SwapPhase) {
    debug_assert!(
        phase.can_transition(next),
        "illegal swap transition {phase} -> {next}"
    );
    debug!(from = %phase, to = %next, "swap phase transition");
    *phase = next;
}

/// How a guard invocation concluded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[strum(serialize_all = "snake_case")]
pub enum GuardAction {
    /// The guard is disabled; the reply passed through untouched.
    Disabled,
    /// The judge saw no refusal; the reply passed through untouched.
    Passed,
    /// The judge could not be reached; failed open to the original reply.
    JudgeUnavailable,
    /// The reply was regenerated by the fallback model.
    Swapped,
    /// The swap failed partway; the original reply was returned.
    SwapAborted,
}

/// The result of one guard invocation.
#[derive(Debug, Clone)]
pub struct GuardedReply {
    /// The reply handed back to the user.
    pub text: String,
    /// The conversation with the final assistant turn replaced when a swap
    /// occurred, otherwise unchanged.
    pub conversation: Conversation,
    /// How this reply was produced.
    pub action: GuardAction,
}

impl GuardedReply {
    /// True when the reply came from the fallback model.
    pub fn regenerated(&self) -> bool {
        self.action == GuardAction::Swapped
    }
}

/// Orchestrates refusal detection and the fallback-model swap for one
/// model-generation round.
pub struct RefusalGuard {
    host: Arc<dyn ModelHost>,
    sink: Arc<dyn StatusSink>,
    judge: Judge,
    enabled: bool,
    fallback_model: String,
    restore_retries: u32,
}

impl RefusalGuard {
    pub fn new(
        host: Arc<dyn ModelHost>,
        sink: Arc<dyn StatusSink>,
        config: &GuardConfig,
    ) -> Self {
        Self {
            judge: Judge::new(host.clone(), &config.judge_model),
            host,
            sink,
            enabled: config.enabled,
            fallback_model: config.fallback_model.clone(),
            restore_retries: config.restore_retries.max(1),
        }
    }

    /// Returns the fallback model identifier.
    pub fn fallback_model(&self) -> &str {
        &self.fallback_model
    }

    /// Guards a conversation whose final turn is the primary model's reply.
    ///
    /// When disabled, this is a strict pass-through: zero judge and host
    /// calls, the reply returned as-is.
    pub async fn process(
        &self,
        conversation: Conversation,
        primary_model: &str,
    ) -> Result<GuardedReply, CandorError> {
        self.process_with_cancel(conversation, primary_model, &CancellationToken::new())
            .await
    }

    /// [`process`](Self::process) with caller-driven cancellation.
    ///
    /// Cancellation observed after the primary model has been unloaded still
    /// restores it before `Cancelled` propagates.
    pub async fn process_with_cancel(
        &self,
        conversation: Conversation,
        primary_model: &str,
        cancel: &CancellationToken,
    ) -> Result<GuardedReply, CandorError> {
        let primary_reply = conversation
            .final_assistant()
            .map(|turn| turn.content.clone())
            .ok_or_else(|| {
                CandorError::Config(
                    "conversation must end with an assistant turn; \
                     use generate_and_process to obtain one"
                        .into(),
                )
            })?;

        if !self.enabled {
            debug!("guard disabled, passing reply through");
            return Ok(GuardedReply {
                text: primary_reply,
                conversation,
                action: GuardAction::Disabled,
            });
        }

        self.run(conversation, primary_model, primary_reply, cancel)
            .await
    }

    /// Generates the primary reply first, then guards it.
    pub async fn generate_and_process(
        &self,
        conversation: Conversation,
        primary_model: &str,
    ) -> Result<GuardedReply, CandorError> {
        self.generate_and_process_with_cancel(
            conversation,
            primary_model,
            &CancellationToken::new(),
        )
        .await
    }

    /// [`generate_and_process`](Self::generate_and_process) with
    /// caller-driven cancellation.
    pub async fn generate_and_process_with_cancel(
        &self,
        mut conversation: Conversation,
        primary_model: &str,
        cancel: &CancellationToken,
    ) -> Result<GuardedReply, CandorError> {
        let reply = self.host.generate(primary_model, &conversation).await?;
        conversation.push(ChatTurn::assistant(reply));
        self.process_with_cancel(conversation, primary_model, cancel)
            .await
    }

    async fn run(
        &self,
        mut conversation: Conversation,
        primary_model: &str,
        primary_reply: String,
        cancel: &CancellationToken,
    ) -> Result<GuardedReply, CandorError> {
        let mut phase = SwapPhase::Idle;

        if cancel.is_cancelled() {
            return Err(CandorError::Cancelled);
        }

        advance(&mut phase, SwapPhase::Judging);
        self.sink
            .emit(StatusEvent::checking("Checking response for refusal..."));

        let verdict = match self.judge.classify(&primary_reply).await {
            Ok(verdict) => verdict,
            Err(err) => {
                // Fail open: a missed refusal beats a blocked answer.
                warn!(error = %err, "judge unavailable, keeping the original reply");
                self.sink.emit(StatusEvent::warning(
                    "Refusal check unavailable; keeping the original reply.",
                ));
                return Ok(GuardedReply {
                    text: primary_reply,
                    conversation,
                    action: GuardAction::JudgeUnavailable,
                });
            }
        };

        if verdict == Verdict::NotRefusal {
            advance(&mut phase, SwapPhase::Done);
            return Ok(GuardedReply {
                text: primary_reply,
                conversation,
                action: GuardAction::Passed,
            });
        }

        info!(
            primary = primary_model,
            fallback = %self.fallback_model,
            "refusal detected, starting swap sequence"
        );
        self.sink.emit(StatusEvent::swapping(format!(
            "Loading {} & generating...",
            self.fallback_model
        )));

        // The refused reply must not be visible to the fallback model.
        let regen_conversation = conversation.without_final_assistant();

        advance(&mut phase, SwapPhase::UnloadingPrimary);
        if let Err(err) = self.host.unload(primary_model).await {
            return self
                .abort_swap(
                    &mut phase,
                    "unload-primary",
                    err,
                    primary_model,
                    primary_reply,
                    conversation,
                )
                .await;
        }

        if cancel.is_cancelled() {
            // The primary is no longer resident; put it back first.
            advance(&mut phase, SwapPhase::RestoringPrimary);
            self.restore_primary(primary_model).await?;
            return Err(CandorError::Cancelled);
        }

        advance(&mut phase, SwapPhase::LoadingFallback);
        if let Err(err) = self.host.load(&self.fallback_model).await {
            return self
                .abort_swap(
                    &mut phase,
                    "load-fallback",
                    err,
                    primary_model,
                    primary_reply,
                    conversation,
                )
                .await;
        }

        advance(&mut phase, SwapPhase::GeneratingFallback);
        if cancel.is_cancelled() {
            self.evict_fallback().await;
            advance(&mut phase, SwapPhase::RestoringPrimary);
            self.restore_primary(primary_model).await?;
            return Err(CandorError::Cancelled);
        }

        let fallback_reply = match self
            .host
            .generate(&self.fallback_model, &regen_conversation)
            .await
        {
            Ok(reply) => reply,
            Err(err) => {
                self.evict_fallback().await;
                return self
                    .abort_swap(
                        &mut phase,
                        "generate-fallback",
                        err,
                        primary_model,
                        primary_reply,
                        conversation,
                    )
                    .await;
            }
        };

        // The fallback's reply is accepted unconditionally -- re-judging it
        // could loop and would double the worst-case latency.
        advance(&mut phase, SwapPhase::RestoringPrimary);
        self.evict_fallback().await;
        self.restore_primary(primary_model).await?;

        conversation.replace_final_assistant(&fallback_reply);
        advance(&mut phase, SwapPhase::Done);
        self.sink.emit(StatusEvent::done("Restored."));
        info!(fallback = %self.fallback_model, "swap complete, primary model restored");

        Ok(GuardedReply {
            text: fallback_reply,
            conversation,
            action: GuardAction::Swapped,
        })
    }

    /// Aborts a failed swap: restores the primary model, emits an error
    /// event, and hands the caller the original (refused) reply -- a refused
    /// answer still beats no answer.
    async fn abort_swap(
        &self,
        phase: &mut SwapPhase,
        stage: &str,
        cause: CandorError,
        primary_model: &str,
        primary_reply: String,
        conversation: Conversation,
    ) -> Result<GuardedReply, CandorError> {
        let err = CandorError::SwapFailed {
            stage: stage.to_string(),
            message: cause.to_string(),
        };
        warn!(error = %err, "aborting swap");

        advance(phase, SwapPhase::RestoringPrimary);
        self.restore_primary(primary_model).await?;
        advance(phase, SwapPhase::Done);

        self.sink.emit(StatusEvent::error(format!(
            "Fallback could not be completed ({stage}); keeping the original reply."
        )));

        Ok(GuardedReply {
            text: primary_reply,
            conversation,
            action: GuardAction::SwapAborted,
        })
    }

    /// Reloads the primary model, retrying on failure.
    ///
    /// Total attempts are `1 + restore_retries`. Exhausting them is the
    /// fatal case: the host would be left without the primary model and
    /// every later turn in the session would run against the wrong state.
    async fn restore_primary(&self, model: &str) -> Result<(), CandorError> {
        let attempts = self.restore_retries + 1;
        let mut last_error = None;

        for attempt in 1..=attempts {
            match self.host.load(model).await {
                Ok(()) => {
                    if attempt > 1 {
                        info!(model, attempt, "primary model restored after retry");
                    }
                    return Ok(());
                }
                Err(err) => {
                    warn!(model, attempt, error = %err, "failed to restore primary model");
                    last_error = Some(err);
                }
            }
        }

        self.sink.emit(StatusEvent::error(format!(
            "Failed to restore {model}; the host may be left on the wrong model."
        )));
        Err(CandorError::RestoreFailed {
            model: model.to_string(),
            attempts,
            source: last_error
                .map(|e| Box::new(e) as Box<dyn std::error::Error + Send + Sync>),
        })
    }

    /// Evicts the fallback model, best-effort. The reply is already in hand
    /// and the restore that follows is what corrects residency, so failure
    /// here only warrants a warning.
    async fn evict_fallback(&self) {
        if let Err(err) = self.host.unload(&self.fallback_model).await {
            warn!(
                model = %self.fallback_model,
                error = %err,
                "failed to evict fallback model"
            );
        }
    }
}
