// SPDX-FileCopyrightText: 2026 Candor Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mock model host for deterministic testing.
//!
//! `MockHost` implements `ModelHost` with pre-configured responses, full
//! call-sequence recording, and per-operation failure injection, enabling
//! fast, CI-runnable tests without a live Ollama instance.

use std::collections::{HashMap, VecDeque};

use async_trait::async_trait;
use candor_core::{CandorError, Conversation, ModelHost};
use tokio::sync::Mutex;

/// One recorded host operation, in invocation order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HostCall {
    Load(String),
    Unload(String),
    Generate { model: String, turns: usize },
    Complete { model: String },
}

/// A mock model host with scripted responses.
///
/// `complete` answers are popped from a FIFO queue ("NO" when empty, so the
/// judge defaults to benign); `generate` answers likewise ("mock reply" when
/// empty). Failures are injected per operation and, for load/unload, per
/// model, each firing a configured number of times before the operation
/// succeeds again. Every call, including failing ones, is recorded.
pub struct MockHost {
    calls: Mutex<Vec<HostCall>>,
    generate_responses: Mutex<VecDeque<String>>,
    complete_responses: Mutex<VecDeque<String>>,
    fail_loads: Mutex<HashMap<String, u32>>,
    fail_unloads: Mutex<HashMap<String, u32>>,
    fail_generates: Mutex<u32>,
    fail_completes: Mutex<u32>,
    unload_hook: Mutex<Option<Box<dyn Fn() + Send + Sync>>>,
}

impl MockHost {
    /// Creates a mock host with empty response queues.
    pub fn new() -> Self {
        Self::scripted(Vec::new(), Vec::new())
    }

    /// Creates a mock host pre-loaded with judge answers and generation
    /// replies, each consumed front-to-back.
    pub fn scripted(complete_responses: Vec<String>, generate_responses: Vec<String>) -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            generate_responses: Mutex::new(VecDeque::from(generate_responses)),
            complete_responses: Mutex::new(VecDeque::from(complete_responses)),
            fail_loads: Mutex::new(HashMap::new()),
            fail_unloads: Mutex::new(HashMap::new()),
            fail_generates: Mutex::new(0),
            fail_completes: Mutex::new(0),
            unload_hook: Mutex::new(None),
        }
    }

    /// Queues another judge answer.
    pub async fn queue_complete_response(&self, text: impl Into<String>) {
        self.complete_responses.lock().await.push_back(text.into());
    }

    /// Queues another generation reply.
    pub async fn queue_generate_response(&self, text: impl Into<String>) {
        self.generate_responses.lock().await.push_back(text.into());
    }

    /// Makes the next `times` loads of `model` fail.
    pub async fn fail_next_loads(&self, model: &str, times: u32) {
        self.fail_loads.lock().await.insert(model.to_string(), times);
    }

    /// Makes the next `times` unloads of `model` fail.
    pub async fn fail_next_unloads(&self, model: &str, times: u32) {
        self.fail_unloads.lock().await.insert(model.to_string(), times);
    }

    /// Makes the next `times` generations fail.
    pub async fn fail_next_generates(&self, times: u32) {
        *self.fail_generates.lock().await = times;
    }

    /// Makes the next `times` completions (judge calls) fail.
    pub async fn fail_next_completes(&self, times: u32) {
        *self.fail_completes.lock().await = times;
    }

    /// Runs `hook` on every unload, before the scripted outcome. Used to
    /// trigger external effects (e.g. cancellation) at a precise point in
    /// the swap sequence.
    pub async fn set_unload_hook(&self, hook: impl Fn() + Send + Sync + 'static) {
        *self.unload_hook.lock().await = Some(Box::new(hook));
    }

    /// Returns every recorded call in invocation order.
    pub async fn calls(&self) -> Vec<HostCall> {
        self.calls.lock().await.clone()
    }

    async fn record(&self, call: HostCall) {
        self.calls.lock().await.push(call);
    }

    /// Decrements a per-model failure countdown, reporting whether this
    /// call should fail.
    async fn should_fail(map: &Mutex<HashMap<String, u32>>, model: &str) -> bool {
        let mut map = map.lock().await;
        match map.get_mut(model) {
            Some(remaining) if *remaining > 0 => {
                *remaining -= 1;
                true
            }
            _ => false,
        }
    }

    async fn should_fail_count(counter: &Mutex<u32>) -> bool {
        let mut counter = counter.lock().await;
        if *counter > 0 {
            *counter -= 1;
            true
        } else {
            false
        }
    }

    fn scripted_failure(operation: &str, model: &str) -> CandorError {
        CandorError::Host {
            message: format!("scripted failure: {operation} {model}"),
            source: None,
        }
    }
}

impl Default for MockHost {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ModelHost for MockHost {
    fn name(&self) -> &str {
        "mock-host"
    }

    async fn load(&self, model: &str) -> Result<(), CandorError> {
        self.record(HostCall::Load(model.to_string())).await;
        if Self::should_fail(&self.fail_loads, model).await {
            return Err(Self::scripted_failure("load", model));
        }
        Ok(())
    }

    async fn unload(&self, model: &str) -> Result<(), CandorError> {
        self.record(HostCall::Unload(model.to_string())).await;
        if let Some(hook) = self.unload_hook.lock().await.as_ref() {
            hook();
        }
        if Self::should_fail(&self.fail_unloads, model).await {
            return Err(Self::scripted_failure("unload", model));
        }
        Ok(())
    }

    async fn generate(
        &self,
        model: &str,
        conversation: &Conversation,
    ) -> Result<String, CandorError> {
        self.record(HostCall::Generate {
            model: model.to_string(),
            turns: conversation.len(),
        })
        .await;
        if Self::should_fail_count(&self.fail_generates).await {
            return Err(Self::scripted_failure("generate", model));
        }
        Ok(self
            .generate_responses
            .lock()
            .await
            .pop_front()
            .unwrap_or_else(|| "mock reply".to_string()))
    }

    async fn complete(&self, model: &str, _prompt: &str) -> Result<String, CandorError> {
        self.record(HostCall::Complete {
            model: model.to_string(),
        })
        .await;
        if Self::should_fail_count(&self.fail_completes).await {
            return Err(Self::scripted_failure("complete", model));
        }
        Ok(self
            .complete_responses
            .lock()
            .await
            .pop_front()
            .unwrap_or_else(|| "NO".to_string()))
    }
}
