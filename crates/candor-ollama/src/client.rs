// SPDX-FileCopyrightText: 2026 Candor Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP client for the Ollama API implementing [`ModelHost`].
//!
//! Model residency is driven through promptless `/api/generate` requests:
//! `keep_alive: -1` pins a model in memory, `keep_alive: 0` evicts it.
//! Chat generation uses `/api/chat`, judge completions use `/api/generate`
//! with deterministic sampling. Transient errors (429, 500, 503) are
//! retried once after a short delay.

use std::time::Duration;

use async_trait::async_trait;
use candor_config::HostConfig;
use candor_core::{CandorError, Conversation, ModelHost};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, warn};

use crate::types::{
    ChatRequest, ChatResponse, GenerateOptions, GenerateRequest, GenerateResponse, TagsResponse,
    VersionResponse, KEEP_ALIVE_EVICT, KEEP_ALIVE_RESIDENT,
};

/// Delay between retry attempts on transient errors.
const RETRY_DELAY: Duration = Duration::from_secs(1);

/// Sampling options for judge-style completions: greedy decoding, a
/// handful of tokens. We only ever need a one-word answer.
const COMPLETION_OPTIONS: GenerateOptions = GenerateOptions {
    temperature: 0.0,
    num_predict: 10,
};

/// HTTP client for an Ollama instance.
///
/// Manages connection pooling, per-request timeouts, and retry logic for
/// transient errors.
#[derive(Debug, Clone)]
pub struct OllamaHost {
    client: reqwest::Client,
    base_url: String,
    timeout: Duration,
    max_retries: u32,
}

impl OllamaHost {
    /// Creates a new client for the Ollama API at `base_url`.
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, CandorError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| CandorError::Host {
                message: format!("failed to build HTTP client: {e}"),
                source: Some(Box::new(e)),
            })?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            timeout,
            max_retries: 1,
        })
    }

    /// Creates a client from the `[host]` config section.
    pub fn from_config(config: &HostConfig) -> Result<Self, CandorError> {
        Self::new(&config.base_url, Duration::from_secs(config.timeout_secs))
    }

    /// Returns the configured base URL.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Checks host reachability and returns the server version.
    pub async fn ping(&self) -> Result<String, CandorError> {
        let version: VersionResponse = self.get_json("/api/version").await?;
        Ok(version.version)
    }

    /// Lists the names of models installed on the host.
    pub async fn list_models(&self) -> Result<Vec<String>, CandorError> {
        let tags: TagsResponse = self.get_json("/api/tags").await?;
        Ok(tags.models.into_iter().map(|m| m.name).collect())
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    /// Sends a POST request, retrying once on transient statuses.
    async fn post_json<B, T>(&self, path: &str, body: &B) -> Result<T, CandorError>
    where
        B: Serialize + Sync,
        T: DeserializeOwned,
    {
        let url = self.endpoint(path);
        let mut last_error = None;

        for attempt in 0..=self.max_retries {
            if attempt > 0 {
                warn!(attempt, path, "retrying host request after transient error");
                tokio::time::sleep(RETRY_DELAY).await;
            }

            let response = self
                .client
                .post(&url)
                .json(body)
                .send()
                .await
                .map_err(|e| self.map_request_error(e))?;

            let status = response.status();
            debug!(status = %status, attempt, path, "host response received");

            if status.is_success() {
                let body = response.text().await.map_err(|e| CandorError::Host {
                    message: format!("failed to read response body: {e}"),
                    source: Some(Box::new(e)),
                })?;
                return serde_json::from_str(&body).map_err(|e| CandorError::Host {
                    message: format!("failed to parse host response: {e}"),
                    source: Some(Box::new(e)),
                });
            }

            let body = response.text().await.unwrap_or_default();
            if is_transient_error(status) && attempt < self.max_retries {
                warn!(status = %status, body = %body, "transient host error, will retry");
                last_error = Some(CandorError::Host {
                    message: format!("host returned {status}: {body}"),
                    source: None,
                });
                continue;
            }

            return Err(CandorError::Host {
                message: format!("host returned {status}: {body}"),
                source: None,
            });
        }

        Err(last_error.unwrap_or_else(|| CandorError::Host {
            message: "host request failed after retries".into(),
            source: None,
        }))
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, CandorError> {
        let response = self
            .client
            .get(self.endpoint(path))
            .send()
            .await
            .map_err(|e| self.map_request_error(e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(CandorError::Host {
                message: format!("host returned {status}: {body}"),
                source: None,
            });
        }

        response.json().await.map_err(|e| CandorError::Host {
            message: format!("failed to parse host response: {e}"),
            source: Some(Box::new(e)),
        })
    }

    fn map_request_error(&self, err: reqwest::Error) -> CandorError {
        if err.is_timeout() {
            CandorError::Timeout {
                duration: self.timeout,
            }
        } else {
            CandorError::Host {
                message: format!("HTTP request failed: {err}"),
                source: Some(Box::new(err)),
            }
        }
    }
}

#[async_trait]
impl ModelHost for OllamaHost {
    fn name(&self) -> &str {
        "ollama"
    }

    async fn load(&self, model: &str) -> Result<(), CandorError> {
        debug!(model, "loading model into host memory");
        let _: GenerateResponse = self
            .post_json(
                "/api/generate",
                &GenerateRequest::keep_alive(model, KEEP_ALIVE_RESIDENT),
            )
            .await?;
        Ok(())
    }

    async fn unload(&self, model: &str) -> Result<(), CandorError> {
        debug!(model, "evicting model from host memory");
        let _: GenerateResponse = self
            .post_json(
                "/api/generate",
                &GenerateRequest::keep_alive(model, KEEP_ALIVE_EVICT),
            )
            .await?;
        Ok(())
    }

    async fn generate(
        &self,
        model: &str,
        conversation: &Conversation,
    ) -> Result<String, CandorError> {
        debug!(model, turns = conversation.len(), "requesting chat completion");
        let response: ChatResponse = self
            .post_json("/api/chat", &ChatRequest::new(model, conversation))
            .await?;
        Ok(response.message.content)
    }

    async fn complete(&self, model: &str, prompt: &str) -> Result<String, CandorError> {
        debug!(model, "requesting one-shot completion");
        let response: GenerateResponse = self
            .post_json(
                "/api/generate",
                &GenerateRequest::completion(model, prompt, COMPLETION_OPTIONS),
            )
            .await?;
        Ok(response.response)
    }
}

/// Returns true for HTTP status codes that indicate transient errors worth retrying.
fn is_transient_error(status: reqwest::StatusCode) -> bool {
    matches!(status.as_u16(), 429 | 500 | 503)
}
