// SPDX-FileCopyrightText: 2026 Candor Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Serde wire types for the Ollama HTTP API.

use candor_core::Conversation;
use serde::{Deserialize, Serialize};

/// Keep a model resident indefinitely.
pub const KEEP_ALIVE_RESIDENT: i64 = -1;

/// Evict a model immediately.
pub const KEEP_ALIVE_EVICT: i64 = 0;

/// Request body for `POST /api/generate`.
///
/// Doubles as the load/unload probe: a request with a `keep_alive` value and
/// no prompt makes Ollama (un)load the model without generating anything.
#[derive(Debug, Clone, Serialize)]
pub struct GenerateRequest {
    pub model: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prompt: Option<String>,
    pub stream: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub keep_alive: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub options: Option<GenerateOptions>,
}

impl GenerateRequest {
    /// A promptless probe that only adjusts the model's residency.
    pub fn keep_alive(model: &str, keep_alive: i64) -> Self {
        Self {
            model: model.to_string(),
            prompt: None,
            stream: false,
            keep_alive: Some(keep_alive),
            options: None,
        }
    }

    /// A one-shot completion with explicit sampling options.
    pub fn completion(model: &str, prompt: &str, options: GenerateOptions) -> Self {
        Self {
            model: model.to_string(),
            prompt: Some(prompt.to_string()),
            stream: false,
            keep_alive: None,
            options: Some(options),
        }
    }
}

/// Sampling options for `/api/generate`.
#[derive(Debug, Clone, Serialize)]
pub struct GenerateOptions {
    pub temperature: f32,
    pub num_predict: u32,
}

/// Response body for `POST /api/generate`.
///
/// Residency probes return no `response` field, hence the default.
#[derive(Debug, Clone, Deserialize)]
pub struct GenerateResponse {
    #[serde(default)]
    pub response: String,
}

/// Request body for `POST /api/chat`.
#[derive(Debug, Clone, Serialize)]
pub struct ChatRequest {
    pub model: String,
    pub messages: Vec<ApiChatMessage>,
    pub stream: bool,
}

impl ChatRequest {
    pub fn new(model: &str, conversation: &Conversation) -> Self {
        Self {
            model: model.to_string(),
            messages: conversation
                .turns()
                .iter()
                .map(|turn| ApiChatMessage {
                    role: turn.role.to_string(),
                    content: turn.content.clone(),
                })
                .collect(),
            stream: false,
        }
    }
}

/// One `{role, content}` message on the chat wire.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiChatMessage {
    pub role: String,
    pub content: String,
}

/// Response body for `POST /api/chat`.
#[derive(Debug, Clone, Deserialize)]
pub struct ChatResponse {
    pub message: ChatResponseMessage,
}

/// The assistant message inside a chat response.
#[derive(Debug, Clone, Deserialize)]
pub struct ChatResponseMessage {
    #[serde(default)]
    pub content: String,
}

/// Response body for `GET /api/version`.
#[derive(Debug, Clone, Deserialize)]
pub struct VersionResponse {
    pub version: String,
}

/// Response body for `GET /api/tags`.
#[derive(Debug, Clone, Deserialize)]
pub struct TagsResponse {
    #[serde(default)]
    pub models: Vec<ModelTag>,
}

/// One installed model listed by `/api/tags`.
#[derive(Debug, Clone, Deserialize)]
pub struct ModelTag {
    pub name: String,
}
