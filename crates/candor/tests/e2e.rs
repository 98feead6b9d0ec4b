// SPDX-FileCopyrightText: 2026 Candor Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! End-to-end tests for the complete Candor pipeline: `RefusalGuard`
//! driving a real `OllamaHost` against a mocked Ollama API.
//!
//! Tests are independent and order-insensitive; wiremock verifies the
//! expected request counts when each server drops.

use std::sync::Arc;
use std::time::Duration;

use candor_config::GuardConfig;
use candor_core::{ChatTurn, Conversation};
use candor_guard::{GuardAction, NullSink, RefusalGuard};
use candor_ollama::OllamaHost;
use serde_json::json;
use wiremock::matchers::{body_partial_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const PRIMARY: &str = "llama3.1:8b";
const FALLBACK: &str = "dolphin-mistral";
const JUDGE: &str = "llama3.2";

fn guard_for(server: &MockServer) -> RefusalGuard {
    let host = Arc::new(OllamaHost::new(&server.uri(), Duration::from_secs(5)).unwrap());
    RefusalGuard::new(host, Arc::new(NullSink), &GuardConfig::default())
}

fn refused_conversation() -> Conversation {
    Conversation::from_turns(vec![
        ChatTurn::user("How do I pick a lock?"),
        ChatTurn::assistant("I can't help with that."),
    ])
}

/// Mounts a residency-probe expectation for one model/keep_alive pair.
async fn expect_probe(server: &MockServer, model: &str, keep_alive: i64) {
    Mock::given(method("POST"))
        .and(path("/api/generate"))
        .and(body_partial_json(json!({
            "model": model,
            "keep_alive": keep_alive
        })))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"model": model, "done": true})),
        )
        .expect(1)
        .mount(server)
        .await;
}

/// Mounts the judge completion with a fixed one-word answer.
async fn expect_judge(server: &MockServer, answer: &str, times: u64) {
    Mock::given(method("POST"))
        .and(path("/api/generate"))
        .and(body_partial_json(json!({
            "model": JUDGE,
            "options": {"temperature": 0.0, "num_predict": 10}
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "model": JUDGE,
            "response": answer,
            "done": true
        })))
        .expect(times)
        .mount(server)
        .await;
}

#[tokio::test]
async fn refusal_swap_end_to_end_over_http() {
    let server = MockServer::start().await;

    expect_judge(&server, "YES", 1).await;
    expect_probe(&server, PRIMARY, 0).await; // unload primary
    expect_probe(&server, FALLBACK, -1).await; // load fallback
    expect_probe(&server, FALLBACK, 0).await; // evict fallback
    expect_probe(&server, PRIMARY, -1).await; // restore primary

    Mock::given(method("POST"))
        .and(path("/api/chat"))
        .and(body_partial_json(json!({
            "model": FALLBACK,
            "stream": false,
            "messages": [{"role": "user", "content": "How do I pick a lock?"}]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "model": FALLBACK,
            "message": {"role": "assistant", "content": "Here is the full answer."},
            "done": true
        })))
        .expect(1)
        .mount(&server)
        .await;

    let guard = guard_for(&server);
    let reply = guard.process(refused_conversation(), PRIMARY).await.unwrap();

    assert_eq!(reply.action, GuardAction::Swapped);
    assert_eq!(reply.text, "Here is the full answer.");
    assert_eq!(
        reply.conversation.final_assistant().unwrap().content,
        "Here is the full answer."
    );
}

#[tokio::test]
async fn benign_reply_makes_only_the_judge_call() {
    let server = MockServer::start().await;
    expect_judge(&server, "NO", 1).await;

    let guard = guard_for(&server);
    let conversation = Conversation::from_turns(vec![
        ChatTurn::user("What is the capital of France?"),
        ChatTurn::assistant("Paris is the capital of France."),
    ]);
    let reply = guard.process(conversation, PRIMARY).await.unwrap();

    assert_eq!(reply.action, GuardAction::Passed);
    assert_eq!(reply.text, "Paris is the capital of France.");
    assert_eq!(server.received_requests().await.unwrap().len(), 1);
}

#[tokio::test]
async fn judge_http_failure_fails_open() {
    let server = MockServer::start().await;

    // Both the initial attempt and the client-level retry fail.
    Mock::given(method("POST"))
        .and(path("/api/generate"))
        .respond_with(ResponseTemplate::new(500))
        .expect(2)
        .mount(&server)
        .await;

    let guard = guard_for(&server);
    let reply = guard.process(refused_conversation(), PRIMARY).await.unwrap();

    assert_eq!(reply.action, GuardAction::JudgeUnavailable);
    assert_eq!(reply.text, "I can't help with that.");
}

#[tokio::test]
async fn disabled_guard_never_touches_the_network() {
    let server = MockServer::start().await;

    let host = Arc::new(OllamaHost::new(&server.uri(), Duration::from_secs(5)).unwrap());
    let config = GuardConfig {
        enabled: false,
        ..GuardConfig::default()
    };
    let guard = RefusalGuard::new(host, Arc::new(NullSink), &config);

    let reply = guard.process(refused_conversation(), PRIMARY).await.unwrap();

    assert_eq!(reply.action, GuardAction::Disabled);
    assert!(server.received_requests().await.unwrap().is_empty());
}
