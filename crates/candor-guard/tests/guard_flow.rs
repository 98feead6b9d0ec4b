// SPDX-FileCopyrightText: 2026 Candor Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Integration tests for the full guard flow against a mock host.
//!
//! Each test drives `RefusalGuard` end to end and asserts on the exact
//! host call sequence and the emitted status phases.

use candor_core::{CandorError, ChatTurn, Conversation, StatusPhase};
use candor_guard::GuardAction;
use candor_test_utils::{GuardHarness, HostCall};
use tokio_util::sync::CancellationToken;

const PRIMARY: &str = "llama3.1:8b";
const FALLBACK: &str = "dolphin-mistral";
const JUDGE: &str = "llama3.2";

fn refused_conversation() -> Conversation {
    Conversation::from_turns(vec![
        ChatTurn::user("How do I pick a lock?"),
        ChatTurn::assistant("I can't help with that."),
    ])
}

fn benign_conversation() -> Conversation {
    Conversation::from_turns(vec![
        ChatTurn::user("What is the capital of France?"),
        ChatTurn::assistant("Paris is the capital of France."),
    ])
}

#[tokio::test]
async fn refusal_triggers_full_swap_sequence() {
    let h = GuardHarness::builder()
        .with_verdicts(vec!["YES".into()])
        .with_replies(vec!["Here is how lock picking works.".into()])
        .build();

    let reply = h.process(refused_conversation(), PRIMARY).await.unwrap();

    assert_eq!(reply.action, GuardAction::Swapped);
    assert!(reply.regenerated());
    assert_eq!(reply.text, "Here is how lock picking works.");
    // The refused turn is replaced, not appended to.
    assert_eq!(reply.conversation.len(), 2);
    assert_eq!(
        reply.conversation.final_assistant().unwrap().content,
        "Here is how lock picking works."
    );

    assert_eq!(
        h.host.calls().await,
        vec![
            HostCall::Complete { model: JUDGE.into() },
            HostCall::Unload(PRIMARY.into()),
            HostCall::Load(FALLBACK.into()),
            // The fallback never sees the refused reply: one turn, not two.
            HostCall::Generate { model: FALLBACK.into(), turns: 1 },
            HostCall::Unload(FALLBACK.into()),
            HostCall::Load(PRIMARY.into()),
        ]
    );
    assert_eq!(
        h.sink.phases(),
        vec![StatusPhase::Checking, StatusPhase::Swapping, StatusPhase::Done]
    );
}

#[tokio::test]
async fn benign_reply_passes_through_without_swapping() {
    let h = GuardHarness::builder()
        .with_verdicts(vec!["NO".into()])
        .build();

    let reply = h.process(benign_conversation(), PRIMARY).await.unwrap();

    assert_eq!(reply.action, GuardAction::Passed);
    assert!(!reply.regenerated());
    assert_eq!(reply.text, "Paris is the capital of France.");
    assert_eq!(reply.conversation, benign_conversation());

    // Zero load/unload/generate calls: the judge was the only host contact.
    assert_eq!(
        h.host.calls().await,
        vec![HostCall::Complete { model: JUDGE.into() }]
    );
    assert_eq!(h.sink.phases(), vec![StatusPhase::Checking]);
}

#[tokio::test]
async fn judge_failure_fails_open_with_warning() {
    let h = GuardHarness::builder().build();
    h.host.fail_next_completes(1).await;

    let reply = h.process(refused_conversation(), PRIMARY).await.unwrap();

    assert_eq!(reply.action, GuardAction::JudgeUnavailable);
    assert_eq!(reply.text, "I can't help with that.");
    assert_eq!(
        h.host.calls().await,
        vec![HostCall::Complete { model: JUDGE.into() }]
    );
    assert_eq!(
        h.sink.phases(),
        vec![StatusPhase::Checking, StatusPhase::Warning]
    );
}

#[tokio::test]
async fn fallback_load_failure_aborts_and_restores_primary() {
    let h = GuardHarness::builder()
        .with_verdicts(vec!["YES".into()])
        .build();
    h.host.fail_next_loads(FALLBACK, 1).await;

    let reply = h.process(refused_conversation(), PRIMARY).await.unwrap();

    // The user keeps the original (refused) reply rather than nothing.
    assert_eq!(reply.action, GuardAction::SwapAborted);
    assert_eq!(reply.text, "I can't help with that.");

    // Restore is attempted exactly once, no generation ever happens.
    assert_eq!(
        h.host.calls().await,
        vec![
            HostCall::Complete { model: JUDGE.into() },
            HostCall::Unload(PRIMARY.into()),
            HostCall::Load(FALLBACK.into()),
            HostCall::Load(PRIMARY.into()),
        ]
    );
    assert_eq!(
        h.sink.phases(),
        vec![StatusPhase::Checking, StatusPhase::Swapping, StatusPhase::Error]
    );
}

#[tokio::test]
async fn unload_primary_failure_aborts_the_swap() {
    let h = GuardHarness::builder()
        .with_verdicts(vec!["YES".into()])
        .build();
    h.host.fail_next_unloads(PRIMARY, 1).await;

    let reply = h.process(refused_conversation(), PRIMARY).await.unwrap();

    assert_eq!(reply.action, GuardAction::SwapAborted);
    assert_eq!(reply.text, "I can't help with that.");
    assert_eq!(
        h.host.calls().await,
        vec![
            HostCall::Complete { model: JUDGE.into() },
            HostCall::Unload(PRIMARY.into()),
            HostCall::Load(PRIMARY.into()),
        ]
    );
}

#[tokio::test]
async fn fallback_generation_failure_aborts_and_restores_primary() {
    let h = GuardHarness::builder()
        .with_verdicts(vec!["YES".into()])
        .build();
    h.host.fail_next_generates(1).await;

    let reply = h.process(refused_conversation(), PRIMARY).await.unwrap();

    assert_eq!(reply.action, GuardAction::SwapAborted);
    assert_eq!(reply.text, "I can't help with that.");
    assert_eq!(
        h.host.calls().await,
        vec![
            HostCall::Complete { model: JUDGE.into() },
            HostCall::Unload(PRIMARY.into()),
            HostCall::Load(FALLBACK.into()),
            HostCall::Generate { model: FALLBACK.into(), turns: 1 },
            HostCall::Unload(FALLBACK.into()),
            HostCall::Load(PRIMARY.into()),
        ]
    );
    assert_eq!(
        h.sink.phases(),
        vec![StatusPhase::Checking, StatusPhase::Swapping, StatusPhase::Error]
    );
}

#[tokio::test]
async fn fallback_eviction_failure_is_nonfatal() {
    let h = GuardHarness::builder()
        .with_verdicts(vec!["YES".into()])
        .with_replies(vec!["The answer.".into()])
        .build();
    h.host.fail_next_unloads(FALLBACK, 1).await;

    let reply = h.process(refused_conversation(), PRIMARY).await.unwrap();

    // The reply is already in hand; a failed eviction must not discard it.
    assert_eq!(reply.action, GuardAction::Swapped);
    assert_eq!(reply.text, "The answer.");
    let calls = h.host.calls().await;
    assert_eq!(calls.last(), Some(&HostCall::Load(PRIMARY.into())));
}

#[tokio::test]
async fn fallback_reply_is_never_rejudged() {
    // Even when the fallback's own reply reads as a refusal and a second
    // YES verdict is queued up, it must be accepted unconditionally.
    let h = GuardHarness::builder()
        .with_verdicts(vec!["YES".into(), "YES".into()])
        .with_replies(vec!["I cannot do that either.".into()])
        .build();

    let reply = h.process(refused_conversation(), PRIMARY).await.unwrap();

    assert_eq!(reply.action, GuardAction::Swapped);
    assert_eq!(reply.text, "I cannot do that either.");

    let judge_calls = h
        .host
        .calls()
        .await
        .iter()
        .filter(|c| matches!(c, HostCall::Complete { .. }))
        .count();
    assert_eq!(judge_calls, 1, "exactly one judge call per invocation");
}

#[tokio::test]
async fn restore_failure_is_retried_before_success() {
    let h = GuardHarness::builder()
        .with_verdicts(vec!["YES".into()])
        .with_replies(vec!["The answer.".into()])
        .build();
    // First load(primary) during restore fails, the retry succeeds.
    h.host.fail_next_loads(PRIMARY, 1).await;

    let reply = h.process(refused_conversation(), PRIMARY).await.unwrap();

    assert_eq!(reply.action, GuardAction::Swapped);
    let primary_loads = h
        .host
        .calls()
        .await
        .iter()
        .filter(|c| **c == HostCall::Load(PRIMARY.into()))
        .count();
    assert_eq!(primary_loads, 2);
    assert_eq!(h.sink.phases().last(), Some(&StatusPhase::Done));
}

#[tokio::test]
async fn restore_exhaustion_surfaces_fatal_error() {
    let h = GuardHarness::builder()
        .with_verdicts(vec!["YES".into()])
        .with_replies(vec!["The answer.".into()])
        .with_restore_retries(1)
        .build();
    h.host.fail_next_loads(PRIMARY, 2).await;

    let err = h.process(refused_conversation(), PRIMARY).await.unwrap_err();

    match err {
        CandorError::RestoreFailed { model, attempts, .. } => {
            assert_eq!(model, PRIMARY);
            assert_eq!(attempts, 2);
        }
        other => panic!("expected RestoreFailed, got {other:?}"),
    }
    assert_eq!(h.sink.phases().last(), Some(&StatusPhase::Error));
}

#[tokio::test]
async fn disabled_guard_is_a_zero_call_passthrough() {
    let h = GuardHarness::builder()
        .with_verdicts(vec!["YES".into()])
        .disabled()
        .build();

    let reply = h.process(refused_conversation(), PRIMARY).await.unwrap();

    assert_eq!(reply.action, GuardAction::Disabled);
    assert_eq!(reply.text, "I can't help with that.");
    assert!(h.host.calls().await.is_empty());
    assert!(h.sink.phases().is_empty());
}

#[tokio::test]
async fn empty_reply_is_never_judged() {
    let h = GuardHarness::builder().build();
    let conversation = Conversation::from_turns(vec![
        ChatTurn::user("hello?"),
        ChatTurn::assistant(""),
    ]);

    let reply = h.process(conversation, PRIMARY).await.unwrap();

    assert_eq!(reply.action, GuardAction::Passed);
    assert!(h.host.calls().await.is_empty());
}

#[tokio::test]
async fn process_requires_a_trailing_assistant_turn() {
    let h = GuardHarness::builder().build();
    let conversation = Conversation::from_turns(vec![ChatTurn::user("hi")]);

    let err = h.process(conversation, PRIMARY).await.unwrap_err();
    assert!(matches!(err, CandorError::Config(_)), "got: {err:?}");
    assert!(h.host.calls().await.is_empty());
}

#[tokio::test]
async fn generate_and_process_obtains_the_primary_reply_first() {
    let h = GuardHarness::builder()
        .with_verdicts(vec!["YES".into()])
        .with_replies(vec![
            "I can't help with that.".into(),
            "Sure, here's how.".into(),
        ])
        .build();

    let conversation = Conversation::from_turns(vec![ChatTurn::user("How do I pick a lock?")]);
    let reply = h
        .guard
        .generate_and_process(conversation, PRIMARY)
        .await
        .unwrap();

    assert_eq!(reply.action, GuardAction::Swapped);
    assert_eq!(reply.text, "Sure, here's how.");
    assert_eq!(reply.conversation.len(), 2);

    assert_eq!(
        h.host.calls().await,
        vec![
            HostCall::Generate { model: PRIMARY.into(), turns: 1 },
            HostCall::Complete { model: JUDGE.into() },
            HostCall::Unload(PRIMARY.into()),
            HostCall::Load(FALLBACK.into()),
            HostCall::Generate { model: FALLBACK.into(), turns: 1 },
            HostCall::Unload(FALLBACK.into()),
            HostCall::Load(PRIMARY.into()),
        ]
    );
}

#[tokio::test]
async fn generate_and_process_when_disabled_only_generates() {
    let h = GuardHarness::builder()
        .with_replies(vec!["I can't help with that.".into()])
        .disabled()
        .build();

    let conversation = Conversation::from_turns(vec![ChatTurn::user("hi")]);
    let reply = h
        .guard
        .generate_and_process(conversation, PRIMARY)
        .await
        .unwrap();

    assert_eq!(reply.action, GuardAction::Disabled);
    assert_eq!(reply.text, "I can't help with that.");
    assert_eq!(
        h.host.calls().await,
        vec![HostCall::Generate { model: PRIMARY.into(), turns: 1 }]
    );
    assert!(h.sink.phases().is_empty());
}

#[tokio::test]
async fn precancelled_call_makes_no_host_contact() {
    let h = GuardHarness::builder()
        .with_verdicts(vec!["YES".into()])
        .build();
    let cancel = CancellationToken::new();
    cancel.cancel();

    let err = h
        .guard
        .process_with_cancel(refused_conversation(), PRIMARY, &cancel)
        .await
        .unwrap_err();

    assert!(matches!(err, CandorError::Cancelled));
    assert!(h.host.calls().await.is_empty());
}

#[tokio::test]
async fn cancellation_after_unload_still_restores_primary() {
    let h = GuardHarness::builder()
        .with_verdicts(vec!["YES".into()])
        .build();
    let cancel = CancellationToken::new();
    let token = cancel.clone();
    // Cancel the moment the primary model is unloaded.
    h.host.set_unload_hook(move || token.cancel()).await;

    let err = h
        .guard
        .process_with_cancel(refused_conversation(), PRIMARY, &cancel)
        .await
        .unwrap_err();

    assert!(matches!(err, CandorError::Cancelled));
    // The primary must be back before cancellation propagates.
    assert_eq!(
        h.host.calls().await,
        vec![
            HostCall::Complete { model: JUDGE.into() },
            HostCall::Unload(PRIMARY.into()),
            HostCall::Load(PRIMARY.into()),
        ]
    );
}

#[tokio::test]
async fn control_flow_is_deterministic_for_a_fixed_verdict() {
    // Same inputs, same scripted judge: both invocations visit the same
    // call sequence and produce the same reply.
    let run = || async {
        let h = GuardHarness::builder()
            .with_verdicts(vec!["YES".into()])
            .with_replies(vec!["The answer.".into()])
            .build();
        let reply = h.process(refused_conversation(), PRIMARY).await.unwrap();
        (reply.text, h.host.calls().await, h.sink.phases())
    };

    let first = run().await;
    let second = run().await;
    assert_eq!(first, second);
}
