// SPDX-FileCopyrightText: 2026 Candor Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Conversation, verdict, and status types shared across the Candor workspace.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Speaker role for a single conversation turn.
///
/// Serialized lowercase to match the wire format of chat-style model APIs.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

/// One `{role, content}` turn in a conversation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatTurn {
    pub role: Role,
    pub content: String,
}

impl ChatTurn {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

/// An ordered sequence of chat turns.
///
/// Append-only, with one exception: the final assistant turn may be replaced
/// when a refused reply is regenerated. The accessors below keep that
/// replace-not-append discipline in one place.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Conversation {
    turns: Vec<ChatTurn>,
}

impl Conversation {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_turns(turns: Vec<ChatTurn>) -> Self {
        Self { turns }
    }

    pub fn push(&mut self, turn: ChatTurn) {
        self.turns.push(turn);
    }

    pub fn turns(&self) -> &[ChatTurn] {
        &self.turns
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    /// Returns the final turn if it is an assistant turn.
    pub fn final_assistant(&self) -> Option<&ChatTurn> {
        self.turns
            .last()
            .filter(|turn| turn.role == Role::Assistant)
    }

    /// Returns a copy of this conversation with the trailing assistant turn
    /// removed. Used to build the regeneration prompt: the refused reply
    /// must never be part of what the fallback model sees.
    pub fn without_final_assistant(&self) -> Conversation {
        let mut turns = self.turns.clone();
        if turns.last().is_some_and(|t| t.role == Role::Assistant) {
            turns.pop();
        }
        Conversation { turns }
    }

    /// Replaces the content of the trailing assistant turn in place.
    ///
    /// Returns `false` (and leaves the conversation untouched) when the
    /// final turn is not an assistant turn.
    pub fn replace_final_assistant(&mut self, content: impl Into<String>) -> bool {
        match self.turns.last_mut() {
            Some(turn) if turn.role == Role::Assistant => {
                turn.content = content.into();
                true
            }
            _ => false,
        }
    }
}

/// Outcome of a single judge classification. Computed and consumed within
/// one guard invocation, never persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[strum(serialize_all = "snake_case")]
pub enum Verdict {
    Refusal,
    NotRefusal,
}

/// Progress phase attached to a [`StatusEvent`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString)]
#[strum(serialize_all = "lowercase")]
pub enum StatusPhase {
    /// The reply is being judged for a refusal.
    Checking,
    /// A refusal was detected; the fallback model is being swapped in.
    Swapping,
    /// The swap completed and the primary model is restored.
    Done,
    /// A recoverable problem occurred (e.g. the judge was unreachable).
    Warning,
    /// The swap was aborted; the original reply stands.
    Error,
}

/// A human-readable progress notification for an observing UI.
///
/// Ephemeral: created, delivered to a sink, and discarded within a single
/// guard invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusEvent {
    pub phase: StatusPhase,
    pub message: String,
}

impl StatusEvent {
    pub fn new(phase: StatusPhase, message: impl Into<String>) -> Self {
        Self {
            phase,
            message: message.into(),
        }
    }

    pub fn checking(message: impl Into<String>) -> Self {
        Self::new(StatusPhase::Checking, message)
    }

    pub fn swapping(message: impl Into<String>) -> Self {
        Self::new(StatusPhase::Swapping, message)
    }

    pub fn done(message: impl Into<String>) -> Self {
        Self::new(StatusPhase::Done, message)
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Self::new(StatusPhase::Warning, message)
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self::new(StatusPhase::Error, message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&Role::Assistant).unwrap(), "\"assistant\"");
        assert_eq!(serde_json::to_string(&Role::User).unwrap(), "\"user\"");
        let parsed: Role = serde_json::from_str("\"system\"").unwrap();
        assert_eq!(parsed, Role::System);
    }

    #[test]
    fn conversation_serializes_as_plain_array() {
        let conv = Conversation::from_turns(vec![
            ChatTurn::user("hi"),
            ChatTurn::assistant("hello"),
        ]);
        let json = serde_json::to_string(&conv).unwrap();
        assert!(json.starts_with('['), "got: {json}");
        let back: Conversation = serde_json::from_str(&json).unwrap();
        assert_eq!(back, conv);
    }

    #[test]
    fn final_assistant_requires_trailing_assistant_turn() {
        let mut conv = Conversation::new();
        conv.push(ChatTurn::user("hi"));
        assert!(conv.final_assistant().is_none());

        conv.push(ChatTurn::assistant("hello"));
        assert_eq!(conv.final_assistant().unwrap().content, "hello");

        conv.push(ChatTurn::user("more"));
        assert!(conv.final_assistant().is_none());
    }

    #[test]
    fn without_final_assistant_drops_only_the_trailing_reply() {
        let conv = Conversation::from_turns(vec![
            ChatTurn::system("be helpful"),
            ChatTurn::user("hi"),
            ChatTurn::assistant("I cannot help with that."),
        ]);
        let trimmed = conv.without_final_assistant();
        assert_eq!(trimmed.len(), 2);
        assert!(trimmed.final_assistant().is_none());
        // Original is untouched.
        assert_eq!(conv.len(), 3);
    }

    #[test]
    fn without_final_assistant_is_noop_when_last_turn_is_user() {
        let conv = Conversation::from_turns(vec![ChatTurn::user("hi")]);
        assert_eq!(conv.without_final_assistant(), conv);
    }

    #[test]
    fn replace_final_assistant_swaps_content_in_place() {
        let mut conv = Conversation::from_turns(vec![
            ChatTurn::user("hi"),
            ChatTurn::assistant("I cannot help with that."),
        ]);
        assert!(conv.replace_final_assistant("Here is the answer."));
        assert_eq!(conv.len(), 2);
        assert_eq!(conv.final_assistant().unwrap().content, "Here is the answer.");
    }

    #[test]
    fn replace_final_assistant_refuses_non_assistant_tail() {
        let mut conv = Conversation::from_turns(vec![ChatTurn::user("hi")]);
        assert!(!conv.replace_final_assistant("nope"));
        assert_eq!(conv.turns()[0].content, "hi");
    }

    #[test]
    fn status_phase_display() {
        assert_eq!(StatusPhase::Checking.to_string(), "checking");
        assert_eq!(StatusPhase::Swapping.to_string(), "swapping");
        assert_eq!(StatusPhase::Done.to_string(), "done");
        assert_eq!(StatusPhase::Warning.to_string(), "warning");
        assert_eq!(StatusPhase::Error.to_string(), "error");
    }

    #[test]
    fn status_event_constructors_set_phase() {
        assert_eq!(StatusEvent::checking("x").phase, StatusPhase::Checking);
        assert_eq!(StatusEvent::swapping("x").phase, StatusPhase::Swapping);
        assert_eq!(StatusEvent::done("x").phase, StatusPhase::Done);
        assert_eq!(StatusEvent::warning("x").phase, StatusPhase::Warning);
        assert_eq!(StatusEvent::error("x").phase, StatusPhase::Error);
    }

    #[test]
    fn verdict_display() {
        assert_eq!(Verdict::Refusal.to_string(), "refusal");
        assert_eq!(Verdict::NotRefusal.to_string(), "not_refusal");
    }
}
