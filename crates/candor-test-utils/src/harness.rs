// SPDX-FileCopyrightText: 2026 Candor Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test harness wiring a [`RefusalGuard`] to mock collaborators.

use std::sync::Arc;

use candor_config::GuardConfig;
use candor_core::{CandorError, Conversation};
use candor_guard::{GuardedReply, RefusalGuard};

use crate::mock_host::MockHost;
use crate::recording_sink::RecordingSink;

/// Builder for [`GuardHarness`].
pub struct GuardHarnessBuilder {
    verdicts: Vec<String>,
    replies: Vec<String>,
    config: GuardConfig,
}

impl GuardHarnessBuilder {
    fn new() -> Self {
        Self {
            verdicts: Vec::new(),
            replies: Vec::new(),
            config: GuardConfig::default(),
        }
    }

    /// Scripts the judge's raw answers ("YES"/"NO"), consumed in order.
    pub fn with_verdicts(mut self, verdicts: Vec<String>) -> Self {
        self.verdicts = verdicts;
        self
    }

    /// Scripts generation replies, consumed in order across all models.
    pub fn with_replies(mut self, replies: Vec<String>) -> Self {
        self.replies = replies;
        self
    }

    /// Disables the guard.
    pub fn disabled(mut self) -> Self {
        self.config.enabled = false;
        self
    }

    /// Overrides the fallback model identifier.
    pub fn with_fallback_model(mut self, model: impl Into<String>) -> Self {
        self.config.fallback_model = model.into();
        self
    }

    /// Overrides the restore retry count.
    pub fn with_restore_retries(mut self, retries: u32) -> Self {
        self.config.restore_retries = retries;
        self
    }

    /// Builds the harness.
    pub fn build(self) -> GuardHarness {
        let host = Arc::new(MockHost::scripted(self.verdicts, self.replies));
        let sink = Arc::new(RecordingSink::new());
        let guard = RefusalGuard::new(host.clone(), sink.clone(), &self.config);
        GuardHarness { host, sink, guard }
    }
}

/// A [`RefusalGuard`] wired to a [`MockHost`] and a [`RecordingSink`],
/// with both collaborators exposed for assertions.
pub struct GuardHarness {
    pub host: Arc<MockHost>,
    pub sink: Arc<RecordingSink>,
    pub guard: RefusalGuard,
}

impl GuardHarness {
    pub fn builder() -> GuardHarnessBuilder {
        GuardHarnessBuilder::new()
    }

    /// Runs the guard over a conversation ending in an assistant reply.
    pub async fn process(
        &self,
        conversation: Conversation,
        primary_model: &str,
    ) -> Result<GuardedReply, CandorError> {
        self.guard.process(conversation, primary_model).await
    }
}
