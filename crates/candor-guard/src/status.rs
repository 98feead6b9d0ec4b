// SPDX-FileCopyrightText: 2026 Candor Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! [`StatusSink`] implementations.
//!
//! All sinks honor the fire-and-forget contract: `emit` never blocks and
//! never reports failure back to the state machine.

use candor_core::{StatusEvent, StatusPhase, StatusSink};
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

/// Logs status events through `tracing`.
pub struct TracingSink;

impl StatusSink for TracingSink {
    fn emit(&self, event: StatusEvent) {
        match event.phase {
            StatusPhase::Warning => warn!(phase = %event.phase, "{}", event.message),
            StatusPhase::Error => error!(phase = %event.phase, "{}", event.message),
            _ => info!(phase = %event.phase, "{}", event.message),
        }
    }
}

/// Forwards status events over an unbounded channel to an observing task
/// (typically a UI). A dropped receiver silently discards events.
pub struct ChannelSink {
    tx: mpsc::UnboundedSender<StatusEvent>,
}

impl ChannelSink {
    /// Creates a sink and the receiver that drains it.
    pub fn new() -> (Self, mpsc::UnboundedReceiver<StatusEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

impl StatusSink for ChannelSink {
    fn emit(&self, event: StatusEvent) {
        if self.tx.send(event).is_err() {
            debug!("status receiver dropped, event discarded");
        }
    }
}

/// Discards every event.
pub struct NullSink;

impl StatusSink for NullSink {
    fn emit(&self, _event: StatusEvent) {}
}
