// SPDX-FileCopyrightText: 2026 Candor Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Status sink that captures events for assertions.

use std::sync::Mutex;

use candor_core::{StatusEvent, StatusPhase, StatusSink};

/// Collects every emitted status event in order.
#[derive(Default)]
pub struct RecordingSink {
    events: Mutex<Vec<StatusEvent>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns all captured events in emission order.
    pub fn events(&self) -> Vec<StatusEvent> {
        self.events.lock().unwrap().clone()
    }

    /// Returns just the phases, the usual thing tests assert on.
    pub fn phases(&self) -> Vec<StatusPhase> {
        self.events.lock().unwrap().iter().map(|e| e.phase).collect()
    }
}

impl StatusSink for RecordingSink {
    fn emit(&self, event: StatusEvent) {
        self.events.lock().unwrap().push(event);
    }
}
