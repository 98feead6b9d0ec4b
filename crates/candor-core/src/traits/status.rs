// SPDX-FileCopyrightText: 2026 Candor Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Status sink trait for progress notifications.

use crate::types::StatusEvent;

/// Receives progress notifications from the guard.
///
/// `emit` is fire-and-forget: implementations must not block, and delivery
/// failure must never surface to the caller -- a lost progress line is
/// cosmetic, a stalled swap is not.
pub trait StatusSink: Send + Sync {
    fn emit(&self, event: StatusEvent);
}
