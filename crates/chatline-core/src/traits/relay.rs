// SPDX-FileCopyrightText: 2026 Chatline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use crate::types::RelayEvent;

/// Receiver of live events for remote subscribers.
///
/// `broadcast` is called from the worker thread and must never block on
/// subscriber I/O.
pub trait RelaySink: Send + Sync {
    fn broadcast(&self, event: RelayEvent);
}
