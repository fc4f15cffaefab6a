// SPDX-FileCopyrightText: 2026 Chatline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use std::sync::Mutex;

use chatline_core::types::RelayEvent;
use chatline_core::RelaySink;

use crate::lock;

/// Keeps every broadcast event for later assertions.
#[derive(Debug, Default)]
pub struct RecordingSink {
    events: Mutex<Vec<RelayEvent>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<RelayEvent> {
        lock(&self.events).clone()
    }

    pub fn kinds(&self) -> Vec<&'static str> {
        lock(&self.events).iter().map(RelayEvent::kind).collect()
    }

    pub fn clear(&self) {
        lock(&self.events).clear();
    }
}

impl RelaySink for RecordingSink {
    fn broadcast(&self, event: RelayEvent) {
        lock(&self.events).push(event);
    }
}
