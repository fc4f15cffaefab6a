// SPDX-FileCopyrightText: 2026 Chatline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! One relay subscriber and its outbound queue.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use chatline_core::types::RelayEvent;
use tokio::sync::mpsc;
use tracing::{debug, warn};
use uuid::Uuid;

/// Lifecycle of a relay session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
#[strum(serialize_all = "snake_case")]
pub enum SessionState {
    Connecting,
    Open,
    Closed,
}

/// Queue depth shared between the registry slot and the session.
#[derive(Debug, Default)]
pub(crate) struct QueueDepth {
    depth: AtomicUsize,
    over_threshold: AtomicBool,
}

impl QueueDepth {
    fn pushed(&self, session: Uuid, threshold: usize) {
        let depth = self.depth.fetch_add(1, Ordering::Relaxed) + 1;
        if depth >= threshold && !self.over_threshold.swap(true, Ordering::Relaxed) {
            warn!(%session, depth, threshold, "relay session is falling behind");
        }
    }

    fn popped(&self, threshold: usize) {
        let depth = self.depth.fetch_sub(1, Ordering::Relaxed).saturating_sub(1);
        if depth < threshold {
            self.over_threshold.store(false, Ordering::Relaxed);
        }
    }

    fn get(&self) -> usize {
        self.depth.load(Ordering::Relaxed)
    }
}

/// The registry's end of a session.
#[derive(Debug)]
pub(crate) struct SessionSlot {
    tx: mpsc::UnboundedSender<RelayEvent>,
    depth: Arc<QueueDepth>,
}

impl SessionSlot {
    /// Enqueues an event. Fails once the session end has been dropped.
    pub(crate) fn push(&self, id: Uuid, event: RelayEvent, threshold: usize) -> bool {
        if self.tx.send(event).is_err() {
            return false;
        }
        self.depth.pushed(id, threshold);
        true
    }
}

/// The subscriber's end of a session: events come out in enqueue order.
#[derive(Debug)]
pub struct RelaySession {
    id: Uuid,
    state: SessionState,
    rx: mpsc::UnboundedReceiver<RelayEvent>,
    depth: Arc<QueueDepth>,
    warn_threshold: usize,
}

impl RelaySession {
    pub(crate) fn pair(warn_threshold: usize) -> (SessionSlot, RelaySession) {
        let (tx, rx) = mpsc::unbounded_channel();
        let depth = Arc::new(QueueDepth::default());
        let slot = SessionSlot {
            tx,
            depth: depth.clone(),
        };
        let session = RelaySession {
            id: Uuid::new_v4(),
            state: SessionState::Connecting,
            rx,
            depth,
            warn_threshold,
        };
        (slot, session)
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Events waiting to be written.
    pub fn queued(&self) -> usize {
        self.depth.get()
    }

    pub(crate) fn mark(&mut self, state: SessionState) {
        debug!(session = %self.id, from = %self.state, to = %state, "relay session state");
        self.state = state;
    }

    /// Waits for the next event. `None` once the session is closed.
    pub async fn recv(&mut self) -> Option<RelayEvent> {
        if self.state == SessionState::Closed {
            return None;
        }
        let event = self.rx.recv().await?;
        self.depth.popped(self.warn_threshold);
        Some(event)
    }

    pub fn try_recv(&mut self) -> Option<RelayEvent> {
        if self.state == SessionState::Closed {
            return None;
        }
        let event = self.rx.try_recv().ok()?;
        self.depth.popped(self.warn_threshold);
        Some(event)
    }
}
