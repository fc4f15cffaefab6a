// SPDX-FileCopyrightText: 2026 Chatline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Registry of live relay sessions.
//!
//! A new session is seeded with a bootstrap of the active view while the
//! registry lock is held, so no broadcast can slip in between the snapshot
//! and registration. A message may therefore show up both in the snapshot
//! and as a live event, but it is never missed.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use chatline_core::types::RelayEvent;
use chatline_core::{RelaySink, ViewProvider};
use tracing::{debug, info};
use uuid::Uuid;

use crate::session::{RelaySession, SessionSlot, SessionState};

pub struct RelayHub {
    sessions: Mutex<HashMap<Uuid, SessionSlot>>,
    warn_threshold: usize,
}

impl RelayHub {
    /// `warn_threshold` is the per-session queue depth that triggers a warning.
    pub fn new(warn_threshold: usize) -> Self {
        Self {
            sessions: Mutex::new(HashMap::new()),
            warn_threshold,
        }
    }

    /// Registers a session and queues its bootstrap: the active view's
    /// messages, the active view name, then the list of views.
    pub fn open(&self, views: &dyn ViewProvider) -> RelaySession {
        let (slot, mut session) = RelaySession::pair(self.warn_threshold);
        let id = session.id();

        let mut sessions = self.lock();
        // always three events; an empty name means no view is active
        let bootstrap = [
            RelayEvent::NewMessage {
                messages: views.active_messages(),
            },
            RelayEvent::SwitchChannel {
                channel_name: views.active_view_name().unwrap_or_default(),
            },
            RelayEvent::ChannelList {
                channels: views.available_views(),
            },
        ];
        for event in bootstrap {
            slot.push(id, event, self.warn_threshold);
        }
        sessions.insert(id, slot);
        drop(sessions);

        session.mark(SessionState::Open);
        info!(session = %id, "relay session opened");
        session
    }

    /// Unregisters a session. Anything still queued is discarded.
    pub fn close(&self, session: &mut RelaySession) {
        if self.lock().remove(&session.id()).is_some() {
            info!(session = %session.id(), "relay session closed");
        }
        session.mark(SessionState::Closed);
    }

    pub fn session_count(&self) -> usize {
        self.lock().len()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<Uuid, SessionSlot>> {
        self.sessions.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl RelaySink for RelayHub {
    fn broadcast(&self, event: RelayEvent) {
        let mut sessions = self.lock();
        sessions.retain(|id, slot| {
            let alive = slot.push(*id, event.clone(), self.warn_threshold);
            if !alive {
                debug!(session = %id, "dropping relay session with no receiver");
            }
            alive
        });
    }
}
