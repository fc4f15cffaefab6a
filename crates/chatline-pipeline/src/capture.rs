// SPDX-FileCopyrightText: 2026 Chatline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Capture and identity resolution, both on the host control thread.
//!
//! The host can only resolve a sender's identity one tick after the line
//! shows up in its log. [`CaptureStage::capture`] therefore only records the
//! line and its log position; [`CaptureStage::resolve`] runs on the next tick,
//! looks identities up and forwards everything to the worker queue. Every
//! line takes the same path so relative order is never disturbed.

use std::collections::VecDeque;
use std::sync::Arc;

use chatline_core::types::{PendingMessage, RawEvent};
use chatline_core::HostClient;
use tokio::sync::mpsc;
use tracing::{debug, warn};

/// Sending half of the worker queue.
pub type PendingSender = mpsc::UnboundedSender<PendingMessage>;
/// Receiving half of the worker queue.
pub type PendingReceiver = mpsc::UnboundedReceiver<PendingMessage>;

/// Creates the queue between resolution and the worker.
pub fn async_queue() -> (PendingSender, PendingReceiver) {
    mpsc::unbounded_channel()
}

pub struct CaptureStage {
    host: Arc<dyn HostClient>,
    /// Lines captured since the last tick, with the log index to resolve.
    pending: VecDeque<(i64, PendingMessage)>,
    outbound: PendingSender,
    last_content_id: u64,
    last_log_index: i64,
}

impl CaptureStage {
    pub fn new(host: Arc<dyn HostClient>, outbound: PendingSender) -> Self {
        Self {
            host,
            pending: VecDeque::new(),
            outbound,
            last_content_id: 0,
            last_log_index: 0,
        }
    }

    /// The logged-in character, or the last one seen while logging out.
    pub fn current_content_id(&self) -> u64 {
        match self.host.local_content_id() {
            0 => self.last_content_id,
            id => id,
        }
    }

    /// Records one line. Never blocks and never talks to the identity lookup.
    pub fn capture(&mut self, event: RawEvent) {
        let receiver = self.current_content_id();

        // Only a line that advanced the host log can be resolved later; a
        // repeated or stale index means it never reached the log.
        let mut index = self.host.current_log_index();
        if index <= self.last_log_index {
            index = 0;
        } else {
            self.last_log_index = index;
        }

        self.pending.push_back((
            index - 1,
            PendingMessage {
                receiver,
                content_id: 0,
                code: event.code,
                sender_id: event.sender_id,
                sender: event.sender,
                content: event.content,
            },
        ));
    }

    /// Per-tick drain: resolves identities and forwards every captured line
    /// to the worker in capture order. Returns how many lines were forwarded.
    pub fn resolve(&mut self) -> usize {
        let local = self.host.local_content_id();
        if local != 0 {
            self.last_content_id = local;
        }

        let mut forwarded = 0;
        while let Some((index, mut pending)) = self.pending.pop_front() {
            if index > 0 {
                match self.host.resolve_content_id(index) {
                    Some(content_id) => pending.content_id = content_id,
                    None => debug!(index, "sender identity not resolved"),
                }
            }
            if self.outbound.send(pending).is_err() {
                warn!("worker queue closed, dropping captured line");
                continue;
            }
            forwarded += 1;
        }
        forwarded
    }

    /// Forgets the remembered identity and log position. Called on logout.
    pub fn reset(&mut self) {
        self.last_content_id = 0;
        self.last_log_index = 0;
    }

    /// Lines waiting for the next tick.
    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chatline_core::types::ChatType;
    use chatline_test_utils::fixtures::raw_event;
    use chatline_test_utils::MockHost;
    use proptest::prelude::*;

    fn stage(host: &Arc<MockHost>) -> (CaptureStage, PendingReceiver) {
        let (tx, rx) = async_queue();
        (CaptureStage::new(host.clone(), tx), rx)
    }

    fn drain(rx: &mut PendingReceiver) -> Vec<PendingMessage> {
        std::iter::from_fn(|| rx.try_recv().ok()).collect()
    }

    fn content(pending: &PendingMessage) -> &[u8] {
        pending.content.as_bytes()
    }

    #[test]
    fn nothing_is_forwarded_before_the_tick() {
        let host = Arc::new(MockHost::logged_in(7));
        let (mut stage, mut rx) = stage(&host);
        stage.capture(raw_event(ChatType::SAY, "A", "one"));
        assert!(drain(&mut rx).is_empty());
        assert_eq!(stage.pending_len(), 1);
        assert!(host.resolve_calls().is_empty());

        assert_eq!(stage.resolve(), 1);
        let out = drain(&mut rx);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].receiver, 7);
    }

    #[test]
    fn resolves_with_the_entry_before_the_log_index() {
        let host = Arc::new(MockHost::logged_in(7));
        let (mut stage, mut rx) = stage(&host);
        host.set_log_index(5);
        host.set_resolvable(4, 1234);
        stage.capture(raw_event(ChatType::SAY, "A", "hi"));
        stage.resolve();
        assert_eq!(host.resolve_calls(), vec![4]);
        assert_eq!(drain(&mut rx)[0].content_id, 1234);
    }

    #[test]
    fn stale_log_index_skips_resolution() {
        let host = Arc::new(MockHost::logged_in(7));
        let (mut stage, mut rx) = stage(&host);
        host.set_log_index(5);
        stage.capture(raw_event(ChatType::SAY, "A", "first"));
        // index did not move: second line never reached the log
        stage.capture(raw_event(ChatType::SAY, "A", "second"));
        stage.resolve();
        assert_eq!(host.resolve_calls(), vec![4]);
        let out = drain(&mut rx);
        assert_eq!(out.len(), 2);
        assert_eq!(out[1].content_id, 0);
    }

    #[test]
    fn index_of_one_is_not_resolvable() {
        let host = Arc::new(MockHost::logged_in(7));
        let (mut stage, _rx) = stage(&host);
        host.set_log_index(1);
        stage.capture(raw_event(ChatType::SAY, "A", "x"));
        stage.resolve();
        assert!(host.resolve_calls().is_empty());
    }

    #[test]
    fn receiver_falls_back_to_last_known_identity() {
        let host = Arc::new(MockHost::logged_in(7));
        let (mut stage, mut rx) = stage(&host);
        stage.resolve();
        host.set_local_content_id(0);
        stage.capture(raw_event(ChatType::SAY, "A", "during logout"));
        stage.resolve();
        assert_eq!(drain(&mut rx)[0].receiver, 7);

        stage.reset();
        stage.capture(raw_event(ChatType::SAY, "A", "after reset"));
        stage.resolve();
        assert_eq!(drain(&mut rx)[0].receiver, 0);
    }

    #[test]
    fn reset_allows_the_log_index_to_restart() {
        let host = Arc::new(MockHost::logged_in(7));
        let (mut stage, _rx) = stage(&host);
        host.set_log_index(50);
        stage.capture(raw_event(ChatType::SAY, "A", "x"));
        stage.resolve();
        stage.reset();
        host.set_log_index(3);
        stage.capture(raw_event(ChatType::SAY, "A", "y"));
        stage.resolve();
        assert_eq!(host.resolve_calls(), vec![49, 2]);
    }

    #[test]
    fn closed_worker_queue_drops_without_panicking() {
        let host = Arc::new(MockHost::logged_in(7));
        let (mut stage, rx) = stage(&host);
        drop(rx);
        stage.capture(raw_event(ChatType::SAY, "A", "x"));
        assert_eq!(stage.resolve(), 0);
        assert_eq!(stage.pending_len(), 0);
    }

    proptest! {
        /// Order and count survive any mix of resolvable and unresolvable
        /// lines, spread over any number of ticks.
        #[test]
        fn forwards_every_line_in_capture_order(
            steps in prop::collection::vec((any::<bool>(), any::<bool>(), any::<bool>()), 0..64)
        ) {
            let host = Arc::new(MockHost::logged_in(1));
            let (mut stage, mut rx) = stage(&host);
            let mut out = Vec::new();
            for (i, (advance, resolvable, tick)) in steps.iter().enumerate() {
                if *advance {
                    let index = host.advance_log();
                    if *resolvable {
                        host.set_resolvable(index - 1, 100 + i as u64);
                    }
                }
                stage.capture(raw_event(ChatType::SAY, "A", &i.to_string()));
                if *tick {
                    stage.resolve();
                    out.extend(drain(&mut rx));
                }
            }
            stage.resolve();
            out.extend(drain(&mut rx));

            prop_assert_eq!(out.len(), steps.len());
            for (i, pending) in out.iter().enumerate() {
                let expected = i.to_string();
                prop_assert_eq!(content(pending), expected.as_bytes());
            }
        }
    }
}
