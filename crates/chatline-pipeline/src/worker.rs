// SPDX-FileCopyrightText: 2026 Chatline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The background worker: parse, persist and fan out each pending line.
//!
//! Every line is processed on its own; a failure is logged and that line is
//! dropped, the loop keeps going.

use std::collections::HashMap;
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use chatline_core::types::{
    ChatType, Chunk, ChunkSource, Message, NameFormat, PendingMessage, TextChunk,
};
use chatline_core::{ChatlineError, HostClient, MessageStore};
use chatline_markup::parse;
use chrono::Utc;
use tokio::sync::mpsc::error::TryRecvError;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::capture::PendingReceiver;
use crate::fanout::TabFanout;
use crate::shutdown::join_with_timeout;

/// Name of the worker thread.
pub const WORKER_THREAD_NAME: &str = "chatline-worker";

/// Turns a [`PendingMessage`] into a [`Message`] and delivers it.
pub struct MessageProcessor {
    host: Arc<dyn HostClient>,
    store: Arc<dyn MessageStore>,
    fanout: Arc<TabFanout>,
    database_battle_messages: bool,
    /// Host answers per chat type, including "no format".
    formats: HashMap<ChatType, Option<NameFormat>>,
}

impl MessageProcessor {
    pub fn new(
        host: Arc<dyn HostClient>,
        store: Arc<dyn MessageStore>,
        fanout: Arc<TabFanout>,
        database_battle_messages: bool,
    ) -> Self {
        Self {
            host,
            store,
            fanout,
            database_battle_messages,
            formats: HashMap::new(),
        }
    }

    pub fn process(&mut self, pending: PendingMessage) -> Result<(), ChatlineError> {
        let chat_type = pending.code.chat_type();

        let mut sender = parse(
            pending.sender.as_bytes(),
            ChunkSource::Sender,
            Some(chat_type),
        );
        if !pending.sender.is_empty()
            && let Some(format) = self.format_for(chat_type)
        {
            sender = decorate(format, sender, chat_type);
        }
        let content = parse(
            pending.content.as_bytes(),
            ChunkSource::Content,
            Some(chat_type),
        );

        let message = Message::new(pending, sender, content, Utc::now());
        if self.database_battle_messages || !message.code.is_battle() {
            self.store.upsert(&message)?;
        }
        self.fanout.dispatch(message);
        Ok(())
    }

    fn format_for(&mut self, chat_type: ChatType) -> Option<&NameFormat> {
        let host = &self.host;
        self.formats
            .entry(chat_type)
            .or_insert_with(|| host.name_format(chat_type))
            .as_ref()
    }
}

/// Wraps sender chunks in the host's before/after decoration.
fn decorate(format: &NameFormat, sender: Vec<Chunk>, chat_type: ChatType) -> Vec<Chunk> {
    let text = |content: &str| {
        Chunk::Text(TextChunk {
            fallback_colour: Some(chat_type),
            ..TextChunk::plain(ChunkSource::None, content)
        })
    };
    let mut chunks = Vec::with_capacity(sender.len() + 2);
    chunks.push(text(&format.before));
    chunks.extend(sender);
    chunks.push(text(&format.after));
    chunks
}

/// Handle to the running worker thread.
pub struct WorkerHandle {
    thread: JoinHandle<()>,
    token: CancellationToken,
}

impl WorkerHandle {
    /// Starts the worker on its own named thread.
    pub fn spawn(
        mut processor: MessageProcessor,
        mut queue: PendingReceiver,
        idle_sleep: Duration,
        token: CancellationToken,
    ) -> Result<Self, ChatlineError> {
        let loop_token = token.clone();
        let thread = thread::Builder::new()
            .name(WORKER_THREAD_NAME.to_owned())
            .spawn(move || {
                debug!("worker started");
                while !loop_token.is_cancelled() {
                    match queue.try_recv() {
                        Ok(pending) => {
                            if let Err(e) = processor.process(pending) {
                                error!(error = %e, "error processing pending message");
                            }
                        }
                        Err(TryRecvError::Empty) => thread::sleep(idle_sleep),
                        Err(TryRecvError::Disconnected) => {
                            debug!("worker queue closed");
                            break;
                        }
                    }
                }
                debug!("worker stopped");
            })
            .map_err(|e| ChatlineError::Internal(format!("failed to spawn worker: {e}")))?;
        Ok(Self { thread, token })
    }

    pub fn is_running(&self) -> bool {
        !self.thread.is_finished()
    }

    /// Cancels the worker and waits up to `timeout` for it to exit.
    ///
    /// Returns whether the thread exited in time. Shutdown proceeds either
    /// way; a line being processed at that moment may be lost.
    pub fn shutdown(self, timeout: Duration) -> bool {
        self.token.cancel();
        let stopped = join_with_timeout(self.thread, timeout);
        if stopped {
            info!("worker shut down");
        }
        stopped
    }

    /// Waits for the worker to empty its queue after the sending side has
    /// been dropped. Falls back to cancelling if that takes over `timeout`.
    pub fn drain(self, timeout: Duration) -> bool {
        let drained = join_with_timeout(self.thread, timeout);
        if drained {
            info!("worker drained");
        } else {
            warn!(?timeout, "worker did not drain in time, cancelling");
            self.token.cancel();
        }
        drained
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tab::{Tab, TabFilter};
    use chatline_core::types::{ChatCode, Markup, UnreadMode};
    use chatline_markup::raw_text;
    use chatline_test_utils::fixtures::code;
    use chatline_test_utils::{MemoryStore, MockHost};

    struct Fixture {
        host: Arc<MockHost>,
        store: Arc<MemoryStore>,
        fanout: Arc<TabFanout>,
    }

    impl Fixture {
        fn new() -> Self {
            let tab = Tab::new(
                "All",
                [ChatType::SAY, ChatType::DAMAGE]
                    .into_iter()
                    .fold(TabFilter::new(), |f, t| f.with(t, u16::MAX)),
                UnreadMode::All,
                100,
            );
            Self {
                host: Arc::new(MockHost::logged_in(1)),
                store: Arc::new(MemoryStore::new()),
                fanout: Arc::new(TabFanout::new(vec![tab], 100)),
            }
        }

        fn processor(&self, database_battle_messages: bool) -> MessageProcessor {
            MessageProcessor::new(
                self.host.clone(),
                self.store.clone(),
                self.fanout.clone(),
                database_battle_messages,
            )
        }
    }

    fn pending(chat_type: ChatType, sender: &str, content: &str) -> PendingMessage {
        PendingMessage {
            receiver: 1,
            content_id: 0,
            code: code(chat_type, 0),
            sender_id: 0,
            sender: Markup::from(sender),
            content: Markup::from(content),
        }
    }

    #[test]
    fn sender_is_wrapped_in_the_name_format() {
        let fx = Fixture::new();
        fx.host.set_name_format(ChatType::SAY, "<", "> ");
        let mut processor = fx.processor(true);
        processor
            .process(pending(ChatType::SAY, "Alyx", "hi"))
            .unwrap();

        let stored = fx.store.messages();
        assert_eq!(stored.len(), 1);
        let sender = &stored[0].sender;
        assert_eq!(raw_text(sender), "<Alyx> ");
        let first = sender[0].as_text().unwrap();
        assert_eq!(first.source, ChunkSource::None);
        assert_eq!(first.fallback_colour, Some(ChatType::SAY));
        assert_eq!(sender[1].as_text().unwrap().source, ChunkSource::Sender);
    }

    #[test]
    fn missing_format_keeps_the_plain_sender() {
        let fx = Fixture::new();
        let mut processor = fx.processor(true);
        processor
            .process(pending(ChatType::SAY, "Alyx", "hi"))
            .unwrap();
        assert_eq!(raw_text(&fx.store.messages()[0].sender), "Alyx");
    }

    #[test]
    fn formats_are_cached_and_skipped_for_empty_senders() {
        let fx = Fixture::new();
        let mut processor = fx.processor(true);
        processor.process(pending(ChatType::SAY, "", "system")).unwrap();
        assert!(fx.host.format_lookups().is_empty());

        processor.process(pending(ChatType::SAY, "A", "1")).unwrap();
        processor.process(pending(ChatType::SAY, "B", "2")).unwrap();
        assert_eq!(fx.host.format_lookups(), vec![ChatType::SAY]);
    }

    #[test]
    fn battle_lines_skip_the_store_but_still_reach_tabs() {
        let fx = Fixture::new();
        let mut processor = fx.processor(false);
        processor
            .process(pending(ChatType::DAMAGE, "", "You hit"))
            .unwrap();
        assert!(fx.store.messages().is_empty());
        assert_eq!(fx.fanout.tabs()[0].len(), 1);

        let mut processor = fx.processor(true);
        processor
            .process(pending(ChatType::DAMAGE, "", "You hit again"))
            .unwrap();
        assert_eq!(fx.store.messages().len(), 1);
    }

    #[test]
    fn store_failure_drops_the_line() {
        let fx = Fixture::new();
        fx.store.fail_upserts(true);
        let mut processor = fx.processor(true);
        assert!(processor.process(pending(ChatType::SAY, "A", "x")).is_err());
        assert!(fx.fanout.tabs()[0].is_empty());
    }

    #[test]
    fn worker_survives_failures_and_stops_on_cancel() {
        let fx = Fixture::new();
        let (tx, rx) = crate::capture::async_queue();
        let token = CancellationToken::new();
        let worker = WorkerHandle::spawn(
            fx.processor(true),
            rx,
            Duration::from_millis(1),
            token.clone(),
        )
        .unwrap();

        fx.store.fail_upserts(true);
        tx.send(pending(ChatType::SAY, "A", "lost")).unwrap();
        wait_until(|| fx.store.upsert_attempts() == 1);
        fx.store.fail_upserts(false);
        tx.send(pending(ChatType::SAY, "A", "kept")).unwrap();
        wait_until(|| fx.store.messages().len() == 1);

        assert!(worker.is_running());
        assert!(worker.shutdown(Duration::from_secs(5)));
        assert!(token.is_cancelled());
        assert_eq!(raw_text(&fx.store.messages()[0].content), "kept");
    }

    #[test]
    fn worker_exits_when_the_queue_closes() {
        let fx = Fixture::new();
        let (tx, rx) = crate::capture::async_queue();
        let worker = WorkerHandle::spawn(
            fx.processor(true),
            rx,
            Duration::from_millis(1),
            CancellationToken::new(),
        )
        .unwrap();
        drop(tx);
        wait_until(|| !worker.is_running());
        assert!(worker.shutdown(Duration::from_millis(100)));
    }

    #[test]
    fn unused_code_bits_do_not_affect_processing() {
        let fx = Fixture::new();
        let mut processor = fx.processor(true);
        let mut line = pending(ChatType::SAY, "A", "x");
        line.code = ChatCode(line.code.0 | (3 << 7));
        processor.process(line).unwrap();
        assert_eq!(fx.store.messages().len(), 1);
        assert_eq!(
            fx.store.query_recent(1, None, 10).unwrap().messages.len(),
            1
        );
    }

    fn wait_until(mut condition: impl FnMut() -> bool) {
        let deadline = std::time::Instant::now() + Duration::from_secs(5);
        while !condition() {
            assert!(std::time::Instant::now() < deadline, "condition not met in time");
            thread::sleep(Duration::from_millis(2));
        }
    }
}
