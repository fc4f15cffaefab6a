// SPDX-FileCopyrightText: 2026 Chatline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! A single view: its filter, bounded message list and unread counter.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

use chatline_config::model::TabConfig;
use chatline_core::types::{ChatCode, ChatType, Message, UnreadMode};

/// Which chat types a tab shows, each with a mask of accepted source kinds.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TabFilter {
    channels: HashMap<ChatType, u16>,
}

impl TabFilter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Accepts `chat_type` from every source kind in `sources`.
    pub fn with(mut self, chat_type: ChatType, sources: u16) -> Self {
        *self.channels.entry(chat_type).or_default() |= sources;
        self
    }

    pub fn matches(&self, code: ChatCode) -> bool {
        self.channels
            .get(&code.chat_type())
            .is_some_and(|mask| mask & code.source() != 0)
    }
}

impl From<&TabConfig> for TabFilter {
    fn from(config: &TabConfig) -> Self {
        let sources = config.sources.unwrap_or(u16::MAX);
        config
            .channels
            .iter()
            .fold(TabFilter::new(), |filter, channel| {
                filter.with(ChatType(*channel), sources)
            })
    }
}

/// Messages ordered by date, oldest first, never longer than `limit`.
#[derive(Debug)]
pub struct MessageList {
    messages: Vec<Message>,
    limit: usize,
}

impl MessageList {
    pub fn new(limit: usize) -> Self {
        Self {
            messages: Vec::new(),
            limit,
        }
    }

    /// Inserts one message at its date position and evicts the oldest overflow.
    pub fn add_prune(&mut self, message: Message) {
        let at = self.messages.partition_point(|m| m.date <= message.date);
        self.messages.insert(at, message);
        self.prune();
    }

    /// Merges a batch with one sort and one prune.
    pub fn add_sort_prune(&mut self, batch: Vec<Message>) {
        if batch.is_empty() {
            return;
        }
        self.messages.extend(batch);
        self.messages.sort_by_key(|m| m.date);
        self.prune();
    }

    fn prune(&mut self) {
        let excess = self.messages.len().saturating_sub(self.limit);
        if excess > 0 {
            self.messages.drain(..excess);
        }
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn clear(&mut self) {
        self.messages.clear();
    }

    pub fn as_slice(&self) -> &[Message] {
        &self.messages
    }
}

#[derive(Debug)]
pub struct Tab {
    name: String,
    filter: TabFilter,
    unread_mode: UnreadMode,
    messages: Mutex<MessageList>,
    unread: AtomicU32,
}

impl Tab {
    pub fn new(
        name: impl Into<String>,
        filter: TabFilter,
        unread_mode: UnreadMode,
        display_limit: usize,
    ) -> Self {
        Self {
            name: name.into(),
            filter,
            unread_mode,
            messages: Mutex::new(MessageList::new(display_limit)),
            unread: AtomicU32::new(0),
        }
    }

    pub fn from_config(config: &TabConfig, display_limit: usize) -> Self {
        Self::new(
            config.name.clone(),
            TabFilter::from(config),
            config.unread_mode,
            display_limit,
        )
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn unread_mode(&self) -> UnreadMode {
        self.unread_mode
    }

    pub fn matches(&self, message: &Message) -> bool {
        self.filter.matches(message.code)
    }

    /// Appends one live message, counting it as unread when asked to and
    /// when the tab tracks unread messages at all.
    pub fn add_message(&self, message: Message, unread: bool) {
        self.list().add_prune(message);
        if unread && self.unread_mode != UnreadMode::None {
            self.unread.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub fn add_sort_prune(&self, batch: Vec<Message>) {
        self.list().add_sort_prune(batch);
    }

    /// Snapshot of the held messages, oldest first.
    pub fn messages(&self) -> Vec<Message> {
        self.list().as_slice().to_vec()
    }

    pub fn len(&self) -> usize {
        self.list().len()
    }

    pub fn is_empty(&self) -> bool {
        self.list().is_empty()
    }

    pub fn unread(&self) -> u32 {
        self.unread.load(Ordering::Relaxed)
    }

    pub fn mark_read(&self) {
        self.unread.store(0, Ordering::Relaxed);
    }

    pub fn clear(&self) {
        self.list().clear();
        self.mark_read();
    }

    fn list(&self) -> MutexGuard<'_, MessageList> {
        // the list stays consistent even if a holder panicked mid-insert
        self.messages.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
