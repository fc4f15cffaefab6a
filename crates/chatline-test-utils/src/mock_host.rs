// SPDX-FileCopyrightText: 2026 Chatline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Scripted [`HostClient`] and [`ChatInput`].
//!
//! The log index, local identity, resolvable entries and name formats are
//! set by the test. Every identity lookup, notification and sent chat is
//! recorded.

use std::collections::HashMap;
use std::sync::Mutex;

use chatline_core::types::{ChatType, NameFormat, Notification};
use chatline_core::{ChatInput, ChatlineError, HostClient};

use crate::lock;

#[derive(Debug, Default)]
struct HostState {
    local_content_id: u64,
    log_index: i64,
    resolvable: HashMap<i64, u64>,
    formats: HashMap<ChatType, NameFormat>,
    resolve_calls: Vec<i64>,
    format_lookups: Vec<ChatType>,
    notifications: Vec<Notification>,
    sent: Vec<SentChat>,
    reject_chat: bool,
}

/// One call to [`ChatInput::send_chat`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentChat {
    pub view: Option<String>,
    pub text: String,
}

#[derive(Debug, Default)]
pub struct MockHost {
    state: Mutex<HostState>,
}

impl MockHost {
    pub fn new() -> Self {
        Self::default()
    }

    /// A host with a logged-in character.
    pub fn logged_in(content_id: u64) -> Self {
        let host = Self::new();
        host.set_local_content_id(content_id);
        host
    }

    pub fn set_local_content_id(&self, content_id: u64) {
        lock(&self.state).local_content_id = content_id;
    }

    pub fn set_log_index(&self, index: i64) {
        lock(&self.state).log_index = index;
    }

    /// Moves the log forward by one entry and returns the new index.
    pub fn advance_log(&self) -> i64 {
        let mut state = lock(&self.state);
        state.log_index += 1;
        state.log_index
    }

    /// Makes `resolve_content_id(index)` answer `content_id`.
    pub fn set_resolvable(&self, index: i64, content_id: u64) {
        lock(&self.state).resolvable.insert(index, content_id);
    }

    pub fn set_name_format(&self, chat_type: ChatType, before: &str, after: &str) {
        lock(&self.state).formats.insert(
            chat_type,
            NameFormat {
                before: before.to_owned(),
                after: after.to_owned(),
            },
        );
    }

    pub fn resolve_calls(&self) -> Vec<i64> {
        lock(&self.state).resolve_calls.clone()
    }

    pub fn format_lookups(&self) -> Vec<ChatType> {
        lock(&self.state).format_lookups.clone()
    }

    pub fn notifications(&self) -> Vec<Notification> {
        lock(&self.state).notifications.clone()
    }

    pub fn sent_chats(&self) -> Vec<SentChat> {
        lock(&self.state).sent.clone()
    }

    /// Makes every later `send_chat` fail.
    pub fn reject_chat(&self) {
        lock(&self.state).reject_chat = true;
    }
}

impl HostClient for MockHost {
    fn local_content_id(&self) -> u64 {
        lock(&self.state).local_content_id
    }

    fn current_log_index(&self) -> i64 {
        lock(&self.state).log_index
    }

    fn resolve_content_id(&self, log_index: i64) -> Option<u64> {
        let mut state = lock(&self.state);
        state.resolve_calls.push(log_index);
        state.resolvable.get(&log_index).copied()
    }

    fn name_format(&self, chat_type: ChatType) -> Option<NameFormat> {
        let mut state = lock(&self.state);
        state.format_lookups.push(chat_type);
        state.formats.get(&chat_type).cloned()
    }

    fn notify(&self, notification: Notification) {
        lock(&self.state).notifications.push(notification);
    }
}

impl ChatInput for MockHost {
    fn send_chat(&self, view: Option<&str>, text: &str) -> Result<(), ChatlineError> {
        let mut state = lock(&self.state);
        if state.reject_chat {
            return Err(ChatlineError::Internal("chat box unavailable".into()));
        }
        state.sent.push(SentChat {
            view: view.map(str::to_owned),
            text: text.to_owned(),
        });
        Ok(())
    }
}
