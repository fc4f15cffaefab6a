// SPDX-FileCopyrightText: 2026 Chatline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Builders for raw events and processed messages.

use chatline_core::types::{
    ChatCode, ChatType, ChunkSource, Markup, Message, PendingMessage, RawEvent,
};
use chatline_markup::{parse, MarkupBuilder};
use chrono::{DateTime, Utc};

/// Chat code for `chat_type` sent by source kind `source`.
pub fn code(chat_type: ChatType, source: u16) -> ChatCode {
    ChatCode(u16::from(chat_type.0) | ((source & 0xF) << 11))
}

/// A line as the host would emit it, with plain-text sender and content.
pub fn raw_event(chat_type: ChatType, sender: &str, content: &str) -> RawEvent {
    RawEvent {
        code: code(chat_type, 0),
        sender_id: 0,
        sender: MarkupBuilder::new().text(sender).build(),
        content: MarkupBuilder::new().text(content).build(),
    }
}

/// A processed message with chunks parsed from plain text.
pub fn message(receiver: u64, chat_type: ChatType, content: &str, date: DateTime<Utc>) -> Message {
    let code = code(chat_type, 0);
    let pending = PendingMessage {
        receiver,
        content_id: 0,
        code,
        sender_id: 0,
        sender: Markup::from("Tester"),
        content: Markup::from(content),
    };
    let sender = parse(b"Tester", ChunkSource::Sender, Some(chat_type));
    let content = parse(content.as_bytes(), ChunkSource::Content, Some(chat_type));
    Message::new(pending, sender, content, date)
}
