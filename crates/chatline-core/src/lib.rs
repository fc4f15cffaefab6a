// SPDX-FileCopyrightText: 2026 Chatline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core library for the Chatline message pipeline.
//!
//! This crate provides the data model shared by every stage (raw events,
//! pending messages, chunks, messages, relay events), the common error type,
//! and the traits that external collaborators implement: the host client,
//! the message store, relay sinks and view providers.

pub mod error;
pub mod traits;
pub mod types;

pub use error::ChatlineError;
pub use types::{
    ChatCode, ChatType, Chunk, ChunkSource, Icon, IconChunk, LinkTarget, Markup, Message,
    MessageBatch, NameFormat, Notification, NotificationLevel, PendingMessage, RawEvent,
    RelayEvent, TextChunk, UnreadMode,
};

pub use traits::{ChatInput, HostClient, MessageStore, RelaySink, ViewProvider};
