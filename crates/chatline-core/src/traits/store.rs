// SPDX-FileCopyrightText: 2026 Chatline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Persistent message store contract.

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::error::ChatlineError;
use crate::types::{Message, MessageBatch};

/// Durable storage for processed messages.
///
/// Written from the worker thread and read from the control thread at the
/// same time; implementations synchronize internally.
pub trait MessageStore: Send + Sync {
    /// Inserts the message or replaces the row with the same id.
    fn upsert(&self, message: &Message) -> Result<(), ChatlineError>;

    /// Returns the newest `limit` live messages for `receiver`, oldest first.
    ///
    /// When `since` is set only messages at or after it are returned. Rows
    /// that cannot be rebuilt are reported in [`MessageBatch::failed_ids`]
    /// instead of failing the whole query.
    fn query_recent(
        &self,
        receiver: u64,
        since: Option<DateTime<Utc>>,
        limit: usize,
    ) -> Result<MessageBatch, ChatlineError>;

    /// Tombstones a message so it is no longer returned by queries.
    fn delete(&self, id: Uuid) -> Result<(), ChatlineError>;
}
