// SPDX-FileCopyrightText: 2026 Chatline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! In-memory [`MessageStore`] with failure injection.

use std::collections::HashSet;
use std::sync::Mutex;

use chatline_core::types::{Message, MessageBatch};
use chatline_core::{ChatlineError, MessageStore};
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::lock;

#[derive(Debug, Default)]
struct StoreState {
    rows: Vec<(Message, bool)>,
    corrupt: HashSet<Uuid>,
    fail_upserts: bool,
    upsert_attempts: usize,
    deletes: Vec<Uuid>,
}

#[derive(Debug, Default)]
pub struct MemoryStore {
    state: Mutex<StoreState>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds the store without going through `upsert`.
    pub fn with_messages(messages: impl IntoIterator<Item = Message>) -> Self {
        let store = Self::new();
        lock(&store.state)
            .rows
            .extend(messages.into_iter().map(|m| (m, false)));
        store
    }

    /// Makes the row with `id` fail reconstruction on every query.
    pub fn corrupt(&self, id: Uuid) {
        lock(&self.state).corrupt.insert(id);
    }

    /// Makes every following `upsert` fail.
    pub fn fail_upserts(&self, fail: bool) {
        lock(&self.state).fail_upserts = fail;
    }

    /// Live messages in insertion order.
    pub fn messages(&self) -> Vec<Message> {
        lock(&self.state)
            .rows
            .iter()
            .filter(|(_, deleted)| !deleted)
            .map(|(m, _)| m.clone())
            .collect()
    }

    pub fn is_deleted(&self, id: Uuid) -> bool {
        lock(&self.state)
            .rows
            .iter()
            .any(|(m, deleted)| m.id == id && *deleted)
    }

    /// Calls to `upsert`, failed ones included.
    pub fn upsert_attempts(&self) -> usize {
        lock(&self.state).upsert_attempts
    }

    /// Every id passed to `delete`, in call order.
    pub fn deletes(&self) -> Vec<Uuid> {
        lock(&self.state).deletes.clone()
    }
}

impl MessageStore for MemoryStore {
    fn upsert(&self, message: &Message) -> Result<(), ChatlineError> {
        let mut state = lock(&self.state);
        state.upsert_attempts += 1;
        if state.fail_upserts {
            return Err(ChatlineError::Internal("injected upsert failure".into()));
        }
        match state.rows.iter_mut().find(|(m, _)| m.id == message.id) {
            Some(row) => *row = (message.clone(), false),
            None => state.rows.push((message.clone(), false)),
        }
        Ok(())
    }

    fn query_recent(
        &self,
        receiver: u64,
        since: Option<DateTime<Utc>>,
        limit: usize,
    ) -> Result<MessageBatch, ChatlineError> {
        let state = lock(&self.state);
        let mut live: Vec<&Message> = state
            .rows
            .iter()
            .filter(|(m, deleted)| {
                !deleted && m.receiver == receiver && since.is_none_or(|s| m.date >= s)
            })
            .map(|(m, _)| m)
            .collect();
        live.sort_by_key(|m| m.date);
        let skip = live.len().saturating_sub(limit);

        let mut batch = MessageBatch::default();
        for message in live.into_iter().skip(skip) {
            if state.corrupt.contains(&message.id) {
                batch.failed_ids.push(message.id);
            } else {
                batch.messages.push(message.clone());
            }
        }
        Ok(batch)
    }

    fn delete(&self, id: Uuid) -> Result<(), ChatlineError> {
        let mut state = lock(&self.state);
        state.deletes.push(id);
        if let Some(row) = state.rows.iter_mut().find(|(m, _)| m.id == id) {
            row.1 = true;
        }
        Ok(())
    }
}
