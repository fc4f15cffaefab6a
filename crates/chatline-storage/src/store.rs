// SPDX-FileCopyrightText: 2026 Chatline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SQLite implementation of [`MessageStore`].

use chatline_config::model::StorageConfig;
use chatline_core::types::{Message, MessageBatch};
use chatline_core::{ChatlineError, MessageStore};
use chrono::{DateTime, Utc};
use tracing::debug;
use uuid::Uuid;

use crate::database::Database;
use crate::queries;

pub struct SqliteMessageStore {
    db: Database,
}

impl SqliteMessageStore {
    pub fn open(config: &StorageConfig) -> Result<Self, ChatlineError> {
        Ok(Self::new(Database::open(
            &config.database_path,
            config.wal_mode,
        )?))
    }

    pub fn open_in_memory() -> Result<Self, ChatlineError> {
        Ok(Self::new(Database::open_in_memory()?))
    }

    pub fn new(db: Database) -> Self {
        Self { db }
    }

    pub fn database(&self) -> &Database {
        &self.db
    }

    /// Checkpoints the WAL. The connection itself closes on drop.
    pub fn close(&self) -> Result<(), ChatlineError> {
        self.db.checkpoint()
    }
}

impl MessageStore for SqliteMessageStore {
    fn upsert(&self, message: &Message) -> Result<(), ChatlineError> {
        self.db
            .with_connection(|conn| queries::messages::upsert(conn, message))
    }

    fn query_recent(
        &self,
        receiver: u64,
        since: Option<DateTime<Utc>>,
        limit: usize,
    ) -> Result<MessageBatch, ChatlineError> {
        self.db.with_connection(|conn| {
            queries::messages::query_recent(conn, receiver, since, limit)
        })
    }

    fn delete(&self, id: Uuid) -> Result<(), ChatlineError> {
        let tombstoned = self
            .db
            .with_connection(|conn| queries::messages::delete(conn, id))?;
        debug!(%id, tombstoned, "message delete");
        Ok(())
    }
}
