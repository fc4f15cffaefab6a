// SPDX-FileCopyrightText: 2026 Chatline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Connection setup and access.
//!
//! One connection serves both the worker (writes) and the control thread
//! (reloads). It sits behind a mutex that is held for a single statement or
//! query at a time.

use std::path::Path;
use std::sync::Mutex;

use chatline_core::ChatlineError;
use rusqlite::Connection;
use tracing::debug;

use crate::migrations::run_migrations;

pub struct Database {
    conn: Mutex<Connection>,
}

impl Database {
    /// Opens (creating if needed) the database at `path` and migrates it.
    pub fn open(path: &str, wal_mode: bool) -> Result<Self, ChatlineError> {
        if let Some(parent) = Path::new(path).parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent).map_err(ChatlineError::storage)?;
        }
        let conn = Connection::open(path).map_err(ChatlineError::storage)?;
        let db = Self::setup(conn, wal_mode)?;
        debug!(path, wal_mode, "message database opened");
        Ok(db)
    }

    /// A private in-memory database, used by tests and dry runs.
    pub fn open_in_memory() -> Result<Self, ChatlineError> {
        let conn = Connection::open_in_memory().map_err(ChatlineError::storage)?;
        Self::setup(conn, false)
    }

    fn setup(mut conn: Connection, wal_mode: bool) -> Result<Self, ChatlineError> {
        if wal_mode {
            conn.pragma_update(None, "journal_mode", "WAL")
                .map_err(ChatlineError::storage)?;
            conn.pragma_update(None, "synchronous", "NORMAL")
                .map_err(ChatlineError::storage)?;
        }
        conn.busy_timeout(std::time::Duration::from_secs(5))
            .map_err(ChatlineError::storage)?;
        run_migrations(&mut conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Runs `f` with exclusive access to the connection.
    pub fn with_connection<T, F>(&self, f: F) -> Result<T, ChatlineError>
    where
        F: FnOnce(&mut Connection) -> Result<T, ChatlineError>,
    {
        let mut conn = self
            .conn
            .lock()
            .map_err(|_| ChatlineError::Internal("database connection lock poisoned".into()))?;
        f(&mut conn)
    }

    /// Folds the WAL back into the main file. Called on shutdown.
    pub fn checkpoint(&self) -> Result<(), ChatlineError> {
        self.with_connection(|conn| {
            conn.execute_batch("PRAGMA wal_checkpoint(TRUNCATE);")
                .map_err(ChatlineError::storage)
        })?;
        debug!("WAL checkpoint complete");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn open_creates_parent_directories_and_schema() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("chat.db");
        let db = Database::open(path.to_str().unwrap(), true).unwrap();

        let tables: i64 = db
            .with_connection(|conn| {
                conn.query_row(
                    "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = 'messages'",
                    [],
                    |row| row.get(0),
                )
                .map_err(ChatlineError::storage)
            })
            .unwrap();
        assert_eq!(tables, 1);
        db.checkpoint().unwrap();
    }

    #[test]
    fn reopening_does_not_rerun_migrations() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("chat.db");
        drop(Database::open(path.to_str().unwrap(), false).unwrap());
        assert!(Database::open(path.to_str().unwrap(), false).is_ok());
    }
}
