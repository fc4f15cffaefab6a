// SPDX-FileCopyrightText: 2026 Chatline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Message rows: upsert, windowed reads and tombstoning.
//!
//! Ids and integers are stored bit-for-bit (`u64` as `i64`). Dates are
//! microseconds since the Unix epoch so they order and filter as integers.

use chatline_core::types::{ChatCode, Chunk, Markup, Message, MessageBatch};
use chatline_core::ChatlineError;
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use tracing::warn;
use uuid::Uuid;

/// A row as stored, before the chunk columns are decoded.
#[derive(Debug)]
struct StoredRow {
    id: String,
    receiver: i64,
    content_id: Option<i64>,
    code: i64,
    sender: String,
    content: String,
    sender_source: Vec<u8>,
    content_source: Vec<u8>,
    date: i64,
}

impl StoredRow {
    fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            receiver: row.get(1)?,
            content_id: row.get(2)?,
            code: row.get(3)?,
            sender: row.get(4)?,
            content: row.get(5)?,
            sender_source: row.get(6)?,
            content_source: row.get(7)?,
            date: row.get(8)?,
        })
    }

    fn into_message(self, id: Uuid) -> Result<Message, ChatlineError> {
        let reconstruct = |source: Box<dyn std::error::Error + Send + Sync>| {
            ChatlineError::Reconstruct {
                id: self.id.clone(),
                source,
            }
        };

        let sender: Vec<Chunk> =
            serde_json::from_str(&self.sender).map_err(|e| reconstruct(e.into()))?;
        let content: Vec<Chunk> =
            serde_json::from_str(&self.content).map_err(|e| reconstruct(e.into()))?;
        let code = u16::try_from(self.code).map_err(|e| reconstruct(e.into()))?;
        let date = DateTime::<Utc>::from_timestamp_micros(self.date)
            .ok_or_else(|| reconstruct(format!("date {} out of range", self.date).into()))?;

        Ok(Message {
            id,
            receiver: self.receiver as u64,
            content_id: self.content_id.map(|c| c as u64),
            code: ChatCode(code),
            sender,
            content,
            sender_source: Markup(self.sender_source),
            content_source: Markup(self.content_source),
            date,
        })
    }
}

/// Inserts `message`, replacing any row with the same id.
pub fn upsert(conn: &Connection, message: &Message) -> Result<(), ChatlineError> {
    let sender = serde_json::to_string(&message.sender).map_err(ChatlineError::storage)?;
    let content = serde_json::to_string(&message.content).map_err(ChatlineError::storage)?;
    conn.execute(
        "INSERT OR REPLACE INTO messages (id, receiver, content_id, code, sender, content, \
         sender_source, content_source, date, deleted) \
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, 0)",
        params![
            message.id.to_string(),
            message.receiver as i64,
            message.content_id.map(|c| c as i64),
            i64::from(message.code.0),
            sender,
            content,
            message.sender_source.as_bytes(),
            message.content_source.as_bytes(),
            message.date.timestamp_micros(),
        ],
    )
    .map_err(ChatlineError::storage)?;
    Ok(())
}

/// Newest `limit` live rows for `receiver`, returned oldest first.
pub fn query_recent(
    conn: &Connection,
    receiver: u64,
    since: Option<DateTime<Utc>>,
    limit: usize,
) -> Result<MessageBatch, ChatlineError> {
    let mut stmt = conn
        .prepare(
            "SELECT id, receiver, content_id, code, sender, content, sender_source, \
             content_source, date FROM messages \
             WHERE receiver = ?1 AND deleted = 0 AND (?2 IS NULL OR date >= ?2) \
             ORDER BY date DESC LIMIT ?3",
        )
        .map_err(ChatlineError::storage)?;
    let rows = stmt
        .query_map(
            params![
                receiver as i64,
                since.map(|s| s.timestamp_micros()),
                i64::try_from(limit).unwrap_or(i64::MAX),
            ],
            StoredRow::from_row,
        )
        .map_err(ChatlineError::storage)?
        .collect::<rusqlite::Result<Vec<_>>>()
        .map_err(ChatlineError::storage)?;
    drop(stmt);

    let mut batch = MessageBatch::default();
    for row in rows.into_iter().rev() {
        let Ok(id) = Uuid::parse_str(&row.id) else {
            warn!(id = %row.id, "tombstoning message row with a malformed id");
            tombstone_raw(conn, &row.id)?;
            continue;
        };
        match row.into_message(id) {
            Ok(message) => batch.messages.push(message),
            Err(e) => {
                warn!(%id, error = %e, "stored message could not be rebuilt");
                batch.failed_ids.push(id);
            }
        }
    }
    Ok(batch)
}

/// Marks a message deleted. Returns whether a live row was tombstoned.
pub fn delete(conn: &Connection, id: Uuid) -> Result<bool, ChatlineError> {
    let changed = conn
        .execute(
            "UPDATE messages SET deleted = 1 WHERE id = ?1 AND deleted = 0",
            params![id.to_string()],
        )
        .map_err(ChatlineError::storage)?;
    Ok(changed > 0)
}

/// Rows whose id is not a UUID never reach `failed_ids`, so they are
/// tombstoned here by the stored text.
fn tombstone_raw(conn: &Connection, raw_id: &str) -> Result<(), ChatlineError> {
    conn.execute(
        "UPDATE messages SET deleted = 1 WHERE id = ?1",
        params![raw_id],
    )
    .map_err(ChatlineError::storage)?;
    Ok(())
}

/// Whether the row exists and is tombstoned.
pub fn is_deleted(conn: &Connection, id: Uuid) -> Result<Option<bool>, ChatlineError> {
    conn.query_row(
        "SELECT deleted FROM messages WHERE id = ?1",
        params![id.to_string()],
        |row| row.get::<_, i64>(0),
    )
    .optional()
    .map(|deleted| deleted.map(|d| d != 0))
    .map_err(ChatlineError::storage)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::Database;
    use chatline_core::types::{
        ChatType, ChunkSource, LinkTarget, PendingMessage, TextChunk,
    };
    use chrono::{Duration, TimeZone};
    use tracing_test::traced_test;

    fn message(receiver: u64, text: &str, date: DateTime<Utc>) -> Message {
        let pending = PendingMessage {
            receiver,
            content_id: 99,
            code: ChatCode(u16::from(ChatType::SAY.0)),
            sender_id: 1,
            sender: Markup::from("Alyx"),
            content: Markup::from(text),
        };
        let sender = vec![Chunk::Text(TextChunk {
            link: Some(LinkTarget::Player {
                name: "Alyx".into(),
                world_id: 73,
            }),
            ..TextChunk::plain(ChunkSource::Sender, "Alyx")
        })];
        let content = vec![Chunk::Text(TextChunk::plain(ChunkSource::Content, text))];
        Message::new(pending, sender, content, date)
    }

    fn at(minute: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 1, 12, minute, 0).unwrap()
    }

    fn with_db<T>(f: impl FnOnce(&Connection) -> T) -> T {
        let db = Database::open_in_memory().unwrap();
        db.with_connection(|conn| Ok(f(conn))).unwrap()
    }

    #[test]
    fn upsert_then_query_round_trips() {
        with_db(|conn| {
            let msg = message(1, "hello", at(0));
            upsert(conn, &msg).unwrap();
            let batch = query_recent(conn, 1, None, 10).unwrap();
            assert_eq!(batch.messages, vec![msg]);
            assert!(!batch.did_error());
        });
    }

    #[test]
    fn upsert_replaces_the_same_id() {
        with_db(|conn| {
            let msg = message(1, "hello", at(0));
            upsert(conn, &msg).unwrap();
            upsert(conn, &msg).unwrap();
            assert_eq!(query_recent(conn, 1, None, 10).unwrap().messages.len(), 1);
        });
    }

    #[test]
    fn query_keeps_the_newest_in_ascending_order() {
        with_db(|conn| {
            for minute in [3, 1, 4, 2] {
                upsert(conn, &message(1, &format!("m{minute}"), at(minute))).unwrap();
            }
            let batch = query_recent(conn, 1, None, 3).unwrap();
            let dates: Vec<_> = batch.messages.iter().map(|m| m.date).collect();
            assert_eq!(dates, vec![at(2), at(3), at(4)]);
        });
    }

    #[test]
    fn query_filters_receiver_and_since() {
        with_db(|conn| {
            upsert(conn, &message(1, "old", at(0))).unwrap();
            upsert(conn, &message(1, "new", at(10))).unwrap();
            upsert(conn, &message(2, "other", at(10))).unwrap();

            let since = at(10) - Duration::seconds(1);
            let batch = query_recent(conn, 1, Some(since), 10).unwrap();
            assert_eq!(batch.messages.len(), 1);
            assert_eq!(batch.messages[0].content_source, Markup::from("new"));
        });
    }

    #[traced_test]
    #[test]
    fn one_corrupt_row_of_three_is_reported_not_fatal() {
        with_db(|conn| {
            let msgs: Vec<_> = (0..3).map(|i| message(1, &format!("m{i}"), at(i))).collect();
            for msg in &msgs {
                upsert(conn, msg).unwrap();
            }
            conn.execute(
                "UPDATE messages SET content = '{not json' WHERE id = ?1",
                params![msgs[1].id.to_string()],
            )
            .unwrap();

            let batch = query_recent(conn, 1, None, 10).unwrap();
            assert_eq!(batch.messages.len(), 2);
            assert_eq!(batch.failed_ids, vec![msgs[1].id]);
        });
        assert!(logs_contain("stored message could not be rebuilt"));
    }

    #[traced_test]
    #[test]
    fn malformed_id_is_tombstoned_on_first_read() {
        with_db(|conn| {
            let good = message(1, "fine", at(0));
            let bad = message(1, "broken", at(1));
            upsert(conn, &good).unwrap();
            upsert(conn, &bad).unwrap();
            conn.execute(
                "UPDATE messages SET id = 'not-a-uuid' WHERE id = ?1",
                params![bad.id.to_string()],
            )
            .unwrap();

            let first = query_recent(conn, 1, None, 10).unwrap();
            assert_eq!(first.messages, vec![good.clone()]);
            assert!(first.failed_ids.is_empty());

            let deleted: i64 = conn
                .query_row(
                    "SELECT deleted FROM messages WHERE id = 'not-a-uuid'",
                    [],
                    |row| row.get(0),
                )
                .unwrap();
            assert_eq!(deleted, 1);

            let second = query_recent(conn, 1, None, 10).unwrap();
            assert_eq!(second.messages, vec![good]);
        });
        logs_assert(|lines| {
            match lines.iter().filter(|l| l.contains("malformed id")).count() {
                1 => Ok(()),
                n => Err(format!("expected one warning, saw {n}")),
            }
        });
    }

    #[test]
    fn deleted_rows_are_hidden() {
        with_db(|conn| {
            let msg = message(1, "bye", at(0));
            upsert(conn, &msg).unwrap();
            assert!(delete(conn, msg.id).unwrap());
            assert!(!delete(conn, msg.id).unwrap());
            assert_eq!(is_deleted(conn, msg.id).unwrap(), Some(true));
            assert!(query_recent(conn, 1, None, 10).unwrap().messages.is_empty());
            assert_eq!(is_deleted(conn, Uuid::nil()).unwrap(), None);
        });
    }

    #[test]
    fn large_ids_survive_the_signed_columns() {
        with_db(|conn| {
            let mut msg = message(u64::MAX, "x", at(0));
            msg.content_id = Some(u64::MAX - 1);
            upsert(conn, &msg).unwrap();
            let batch = query_recent(conn, u64::MAX, None, 1).unwrap();
            assert_eq!(batch.messages[0].receiver, u64::MAX);
            assert_eq!(batch.messages[0].content_id, Some(u64::MAX - 1));
        });
    }
}
