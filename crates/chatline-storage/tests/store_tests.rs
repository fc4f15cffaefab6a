// SPDX-FileCopyrightText: 2026 Chatline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Store behaviour through the `MessageStore` trait against a file database.

use chatline_config::model::StorageConfig;
use chatline_core::types::{ChatCode, ChatType, Markup, Message, PendingMessage};
use chatline_core::MessageStore;
use chatline_storage::queries::messages::is_deleted;
use chatline_storage::SqliteMessageStore;
use chrono::{Duration, Utc};
use tempfile::tempdir;

fn message(text: &str, offset_secs: i64) -> Message {
    let pending = PendingMessage {
        receiver: 5,
        content_id: 0,
        code: ChatCode(u16::from(ChatType::PARTY.0)),
        sender_id: 2,
        sender: Markup::from("Bo"),
        content: Markup::from(text),
    };
    Message::new(
        pending,
        Vec::new(),
        Vec::new(),
        Utc::now() + Duration::seconds(offset_secs),
    )
}

fn open(dir: &tempfile::TempDir) -> SqliteMessageStore {
    let config = StorageConfig {
        database_path: dir.path().join("chatline.db").display().to_string(),
        wal_mode: true,
    };
    SqliteMessageStore::open(&config).expect("store should open")
}

#[test]
fn messages_survive_reopening() {
    let dir = tempdir().unwrap();
    let msg = message("persisted", 0);
    {
        let store = open(&dir);
        store.upsert(&msg).unwrap();
        store.close().unwrap();
    }
    let store = open(&dir);
    let batch = store.query_recent(5, None, 100).unwrap();
    assert_eq!(batch.messages, vec![msg]);
}

#[test]
fn corrupt_rows_are_reported_and_tombstoned() {
    let dir = tempdir().unwrap();
    let store = open(&dir);
    let msgs: Vec<_> = (0..3).map(|i| message(&format!("m{i}"), i)).collect();
    for msg in &msgs {
        store.upsert(msg).unwrap();
    }
    store
        .database()
        .with_connection(|conn| {
            conn.execute(
                "UPDATE messages SET sender = 'garbage' WHERE id = ?1",
                [msgs[0].id.to_string()],
            )
            .map_err(chatline_core::ChatlineError::storage)
        })
        .unwrap();

    let batch = store.query_recent(5, None, 100).unwrap();
    assert_eq!(batch.messages.len(), 2);
    assert_eq!(batch.failed_ids, vec![msgs[0].id]);

    store.delete(msgs[0].id).unwrap();
    let deleted = store
        .database()
        .with_connection(|conn| is_deleted(conn, msgs[0].id))
        .unwrap();
    assert_eq!(deleted, Some(true));

    let batch = store.query_recent(5, None, 100).unwrap();
    assert_eq!(batch.messages.len(), 2);
    assert!(!batch.did_error());
}

#[test]
fn concurrent_writer_and_reader() {
    let dir = tempdir().unwrap();
    let store = std::sync::Arc::new(open(&dir));

    let writer = {
        let store = store.clone();
        std::thread::spawn(move || {
            for i in 0..50 {
                store.upsert(&message(&format!("w{i}"), i)).unwrap();
            }
        })
    };
    for _ in 0..10 {
        store.query_recent(5, None, 10).unwrap();
    }
    writer.join().unwrap();
    assert_eq!(store.query_recent(5, None, 100).unwrap().messages.len(), 50);
}
