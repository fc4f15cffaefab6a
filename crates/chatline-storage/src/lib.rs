// SPDX-FileCopyrightText: 2026 Chatline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SQLite persistence for processed chat messages.
//!
//! Embedded migrations, a mutex-guarded connection shared by the worker and
//! control threads, and soft deletes so corrupt rows are not retried.

pub mod database;
pub mod migrations;
pub mod queries;
pub mod store;

pub use database::Database;
pub use store::SqliteMessageStore;
