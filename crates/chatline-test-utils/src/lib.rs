// SPDX-FileCopyrightText: 2026 Chatline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test doubles for Chatline.
//!
//! - [`MockHost`]: scripted host client with recorded lookups, notifications
//!   and sent chats
//! - [`MemoryStore`]: in-memory message store with failure injection
//! - [`RecordingSink`]: relay sink that keeps every broadcast event
//! - [`fixtures`]: builders for raw events and messages

pub mod fixtures;
pub mod memory_store;
pub mod mock_host;
pub mod recording_sink;

pub use memory_store::MemoryStore;
pub use mock_host::{MockHost, SentChat};
pub use recording_sink::RecordingSink;

use std::sync::{Mutex, MutexGuard, PoisonError};

/// Locks a test double's state; a poisoned lock still yields the data.
pub(crate) fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
