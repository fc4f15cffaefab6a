// SPDX-FileCopyrightText: 2026 Chatline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Capabilities the pipeline consumes from the host client.

use crate::types::{ChatType, NameFormat, Notification};

/// The host client that emits chat lines and answers identity lookups.
///
/// All methods are called from the host control thread except
/// [`name_format`](HostClient::name_format), which the worker calls.
pub trait HostClient: Send + Sync + 'static {
    /// Content id of the locally logged-in character, `0` when logged out.
    fn local_content_id(&self) -> u64;

    /// Position of the most recent line in the host's contiguous chat log.
    fn current_log_index(&self) -> i64;

    /// Resolves the sender identity of a log entry.
    ///
    /// Only valid one tick after the entry became visible in the host log.
    fn resolve_content_id(&self, log_index: i64) -> Option<u64>;

    /// Sender decoration for a chat type, if the host knows one.
    fn name_format(&self, chat_type: ChatType) -> Option<NameFormat>;

    /// Surfaces a message to the user.
    fn notify(&self, notification: Notification);
}
