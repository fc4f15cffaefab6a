// SPDX-FileCopyrightText: 2026 Chatline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use crate::error::ChatlineError;

/// Outbound chat typed by a remote subscriber.
pub trait ChatInput: Send + Sync {
    /// Sends `text` through the host's chat box on behalf of the view the
    /// subscriber is looking at. `view` is `None` when no view is active.
    fn send_chat(&self, view: Option<&str>, text: &str) -> Result<(), ChatlineError>;
}
