// SPDX-FileCopyrightText: 2026 Chatline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Read access to the configured views, used to bootstrap relay sessions.

use std::collections::BTreeMap;

use crate::error::ChatlineError;
use crate::types::Message;

pub trait ViewProvider: Send + Sync {
    /// Name of the active view, if one is selected.
    fn active_view_name(&self) -> Option<String>;

    /// Messages currently held by the active view, oldest first.
    fn active_messages(&self) -> Vec<Message>;

    /// Every view, keyed by name, mapped to its identifier.
    fn available_views(&self) -> BTreeMap<String, u32>;

    /// Makes the view with `id` the active one.
    fn switch_view(&self, id: u32) -> Result<(), ChatlineError>;
}
