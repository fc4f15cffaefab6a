// SPDX-FileCopyrightText: 2026 Chatline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Routes processed messages to every matching tab and, for the active
//! tab, on to the relay sinks.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use chatline_config::model::TabConfig;
use chatline_core::types::{Message, Notification, NotificationLevel, RelayEvent, UnreadMode};
use chatline_core::{ChatlineError, HostClient, MessageStore, RelaySink, ViewProvider};
use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};

use crate::tab::Tab;

#[derive(Debug, Default)]
struct TabSet {
    tabs: Vec<Arc<Tab>>,
    active: Option<usize>,
}

impl TabSet {
    fn active_tab(&self) -> Option<&Arc<Tab>> {
        self.active.and_then(|i| self.tabs.get(i))
    }
}

/// Outcome of [`TabFanout::reload_from_store`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ReloadSummary {
    pub loaded: usize,
    pub failed: usize,
}

pub struct TabFanout {
    set: RwLock<TabSet>,
    sinks: RwLock<Vec<Arc<dyn RelaySink>>>,
    // Held from a tab update through its broadcast so relay events follow
    // the order of the state changes. Taken before `set`, never inside it.
    relay_order: Mutex<()>,
    display_limit: usize,
}

impl TabFanout {
    /// Tabs in display order; the first one starts active.
    pub fn new(tabs: Vec<Tab>, display_limit: usize) -> Self {
        let active = (!tabs.is_empty()).then_some(0);
        Self {
            set: RwLock::new(TabSet {
                tabs: tabs.into_iter().map(Arc::new).collect(),
                active,
            }),
            sinks: RwLock::new(Vec::new()),
            relay_order: Mutex::new(()),
            display_limit,
        }
    }

    pub fn from_config(tabs: &[TabConfig], display_limit: usize) -> Self {
        Self::new(
            tabs.iter()
                .map(|config| Tab::from_config(config, display_limit))
                .collect(),
            display_limit,
        )
    }

    pub fn add_sink(&self, sink: Arc<dyn RelaySink>) {
        self.sinks
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .push(sink);
    }

    pub fn tabs(&self) -> Vec<Arc<Tab>> {
        self.read().tabs.clone()
    }

    pub fn active_index(&self) -> Option<usize> {
        self.read().active
    }

    /// Delivers one live message.
    pub fn dispatch(&self, message: Message) {
        let _order = self.relay_order();
        let current_matches = {
            let set = self.read();
            let current_matches = set.active_tab().is_some_and(|tab| tab.matches(&message));

            for (index, tab) in set.tabs.iter().enumerate() {
                if !tab.matches(&message) {
                    continue;
                }
                let is_active = set.active == Some(index);
                let unread =
                    !(tab.unread_mode() == UnreadMode::Unseen && is_active && current_matches);
                tab.add_message(message.clone(), unread);
            }
            current_matches
        };

        if current_matches {
            self.broadcast(RelayEvent::NewMessage {
                messages: vec![message],
            });
        }
    }

    /// Makes tab `index` active and tells the relay sinks.
    pub fn switch_active(&self, index: usize) -> Result<(), ChatlineError> {
        let _order = self.relay_order();
        let name = {
            let mut set = self.write();
            let tab = set
                .tabs
                .get(index)
                .cloned()
                .ok_or(ChatlineError::ViewNotFound(index as u32))?;
            set.active = Some(index);
            tab.mark_read();
            tab.name().to_owned()
        };
        debug!(tab = %name, "active tab switched");
        self.broadcast(RelayEvent::SwitchChannel { channel_name: name });
        Ok(())
    }

    /// Refills every tab from the store in one pass.
    ///
    /// Rows that could not be rebuilt are tombstoned so they are not loaded
    /// again, and the user is told once how many were lost.
    pub fn reload_from_store(
        &self,
        store: &dyn MessageStore,
        host: &dyn HostClient,
        receiver: u64,
        since: Option<DateTime<Utc>>,
    ) -> Result<ReloadSummary, ChatlineError> {
        let batch = store.query_recent(receiver, since, self.display_limit)?;
        let summary = ReloadSummary {
            loaded: batch.messages.len(),
            failed: batch.failed_ids.len(),
        };

        {
            let set = self.read();
            let mut pending: Vec<Vec<Message>> = vec![Vec::new(); set.tabs.len()];
            for message in &batch.messages {
                for (tab, list) in set.tabs.iter().zip(pending.iter_mut()) {
                    if tab.matches(message) {
                        list.push(message.clone());
                    }
                }
            }
            for (tab, list) in set.tabs.iter().zip(pending) {
                tab.add_sort_prune(list);
            }
        }

        if batch.did_error() {
            host.notify(Notification {
                level: NotificationLevel::Error,
                message: format!(
                    "{} stored messages could not be loaded and were removed",
                    summary.failed
                ),
            });
            info!(
                count = summary.failed,
                "marking messages as deleted due to parse failures"
            );
            for id in &batch.failed_ids {
                debug!(%id, "marking message as deleted due to parse failure");
                if let Err(e) = store.delete(*id) {
                    warn!(%id, error = %e, "failed to tombstone message");
                }
            }
        }

        Ok(summary)
    }

    pub fn clear_all(&self) {
        for tab in &self.read().tabs {
            tab.clear();
        }
    }

    fn broadcast(&self, event: RelayEvent) {
        let sinks = self.sinks.read().unwrap_or_else(PoisonError::into_inner);
        for sink in sinks.iter() {
            sink.broadcast(event.clone());
        }
    }

    fn relay_order(&self) -> MutexGuard<'_, ()> {
        self.relay_order.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn read(&self) -> RwLockReadGuard<'_, TabSet> {
        self.set.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, TabSet> {
        self.set.write().unwrap_or_else(PoisonError::into_inner)
    }
}

impl ViewProvider for TabFanout {
    fn active_view_name(&self) -> Option<String> {
        self.read().active_tab().map(|tab| tab.name().to_owned())
    }

    fn active_messages(&self) -> Vec<Message> {
        self.read()
            .active_tab()
            .map(|tab| tab.messages())
            .unwrap_or_default()
    }

    fn available_views(&self) -> BTreeMap<String, u32> {
        self.read()
            .tabs
            .iter()
            .enumerate()
            .map(|(index, tab)| (tab.name().to_owned(), index as u32))
            .collect()
    }

    fn switch_view(&self, id: u32) -> Result<(), ChatlineError> {
        self.switch_active(id as usize)
    }
}
