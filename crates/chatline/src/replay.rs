// SPDX-FileCopyrightText: 2026 Chatline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! A host fed from a recorded JSON-lines event stream.
//!
//! One event per line, tagged by `event`:
//!
//! ```json
//! {"event": "login", "content_id": 4200}
//! {"event": "name_format", "chat_type": 14, "before": "(", "after": ") "}
//! {"event": "line", "code": 10, "sender": "Alyx", "content": "hello", "sender_content_id": 77}
//! {"event": "tick"}
//! {"event": "switch_view", "view": 1}
//! {"event": "reload"}
//! {"event": "logout"}
//! ```
//!
//! Blank lines and lines starting with `#` are skipped.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use chatline_core::types::{ChatCode, ChatType, NameFormat, Notification, NotificationLevel, RawEvent};
use chatline_core::{ChatInput, ChatlineError, HostClient};
use chatline_markup::MarkupBuilder;
use chatline_pipeline::Pipeline;
use serde::Deserialize;
use tracing::{debug, error, info, warn};

#[derive(Debug, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum ReplayEvent {
    Login { content_id: u64 },
    Logout,
    NameFormat { chat_type: u8, before: String, after: String },
    Line(LineEvent),
    Tick,
    SwitchView { view: u32 },
    Reload,
}

#[derive(Debug, Deserialize)]
pub struct LineEvent {
    /// Full chat code: type in the low 7 bits, source flags above.
    pub code: u16,
    #[serde(default)]
    pub sender_id: u32,
    #[serde(default)]
    pub sender: String,
    #[serde(default)]
    pub content: String,
    /// Raw markup bytes; replaces `content` when present.
    #[serde(default)]
    pub content_markup: Option<Vec<u8>>,
    /// Identity the host resolves for this line one tick later.
    #[serde(default)]
    pub sender_content_id: Option<u64>,
    /// Whether the line reached the host's chat log.
    #[serde(default = "default_in_log")]
    pub in_log: bool,
}

fn default_in_log() -> bool {
    true
}

/// Parses one input line. `Ok(None)` for blank and comment lines.
pub fn parse_line(line: &str) -> Result<Option<ReplayEvent>, serde_json::Error> {
    let line = line.trim();
    if line.is_empty() || line.starts_with('#') {
        return Ok(None);
    }
    serde_json::from_str(line).map(Some)
}

#[derive(Debug, Default)]
struct HostState {
    local_content_id: u64,
    log_index: i64,
    resolvable: HashMap<i64, u64>,
    formats: HashMap<ChatType, NameFormat>,
    chats_sent: usize,
}

#[derive(Debug)]
pub struct ReplayHost {
    state: Mutex<HostState>,
}

impl ReplayHost {
    pub fn new() -> Self {
        // Log entry 0 is never resolvable, so the first replayed line lands on 1.
        Self {
            state: Mutex::new(HostState {
                log_index: 1,
                ..HostState::default()
            }),
        }
    }

    /// Applies one event to the host and the pipeline it drives.
    pub fn apply(&self, pipeline: &mut Pipeline, event: ReplayEvent) -> Result<(), ChatlineError> {
        match event {
            ReplayEvent::Login { content_id } => {
                info!(content_id, "replay login");
                self.lock().local_content_id = content_id;
            }
            ReplayEvent::Logout => {
                info!("replay logout");
                self.lock().local_content_id = 0;
                pipeline.logout();
            }
            ReplayEvent::NameFormat {
                chat_type,
                before,
                after,
            } => {
                self.lock()
                    .formats
                    .insert(ChatType(chat_type), NameFormat { before, after });
            }
            ReplayEvent::Line(line) => {
                if line.in_log {
                    let mut state = self.lock();
                    state.log_index += 1;
                    if let Some(content_id) = line.sender_content_id {
                        let entry = state.log_index - 1;
                        state.resolvable.insert(entry, content_id);
                    }
                }
                let content = match line.content_markup {
                    Some(bytes) => bytes.into(),
                    None => MarkupBuilder::new().text(&line.content).build(),
                };
                pipeline.on_raw_event(RawEvent {
                    code: ChatCode(line.code),
                    sender_id: line.sender_id,
                    sender: MarkupBuilder::new().text(&line.sender).build(),
                    content,
                });
            }
            ReplayEvent::Tick => {
                pipeline.tick();
            }
            ReplayEvent::SwitchView { view } => {
                pipeline.fanout().switch_active(view as usize)?;
            }
            ReplayEvent::Reload => {
                pipeline.reload()?;
            }
        }
        Ok(())
    }

    /// Chat lines accepted from relay subscribers so far.
    pub fn chats_sent(&self) -> usize {
        self.lock().chats_sent
    }

    fn lock(&self) -> MutexGuard<'_, HostState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for ReplayHost {
    fn default() -> Self {
        Self::new()
    }
}

impl HostClient for ReplayHost {
    fn local_content_id(&self) -> u64 {
        self.lock().local_content_id
    }

    fn current_log_index(&self) -> i64 {
        self.lock().log_index
    }

    fn resolve_content_id(&self, log_index: i64) -> Option<u64> {
        let mut state = self.lock();
        let resolved = state.resolvable.remove(&log_index);
        // lookups move forward, so anything at or below this entry is stale
        state.resolvable.retain(|entry, _| *entry > log_index);
        drop(state);
        debug!(log_index, resolved = resolved.is_some(), "replay identity lookup");
        resolved
    }

    fn name_format(&self, chat_type: ChatType) -> Option<NameFormat> {
        self.lock().formats.get(&chat_type).cloned()
    }

    fn notify(&self, notification: Notification) {
        match notification.level {
            NotificationLevel::Info => info!("{}", notification.message),
            NotificationLevel::Warning => warn!("{}", notification.message),
            NotificationLevel::Error => error!("{}", notification.message),
        }
    }
}

/// A recorded feed has no chat box, so outbound lines are only logged.
impl ChatInput for ReplayHost {
    fn send_chat(&self, view: Option<&str>, text: &str) -> Result<(), ChatlineError> {
        let mut state = self.lock();
        if state.local_content_id == 0 {
            return Err(ChatlineError::Internal(
                "cannot send chat while logged out".into(),
            ));
        }
        state.chats_sent += 1;
        info!(view = view.unwrap_or(""), text, "outbound chat");
        Ok(())
    }
}
