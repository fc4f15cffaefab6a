// SPDX-FileCopyrightText: 2026 Chatline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration model.
//!
//! Every struct uses `#[serde(deny_unknown_fields)]` so a mistyped key fails
//! at startup with a suggestion instead of being silently ignored.

use std::time::Duration;

use chatline_core::types::{ChatType, UnreadMode};
use serde::{Deserialize, Serialize};

/// Top-level Chatline configuration. Every section is optional.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ChatlineConfig {
    #[serde(default)]
    pub pipeline: PipelineConfig,

    #[serde(default)]
    pub storage: StorageConfig,

    #[serde(default)]
    pub relay: RelayConfig,

    #[serde(default)]
    pub logging: LoggingConfig,

    /// Views, in display order. The first one starts active.
    #[serde(default = "default_tabs")]
    pub tabs: Vec<TabConfig>,
}

impl Default for ChatlineConfig {
    fn default() -> Self {
        Self {
            pipeline: PipelineConfig::default(),
            storage: StorageConfig::default(),
            relay: RelayConfig::default(),
            logging: LoggingConfig::default(),
            tabs: default_tabs(),
        }
    }
}

/// Capture, worker and fan-out behaviour.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct PipelineConfig {
    /// Persist combat log categories too.
    #[serde(default = "default_true")]
    pub database_battle_messages: bool,

    /// Reload history from earlier runs, not just this one.
    #[serde(default)]
    pub filter_include_previous_sessions: bool,

    /// Messages kept per view; the oldest are evicted beyond this.
    #[serde(default = "default_display_limit")]
    pub display_limit: usize,

    /// Worker sleep when its queue is empty, in milliseconds.
    #[serde(default = "default_idle_sleep_ms")]
    pub idle_sleep_ms: u64,

    /// How long shutdown waits for the worker thread.
    #[serde(default = "default_shutdown_timeout_secs")]
    pub shutdown_timeout_secs: u64,
}

impl PipelineConfig {
    pub fn idle_sleep(&self) -> Duration {
        Duration::from_millis(self.idle_sleep_ms)
    }

    pub fn shutdown_timeout(&self) -> Duration {
        Duration::from_secs(self.shutdown_timeout_secs)
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            database_battle_messages: true,
            filter_include_previous_sessions: false,
            display_limit: default_display_limit(),
            idle_sleep_ms: default_idle_sleep_ms(),
            shutdown_timeout_secs: default_shutdown_timeout_secs(),
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_display_limit() -> usize {
    10_000
}

fn default_idle_sleep_ms() -> u64 {
    1
}

fn default_shutdown_timeout_secs() -> u64 {
    10
}

/// SQLite message store.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct StorageConfig {
    #[serde(default = "default_database_path")]
    pub database_path: String,

    #[serde(default = "default_true")]
    pub wal_mode: bool,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            database_path: default_database_path(),
            wal_mode: true,
        }
    }
}

fn default_database_path() -> String {
    dirs::data_dir()
        .map(|p| p.join("chatline").join("chatline.db"))
        .unwrap_or_else(|| std::path::PathBuf::from("chatline.db"))
        .to_string_lossy()
        .into_owned()
}

/// WebSocket relay for remote viewers.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct RelayConfig {
    #[serde(default)]
    pub enabled: bool,

    #[serde(default = "default_relay_host")]
    pub host: String,

    #[serde(default = "default_relay_port")]
    pub port: u16,

    /// Outbound queue depth per session above which a warning is logged.
    #[serde(default = "default_queue_warn_threshold")]
    pub queue_warn_threshold: usize,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            host: default_relay_host(),
            port: default_relay_port(),
            queue_warn_threshold: default_queue_warn_threshold(),
        }
    }
}

fn default_relay_host() -> String {
    "127.0.0.1".to_string()
}

fn default_relay_port() -> u16 {
    9000
}

fn default_queue_warn_threshold() -> usize {
    1024
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct LoggingConfig {
    /// trace, debug, info, warn or error.
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

/// One view: which chat types it shows and how it counts unread messages.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct TabConfig {
    pub name: String,

    #[serde(default)]
    pub unread_mode: UnreadMode,

    /// Chat type numbers this view shows.
    #[serde(default)]
    pub channels: Vec<u8>,

    /// Source kind mask applied to every channel; all sources when unset.
    #[serde(default)]
    pub sources: Option<u16>,
}

impl TabConfig {
    pub fn new(name: impl Into<String>, channels: &[ChatType]) -> Self {
        Self {
            name: name.into(),
            unread_mode: UnreadMode::default(),
            channels: channels.iter().map(|c| c.0).collect(),
            sources: None,
        }
    }
}

fn default_tabs() -> Vec<TabConfig> {
    vec![
        TabConfig::new(
            "General",
            &[
                ChatType::SAY,
                ChatType::SHOUT,
                ChatType::YELL,
                ChatType::TELL_OUTGOING,
                ChatType::TELL_INCOMING,
                ChatType::PARTY,
                ChatType::CROSS_PARTY,
                ChatType::ALLIANCE,
                ChatType::FREE_COMPANY,
                ChatType::LINKSHELL_1,
                ChatType::CROSS_LINKSHELL_1,
                ChatType::NOVICE_NETWORK,
                ChatType::STANDARD_EMOTE,
                ChatType::CUSTOM_EMOTE,
                ChatType::ECHO,
                ChatType::SYSTEM,
                ChatType::NOTICE,
                ChatType::URGENT,
                ChatType::ERROR,
                ChatType::NPC_DIALOGUE,
                ChatType::NPC_ANNOUNCEMENT,
                ChatType::LOOT_NOTICE,
                ChatType::LOOT_ROLL,
                ChatType::RANDOM_NUMBER,
                ChatType::RETAINER_SALE,
                ChatType::PERIODIC_RECRUITMENT,
            ],
        ),
        TabConfig::new(
            "Battle",
            &[
                ChatType::DAMAGE,
                ChatType::MISS,
                ChatType::ACTION,
                ChatType::ITEM,
                ChatType::HEALING,
                ChatType::GAIN_BUFF,
                ChatType::GAIN_DEBUFF,
                ChatType::LOSE_BUFF,
                ChatType::LOSE_DEBUFF,
                ChatType::BATTLE_SYSTEM,
            ],
        ),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = ChatlineConfig::default();
        assert!(config.pipeline.database_battle_messages);
        assert!(!config.pipeline.filter_include_previous_sessions);
        assert_eq!(config.pipeline.display_limit, 10_000);
        assert_eq!(config.pipeline.idle_sleep(), Duration::from_millis(1));
        assert_eq!(config.pipeline.shutdown_timeout(), Duration::from_secs(10));
        assert!(!config.relay.enabled);
        assert_eq!(config.tabs.len(), 2);
        assert_eq!(config.tabs[0].name, "General");
    }

    #[test]
    fn tab_unread_mode_parses_from_snake_case() {
        let tab: TabConfig =
            toml::from_str("name = \"Party\"\nunread_mode = \"unseen\"\nchannels = [14]\n")
                .expect("tab should parse");
        assert_eq!(tab.unread_mode, UnreadMode::Unseen);
        assert_eq!(tab.channels, vec![14]);
        assert_eq!(tab.sources, None);
    }
}
