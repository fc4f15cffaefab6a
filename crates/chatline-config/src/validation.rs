// SPDX-FileCopyrightText: 2026 Chatline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Semantic checks serde attributes cannot express.
//!
//! All problems are collected; validation never stops at the first one.

use std::collections::HashSet;

use crate::diagnostic::ConfigError;
use crate::model::ChatlineConfig;

const LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];

pub fn validate_config(config: &ChatlineConfig) -> Result<(), Vec<ConfigError>> {
    let mut errors = Vec::new();

    if config.pipeline.display_limit == 0 {
        errors.push(ConfigError::validation(
            "pipeline.display_limit must be at least 1",
        ));
    }
    if config.pipeline.idle_sleep_ms == 0 {
        errors.push(ConfigError::validation(
            "pipeline.idle_sleep_ms must be at least 1",
        ));
    }
    if config.pipeline.shutdown_timeout_secs == 0 {
        errors.push(ConfigError::validation(
            "pipeline.shutdown_timeout_secs must be at least 1",
        ));
    }

    if config.storage.database_path.trim().is_empty() {
        errors.push(ConfigError::validation(
            "storage.database_path must not be empty",
        ));
    }

    let host = config.relay.host.trim();
    let is_ip = host.parse::<std::net::IpAddr>().is_ok();
    let is_hostname = !host.is_empty()
        && host
            .chars()
            .all(|c| c.is_alphanumeric() || c == '.' || c == '-');
    if !is_ip && !is_hostname {
        errors.push(ConfigError::validation(format!(
            "relay.host `{host}` is not a valid IP address or hostname"
        )));
    }
    if config.relay.enabled && config.relay.port == 0 {
        errors.push(ConfigError::validation(
            "relay.port must be set when the relay is enabled",
        ));
    }
    if config.relay.queue_warn_threshold == 0 {
        errors.push(ConfigError::validation(
            "relay.queue_warn_threshold must be at least 1",
        ));
    }

    let level = config.logging.log_level.to_ascii_lowercase();
    if !LOG_LEVELS.contains(&level.as_str()) {
        errors.push(ConfigError::validation(format!(
            "logging.log_level `{}` must be one of {}",
            config.logging.log_level,
            LOG_LEVELS.join(", ")
        )));
    }

    if config.tabs.is_empty() {
        errors.push(ConfigError::validation("at least one [[tabs]] entry is required"));
    }
    let mut seen_names = HashSet::new();
    for (i, tab) in config.tabs.iter().enumerate() {
        if tab.name.trim().is_empty() {
            errors.push(ConfigError::validation(format!(
                "tabs[{i}].name must not be empty"
            )));
        } else if !seen_names.insert(tab.name.as_str()) {
            errors.push(ConfigError::validation(format!(
                "duplicate tab name `{}` in [[tabs]]",
                tab.name
            )));
        }
        if let Some(channel) = tab.channels.iter().find(|c| **c > 0x7F) {
            errors.push(ConfigError::validation(format!(
                "tabs[{i}].channels contains {channel}, chat types are below 128"
            )));
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
