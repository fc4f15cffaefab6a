// SPDX-FileCopyrightText: 2026 Chatline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Figment-based layered loading.
//!
//! Merge order, later wins: compiled defaults, `/etc/chatline/chatline.toml`,
//! `~/.config/chatline/chatline.toml`, `./chatline.toml`, then `CHATLINE_*`
//! environment variables.

#![allow(clippy::result_large_err)] // figment::Error is external

use std::path::{Path, PathBuf};

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use tracing::debug;

use crate::model::ChatlineConfig;

const SYSTEM_CONFIG: &str = "/etc/chatline/chatline.toml";
const LOCAL_CONFIG: &str = "chatline.toml";

/// Config file locations, lowest precedence first.
pub fn config_paths() -> Vec<PathBuf> {
    let mut paths = vec![PathBuf::from(SYSTEM_CONFIG)];
    if let Some(dir) = dirs::config_dir() {
        paths.push(dir.join("chatline").join(LOCAL_CONFIG));
    }
    paths.push(PathBuf::from(LOCAL_CONFIG));
    paths
}

/// Figment for the standard hierarchy, before extraction.
pub fn build_figment() -> Figment {
    config_paths()
        .into_iter()
        .fold(defaults(), |figment, path| {
            debug!(path = %path.display(), found = path.is_file(), "config layer");
            figment.merge(Toml::file(path))
        })
        .merge(env_provider())
}

pub fn load_config() -> Result<ChatlineConfig, figment::Error> {
    build_figment().extract()
}

/// One explicit file plus env overrides, no hierarchy lookup.
pub fn load_config_from_path(path: &Path) -> Result<ChatlineConfig, figment::Error> {
    debug!(path = %path.display(), "loading explicit config file");
    defaults()
        .merge(Toml::file(path))
        .merge(env_provider())
        .extract()
}

pub fn load_config_from_str(toml_content: &str) -> Result<ChatlineConfig, figment::Error> {
    defaults().merge(Toml::string(toml_content)).extract()
}

fn defaults() -> Figment {
    Figment::new().merge(Serialized::defaults(ChatlineConfig::default()))
}

/// `CHATLINE_RELAY_QUEUE_WARN_THRESHOLD` must map to
/// `relay.queue_warn_threshold`, so sections are split off explicitly with
/// `map()` instead of splitting on every underscore.
fn env_provider() -> Env {
    Env::prefixed("CHATLINE_").map(|key| {
        key.as_str()
            .replacen("pipeline_", "pipeline.", 1)
            .replacen("storage_", "storage.", 1)
            .replacen("relay_", "relay.", 1)
            .replacen("logging_", "logging.", 1)
            .into()
    })
}
