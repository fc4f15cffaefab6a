// SPDX-FileCopyrightText: 2026 Chatline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Chatline - chat log capture, persistence and relay.
//!
//! This is the binary entry point.

#[cfg(not(target_env = "msvc"))]
use tikv_jemallocator::Jemalloc;

#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: Jemalloc = Jemalloc;

mod replay;
mod serve;
mod signal;

use std::path::PathBuf;

use chatline_config::{ChatlineConfig, ConfigError};
use clap::{Parser, Subcommand};

/// Chatline - chat log capture, persistence and relay.
#[derive(Parser, Debug)]
#[command(name = "chatline", version, about, long_about = None)]
struct Cli {
    /// Load this file instead of the standard config locations.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Run the pipeline and, when enabled, the relay server.
    Serve {
        /// JSON-lines host event feed to replay; `-` reads stdin.
        #[arg(long)]
        events: Option<PathBuf>,
    },
    /// Validate the configuration and exit.
    CheckConfig,
}

fn load(path: Option<&PathBuf>) -> Result<ChatlineConfig, Vec<ConfigError>> {
    match path {
        Some(path) => chatline_config::load_and_validate_path(path),
        None => chatline_config::load_and_validate(),
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let config = match load(cli.config.as_ref()) {
        Ok(config) => config,
        Err(errors) => {
            chatline_config::render_errors(&errors);
            std::process::exit(1);
        }
    };

    match cli.command {
        Some(Commands::Serve { events }) => {
            if let Err(e) = serve::run_serve(config, events).await {
                eprintln!("error: {e}");
                std::process::exit(1);
            }
        }
        Some(Commands::CheckConfig) => {
            println!(
                "chatline: config ok ({} tabs, database {}, relay {})",
                config.tabs.len(),
                config.storage.database_path,
                if config.relay.enabled {
                    format!("on {}:{}", config.relay.host, config.relay.port)
                } else {
                    "off".to_owned()
                }
            );
        }
        None => {
            println!("chatline: use --help for available commands");
        }
    }
}
