// SPDX-FileCopyrightText: 2026 Chatline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `chatline serve` command implementation.
//!
//! Opens the message store, starts the pipeline, restores tabs from the
//! store, starts the relay when enabled, then replays the host event feed.
//! With the relay running the process keeps serving until a shutdown
//! signal arrives.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use chatline_config::model::ChatlineConfig;
use chatline_core::ChatlineError;
use chatline_gateway::{RelayHub, RelayState, ServerConfig};
use chatline_pipeline::Pipeline;
use chatline_storage::SqliteMessageStore;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use crate::replay::{ReplayHost, parse_line};
use crate::signal;

type EventReader = Box<dyn AsyncBufRead + Unpin + Send>;

pub async fn run_serve(config: ChatlineConfig, events: Option<PathBuf>) -> Result<(), ChatlineError> {
    init_tracing(&config.logging.log_level);
    info!("starting chatline serve");

    let cancel = signal::install_signal_handler();

    let store = Arc::new(SqliteMessageStore::open(&config.storage)?);
    let host = Arc::new(ReplayHost::new());
    let mut pipeline = Pipeline::start(
        &config.pipeline,
        &config.tabs,
        host.clone(),
        store.clone(),
        cancel.child_token(),
    )?;

    let summary = pipeline.reload()?;
    info!(loaded = summary.loaded, failed = summary.failed, "tabs restored");

    let relay = if config.relay.enabled {
        let hub = Arc::new(RelayHub::new(config.relay.queue_warn_threshold));
        pipeline.fanout().add_sink(hub.clone());
        let listener = chatline_gateway::server::bind(&ServerConfig {
            host: config.relay.host.clone(),
            port: config.relay.port,
        })
        .await?;
        let state = RelayState {
            hub,
            views: pipeline.fanout().clone(),
            chat: host.clone(),
        };
        Some(tokio::spawn(chatline_gateway::serve(
            listener,
            state,
            cancel.clone(),
        )))
    } else {
        info!("relay disabled by configuration");
        None
    };

    if let Some(path) = events {
        let reader = open_events(&path).await?;
        let applied = replay(reader, host.as_ref(), &mut pipeline, &cancel).await?;
        info!(applied, "event replay finished");
    }

    if relay.is_some() {
        cancel.cancelled().await;
    }

    let stopped = if cancel.is_cancelled() {
        tokio::task::spawn_blocking(move || pipeline.shutdown()).await
    } else {
        tokio::task::spawn_blocking(move || pipeline.finish()).await
    }
    .map_err(|e| ChatlineError::Internal(format!("worker shutdown task failed: {e}")))?;
    if !stopped {
        let e = ChatlineError::Timeout {
            duration: config.pipeline.shutdown_timeout(),
        };
        warn!(error = %e, "worker did not stop in time");
    }

    if let Some(handle) = relay {
        match handle.await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => error!(error = %e, "relay server failed"),
            Err(e) => error!(error = %e, "relay task panicked"),
        }
    }

    store.close()?;
    info!(chats_sent = host.chats_sent(), "chatline stopped");
    Ok(())
}

async fn open_events(path: &Path) -> Result<EventReader, ChatlineError> {
    if path == Path::new("-") {
        return Ok(Box::new(BufReader::new(tokio::io::stdin())));
    }
    let file = tokio::fs::File::open(path).await.map_err(|e| {
        ChatlineError::Internal(format!("failed to open event feed {}: {e}", path.display()))
    })?;
    Ok(Box::new(BufReader::new(file)))
}

/// Applies events until the input ends or `cancel` fires, then runs one
/// final tick so nothing captured is left waiting. Returns how many events
/// were applied. Malformed lines are logged and skipped.
async fn replay<R>(
    reader: R,
    host: &ReplayHost,
    pipeline: &mut Pipeline,
    cancel: &CancellationToken,
) -> Result<usize, ChatlineError>
where
    R: AsyncBufRead + Unpin,
{
    let mut lines = reader.lines();
    let mut applied = 0;
    let mut number = 0usize;

    loop {
        let line = tokio::select! {
            _ = cancel.cancelled() => break,
            line = lines.next_line() => line.map_err(|e| {
                ChatlineError::Internal(format!("failed to read event feed: {e}"))
            })?,
        };
        let Some(line) = line else { break };
        number += 1;

        let event = match parse_line(&line) {
            Ok(Some(event)) => event,
            Ok(None) => continue,
            Err(e) => {
                warn!(line = number, "skipping malformed event: {e}");
                continue;
            }
        };
        if let Err(e) = host.apply(pipeline, event) {
            warn!(line = number, error = %e, "event could not be applied");
            continue;
        }
        applied += 1;
    }

    pipeline.tick();
    Ok(applied)
}

fn init_tracing(log_level: &str) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("chatline={log_level},warn")));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_names(true)
        .init();
}
