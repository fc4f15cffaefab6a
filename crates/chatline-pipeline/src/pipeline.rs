// SPDX-FileCopyrightText: 2026 Chatline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Wires capture, worker and fan-out together behind one owner.

use std::sync::Arc;

use chatline_config::model::{PipelineConfig, TabConfig};
use chatline_core::types::RawEvent;
use chatline_core::{ChatlineError, HostClient, MessageStore};
use chrono::{DateTime, Utc};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::capture::{CaptureStage, async_queue};
use crate::fanout::{ReloadSummary, TabFanout};
use crate::worker::{MessageProcessor, WorkerHandle};

/// The running pipeline.
///
/// Owned by the host control thread: [`on_raw_event`](Self::on_raw_event)
/// and [`tick`](Self::tick) are called from there, while processing happens
/// on the worker thread.
pub struct Pipeline {
    config: PipelineConfig,
    capture: CaptureStage,
    worker: WorkerHandle,
    fanout: Arc<TabFanout>,
    host: Arc<dyn HostClient>,
    store: Arc<dyn MessageStore>,
    started_at: DateTime<Utc>,
}

impl Pipeline {
    pub fn start(
        config: &PipelineConfig,
        tabs: &[TabConfig],
        host: Arc<dyn HostClient>,
        store: Arc<dyn MessageStore>,
        token: CancellationToken,
    ) -> Result<Self, ChatlineError> {
        let fanout = Arc::new(TabFanout::from_config(tabs, config.display_limit));
        let (tx, rx) = async_queue();
        let processor = MessageProcessor::new(
            host.clone(),
            store.clone(),
            fanout.clone(),
            config.database_battle_messages,
        );
        let worker = WorkerHandle::spawn(processor, rx, config.idle_sleep(), token)?;
        info!(tabs = tabs.len(), "pipeline started");

        Ok(Self {
            config: config.clone(),
            capture: CaptureStage::new(host.clone(), tx),
            worker,
            fanout,
            host,
            store,
            started_at: Utc::now(),
        })
    }

    pub fn fanout(&self) -> &Arc<TabFanout> {
        &self.fanout
    }

    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    /// Host callback for each chat line.
    pub fn on_raw_event(&mut self, event: RawEvent) {
        self.capture.capture(event);
    }

    /// Host callback once per tick.
    pub fn tick(&mut self) -> usize {
        self.capture.resolve()
    }

    /// Host callback on logout.
    pub fn logout(&mut self) {
        debug!("logout, forgetting local identity");
        self.capture.reset();
    }

    /// Clears every tab and refills them from the store.
    ///
    /// Only this run's messages are loaded unless
    /// `filter_include_previous_sessions` is set.
    pub fn reload(&self) -> Result<ReloadSummary, ChatlineError> {
        let since = (!self.config.filter_include_previous_sessions).then_some(self.started_at);
        let started = std::time::Instant::now();
        self.fanout.clear_all();
        let summary = self.fanout.reload_from_store(
            self.store.as_ref(),
            self.host.as_ref(),
            self.capture.current_content_id(),
            since,
        )?;
        debug!(
            loaded = summary.loaded,
            failed = summary.failed,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "tabs reloaded"
        );
        Ok(summary)
    }

    pub fn worker_running(&self) -> bool {
        self.worker.is_running()
    }

    /// Stops the worker, waiting up to the configured timeout. Lines still
    /// queued are dropped.
    pub fn shutdown(self) -> bool {
        self.worker.shutdown(self.config.shutdown_timeout())
    }

    /// Flushes captured lines, closes the queue and lets the worker finish
    /// everything already queued before it exits.
    pub fn finish(mut self) -> bool {
        self.capture.resolve();
        let Self {
            config,
            capture,
            worker,
            ..
        } = self;
        drop(capture);
        worker.drain(config.shutdown_timeout())
    }
}
