// SPDX-FileCopyrightText: 2026 Chatline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The Chatline message pipeline.
//!
//! Raw lines are captured on the host control thread, resolved one tick
//! later, then parsed, persisted and fanned out to tabs on a dedicated
//! worker thread. See [`Pipeline`] for the wiring.

pub mod capture;
pub mod fanout;
pub mod pipeline;
pub mod shutdown;
pub mod tab;
pub mod worker;

pub use capture::CaptureStage;
pub use fanout::{ReloadSummary, TabFanout};
pub use pipeline::Pipeline;
pub use tab::{MessageList, Tab, TabFilter};
pub use worker::{MessageProcessor, WorkerHandle};
