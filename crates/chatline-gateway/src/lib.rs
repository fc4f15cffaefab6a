// SPDX-FileCopyrightText: 2026 Chatline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Remote event relay.
//!
//! Every subscriber gets its own unbounded queue so a slow client never
//! stalls the pipeline. [`RelayHub`] is the pipeline-facing
//! [`RelaySink`](chatline_core::RelaySink); the axum server in [`server`]
//! exposes it over WebSocket.

pub mod handlers;
pub mod hub;
pub mod server;
pub mod session;
pub mod ws;

pub use hub::RelayHub;
pub use server::{RelayState, ServerConfig, router, serve, start_server};
pub use session::{RelaySession, SessionState};
