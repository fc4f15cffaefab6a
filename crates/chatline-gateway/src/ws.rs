// SPDX-FileCopyrightText: 2026 Chatline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! WebSocket handler streaming relay events.
//!
//! Server -> Client (JSON text frames, in order):
//! ```json
//! {"type": "new_message", "messages": [...]}
//! {"type": "switch_channel", "channel_name": "General"}
//! {"type": "channel_list", "channels": {"General": 0}}
//! ```
//!
//! Client frames other than close are ignored.

use axum::{
    extract::{
        State,
        ws::{Message, WebSocket, WebSocketUpgrade},
    },
    response::Response,
};
use futures::{SinkExt, StreamExt};

use crate::server::RelayState;

pub async fn ws_handler(ws: WebSocketUpgrade, State(state): State<RelayState>) -> Response {
    ws.on_upgrade(|socket| handle_socket(socket, state))
}

async fn handle_socket(socket: WebSocket, state: RelayState) {
    let (mut ws_sender, mut ws_receiver) = socket.split();
    let mut session = state.hub.open(state.views.as_ref());

    loop {
        tokio::select! {
            event = session.recv() => {
                let Some(event) = event else { break };
                let text = match serde_json::to_string(&event) {
                    Ok(text) => text,
                    Err(e) => {
                        tracing::warn!(kind = event.kind(), "failed to encode relay event: {e}");
                        continue;
                    }
                };
                if ws_sender.send(Message::Text(text.into())).await.is_err() {
                    tracing::debug!(session = %session.id(), "relay write failed");
                    break;
                }
            }
            incoming = ws_receiver.next() => match incoming {
                Some(Ok(Message::Close(_))) | None | Some(Err(_)) => break,
                Some(Ok(_)) => {}
            },
        }
    }

    state.hub.close(&mut session);
}
