// SPDX-FileCopyrightText: 2026 Chatline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP handlers: POST /channel, POST /send and GET /health.

use std::ops::RangeInclusive;

use axum::{
    Json,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};

use crate::server::RelayState;

/// Accepted length of an outbound chat line, in characters.
pub const SEND_LENGTH: RangeInclusive<usize> = 2..=500;

/// Request body for POST /channel.
#[derive(Debug, Deserialize)]
pub struct ChannelRequest {
    /// Identifier of the view to make active.
    pub channel: u32,
}

/// Request body for POST /send.
#[derive(Debug, Deserialize)]
pub struct SendRequest {
    pub message: String,
}

/// Response body for GET /health.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub sessions: usize,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

/// POST /channel
///
/// Switches the active view. Unknown ids are rejected with 400.
pub async fn post_channel(
    State(state): State<RelayState>,
    Json(body): Json<ChannelRequest>,
) -> Response {
    match state.views.switch_view(body.channel) {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => {
            tracing::debug!(channel = body.channel, "rejected view switch: {e}");
            error_response(StatusCode::BAD_REQUEST, e.to_string())
        }
    }
}

/// POST /send
///
/// Types `message` into the host's chat box for the active view. Lines
/// outside [`SEND_LENGTH`] are rejected with 400; a non-JSON body is
/// rejected by the extractor with 415.
pub async fn post_send(
    State(state): State<RelayState>,
    Json(body): Json<SendRequest>,
) -> Response {
    let length = body.message.chars().count();
    if !SEND_LENGTH.contains(&length) {
        tracing::debug!(length, "rejected outbound chat");
        return error_response(
            StatusCode::BAD_REQUEST,
            format!(
                "message must be {} to {} characters, got {length}",
                SEND_LENGTH.start(),
                SEND_LENGTH.end()
            ),
        );
    }

    let view = state.views.active_view_name();
    match state.chat.send_chat(view.as_deref(), &body.message) {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => {
            tracing::warn!(error = %e, "outbound chat failed");
            error_response(StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
        }
    }
}

/// GET /health
pub async fn get_health(State(state): State<RelayState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        sessions: state.hub.session_count(),
    })
}

fn error_response(status: StatusCode, error: String) -> Response {
    (status, Json(ErrorResponse { error })).into_response()
}
