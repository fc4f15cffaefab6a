// SPDX-FileCopyrightText: 2026 Chatline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Relay HTTP server built on axum.

use std::sync::Arc;

use axum::{
    Router,
    routing::{get, post},
};
use chatline_core::{ChatInput, ChatlineError, ViewProvider};
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::handlers;
use crate::hub::RelayHub;
use crate::ws;

/// Shared state for axum request handlers.
#[derive(Clone)]
pub struct RelayState {
    pub hub: Arc<RelayHub>,
    pub views: Arc<dyn ViewProvider>,
    pub chat: Arc<dyn ChatInput>,
}

/// Relay bind address (mirrors `RelayConfig` without depending on the
/// config crate).
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

/// Routes:
/// - GET /ws
/// - POST /channel
/// - POST /send
/// - GET /health
pub fn router(state: RelayState) -> Router {
    Router::new()
        .route("/ws", get(ws::ws_handler))
        .route("/channel", post(handlers::post_channel))
        .route("/send", post(handlers::post_send))
        .route("/health", get(handlers::get_health))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}

pub async fn bind(config: &ServerConfig) -> Result<TcpListener, ChatlineError> {
    let addr = format!("{}:{}", config.host, config.port);
    TcpListener::bind(&addr)
        .await
        .map_err(|e| ChatlineError::Relay {
            message: format!("failed to bind relay to {addr}: {e}"),
            source: Some(Box::new(e)),
        })
}

/// Serves the relay on `listener` until `token` is cancelled.
pub async fn serve(
    listener: TcpListener,
    state: RelayState,
    token: CancellationToken,
) -> Result<(), ChatlineError> {
    if let Ok(addr) = listener.local_addr() {
        tracing::info!("relay listening on {addr}");
    }

    axum::serve(listener, router(state))
        .with_graceful_shutdown(token.cancelled_owned())
        .await
        .map_err(|e| ChatlineError::Relay {
            message: format!("relay server error: {e}"),
            source: Some(Box::new(e)),
        })
}

pub async fn start_server(
    config: &ServerConfig,
    state: RelayState,
    token: CancellationToken,
) -> Result<(), ChatlineError> {
    let listener = bind(config).await?;
    serve(listener, state, token).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Method, Request, StatusCode};
    use chatline_config::model::TabConfig;
    use chatline_core::types::ChatType;
    use chatline_pipeline::TabFanout;
    use chatline_test_utils::{MockHost, SentChat};
    use tower::ServiceExt;

    fn state() -> (RelayState, Arc<TabFanout>, Arc<MockHost>) {
        let fanout = Arc::new(TabFanout::from_config(
            &[
                TabConfig::new("General", &[ChatType::SAY]),
                TabConfig::new("Party", &[ChatType::PARTY]),
            ],
            100,
        ));
        let host = Arc::new(MockHost::new());
        let state = RelayState {
            hub: Arc::new(RelayHub::new(1024)),
            views: fanout.clone(),
            chat: host.clone(),
        };
        (state, fanout, host)
    }

    fn post_json(uri: &str, body: &str) -> Request<Body> {
        Request::builder()
            .method(Method::POST)
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_owned()))
            .unwrap()
    }

    fn post_channel(body: &str) -> Request<Body> {
        post_json("/channel", body)
    }

    async fn error_of(response: axum::response::Response) -> String {
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        json["error"].as_str().unwrap_or_default().to_owned()
    }

    #[tokio::test]
    async fn channel_switch_changes_active_view() {
        let (state, fanout, _host) = state();
        let response = router(state)
            .oneshot(post_channel(r#"{"channel": 1}"#))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NO_CONTENT);
        assert_eq!(fanout.active_view_name().as_deref(), Some("Party"));
    }

    #[tokio::test]
    async fn unknown_channel_is_bad_request() {
        let (state, fanout, _host) = state();
        let response = router(state)
            .oneshot(post_channel(r#"{"channel": 9}"#))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(error_of(response).await, "view not found: 9");
        assert_eq!(fanout.active_view_name().as_deref(), Some("General"));
    }

    #[tokio::test]
    async fn health_reports_session_count() {
        let (state, fanout, _host) = state();
        let _session = state.hub.open(fanout.as_ref());
        let response = router(state)
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["status"], "ok");
        assert_eq!(json["sessions"], 1);
    }

    #[tokio::test]
    async fn send_hands_the_line_to_the_active_view() {
        let (state, fanout, host) = state();
        fanout.switch_active(1).unwrap();
        let response = router(state)
            .oneshot(post_json("/send", r#"{"message": "on my way"}"#))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NO_CONTENT);
        assert_eq!(
            host.sent_chats(),
            vec![SentChat {
                view: Some("Party".into()),
                text: "on my way".into(),
            }]
        );
    }

    #[tokio::test]
    async fn send_rejects_lines_outside_the_length_bounds() {
        let (state, _fanout, host) = state();
        let app = router(state);

        let short = app
            .clone()
            .oneshot(post_json("/send", r#"{"message": "k"}"#))
            .await
            .unwrap();
        assert_eq!(short.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            error_of(short).await,
            "message must be 2 to 500 characters, got 1"
        );

        let body = serde_json::json!({ "message": "a".repeat(501) }).to_string();
        let long = app.clone().oneshot(post_json("/send", &body)).await.unwrap();
        assert_eq!(long.status(), StatusCode::BAD_REQUEST);

        // bounds are inclusive and count characters, not bytes
        let body = serde_json::json!({ "message": "é".repeat(500) }).to_string();
        let limit = app.oneshot(post_json("/send", &body)).await.unwrap();
        assert_eq!(limit.status(), StatusCode::NO_CONTENT);
        assert_eq!(host.sent_chats().len(), 1);
    }

    #[tokio::test]
    async fn send_requires_a_json_body() {
        let (state, _fanout, host) = state();
        let request = Request::builder()
            .method(Method::POST)
            .uri("/send")
            .header("content-type", "text/plain")
            .body(Body::from(r#"{"message": "hello"}"#))
            .unwrap();
        let response = router(state).oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::UNSUPPORTED_MEDIA_TYPE);
        assert!(host.sent_chats().is_empty());
    }

    #[tokio::test]
    async fn send_failure_is_a_server_error() {
        let (state, _fanout, host) = state();
        host.reject_chat();
        let response = router(state)
            .oneshot(post_json("/send", r#"{"message": "hello"}"#))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(error_of(response).await, "internal error: chat box unavailable");
    }

    #[tokio::test]
    async fn bind_failure_is_a_relay_error() {
        let taken = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = taken.local_addr().unwrap().port();
        let err = bind(&ServerConfig {
            host: "127.0.0.1".into(),
            port,
        })
        .await
        .unwrap_err();
        assert!(matches!(err, ChatlineError::Relay { .. }));
    }
}
