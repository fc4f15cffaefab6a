// SPDX-FileCopyrightText: 2026 Chatline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Relay over a real socket: bootstrap, live events, disconnect cleanup.

use std::sync::Arc;
use std::time::Duration;

use chatline_config::model::TabConfig;
use chatline_core::types::ChatType;
use chatline_gateway::{RelayHub, RelayState, serve};
use chatline_pipeline::TabFanout;
use chatline_test_utils::MockHost;
use chatline_test_utils::fixtures::message;
use chrono::Utc;
use futures::StreamExt;
use tokio::net::TcpListener;
use tokio_tungstenite::connect_async;
use tokio_util::sync::CancellationToken;

type Client = tokio_tungstenite::WebSocketStream<
    tokio_tungstenite::MaybeTlsStream<tokio::net::TcpStream>,
>;

async fn next_json(client: &mut Client) -> serde_json::Value {
    let frame = tokio::time::timeout(Duration::from_secs(5), client.next())
        .await
        .expect("frame in time")
        .expect("stream open")
        .expect("valid frame");
    serde_json::from_str(frame.to_text().unwrap()).unwrap()
}

async fn start() -> (String, Arc<TabFanout>, Arc<RelayHub>, CancellationToken) {
    let fanout = Arc::new(TabFanout::from_config(
        &[
            TabConfig::new("General", &[ChatType::SAY, ChatType::PARTY]),
            TabConfig::new("Party", &[ChatType::PARTY]),
        ],
        100,
    ));
    fanout.dispatch(message(1, ChatType::SAY, "before", Utc::now()));

    let hub = Arc::new(RelayHub::new(1024));
    fanout.add_sink(hub.clone());

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let token = CancellationToken::new();
    let state = RelayState {
        hub: hub.clone(),
        views: fanout.clone(),
        chat: Arc::new(MockHost::new()),
    };
    tokio::spawn(serve(listener, state, token.clone()));

    (format!("ws://{addr}/ws"), fanout, hub, token)
}

#[tokio::test(flavor = "multi_thread")]
async fn subscriber_gets_bootstrap_then_live_events() {
    let (url, fanout, hub, token) = start().await;
    let (mut client, _) = connect_async(&url).await.unwrap();

    let snapshot = next_json(&mut client).await;
    assert_eq!(snapshot["type"], "new_message");
    assert_eq!(snapshot["messages"].as_array().unwrap().len(), 1);

    let active = next_json(&mut client).await;
    assert_eq!(active["type"], "switch_channel");
    assert_eq!(active["channel_name"], "General");

    let list = next_json(&mut client).await;
    assert_eq!(list["type"], "channel_list");
    assert_eq!(list["channels"]["Party"], 1);
    assert_eq!(hub.session_count(), 1);

    fanout.dispatch(message(1, ChatType::PARTY, "live", Utc::now()));
    let live = next_json(&mut client).await;
    assert_eq!(live["type"], "new_message");
    assert_eq!(live["messages"][0]["code"], ChatType::PARTY.0);

    fanout.switch_active(1).unwrap();
    let switched = next_json(&mut client).await;
    assert_eq!(switched["channel_name"], "Party");

    client.close(None).await.unwrap();
    let deadline = tokio::time::Instant::now() + Duration::from_secs(5);
    while hub.session_count() != 0 {
        assert!(tokio::time::Instant::now() < deadline, "session not unregistered");
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    token.cancel();
}

#[tokio::test(flavor = "multi_thread")]
async fn messages_outside_the_active_view_are_not_relayed() {
    let (url, fanout, _hub, token) = start().await;
    let (mut client, _) = connect_async(&url).await.unwrap();
    for _ in 0..3 {
        next_json(&mut client).await;
    }

    fanout.switch_active(1).unwrap();
    assert_eq!(next_json(&mut client).await["type"], "switch_channel");

    fanout.dispatch(message(1, ChatType::SAY, "general only", Utc::now()));
    fanout.dispatch(message(1, ChatType::PARTY, "party", Utc::now()));

    let next = next_json(&mut client).await;
    assert_eq!(next["messages"][0]["code"], ChatType::PARTY.0);
    token.cancel();
}
