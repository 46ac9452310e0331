//! End-to-end tests for the action protocol over the bridge
//!
//! These tests verify the complete action round trip by:
//! 1. Running the bridge relay on an ephemeral port
//! 2. Connecting a fake app that answers actions by testID
//! 3. Driving it with `ActionClient` over real WebSockets

use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use serde_json::{json, Value};
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::Message;

use owl::bridge::BridgeServer;
use owl::protocol::WebSocketFactory;
use owl::{ActionClient, Error, ScrollPosition};

/// Start a bridge and return its address
async fn start_bridge() -> String {
    let server = BridgeServer::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind bridge");
    let addr = server.local_addr().expect("No local address").to_string();
    tokio::spawn(server.serve());
    addr
}

/// Connect a fake app that forwards every action it receives and answers:
/// - `missing` with NOT_FOUND
/// - `broken` with ERROR
/// - `weird` with an unknown outcome type
/// - `silent` not at all
/// - anything else with DONE
async fn connect_fake_app(addr: &str) -> mpsc::UnboundedReceiver<Value> {
    let (ws, _) = tokio_tungstenite::connect_async(format!("ws://{}", addr))
        .await
        .expect("Fake app failed to connect");
    let (mut tx, mut rx) = ws.split();
    let (seen_tx, seen_rx) = mpsc::unbounded_channel();

    tokio::spawn(async move {
        while let Some(Ok(message)) = rx.next().await {
            let Message::Text(text) = message else {
                continue;
            };
            let action: Value = serde_json::from_str(&text).expect("App received invalid JSON");
            let test_id = action["testID"].as_str().unwrap_or_default().to_string();
            let _ = seen_tx.send(action);

            let reply = match test_id.as_str() {
                "silent" => continue,
                "missing" => json!({ "type": "NOT_FOUND", "testID": test_id }),
                "broken" => json!({ "type": "ERROR", "testID": test_id }),
                "weird" => json!({ "type": "UNKNOWN", "testID": test_id }),
                _ => json!({ "type": "DONE" }),
            };
            if tx.send(Message::Text(reply.to_string())).await.is_err() {
                break;
            }
        }
    });

    seen_rx
}

#[tokio::test]
async fn test_press_round_trip() {
    let addr = start_bridge().await;
    let mut seen = connect_fake_app(&addr).await;
    let client = ActionClient::new(WebSocketFactory::new(addr));

    client.press("submit").await.expect("press should resolve");

    assert_eq!(
        seen.recv().await.unwrap(),
        json!({ "type": "ACTION", "action": "PRESS", "testID": "submit" })
    );
}

#[tokio::test]
async fn test_failure_outcomes() {
    let addr = start_bridge().await;
    let _seen = connect_fake_app(&addr).await;
    let client = ActionClient::new(WebSocketFactory::new(addr));

    match client.press("missing").await {
        Err(Error::TargetNotFound { test_id }) => assert_eq!(test_id, "missing"),
        other => panic!("Expected TargetNotFound, got {:?}", other),
    }

    assert!(matches!(
        client.enter_text("broken", "hello").await,
        Err(Error::ActionFailed { .. })
    ));

    match client.call("weird", "onRefresh").await {
        Err(Error::UnrecognizedOutcome(kind)) => assert_eq!(kind, "UNKNOWN"),
        other => panic!("Expected UnrecognizedOutcome, got {:?}", other),
    }
}

#[tokio::test]
async fn test_sequential_actions_arrive_in_order() {
    let addr = start_bridge().await;
    let mut seen = connect_fake_app(&addr).await;
    let client = ActionClient::new(WebSocketFactory::new(addr));

    client
        .scroll_to("list", ScrollPosition::y(10.0))
        .await
        .unwrap();
    client.scroll_to_end("list").await.unwrap();
    client.long_press("item").await.unwrap();

    assert_eq!(
        seen.recv().await.unwrap(),
        json!({ "type": "ACTION", "action": "SCROLL_TO", "testID": "list", "value": { "y": 10 } })
    );
    assert_eq!(
        seen.recv().await.unwrap(),
        json!({ "type": "ACTION", "action": "SCROLL_TO_END", "testID": "list" })
    );
    assert_eq!(seen.recv().await.unwrap()["action"], "LONG_PRESS");
}

#[tokio::test]
async fn test_unanswered_action_times_out() {
    let addr = start_bridge().await;
    let _seen = connect_fake_app(&addr).await;
    let client =
        ActionClient::new(WebSocketFactory::new(addr)).with_timeout(Duration::from_millis(200));

    match client.press("silent").await {
        Err(Error::ActionTimeout { test_id, .. }) => assert_eq!(test_id, "silent"),
        other => panic!("Expected ActionTimeout, got {:?}", other),
    }

    // The bridge keeps serving after an abandoned action
    client.press("after").await.unwrap();
}

#[tokio::test]
async fn test_connect_without_bridge_fails() {
    let client = ActionClient::new(WebSocketFactory::new("127.0.0.1:1"));

    assert!(matches!(client.press("x").await, Err(Error::Channel(_))));
}
