//! End-to-end subscriber protocol tests over a real WebSocket.

use std::time::Duration;

use serde_json::{json, Value};
use sync_relay::config::PLACEHOLDER_API_KEY;
use sync_relay::distribution::{EventKind, LiveUpdateEvent};
use sync_relay::sync::workers::ScoresWorker;
use sync_relay::sync::{Repository, SyncWorker};

mod common;
use common::{next_json, send_json, stays_quiet, MockUpstream, RunningRelay};

async fn idle_relay() -> (MockUpstream, RunningRelay) {
    let upstream = MockUpstream::fixed(503, "unused").await;
    let relay = RunningRelay::start(common::relay_config(&upstream)).await;
    (upstream, relay)
}

fn score_event(game_id: &str, home: u32, away: u32) -> LiveUpdateEvent {
    let payload = json!({"homeScore": home, "awayScore": away});
    LiveUpdateEvent::new(EventKind::ScoreUpdate, game_id, payload.as_object().cloned().unwrap())
        .with_sport("MLB")
        .with_teams(["St. Louis Cardinals", "Chicago Cubs"])
}

#[tokio::test]
async fn test_connect_ack_and_ping() {
    let (_upstream, relay) = idle_relay().await;
    let mut ws = relay.connect().await;

    let ack = next_json(&mut ws).await;
    assert_eq!(ack["type"], "connection");
    assert!(ack["clientId"].as_str().is_some_and(|id| !id.is_empty()));
    assert!(ack["timestamp"].is_string());

    send_json(&mut ws, json!({"type": "ping"})).await;
    assert_eq!(next_json(&mut ws).await, json!({"type": "pong"}));

    relay.stop().await;
}

#[tokio::test]
async fn test_game_subscription_receives_only_its_events() {
    let (_upstream, relay) = idle_relay().await;
    relay
        .repository
        .upsert_games(&[
            common::game("100", "MLB", "St. Louis Cardinals", "Chicago Cubs", true),
            common::game("200", "NFL", "Dallas Cowboys", "New York Giants", true),
        ])
        .await
        .unwrap();

    let mut cards = relay.connect().await;
    let mut cowboys = relay.connect().await;
    next_json(&mut cards).await;
    next_json(&mut cowboys).await;

    send_json(&mut cards, json!({"type": "subscribe", "gameId": "100"})).await;
    let subscribed = next_json(&mut cards).await;
    assert_eq!(subscribed["message"], "Subscribed to game 100");
    let details = next_json(&mut cards).await;
    assert_eq!(details["type"], "gameDetails");
    assert_eq!(details["game"]["homeTeam"], "St. Louis Cardinals");

    send_json(&mut cowboys, json!({"type": "subscribe", "gameId": "200"})).await;
    next_json(&mut cowboys).await;
    next_json(&mut cowboys).await;

    relay.context.bus.publish(score_event("100", 3, 2)).await.unwrap();

    let update = next_json(&mut cards).await;
    assert_eq!(update["type"], "scoreUpdate");
    assert_eq!(update["gameId"], "100");
    assert_eq!(update["homeScore"], 3);
    assert!(stays_quiet(&mut cowboys, Duration::from_millis(300)).await);

    relay.stop().await;
}

#[tokio::test]
async fn test_malformed_messages_do_not_close_the_socket() {
    let (_upstream, relay) = idle_relay().await;
    let mut ws = relay.connect().await;
    next_json(&mut ws).await;

    ws_send_raw(&mut ws, "{not json").await;
    let err = next_json(&mut ws).await;
    assert_eq!(err, json!({"type": "error", "message": "Invalid message format"}));

    send_json(&mut ws, json!({"type": "teleport"})).await;
    let err = next_json(&mut ws).await;
    assert_eq!(err["message"], "Unknown message type: teleport");

    send_json(&mut ws, json!({"type": "getGameDetails", "gameId": "404"})).await;
    assert_eq!(next_json(&mut ws).await["message"], "Game 404 not found");

    send_json(&mut ws, json!({"type": "ping"})).await;
    assert_eq!(next_json(&mut ws).await["type"], "pong");

    relay.stop().await;
}

async fn ws_send_raw(ws: &mut common::WsClient, text: &str) {
    use futures_util::SinkExt;
    use tokio_tungstenite::tungstenite::Message;
    ws.send(Message::Text(text.into())).await.unwrap();
}

#[tokio::test]
async fn test_score_change_flows_from_upstream_to_subscriber() {
    let upstream = MockUpstream::start(|target, n| {
        if !target.starts_with("/api/v1/schedule") {
            return (404, "{}".into());
        }
        let home = if n == 0 { 0 } else { 1 };
        (200, common::mlb_schedule(745001, "Live", home, 0))
    })
    .await;
    let config = common::relay_config(&upstream);
    let sync = config.sync.clone();
    let relay = RunningRelay::start(config).await;
    let worker = ScoresWorker::new(sync);

    // First sighting: stored, no event.
    let report = worker.run(&relay.context).await.unwrap();
    assert_eq!(report.events, 0);

    let mut ws = relay.connect().await;
    next_json(&mut ws).await;
    send_json(&mut ws, json!({"type": "subscribe", "team": "cardinals"})).await;
    let subscribed = next_json(&mut ws).await;
    assert_eq!(subscribed["games"], 1);

    let report = worker.run(&relay.context).await.unwrap();
    assert_eq!(report.events, 1);

    let update = next_json(&mut ws).await;
    assert_eq!(update["type"], "scoreUpdate");
    assert_eq!(update["gameId"], "745001");
    assert_eq!(update["homeScore"], 1);

    send_json(&mut ws, json!({"type": "getLiveGames"})).await;
    let live = next_json(&mut ws).await;
    assert_eq!(live["games"][0]["homeScore"], 1);

    relay.stop().await;
}

#[tokio::test]
async fn test_wildcard_and_unsubscribe_all() {
    let (_upstream, relay) = idle_relay().await;
    let mut ws = relay.connect().await;
    next_json(&mut ws).await;

    send_json(&mut ws, json!({"type": "subscribe"})).await;
    assert_eq!(next_json(&mut ws).await["message"], "Subscribed to all games");

    relay.context.bus.publish(score_event("999", 1, 0)).await.unwrap();
    assert_eq!(next_json(&mut ws).await["gameId"], "999");

    send_json(&mut ws, json!({"type": "unsubscribe", "gameId": "*"})).await;
    assert_eq!(next_json(&mut ws).await["type"], "unsubscribed");

    relay.context.bus.publish(score_event("999", 2, 0)).await.unwrap();
    assert!(stays_quiet(&mut ws, Duration::from_millis(300)).await);

    relay.stop().await;
}

#[tokio::test]
async fn test_connection_limit_rejects_with_error() {
    let upstream = MockUpstream::fixed(503, "unused").await;
    let mut config = common::relay_config(&upstream);
    config.listener.max_connections = 1;
    let relay = RunningRelay::start(config).await;

    let mut first = relay.connect().await;
    next_json(&mut first).await;

    let mut second = relay.connect().await;
    let rejection = next_json(&mut second).await;
    assert_eq!(rejection["type"], "error");

    relay.stop().await;
}

#[tokio::test]
async fn test_health_and_admin_endpoints() {
    let upstream = MockUpstream::fixed(503, "unused").await;
    let mut config = common::relay_config(&upstream);
    config.admin.enabled = true;
    config.admin.api_key = "test-admin-key".into();
    assert_ne!(config.admin.api_key, PLACEHOLDER_API_KEY);
    let relay = RunningRelay::start(config).await;

    let mut ws = relay.connect().await;
    next_json(&mut ws).await;

    let client = reqwest::Client::builder().no_proxy().build().unwrap();
    let health: Value = client
        .get(relay.http_url("/health"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(health["status"], "ok");
    assert_eq!(health["clients"], 1);

    let denied = client.get(relay.http_url("/admin/sources")).send().await.unwrap();
    assert_eq!(denied.status(), 401);

    let sources: Value = client
        .get(relay.http_url("/admin/sources"))
        .bearer_auth("test-admin-key")
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let names: Vec<&str> = sources
        .as_array()
        .unwrap()
        .iter()
        .map(|s| s["name"].as_str().unwrap())
        .collect();
    assert_eq!(names, ["espn", "mlb"]);
    assert_eq!(sources[0]["circuit_state"], "closed");

    let connections: Value = client
        .get(relay.http_url("/admin/connections"))
        .bearer_auth("test-admin-key")
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(connections["connections"], 1);

    relay.stop().await;
}
