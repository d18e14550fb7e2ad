// End-to-end test over a real TCP socket
// Starts the full route set on an ephemeral port, connects with
// tokio-tungstenite and drives the HTTP API with reqwest.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use serde_json::{json, Value};
use tokio::time::{sleep, timeout, Instant};
use tokio_tungstenite::{connect_async, tungstenite::protocol::Message};

use mile_hub::config::HubSettings;
use mile_hub::core::{Hub, RankingPublisher};
use mile_hub::handlers::routes;
use mile_hub::storage::MemoryPlayerStore;

fn start_server() -> (SocketAddr, Hub) {
    let hub = Hub::start(HubSettings::default());
    let publisher = RankingPublisher::new(Arc::new(MemoryPlayerStore::new()), hub.clone());
    let (addr, server) = warp::serve(routes(publisher)).bind_ephemeral(([127, 0, 0, 1], 0));
    tokio::spawn(server);
    (addr, hub)
}

async fn health(client: &reqwest::Client, addr: SocketAddr) -> Value {
    client
        .get(format!("http://{}/health", addr))
        .send()
        .await
        .expect("health request")
        .json()
        .await
        .expect("health body")
}

async fn wait_for_clients(client: &reqwest::Client, addr: SocketAddr, expected: u64) {
    let deadline = Instant::now() + Duration::from_secs(3);
    loop {
        let body = health(client, addr).await;
        if body["websocket_clients"] == expected {
            return;
        }
        assert!(Instant::now() < deadline, "health stuck at {}", body);
        sleep(Duration::from_millis(20)).await;
    }
}

#[tokio::test]
async fn test_score_update_reaches_connected_client() {
    let (addr, _hub) = start_server();
    let http = reqwest::Client::new();

    let body = health(&http, addr).await;
    assert_eq!(body["status"], "ok");
    assert_eq!(body["websocket_clients"], 0);

    let (mut ws_stream, _) = timeout(
        Duration::from_secs(5),
        connect_async(format!("ws://{}/ws", addr)),
    )
    .await
    .expect("connection timeout")
    .expect("websocket connection");
    wait_for_clients(&http, addr, 1).await;

    let created = http
        .post(format!("http://{}/api/players", addr))
        .json(&json!({ "name": "Ana" }))
        .send()
        .await
        .expect("create request");
    assert_eq!(created.status(), 201);
    let player: Value = created.json().await.unwrap();
    assert_eq!(player["avatar"], "👤");
    let id = player["id"].as_str().unwrap().to_string();

    let updated = http
        .put(format!("http://{}/api/players/{}/score", addr, id))
        .json(&json!({ "score": 12 }))
        .send()
        .await
        .expect("score request");
    assert_eq!(updated.status(), 200);
    let updated: Value = updated.json().await.unwrap();
    assert_eq!(updated["score"], 12);

    let text = loop {
        let message = timeout(Duration::from_secs(3), ws_stream.next())
            .await
            .expect("no ranking update arrived")
            .expect("stream ended")
            .expect("websocket error");
        if let Message::Text(text) = message {
            break text;
        }
    };
    let update: Value = serde_json::from_str(&text).unwrap();
    assert_eq!(update["type"], "ranking_update");
    assert_eq!(update["ranking"][0]["position"], 1);
    assert_eq!(update["ranking"][0]["player"]["id"], id.as_str());
    assert_eq!(update["ranking"][0]["player"]["score"], 12);

    ws_stream.close(None).await.expect("close");
    wait_for_clients(&http, addr, 0).await;
}

#[tokio::test]
async fn test_ranking_endpoint_orders_by_score() {
    let (addr, _hub) = start_server();
    let http = reqwest::Client::new();

    let mut ids = Vec::new();
    for name in ["Low", "High"] {
        let player: Value = http
            .post(format!("http://{}/api/players", addr))
            .json(&json!({ "name": name, "avatar": "🎲" }))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        ids.push(player["id"].as_str().unwrap().to_string());
    }
    for (id, score) in ids.iter().zip([3, 30]) {
        let response = http
            .put(format!("http://{}/api/players/{}/score", addr, id))
            .json(&json!({ "score": score }))
            .send()
            .await
            .unwrap();
        assert!(response.status().is_success());
    }

    let ranking: Value = http
        .get(format!("http://{}/api/ranking", addr))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(ranking[0]["position"], 1);
    assert_eq!(ranking[0]["player"]["name"], "High");
    assert_eq!(ranking[1]["position"], 2);
    assert_eq!(ranking[1]["player"]["name"], "Low");
}

#[tokio::test]
async fn test_api_errors_are_json() {
    let (addr, _hub) = start_server();
    let http = reqwest::Client::new();

    let missing = http
        .get(format!("http://{}/api/players/{}", addr, uuid::Uuid::new_v4()))
        .send()
        .await
        .unwrap();
    assert_eq!(missing.status(), 404);
    let body: Value = missing.json().await.unwrap();
    assert!(body["error"].as_str().unwrap().contains("Player not found"));

    let blank = http
        .post(format!("http://{}/api/players", addr))
        .json(&json!({ "name": "   " }))
        .send()
        .await
        .unwrap();
    assert_eq!(blank.status(), 400);

    let unknown_score = http
        .put(format!("http://{}/api/players/{}/score", addr, uuid::Uuid::new_v4()))
        .json(&json!({ "score": 1 }))
        .send()
        .await
        .unwrap();
    assert_eq!(unknown_score.status(), 404);

    // Inbound text is discarded; the client stays registered
    let (mut ws_stream, _) = connect_async(format!("ws://{}/ws", addr)).await.unwrap();
    ws_stream
        .send(Message::Text("ignored".to_string()))
        .await
        .unwrap();
    wait_for_clients(&http, addr, 1).await;
}
