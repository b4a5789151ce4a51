//! Integration Test: アクティブエンドポイント切り替え
//!
//! current/switchの動作と、登録→並び替え→切り替えの一連の流れを
//! 検証する。

use reqwest::Client;
use serde_json::{json, Value};

use crate::support::relay::{create_endpoint, endpoint_body, spawn_relay};

#[tokio::test]
async fn test_current_without_enabled_endpoints_is_404() {
    let (server, _state) = spawn_relay().await;
    let client = Client::new();

    let resp = client
        .get(format!("http://{}/api/endpoints/current", server.addr()))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 404);

    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["error"], "No enabled endpoints");
}

#[tokio::test]
async fn test_switch_to_unknown_endpoint_is_404() {
    let (server, _state) = spawn_relay().await;
    let client = Client::new();

    let resp = client
        .post(format!("http://{}/api/endpoints/switch", server.addr()))
        .json(&json!({ "name": "ghost" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 404);
}

/// 登録 → 一覧 → 並び替え → 切り替えの一連の流れ
#[tokio::test]
async fn test_register_reorder_switch_flow() {
    let (server, _state) = spawn_relay().await;
    let client = Client::new();

    // A（有効）とB（無効）を登録
    create_endpoint(
        &client,
        server.addr(),
        &endpoint_body("A", "https://a.example.com", true),
    )
    .await;
    create_endpoint(
        &client,
        server.addr(),
        &endpoint_body("B", "https://b.example.com", false),
    )
    .await;

    let list: Value = client
        .get(format!("http://{}/api/endpoints", server.addr()))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let endpoints = list["data"]["endpoints"].as_array().unwrap();
    assert_eq!(endpoints[0]["name"], "A");
    assert_eq!(endpoints[0]["sortOrder"], 0);
    assert_eq!(endpoints[1]["name"], "B");
    assert_eq!(endpoints[1]["sortOrder"], 1);

    // 並び替えてもアクティブは変わらない
    let resp = client
        .post(format!("http://{}/api/endpoints/reorder", server.addr()))
        .json(&json!({ "names": ["B", "A"] }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 200);

    // 無効なBへは切り替えられない
    let resp = client
        .post(format!("http://{}/api/endpoints/switch", server.addr()))
        .json(&json!({ "name": "B" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 404);

    // Aへの切り替えは成功し、currentに反映される
    let resp = client
        .post(format!("http://{}/api/endpoints/switch", server.addr()))
        .json(&json!({ "name": "A" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 200);

    let current: Value = client
        .get(format!("http://{}/api/endpoints/current", server.addr()))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(current["data"]["name"], "A");
}

#[tokio::test]
async fn test_disabling_current_endpoint_falls_back() {
    let (server, _state) = spawn_relay().await;
    let client = Client::new();

    create_endpoint(
        &client,
        server.addr(),
        &endpoint_body("A", "https://a.example.com", true),
    )
    .await;
    create_endpoint(
        &client,
        server.addr(),
        &endpoint_body("B", "https://b.example.com", true),
    )
    .await;

    // 最初に有効化されたAがアクティブになる
    let current: Value = client
        .get(format!("http://{}/api/endpoints/current", server.addr()))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(current["data"]["name"], "A");

    // Aを無効化するとスナップショット再構築でBへフォールバック
    client
        .post(format!("http://{}/api/endpoints/A/toggle", server.addr()))
        .json(&json!({ "enabled": false }))
        .send()
        .await
        .unwrap();

    let current: Value = client
        .get(format!("http://{}/api/endpoints/current", server.addr()))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(current["data"]["name"], "B");
}
