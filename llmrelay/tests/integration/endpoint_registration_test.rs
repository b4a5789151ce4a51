//! Integration Test: エンドポイント登録
//!
//! 登録時の検証・名前の一意性・デフォルト値・外部表現のマスキングを
//! API境界で検証する。

use reqwest::Client;
use serde_json::{json, Value};

use crate::support::relay::{create_endpoint, endpoint_body, spawn_relay};

#[tokio::test]
async fn test_create_returns_masked_key_and_normalized_url() {
    let (server, _state) = spawn_relay().await;
    let client = Client::new();

    let resp = create_endpoint(
        &client,
        server.addr(),
        &json!({
            "name": "Production",
            "apiUrl": "https://api.example.com/",
            "apiKey": "sk-12345678",
            "enabled": true,
        }),
    )
    .await;
    assert_eq!(resp.status().as_u16(), 200);

    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["success"], true);
    let data = &body["data"];
    assert_eq!(data["name"], "Production");
    // 末尾スラッシュはちょうど1つ除去される
    assert_eq!(data["apiUrl"], "https://api.example.com");
    // APIキーは外部表現では常にマスクされる
    assert_eq!(data["apiKey"], "****5678");
    // transformer未指定はclaudeに正規化される
    assert_eq!(data["transformer"], "claude");
    assert_eq!(data["sortOrder"], 0);
}

#[tokio::test]
async fn test_create_missing_fields_rejected() {
    let (server, _state) = spawn_relay().await;
    let client = Client::new();

    // apiKeyが無い
    let resp = create_endpoint(
        &client,
        server.addr(),
        &json!({
            "name": "Incomplete",
            "apiUrl": "https://api.example.com",
        }),
    )
    .await;
    assert_eq!(resp.status().as_u16(), 400);

    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["success"], false);
    assert!(body["error"].as_str().unwrap().contains("apiKey"));
}

#[tokio::test]
async fn test_duplicate_name_rejected_and_registry_unchanged() {
    let (server, _state) = spawn_relay().await;
    let client = Client::new();

    let first = create_endpoint(
        &client,
        server.addr(),
        &endpoint_body("Production", "https://one.example.com", true),
    )
    .await;
    assert_eq!(first.status().as_u16(), 200);

    // 同名・別URLで再登録
    let dup = create_endpoint(
        &client,
        server.addr(),
        &endpoint_body("Production", "https://two.example.com", true),
    )
    .await;
    assert_eq!(dup.status().as_u16(), 409);

    // レジストリは変化していない
    let list: Value = client
        .get(format!("http://{}/api/endpoints", server.addr()))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let endpoints = list["data"]["endpoints"].as_array().unwrap();
    assert_eq!(endpoints.len(), 1);
    assert_eq!(endpoints[0]["apiUrl"], "https://one.example.com");
}

#[tokio::test]
async fn test_non_claude_transformer_requires_model() {
    let (server, _state) = spawn_relay().await;
    let client = Client::new();

    let resp = create_endpoint(
        &client,
        server.addr(),
        &json!({
            "name": "OpenAI",
            "apiUrl": "https://api.openai.com",
            "apiKey": "sk-12345678",
            "transformer": "openai",
        }),
    )
    .await;
    assert_eq!(resp.status().as_u16(), 400);

    // モデルを指定すれば通る
    let resp = create_endpoint(
        &client,
        server.addr(),
        &json!({
            "name": "OpenAI",
            "apiUrl": "https://api.openai.com",
            "apiKey": "sk-12345678",
            "transformer": "openai",
            "model": "gpt-4o",
        }),
    )
    .await;
    assert_eq!(resp.status().as_u16(), 200);
}

#[tokio::test]
async fn test_list_masks_every_key_and_orders_by_sort_order() {
    let (server, _state) = spawn_relay().await;
    let client = Client::new();

    create_endpoint(
        &client,
        server.addr(),
        &endpoint_body("First", "https://one.example.com", true),
    )
    .await;
    create_endpoint(
        &client,
        server.addr(),
        &endpoint_body("Second", "https://two.example.com", false),
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
    assert_eq!(endpoints.len(), 2);
    assert_eq!(endpoints[0]["name"], "First");
    assert_eq!(endpoints[0]["sortOrder"], 0);
    assert_eq!(endpoints[1]["name"], "Second");
    assert_eq!(endpoints[1]["sortOrder"], 1);
    for ep in endpoints {
        assert_eq!(ep["apiKey"], "****5678");
    }
}
