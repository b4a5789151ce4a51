//! Integration Test: 表示順の並び替え
//!
//! reorderの検証規則（長さ・重複・未知名）と、有効な順列が
//! sort_orderへ密に反映されることを検証する。

use reqwest::Client;
use serde_json::{json, Value};

use crate::support::relay::{create_endpoint, endpoint_body, spawn_relay};

async fn list_names(client: &Client, addr: std::net::SocketAddr) -> Vec<(String, i64)> {
    let list: Value = client
        .get(format!("http://{}/api/endpoints", addr))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    list["data"]["endpoints"]
        .as_array()
        .unwrap()
        .iter()
        .map(|e| {
            (
                e["name"].as_str().unwrap().to_string(),
                e["sortOrder"].as_i64().unwrap(),
            )
        })
        .collect()
}

#[tokio::test]
async fn test_reorder_applies_permutation() {
    let (server, _state) = spawn_relay().await;
    let client = Client::new();

    for name in ["Alpha", "Beta", "Gamma"] {
        create_endpoint(
            &client,
            server.addr(),
            &endpoint_body(name, "https://api.example.com", true),
        )
        .await;
    }

    let resp = client
        .post(format!("http://{}/api/endpoints/reorder", server.addr()))
        .json(&json!({ "names": ["Gamma", "Alpha", "Beta"] }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 200);

    let names = list_names(&client, server.addr()).await;
    assert_eq!(
        names,
        vec![
            ("Gamma".to_string(), 0),
            ("Alpha".to_string(), 1),
            ("Beta".to_string(), 2),
        ]
    );
}

#[tokio::test]
async fn test_reorder_rejections_leave_registry_unchanged() {
    let (server, _state) = spawn_relay().await;
    let client = Client::new();

    for name in ["Alpha", "Beta"] {
        create_endpoint(
            &client,
            server.addr(),
            &endpoint_body(name, "https://api.example.com", true),
        )
        .await;
    }

    let reorder = |names: Value| {
        let client = client.clone();
        let addr = server.addr();
        async move {
            client
                .post(format!("http://{}/api/endpoints/reorder", addr))
                .json(&json!({ "names": names }))
                .send()
                .await
                .unwrap()
        }
    };

    // 長さ不一致
    let resp = reorder(json!(["Alpha"])).await;
    assert_eq!(resp.status().as_u16(), 400);

    // 重複
    let resp = reorder(json!(["Alpha", "Alpha"])).await;
    assert_eq!(resp.status().as_u16(), 400);

    // 未知の名前
    let resp = reorder(json!(["Alpha", "Ghost"])).await;
    assert_eq!(resp.status().as_u16(), 400);

    // どのケースでもレコードは一切変更されない
    let names = list_names(&client, server.addr()).await;
    assert_eq!(
        names,
        vec![("Alpha".to_string(), 0), ("Beta".to_string(), 1)]
    );
}
