//! Integration Test: バックアップ作成・一覧・削除
//!
//! ファイル名の導出、アップロードされるスナップショットの中身、
//! 一覧の変換、一括削除の全件成功契約を検証する。

use reqwest::Client;
use serde_json::{json, Value};
use wiremock::matchers::{method, path, path_regex};
use wiremock::{Mock, MockServer, ResponseTemplate};

use crate::support::dav::mount_propfind;
use crate::support::relay::{configure_webdav, create_endpoint, endpoint_body, spawn_relay};

#[tokio::test]
async fn test_backup_derives_filename_and_uploads_snapshot() {
    let (server, _state) = spawn_relay().await;
    let client = Client::new();

    let remote = MockServer::start().await;
    Mock::given(method("PUT"))
        .and(path_regex(r"^/backup-\d{8}-\d{6}\.db$"))
        .respond_with(ResponseTemplate::new(201))
        .mount(&remote)
        .await;

    configure_webdav(&client, server.addr(), &remote.uri()).await;
    create_endpoint(
        &client,
        server.addr(),
        &endpoint_body("Production", "https://api.example.com", true),
    )
    .await;

    let resp = client
        .post(format!("http://{}/api/webdav/backup", server.addr()))
        .json(&json!({}))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 200);

    let body: Value = resp.json().await.unwrap();
    let filename = body["data"]["filename"].as_str().unwrap();
    assert!(filename.starts_with("backup-"));
    assert!(filename.ends_with(".db"));

    // アップロードされた本文は全エンドポイントを含むスナップショット
    let requests = remote.received_requests().await.unwrap();
    let upload = requests
        .iter()
        .find(|r| r.method.as_str() == "PUT")
        .expect("no upload request recorded");
    let snapshot: Value = serde_json::from_slice(&upload.body).unwrap();
    assert_eq!(snapshot["version"], 1);
    let endpoints = snapshot["endpoints"].as_array().unwrap();
    assert_eq!(endpoints.len(), 1);
    assert_eq!(endpoints[0]["name"], "Production");
    // バックアップ本体にはキーが平文で入る（マスクはAPI表現のみ）
    assert_eq!(endpoints[0]["apiKey"], "sk-Production-12345678");
}

#[tokio::test]
async fn test_backup_with_explicit_filename() {
    let (server, _state) = spawn_relay().await;
    let client = Client::new();

    let remote = MockServer::start().await;
    Mock::given(method("PUT"))
        .and(path("/named.db"))
        .respond_with(ResponseTemplate::new(201))
        .mount(&remote)
        .await;

    configure_webdav(&client, server.addr(), &remote.uri()).await;

    let body: Value = client
        .post(format!("http://{}/api/webdav/backup", server.addr()))
        .json(&json!({ "filename": "named.db" }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body["data"]["filename"], "named.db");
}

#[tokio::test]
async fn test_backup_upload_failure_is_500() {
    let (server, _state) = spawn_relay().await;
    let client = Client::new();

    let remote = MockServer::start().await;
    Mock::given(method("PUT"))
        .respond_with(ResponseTemplate::new(507))
        .mount(&remote)
        .await;

    configure_webdav(&client, server.addr(), &remote.uri()).await;

    let resp = client
        .post(format!("http://{}/api/webdav/backup", server.addr()))
        .json(&json!({}))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 500);
}

#[tokio::test]
async fn test_backup_without_configuration_is_400() {
    let (server, _state) = spawn_relay().await;
    let client = Client::new();

    let resp = client
        .post(format!("http://{}/api/webdav/backup", server.addr()))
        .json(&json!({}))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 400);
}

#[tokio::test]
async fn test_list_backups_returns_remote_manifest() {
    let (server, _state) = spawn_relay().await;
    let client = Client::new();

    let remote = MockServer::start().await;
    mount_propfind(
        &remote,
        &[
            ("backup-20240112-100000.db", "Fri, 12 Jan 2024 10:00:00 GMT", 2048),
            ("backup-20240113-090000.db", "Sat, 13 Jan 2024 09:00:00 GMT", 4096),
        ],
    )
    .await;

    configure_webdav(&client, server.addr(), &remote.uri()).await;

    let body: Value = client
        .get(format!("http://{}/api/webdav/backups", server.addr()))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    let backups = body["data"]["backups"].as_array().unwrap();
    assert_eq!(backups.len(), 2);
    assert_eq!(backups[0]["filename"], "backup-20240112-100000.db");
    assert_eq!(backups[0]["size"], 2048);
    assert_eq!(backups[0]["modifiedAt"], "2024-01-12T10:00:00+00:00");
}

#[tokio::test]
async fn test_delete_backups_with_empty_list_is_400() {
    let (server, _state) = spawn_relay().await;
    let client = Client::new();

    let remote = MockServer::start().await;
    configure_webdav(&client, server.addr(), &remote.uri()).await;

    let resp = client
        .delete(format!("http://{}/api/webdav/backups", server.addr()))
        .json(&json!({ "filenames": [] }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 400);
}

#[tokio::test]
async fn test_delete_backups_success() {
    let (server, _state) = spawn_relay().await;
    let client = Client::new();

    let remote = MockServer::start().await;
    Mock::given(method("DELETE"))
        .respond_with(ResponseTemplate::new(204))
        .mount(&remote)
        .await;

    configure_webdav(&client, server.addr(), &remote.uri()).await;

    let resp = client
        .delete(format!("http://{}/api/webdav/backups", server.addr()))
        .json(&json!({ "filenames": ["a.db", "b.db"] }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 200);

    let deletes = remote
        .received_requests()
        .await
        .unwrap()
        .iter()
        .filter(|r| r.method.as_str() == "DELETE")
        .count();
    assert_eq!(deletes, 2);
}

#[tokio::test]
async fn test_delete_backups_partial_failure_is_500() {
    let (server, _state) = spawn_relay().await;
    let client = Client::new();

    let remote = MockServer::start().await;
    Mock::given(method("DELETE"))
        .and(path("/good.db"))
        .respond_with(ResponseTemplate::new(204))
        .mount(&remote)
        .await;
    Mock::given(method("DELETE"))
        .and(path("/bad.db"))
        .respond_with(ResponseTemplate::new(423))
        .mount(&remote)
        .await;

    configure_webdav(&client, server.addr(), &remote.uri()).await;

    // 1件でも失敗すれば呼び出し全体がエラー
    let resp = client
        .delete(format!("http://{}/api/webdav/backups", server.addr()))
        .json(&json!({ "filenames": ["good.db", "bad.db"] }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 500);
}
