//! WebDAVバックアップAPI

use super::error::AppError;
use super::response::success;
use crate::webdav::RestoreChoice;
use crate::AppState;
use axum::{
    extract::{Query, State},
    response::IntoResponse,
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::json;

/// WebDAV設定更新リクエスト
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct WebDavConfigRequest {
    /// ベースURL
    pub url: String,
    /// ユーザー名
    pub username: String,
    /// パスワード（空なら保存済みのものを維持）
    pub password: String,
}

/// バックアップ作成リクエスト
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct BackupRequest {
    /// ファイル名（空ならタイムスタンプから導出）
    pub filename: String,
}

/// バックアップ削除リクエスト
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct DeleteBackupsRequest {
    /// 削除するファイル名一覧
    pub filenames: Vec<String>,
}

/// リストアリクエスト
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct RestoreRequest {
    /// 復元するバックアップのファイル名
    pub filename: String,
    /// 競合解決方法（remote / local / keep_local、空はlocal）
    pub choice: String,
}

/// 競合チェックのクエリパラメータ
#[derive(Debug, Deserialize)]
pub struct ConflictQuery {
    /// 対象バックアップのファイル名
    #[serde(default)]
    pub filename: String,
}

/// バックアップ一覧の1項目
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BackupEntry {
    /// ファイル名
    pub filename: String,
    /// サイズ（バイト）
    pub size: Option<u64>,
    /// リモートの最終更新時刻
    pub modified_at: Option<String>,
}

/// GET /api/webdav/config - WebDAV設定取得
pub async fn get_config(State(state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    let view = state.backup.get_config().await?;
    Ok(success(view))
}

/// PUT /api/webdav/config - WebDAV設定更新
pub async fn update_config(
    State(state): State<AppState>,
    Json(req): Json<WebDavConfigRequest>,
) -> Result<impl IntoResponse, AppError> {
    state
        .backup
        .update_config(&req.url, &req.username, &req.password)
        .await?;
    Ok(success(
        json!({ "message": "WebDAV configuration updated successfully" }),
    ))
}

/// POST /api/webdav/test - 接続テスト（保存しない）
pub async fn test_connection(
    State(state): State<AppState>,
    Json(req): Json<WebDavConfigRequest>,
) -> Result<impl IntoResponse, AppError> {
    let outcome = state
        .backup
        .test_connection(&req.url, &req.username, &req.password)
        .await?;
    Ok(success(outcome))
}

/// GET /api/webdav/backups - バックアップ一覧
pub async fn list_backups(State(state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    let objects = state.backup.list_backups().await?;
    let backups: Vec<BackupEntry> = objects
        .into_iter()
        .map(|o| BackupEntry {
            filename: o.filename,
            size: o.size,
            modified_at: o.modified.map(|dt| dt.to_rfc3339()),
        })
        .collect();
    Ok(success(json!({ "backups": backups })))
}

/// DELETE /api/webdav/backups - バックアップ一括削除
pub async fn delete_backups(
    State(state): State<AppState>,
    Json(req): Json<DeleteBackupsRequest>,
) -> Result<impl IntoResponse, AppError> {
    state.backup.delete_backups(&req.filenames).await?;
    Ok(success(json!({ "message": "Backups deleted successfully" })))
}

/// POST /api/webdav/backup - バックアップ作成
pub async fn create_backup(
    State(state): State<AppState>,
    body: Option<Json<BackupRequest>>,
) -> Result<impl IntoResponse, AppError> {
    let filename = body.map(|Json(req)| req.filename).unwrap_or_default();
    let filename = state
        .backup
        .backup(if filename.trim().is_empty() {
            None
        } else {
            Some(filename)
        })
        .await?;
    Ok(success(json!({
        "message": "Backup created successfully",
        "filename": filename,
    })))
}

/// POST /api/webdav/restore - バックアップから復元
pub async fn restore(
    State(state): State<AppState>,
    Json(req): Json<RestoreRequest>,
) -> Result<impl IntoResponse, AppError> {
    let choice = RestoreChoice::parse(&req.choice)?;

    let proxy = state.proxy.clone();
    state
        .backup
        .restore(&req.filename, choice, |config| async move {
            proxy.replace_config(config).await;
            Ok(())
        })
        .await?;

    Ok(success(json!({ "message": "Restore completed successfully" })))
}

/// GET /api/webdav/conflict?filename= - 復元前の競合チェック
pub async fn detect_conflict(
    State(state): State<AppState>,
    Query(query): Query<ConflictQuery>,
) -> Result<impl IntoResponse, AppError> {
    let report = state.backup.detect_conflict(&query.filename).await?;
    Ok(success(report))
}
