//! WebDAVバックアップ・リストア
//!
//! ストアのスナップショットをリモートへ退避し、一覧・削除・復元と
//! 復元前の競合検出を提供する。プロキシへの参照は持たず、復元後の
//! 反映は呼び出し元から渡されるコールバックに委ねる。

/// WebDAVクライアント
pub mod client;

use crate::common::error::{RelayError, RelayResult};
use crate::db;
use crate::db::settings::{
    SettingsStorage, KEY_WEBDAV_PASSWORD, KEY_WEBDAV_URL, KEY_WEBDAV_USERNAME,
};
use crate::proxy::ProxyConfig;
use crate::types::endpoint::Endpoint;
use chrono::{DateTime, Utc};
use client::{RemoteObject, WebDavClient};
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;
use std::future::Future;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::info;

/// スナップショット形式のバージョン
const SNAPSHOT_VERSION: u32 = 1;

/// ストアのスナップショット（バックアップファイルの本体）
///
/// WebDAV認証情報は含めない。復元がその転送経路自身の設定を
/// 壊してはならないため。
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoreSnapshot {
    /// 形式バージョン
    pub version: u32,
    /// スナップショット作成時刻
    pub created_at: DateTime<Utc>,
    /// エンドポイント一覧
    pub endpoints: Vec<Endpoint>,
}

/// 復元時の競合解決方法
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RestoreChoice {
    /// スナップショットでローカルを上書き
    Remote,
    /// ローカルを保持し、スナップショットにしかない項目を取り込む
    Local,
    /// ローカルをそのまま維持する
    KeepLocal,
}

impl RestoreChoice {
    /// 文字列から解釈する（空はlocal扱い）
    pub fn parse(value: &str) -> RelayResult<Self> {
        match value.trim() {
            "" | "local" => Ok(Self::Local),
            "remote" => Ok(Self::Remote),
            "keep_local" => Ok(Self::KeepLocal),
            _ => Err(RelayError::Validation(
                "choice must be one of: remote, local, keep_local".to_string(),
            )),
        }
    }
}

/// WebDAV設定の外部表現（パスワードは有無のみ）
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WebDavConfigView {
    /// 設定済みか
    pub configured: bool,
    /// ベースURL
    pub url: String,
    /// ユーザー名
    pub username: String,
    /// パスワードが保存されているか
    pub has_password: bool,
}

/// 接続テスト結果
#[derive(Debug, Serialize)]
pub struct TestOutcome {
    /// 成功フラグ
    pub success: bool,
    /// 結果メッセージ
    pub message: String,
}

/// 競合検出結果
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConflictReport {
    /// ローカルの方が新しい（復元でローカル変更が失われる）か
    pub has_conflict: bool,
    /// ローカルストアの最終更新時刻
    pub local_modified_at: Option<DateTime<Utc>>,
    /// スナップショットのリモート更新時刻
    pub remote_modified_at: Option<DateTime<Utc>>,
}

/// バックアップコーディネーター
#[derive(Clone)]
pub struct BackupCoordinator {
    pool: SqlitePool,
    settings: SettingsStorage,
    http: reqwest::Client,
    write_lock: Arc<Mutex<()>>,
}

impl BackupCoordinator {
    /// 新しいコーディネーターを作成
    ///
    /// `write_lock`はレジストリと共有するストア書き込みロック。
    pub fn new(
        pool: SqlitePool,
        settings: SettingsStorage,
        http: reqwest::Client,
        write_lock: Arc<Mutex<()>>,
    ) -> Self {
        Self {
            pool,
            settings,
            http,
            write_lock,
        }
    }

    /// WebDAV設定を取得（パスワードは有無のみ）
    pub async fn get_config(&self) -> RelayResult<WebDavConfigView> {
        let url = self.settings.get_setting(KEY_WEBDAV_URL).await?;
        let username = self
            .settings
            .get_setting(KEY_WEBDAV_USERNAME)
            .await?
            .unwrap_or_default();
        let has_password = self
            .settings
            .get_setting(KEY_WEBDAV_PASSWORD)
            .await?
            .map(|p| !p.is_empty())
            .unwrap_or(false);

        match url {
            Some(url) if !url.is_empty() => Ok(WebDavConfigView {
                configured: true,
                url,
                username,
                has_password,
            }),
            _ => Ok(WebDavConfigView {
                configured: false,
                url: String::new(),
                username: String::new(),
                has_password: false,
            }),
        }
    }

    /// WebDAV設定を更新
    ///
    /// パスワードが空の場合は保存済みのものを維持する。
    pub async fn update_config(
        &self,
        url: &str,
        username: &str,
        password: &str,
    ) -> RelayResult<()> {
        let url = url.trim();
        if url.is_empty() {
            return Err(RelayError::Validation("url is required".to_string()));
        }

        let password = if password.is_empty() {
            self.settings
                .get_setting(KEY_WEBDAV_PASSWORD)
                .await?
                .unwrap_or_default()
        } else {
            password.to_string()
        };

        self.settings.set_setting(KEY_WEBDAV_URL, url).await?;
        self.settings
            .set_setting(KEY_WEBDAV_USERNAME, username.trim())
            .await?;
        self.settings
            .set_setting(KEY_WEBDAV_PASSWORD, &password)
            .await?;

        info!("WebDAV configuration updated");
        Ok(())
    }

    /// 指定された認証情報で接続を試す（保存はしない）
    pub async fn test_connection(
        &self,
        url: &str,
        username: &str,
        password: &str,
    ) -> RelayResult<TestOutcome> {
        let url = url.trim();
        if url.is_empty() {
            return Err(RelayError::Validation("url is required".to_string()));
        }

        let client = WebDavClient::new(self.http.clone(), url, username.trim(), password);
        match client.check().await {
            Ok(()) => Ok(TestOutcome {
                success: true,
                message: "Connection successful".to_string(),
            }),
            Err(e) => Ok(TestOutcome {
                success: false,
                message: e.to_string(),
            }),
        }
    }

    /// ストアをスナップショットしてリモートへアップロード
    ///
    /// ファイル名が空ならUTCのタイムスタンプから導出する。
    pub async fn backup(&self, filename: Option<String>) -> RelayResult<String> {
        let filename = match filename.map(|f| f.trim().to_string()) {
            Some(f) if !f.is_empty() => f,
            _ => format!("backup-{}.db", Utc::now().format("%Y%m%d-%H%M%S")),
        };

        let snapshot = {
            let _guard = self.write_lock.lock().await;
            StoreSnapshot {
                version: SNAPSHOT_VERSION,
                created_at: Utc::now(),
                endpoints: db::endpoints::list_endpoints(&self.pool).await?,
            }
        };

        let body = serde_json::to_vec(&snapshot)
            .map_err(|e| RelayError::Internal(format!("Failed to serialize snapshot: {}", e)))?;

        let client = self.client().await?;
        client
            .put(&filename, body)
            .await
            .map_err(|e| RelayError::Internal(format!("WebDAV backup failed: {}", e)))?;

        info!(filename = %filename, "Backup uploaded");
        Ok(filename)
    }

    /// リモートのバックアップ一覧を取得
    pub async fn list_backups(&self) -> RelayResult<Vec<RemoteObject>> {
        let client = self.client().await?;
        client
            .list()
            .await
            .map_err(|e| RelayError::Internal(format!("Failed to list WebDAV backups: {}", e)))
    }

    /// バックアップを一括削除
    ///
    /// 呼び出し元から見た契約は全件成功か失敗のどちらか。転送層には
    /// 一括削除が無いため1件ずつ削除し、最初の失敗で中断して全体を
    /// エラーにする（削除済みのものは消えたまま）。
    pub async fn delete_backups(&self, filenames: &[String]) -> RelayResult<()> {
        if filenames.is_empty() {
            return Err(RelayError::Validation("filenames is required".to_string()));
        }

        let client = self.client().await?;
        for filename in filenames {
            client.delete(filename).await.map_err(|e| {
                RelayError::Internal(format!("Failed to delete {}: {}", filename, e))
            })?;
        }

        info!(count = filenames.len(), "Backups deleted");
        Ok(())
    }

    /// スナップショットからストアを復元する
    ///
    /// マージ後、ストアから組み立て直したスナップショットを
    /// `apply_config`へ渡す。プロキシへの反映は呼び出し元の責務。
    pub async fn restore<F, Fut>(
        &self,
        filename: &str,
        choice: RestoreChoice,
        apply_config: F,
    ) -> RelayResult<()>
    where
        F: FnOnce(ProxyConfig) -> Fut,
        Fut: Future<Output = RelayResult<()>>,
    {
        let filename = filename.trim();
        if filename.is_empty() {
            return Err(RelayError::Validation("filename is required".to_string()));
        }

        let client = self.client().await?;
        let body = client
            .get(filename)
            .await
            .map_err(|e| RelayError::Internal(format!("WebDAV restore failed: {}", e)))?;

        let snapshot: StoreSnapshot = serde_json::from_slice(&body)
            .map_err(|e| RelayError::Internal(format!("Failed to parse snapshot: {}", e)))?;

        let config = {
            let _guard = self.write_lock.lock().await;

            match choice {
                RestoreChoice::Remote => {
                    db::endpoints::replace_all_endpoints(&self.pool, &snapshot.endpoints).await?;
                }
                RestoreChoice::Local => {
                    let existing = db::endpoints::list_endpoints(&self.pool).await?;
                    // 欠番があってもローカルの末尾より後ろに並べる
                    let mut next_order = existing
                        .iter()
                        .map(|e| e.sort_order + 1)
                        .max()
                        .unwrap_or(0);
                    for endpoint in &snapshot.endpoints {
                        if existing.iter().any(|e| e.name == endpoint.name) {
                            continue;
                        }
                        let mut appended = endpoint.clone();
                        appended.sort_order = next_order;
                        next_order += 1;
                        db::endpoints::create_endpoint(&self.pool, &appended).await?;
                    }
                }
                RestoreChoice::KeepLocal => {}
            }

            self.settings.touch_store_last_modified().await?;

            let endpoints = db::endpoints::list_endpoints(&self.pool).await?;
            ProxyConfig {
                endpoints: endpoints.iter().map(Into::into).collect(),
            }
        };

        apply_config(config).await?;

        info!(filename = %filename, choice = ?choice, "Restore completed");
        Ok(())
    }

    /// 復元前の競合を検出する
    ///
    /// ローカルストアがスナップショットより後に変更されていれば
    /// 競合（復元でローカル変更が失われる）。状態は変更しない。
    pub async fn detect_conflict(&self, filename: &str) -> RelayResult<ConflictReport> {
        let filename = filename.trim();
        if filename.is_empty() {
            return Err(RelayError::Validation("filename is required".to_string()));
        }

        let local_modified_at = self.settings.store_last_modified().await?;

        let client = self.client().await?;
        let objects = client
            .list()
            .await
            .map_err(|e| RelayError::Internal(format!("Failed to list WebDAV backups: {}", e)))?;

        let remote = objects
            .into_iter()
            .find(|o| o.filename == filename)
            .ok_or_else(|| RelayError::NotFound("Backup not found".to_string()))?;

        let has_conflict = match (local_modified_at, remote.modified) {
            (Some(local), Some(remote)) => local > remote,
            _ => false,
        };

        Ok(ConflictReport {
            has_conflict,
            local_modified_at,
            remote_modified_at: remote.modified,
        })
    }

    /// 保存済み設定からクライアントを組み立てる
    async fn client(&self) -> RelayResult<WebDavClient> {
        let url = self
            .settings
            .get_setting(KEY_WEBDAV_URL)
            .await?
            .filter(|u| !u.is_empty())
            .ok_or_else(|| RelayError::Validation("WebDAV is not configured".to_string()))?;
        let username = self
            .settings
            .get_setting(KEY_WEBDAV_USERNAME)
            .await?
            .unwrap_or_default();
        let password = self
            .settings
            .get_setting(KEY_WEBDAV_PASSWORD)
            .await?
            .unwrap_or_default();

        Ok(WebDavClient::new(
            self.http.clone(),
            &url,
            &username,
            &password,
        ))
    }
}
