//! LLM Relay Server
//!
//! リクエストルーティングプロキシの上流エンドポイント設定を管理し、
//! 永続ストアとプロキシのライブ状態を同期する中央サーバー

#![warn(missing_docs)]

/// 共通型定義
pub mod common;

/// REST APIハンドラー
pub mod api;

/// CLIインターフェース
pub mod cli;

/// 設定管理（環境変数ヘルパー）
pub mod config;

/// データベースアクセス
pub mod db;

/// エンドポイント疎通チェック
pub mod health;

/// ロギング初期化ユーティリティ
pub mod logging;

/// プロキシのライブルーティング状態
pub mod proxy;

/// エンドポイント登録管理
pub mod registry;

/// サーバー起動・シャットダウン
pub mod server;

/// 設定同期
pub mod sync;

/// 型定義
pub mod types;

/// WebDAVバックアップ・リストア
pub mod webdav;

use std::sync::Arc;
use tokio::sync::Mutex;

/// アプリケーション状態
#[derive(Clone)]
pub struct AppState {
    /// データベース接続プール
    pub db_pool: sqlx::SqlitePool,
    /// エンドポイントレジストリ
    pub registry: registry::endpoints::EndpointRegistry,
    /// プロキシのライブ状態
    pub proxy: proxy::ProxyState,
    /// 設定シンクロナイザ
    pub synchronizer: sync::ConfigSynchronizer,
    /// エンドポイントプローバー
    pub prober: health::prober::EndpointProber,
    /// バックアップコーディネーター
    pub backup: webdav::BackupCoordinator,
    /// 共有HTTPクライアント（接続プーリング有効）
    pub http_client: reqwest::Client,
}

impl AppState {
    /// マイグレーション済みのプールからアプリケーション状態を組み立てる
    ///
    /// レジストリとバックアップコーディネーターはストア書き込みロックを
    /// 共有する。リストアと並行するレジストリ更新は直列化される。
    pub fn new(db_pool: sqlx::SqlitePool) -> Self {
        let http_client = reqwest::Client::new();
        let write_lock = Arc::new(Mutex::new(()));

        let proxy = proxy::ProxyState::new();
        let synchronizer = sync::ConfigSynchronizer::new(db_pool.clone(), proxy.clone());
        let settings = db::settings::SettingsStorage::new(db_pool.clone());

        let registry = registry::endpoints::EndpointRegistry::new(
            db_pool.clone(),
            synchronizer.clone(),
            settings.clone(),
            write_lock.clone(),
        );
        let backup = webdav::BackupCoordinator::new(
            db_pool.clone(),
            settings,
            http_client.clone(),
            write_lock,
        );
        let prober = health::prober::EndpointProber::new(http_client.clone())
            .with_timeout(std::time::Duration::from_secs(config::probe_timeout_secs()));

        Self {
            db_pool,
            registry,
            proxy,
            synchronizer,
            prober,
            backup,
            http_client,
        }
    }
}
