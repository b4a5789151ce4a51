//! エンドポイントレジストリ
//!
//! エンドポイント設定のCRUDと表示順・一意性の管理。すべての
//! ミューテーションはストアへ永続化したあとルーティングスナップ
//! ショットの再構築をトリガーする。

use crate::common::error::{RelayError, RelayResult};
use crate::db;
use crate::db::settings::SettingsStorage;
use crate::sync::ConfigSynchronizer;
use crate::types::endpoint::{normalize_api_url, Endpoint, DEFAULT_TRANSFORMER};
use chrono::Utc;
use sqlx::SqlitePool;
use std::collections::HashSet;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{error, info, warn};

/// エンドポイント登録入力
#[derive(Debug, Clone, Default)]
pub struct CreateEndpoint {
    /// 表示名
    pub name: String,
    /// ベースURL
    pub api_url: String,
    /// APIキー
    pub api_key: String,
    /// 有効フラグ
    pub enabled: bool,
    /// プロトコル変換アダプタのタグ（空ならclaude）
    pub transformer: String,
    /// モデル名
    pub model: String,
    /// メモ
    pub remark: String,
}

/// エンドポイント更新入力
///
/// 文字列フィールドは非空の値だけが既存値を上書きする。`remark`は
/// 供給された値（空含む）で常に上書き。`enabled`は三値で、未指定なら
/// 変更しない。
#[derive(Debug, Clone, Default)]
pub struct UpdateEndpoint {
    /// 表示名（リネーム）
    pub name: Option<String>,
    /// ベースURL
    pub api_url: Option<String>,
    /// APIキー
    pub api_key: Option<String>,
    /// 有効フラグ（None = 変更なし）
    pub enabled: Option<bool>,
    /// プロトコル変換アダプタのタグ
    pub transformer: Option<String>,
    /// モデル名
    pub model: Option<String>,
    /// メモ（常に上書き）
    pub remark: String,
}

/// エンドポイントレジストリ
///
/// get-all → 検証 → 変更 → 永続化 の一連をミューテックスで直列化
/// する。ロックはバックアップ・リストアの書き込みフェーズとも共有
/// され、リストアと並行する登録が失われることはない。
#[derive(Clone)]
pub struct EndpointRegistry {
    pool: SqlitePool,
    sync: ConfigSynchronizer,
    settings: SettingsStorage,
    write_lock: Arc<Mutex<()>>,
}

impl EndpointRegistry {
    /// 新しいレジストリを作成
    pub fn new(
        pool: SqlitePool,
        sync: ConfigSynchronizer,
        settings: SettingsStorage,
        write_lock: Arc<Mutex<()>>,
    ) -> Self {
        Self {
            pool,
            sync,
            settings,
            write_lock,
        }
    }

    /// エンドポイント一覧を取得（表示順）
    pub async fn list(&self) -> RelayResult<Vec<Endpoint>> {
        Ok(db::endpoints::list_endpoints(&self.pool).await?)
    }

    /// 名前でエンドポイントを取得
    pub async fn get(&self, name: &str) -> RelayResult<Endpoint> {
        db::endpoints::find_by_name(&self.pool, name)
            .await?
            .ok_or_else(|| RelayError::NotFound("Endpoint not found".to_string()))
    }

    /// エンドポイントを登録
    pub async fn create(&self, req: CreateEndpoint) -> RelayResult<Endpoint> {
        let _guard = self.write_lock.lock().await;

        if req.name.trim().is_empty()
            || req.api_url.trim().is_empty()
            || req.api_key.trim().is_empty()
        {
            return Err(RelayError::Validation(
                "name, apiUrl and apiKey are required".to_string(),
            ));
        }

        let transformer = if req.transformer.trim().is_empty() {
            DEFAULT_TRANSFORMER.to_string()
        } else {
            req.transformer
        };
        if transformer != DEFAULT_TRANSFORMER && req.model.trim().is_empty() {
            return Err(RelayError::Validation(
                "model is required for non-claude transformer".to_string(),
            ));
        }

        let existing = db::endpoints::list_endpoints(&self.pool).await?;
        if existing.iter().any(|e| e.name == req.name) {
            return Err(RelayError::Conflict(
                "Endpoint with this name already exists".to_string(),
            ));
        }

        let now = Utc::now();
        let endpoint = Endpoint {
            name: req.name,
            api_url: normalize_api_url(&req.api_url),
            api_key: req.api_key,
            enabled: req.enabled,
            transformer,
            model: req.model,
            remark: req.remark,
            sort_order: existing.len() as i64,
            created_at: now,
            updated_at: now,
        };

        db::endpoints::create_endpoint(&self.pool, &endpoint).await?;
        self.mark_mutated().await;
        self.reload_best_effort().await;

        info!(name = %endpoint.name, "Endpoint created");
        Ok(endpoint)
    }

    /// エンドポイントを更新
    pub async fn update(&self, name: &str, req: UpdateEndpoint) -> RelayResult<Endpoint> {
        let _guard = self.write_lock.lock().await;

        let mut endpoint = db::endpoints::find_by_name(&self.pool, name)
            .await?
            .ok_or_else(|| RelayError::NotFound("Endpoint not found".to_string()))?;

        if let Some(new_name) = non_blank(&req.name) {
            if new_name != name
                && db::endpoints::find_by_name(&self.pool, new_name)
                    .await?
                    .is_some()
            {
                return Err(RelayError::Conflict(
                    "Endpoint with this name already exists".to_string(),
                ));
            }
            endpoint.name = new_name.to_string();
        }
        if let Some(api_url) = non_blank(&req.api_url) {
            endpoint.api_url = normalize_api_url(api_url);
        }
        if let Some(api_key) = non_blank(&req.api_key) {
            endpoint.api_key = api_key.to_string();
        }
        if let Some(enabled) = req.enabled {
            endpoint.enabled = enabled;
        }
        if let Some(transformer) = non_blank(&req.transformer) {
            endpoint.transformer = transformer.to_string();
        }
        if let Some(model) = non_blank(&req.model) {
            endpoint.model = model.to_string();
        }
        endpoint.remark = req.remark;

        if endpoint.transformer.trim().is_empty() {
            endpoint.transformer = DEFAULT_TRANSFORMER.to_string();
        }
        if endpoint.transformer != DEFAULT_TRANSFORMER && endpoint.model.trim().is_empty() {
            return Err(RelayError::Validation(
                "model is required for non-claude transformer".to_string(),
            ));
        }
        endpoint.updated_at = Utc::now();

        if !db::endpoints::update_endpoint(&self.pool, name, &endpoint).await? {
            return Err(RelayError::NotFound("Endpoint not found".to_string()));
        }
        self.mark_mutated().await;
        self.reload_best_effort().await;

        Ok(endpoint)
    }

    /// エンドポイントを削除
    ///
    /// 残ったエンドポイントの表示順は振り直さない（次のreorderまで
    /// 欠番を許容する）。
    pub async fn delete(&self, name: &str) -> RelayResult<()> {
        let _guard = self.write_lock.lock().await;

        db::endpoints::delete_endpoint(&self.pool, name).await?;
        self.mark_mutated().await;
        self.reload_best_effort().await;

        info!(name = %name, "Endpoint deleted");
        Ok(())
    }

    /// エンドポイントの有効・無効を切り替える
    pub async fn toggle(&self, name: &str, enabled: bool) -> RelayResult<Endpoint> {
        let _guard = self.write_lock.lock().await;

        let mut endpoint = db::endpoints::find_by_name(&self.pool, name)
            .await?
            .ok_or_else(|| RelayError::NotFound("Endpoint not found".to_string()))?;

        endpoint.enabled = enabled;
        endpoint.updated_at = Utc::now();

        if !db::endpoints::update_endpoint(&self.pool, name, &endpoint).await? {
            return Err(RelayError::NotFound("Endpoint not found".to_string()));
        }
        self.mark_mutated().await;
        self.reload_best_effort().await;

        Ok(endpoint)
    }

    /// 表示順を並び替える
    ///
    /// `names`は現在の全エンドポイント名の順列でなければならない。
    /// 検証を通ったあとの永続化は1件ずつ独立にコミットされ、途中の
    /// 失敗はログに残してスキップする（トランザクションではない）。
    pub async fn reorder(&self, names: &[String]) -> RelayResult<()> {
        let _guard = self.write_lock.lock().await;

        let endpoints = db::endpoints::list_endpoints(&self.pool).await?;
        if names.len() != endpoints.len() {
            return Err(RelayError::Validation(
                "names array length doesn't match endpoints count".to_string(),
            ));
        }

        let mut seen = HashSet::with_capacity(names.len());
        for name in names {
            if !seen.insert(name.as_str()) {
                return Err(RelayError::Validation(
                    "duplicate endpoint name in reorder request".to_string(),
                ));
            }
        }

        let known: HashSet<&str> = endpoints.iter().map(|e| e.name.as_str()).collect();
        for name in names {
            if !known.contains(name.as_str()) {
                return Err(RelayError::Validation(
                    "endpoint not found in reorder request".to_string(),
                ));
            }
        }

        let now = Utc::now();
        for (index, name) in names.iter().enumerate() {
            if let Err(e) =
                db::endpoints::update_sort_order(&self.pool, name, index as i64, &now).await
            {
                error!(name = %name, error = %e, "Failed to update endpoint sort order");
            }
        }
        self.mark_mutated().await;
        self.reload_best_effort().await;

        Ok(())
    }

    /// ストア更新ウォーターマークを進める
    async fn mark_mutated(&self) {
        if let Err(e) = self.settings.touch_store_last_modified().await {
            warn!("Failed to advance store watermark: {}", e);
        }
    }

    /// ルーティングスナップショットを再構築する（失敗はログのみ）
    async fn reload_best_effort(&self) {
        if let Err(e) = self.sync.reload().await {
            warn!("Failed to reload routing snapshot: {}", e);
        }
    }
}

fn non_blank(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|s| !s.is_empty())
}
