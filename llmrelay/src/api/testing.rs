//! エンドポイント疎通テスト・モデル一覧API

use super::error::AppError;
use super::response::success;
use crate::AppState;
use axum::{
    extract::{Path, State},
    response::IntoResponse,
    Json,
};
use serde::Deserialize;
use serde_json::json;
use std::time::Instant;

/// モデル一覧取得リクエスト
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FetchModelsRequest {
    /// ベースURL
    pub api_url: String,
    /// APIキー
    pub api_key: String,
    /// プロトコル変換アダプタのタグ
    pub transformer: String,
}

/// POST/GET /api/endpoints/:name/test - 疎通テスト
///
/// 失敗もHTTP 200の結果オブジェクトで返す。プローブの失敗が
/// リクエストの失敗になることはない。
pub async fn test_endpoint(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let endpoint = state.registry.get(&name).await?;

    let start = Instant::now();
    let outcome = state.prober.probe(&endpoint).await;
    let latency = start.elapsed().as_millis() as u64;

    let body = if outcome.success {
        json!({
            "success": true,
            "latency": latency,
            "response": outcome.message,
            "status": outcome.status,
            "method": outcome.method,
        })
    } else {
        json!({
            "success": false,
            "latency": latency,
            "error": outcome.message,
            "status": outcome.status,
            "method": outcome.method,
        })
    };

    Ok(Json(body))
}

/// POST /api/endpoints/fetch-models - プロバイダーのモデル一覧取得
///
/// プロバイダー側の拒否は400でメッセージをそのまま返す。
pub async fn fetch_models(
    State(state): State<AppState>,
    Json(req): Json<FetchModelsRequest>,
) -> Result<impl IntoResponse, AppError> {
    let transformer = if req.transformer.trim().is_empty() {
        crate::types::endpoint::DEFAULT_TRANSFORMER
    } else {
        req.transformer.trim()
    };

    let models = state
        .prober
        .fetch_models(&req.api_url, &req.api_key, transformer)
        .await?;

    let message = format!("Fetched {} models", models.len());
    Ok(success(json!({
        "models": models,
        "message": message,
    })))
}
