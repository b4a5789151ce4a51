//! エンドポイント管理API

use super::error::AppError;
use super::response::success;
use crate::registry::endpoints::{CreateEndpoint, UpdateEndpoint};
use crate::types::endpoint::{mask_api_key, Endpoint};
use crate::AppState;
use axum::{
    extract::{Path, State},
    response::IntoResponse,
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::json;

/// エンドポイント登録リクエスト
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CreateEndpointRequest {
    /// 表示名
    pub name: String,
    /// ベースURL
    pub api_url: String,
    /// APIキー
    pub api_key: String,
    /// 有効フラグ
    pub enabled: bool,
    /// プロトコル変換アダプタのタグ
    pub transformer: String,
    /// モデル名
    pub model: String,
    /// メモ
    pub remark: String,
}

/// エンドポイント更新リクエスト
///
/// `enabled`は三値（未指定なら変更なし）。`remark`は常に上書き。
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct UpdateEndpointRequest {
    /// 表示名（リネーム）
    pub name: Option<String>,
    /// ベースURL
    pub api_url: Option<String>,
    /// APIキー
    pub api_key: Option<String>,
    /// 有効フラグ
    pub enabled: Option<bool>,
    /// プロトコル変換アダプタのタグ
    pub transformer: Option<String>,
    /// モデル名
    pub model: Option<String>,
    /// メモ
    pub remark: String,
}

/// 有効・無効切り替えリクエスト
#[derive(Debug, Deserialize)]
pub struct ToggleRequest {
    /// 有効フラグ
    pub enabled: bool,
}

/// 切り替えリクエスト
#[derive(Debug, Deserialize)]
pub struct SwitchRequest {
    /// 切り替え先のエンドポイント名
    pub name: String,
}

/// 並び替えリクエスト
#[derive(Debug, Deserialize)]
pub struct ReorderRequest {
    /// 全エンドポイント名の新しい順列
    pub names: Vec<String>,
}

/// エンドポイントの外部表現（APIキーはマスク済み）
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EndpointResponse {
    /// 表示名
    pub name: String,
    /// ベースURL
    pub api_url: String,
    /// マスク済みAPIキー
    pub api_key: String,
    /// 有効フラグ
    pub enabled: bool,
    /// プロトコル変換アダプタのタグ
    pub transformer: String,
    /// モデル名
    pub model: String,
    /// メモ
    pub remark: String,
    /// 表示順
    pub sort_order: i64,
    /// 登録日時
    pub created_at: String,
    /// 最終更新日時
    pub updated_at: String,
}

impl From<Endpoint> for EndpointResponse {
    fn from(ep: Endpoint) -> Self {
        EndpointResponse {
            api_key: mask_api_key(&ep.api_key),
            name: ep.name,
            api_url: ep.api_url,
            enabled: ep.enabled,
            transformer: ep.transformer,
            model: ep.model,
            remark: ep.remark,
            sort_order: ep.sort_order,
            created_at: ep.created_at.to_rfc3339(),
            updated_at: ep.updated_at.to_rfc3339(),
        }
    }
}

/// GET /api/endpoints - エンドポイント一覧
pub async fn list_endpoints(State(state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    let endpoints = state.registry.list().await?;
    let endpoints: Vec<EndpointResponse> = endpoints.into_iter().map(Into::into).collect();
    Ok(success(json!({ "endpoints": endpoints })))
}

/// POST /api/endpoints - エンドポイント登録
pub async fn create_endpoint(
    State(state): State<AppState>,
    Json(req): Json<CreateEndpointRequest>,
) -> Result<impl IntoResponse, AppError> {
    let created = state
        .registry
        .create(CreateEndpoint {
            name: req.name,
            api_url: req.api_url,
            api_key: req.api_key,
            enabled: req.enabled,
            transformer: req.transformer,
            model: req.model,
            remark: req.remark,
        })
        .await?;
    Ok(success(EndpointResponse::from(created)))
}

/// GET /api/endpoints/:name - エンドポイント取得
pub async fn get_endpoint(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let endpoint = state.registry.get(&name).await?;
    Ok(success(EndpointResponse::from(endpoint)))
}

/// PUT /api/endpoints/:name - エンドポイント更新
pub async fn update_endpoint(
    State(state): State<AppState>,
    Path(name): Path<String>,
    Json(req): Json<UpdateEndpointRequest>,
) -> Result<impl IntoResponse, AppError> {
    let updated = state
        .registry
        .update(
            &name,
            UpdateEndpoint {
                name: req.name,
                api_url: req.api_url,
                api_key: req.api_key,
                enabled: req.enabled,
                transformer: req.transformer,
                model: req.model,
                remark: req.remark,
            },
        )
        .await?;
    Ok(success(EndpointResponse::from(updated)))
}

/// DELETE /api/endpoints/:name - エンドポイント削除
pub async fn delete_endpoint(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    state.registry.delete(&name).await?;
    Ok(success(json!({ "message": "Endpoint deleted successfully" })))
}

/// POST/PATCH /api/endpoints/:name/toggle - 有効・無効切り替え
pub async fn toggle_endpoint(
    State(state): State<AppState>,
    Path(name): Path<String>,
    Json(req): Json<ToggleRequest>,
) -> Result<impl IntoResponse, AppError> {
    let toggled = state.registry.toggle(&name, req.enabled).await?;
    Ok(success(json!({ "enabled": toggled.enabled })))
}

/// GET /api/endpoints/current - アクティブエンドポイント名
pub async fn current_endpoint(
    State(state): State<AppState>,
) -> Result<impl IntoResponse, AppError> {
    match state.proxy.current_endpoint_name().await {
        Some(name) => Ok(success(json!({ "name": name }))),
        None => Err(AppError(crate::common::error::RelayError::NotFound(
            "No enabled endpoints".to_string(),
        ))),
    }
}

/// POST /api/endpoints/switch - アクティブエンドポイント切り替え
pub async fn switch_endpoint(
    State(state): State<AppState>,
    Json(req): Json<SwitchRequest>,
) -> Result<impl IntoResponse, AppError> {
    state.proxy.set_current_endpoint(&req.name).await?;
    Ok(success(json!({
        "message": "Endpoint switched successfully",
        "name": req.name,
    })))
}

/// POST /api/endpoints/reorder - 並び替え
pub async fn reorder_endpoints(
    State(state): State<AppState>,
    Json(req): Json<ReorderRequest>,
) -> Result<impl IntoResponse, AppError> {
    state.registry.reorder(&req.names).await?;
    Ok(success(
        json!({ "message": "Endpoints reordered successfully" }),
    ))
}
