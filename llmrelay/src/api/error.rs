//! APIエラーレスポンス型
//!
//! axum用の共通エラーハンドリング

use crate::common::error::RelayError;
use axum::{http::StatusCode, response::IntoResponse, Json};
use serde_json::json;
use tracing::error;

/// Axum用のエラーレスポンス型
#[derive(Debug)]
pub struct AppError(pub RelayError);

impl From<RelayError> for AppError {
    fn from(err: RelayError) -> Self {
        AppError(err)
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        let status = self.0.status_code();

        // 5xxは詳細をログにだけ残し、外向きには汎用メッセージを返す
        if status.is_server_error() {
            error!("{}", self.0);
        }

        let payload = json!({
            "success": false,
            "error": self.0.external_message(),
        });

        (status, Json(payload)).into_response()
    }
}

/// 未定義パス用の404レスポンス
pub async fn not_found() -> axum::response::Response {
    (
        StatusCode::NOT_FOUND,
        Json(json!({
            "success": false,
            "error": "Not found",
        })),
    )
        .into_response()
}
