//! 成功レスポンスのエンベロープ

use axum::Json;
use serde::Serialize;
use serde_json::json;

/// ペイロードを`{"success": true, "data": ...}`に包む
pub fn success<T: Serialize>(data: T) -> Json<serde_json::Value> {
    Json(json!({
        "success": true,
        "data": data,
    }))
}
