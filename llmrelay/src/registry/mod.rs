//! エンドポイント登録管理

/// エンドポイントレジストリ
pub mod endpoints;
