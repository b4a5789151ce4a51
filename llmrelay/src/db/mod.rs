//! データベースアクセス層
//!
//! SQLiteベースのデータ永続化

/// エンドポイント管理
pub mod endpoints;

/// 設定管理
pub mod settings;
