//! エンドポイント疎通チェック

/// プローバー
pub mod prober;
