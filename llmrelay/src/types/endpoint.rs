//! エンドポイント型定義

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// デフォルトのトランスフォーマータグ
///
/// `transformer`が空のまま登録・更新された場合はこの値に正規化される。
pub const DEFAULT_TRANSFORMER: &str = "claude";

/// エンドポイント
///
/// リレーが転送先として扱う上流プロバイダーの接続設定。
/// `name`が一意キーで、表示順は`sort_order`が保持する。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Endpoint {
    /// 表示名（レジストリ全体で一意）
    pub name: String,
    /// ベースURL（末尾スラッシュ1つを除去して保存）
    pub api_url: String,
    /// APIキー（外部表現では常にマスクされる）
    pub api_key: String,
    /// 有効フラグ（有効なエンドポイントのみアクティブ化できる）
    pub enabled: bool,
    /// プロトコル変換アダプタのタグ（claude / openai / gemini 等）
    pub transformer: String,
    /// 転送時に使うモデル名（transformerがclaude以外の場合は必須）
    pub model: String,
    /// メモ（更新時は常に丸ごと上書き）
    pub remark: String,
    /// 表示順（0始まり）
    pub sort_order: i64,
    /// 登録日時
    pub created_at: DateTime<Utc>,
    /// 最終更新日時
    pub updated_at: DateTime<Utc>,
}

/// APIキーをマスクする
///
/// 4文字以下は`****`、それ以外は`****` + 末尾4文字。
pub fn mask_api_key(key: &str) -> String {
    if key.chars().count() <= 4 {
        "****".to_string()
    } else {
        let tail: String = key
            .chars()
            .rev()
            .take(4)
            .collect::<Vec<_>>()
            .into_iter()
            .rev()
            .collect();
        format!("****{}", tail)
    }
}

/// ベースURLを正規化する（末尾スラッシュをちょうど1つ除去）
pub fn normalize_api_url(api_url: &str) -> String {
    api_url.strip_suffix('/').unwrap_or(api_url).to_string()
}
