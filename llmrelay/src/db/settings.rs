//! 設定テーブルのストレージ層
//!
//! SQLiteベースのキーバリュー設定を永続化

use crate::common::error::{RelayError, RelayResult};
use sqlx::SqlitePool;

/// WebDAVベースURLの設定キー
pub const KEY_WEBDAV_URL: &str = "webdav_url";
/// WebDAVユーザー名の設定キー
pub const KEY_WEBDAV_USERNAME: &str = "webdav_username";
/// WebDAVパスワードの設定キー
pub const KEY_WEBDAV_PASSWORD: &str = "webdav_password";
/// ストア最終更新時刻（RFC 3339）の設定キー
pub const KEY_STORE_LAST_MODIFIED: &str = "store_last_modified";

/// 設定ストレージ
#[derive(Clone)]
pub struct SettingsStorage {
    pool: SqlitePool,
}

impl SettingsStorage {
    /// 新しいストレージインスタンスを作成
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// 設定値を取得
    pub async fn get_setting(&self, key: &str) -> RelayResult<Option<String>> {
        let result = sqlx::query_scalar::<_, String>("SELECT value FROM settings WHERE key = ?")
            .bind(key)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| RelayError::Database(format!("Failed to get setting: {}", e)))?;

        Ok(result)
    }

    /// 設定値を保存（INSERT OR REPLACE）
    pub async fn set_setting(&self, key: &str, value: &str) -> RelayResult<()> {
        sqlx::query(
            "INSERT OR REPLACE INTO settings (key, value, updated_at) VALUES (?, ?, datetime('now'))",
        )
        .bind(key)
        .bind(value)
        .execute(&self.pool)
        .await
        .map_err(|e| RelayError::Database(format!("Failed to set setting: {}", e)))?;

        Ok(())
    }

    /// ストア最終更新時刻を現在時刻に進める
    pub async fn touch_store_last_modified(&self) -> RelayResult<()> {
        self.set_setting(KEY_STORE_LAST_MODIFIED, &chrono::Utc::now().to_rfc3339())
            .await
    }

    /// ストア最終更新時刻を取得
    pub async fn store_last_modified(&self) -> RelayResult<Option<chrono::DateTime<chrono::Utc>>> {
        let value = self.get_setting(KEY_STORE_LAST_MODIFIED).await?;
        Ok(value
            .and_then(|s| chrono::DateTime::parse_from_rfc3339(&s).ok())
            .map(|dt| dt.with_timezone(&chrono::Utc)))
    }
}
