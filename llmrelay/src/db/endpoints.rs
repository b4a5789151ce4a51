//! エンドポイントデータベース操作

use crate::types::endpoint::Endpoint;
use sqlx::SqlitePool;

/// エンドポイントを登録
pub async fn create_endpoint(pool: &SqlitePool, endpoint: &Endpoint) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        INSERT INTO endpoints (
            name, api_url, api_key, enabled, transformer, model, remark,
            sort_order, created_at, updated_at
        ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&endpoint.name)
    .bind(&endpoint.api_url)
    .bind(&endpoint.api_key)
    .bind(endpoint.enabled)
    .bind(&endpoint.transformer)
    .bind(&endpoint.model)
    .bind(&endpoint.remark)
    .bind(endpoint.sort_order)
    .bind(endpoint.created_at.to_rfc3339())
    .bind(endpoint.updated_at.to_rfc3339())
    .execute(pool)
    .await?;

    Ok(())
}

/// エンドポイント一覧を取得（表示順）
pub async fn list_endpoints(pool: &SqlitePool) -> Result<Vec<Endpoint>, sqlx::Error> {
    let rows = sqlx::query_as::<_, EndpointRow>(
        r#"
        SELECT name, api_url, api_key, enabled, transformer, model, remark,
               sort_order, created_at, updated_at
        FROM endpoints
        ORDER BY sort_order, name
        "#,
    )
    .fetch_all(pool)
    .await?;

    Ok(rows.into_iter().map(|r| r.into()).collect())
}

/// 名前でエンドポイントを取得
pub async fn find_by_name(pool: &SqlitePool, name: &str) -> Result<Option<Endpoint>, sqlx::Error> {
    let row = sqlx::query_as::<_, EndpointRow>(
        r#"
        SELECT name, api_url, api_key, enabled, transformer, model, remark,
               sort_order, created_at, updated_at
        FROM endpoints
        WHERE name = ?
        "#,
    )
    .bind(name)
    .fetch_optional(pool)
    .await?;

    Ok(row.map(|r| r.into()))
}

/// エンドポイント数を取得
pub async fn count_endpoints(pool: &SqlitePool) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM endpoints")
        .fetch_one(pool)
        .await
}

/// エンドポイントを更新
///
/// `original_name`が行のキー。リネーム時は`endpoint.name`に付け替わる。
pub async fn update_endpoint(
    pool: &SqlitePool,
    original_name: &str,
    endpoint: &Endpoint,
) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        r#"
        UPDATE endpoints SET
            name = ?, api_url = ?, api_key = ?, enabled = ?, transformer = ?,
            model = ?, remark = ?, sort_order = ?, updated_at = ?
        WHERE name = ?
        "#,
    )
    .bind(&endpoint.name)
    .bind(&endpoint.api_url)
    .bind(&endpoint.api_key)
    .bind(endpoint.enabled)
    .bind(&endpoint.transformer)
    .bind(&endpoint.model)
    .bind(&endpoint.remark)
    .bind(endpoint.sort_order)
    .bind(endpoint.updated_at.to_rfc3339())
    .bind(original_name)
    .execute(pool)
    .await?;

    Ok(result.rows_affected() > 0)
}

/// 表示順のみを更新
pub async fn update_sort_order(
    pool: &SqlitePool,
    name: &str,
    sort_order: i64,
    updated_at: &chrono::DateTime<chrono::Utc>,
) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("UPDATE endpoints SET sort_order = ?, updated_at = ? WHERE name = ?")
        .bind(sort_order)
        .bind(updated_at.to_rfc3339())
        .bind(name)
        .execute(pool)
        .await?;

    Ok(result.rows_affected() > 0)
}

/// エンドポイントを削除
pub async fn delete_endpoint(pool: &SqlitePool, name: &str) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM endpoints WHERE name = ?")
        .bind(name)
        .execute(pool)
        .await?;

    Ok(result.rows_affected() > 0)
}

/// 全エンドポイントを置き換える（リストア用）
///
/// 削除と挿入を1トランザクションで行い、途中失敗で中途半端な
/// ストアが残らないようにする。
pub async fn replace_all_endpoints(
    pool: &SqlitePool,
    endpoints: &[Endpoint],
) -> Result<(), sqlx::Error> {
    let mut tx = pool.begin().await?;

    sqlx::query("DELETE FROM endpoints").execute(&mut *tx).await?;

    for endpoint in endpoints {
        sqlx::query(
            r#"
            INSERT INTO endpoints (
                name, api_url, api_key, enabled, transformer, model, remark,
                sort_order, created_at, updated_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&endpoint.name)
        .bind(&endpoint.api_url)
        .bind(&endpoint.api_key)
        .bind(endpoint.enabled)
        .bind(&endpoint.transformer)
        .bind(&endpoint.model)
        .bind(&endpoint.remark)
        .bind(endpoint.sort_order)
        .bind(endpoint.created_at.to_rfc3339())
        .bind(endpoint.updated_at.to_rfc3339())
        .execute(&mut *tx)
        .await?;
    }

    tx.commit().await
}

// --- Internal Row Types ---

#[derive(sqlx::FromRow)]
struct EndpointRow {
    name: String,
    api_url: String,
    api_key: String,
    enabled: bool,
    transformer: String,
    model: String,
    remark: String,
    sort_order: i64,
    created_at: String,
    updated_at: String,
}

impl From<EndpointRow> for Endpoint {
    fn from(row: EndpointRow) -> Self {
        Endpoint {
            name: row.name,
            api_url: row.api_url,
            api_key: row.api_key,
            enabled: row.enabled,
            transformer: row.transformer,
            model: row.model,
            remark: row.remark,
            sort_order: row.sort_order,
            created_at: chrono::DateTime::parse_from_rfc3339(&row.created_at)
                .map(|dt| dt.with_timezone(&chrono::Utc))
                .unwrap_or_else(|_| chrono::Utc::now()),
            updated_at: chrono::DateTime::parse_from_rfc3339(&row.updated_at)
                .map(|dt| dt.with_timezone(&chrono::Utc))
                .unwrap_or_else(|_| chrono::Utc::now()),
        }
    }
}
