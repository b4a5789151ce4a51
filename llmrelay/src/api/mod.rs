//! REST APIハンドラー

/// エンドポイント管理
pub mod endpoints;

/// エラーレスポンス
pub mod error;

/// レスポンスエンベロープ
pub mod response;

/// 疎通テスト・モデル一覧
pub mod testing;

/// WebDAVバックアップ
pub mod webdav;

use crate::AppState;
use axum::{
    routing::{get, post},
    Router,
};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

/// アプリケーションのルーターを構築する
pub fn create_app(state: AppState) -> Router {
    Router::new()
        .route(
            "/api/endpoints",
            get(endpoints::list_endpoints).post(endpoints::create_endpoint),
        )
        .route("/api/endpoints/current", get(endpoints::current_endpoint))
        .route("/api/endpoints/switch", post(endpoints::switch_endpoint))
        .route("/api/endpoints/reorder", post(endpoints::reorder_endpoints))
        .route("/api/endpoints/fetch-models", post(testing::fetch_models))
        .route(
            "/api/endpoints/:name",
            get(endpoints::get_endpoint)
                .put(endpoints::update_endpoint)
                .delete(endpoints::delete_endpoint),
        )
        .route(
            "/api/endpoints/:name/toggle",
            post(endpoints::toggle_endpoint).patch(endpoints::toggle_endpoint),
        )
        .route(
            "/api/endpoints/:name/test",
            post(testing::test_endpoint).get(testing::test_endpoint),
        )
        .route(
            "/api/webdav/config",
            get(webdav::get_config).put(webdav::update_config),
        )
        .route("/api/webdav/test", post(webdav::test_connection))
        .route(
            "/api/webdav/backups",
            get(webdav::list_backups).delete(webdav::delete_backups),
        )
        .route("/api/webdav/backup", post(webdav::create_backup))
        .route("/api/webdav/restore", post(webdav::restore))
        .route("/api/webdav/conflict", get(webdav::detect_conflict))
        .fallback(error::not_found)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
