//! LLM Relay Server Entry Point

use clap::Parser;
use llmrelay::cli::Cli;
use llmrelay::config::{get_env_or, get_env_parse};
use llmrelay::{logging, server, AppState};
use sqlx::sqlite::SqliteConnectOptions;
use std::str::FromStr;
use tracing::{info, warn};

#[derive(Clone)]
struct ServerConfig {
    host: String,
    port: u16,
}

impl ServerConfig {
    fn from_env() -> Self {
        let host = get_env_or("LLMRELAY_HOST", "0.0.0.0");
        let port = get_env_parse("LLMRELAY_PORT", 8788);
        Self { host, port }
    }

    fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

async fn init_db_pool(database_url: &str) -> sqlx::Result<sqlx::SqlitePool> {
    // SQLiteファイルはディレクトリが存在しないと作成できないため、先に作成しておく
    if let Some(path) = database_url.strip_prefix("sqlite:") {
        // `sqlite::memory:` のような特殊指定はスキップ
        if !path.starts_with(':') {
            // `sqlite://` 形式に備えてスラッシュを除去し、クエリ部分を除外
            let normalized = path.trim_start_matches("//");
            let path_without_params = normalized.split('?').next().unwrap_or(normalized);
            let db_path = std::path::Path::new(path_without_params);
            if let Some(parent) = db_path.parent() {
                if let Err(err) = std::fs::create_dir_all(parent) {
                    panic!(
                        "Failed to create database directory {}: {}",
                        parent.display(),
                        err
                    );
                }
            }
        }
    }

    let connect_options = SqliteConnectOptions::from_str(database_url)?.create_if_missing(true);

    sqlx::SqlitePool::connect_with(connect_options).await
}

#[tokio::main]
async fn main() {
    let _cli = Cli::parse();

    let _log_guard = logging::init();
    info!("LLM Relay v{}", env!("CARGO_PKG_VERSION"));

    let database_url = llmrelay::config::database_url();
    let db_pool = init_db_pool(&database_url)
        .await
        .expect("Failed to connect to database");

    sqlx::migrate!("./migrations")
        .run(&db_pool)
        .await
        .expect("Failed to run database migrations");

    let state = AppState::new(db_pool);

    // 初回スナップショットのインストール（以後の変更時は各操作がトリガーする）
    if let Err(e) = state.synchronizer.reload().await {
        warn!("Initial routing snapshot reload failed: {}", e);
    }

    let config = ServerConfig::from_env();
    server::run(state, &config.bind_addr()).await;
}
