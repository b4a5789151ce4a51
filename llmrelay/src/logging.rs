//! ロギング初期化ユーティリティ
//!
//! `LLMRELAY_LOG_LEVEL`（または`RUST_LOG`）でフィルタを制御する。
//! `LLMRELAY_LOG_DIR`が設定されていれば日次ローテーションのファイル
//! 出力も併用する。

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// ロギングを初期化する
///
/// 返されるガードはプロセス終了までドロップしないこと（ドロップすると
/// ファイル出力のフラッシュが止まる）。
pub fn init() -> Option<WorkerGuard> {
    let filter = EnvFilter::try_from_env("LLMRELAY_LOG_LEVEL")
        .or_else(|_| EnvFilter::try_from_default_env())
        .unwrap_or_else(|_| EnvFilter::new("info"));

    match std::env::var("LLMRELAY_LOG_DIR") {
        Ok(dir) if !dir.is_empty() => {
            let file_appender = tracing_appender::rolling::daily(&dir, "llmrelay.log");
            let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

            tracing_subscriber::registry()
                .with(filter)
                .with(fmt::layer())
                .with(fmt::layer().with_ansi(false).with_writer(non_blocking))
                .init();

            Some(guard)
        }
        _ => {
            tracing_subscriber::registry()
                .with(filter)
                .with(fmt::layer())
                .init();

            None
        }
    }
}
