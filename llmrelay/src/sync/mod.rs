//! 設定同期
//!
//! ストアの内容からルーティングスナップショットを組み立て、
//! プロキシへ1回の差し替えでインストールする。

use crate::common::error::RelayResult;
use crate::db;
use crate::proxy::{ProxyConfig, ProxyState};
use sqlx::SqlitePool;
use tracing::debug;

/// 設定シンクロナイザ
///
/// レジストリの各ミューテーションとリストアの後に呼ばれる。
/// 失敗しても呼び出し元の操作は成功扱いのまま（ストアが真実で、
/// プロキシ側は次の成功したリロードで自己修復する）。
#[derive(Clone)]
pub struct ConfigSynchronizer {
    pool: SqlitePool,
    proxy: ProxyState,
}

impl ConfigSynchronizer {
    /// 新しいシンクロナイザを作成
    pub fn new(pool: SqlitePool, proxy: ProxyState) -> Self {
        Self { pool, proxy }
    }

    /// ストアからスナップショットを組み立てる
    pub async fn snapshot(&self) -> RelayResult<ProxyConfig> {
        let endpoints = db::endpoints::list_endpoints(&self.pool).await?;
        Ok(ProxyConfig {
            endpoints: endpoints.iter().map(Into::into).collect(),
        })
    }

    /// ストアを読み直してプロキシへインストールする
    pub async fn reload(&self) -> RelayResult<()> {
        let config = self.snapshot().await?;
        let count = config.endpoints.len();
        self.proxy.replace_config(config).await;
        debug!(endpoint_count = count, "Installed routing snapshot");
        Ok(())
    }
}
