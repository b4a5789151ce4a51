//! プロキシのライブルーティング状態
//!
//! ストアから構築した不変スナップショットを保持し、リロード時に
//! 1回の差し替えで丸ごと入れ替える。読み手は常にコミット済みの
//! 完全なスナップショットだけを観測する。

use crate::common::error::{RelayError, RelayResult};
use crate::types::endpoint::Endpoint;
use std::sync::Arc;
use tokio::sync::RwLock;

/// ルーティングスナップショット内の上流エンドポイント
#[derive(Debug, Clone, PartialEq)]
pub struct UpstreamEndpoint {
    /// 表示名
    pub name: String,
    /// ベースURL
    pub api_url: String,
    /// APIキー
    pub api_key: String,
    /// 有効フラグ
    pub enabled: bool,
    /// プロトコル変換アダプタのタグ
    pub transformer: String,
    /// 転送時に使うモデル名
    pub model: String,
}

impl From<&Endpoint> for UpstreamEndpoint {
    fn from(ep: &Endpoint) -> Self {
        UpstreamEndpoint {
            name: ep.name.clone(),
            api_url: ep.api_url.clone(),
            api_key: ep.api_key.clone(),
            enabled: ep.enabled,
            transformer: ep.transformer.clone(),
            model: ep.model.clone(),
        }
    }
}

/// ルーティング設定スナップショット（不変）
#[derive(Debug, Clone, Default)]
pub struct ProxyConfig {
    /// 表示順の上流エンドポイント一覧
    pub endpoints: Vec<UpstreamEndpoint>,
}

impl ProxyConfig {
    /// 名前でエンドポイントを探す
    pub fn find(&self, name: &str) -> Option<&UpstreamEndpoint> {
        self.endpoints.iter().find(|e| e.name == name)
    }

    /// 先頭の有効なエンドポイントを返す
    pub fn first_enabled(&self) -> Option<&UpstreamEndpoint> {
        self.endpoints.iter().find(|e| e.enabled)
    }
}

struct ProxyInner {
    config: Arc<ProxyConfig>,
    current: Option<String>,
}

/// プロキシ状態
///
/// スナップショットとアクティブエンドポイント名を保持する。
/// アクティブ名は常に空か、有効なエンドポイントの名前のどちらか。
#[derive(Clone)]
pub struct ProxyState {
    inner: Arc<RwLock<ProxyInner>>,
}

impl Default for ProxyState {
    fn default() -> Self {
        Self::new()
    }
}

impl ProxyState {
    /// 空のスナップショットで初期化
    pub fn new() -> Self {
        Self {
            inner: Arc::new(RwLock::new(ProxyInner {
                config: Arc::new(ProxyConfig::default()),
                current: None,
            })),
        }
    }

    /// 現在のスナップショットを取得（Arcのクローンのみ）
    pub async fn config(&self) -> Arc<ProxyConfig> {
        self.inner.read().await.config.clone()
    }

    /// スナップショットを丸ごと差し替える
    ///
    /// アクティブ名も同時に検証し、新スナップショットで無効になって
    /// いれば先頭の有効なエンドポイントへフォールバックする。
    pub async fn replace_config(&self, config: ProxyConfig) {
        let mut inner = self.inner.write().await;

        let current_still_valid = inner
            .current
            .as_deref()
            .and_then(|name| config.find(name))
            .map(|e| e.enabled)
            .unwrap_or(false);

        if !current_still_valid {
            inner.current = config.first_enabled().map(|e| e.name.clone());
        }

        inner.config = Arc::new(config);
    }

    /// アクティブエンドポイント名を取得
    pub async fn current_endpoint_name(&self) -> Option<String> {
        self.inner.read().await.current.clone()
    }

    /// アクティブエンドポイントを切り替える
    ///
    /// 検証と差し替えを同じ書き込みガード内で行い、検証と切替の間に
    /// スナップショットが変わる競合を避ける。
    pub async fn set_current_endpoint(&self, name: &str) -> RelayResult<()> {
        let mut inner = self.inner.write().await;

        match inner.config.find(name) {
            Some(ep) if ep.enabled => {
                inner.current = Some(name.to_string());
                Ok(())
            }
            _ => Err(RelayError::NotFound(
                "Endpoint not found or not enabled".to_string(),
            )),
        }
    }
}
