//! エンドポイント疎通チェックとモデル一覧取得
//!
//! 上流プロバイダーへの実リクエストを型付きの結果へ正規化する。
//! 疎通チェックは決して失敗を伝播せず、常に結果オブジェクトを返す。

use crate::common::error::{RelayError, RelayResult};
use crate::types::endpoint::Endpoint;
use serde::Deserialize;
use std::time::Duration;

/// プローブのタイムアウト（秒）
const PROBE_TIMEOUT_SECS: u64 = 10;

/// Anthropic APIバージョンヘッダー値
const ANTHROPIC_VERSION: &str = "2023-06-01";

/// 疎通チェック結果
///
/// 失敗もこの型で表現する（HTTPレイヤはこれを200で返す）。
#[derive(Debug, Clone)]
pub struct ProbeOutcome {
    /// 上流が2xxを返したか
    pub success: bool,
    /// HTTPステータスコード（リクエスト自体が失敗した場合はNone）
    pub status: Option<u16>,
    /// 使用したHTTPメソッド
    pub method: &'static str,
    /// 成功時の要約またはエラーメッセージ
    pub message: String,
}

/// エンドポイントプローバー
#[derive(Clone)]
pub struct EndpointProber {
    http: reqwest::Client,
    timeout: Duration,
}

impl EndpointProber {
    /// 共有HTTPクライアントからプローバーを作成
    pub fn new(http: reqwest::Client) -> Self {
        Self {
            http,
            timeout: Duration::from_secs(PROBE_TIMEOUT_SECS),
        }
    }

    /// タイムアウトを設定
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// エンドポイントの疎通を確認する
    ///
    /// モデル一覧APIへのGETで到達性と認証を軽く確かめる。結果は
    /// 常に`ProbeOutcome`で、トランスポートエラーも失敗結果に畳む。
    pub async fn probe(&self, endpoint: &Endpoint) -> ProbeOutcome {
        let url = format!("{}/v1/models", endpoint.api_url.trim_end_matches('/'));

        let mut request = self.http.get(&url).timeout(self.timeout);
        request = if endpoint.transformer == "claude" {
            request
                .header("x-api-key", &endpoint.api_key)
                .header("anthropic-version", ANTHROPIC_VERSION)
        } else {
            request.bearer_auth(&endpoint.api_key)
        };

        match request.send().await {
            Ok(response) => {
                let status = response.status();
                if status.is_success() {
                    ProbeOutcome {
                        success: true,
                        status: Some(status.as_u16()),
                        method: "GET",
                        message: format!("HTTP {}", status.as_u16()),
                    }
                } else {
                    let body = response.text().await.unwrap_or_default();
                    ProbeOutcome {
                        success: false,
                        status: Some(status.as_u16()),
                        method: "GET",
                        message: excerpt(&body, status.as_u16()),
                    }
                }
            }
            Err(e) => ProbeOutcome {
                success: false,
                status: None,
                method: "GET",
                message: format!("Request failed: {}", e),
            },
        }
    }

    /// プロバイダーのモデル一覧を取得する
    ///
    /// プロバイダー側の拒否（非2xx・接続不可）は検証エラーとして
    /// 呼び出し元へ返る。2xxなのに本文が解釈できない場合だけ内部
    /// エラーになる（安全なデフォルト一覧が存在しないため）。
    pub async fn fetch_models(
        &self,
        api_url: &str,
        api_key: &str,
        transformer: &str,
    ) -> RelayResult<Vec<String>> {
        let base = api_url.trim_end_matches('/');

        let request = match transformer {
            "claude" => self
                .http
                .get(format!("{}/v1/models", base))
                .header("x-api-key", api_key)
                .header("anthropic-version", ANTHROPIC_VERSION),
            "openai" => self
                .http
                .get(format!("{}/v1/models", base))
                .bearer_auth(api_key),
            "gemini" => self
                .http
                .get(format!("{}/v1beta/models", base))
                .query(&[("key", api_key)]),
            other => {
                return Err(RelayError::Validation(format!(
                    "unsupported transformer: {}",
                    other
                )))
            }
        };

        let response = request
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| RelayError::Validation(format!("Request failed: {}", e)))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| RelayError::Validation(format!("Request failed: {}", e)))?;

        if !status.is_success() {
            return Err(RelayError::Validation(excerpt(&body, status.as_u16())));
        }

        let models = match transformer {
            "gemini" => serde_json::from_str::<GeminiModelsResponse>(&body)
                .map_err(|e| RelayError::Internal(format!("Failed to parse model list: {}", e)))?
                .models
                .into_iter()
                .map(|m| {
                    m.name
                        .strip_prefix("models/")
                        .unwrap_or(&m.name)
                        .to_string()
                })
                .collect(),
            // claudeとopenaiは同じ {data: [{id}]} 形式
            _ => serde_json::from_str::<ModelListResponse>(&body)
                .map_err(|e| RelayError::Internal(format!("Failed to parse model list: {}", e)))?
                .data
                .into_iter()
                .map(|m| m.id)
                .collect(),
        };

        Ok(models)
    }
}

/// エラーメッセージ用に本文を切り詰める
fn excerpt(body: &str, status: u16) -> String {
    let trimmed = body.trim();
    if trimmed.is_empty() {
        return format!("HTTP {}", status);
    }
    let mut msg: String = trimmed.chars().take(200).collect();
    if trimmed.chars().count() > 200 {
        msg.push_str("...");
    }
    format!("HTTP {}: {}", status, msg)
}

// --- プロバイダーレスポンス型 ---

/// OpenAI互換のモデル一覧レスポンス（Anthropicも同形式）
#[derive(Debug, Deserialize)]
struct ModelListResponse {
    data: Vec<ModelEntry>,
}

#[derive(Debug, Deserialize)]
struct ModelEntry {
    id: String,
}

/// Geminiのモデル一覧レスポンス
#[derive(Debug, Deserialize)]
struct GeminiModelsResponse {
    models: Vec<GeminiModel>,
}

#[derive(Debug, Deserialize)]
struct GeminiModel {
    name: String,
}
