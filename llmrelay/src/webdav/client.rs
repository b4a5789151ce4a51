//! WebDAVクライアント
//!
//! リモートストアに必要な最小限の操作のみ（PUT/GET/DELETE/PROPFIND）。
//! multistatusレスポンスは必要なプロパティだけを取り出す。

use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use reqwest::{Method, StatusCode};
use thiserror::Error;

/// WebDAV操作のエラー
#[derive(Debug, Error)]
pub enum WebDavError {
    /// トランスポートエラー
    #[error("Request failed: {0}")]
    Transport(#[from] reqwest::Error),

    /// 想定外のHTTPステータス
    #[error("Unexpected status {0}")]
    Status(StatusCode),

    /// レスポンスの解釈失敗
    #[error("Failed to parse server response: {0}")]
    Parse(String),
}

/// リモートオブジェクトのメタデータ
#[derive(Debug, Clone)]
pub struct RemoteObject {
    /// ファイル名（コレクション相対）
    pub filename: String,
    /// サイズ（バイト）
    pub size: Option<u64>,
    /// リモートの最終更新時刻
    pub modified: Option<DateTime<Utc>>,
}

/// WebDAVクライアント
#[derive(Clone)]
pub struct WebDavClient {
    http: reqwest::Client,
    base_url: String,
    username: String,
    password: String,
}

static PROPFIND_BODY: &str = r#"<?xml version="1.0" encoding="utf-8"?>
<d:propfind xmlns:d="DAV:"><d:prop><d:getlastmodified/><d:getcontentlength/><d:resourcetype/></d:prop></d:propfind>"#;

impl WebDavClient {
    /// 新しいクライアントを作成
    pub fn new(http: reqwest::Client, base_url: &str, username: &str, password: &str) -> Self {
        Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            username: username.to_string(),
            password: password.to_string(),
        }
    }

    fn object_url(&self, name: &str) -> String {
        format!("{}/{}", self.base_url, name)
    }

    fn authed(&self, builder: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        if self.username.is_empty() {
            builder
        } else {
            builder.basic_auth(&self.username, Some(&self.password))
        }
    }

    /// オブジェクトをアップロード
    pub async fn put(&self, name: &str, bytes: Vec<u8>) -> Result<(), WebDavError> {
        let response = self
            .authed(self.http.put(self.object_url(name)))
            .body(bytes)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(WebDavError::Status(response.status()));
        }
        Ok(())
    }

    /// オブジェクトをダウンロード
    pub async fn get(&self, name: &str) -> Result<Vec<u8>, WebDavError> {
        let response = self
            .authed(self.http.get(self.object_url(name)))
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(WebDavError::Status(response.status()));
        }
        Ok(response.bytes().await?.to_vec())
    }

    /// オブジェクトを削除
    pub async fn delete(&self, name: &str) -> Result<(), WebDavError> {
        let response = self
            .authed(self.http.delete(self.object_url(name)))
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(WebDavError::Status(response.status()));
        }
        Ok(())
    }

    /// コレクション直下のオブジェクト一覧を取得
    pub async fn list(&self) -> Result<Vec<RemoteObject>, WebDavError> {
        let method = Method::from_bytes(b"PROPFIND")
            .map_err(|e| WebDavError::Parse(format!("invalid method: {}", e)))?;
        let response = self
            .authed(self.http.request(method, format!("{}/", self.base_url)))
            .header("Depth", "1")
            .header("Content-Type", "application/xml")
            .body(PROPFIND_BODY)
            .send()
            .await?;

        let status = response.status();
        if status != StatusCode::MULTI_STATUS && !status.is_success() {
            return Err(WebDavError::Status(status));
        }

        let body = response.text().await?;
        parse_multistatus(&body)
    }

    /// 接続確認（Depth 0のPROPFIND）
    pub async fn check(&self) -> Result<(), WebDavError> {
        let method = Method::from_bytes(b"PROPFIND")
            .map_err(|e| WebDavError::Parse(format!("invalid method: {}", e)))?;
        let response = self
            .authed(self.http.request(method, format!("{}/", self.base_url)))
            .header("Depth", "0")
            .header("Content-Type", "application/xml")
            .body(PROPFIND_BODY)
            .send()
            .await?;

        let status = response.status();
        if status != StatusCode::MULTI_STATUS && !status.is_success() {
            return Err(WebDavError::Status(status));
        }
        Ok(())
    }
}

static RESPONSE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?is)<(?:[a-z0-9_-]+:)?response[\s>].*?</(?:[a-z0-9_-]+:)?response>").unwrap()
});
static HREF_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?is)<(?:[a-z0-9_-]+:)?href[^>]*>([^<]+)</(?:[a-z0-9_-]+:)?href>").unwrap()
});
static MODIFIED_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?is)<(?:[a-z0-9_-]+:)?getlastmodified[^>]*>([^<]+)</(?:[a-z0-9_-]+:)?getlastmodified>")
        .unwrap()
});
static LENGTH_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?is)<(?:[a-z0-9_-]+:)?getcontentlength[^>]*>([^<]+)</(?:[a-z0-9_-]+:)?getcontentlength>")
        .unwrap()
});

/// PROPFINDのmultistatusレスポンスからオブジェクト一覧を抽出する
///
/// コレクション自身（hrefが`/`で終わる）は読み飛ばす。名前空間の
/// プレフィックスはサーバーによって異なるため、タグ名だけで照合する。
fn parse_multistatus(body: &str) -> Result<Vec<RemoteObject>, WebDavError> {
    if !body.to_ascii_lowercase().contains("multistatus") {
        return Err(WebDavError::Parse(
            "response is not a multistatus document".to_string(),
        ));
    }

    let mut objects = Vec::new();
    for block in RESPONSE_RE.find_iter(body) {
        let block = block.as_str();

        let href = match HREF_RE.captures(block) {
            Some(caps) => caps[1].trim().to_string(),
            None => continue,
        };
        if href.ends_with('/') {
            continue;
        }

        let filename = href.rsplit('/').next().unwrap_or(&href).to_string();
        if filename.is_empty() {
            continue;
        }

        let modified = MODIFIED_RE
            .captures(block)
            .and_then(|caps| DateTime::parse_from_rfc2822(caps[1].trim()).ok())
            .map(|dt| dt.with_timezone(&Utc));

        let size = LENGTH_RE
            .captures(block)
            .and_then(|caps| caps[1].trim().parse::<u64>().ok());

        objects.push(RemoteObject {
            filename,
            size,
            modified,
        });
    }

    Ok(objects)
}
