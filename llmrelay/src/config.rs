//! Configuration management via environment variables
//!
//! Provides helper functions for reading `LLMRELAY_*` environment
//! variables with defaults.

/// Get an environment variable
///
/// # Returns
/// * `Some(value)` - The environment variable value
/// * `None` - The variable is not set
pub fn get_env(name: &str) -> Option<String> {
    std::env::var(name).ok()
}

/// Get an environment variable with a default value
pub fn get_env_or(name: &str, default: &str) -> String {
    get_env(name).unwrap_or_else(|| default.to_string())
}

/// Get an environment variable, parsing to a specific type
///
/// Returns the default when the variable is unset or fails to parse.
pub fn get_env_parse<T: std::str::FromStr>(name: &str, default: T) -> T {
    get_env(name).and_then(|s| s.parse().ok()).unwrap_or(default)
}

/// プローブのタイムアウト（秒）を取得
///
/// 環境変数 `LLMRELAY_PROBE_TIMEOUT_SECS` から取得し、未設定なら10秒。
pub fn probe_timeout_secs() -> u64 {
    get_env_parse("LLMRELAY_PROBE_TIMEOUT_SECS", 10)
}

/// データベースURLを取得
///
/// 環境変数 `LLMRELAY_DATABASE_URL` が未設定ならホームディレクトリ
/// 配下の既定パスを使う。
pub fn database_url() -> String {
    get_env("LLMRELAY_DATABASE_URL").unwrap_or_else(|| {
        let home = std::env::var("HOME")
            .or_else(|_| std::env::var("USERPROFILE"))
            .unwrap_or_else(|_| ".".to_string());
        format!("sqlite:{}/.llmrelay/llmrelay.db", home)
    })
}
