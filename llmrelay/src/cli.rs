//! CLIインターフェース

use clap::Parser;

/// LLM Relay - Upstream endpoint management for an LLM routing proxy
#[derive(Parser, Debug)]
#[command(name = "llmrelay")]
#[command(version, about, long_about = None)]
#[command(after_help = r#"ENVIRONMENT VARIABLES:
    LLMRELAY_HOST                Bind address (default: 0.0.0.0)
    LLMRELAY_PORT                Listen port (default: 8788)
    LLMRELAY_LOG_LEVEL           Log level (default: info)
    LLMRELAY_LOG_DIR             Directory for daily-rotated log files
    LLMRELAY_DATABASE_URL        Database URL (default: sqlite:~/.llmrelay/llmrelay.db)
    LLMRELAY_PROBE_TIMEOUT_SECS  Upstream probe timeout (default: 10)
"#)]
pub struct Cli {}
