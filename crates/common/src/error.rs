//! Unified error type for the edge finder.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("HTTP request failed: {0}")]
    Http(String),

    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Config error: {0}")]
    Config(String),

    #[error("Source {source_id} unavailable: {reason}")]
    SourceUnavailable { source_id: String, reason: String },

    #[error("Source {source_id} timed out after {timeout_ms}ms")]
    SourceTimeout { source_id: String, timeout_ms: u64 },

    #[error("Unknown source: {0}")]
    UnknownSource(String),

    #[error("Invalid market line: {0}")]
    InvalidMarketLine(String),

    #[error("Cancelled before completion")]
    Cancelled,
}
