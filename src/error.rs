//! Error types for the docs-qa crate

use thiserror::Error;

/// Result type for docs-qa operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for docs-qa operations
#[derive(Debug, Error)]
pub enum Error {
    /// HTTP client error
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Filesystem error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration file could not be parsed
    #[error("Config error: {0}")]
    Config(String),

    /// Invalid request parameters
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Web crawling error
    #[error("Crawl error: {0}")]
    Crawl(String),

    /// Content cache error
    #[error("Cache error: {0}")]
    Cache(String),

    /// Answering service error
    #[error("Completion error: {0}")]
    Completion(String),
}
