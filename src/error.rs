//! Error types for wp-site-health

use thiserror::Error;

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while loading configuration or rendering a report
#[derive(Debug, Error)]
pub enum Error {
    /// Failed to read the options file from disk
    #[error("failed to read options file: {0}")]
    ConfigRead(#[source] std::io::Error),

    /// Options file is not valid JSON
    #[error("failed to parse options file: {0}")]
    ConfigParse(#[source] serde_json::Error),

    /// Options file does not hold a top-level JSON object
    #[error("options file must contain a JSON object of option name to value")]
    ConfigFormat,

    /// Invalid URL provided
    #[error("invalid URL: {0}")]
    InvalidUrl(String),

    /// Failed to create HTTP client
    #[error("failed to create HTTP client: {0}")]
    HttpClient(String),

    /// Invalid output format specified
    #[error("invalid output format: '{0}' (valid: human, json, none)")]
    InvalidOutputFormat(String),

    /// Invalid output visibility specified
    #[error("invalid output visibility: '{0}' (valid: all, shareable)")]
    InvalidOutputVisibility(String),

    /// Output operation failed
    #[error("output failed: {0}")]
    OutputFailed(#[source] std::io::Error),

    /// JSON serialization failed
    #[error("JSON serialization failed")]
    SerializationFailed(#[from] serde_json::Error),
}
