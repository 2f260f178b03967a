//! Error types for RUETL

use thiserror::Error;

/// Result type alias for RUETL operations
pub type Result<T> = std::result::Result<T, EtlError>;

/// Main error type for RUETL
#[derive(Error, Debug)]
pub enum EtlError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Request error: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Unexpected API status: {0}")]
    ApiStatus(reqwest::StatusCode),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Missing input file: {0}")]
    MissingInput(String),

    #[error("Configuration error: {0}")]
    Config(String),
}
