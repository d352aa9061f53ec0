//! fieldglean error types

use thiserror::Error;

/// fieldglean error type
#[derive(Error, Debug)]
pub enum Error {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Detector pattern error (invalid regex at construction)
    #[error("Pattern error: {0}")]
    Pattern(String),

    /// Field memory error (capacity exhaustion)
    #[error("Memory error: {0}")]
    Memory(String),

    /// Ingest error (undecodable input at the text boundary)
    #[error("Ingest error: {0}")]
    Ingest(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Result type alias for fieldglean operations
pub type Result<T> = std::result::Result<T, Error>;
