//! Metrics error types.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum MetricsError {
    #[error("Process not found: {0}")]
    ProcessNotFound(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, MetricsError>;
