//! Artifactory error types.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ArtifactoryError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Artifactory returned {status} for {url}")]
    Status { status: u16, url: String },

    #[error("Invalid package: {0}")]
    InvalidPackage(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, ArtifactoryError>;
