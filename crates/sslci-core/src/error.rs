//! Error types for the OpenSSL CI tooling.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    // Input errors
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Invalid change count for {category}: {value}")]
    InvalidChangeCount { category: &'static str, value: String },

    #[error("Change count for {category} out of range: {value}")]
    ChangeCountOutOfRange { category: &'static str, value: String },

    // Table errors
    #[error("Invalid build tables: {0}")]
    InvalidTables(String),

    // Infrastructure errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

pub type Result<T> = std::result::Result<T, Error>;

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Serialization(err.to_string())
    }
}

impl From<serde_yaml::Error> for Error {
    fn from(err: serde_yaml::Error) -> Self {
        Error::Serialization(err.to_string())
    }
}
