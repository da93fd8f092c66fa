//! Error Handling
//!
//! Unified error types for the application layer (configuration, storage
//! bootstrap, I/O). Pipeline failures have their own taxonomy in
//! `services::pipeline::PipelineError`.
//! Uses thiserror for ergonomic error definitions.

use thiserror::Error;

use windsite_core::StoreError;

/// Application-wide error type
#[derive(Error, Debug)]
pub enum AppError {
    /// Database errors
    #[error("Database error: {0}")]
    Database(String),

    /// SQLite errors (auto-converted from rusqlite::Error)
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// File I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Validation errors
    #[error("Validation error: {0}")]
    Validation(String),

    /// Collaborator construction errors (LLM provider, tool client)
    #[error("Collaborator error: {0}")]
    Collaborator(String),

    /// Generic internal errors
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Result type alias for application errors
pub type AppResult<T> = Result<T, AppError>;

impl AppError {
    /// Create a database error
    pub fn database(msg: impl Into<String>) -> Self {
        Self::Database(msg.into())
    }

    /// Create a config error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create a validation error
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Create a collaborator error
    pub fn collaborator(msg: impl Into<String>) -> Self {
        Self::Collaborator(msg.into())
    }

    /// Create an internal error
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }
}

/// Storage-layer failures reach the pipeline as an unavailable store
impl From<AppError> for StoreError {
    fn from(err: AppError) -> StoreError {
        StoreError::unavailable(err.to_string())
    }
}

/// Convert AppError to a string
impl From<AppError> for String {
    fn from(err: AppError) -> String {
        err.to_string()
    }
}
