//! Core Error Types
//!
//! Defines the foundational error types used across the Windsite workspace.
//! These error types are dependency-free (only thiserror + std) to keep the core
//! crate lightweight.
//!
//! The main application crate extends these with additional variants
//! (e.g., Database, Sqlite) that require heavier dependencies.

use thiserror::Error;

/// Core error type for the Windsite workspace.
#[derive(Error, Debug)]
pub enum CoreError {
    /// JSON serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Validation errors
    #[error("Validation error: {0}")]
    Validation(String),

    /// Not found errors
    #[error("Not found: {0}")]
    NotFound(String),

    /// Parse errors
    #[error("Parse error: {0}")]
    Parse(String),

    /// Generic internal errors
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Result type alias for core errors
pub type CoreResult<T> = Result<T, CoreError>;

impl CoreError {
    /// Create a validation error
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Create a not found error
    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    /// Create a parse error
    pub fn parse(msg: impl Into<String>) -> Self {
        Self::Parse(msg.into())
    }

    /// Create an internal error
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }
}

/// Convert CoreError to a string
impl From<CoreError> for String {
    fn from(err: CoreError) -> String {
        err.to_string()
    }
}

/// Errors raised by a `ProjectStore` implementation.
///
/// `VersionConflict` is the only recoverable variant: callers re-read and
/// retry once before giving up.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum StoreError {
    /// The record changed since it was read (or already exists on create)
    #[error("Version conflict on '{key}': expected {expected:?}, found {found:?}")]
    VersionConflict {
        key: String,
        expected: Option<u64>,
        found: Option<u64>,
    },

    /// The backing store could not be reached
    #[error("Store unavailable: {0}")]
    Unavailable(String),

    /// A stored record could not be decoded
    #[error("Corrupt record: {0}")]
    Corrupt(String),
}

impl StoreError {
    /// Create an unavailable error
    pub fn unavailable(msg: impl Into<String>) -> Self {
        Self::Unavailable(msg.into())
    }

    /// Create a corrupt-record error
    pub fn corrupt(msg: impl Into<String>) -> Self {
        Self::Corrupt(msg.into())
    }

    pub fn is_conflict(&self) -> bool {
        matches!(self, Self::VersionConflict { .. })
    }
}
