//! Error types for Brigade invite core.

use thiserror::Error;

/// Errors raised while parsing or constructing core values.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CoreError {
    #[error("invalid credential id: {0}")]
    InvalidCredentialId(String),

    #[error("invalid role: {0}")]
    InvalidRole(String),

    #[error("invalid credential kind: {0}")]
    InvalidKind(String),

    #[error("empty identifier")]
    EmptyIdentifier,
}

/// Result type for core operations.
pub type Result<T> = std::result::Result<T, CoreError>;
