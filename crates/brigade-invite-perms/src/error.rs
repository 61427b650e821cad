//! Error types for the permissions module.

use thiserror::Error;

/// Errors that can occur during authorization checks.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum PermsError {
    /// The actor has no membership in the kitchen.
    #[error("not a member of kitchen {0}")]
    NotAMember(String),

    /// The actor's role or flags do not allow the action.
    #[error("permission denied: {0}")]
    PermissionDenied(String),
}

/// Result type for permission operations.
pub type Result<T> = std::result::Result<T, PermsError>;
