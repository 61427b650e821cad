//! Error types for the invite service.
//!
//! Only failures live here. Routine outcomes such as an expired or used-up
//! credential are values ([`RedeemOutcome`](crate::RedeemOutcome)).

use brigade_invite_perms::PermsError;
use brigade_invite_store::StoreError;
use thiserror::Error;

use crate::config::ConfigError;

/// Errors that can occur during invite operations.
#[derive(Debug, Error)]
pub enum InviteError {
    /// The actor may not issue or revoke here.
    #[error("not authorized: {0}")]
    Unauthorized(#[from] PermsError),

    /// The credential to act on does not exist.
    #[error("credential not found: {0}")]
    NotFound(String),

    /// The service configuration would issue unsafe secrets.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Malformed request (zero limits, owner role through an invite, ambiguous target).
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// Every generated code collided with an existing one in the kitchen.
    #[error("no free invite code in kitchen {kitchen_id} after {attempts} attempts")]
    CodeSpaceExhausted { kitchen_id: String, attempts: u32 },

    /// The new credential could not be written.
    #[error("issuance failed: {reason}")]
    IssuanceFailed {
        reason: String,
        #[source]
        source: Option<StoreError>,
    },

    /// Transient storage contention. Safe to retry.
    #[error("store conflict: {0}")]
    StoreConflict(#[source] StoreError),

    /// Unexpected storage or connectivity failure.
    #[error("store failure: {0}")]
    StoreFailure(#[source] StoreError),
}

impl InviteError {
    /// Wrap a store error raised while writing a new credential.
    pub(crate) fn issuance(source: StoreError) -> Self {
        InviteError::IssuanceFailed {
            reason: "could not store credential".to_string(),
            source: Some(source),
        }
    }

    /// Whether the caller may retry the same request.
    pub fn is_retryable(&self) -> bool {
        match self {
            InviteError::StoreConflict(_) => true,
            InviteError::IssuanceFailed {
                source: Some(source),
                ..
            } => source.is_transient(),
            _ => false,
        }
    }

    /// Short text for user-facing surfaces.
    pub fn user_message(&self) -> &'static str {
        match self {
            InviteError::Unauthorized(_) => "You don't have permission to do that.",
            InviteError::NotFound(_) => "That invite doesn't exist.",
            InviteError::InvalidRequest(_) => "That request isn't valid.",
            InviteError::Config(_)
            | InviteError::CodeSpaceExhausted { .. }
            | InviteError::IssuanceFailed { .. }
            | InviteError::StoreConflict(_)
            | InviteError::StoreFailure(_) => "Something went wrong. Please try again.",
        }
    }
}

impl From<StoreError> for InviteError {
    fn from(e: StoreError) -> Self {
        if e.is_transient() {
            InviteError::StoreConflict(e)
        } else {
            tracing::error!(error = %e, "credential store failure");
            InviteError::StoreFailure(e)
        }
    }
}

/// Result type for invite operations.
pub type Result<T> = std::result::Result<T, InviteError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_busy_maps_to_conflict() {
        let err = InviteError::from(StoreError::Busy("locked".into()));
        assert!(matches!(err, InviteError::StoreConflict(_)));
        assert!(err.is_retryable());
    }

    #[test]
    fn test_other_store_errors_are_failures() {
        let err = InviteError::from(StoreError::Unavailable("down".into()));
        assert!(matches!(err, InviteError::StoreFailure(_)));
        assert!(!err.is_retryable());
        assert_eq!(err.user_message(), "Something went wrong. Please try again.");
    }
}
