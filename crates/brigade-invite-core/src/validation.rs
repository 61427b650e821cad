//! Credential validation: is this credential usable right now?
//!
//! [`evaluate`] is pure and side-effect free. It backs both the cheap
//! pre-flight check before a join screen is rendered and the atomic
//! redemption path inside the store, so both see identical answers.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::credential::Credential;

/// Outcome of evaluating a credential.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Validity {
    Valid,
    NotFound,
    Revoked,
    Expired,
    UseLimitReached,
}

impl Validity {
    pub fn is_valid(self) -> bool {
        matches!(self, Validity::Valid)
    }

    /// The rejection this outcome corresponds to, if any.
    pub fn rejection(self) -> Option<Rejection> {
        match self {
            Validity::Valid => None,
            Validity::NotFound => Some(Rejection::NotFound),
            Validity::Revoked => Some(Rejection::Revoked),
            Validity::Expired => Some(Rejection::Expired),
            Validity::UseLimitReached => Some(Rejection::UseLimitReached),
        }
    }
}

/// An expected, routine reason a redemption did not go through.
///
/// These are business outcomes, not failures of the system.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Rejection {
    NotFound,
    Revoked,
    Expired,
    UseLimitReached,
    /// A code without a kitchen matched usable credentials in several kitchens.
    Ambiguous,
}

impl Rejection {
    /// Short, specific text for user-facing surfaces.
    pub fn user_message(self) -> &'static str {
        match self {
            Rejection::NotFound => "That invite doesn't exist. Check the code and try again.",
            Rejection::Revoked => "This invite has been cancelled.",
            Rejection::Expired => "This invite has expired. Ask for a new one.",
            Rejection::UseLimitReached => "This invite has already been used up.",
            Rejection::Ambiguous => {
                "That code matches more than one kitchen. Pick the kitchen first."
            }
        }
    }
}

impl fmt::Display for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Rejection::NotFound => "not found",
            Rejection::Revoked => "revoked",
            Rejection::Expired => "expired",
            Rejection::UseLimitReached => "use limit reached",
            Rejection::Ambiguous => "ambiguous",
        };
        f.write_str(name)
    }
}

/// Evaluate whether a credential is currently usable.
///
/// Checks run in a fixed order:
/// 1. Existence
/// 2. Revoked / inactive
/// 3. `now >= expires_at`
/// 4. `current_uses >= max_uses`
pub fn evaluate(credential: Option<&Credential>, now: i64) -> Validity {
    let Some(credential) = credential else {
        return Validity::NotFound;
    };

    if credential.revoked {
        return Validity::Revoked;
    }

    if now >= credential.expires_at {
        return Validity::Expired;
    }

    if credential.current_uses >= credential.max_uses {
        return Validity::UseLimitReached;
    }

    Validity::Valid
}
