//! Issuance limits.
//!
//! The issuance service never applies defaults on its own; callers pass the
//! limits explicitly. [`suggested_limits`] is the policy callers are expected
//! to apply for each issuer role.

use serde::{Deserialize, Serialize};

use brigade_invite_core::{Role, MINUTE_MILLIS};

/// Expiry and use limits for a new credential.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct IssueLimits {
    pub expiry_minutes: u32,
    pub max_uses: u32,
}

impl IssueLimits {
    pub const fn new(expiry_minutes: u32, max_uses: u32) -> Self {
        Self {
            expiry_minutes,
            max_uses,
        }
    }

    /// Expiry as milliseconds.
    pub fn expiry_millis(&self) -> i64 {
        i64::from(self.expiry_minutes) * MINUTE_MILLIS
    }
}

/// Limits for a restricted issuer: 30 minutes, 2 uses.
pub const RESTRICTED_LIMITS: IssueLimits = IssueLimits::new(30, 2);

/// Limits for the owner or an admin: 60 minutes, 5 uses.
pub const MANAGER_LIMITS: IssueLimits = IssueLimits::new(60, 5);

/// The limits a caller should pass when an issuer of `role` creates an invite.
pub fn suggested_limits(role: Role) -> IssueLimits {
    match role {
        Role::Owner | Role::Admin => MANAGER_LIMITS,
        Role::Member => RESTRICTED_LIMITS,
    }
}
