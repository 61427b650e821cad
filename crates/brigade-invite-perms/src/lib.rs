//! # Brigade Invite Permissions
//!
//! Who may issue and who may revoke kitchen invites.
//!
//! ## Overview
//!
//! - Issuing requires a membership that passes [`can_issue`]: owners and
//!   admins always, members only with `can_invite`.
//! - Revoking requires being the credential's issuer, or an owner or admin of
//!   its kitchen ([`can_revoke`]).
//! - [`suggested_limits`] is the expiry and use-cap policy callers apply per
//!   issuer role before calling the issuance service.

pub mod error;
pub mod limits;
pub mod policy;

pub use error::{PermsError, Result};
pub use limits::{suggested_limits, IssueLimits, MANAGER_LIMITS, RESTRICTED_LIMITS};
pub use policy::{authorize_issue, authorize_revoke, can_issue, can_revoke};
