//! # Brigade Invite Core
//!
//! Pure primitives for kitchen invites: credentials, memberships, validation,
//! and short-code derivation.
//!
//! This crate contains no I/O and no storage. Everything here is plain
//! computation over invite records, so the same rules apply wherever a
//! credential is checked.
//!
//! ## Key Types
//!
//! - [`Credential`] - An issued code or link, unified behind one record
//! - [`CredentialRef`] - How a caller addresses a credential
//! - [`Membership`] and [`Role`] - Who belongs to a kitchen, and how
//! - [`Validity`] - Result of [`evaluate`]

pub mod clock;
pub mod credential;
pub mod error;
pub mod membership;
pub mod secret;
pub mod shortcode;
pub mod types;
pub mod validation;

pub use clock::{Clock, SystemClock, MINUTE_MILLIS};
pub use credential::{normalize_code, Credential, CredentialKind, CredentialRef, CredentialSecret};
pub use error::{CoreError, Result};
pub use membership::{Membership, Role};
pub use secret::{
    generate_code, generate_token, CODE_ALPHABET, DEFAULT_CODE_LEN, DEFAULT_TOKEN_BYTES,
};
pub use shortcode::{derive_short_code, derive_short_code_with_len, SHORT_CODE_LEN};
pub use types::{CredentialId, KitchenId, UserId};
pub use validation::{evaluate, Rejection, Validity};
