//! # Brigade Invite
//!
//! The unified API for kitchen invites: short codes and shareable links that
//! let people join a kitchen.
//!
//! ## Overview
//!
//! - **Issuance**: owners, admins and permitted members create codes or links
//!   with an expiry and a use cap
//! - **Redemption**: a user turns a credential into a membership, consuming
//!   one use
//! - **Revocation**: the issuer or a kitchen manager cancels a credential
//!
//! ## Key Concepts
//!
//! - **Bounded uses**: a credential with `max_uses = N` admits at most `N`
//!   joins, however many users redeem it at once.
//! - **Idempotent joins**: redeeming again as an existing member never
//!   consumes a use.
//! - **Outcomes are values**: expired, revoked and used-up credentials are
//!   [`RedeemOutcome::Rejected`], not errors.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use brigade_invite::{InviteConfig, InviteService, IssueRequest, IssueResponse};
//! use brigade_invite::core::{CredentialKind, CredentialRef, KitchenId, Role, UserId};
//! use brigade_invite::perms::suggested_limits;
//! use brigade_invite::store::SqliteStore;
//!
//! async fn example() {
//!     let store = SqliteStore::open("invites.db").unwrap();
//!     let service = InviteService::new(store, InviteConfig::default()).unwrap();
//!
//!     let kitchen = KitchenId::new("kitchen-1").unwrap();
//!     let owner = UserId::new("chef").unwrap();
//!
//!     // Issue a code with the owner's suggested limits
//!     let request = IssueRequest::new(
//!         CredentialKind::Code,
//!         kitchen.clone(),
//!         owner,
//!         suggested_limits(Role::Owner),
//!     );
//!     let issued = service.issue(&request).await.unwrap();
//!
//!     // Redeem it
//!     if let IssueResponse::Code { human_code, .. } = issued.response {
//!         let code = CredentialRef::code(human_code, Some(kitchen));
//!         let outcome = service
//!             .redeem(&code, &UserId::new("sous").unwrap())
//!             .await
//!             .unwrap();
//!         assert!(outcome.is_member());
//!     }
//! }
//! ```
//!
//! ## Re-exports
//!
//! - `brigade_invite::core` - Core types (Credential, Membership, validation)
//! - `brigade_invite::store` - Storage abstraction and SQLite
//! - `brigade_invite::perms` - Issue and revoke policy

pub mod config;
pub mod error;
pub mod issuance;
pub mod join;
pub mod redemption;
pub mod revocation;
pub mod service;

// Re-export component crates
pub use brigade_invite_core as core;
pub use brigade_invite_perms as perms;
pub use brigade_invite_store as store;

// Re-export main types for convenience
pub use config::{ConfigError, InviteConfig};
pub use error::{InviteError, Result};
pub use issuance::{IssueRequest, IssueResponse, Issued};
pub use join::{join_url, parse_join_path, JOIN_SEGMENT};
pub use redemption::RedeemOutcome;
pub use revocation::RevokeOutcome;
pub use service::{Inspection, InviteService};

// Re-export commonly used core types
pub use brigade_invite_core::{
    Clock, Credential, CredentialId, CredentialKind, CredentialRef, KitchenId, Membership,
    Rejection, Role, SystemClock, UserId, Validity,
};
