//! # Brigade Invite Testkit
//!
//! Testing utilities for Brigade invites.
//!
//! ## Overview
//!
//! This crate provides:
//!
//! - **Clock**: [`ManualClock`], so expiry can be tested without sleeping
//! - **Fixtures**: [`KitchenFixture`], a kitchen with an owner and a service
//! - **Fault injection**: [`FlakyStore`], a store wrapper that fails on demand
//! - **Generators**: Proptest strategies for tokens, codes and credentials
//!
//! ## Test Fixtures
//!
//! ```rust,no_run
//! use brigade_invite_core::CredentialKind;
//! use brigade_invite_testkit::{reference, user_id, KitchenFixture};
//!
//! async fn example() {
//!     let fixture = KitchenFixture::memory().await;
//!     let issued = fixture.issue(CredentialKind::Code, 30, 2).await.unwrap();
//!
//!     let outcome = fixture
//!         .redeem(&reference(&issued), &user_id("line-cook"))
//!         .await
//!         .unwrap();
//!     assert!(outcome.is_member());
//!
//!     // Jump past expiry
//!     fixture.clock.advance_minutes(31);
//! }
//! ```
//!
//! ## Property Testing
//!
//! ```rust,ignore
//! use proptest::prelude::*;
//! use brigade_invite_testkit::generators::{credential_from_params, CredentialParams};
//!
//! proptest! {
//!     #[test]
//!     fn never_over_cap(params: CredentialParams) {
//!         let credential = credential_from_params(&params, 0);
//!         prop_assert!(credential.current_uses <= credential.max_uses);
//!     }
//! }
//! ```

pub mod clock;
pub mod fixtures;
pub mod flaky;
pub mod generators;

pub use clock::{ManualClock, T0};
pub use fixtures::{kitchen_id, reference, user_id, users, KitchenFixture};
pub use flaky::FlakyStore;
pub use generators::{credential_from_params, CredentialParams};
