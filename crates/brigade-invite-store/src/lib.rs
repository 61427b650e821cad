//! # Brigade Invite Store
//!
//! Storage abstraction for kitchen invites. Provides a trait-based interface
//! for credential and membership persistence with SQLite and in-memory
//! implementations.
//!
//! ## Key Types
//!
//! - [`CredentialStore`] - The async trait for all storage operations
//! - [`SqliteStore`] - SQLite-based persistent storage
//! - [`MemoryStore`] - In-memory storage for tests
//! - [`ConsumeResult`] - Result of the guarded use increment
//!
//! ## Usage
//!
//! ```rust,no_run
//! use brigade_invite_store::{CredentialStore, SqliteStore};
//!
//! async fn example() {
//!     // Open a SQLite database
//!     let store = SqliteStore::open("invites.db").unwrap();
//!
//!     // Or use an in-memory database for testing
//!     let store = SqliteStore::open_memory().unwrap();
//!
//!     // let result = store.consume_use(&credential_id, now).await.unwrap();
//! }
//! ```
//!
//! ## Design Notes
//!
//! - **Bounded use counter**: `current_uses <= max_uses` holds for every
//!   credential under any interleaving of writers, and SQLite also enforces it
//!   with a `CHECK` constraint
//! - **Uniqueness**: human codes are unique per kitchen, tokens globally
//! - **Idempotent memberships**: one row per `(kitchen, user)`

pub mod error;
pub mod memory;
pub mod migration;
pub mod sqlite;
pub mod traits;

pub use error::{Result, StoreError};
pub use memory::MemoryStore;
pub use sqlite::{SqliteStore, StoreConfig};
pub use traits::{ConsumeResult, CredentialStore, InsertResult, MembershipWrite, RevokeResult};
