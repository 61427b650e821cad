//! CredentialStore trait: the abstract interface for invite persistence.
//!
//! The store is the only shared mutable resource of the invite subsystem.
//! Redemptions for the same credential may arrive from different processes,
//! so the use counter is only ever advanced through [`CredentialStore::consume_use`],
//! which each backend implements as one atomic conditional write.

use std::sync::Arc;

use async_trait::async_trait;
use brigade_invite_core::{Credential, CredentialId, KitchenId, Membership, UserId, Validity};

use crate::error::Result;

/// Result of inserting a credential.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertResult {
    /// Credential was inserted.
    Inserted,
    /// The human code is taken in this kitchen, or the token is taken globally.
    Conflict,
}

/// Result of trying to consume one use of a credential.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConsumeResult {
    /// The use was consumed. Carries the credential as it is after the increment.
    Consumed(Credential),
    /// Nothing was written. Carries the freshly re-read validity; never `Valid`.
    Rejected(Validity),
}

/// Result of revoking a credential.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RevokeResult {
    Revoked,
    /// Revocation is idempotent.
    AlreadyRevoked,
    NotFound,
}

/// Result of writing a membership.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MembershipWrite {
    /// A new membership row was created.
    Created(Membership),
    /// The user was already a member; the existing row is returned untouched.
    Existing(Membership),
}

impl MembershipWrite {
    pub fn membership(&self) -> &Membership {
        match self {
            MembershipWrite::Created(m) | MembershipWrite::Existing(m) => m,
        }
    }

    pub fn into_membership(self) -> Membership {
        match self {
            MembershipWrite::Created(m) | MembershipWrite::Existing(m) => m,
        }
    }
}

/// The CredentialStore trait: async interface for codes, links and memberships.
///
/// # Design Notes
///
/// - **Guarded increment**: `consume_use` re-reads and increments in one atomic
///   unit. There is no way to write `current_uses` directly.
/// - **Compensation**: `release_use` undoes one consumed use and never drives
///   the counter below zero.
/// - **Idempotent membership**: `insert_membership` inserts only if absent.
/// - **Human codes** are expected in normalized (uppercase) form.
#[async_trait]
pub trait CredentialStore: Send + Sync {
    // ─────────────────────────────────────────────────────────────────────────
    // Credential Operations
    // ─────────────────────────────────────────────────────────────────────────

    /// Insert a newly issued credential.
    async fn insert_credential(&self, credential: &Credential) -> Result<InsertResult>;

    /// Get a credential by id.
    async fn get_credential(&self, id: &CredentialId) -> Result<Option<Credential>>;

    /// Get a link credential by its full token.
    async fn get_credential_by_token(&self, token: &str) -> Result<Option<Credential>>;

    /// Get a code credential by kitchen and human code.
    async fn get_credential_by_code(
        &self,
        kitchen_id: &KitchenId,
        human_code: &str,
    ) -> Result<Option<Credential>>;

    /// Find code credentials with this human code across all kitchens.
    ///
    /// Ordered by creation time, newest first.
    async fn find_credentials_by_code(&self, human_code: &str) -> Result<Vec<Credential>>;

    /// List all credentials of a kitchen, newest first.
    async fn list_credentials(&self, kitchen_id: &KitchenId) -> Result<Vec<Credential>>;

    /// Atomically consume one use if the credential is still valid at `now`.
    async fn consume_use(&self, id: &CredentialId, now: i64) -> Result<ConsumeResult>;

    /// Give back one consumed use.
    ///
    /// Returns `false` if nothing was released (unknown id or zero uses).
    async fn release_use(&self, id: &CredentialId) -> Result<bool>;

    /// Mark a credential revoked.
    async fn revoke_credential(&self, id: &CredentialId) -> Result<RevokeResult>;

    // ─────────────────────────────────────────────────────────────────────────
    // Membership Operations
    // ─────────────────────────────────────────────────────────────────────────

    /// Get a user's membership in a kitchen.
    async fn get_membership(
        &self,
        kitchen_id: &KitchenId,
        user_id: &UserId,
    ) -> Result<Option<Membership>>;

    /// Insert a membership unless one already exists for `(kitchen_id, user_id)`.
    async fn insert_membership(&self, membership: &Membership) -> Result<MembershipWrite>;

    /// List all memberships of a kitchen, oldest first.
    async fn list_memberships(&self, kitchen_id: &KitchenId) -> Result<Vec<Membership>>;
}

#[async_trait]
impl<S: CredentialStore + ?Sized> CredentialStore for Arc<S> {
    async fn insert_credential(&self, credential: &Credential) -> Result<InsertResult> {
        (**self).insert_credential(credential).await
    }

    async fn get_credential(&self, id: &CredentialId) -> Result<Option<Credential>> {
        (**self).get_credential(id).await
    }

    async fn get_credential_by_token(&self, token: &str) -> Result<Option<Credential>> {
        (**self).get_credential_by_token(token).await
    }

    async fn get_credential_by_code(
        &self,
        kitchen_id: &KitchenId,
        human_code: &str,
    ) -> Result<Option<Credential>> {
        (**self).get_credential_by_code(kitchen_id, human_code).await
    }

    async fn find_credentials_by_code(&self, human_code: &str) -> Result<Vec<Credential>> {
        (**self).find_credentials_by_code(human_code).await
    }

    async fn list_credentials(&self, kitchen_id: &KitchenId) -> Result<Vec<Credential>> {
        (**self).list_credentials(kitchen_id).await
    }

    async fn consume_use(&self, id: &CredentialId, now: i64) -> Result<ConsumeResult> {
        (**self).consume_use(id, now).await
    }

    async fn release_use(&self, id: &CredentialId) -> Result<bool> {
        (**self).release_use(id).await
    }

    async fn revoke_credential(&self, id: &CredentialId) -> Result<RevokeResult> {
        (**self).revoke_credential(id).await
    }

    async fn get_membership(
        &self,
        kitchen_id: &KitchenId,
        user_id: &UserId,
    ) -> Result<Option<Membership>> {
        (**self).get_membership(kitchen_id, user_id).await
    }

    async fn insert_membership(&self, membership: &Membership) -> Result<MembershipWrite> {
        (**self).insert_membership(membership).await
    }

    async fn list_memberships(&self, kitchen_id: &KitchenId) -> Result<Vec<Membership>> {
        (**self).list_memberships(kitchen_id).await
    }
}
