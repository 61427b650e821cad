//! Revocation: cancelling a credential before it runs out.

use serde::{Deserialize, Serialize};

use brigade_invite_core::{Clock, CredentialRef, Rejection, UserId};
use brigade_invite_perms::authorize_revoke;
use brigade_invite_store::{CredentialStore, RevokeResult};

use crate::error::{InviteError, Result};
use crate::service::{InviteService, Resolution};

/// Outcome of a revocation. Both variants are success.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RevokeOutcome {
    Revoked,
    AlreadyRevoked,
}

impl<S: CredentialStore, C: Clock> InviteService<S, C> {
    // ─────────────────────────────────────────────────────────────────────────
    // Revocation
    // ─────────────────────────────────────────────────────────────────────────

    /// Revoke a credential.
    ///
    /// Allowed for the credential's issuer and for owners and admins of its
    /// kitchen. Revoking twice is not an error. Existing memberships are not
    /// affected.
    pub async fn revoke(
        &self,
        credential_ref: &CredentialRef,
        actor_id: &UserId,
    ) -> Result<RevokeOutcome> {
        let credential = match self.resolve(credential_ref, self.now()).await? {
            Resolution::Found(credential) => credential,
            Resolution::Rejected(Rejection::Ambiguous) => {
                return Err(InviteError::InvalidRequest(
                    "code matches credentials in several kitchens".into(),
                ))
            }
            Resolution::Rejected(_) => {
                return Err(InviteError::NotFound(format!("{:?}", credential_ref)))
            }
        };

        let membership = self
            .store
            .get_membership(&credential.kitchen_id, actor_id)
            .await?;
        authorize_revoke(actor_id, membership.as_ref(), &credential)?;

        match self.store.revoke_credential(&credential.id).await? {
            RevokeResult::Revoked => {
                tracing::info!(
                    credential_id = %credential.id,
                    kitchen_id = %credential.kitchen_id,
                    actor_id = %actor_id,
                    uses = credential.current_uses,
                    "revoked invite credential"
                );
                Ok(RevokeOutcome::Revoked)
            }
            RevokeResult::AlreadyRevoked => {
                tracing::debug!(credential_id = %credential.id, "credential already revoked");
                Ok(RevokeOutcome::AlreadyRevoked)
            }
            // Deleted between resolve and revoke.
            RevokeResult::NotFound => Err(InviteError::NotFound(credential.id.to_string())),
        }
    }
}
