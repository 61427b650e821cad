//! Redemption: turning a credential into a kitchen membership.
//!
//! The use counter is only advanced through the store's guarded increment,
//! so `current_uses <= max_uses` holds under any number of concurrent
//! redeemers. When the membership write fails after a use was consumed, the
//! use is given back.

use serde::{Deserialize, Serialize};

use brigade_invite_core::{
    evaluate, Clock, Credential, CredentialId, CredentialRef, Membership, Rejection, Role, UserId,
    Validity,
};
use brigade_invite_store::{ConsumeResult, CredentialStore, MembershipWrite, StoreError};

use crate::error::{InviteError, Result};
use crate::service::{InviteService, Resolution};

/// Outcome of a redemption attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", content = "value", rename_all = "snake_case")]
pub enum RedeemOutcome {
    /// A new membership was created and one use consumed.
    Joined(Membership),
    /// The user was already a member. No use was consumed.
    AlreadyMember(Membership),
    /// The credential cannot be used.
    Rejected(Rejection),
}

impl RedeemOutcome {
    /// Whether the user ends up a member of the kitchen.
    pub fn is_member(&self) -> bool {
        matches!(
            self,
            RedeemOutcome::Joined(_) | RedeemOutcome::AlreadyMember(_)
        )
    }

    pub fn membership(&self) -> Option<&Membership> {
        match self {
            RedeemOutcome::Joined(m) | RedeemOutcome::AlreadyMember(m) => Some(m),
            RedeemOutcome::Rejected(_) => None,
        }
    }

    pub fn rejection(&self) -> Option<Rejection> {
        match self {
            RedeemOutcome::Rejected(reason) => Some(*reason),
            _ => None,
        }
    }
}

impl<S: CredentialStore, C: Clock> InviteService<S, C> {
    // ─────────────────────────────────────────────────────────────────────────
    // Redemption
    // ─────────────────────────────────────────────────────────────────────────

    /// Redeem a credential, joining its kitchen as a member.
    pub async fn redeem(
        &self,
        credential_ref: &CredentialRef,
        user_id: &UserId,
    ) -> Result<RedeemOutcome> {
        self.redeem_as(credential_ref, user_id, Role::Member).await
    }

    /// Redeem a credential, joining with the given role.
    ///
    /// Safe to retry: a user who already belongs to the kitchen gets
    /// [`RedeemOutcome::AlreadyMember`] without consuming a use.
    pub async fn redeem_as(
        &self,
        credential_ref: &CredentialRef,
        user_id: &UserId,
        role: Role,
    ) -> Result<RedeemOutcome> {
        if role == Role::Owner {
            return Err(InviteError::InvalidRequest(
                "the owner role cannot be granted through an invite".into(),
            ));
        }

        let now = self.now();

        let credential = match self.resolve(credential_ref, now).await? {
            Resolution::Found(credential) => credential,
            Resolution::Rejected(reason) => {
                tracing::debug!(user_id = %user_id, %reason, "invite reference did not resolve");
                return Ok(RedeemOutcome::Rejected(reason));
            }
        };

        if let Some(existing) = self
            .store
            .get_membership(&credential.kitchen_id, user_id)
            .await?
        {
            tracing::debug!(
                kitchen_id = %credential.kitchen_id,
                user_id = %user_id,
                "user already a member, no use consumed"
            );
            return Ok(RedeemOutcome::AlreadyMember(existing));
        }

        // Cheap rejection before taking the write path.
        if let Some(reason) = evaluate(Some(&credential), now).rejection() {
            return Ok(self.rejected(&credential, user_id, reason));
        }

        let consumed = match self.consume_with_retry(&credential.id, now).await? {
            ConsumeResult::Consumed(consumed) => consumed,
            ConsumeResult::Rejected(validity) => {
                return Ok(self.rejected(&credential, user_id, settle(validity)));
            }
        };

        let membership = Membership::new(consumed.kitchen_id.clone(), user_id.clone(), role, now);

        match self.store.insert_membership(&membership).await {
            Ok(MembershipWrite::Created(created)) => {
                tracing::info!(
                    credential_id = %consumed.id,
                    kitchen_id = %consumed.kitchen_id,
                    user_id = %user_id,
                    role = %role,
                    uses = consumed.current_uses,
                    max_uses = consumed.max_uses,
                    "user joined kitchen"
                );
                Ok(RedeemOutcome::Joined(created))
            }
            Ok(MembershipWrite::Existing(existing)) => {
                // A concurrent redemption by the same user got there first.
                self.compensate(&consumed, user_id).await;
                Ok(RedeemOutcome::AlreadyMember(existing))
            }
            Err(e) => {
                self.compensate(&consumed, user_id).await;
                Err(e.into())
            }
        }
    }

    fn rejected(
        &self,
        credential: &Credential,
        user_id: &UserId,
        reason: Rejection,
    ) -> RedeemOutcome {
        tracing::debug!(
            credential_id = %credential.id,
            kitchen_id = %credential.kitchen_id,
            user_id = %user_id,
            %reason,
            "redemption rejected"
        );
        RedeemOutcome::Rejected(reason)
    }

    async fn consume_with_retry(&self, id: &CredentialId, now: i64) -> Result<ConsumeResult> {
        let mut retries = 0;
        loop {
            match self.store.consume_use(id, now).await {
                Ok(result) => return Ok(result),
                Err(e) if e.is_transient() && retries < self.config.busy_retry_attempts => {
                    retries += 1;
                    tracing::warn!(
                        credential_id = %id,
                        attempt = retries,
                        error = %e,
                        "store busy while consuming a use, retrying"
                    );
                    tokio::task::yield_now().await;
                }
                Err(e) => return Err(e.into()),
            }
        }
    }

    /// Give back a use that has no membership to show for it.
    async fn compensate(&self, credential: &Credential, user_id: &UserId) {
        let attempts = self.config.compensation_attempts.max(1);
        let mut last_error: Option<StoreError> = None;

        for attempt in 1..=attempts {
            match self.store.release_use(&credential.id).await {
                Ok(released) => {
                    tracing::warn!(
                        credential_id = %credential.id,
                        user_id = %user_id,
                        released,
                        "released consumed use"
                    );
                    return;
                }
                Err(e) => {
                    tracing::warn!(
                        credential_id = %credential.id,
                        user_id = %user_id,
                        attempt,
                        error = %e,
                        "releasing consumed use failed"
                    );
                    last_error = Some(e);
                    tokio::task::yield_now().await;
                }
            }
        }

        tracing::error!(
            credential_id = %credential.id,
            kitchen_id = %credential.kitchen_id,
            user_id = %user_id,
            attempts,
            error = ?last_error,
            "use consumed without membership, needs reconciliation"
        );
    }
}

/// The validity the store reported once a guarded increment wrote nothing.
///
/// A `Valid` reading means another writer took the last use in between.
pub(crate) fn settle(validity: Validity) -> Rejection {
    validity.rejection().unwrap_or(Rejection::UseLimitReached)
}
