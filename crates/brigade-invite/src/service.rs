//! The InviteService: unified API for the invite credential lifecycle.
//!
//! Issuance, redemption and revocation are implemented in their own modules
//! as further `impl` blocks on [`InviteService`]. This module holds the
//! shared plumbing: construction, credential resolution and read-only
//! lookups.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use brigade_invite_core::{
    evaluate, normalize_code, Clock, Credential, CredentialKind, CredentialRef, KitchenId,
    Membership, Rejection, SystemClock, UserId,
};
use brigade_invite_store::CredentialStore;

use crate::config::InviteConfig;
use crate::error::Result;
use crate::join;

/// The main service struct.
///
/// Provides a unified API for:
/// - Issuing codes and links
/// - Redeeming credentials into memberships
/// - Revoking credentials
/// - Pre-flight checks and membership lookups for collaborators
pub struct InviteService<S: CredentialStore, C: Clock = SystemClock> {
    /// The storage backend.
    pub(crate) store: Arc<S>,
    /// Time source for expiry and timestamps.
    pub(crate) clock: C,
    /// Configuration.
    pub(crate) config: InviteConfig,
}

impl<S: CredentialStore> InviteService<S, SystemClock> {
    /// Create a new service using the wall clock.
    pub fn new(store: S, config: InviteConfig) -> Result<Self> {
        Self::with_clock(store, SystemClock, config)
    }
}

impl<S: CredentialStore, C: Clock> InviteService<S, C> {
    /// Create a new service with an explicit clock.
    pub fn with_clock(store: S, clock: C, config: InviteConfig) -> Result<Self> {
        Self::from_shared(Arc::new(store), clock, config)
    }

    /// Create a service over a store shared with other services.
    ///
    /// Fails if `config` does not pass [`InviteConfig::validate`].
    pub fn from_shared(store: Arc<S>, clock: C, config: InviteConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            store,
            clock,
            config,
        })
    }

    /// Get the store reference.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Get the configuration.
    pub fn config(&self) -> &InviteConfig {
        &self.config
    }

    pub(crate) fn now(&self) -> i64 {
        self.clock.now_millis()
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Resolution
    // ─────────────────────────────────────────────────────────────────────────

    /// Look up the credential a reference points at.
    ///
    /// A code without a kitchen is disambiguated across kitchens: if exactly
    /// one candidate is currently valid it wins, several valid candidates are
    /// ambiguous, and with no valid candidate the newest one is returned so
    /// the caller reports why it is unusable.
    pub(crate) async fn resolve(
        &self,
        credential_ref: &CredentialRef,
        now: i64,
    ) -> Result<Resolution> {
        let found = match credential_ref {
            CredentialRef::Id { id } => self.store.get_credential(id).await?,
            CredentialRef::Link { token } => {
                self.store.get_credential_by_token(token.trim()).await?
            }
            CredentialRef::Code {
                human_code,
                kitchen_id: Some(kitchen_id),
            } => {
                self.store
                    .get_credential_by_code(kitchen_id, &normalize_code(human_code))
                    .await?
            }
            CredentialRef::Code {
                human_code,
                kitchen_id: None,
            } => {
                let candidates = self
                    .store
                    .find_credentials_by_code(&normalize_code(human_code))
                    .await?;
                return Ok(disambiguate(candidates, now));
            }
        };

        Ok(match found {
            Some(credential) => Resolution::Found(credential),
            None => Resolution::Rejected(Rejection::NotFound),
        })
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Query Operations
    // ─────────────────────────────────────────────────────────────────────────

    /// Pre-flight check, e.g. before rendering a join screen.
    ///
    /// Never mutates anything. The answer may be stale by the time the user
    /// redeems; redemption re-validates atomically.
    pub async fn inspect(&self, credential_ref: &CredentialRef) -> Result<Inspection> {
        let now = self.now();

        let credential = match self.resolve(credential_ref, now).await? {
            Resolution::Found(credential) => credential,
            Resolution::Rejected(reason) => return Ok(Inspection::Unusable { reason }),
        };

        Ok(match evaluate(Some(&credential), now).rejection() {
            Some(reason) => Inspection::Unusable { reason },
            None => Inspection::Usable {
                kitchen_id: credential.kitchen_id.clone(),
                kind: credential.kind(),
                expires_at: credential.expires_at,
                remaining_uses: credential.remaining_uses(),
            },
        })
    }

    /// Get a user's membership in a kitchen.
    ///
    /// After an ambiguous or timed-out redemption, check this before retrying.
    pub async fn membership(
        &self,
        kitchen_id: &KitchenId,
        user_id: &UserId,
    ) -> Result<Option<Membership>> {
        Ok(self.store.get_membership(kitchen_id, user_id).await?)
    }

    /// List all members of a kitchen.
    pub async fn members(&self, kitchen_id: &KitchenId) -> Result<Vec<Membership>> {
        Ok(self.store.list_memberships(kitchen_id).await?)
    }

    /// List all credentials of a kitchen, newest first.
    pub async fn list_credentials(&self, kitchen_id: &KitchenId) -> Result<Vec<Credential>> {
        Ok(self.store.list_credentials(kitchen_id).await?)
    }

    /// Build the shareable join URL for a link token.
    pub fn join_url(&self, token: &str) -> String {
        join::join_url(&self.config.join_origin, token)
    }
}

fn disambiguate(candidates: Vec<Credential>, now: i64) -> Resolution {
    let mut valid = candidates
        .iter()
        .filter(|c| evaluate(Some(*c), now).is_valid());

    let first = valid.next().cloned();
    let more = valid.next().is_some();

    match (first, more) {
        (Some(only), false) => Resolution::Found(only),
        (Some(_), true) => Resolution::Rejected(Rejection::Ambiguous),
        (None, _) => match candidates.into_iter().next() {
            Some(newest) => Resolution::Found(newest),
            None => Resolution::Rejected(Rejection::NotFound),
        },
    }
}

/// Outcome of resolving a [`CredentialRef`].
#[derive(Debug, Clone)]
pub(crate) enum Resolution {
    Found(Credential),
    Rejected(Rejection),
}

/// Result of a pre-flight check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Inspection {
    /// The credential can be redeemed right now.
    Usable {
        kitchen_id: KitchenId,
        kind: CredentialKind,
        expires_at: i64,
        remaining_uses: u32,
    },
    /// Redeeming would be rejected for this reason.
    Unusable { reason: Rejection },
}

impl Inspection {
    pub fn is_usable(&self) -> bool {
        matches!(self, Inspection::Usable { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use brigade_invite_core::{CredentialId, CredentialSecret};

    fn code_in(kitchen: &str, created_at: i64, revoked: bool) -> Credential {
        Credential {
            id: CredentialId::generate(),
            kitchen_id: KitchenId::new(kitchen).unwrap(),
            secret: CredentialSecret::Code {
                human_code: "ABC234".into(),
            },
            issued_by: None,
            created_at,
            expires_at: 10_000,
            max_uses: 2,
            current_uses: 0,
            revoked,
        }
    }

    #[test]
    fn test_disambiguate_none() {
        assert!(matches!(
            disambiguate(vec![], 0),
            Resolution::Rejected(Rejection::NotFound)
        ));
    }

    #[test]
    fn test_disambiguate_single_valid_wins() {
        let live = code_in("a", 1, false);
        let dead = code_in("b", 2, true);
        match disambiguate(vec![dead, live.clone()], 5) {
            Resolution::Found(c) => assert_eq!(c.id, live.id),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_disambiguate_multiple_valid_is_ambiguous() {
        let a = code_in("a", 1, false);
        let b = code_in("b", 2, false);
        assert!(matches!(
            disambiguate(vec![b, a], 5),
            Resolution::Rejected(Rejection::Ambiguous)
        ));
    }

    #[test]
    fn test_disambiguate_no_valid_reports_newest() {
        let newest = code_in("a", 9, true);
        let older = code_in("b", 1, true);
        match disambiguate(vec![newest.clone(), older], 5) {
            Resolution::Found(c) => assert_eq!(c.id, newest.id),
            other => panic!("unexpected {:?}", other),
        }
    }
}
