//! In-memory implementation of the CredentialStore trait.
//!
//! This is primarily for testing. It has the same semantics as SQLite but
//! keeps everything in memory with no persistence. Every operation runs under
//! a single `RwLock`, so the guarded increment in `consume_use` is atomic
//! with respect to all other writers sharing the store.

use std::collections::HashMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use async_trait::async_trait;

use brigade_invite_core::{
    evaluate, Credential, CredentialId, CredentialSecret, KitchenId, Membership, UserId, Validity,
};

use crate::error::{Result, StoreError};
use crate::traits::{ConsumeResult, CredentialStore, InsertResult, MembershipWrite, RevokeResult};

/// In-memory store implementation.
///
/// All data is lost when the store is dropped. Thread-safe via RwLock.
pub struct MemoryStore {
    inner: RwLock<MemoryStoreInner>,
}

#[derive(Default)]
struct MemoryStoreInner {
    /// Credentials indexed by id.
    credentials: HashMap<CredentialId, Credential>,

    /// Code index: (kitchen_id, human_code) -> credential id.
    codes: HashMap<(KitchenId, String), CredentialId>,

    /// Token index: token -> credential id.
    tokens: HashMap<String, CredentialId>,

    /// Memberships keyed by (kitchen_id, user_id).
    memberships: HashMap<(KitchenId, UserId), Membership>,
}

impl MemoryStore {
    /// Create a new empty in-memory store.
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(MemoryStoreInner::default()),
        }
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, MemoryStoreInner>> {
        self.inner
            .read()
            .map_err(|e| StoreError::Unavailable(format!("lock poisoned: {}", e)))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, MemoryStoreInner>> {
        self.inner
            .write()
            .map_err(|e| StoreError::Unavailable(format!("lock poisoned: {}", e)))
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

/// Same order as SQLite: `created_at DESC, credential_id`.
fn newest_first(mut credentials: Vec<Credential>) -> Vec<Credential> {
    credentials.sort_by(|a, b| {
        b.created_at
            .cmp(&a.created_at)
            .then_with(|| a.id.to_hex().cmp(&b.id.to_hex()))
    });
    credentials
}

#[async_trait]
impl CredentialStore for MemoryStore {
    async fn insert_credential(&self, credential: &Credential) -> Result<InsertResult> {
        let mut inner = self.write()?;

        if inner.credentials.contains_key(&credential.id) {
            return Ok(InsertResult::Conflict);
        }

        match &credential.secret {
            CredentialSecret::Code { human_code } => {
                let key = (credential.kitchen_id.clone(), human_code.clone());
                if inner.codes.contains_key(&key) {
                    return Ok(InsertResult::Conflict);
                }
                inner.codes.insert(key, credential.id);
            }
            CredentialSecret::Link { token, .. } => {
                if inner.tokens.contains_key(token) {
                    return Ok(InsertResult::Conflict);
                }
                inner.tokens.insert(token.clone(), credential.id);
            }
        }

        inner.credentials.insert(credential.id, credential.clone());
        Ok(InsertResult::Inserted)
    }

    async fn get_credential(&self, id: &CredentialId) -> Result<Option<Credential>> {
        let inner = self.read()?;
        Ok(inner.credentials.get(id).cloned())
    }

    async fn get_credential_by_token(&self, token: &str) -> Result<Option<Credential>> {
        let inner = self.read()?;
        Ok(inner
            .tokens
            .get(token)
            .and_then(|id| inner.credentials.get(id))
            .cloned())
    }

    async fn get_credential_by_code(
        &self,
        kitchen_id: &KitchenId,
        human_code: &str,
    ) -> Result<Option<Credential>> {
        let inner = self.read()?;
        Ok(inner
            .codes
            .get(&(kitchen_id.clone(), human_code.to_string()))
            .and_then(|id| inner.credentials.get(id))
            .cloned())
    }

    async fn find_credentials_by_code(&self, human_code: &str) -> Result<Vec<Credential>> {
        let inner = self.read()?;
        let matches = inner
            .credentials
            .values()
            .filter(|c| c.human_code() == Some(human_code))
            .cloned()
            .collect();
        Ok(newest_first(matches))
    }

    async fn list_credentials(&self, kitchen_id: &KitchenId) -> Result<Vec<Credential>> {
        let inner = self.read()?;
        let matches = inner
            .credentials
            .values()
            .filter(|c| &c.kitchen_id == kitchen_id)
            .cloned()
            .collect();
        Ok(newest_first(matches))
    }

    async fn consume_use(&self, id: &CredentialId, now: i64) -> Result<ConsumeResult> {
        let mut inner = self.write()?;

        let Some(credential) = inner.credentials.get_mut(id) else {
            return Ok(ConsumeResult::Rejected(Validity::NotFound));
        };

        match evaluate(Some(credential), now) {
            Validity::Valid => {
                credential.current_uses += 1;
                Ok(ConsumeResult::Consumed(credential.clone()))
            }
            other => Ok(ConsumeResult::Rejected(other)),
        }
    }

    async fn release_use(&self, id: &CredentialId) -> Result<bool> {
        let mut inner = self.write()?;
        match inner.credentials.get_mut(id) {
            Some(credential) if credential.current_uses > 0 => {
                credential.current_uses -= 1;
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn revoke_credential(&self, id: &CredentialId) -> Result<RevokeResult> {
        let mut inner = self.write()?;
        match inner.credentials.get_mut(id) {
            None => Ok(RevokeResult::NotFound),
            Some(credential) if credential.revoked => Ok(RevokeResult::AlreadyRevoked),
            Some(credential) => {
                credential.revoked = true;
                Ok(RevokeResult::Revoked)
            }
        }
    }

    async fn get_membership(
        &self,
        kitchen_id: &KitchenId,
        user_id: &UserId,
    ) -> Result<Option<Membership>> {
        let inner = self.read()?;
        Ok(inner
            .memberships
            .get(&(kitchen_id.clone(), user_id.clone()))
            .cloned())
    }

    async fn insert_membership(&self, membership: &Membership) -> Result<MembershipWrite> {
        let mut inner = self.write()?;
        let key = (membership.kitchen_id.clone(), membership.user_id.clone());

        if let Some(existing) = inner.memberships.get(&key) {
            return Ok(MembershipWrite::Existing(existing.clone()));
        }

        inner.memberships.insert(key, membership.clone());
        Ok(MembershipWrite::Created(membership.clone()))
    }

    async fn list_memberships(&self, kitchen_id: &KitchenId) -> Result<Vec<Membership>> {
        let inner = self.read()?;
        let mut members: Vec<Membership> = inner
            .memberships
            .values()
            .filter(|m| &m.kitchen_id == kitchen_id)
            .cloned()
            .collect();
        members.sort_by(|a, b| {
            a.created_at
                .cmp(&b.created_at)
                .then_with(|| a.user_id.cmp(&b.user_id))
        });
        Ok(members)
    }
}
