//! A store wrapper that fails on demand.
//!
//! Delegates everything to the wrapped store, except that the next `n` calls
//! of selected operations fail or report a conflict.

use std::sync::atomic::{AtomicU32, Ordering};

use async_trait::async_trait;
use brigade_invite_core::{Credential, CredentialId, KitchenId, Membership, UserId};
use brigade_invite_store::{
    ConsumeResult, CredentialStore, InsertResult, MembershipWrite, Result, RevokeResult,
    StoreError,
};

/// Wrapper injecting failures into a [`CredentialStore`].
#[derive(Debug)]
pub struct FlakyStore<S> {
    inner: S,
    conflicting_inserts: AtomicU32,
    busy_consumes: AtomicU32,
    failed_membership_writes: AtomicU32,
    failed_releases: AtomicU32,
}

impl<S: CredentialStore> FlakyStore<S> {
    pub fn new(inner: S) -> Self {
        Self {
            inner,
            conflicting_inserts: AtomicU32::new(0),
            busy_consumes: AtomicU32::new(0),
            failed_membership_writes: AtomicU32::new(0),
            failed_releases: AtomicU32::new(0),
        }
    }

    pub fn inner(&self) -> &S {
        &self.inner
    }

    /// The next `n` calls of `insert_credential` report a uniqueness conflict.
    pub fn conflict_next_inserts(&self, n: u32) {
        self.conflicting_inserts.store(n, Ordering::SeqCst);
    }

    /// The next `n` calls of `consume_use` report the store busy.
    pub fn busy_next_consumes(&self, n: u32) {
        self.busy_consumes.store(n, Ordering::SeqCst);
    }

    /// The next `n` calls of `insert_membership` fail.
    pub fn fail_next_membership_writes(&self, n: u32) {
        self.failed_membership_writes.store(n, Ordering::SeqCst);
    }

    /// The next `n` calls of `release_use` fail.
    pub fn fail_next_releases(&self, n: u32) {
        self.failed_releases.store(n, Ordering::SeqCst);
    }
}

/// Take one pending failure, if any are left.
fn take(counter: &AtomicU32) -> bool {
    counter
        .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
        .is_ok()
}

#[async_trait]
impl<S: CredentialStore> CredentialStore for FlakyStore<S> {
    async fn insert_credential(&self, credential: &Credential) -> Result<InsertResult> {
        if take(&self.conflicting_inserts) {
            return Ok(InsertResult::Conflict);
        }
        self.inner.insert_credential(credential).await
    }

    async fn get_credential(&self, id: &CredentialId) -> Result<Option<Credential>> {
        self.inner.get_credential(id).await
    }

    async fn get_credential_by_token(&self, token: &str) -> Result<Option<Credential>> {
        self.inner.get_credential_by_token(token).await
    }

    async fn get_credential_by_code(
        &self,
        kitchen_id: &KitchenId,
        human_code: &str,
    ) -> Result<Option<Credential>> {
        self.inner.get_credential_by_code(kitchen_id, human_code).await
    }

    async fn find_credentials_by_code(&self, human_code: &str) -> Result<Vec<Credential>> {
        self.inner.find_credentials_by_code(human_code).await
    }

    async fn list_credentials(&self, kitchen_id: &KitchenId) -> Result<Vec<Credential>> {
        self.inner.list_credentials(kitchen_id).await
    }

    async fn consume_use(&self, id: &CredentialId, now: i64) -> Result<ConsumeResult> {
        if take(&self.busy_consumes) {
            return Err(StoreError::Busy("injected busy".into()));
        }
        self.inner.consume_use(id, now).await
    }

    async fn release_use(&self, id: &CredentialId) -> Result<bool> {
        if take(&self.failed_releases) {
            return Err(StoreError::Unavailable("injected release failure".into()));
        }
        self.inner.release_use(id).await
    }

    async fn revoke_credential(&self, id: &CredentialId) -> Result<RevokeResult> {
        self.inner.revoke_credential(id).await
    }

    async fn get_membership(
        &self,
        kitchen_id: &KitchenId,
        user_id: &UserId,
    ) -> Result<Option<Membership>> {
        self.inner.get_membership(kitchen_id, user_id).await
    }

    async fn insert_membership(&self, membership: &Membership) -> Result<MembershipWrite> {
        if take(&self.failed_membership_writes) {
            return Err(StoreError::Unavailable("injected membership failure".into()));
        }
        self.inner.insert_membership(membership).await
    }

    async fn list_memberships(&self, kitchen_id: &KitchenId) -> Result<Vec<Membership>> {
        self.inner.list_memberships(kitchen_id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generators::{credential_from_params, CredentialParams};
    use brigade_invite_core::CredentialKind;
    use brigade_invite_store::MemoryStore;

    #[test]
    fn test_take_counts_down() {
        let counter = AtomicU32::new(2);
        assert!(take(&counter));
        assert!(take(&counter));
        assert!(!take(&counter));
        assert_eq!(counter.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_injected_insert_conflict() {
        let store = FlakyStore::new(MemoryStore::new());
        store.conflict_next_inserts(1);

        let params = CredentialParams {
            kind: CredentialKind::Link,
            kitchen_id: KitchenId::new("kitchen-1").unwrap(),
            secret: "ab".repeat(32),
            expires_in_minutes: 30,
            max_uses: 1,
            current_uses: 0,
            revoked: false,
        };
        let credential = credential_from_params(&params, 0);

        let first = store.insert_credential(&credential).await.unwrap();
        assert!(matches!(first, InsertResult::Conflict));
        assert!(store.get_credential(&credential.id).await.unwrap().is_none());

        let second = store.insert_credential(&credential).await.unwrap();
        assert!(matches!(second, InsertResult::Inserted));
    }

    #[tokio::test]
    async fn test_injected_release_failure() {
        let store = FlakyStore::new(MemoryStore::new());
        store.fail_next_releases(1);

        let id = CredentialId::generate();
        assert!(store.release_use(&id).await.is_err());
        assert!(!store.release_use(&id).await.unwrap());
    }
}
