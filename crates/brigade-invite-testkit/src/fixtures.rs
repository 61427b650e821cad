//! Test fixtures and helpers.
//!
//! Common setup code for integration tests: a kitchen with an owner, a
//! service on a manual clock, and shortcuts for issuing and redeeming.

use std::path::Path;
use std::sync::Arc;

use brigade_invite::{
    InviteConfig, InviteService, IssueRequest, IssueResponse, Issued, RedeemOutcome, Result,
};
use brigade_invite_core::{
    Clock, CredentialKind, CredentialRef, KitchenId, Membership, Role, UserId,
};
use brigade_invite_store::{CredentialStore, MemoryStore, SqliteStore};

use crate::clock::ManualClock;

/// A kitchen with an owner and a service running on a [`ManualClock`].
pub struct KitchenFixture<S: CredentialStore> {
    pub service: Arc<InviteService<S, ManualClock>>,
    pub clock: ManualClock,
    pub kitchen: KitchenId,
    pub owner: UserId,
}

impl KitchenFixture<MemoryStore> {
    /// Fixture over a fresh in-memory store.
    pub async fn memory() -> Self {
        Self::new(MemoryStore::new()).await
    }
}

impl KitchenFixture<SqliteStore> {
    /// Fixture over a SQLite database at `path`.
    pub async fn sqlite(path: impl AsRef<Path>) -> Self {
        let store = SqliteStore::open(path).expect("open sqlite store");
        Self::new(store).await
    }
}

impl<S: CredentialStore> KitchenFixture<S> {
    /// Fixture over `store`, seeding the owner of `kitchen-1`.
    pub async fn new(store: S) -> Self {
        Self::with_config(store, InviteConfig::default()).await
    }

    pub async fn with_config(store: S, config: InviteConfig) -> Self {
        let clock = ManualClock::default();
        let service =
            InviteService::with_clock(store, clock.clone(), config).expect("valid invite config");
        let fixture = Self {
            service: Arc::new(service),
            clock,
            kitchen: kitchen_id("kitchen-1"),
            owner: user_id("owner"),
        };
        fixture.add_member(&fixture.owner, Role::Owner).await;
        fixture
    }

    pub fn store(&self) -> &S {
        self.service.store()
    }

    /// Add `user` to the fixture's kitchen directly through the store.
    pub async fn add_member(&self, user: &UserId, role: Role) -> Membership {
        self.add_membership(Membership::new(
            self.kitchen.clone(),
            user.clone(),
            role,
            self.clock.now_millis(),
        ))
        .await
    }

    pub async fn add_membership(&self, membership: Membership) -> Membership {
        self.store()
            .insert_membership(&membership)
            .await
            .expect("seed membership")
            .into_membership()
    }

    /// Issue as the owner.
    pub async fn issue(
        &self,
        kind: CredentialKind,
        expiry_minutes: u32,
        max_uses: u32,
    ) -> Result<Issued> {
        self.issue_as(&self.owner, kind, expiry_minutes, max_uses)
            .await
    }

    pub async fn issue_as(
        &self,
        issuer: &UserId,
        kind: CredentialKind,
        expiry_minutes: u32,
        max_uses: u32,
    ) -> Result<Issued> {
        let request = IssueRequest {
            kind,
            kitchen_id: self.kitchen.clone(),
            issuer_id: issuer.clone(),
            expiry_minutes,
            max_uses,
        };
        self.service.issue(&request).await
    }

    pub async fn redeem(
        &self,
        credential_ref: &CredentialRef,
        user: &UserId,
    ) -> Result<RedeemOutcome> {
        self.service.redeem(credential_ref, user).await
    }
}

/// The reference a user would type or click for an issued credential.
pub fn reference(issued: &Issued) -> CredentialRef {
    match &issued.response {
        IssueResponse::Code { human_code, .. } => CredentialRef::code(human_code.clone(), None),
        IssueResponse::Link { token, .. } => CredentialRef::link(token.clone()),
    }
}

pub fn kitchen_id(id: &str) -> KitchenId {
    KitchenId::new(id).expect("valid kitchen id")
}

pub fn user_id(id: &str) -> UserId {
    UserId::new(id).expect("valid user id")
}

/// `count` distinct users named `{prefix}-{n}`.
pub fn users(prefix: &str, count: usize) -> Vec<UserId> {
    (0..count)
        .map(|i| user_id(&format!("{}-{}", prefix, i)))
        .collect()
}
