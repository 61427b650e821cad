//! Shared helpers for the integration tests.

#![allow(dead_code)]

use brigade_invite::store::CredentialStore;
use brigade_invite::{CredentialId, RedeemOutcome, Rejection};

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
}

/// Current use count of a stored credential.
pub async fn uses<S: CredentialStore>(store: &S, id: &CredentialId) -> u32 {
    store
        .get_credential(id)
        .await
        .expect("read credential")
        .expect("credential exists")
        .current_uses
}

/// Count joins and use-limit rejections.
pub fn tally(outcomes: &[RedeemOutcome]) -> (usize, usize) {
    let joined = outcomes
        .iter()
        .filter(|o| matches!(o, RedeemOutcome::Joined(_)))
        .count();
    let exhausted = outcomes
        .iter()
        .filter(|o| o.rejection() == Some(Rejection::UseLimitReached))
        .count();
    (joined, exhausted)
}
