//! Proptest generators for property-based testing.

use proptest::prelude::*;

use brigade_invite_core::{
    Credential, CredentialId, CredentialKind, CredentialSecret, KitchenId, UserId, MINUTE_MILLIS,
};

/// Generate a link token in the issued format (64 lowercase hex digits).
pub fn token() -> impl Strategy<Value = String> {
    "[0-9a-f]{64}".prop_map(String::from)
}

/// Generate a human code from the issued alphabet.
pub fn human_code() -> impl Strategy<Value = String> {
    "[A-HJ-NP-Z2-9]{6}".prop_map(String::from)
}

/// Generate a KitchenId.
pub fn kitchen_id() -> impl Strategy<Value = KitchenId> {
    "[a-z][a-z0-9-]{0,15}".prop_map(|s| KitchenId::new(s).expect("non-empty"))
}

/// Generate a UserId.
pub fn user_id() -> impl Strategy<Value = UserId> {
    "[a-z][a-z0-9_]{0,15}".prop_map(|s| UserId::new(s).expect("non-empty"))
}

/// Generate a CredentialKind.
pub fn credential_kind() -> impl Strategy<Value = CredentialKind> {
    prop_oneof![Just(CredentialKind::Code), Just(CredentialKind::Link)]
}

/// Parameters for generating a credential relative to some instant.
#[derive(Debug, Clone)]
pub struct CredentialParams {
    pub kind: CredentialKind,
    pub kitchen_id: KitchenId,
    pub secret: String,
    /// Minutes from `now` to expiry; zero or negative means already expired.
    pub expires_in_minutes: i64,
    pub max_uses: u32,
    pub current_uses: u32,
    pub revoked: bool,
}

impl Arbitrary for CredentialParams {
    type Parameters = ();
    type Strategy = BoxedStrategy<Self>;

    fn arbitrary_with(_: Self::Parameters) -> Self::Strategy {
        (
            credential_kind(),
            kitchen_id(),
            token(),
            -120i64..=120i64, // expires_in_minutes
            1u32..=10u32,     // max_uses
            any::<prop::sample::Index>(),
            any::<bool>(),
        )
            .prop_map(|(kind, kitchen_id, secret, expires, max_uses, used, revoked)| {
                CredentialParams {
                    kind,
                    kitchen_id,
                    secret,
                    expires_in_minutes: expires,
                    max_uses,
                    current_uses: used.index(max_uses as usize + 1) as u32,
                    revoked,
                }
            })
            .boxed()
    }
}

/// Build a credential from parameters, with expiry measured from `now`.
pub fn credential_from_params(params: &CredentialParams, now: i64) -> Credential {
    let secret = match params.kind {
        CredentialKind::Code => CredentialSecret::Code {
            human_code: params.secret[..6].to_uppercase(),
        },
        CredentialKind::Link => CredentialSecret::Link {
            short_code: brigade_invite_core::derive_short_code(&params.secret),
            token: params.secret.clone(),
        },
    };

    Credential {
        id: CredentialId::generate(),
        kitchen_id: params.kitchen_id.clone(),
        secret,
        issued_by: None,
        created_at: now - MINUTE_MILLIS,
        expires_at: now + params.expires_in_minutes * MINUTE_MILLIS,
        max_uses: params.max_uses,
        current_uses: params.current_uses,
        revoked: params.revoked,
    }
}
