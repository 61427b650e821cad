//! Issuance: creating new codes and links.

use serde::{Deserialize, Serialize};

use brigade_invite_core::{
    derive_short_code_with_len, generate_code, generate_token, Clock, Credential, CredentialId,
    CredentialKind, CredentialSecret, KitchenId, Role, UserId,
};
use brigade_invite_perms::{authorize_issue, IssueLimits};
use brigade_invite_store::{CredentialStore, InsertResult};

use crate::error::{InviteError, Result};
use crate::service::InviteService;

/// A request to issue a credential.
///
/// Limits are always explicit; see
/// [`suggested_limits`](brigade_invite_perms::suggested_limits) for the
/// per-role policy callers are expected to apply.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IssueRequest {
    pub kind: CredentialKind,
    pub kitchen_id: KitchenId,
    pub issuer_id: UserId,
    pub expiry_minutes: u32,
    pub max_uses: u32,
}

impl IssueRequest {
    pub fn new(
        kind: CredentialKind,
        kitchen_id: KitchenId,
        issuer_id: UserId,
        limits: IssueLimits,
    ) -> Self {
        Self {
            kind,
            kitchen_id,
            issuer_id,
            expiry_minutes: limits.expiry_minutes,
            max_uses: limits.max_uses,
        }
    }

    /// The requested limits.
    pub fn limits(&self) -> IssueLimits {
        IssueLimits::new(self.expiry_minutes, self.max_uses)
    }
}

/// What the issuer gets back, shaped for the presentation layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum IssueResponse {
    Code {
        human_code: String,
        expires_at: i64,
    },
    Link {
        token: String,
        short_code: String,
        expires_at: i64,
        join_url: String,
    },
}

/// A freshly issued credential.
#[derive(Debug, Clone)]
pub struct Issued {
    pub credential: Credential,
    pub response: IssueResponse,
}

impl<S: CredentialStore, C: Clock> InviteService<S, C> {
    // ─────────────────────────────────────────────────────────────────────────
    // Issuance
    // ─────────────────────────────────────────────────────────────────────────

    /// Issue a new code or link.
    ///
    /// The issuer must be a member of the kitchen allowed to invite. The new
    /// credential starts with zero uses and is active.
    pub async fn issue(&self, request: &IssueRequest) -> Result<Issued> {
        if request.max_uses == 0 {
            return Err(InviteError::InvalidRequest("max_uses must be at least 1".into()));
        }
        if request.expiry_minutes == 0 {
            return Err(InviteError::InvalidRequest(
                "expiry_minutes must be at least 1".into(),
            ));
        }

        let membership = self
            .store
            .get_membership(&request.kitchen_id, &request.issuer_id)
            .await?;
        authorize_issue(&request.issuer_id, membership.as_ref())?;

        // Owner-issued credentials are recorded as default-policy credentials.
        let issued_by = match membership.map(|m| m.role) {
            Some(Role::Owner) => None,
            Some(Role::Admin) | Some(Role::Member) | None => Some(request.issuer_id.clone()),
        };

        let now = self.now();
        let expires_at = now + request.limits().expiry_millis();
        let attempts = self.config.max_code_attempts.max(1);

        for attempt in 1..=attempts {
            let secret = self.generate_secret(request.kind);
            let credential = Credential {
                id: CredentialId::generate(),
                kitchen_id: request.kitchen_id.clone(),
                secret,
                issued_by: issued_by.clone(),
                created_at: now,
                expires_at,
                max_uses: request.max_uses,
                current_uses: 0,
                revoked: false,
            };

            match self
                .store
                .insert_credential(&credential)
                .await
                .map_err(InviteError::issuance)?
            {
                InsertResult::Inserted => {
                    tracing::debug!(
                        credential_id = %credential.id,
                        kitchen_id = %credential.kitchen_id,
                        kind = %request.kind,
                        max_uses = credential.max_uses,
                        expires_at = credential.expires_at,
                        "issued invite credential"
                    );
                    let response = self.response_for(&credential);
                    return Ok(Issued {
                        credential,
                        response,
                    });
                }
                InsertResult::Conflict => {
                    tracing::debug!(
                        attempt,
                        kitchen_id = %request.kitchen_id,
                        kind = %request.kind,
                        "invite secret collided, regenerating"
                    );
                }
            }
        }

        tracing::warn!(
            attempts,
            kitchen_id = %request.kitchen_id,
            kind = %request.kind,
            "gave up generating a unique invite secret"
        );

        Err(match request.kind {
            CredentialKind::Code => InviteError::CodeSpaceExhausted {
                kitchen_id: request.kitchen_id.to_string(),
                attempts,
            },
            CredentialKind::Link => InviteError::IssuanceFailed {
                reason: format!("no unique token after {} attempts", attempts),
                source: None,
            },
        })
    }

    fn generate_secret(&self, kind: CredentialKind) -> CredentialSecret {
        match kind {
            CredentialKind::Code => CredentialSecret::Code {
                human_code: generate_code(self.config.code_length),
            },
            CredentialKind::Link => {
                let token = generate_token(self.config.token_bytes);
                let short_code =
                    derive_short_code_with_len(&token, self.config.short_code_length);
                CredentialSecret::Link { token, short_code }
            }
        }
    }

    fn response_for(&self, credential: &Credential) -> IssueResponse {
        match &credential.secret {
            CredentialSecret::Code { human_code } => IssueResponse::Code {
                human_code: human_code.clone(),
                expires_at: credential.expires_at,
            },
            CredentialSecret::Link { token, short_code } => IssueResponse::Link {
                token: token.clone(),
                short_code: short_code.clone(),
                expires_at: credential.expires_at,
                join_url: self.join_url(token),
            },
        }
    }
}
