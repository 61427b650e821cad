//! Credentials: issued codes and links granting the capability to join a kitchen.
//!
//! Both shapes share one record and one validity contract. Only the secret
//! differs: a short human-typed code scoped to its kitchen, or an opaque
//! high-entropy token that identifies the kitchen on its own.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::CoreError;
use crate::types::{CredentialId, KitchenId, UserId};

/// Discriminator for the two credential shapes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[repr(u8)]
pub enum CredentialKind {
    /// Short, case-insensitive code typed by a person.
    Code = 0,
    /// Opaque token embedded in a shareable URL.
    Link = 1,
}

impl CredentialKind {
    /// Convert to u8 for storage.
    pub fn to_u8(self) -> u8 {
        self as u8
    }

    /// Try to parse from u8.
    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(Self::Code),
            1 => Some(Self::Link),
            _ => None,
        }
    }
}

impl fmt::Display for CredentialKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CredentialKind::Code => f.write_str("code"),
            CredentialKind::Link => f.write_str("link"),
        }
    }
}

impl FromStr for CredentialKind {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "code" => Ok(CredentialKind::Code),
            "link" => Ok(CredentialKind::Link),
            _ => Err(CoreError::InvalidKind(s.to_string())),
        }
    }
}

/// The secret part of a credential.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum CredentialSecret {
    /// Unique within its kitchen, stored uppercase.
    Code { human_code: String },
    /// `token` is globally unique; `short_code` is display-only.
    Link { token: String, short_code: String },
}

impl fmt::Debug for CredentialSecret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Tokens grant join capability on their own, keep them out of logs.
        match self {
            CredentialSecret::Code { human_code } => {
                f.debug_struct("Code").field("human_code", human_code).finish()
            }
            CredentialSecret::Link { short_code, .. } => f
                .debug_struct("Link")
                .field("token", &"<redacted>")
                .field("short_code", short_code)
                .finish(),
        }
    }
}

/// An issued invite credential.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credential {
    pub id: CredentialId,
    pub kitchen_id: KitchenId,
    pub secret: CredentialSecret,
    /// `None` means issued by the kitchen owner under default policy.
    pub issued_by: Option<UserId>,
    /// Unix milliseconds.
    pub created_at: i64,
    /// Unix milliseconds. Valid strictly before this instant.
    pub expires_at: i64,
    pub max_uses: u32,
    pub current_uses: u32,
    pub revoked: bool,
}

impl Credential {
    /// Which shape this credential has.
    pub fn kind(&self) -> CredentialKind {
        match self.secret {
            CredentialSecret::Code { .. } => CredentialKind::Code,
            CredentialSecret::Link { .. } => CredentialKind::Link,
        }
    }

    /// The human code, for code credentials.
    pub fn human_code(&self) -> Option<&str> {
        match &self.secret {
            CredentialSecret::Code { human_code } => Some(human_code),
            CredentialSecret::Link { .. } => None,
        }
    }

    /// The full token, for link credentials.
    pub fn token(&self) -> Option<&str> {
        match &self.secret {
            CredentialSecret::Link { token, .. } => Some(token),
            CredentialSecret::Code { .. } => None,
        }
    }

    /// The display code: the human code, or the link's derived short code.
    pub fn display_code(&self) -> &str {
        match &self.secret {
            CredentialSecret::Code { human_code } => human_code,
            CredentialSecret::Link { short_code, .. } => short_code,
        }
    }

    /// Uses left before the cap is reached.
    pub fn remaining_uses(&self) -> u32 {
        self.max_uses.saturating_sub(self.current_uses)
    }
}

/// How a caller addresses a credential.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "by", rename_all = "lowercase")]
pub enum CredentialRef {
    /// Direct id, used by admin screens.
    Id { id: CredentialId },
    /// A typed code, optionally scoped to a kitchen.
    Code {
        human_code: String,
        kitchen_id: Option<KitchenId>,
    },
    /// A full link token.
    Link { token: String },
}

impl CredentialRef {
    pub fn id(id: CredentialId) -> Self {
        Self::Id { id }
    }

    pub fn code(human_code: impl Into<String>, kitchen_id: Option<KitchenId>) -> Self {
        Self::Code {
            human_code: human_code.into(),
            kitchen_id,
        }
    }

    pub fn link(token: impl Into<String>) -> Self {
        Self::Link {
            token: token.into(),
        }
    }
}

impl fmt::Debug for CredentialRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CredentialRef::Id { id } => write!(f, "CredentialRef::Id({})", id),
            CredentialRef::Code {
                human_code,
                kitchen_id,
            } => write!(f, "CredentialRef::Code({}, {:?})", human_code, kitchen_id),
            CredentialRef::Link { .. } => f.write_str("CredentialRef::Link(<redacted>)"),
        }
    }
}

/// Normalize user input into stored human-code form.
///
/// Codes are case-insensitive; whitespace and `-` separators are ignored.
pub fn normalize_code(input: &str) -> String {
    input
        .chars()
        .filter(|c| !c.is_whitespace() && *c != '-')
        .map(|c| c.to_ascii_uppercase())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_credential(secret: CredentialSecret) -> Credential {
        Credential {
            id: CredentialId::from_bytes([1; 16]),
            kitchen_id: KitchenId::new("k1").unwrap(),
            secret,
            issued_by: None,
            created_at: 0,
            expires_at: 1_000,
            max_uses: 3,
            current_uses: 1,
            revoked: false,
        }
    }

    #[test]
    fn test_kind_and_accessors() {
        let code = make_credential(CredentialSecret::Code {
            human_code: "ABC234".into(),
        });
        assert_eq!(code.kind(), CredentialKind::Code);
        assert_eq!(code.human_code(), Some("ABC234"));
        assert_eq!(code.token(), None);
        assert_eq!(code.remaining_uses(), 2);

        let link = make_credential(CredentialSecret::Link {
            token: "deadbeef".into(),
            short_code: "DEADBEEF".into(),
        });
        assert_eq!(link.kind(), CredentialKind::Link);
        assert_eq!(link.token(), Some("deadbeef"));
        assert_eq!(link.display_code(), "DEADBEEF");
    }

    #[test]
    fn test_debug_redacts_token() {
        let link = make_credential(CredentialSecret::Link {
            token: "super-secret-token".into(),
            short_code: "SUPERSEC".into(),
        });
        let debug = format!("{:?}", link);
        assert!(!debug.contains("super-secret-token"));
        assert!(debug.contains("SUPERSEC"));

        let reference = CredentialRef::link("super-secret-token");
        assert!(!format!("{:?}", reference).contains("super-secret-token"));
    }

    #[test]
    fn test_normalize_code() {
        assert_eq!(normalize_code(" ab3-x9k "), "AB3X9K");
        assert_eq!(normalize_code("AB3 X9K"), "AB3X9K");
    }

    #[test]
    fn test_kind_parse() {
        assert_eq!("LINK".parse::<CredentialKind>().unwrap(), CredentialKind::Link);
        assert_eq!(CredentialKind::from_u8(0), Some(CredentialKind::Code));
        assert!("qr".parse::<CredentialKind>().is_err());
    }
}
