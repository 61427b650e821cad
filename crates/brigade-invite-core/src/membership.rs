//! Memberships: the record associating a user with a kitchen and a role.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::CoreError;
use crate::types::{KitchenId, UserId};

/// A member's role within a kitchen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[repr(u8)]
pub enum Role {
    /// Created the kitchen. Exactly the chef by default policy.
    Owner = 0,
    /// Manages the kitchen alongside the owner.
    Admin = 1,
    /// Regular brigade member.
    Member = 2,
}

impl Role {
    /// Convert to u8 for storage.
    pub fn to_u8(self) -> u8 {
        self as u8
    }

    /// Try to parse from u8.
    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(Self::Owner),
            1 => Some(Self::Admin),
            2 => Some(Self::Member),
            _ => None,
        }
    }

    /// Lowercase name used on the wire.
    pub fn as_str(self) -> &'static str {
        match self {
            Role::Owner => "owner",
            Role::Admin => "admin",
            Role::Member => "member",
        }
    }

    /// Whether a new membership with this role may issue invites by default.
    pub fn invites_by_default(self) -> bool {
        match self {
            Role::Owner | Role::Admin => true,
            Role::Member => false,
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "owner" => Ok(Role::Owner),
            "admin" => Ok(Role::Admin),
            "member" => Ok(Role::Member),
            _ => Err(CoreError::InvalidRole(s.to_string())),
        }
    }
}

/// Membership of a user in a kitchen.
///
/// Exactly one membership exists per `(kitchen_id, user_id)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Membership {
    pub kitchen_id: KitchenId,
    pub user_id: UserId,
    pub role: Role,
    /// Gates whether this member may issue invites at all.
    pub can_invite: bool,
    /// Unix milliseconds.
    pub created_at: i64,
}

impl Membership {
    /// Create a membership with the role's default invite capability.
    pub fn new(kitchen_id: KitchenId, user_id: UserId, role: Role, created_at: i64) -> Self {
        Self {
            kitchen_id,
            user_id,
            role,
            can_invite: role.invites_by_default(),
            created_at,
        }
    }

    /// Override the invite capability.
    pub fn with_can_invite(mut self, can_invite: bool) -> Self {
        self.can_invite = can_invite;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_u8_roundtrip() {
        for role in [Role::Owner, Role::Admin, Role::Member] {
            assert_eq!(Role::from_u8(role.to_u8()), Some(role));
        }
        assert_eq!(Role::from_u8(9), None);
    }

    #[test]
    fn test_role_parse() {
        assert_eq!("Admin".parse::<Role>().unwrap(), Role::Admin);
        assert!("sous-chef".parse::<Role>().is_err());
    }

    #[test]
    fn test_role_serde_lowercase() {
        assert_eq!(serde_json::to_string(&Role::Member).unwrap(), "\"member\"");
    }

    #[test]
    fn test_membership_default_invite_capability() {
        let kitchen = KitchenId::new("k").unwrap();
        let member = Membership::new(kitchen.clone(), UserId::new("u").unwrap(), Role::Member, 0);
        assert!(!member.can_invite);

        let admin = Membership::new(kitchen, UserId::new("a").unwrap(), Role::Admin, 0);
        assert!(admin.can_invite);
        assert!(!admin.with_can_invite(false).can_invite);
    }
}
