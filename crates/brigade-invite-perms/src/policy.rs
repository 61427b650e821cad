//! Authorization checks for invite operations.
//!
//! Every check matches exhaustively on [`Role`], so adding a role forces each
//! decision to be revisited.

use brigade_invite_core::{Credential, Membership, Role, UserId};

use crate::error::{PermsError, Result};

/// Check if a membership may issue invites for its kitchen.
///
/// Owners and admins always may; members only when `can_invite` is set.
pub fn can_issue(membership: &Membership) -> bool {
    match membership.role {
        Role::Owner | Role::Admin => true,
        Role::Member => membership.can_invite,
    }
}

/// Check if `actor` may revoke `credential`.
///
/// The issuer may always revoke their own credential. Otherwise the actor
/// needs an owner or admin membership in the credential's kitchen. A
/// credential with no recorded issuer was issued by the owner by default
/// policy, so only owners and admins can revoke it.
pub fn can_revoke(
    actor: &UserId,
    membership: Option<&Membership>,
    credential: &Credential,
) -> bool {
    if credential.issued_by.as_ref() == Some(actor) {
        return true;
    }

    let Some(membership) = membership else {
        return false;
    };

    if membership.kitchen_id != credential.kitchen_id || &membership.user_id != actor {
        return false;
    }

    match membership.role {
        Role::Owner | Role::Admin => true,
        Role::Member => false,
    }
}

/// Like [`can_issue`], with a reason on denial.
pub fn authorize_issue(actor: &UserId, membership: Option<&Membership>) -> Result<()> {
    let membership = membership.ok_or_else(|| PermsError::NotAMember(actor.to_string()))?;

    if can_issue(membership) {
        Ok(())
    } else {
        Err(PermsError::PermissionDenied(format!(
            "{} may not issue invites for kitchen {}",
            actor, membership.kitchen_id
        )))
    }
}

/// Like [`can_revoke`], with a reason on denial.
pub fn authorize_revoke(
    actor: &UserId,
    membership: Option<&Membership>,
    credential: &Credential,
) -> Result<()> {
    if can_revoke(actor, membership, credential) {
        Ok(())
    } else {
        Err(PermsError::PermissionDenied(format!(
            "{} may not revoke credential {}",
            actor, credential.id
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use brigade_invite_core::{CredentialId, CredentialSecret, KitchenId};

    fn kitchen() -> KitchenId {
        KitchenId::new("k").unwrap()
    }

    fn user(name: &str) -> UserId {
        UserId::new(name).unwrap()
    }

    fn credential(issued_by: Option<UserId>) -> Credential {
        Credential {
            id: CredentialId::from_bytes([1; 16]),
            kitchen_id: kitchen(),
            secret: CredentialSecret::Code {
                human_code: "ABC234".into(),
            },
            issued_by,
            created_at: 0,
            expires_at: 1,
            max_uses: 1,
            current_uses: 0,
            revoked: false,
        }
    }

    #[test]
    fn test_can_issue() {
        let owner = Membership::new(kitchen(), user("o"), Role::Owner, 0).with_can_invite(false);
        assert!(can_issue(&owner));

        let member = Membership::new(kitchen(), user("m"), Role::Member, 0);
        assert!(!can_issue(&member));
        assert!(can_issue(&member.with_can_invite(true)));
    }

    #[test]
    fn test_issuer_can_revoke_own() {
        let cook = user("cook");
        let membership = Membership::new(kitchen(), cook.clone(), Role::Member, 0);
        assert!(can_revoke(&cook, Some(&membership), &credential(Some(cook.clone()))));
        assert!(!can_revoke(&cook, Some(&membership), &credential(Some(user("other")))));
    }

    #[test]
    fn test_owner_default_credential() {
        let admin = user("admin");
        let admin_m = Membership::new(kitchen(), admin.clone(), Role::Admin, 0);
        assert!(can_revoke(&admin, Some(&admin_m), &credential(None)));

        let cook = user("cook");
        let cook_m = Membership::new(kitchen(), cook.clone(), Role::Member, 0);
        assert!(!can_revoke(&cook, Some(&cook_m), &credential(None)));
        assert!(!can_revoke(&cook, None, &credential(None)));
    }

    #[test]
    fn test_membership_in_other_kitchen_does_not_count() {
        let owner = user("owner");
        let elsewhere = Membership::new(
            KitchenId::new("other").unwrap(),
            owner.clone(),
            Role::Owner,
            0,
        );
        assert!(!can_revoke(&owner, Some(&elsewhere), &credential(None)));
    }

    #[test]
    fn test_authorize_issue_reasons() {
        let cook = user("cook");
        assert_eq!(
            authorize_issue(&cook, None),
            Err(PermsError::NotAMember("cook".into()))
        );
        let member = Membership::new(kitchen(), cook.clone(), Role::Member, 0);
        assert!(matches!(
            authorize_issue(&cook, Some(&member)),
            Err(PermsError::PermissionDenied(_))
        ));
    }
}
