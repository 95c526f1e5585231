//! Ownership-or-admin access rules.
//!
//! Pure decisions, no I/O. Callers must confirm the target exists before
//! asking, so a missing resource is reported as not found, never forbidden.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::error::{ApiError, ApiResult};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "user_role", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Role {
    #[default]
    User,
    Admin,
}

/// The acting user behind a resolved token.
#[derive(Debug, Clone, PartialEq, Eq, FromRow)]
pub struct Identity {
    pub id: i64,
    pub email: String,
    pub role: Role,
}

impl Identity {
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }

    fn is_self_or_admin(&self, owner_id: i64) -> bool {
        self.id == owner_id || self.is_admin()
    }
}

pub fn can_modify_user(actor: &Identity, target_user_id: i64) -> bool {
    actor.is_self_or_admin(target_user_id)
}

pub fn can_delete_user(actor: &Identity, target_user_id: i64) -> bool {
    actor.is_self_or_admin(target_user_id)
}

pub fn can_change_role(actor: &Identity) -> bool {
    actor.is_admin()
}

pub fn can_modify_advertisement(actor: &Identity, adv_owner_id: i64) -> bool {
    actor.is_self_or_admin(adv_owner_id)
}

pub fn can_delete_advertisement(actor: &Identity, adv_owner_id: i64) -> bool {
    actor.is_self_or_admin(adv_owner_id)
}

/// Turns a negative decision into an authorization error.
pub fn ensure(allowed: bool, message: &str) -> ApiResult<()> {
    if allowed {
        Ok(())
    } else {
        Err(ApiError::forbidden(message))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn identity(id: i64, role: Role) -> Identity {
        Identity {
            id,
            email: format!("u{id}@example.com"),
            role,
        }
    }

    #[test]
    fn owner_may_modify_and_delete_own_resources() {
        let owner = identity(1, Role::User);
        assert!(can_modify_user(&owner, 1));
        assert!(can_delete_user(&owner, 1));
        assert!(can_modify_advertisement(&owner, 1));
        assert!(can_delete_advertisement(&owner, 1));
    }

    #[test]
    fn stranger_is_refused() {
        let stranger = identity(2, Role::User);
        assert!(!can_modify_user(&stranger, 1));
        assert!(!can_delete_user(&stranger, 1));
        assert!(!can_modify_advertisement(&stranger, 1));
        assert!(!can_delete_advertisement(&stranger, 1));
        assert!(!can_change_role(&stranger));
    }

    #[test]
    fn admin_overrides_ownership() {
        let admin = identity(3, Role::Admin);
        assert!(can_modify_user(&admin, 1));
        assert!(can_delete_user(&admin, 1));
        assert!(can_modify_advertisement(&admin, 1));
        assert!(can_delete_advertisement(&admin, 1));
        assert!(can_change_role(&admin));
    }

    #[test]
    fn ensure_maps_refusal_to_forbidden() {
        assert!(ensure(true, "nope").is_ok());
        let err = ensure(false, "nope").unwrap_err();
        assert!(matches!(err, ApiError::Forbidden(ref m) if m == "nope"));
    }

    #[test]
    fn role_serializes_lowercase_and_defaults_to_user() {
        assert_eq!(serde_json::to_string(&Role::Admin).unwrap(), "\"admin\"");
        assert_eq!(Role::default(), Role::User);
    }
}
