/// Role and ownership checks
///
/// Two roles exist: admins manage the fleet and all accounts, customers act on
/// their own account and bookings.
///
/// # Example
///
/// ```
/// use rentflow_shared::auth::authorization::{require_admin, require_self_or_admin};
/// use rentflow_shared::auth::middleware::AuthContext;
/// use rentflow_shared::models::user::UserRole;
///
/// let customer = AuthContext::new(3, UserRole::Customer);
/// assert!(require_admin(&customer).is_err());
/// assert!(require_self_or_admin(&customer, 3).is_ok());
/// assert!(require_self_or_admin(&customer, 4).is_err());
/// ```

use super::middleware::AuthContext;

/// Error type for authorization checks
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AuthzError {
    #[error("Admin access required")]
    AdminOnly,

    #[error("You can only access your own resources")]
    NotOwner,

    #[error("Role change not allowed")]
    RoleChangeNotAllowed,
}

pub fn require_admin(auth: &AuthContext) -> Result<(), AuthzError> {
    if auth.is_admin() {
        Ok(())
    } else {
        Err(AuthzError::AdminOnly)
    }
}

/// Passes for the owner of the resource, never for anyone else (admins
/// included)
pub fn require_ownership(auth: &AuthContext, owner_id: i32) -> Result<(), AuthzError> {
    if auth.user_id == owner_id {
        Ok(())
    } else {
        Err(AuthzError::NotOwner)
    }
}

/// Passes for the owner or any admin
pub fn require_self_or_admin(auth: &AuthContext, owner_id: i32) -> Result<(), AuthzError> {
    if auth.is_admin() {
        return Ok(());
    }

    require_ownership(auth, owner_id)
}

/// Only admins may assign roles
pub fn require_role_change_allowed(
    auth: &AuthContext,
    changes_role: bool,
) -> Result<(), AuthzError> {
    if changes_role && !auth.is_admin() {
        return Err(AuthzError::RoleChangeNotAllowed);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::user::UserRole;

    #[test]
    fn test_require_admin() {
        assert!(require_admin(&AuthContext::new(1, UserRole::Admin)).is_ok());
        assert_eq!(
            require_admin(&AuthContext::new(2, UserRole::Customer)),
            Err(AuthzError::AdminOnly)
        );
    }

    #[test]
    fn test_ownership_is_strict_for_admins() {
        let admin = AuthContext::new(1, UserRole::Admin);
        assert_eq!(require_ownership(&admin, 2), Err(AuthzError::NotOwner));
        assert!(require_ownership(&admin, 1).is_ok());
    }

    #[test]
    fn test_self_or_admin() {
        let admin = AuthContext::new(1, UserRole::Admin);
        let customer = AuthContext::new(2, UserRole::Customer);

        assert!(require_self_or_admin(&admin, 99).is_ok());
        assert!(require_self_or_admin(&customer, 2).is_ok());
        assert_eq!(require_self_or_admin(&customer, 3), Err(AuthzError::NotOwner));
    }

    #[test]
    fn test_role_change() {
        let admin = AuthContext::new(1, UserRole::Admin);
        let customer = AuthContext::new(2, UserRole::Customer);

        assert!(require_role_change_allowed(&admin, true).is_ok());
        assert!(require_role_change_allowed(&customer, false).is_ok());
        assert_eq!(
            require_role_change_allowed(&customer, true),
            Err(AuthzError::RoleChangeNotAllowed)
        );
    }
}
