use crate::errors::ServiceError;
use crate::types::{Permission, UserRole};
use std::collections::HashSet;
use uuid::Uuid;

/// The resolved identity for the current operation.
///
/// Always built from storage by the authorization gate - role and
/// permission set reflect the identity store at resolution time, never
/// the token claims. Carries enough profile for audit logging.
#[derive(Debug, Clone)]
pub struct AuthContext {
    /// The ID of the authenticated identity
    pub user_id: Uuid,

    /// The role re-derived from storage
    pub role: UserRole,

    /// The admin's stored permission set (empty for plain users;
    /// ignored for superadmins, who hold everything implicitly)
    pub permissions: HashSet<Permission>,

    pub email: String,

    pub name: String,
}

impl AuthContext {
    pub fn new(
        user_id: Uuid,
        role: UserRole,
        permissions: HashSet<Permission>,
        email: String,
        name: String,
    ) -> Self {
        Self {
            user_id,
            role,
            permissions,
            email,
            name,
        }
    }

    /// Context for internal system operations (migrations, seeding)
    pub fn internal_system_context() -> Self {
        Self {
            user_id: Uuid::nil(),
            role: UserRole::Superadmin,
            permissions: HashSet::new(),
            email: "system@samarpan.internal".to_string(),
            name: "system".to_string(),
        }
    }

    /// Check if this identity holds a specific permission
    pub fn has_permission(&self, permission: Permission) -> bool {
        match self.role {
            UserRole::Superadmin => true,
            UserRole::Admin => self.permissions.contains(&permission),
            UserRole::User => false,
        }
    }

    /// Authorize a specific permission, returning an error if not allowed
    pub fn authorize(&self, permission: Permission) -> Result<(), ServiceError> {
        if self.has_permission(permission) {
            Ok(())
        } else {
            Err(ServiceError::PermissionDenied(format!(
                "Missing permission: {}",
                permission.as_str()
            )))
        }
    }

    /// Verify the caller is admin-scoped (admin or superadmin)
    pub fn authorize_admin(&self) -> Result<(), ServiceError> {
        if self.role.is_admin_scope() {
            Ok(())
        } else {
            Err(ServiceError::PermissionDenied(
                "This action requires administrator privileges".to_string(),
            ))
        }
    }

    /// Verify the caller is a superadmin
    pub fn authorize_superadmin(&self) -> Result<(), ServiceError> {
        if matches!(self.role, UserRole::Superadmin) {
            Ok(())
        } else {
            Err(ServiceError::PermissionDenied(
                "This action requires superadmin privileges".to_string(),
            ))
        }
    }

    /// For operations restricted to the identity's own records
    pub fn authorize_self_or_admin(&self, resource_owner_id: &Uuid) -> Result<(), ServiceError> {
        if &self.user_id == resource_owner_id || self.role.is_admin_scope() {
            Ok(())
        } else {
            Err(ServiceError::PermissionDenied(
                "You do not have permission to access this resource".to_string(),
            ))
        }
    }
}
