use crate::errors::{DomainError, DomainResult};
use crate::types::{Permission, UserRole};
use crate::validation::{Validate, ValidationBuilder};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::collections::HashSet;
use uuid::Uuid;

/// Core Admin entity - an administrator account with an explicit
/// permission set. A superadmin ignores the set and holds everything.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Admin {
    pub id: Uuid,
    pub email: String,
    pub password_hash: String,
    pub name: String,
    pub role: UserRole,
    pub permissions: HashSet<Permission>,
    pub active: bool,
    pub created_by: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Admin {
    pub fn is_superadmin(&self) -> bool {
        matches!(self.role, UserRole::Superadmin)
    }

    pub fn is_active(&self) -> bool {
        self.active
    }
}

/// NewAdmin DTO - created only through a superadmin operation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewAdmin {
    pub email: String,
    pub password: String, // Plain text password (will be hashed)
    pub name: String,
    pub role: String,
    pub permissions: Vec<String>,
}

impl Validate for NewAdmin {
    fn validate(&self) -> DomainResult<()> {
        ValidationBuilder::new("email", Some(self.email.clone()))
            .required()
            .email()
            .validate()?;

        ValidationBuilder::new("password", Some(self.password.clone()))
            .required()
            .min_length(8)
            .validate()?;

        ValidationBuilder::new("name", Some(self.name.clone()))
            .required()
            .min_length(2)
            .max_length(50)
            .validate()?;

        ValidationBuilder::new("role", Some(self.role.clone()))
            .required()
            .one_of(&["admin", "superadmin"], Some("Invalid role"))
            .validate()?;

        for p in &self.permissions {
            if Permission::from_str(p).is_none() {
                return Err(DomainError::Validation(
                    crate::errors::ValidationError::invalid_value(
                        "permissions",
                        &format!("unknown permission: {}", p),
                    ),
                ));
            }
        }

        Ok(())
    }
}

/// UpdateAdmin DTO - superadmin-gated changes to an existing admin
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct UpdateAdmin {
    pub name: Option<String>,
    pub role: Option<String>,
    pub permissions: Option<Vec<String>>,
    pub active: Option<bool>,
}

impl Validate for UpdateAdmin {
    fn validate(&self) -> DomainResult<()> {
        if let Some(name) = &self.name {
            ValidationBuilder::new("name", Some(name.clone()))
                .min_length(2)
                .max_length(50)
                .validate()?;
        }

        if let Some(role) = &self.role {
            ValidationBuilder::new("role", Some(role.clone()))
                .one_of(&["admin", "superadmin"], Some("Invalid role"))
                .validate()?;
        }

        if let Some(permissions) = &self.permissions {
            for p in permissions {
                if Permission::from_str(p).is_none() {
                    return Err(DomainError::Validation(
                        crate::errors::ValidationError::invalid_value(
                            "permissions",
                            &format!("unknown permission: {}", p),
                        ),
                    ));
                }
            }
        }

        Ok(())
    }
}

/// AdminRow - SQLite row representation for mapping from database
#[derive(Debug, Clone, FromRow)]
pub struct AdminRow {
    pub id: String,
    pub email: String,
    pub password_hash: String,
    pub name: String,
    pub role: String,
    pub permissions: String,
    pub active: i64,
    pub created_by: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

impl AdminRow {
    /// Convert database row to domain entity
    pub fn into_entity(self) -> DomainResult<Admin> {
        let parse_datetime = |s: &str| -> DomainResult<DateTime<Utc>> {
            DateTime::parse_from_rfc3339(s)
                .map(|dt| dt.with_timezone(&Utc))
                .map_err(|_| DomainError::Internal(format!("Invalid date format: {}", s)))
        };

        // Permissions are stored as a JSON array of permission names
        let names: Vec<String> = serde_json::from_str(&self.permissions)
            .map_err(|e| DomainError::Internal(format!("Invalid permission set: {}", e)))?;
        let mut permissions = HashSet::with_capacity(names.len());
        for name in names {
            let p = Permission::from_str(&name)
                .ok_or_else(|| DomainError::Internal(format!("Unknown permission: {}", name)))?;
            permissions.insert(p);
        }

        Ok(Admin {
            id: Uuid::parse_str(&self.id).map_err(|_| DomainError::InvalidUuid(self.id))?,
            email: self.email,
            password_hash: self.password_hash,
            name: self.name,
            role: UserRole::from_str(&self.role)
                .filter(UserRole::is_admin_scope)
                .ok_or_else(|| DomainError::Internal(format!("Invalid role: {}", self.role)))?,
            permissions,
            active: self.active != 0,
            created_by: self
                .created_by
                .as_deref()
                .map(|id| Uuid::parse_str(id).map_err(|_| DomainError::InvalidUuid(id.to_string())))
                .transpose()?,
            created_at: parse_datetime(&self.created_at)?,
            updated_at: parse_datetime(&self.updated_at)?,
        })
    }
}

/// AdminResponse DTO - used for API responses (excludes sensitive fields)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdminResponse {
    pub id: Uuid,
    pub email: String,
    pub name: String,
    pub role: String,
    pub permissions: Vec<String>,
    pub active: bool,
    pub created_at: String,
}

impl From<Admin> for AdminResponse {
    fn from(admin: Admin) -> Self {
        let mut permissions: Vec<String> = admin
            .permissions
            .iter()
            .map(|p| p.as_str().to_string())
            .collect();
        permissions.sort();
        Self {
            id: admin.id,
            email: admin.email,
            name: admin.name,
            role: admin.role.as_str().to_string(),
            permissions,
            active: admin.active,
            created_at: admin.created_at.to_rfc3339(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_admin_rejects_unknown_permission() {
        let admin = NewAdmin {
            email: "ops@samarpan.org".to_string(),
            password: "Ops12345!".to_string(),
            name: "Ops Admin".to_string(),
            role: "admin".to_string(),
            permissions: vec!["manage_blogs".to_string(), "launch_rockets".to_string()],
        };
        assert!(admin.validate().is_err());
    }

    #[test]
    fn new_admin_rejects_user_role() {
        let admin = NewAdmin {
            email: "ops@samarpan.org".to_string(),
            password: "Ops12345!".to_string(),
            name: "Ops Admin".to_string(),
            role: "user".to_string(),
            permissions: vec![],
        };
        assert!(admin.validate().is_err());
    }

    #[test]
    fn admin_row_parses_permission_json() {
        let now = Utc::now().to_rfc3339();
        let row = AdminRow {
            id: Uuid::new_v4().to_string(),
            email: "a@samarpan.org".into(),
            password_hash: "hash".into(),
            name: "A".into(),
            role: "admin".into(),
            permissions: r#"["manage_blogs","view_event_donors"]"#.into(),
            active: 1,
            created_by: None,
            created_at: now.clone(),
            updated_at: now,
        };
        let admin = row.into_entity().unwrap();
        assert!(admin.permissions.contains(&Permission::ManageBlogs));
        assert!(admin.permissions.contains(&Permission::ViewEventDonors));
        assert_eq!(admin.permissions.len(), 2);
    }

    #[test]
    fn admin_row_rejects_user_role_in_admin_store() {
        let now = Utc::now().to_rfc3339();
        let row = AdminRow {
            id: Uuid::new_v4().to_string(),
            email: "a@samarpan.org".into(),
            password_hash: "hash".into(),
            name: "A".into(),
            role: "user".into(),
            permissions: "[]".into(),
            active: 1,
            created_by: None,
            created_at: now.clone(),
            updated_at: now,
        };
        assert!(row.into_entity().is_err());
    }
}
