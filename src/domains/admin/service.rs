use crate::auth::{AuthContext, AuthService};
use crate::domains::admin::repository::AdminRepository;
use crate::domains::admin::types::{AdminResponse, NewAdmin, UpdateAdmin};
use crate::errors::{DbError, DomainError, ServiceError, ServiceResult};
use crate::types::{PaginatedResult, PaginationParams, PermissionGroup};
use crate::validation::{validate_unique, Validate};
use sqlx::SqlitePool;
use std::sync::Arc;
use uuid::Uuid;

/// Administrator account management. Every mutating operation here is
/// superadmin-gated; a regular admin cannot grow its own permission set.
pub struct AdminService {
    pool: SqlitePool,
    repo: Arc<dyn AdminRepository>,
    auth_service: Arc<AuthService>,
}

impl AdminService {
    pub fn new(pool: SqlitePool, auth_service: Arc<AuthService>) -> Self {
        let repo = Arc::new(super::repository::SqliteAdminRepository::new(pool.clone()));
        Self {
            pool,
            repo,
            auth_service,
        }
    }

    /// Create a new administrator with an explicit permission set
    pub async fn create_admin(
        &self,
        auth: &AuthContext,
        new_admin: NewAdmin,
    ) -> ServiceResult<AdminResponse> {
        auth.authorize_superadmin()?;
        new_admin.validate()?;
        validate_unique(&self.pool, "admins", "email", &new_admin.email, None, "email").await?;

        let password_hash = self.auth_service.hash_password(&new_admin.password)?;

        let admin = self
            .repo
            .create(&new_admin, &password_hash, auth.user_id)
            .await
            .map_err(|e| {
                if e.is_unique_violation() {
                    ServiceError::Domain(DomainError::Validation(
                        crate::errors::ValidationError::unique("email"),
                    ))
                } else {
                    ServiceError::Domain(DomainError::Database(e))
                }
            })?;

        log::info!(
            "Superadmin {} created admin {} ({})",
            auth.user_id,
            admin.id,
            admin.email
        );
        Ok(AdminResponse::from(admin))
    }

    /// Fetch a single admin. Own record, or any record for superadmin.
    pub async fn get_admin(&self, auth: &AuthContext, id: Uuid) -> ServiceResult<AdminResponse> {
        if auth.user_id != id {
            auth.authorize_superadmin()?;
        }

        let admin = self
            .repo
            .find_by_id(id)
            .await
            .map_err(Self::map_not_found)?;
        Ok(AdminResponse::from(admin))
    }

    /// List administrator accounts
    pub async fn list_admins(
        &self,
        auth: &AuthContext,
        params: PaginationParams,
    ) -> ServiceResult<PaginatedResult<AdminResponse>> {
        auth.authorize(crate::types::Permission::ManageAdmins)?;

        let page = self
            .repo
            .find_all(params)
            .await
            .map_err(DomainError::Database)?;
        Ok(page.map(AdminResponse::from))
    }

    /// Update an admin's name, role, permission set, or active flag.
    ///
    /// Takes effect on the target's very next request: the gate rebuilds
    /// the permission set from storage every time.
    pub async fn update_admin(
        &self,
        auth: &AuthContext,
        id: Uuid,
        update: UpdateAdmin,
    ) -> ServiceResult<AdminResponse> {
        auth.authorize_superadmin()?;
        update.validate()?;

        // A superadmin cannot demote or suspend itself; that path to an
        // adminless system stays closed.
        if id == auth.user_id && (update.role.as_deref() == Some("admin") || update.active == Some(false)) {
            return Err(ServiceError::PermissionDenied(
                "Superadmins cannot demote or suspend their own account".to_string(),
            ));
        }

        let admin = self
            .repo
            .update(id, &update)
            .await
            .map_err(Self::map_not_found)?;

        log::info!("Superadmin {} updated admin {}", auth.user_id, id);
        Ok(AdminResponse::from(admin))
    }

    /// Suspend or reinstate an admin account
    pub async fn set_active(&self, auth: &AuthContext, id: Uuid, active: bool) -> ServiceResult<()> {
        let update = UpdateAdmin {
            active: Some(active),
            ..Default::default()
        };
        self.update_admin(auth, id, update).await?;
        Ok(())
    }

    /// The permission catalog, grouped for admin-facing UIs
    pub fn permission_groups(&self, auth: &AuthContext) -> ServiceResult<Vec<PermissionGroup>> {
        auth.authorize_admin()?;
        Ok(PermissionGroup::all())
    }

    /// Insert the bootstrap superadmin when the admins store is empty
    pub async fn seed_superadmin(
        &self,
        email: &str,
        name: &str,
        password: &str,
    ) -> ServiceResult<bool> {
        let password_hash = self.auth_service.hash_password(password)?;
        self.repo
            .seed_superadmin(email, name, &password_hash)
            .await
            .map_err(|e| ServiceError::Domain(DomainError::Database(e)))
    }

    fn map_not_found(err: DbError) -> ServiceError {
        match err {
            DbError::NotFound(entity, key) => match Uuid::parse_str(&key) {
                Ok(id) => ServiceError::Domain(DomainError::EntityNotFound(entity, id)),
                Err(_) => ServiceError::Domain(DomainError::Internal(format!(
                    "{} not found: {}",
                    entity, key
                ))),
            },
            other => ServiceError::Domain(DomainError::Database(other)),
        }
    }
}
