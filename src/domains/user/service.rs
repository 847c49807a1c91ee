use crate::auth::{AuthContext, AuthService};
use crate::domains::notification::types::EmailSender;
use crate::domains::user::repository::UserRepository;
use crate::domains::user::types::{NewUser, UpdateUser, UserResponse};
use crate::errors::{DbError, DomainError, ServiceError, ServiceResult};
use crate::types::{PaginatedResult, PaginationParams, Permission};
use crate::validation::{validate_unique, Validate, ValidationBuilder};
use sqlx::SqlitePool;
use std::sync::Arc;
use uuid::Uuid;

/// Donor/requester account service
pub struct UserService {
    pool: SqlitePool,
    repo: Arc<dyn UserRepository>,
    auth_service: Arc<AuthService>,
    email_sender: Arc<dyn EmailSender>,
}

impl UserService {
    pub fn new(
        pool: SqlitePool,
        auth_service: Arc<AuthService>,
        email_sender: Arc<dyn EmailSender>,
    ) -> Self {
        let repo = Arc::new(super::repository::SqliteUserRepository::new(pool.clone()));
        Self {
            pool,
            repo,
            auth_service,
            email_sender,
        }
    }

    /// The underlying repository, for services that share it
    pub fn repository(&self) -> Arc<dyn UserRepository> {
        self.repo.clone()
    }

    /// Register a new donor account. Open to unauthenticated callers.
    pub async fn register(&self, new_user: NewUser) -> ServiceResult<UserResponse> {
        new_user.validate()?;
        validate_unique(&self.pool, "users", "email", &new_user.email, None, "email").await?;

        let password_hash = self.auth_service.hash_password(&new_user.password)?;

        let user = self
            .repo
            .create(&new_user, &password_hash)
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

        log::info!("Registered new user {} ({})", user.id, user.email);

        // Welcome mail is best-effort; registration already succeeded
        if let Err(e) = self
            .email_sender
            .send(
                &user.email,
                "Welcome to Samarpan",
                &format!(
                    "Hi {}, thank you for registering as a blood donor. \
                     Your blood group {} can save lives.",
                    user.name, user.blood_group
                ),
            )
            .await
        {
            log::warn!("Welcome email failed for {}: {}", user.email, e);
        }

        Ok(UserResponse::from(user))
    }

    /// Fetch a single user. Own profile, or any profile for admin scope.
    pub async fn get_user(&self, auth: &AuthContext, id: Uuid) -> ServiceResult<UserResponse> {
        auth.authorize_self_or_admin(&id)?;

        let user = self
            .repo
            .find_by_id(id)
            .await
            .map_err(Self::map_not_found)?;
        Ok(UserResponse::from(user))
    }

    /// Fetch the caller's own profile
    pub async fn get_profile(&self, auth: &AuthContext) -> ServiceResult<UserResponse> {
        let user = self
            .repo
            .find_by_id(auth.user_id)
            .await
            .map_err(Self::map_not_found)?;
        Ok(UserResponse::from(user))
    }

    /// List all accounts. Requires the user management permission.
    pub async fn list_users(
        &self,
        auth: &AuthContext,
        params: PaginationParams,
    ) -> ServiceResult<PaginatedResult<UserResponse>> {
        auth.authorize(Permission::ManageUsers)?;

        let page = self
            .repo
            .find_all(params)
            .await
            .map_err(DomainError::Database)?;
        Ok(page.map(UserResponse::from))
    }

    /// Search active donors by blood group. Any authenticated caller.
    ///
    /// Blood group comparison is an exact string match against the
    /// eight recognized groups. Least-recent donors sort first.
    pub async fn search_donors(
        &self,
        _auth: &AuthContext,
        blood_group: &str,
        params: PaginationParams,
    ) -> ServiceResult<PaginatedResult<UserResponse>> {
        ValidationBuilder::new("blood_group", Some(blood_group.to_string()))
            .required()
            .blood_group()
            .validate()?;

        let page = self
            .repo
            .find_donors_by_blood_group(blood_group, params)
            .await
            .map_err(DomainError::Database)?;
        Ok(page.map(UserResponse::from))
    }

    /// Update a profile. Own profile, or any for admin scope; the
    /// active flag is reserved for user management.
    pub async fn update_profile(
        &self,
        auth: &AuthContext,
        id: Uuid,
        update: UpdateUser,
    ) -> ServiceResult<UserResponse> {
        auth.authorize_self_or_admin(&id)?;
        if update.active.is_some() {
            auth.authorize(Permission::ManageUsers)?;
        }
        update.validate()?;

        if update.is_empty_update() {
            return Err(ServiceError::Domain(DomainError::Validation(
                crate::errors::ValidationError::custom("No fields to update"),
            )));
        }

        let user = self
            .repo
            .update(id, &update)
            .await
            .map_err(Self::map_not_found)?;
        Ok(UserResponse::from(user))
    }

    /// Change the caller's own password, verifying the current one first
    pub async fn change_password(
        &self,
        auth: &AuthContext,
        current_password: &str,
        new_password: &str,
    ) -> ServiceResult<()> {
        ValidationBuilder::new("new_password", Some(new_password.to_string()))
            .required()
            .min_length(8)
            .validate()?;

        let user = self
            .repo
            .find_by_id(auth.user_id)
            .await
            .map_err(Self::map_not_found)?;

        self.auth_service
            .verify_password(current_password, &user.password_hash)
            .map_err(|_| {
                ServiceError::Authentication("Current password is incorrect".to_string())
            })?;

        let new_hash = self.auth_service.hash_password(new_password)?;
        self.repo
            .update_password(auth.user_id, &new_hash)
            .await
            .map_err(DomainError::Database)?;

        log::info!("Password changed for user {}", auth.user_id);
        Ok(())
    }

    /// Activate or suspend an account. Requires user management.
    pub async fn set_active(&self, auth: &AuthContext, id: Uuid, active: bool) -> ServiceResult<()> {
        auth.authorize(Permission::ManageUsers)?;

        self.repo
            .set_active(id, active)
            .await
            .map_err(Self::map_not_found)?;

        log::info!(
            "User {} {} by {}",
            id,
            if active { "activated" } else { "suspended" },
            auth.user_id
        );
        Ok(())
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
