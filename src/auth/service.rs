use crate::auth::{jwt, AuthContext, AuthRepository};
use crate::errors::{DbError, DomainError, ServiceError, ServiceResult};
use crate::types::{Permission, UserRole};
use argon2::{password_hash::SaltString, Argon2, PasswordHash, PasswordHasher, PasswordVerifier};
use chrono::{DateTime, Utc};
use rand_core::OsRng as ArgonOsRng;
use sqlx::SqlitePool;
use std::collections::HashSet;
use std::sync::Arc;
use uuid::Uuid;

/// Results from a successful login, including refresh token
#[derive(Debug)]
pub struct LoginResult {
    pub auth_context: AuthContext,
    pub access_token: String,
    pub access_expiry: DateTime<Utc>,
    pub refresh_token: String,
    pub refresh_expiry: DateTime<Utc>,
}

/// Auth service: credential verification, token issuing, and the
/// authorization gate consulted by every privileged operation.
pub struct AuthService {
    auth_repo: Arc<dyn AuthRepository>,
}

impl AuthService {
    pub fn new(pool: SqlitePool) -> Self {
        let auth_repo = Arc::new(super::repository::SqliteAuthRepository::new(pool));
        Self { auth_repo }
    }

    /// Authenticate a donor/requester with email and password
    pub async fn login(&self, email: &str, password: &str) -> ServiceResult<LoginResult> {
        let user = match self.auth_repo.find_user_by_email(email).await {
            Ok(user) => user,
            Err(_) => {
                let _ = self
                    .auth_repo
                    .log_login_attempt("user", email, false, None)
                    .await;
                return Err(ServiceError::Authentication(
                    "Invalid email or password".to_string(),
                ));
            }
        };

        if !user.is_active() {
            self.auth_repo
                .log_login_attempt("user", email, false, Some(user.id))
                .await
                .map_err(DomainError::Database)?;
            return Err(ServiceError::Authentication(
                "Account is inactive".to_string(),
            ));
        }

        if self.verify_password(password, &user.password_hash).is_err() {
            self.auth_repo
                .log_login_attempt("user", email, false, Some(user.id))
                .await
                .map_err(DomainError::Database)?;
            return Err(ServiceError::Authentication(
                "Invalid email or password".to_string(),
            ));
        }

        self.auth_repo
            .log_login_attempt("user", email, true, Some(user.id))
            .await
            .map_err(DomainError::Database)?;

        let auth_context = AuthContext::new(
            user.id,
            user.role,
            HashSet::new(),
            user.email,
            user.name,
        );
        self.issue_tokens(auth_context)
    }

    /// Authenticate an administrator with email and password
    pub async fn login_admin(&self, email: &str, password: &str) -> ServiceResult<LoginResult> {
        let admin = match self.auth_repo.find_admin_by_email(email).await {
            Ok(admin) => admin,
            Err(_) => {
                let _ = self
                    .auth_repo
                    .log_login_attempt("admin", email, false, None)
                    .await;
                return Err(ServiceError::Authentication(
                    "Invalid email or password".to_string(),
                ));
            }
        };

        if !admin.is_active() {
            self.auth_repo
                .log_login_attempt("admin", email, false, Some(admin.id))
                .await
                .map_err(DomainError::Database)?;
            return Err(ServiceError::Authentication(
                "Account is suspended".to_string(),
            ));
        }

        if self.verify_password(password, &admin.password_hash).is_err() {
            self.auth_repo
                .log_login_attempt("admin", email, false, Some(admin.id))
                .await
                .map_err(DomainError::Database)?;
            return Err(ServiceError::Authentication(
                "Invalid email or password".to_string(),
            ));
        }

        self.auth_repo
            .log_login_attempt("admin", email, true, Some(admin.id))
            .await
            .map_err(DomainError::Database)?;

        let auth_context = AuthContext::new(
            admin.id,
            admin.role,
            admin.permissions,
            admin.email,
            admin.name,
        );
        self.issue_tokens(auth_context)
    }

    fn issue_tokens(&self, auth_context: AuthContext) -> ServiceResult<LoginResult> {
        let (access_token, access_expiry) = jwt::generate_token(
            &auth_context.user_id,
            &auth_context.role,
            jwt::TokenType::Access,
        )?;
        let (refresh_token, refresh_expiry) =
            jwt::generate_refresh_token(&auth_context.user_id, &auth_context.role)?;

        Ok(LoginResult {
            auth_context,
            access_token,
            access_expiry,
            refresh_token,
            refresh_expiry,
        })
    }

    /// The authorization gate.
    ///
    /// Verifies the token, then re-fetches the subject from the
    /// identity store so that a role downgrade, permission revocation,
    /// or account suspension takes effect on the very next call - the
    /// claimed role is used only to pick the store to look in.
    pub async fn resolve(
        &self,
        token: &str,
        required: Option<Permission>,
    ) -> ServiceResult<AuthContext> {
        let claims = jwt::verify_token(token)?;

        // Access tokens only; a refresh token is not a credential here
        if claims.refresh_exp.is_some() {
            return Err(ServiceError::Authentication(
                "Expected access token, received refresh token".to_string(),
            ));
        }

        let is_revoked = self
            .auth_repo
            .is_token_revoked(&claims.jti)
            .await
            .map_err(|db_err| ServiceError::Domain(DomainError::Database(db_err)))?;
        if is_revoked {
            log::warn!("Attempted to use revoked token JTI: {}", claims.jti);
            return Err(ServiceError::Authentication(
                "Token has been revoked".to_string(),
            ));
        }

        let subject_id = Uuid::parse_str(&claims.sub)
            .map_err(|_| ServiceError::Authentication("Invalid subject ID in token".to_string()))?;

        let claimed_role = UserRole::from_str(&claims.role)
            .ok_or_else(|| ServiceError::Authentication("Invalid role in token".to_string()))?;

        let auth_context = if claimed_role.is_admin_scope() {
            let admin = self
                .auth_repo
                .find_admin_by_id(subject_id)
                .await
                .map_err(Self::identity_lookup_error)?;
            if !admin.is_active() {
                return Err(ServiceError::Authentication(
                    "Account is suspended".to_string(),
                ));
            }
            // Stored role and permission set, never the claims
            AuthContext::new(
                admin.id,
                admin.role,
                admin.permissions,
                admin.email,
                admin.name,
            )
        } else {
            let user = self
                .auth_repo
                .find_user_by_id(subject_id)
                .await
                .map_err(Self::identity_lookup_error)?;
            if !user.is_active() {
                return Err(ServiceError::Authentication(
                    "Account is inactive".to_string(),
                ));
            }
            AuthContext::new(user.id, user.role, HashSet::new(), user.email, user.name)
        };

        if let Some(permission) = required {
            auth_context.authorize(permission)?;
        }

        Ok(auth_context)
    }

    fn identity_lookup_error(err: DbError) -> ServiceError {
        match err {
            DbError::NotFound(_, _) => {
                ServiceError::Authentication("Identity no longer exists".to_string())
            }
            other => ServiceError::Domain(DomainError::Database(other)),
        }
    }

    /// Verify an access token and create an auth context
    pub async fn verify_token(&self, token: &str) -> ServiceResult<AuthContext> {
        self.resolve(token, None).await
    }

    /// Refresh an access token using a refresh token
    pub async fn refresh_session(&self, refresh_token: &str) -> ServiceResult<(String, DateTime<Utc>)> {
        let (new_access_token, new_access_expiry) = jwt::refresh_access_token(refresh_token)?;
        Ok((new_access_token, new_access_expiry))
    }

    /// Generate a hash for a new password
    pub fn hash_password(&self, password: &str) -> ServiceResult<String> {
        let mut rng = ArgonOsRng;
        let salt = SaltString::generate(&mut rng);

        let argon2 = Argon2::default();

        let password_hash = argon2
            .hash_password(password.as_bytes(), &salt)
            .map_err(|e| {
                ServiceError::Domain(DomainError::Internal(format!(
                    "Failed to hash password: {}",
                    e
                )))
            })?
            .to_string();

        Ok(password_hash)
    }

    /// Verify a password against a hash
    pub fn verify_password(&self, password: &str, hash: &str) -> Result<(), ServiceError> {
        let parsed_hash = PasswordHash::new(hash).map_err(|_| {
            ServiceError::Domain(DomainError::Internal(
                "Invalid password hash format".to_string(),
            ))
        })?;

        Argon2::default()
            .verify_password(password.as_bytes(), &parsed_hash)
            .map_err(|_| ServiceError::Authentication("Invalid password".to_string()))
    }

    /// Log out an identity, revoking its tokens via the jti blocklist
    pub async fn logout(
        &self,
        auth_context: &AuthContext,
        access_token: &str,
        refresh_token: Option<&str>,
    ) -> ServiceResult<()> {
        // Claims are decoded unverified: an already expired token still
        // gets its jti blocklisted.
        match jwt::decode_unverified(access_token) {
            Ok(claims) => {
                if let Err(e) = self.auth_repo.add_revoked_token(&claims.jti, claims.exp).await {
                    log::error!(
                        "Failed to add access token JTI {} to blocklist: {}",
                        claims.jti,
                        e
                    );
                }
            }
            Err(e) => {
                log::error!(
                    "Failed to decode access token during logout for {}: {}",
                    auth_context.user_id,
                    e
                );
            }
        }

        if let Some(rt) = refresh_token {
            match jwt::decode_unverified(rt) {
                Ok(claims) => {
                    let expiry = claims.refresh_exp.unwrap_or(claims.exp);
                    if let Err(e) = self.auth_repo.add_revoked_token(&claims.jti, expiry).await {
                        log::error!(
                            "Failed to add refresh token JTI {} to blocklist: {}",
                            claims.jti,
                            e
                        );
                    }
                }
                Err(e) => {
                    log::error!(
                        "Failed to decode refresh token during logout for {}: {}",
                        auth_context.user_id,
                        e
                    );
                }
            }
        }

        let scope = if auth_context.role.is_admin_scope() {
            "admin"
        } else {
            "user"
        };
        self.auth_repo
            .log_logout(scope, auth_context.user_id)
            .await
            .map_err(DomainError::Database)?;

        log::info!("{} {} logged out", scope, auth_context.user_id);
        Ok(())
    }

    /// Remove blocklist entries whose tokens have expired anyway
    pub async fn prune_revoked_tokens(&self) -> ServiceResult<u64> {
        self.auth_repo
            .delete_expired_revoked_tokens()
            .await
            .map_err(|e| ServiceError::Domain(DomainError::Database(e)))
    }
}
