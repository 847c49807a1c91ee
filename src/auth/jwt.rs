use crate::errors::{DomainError, ServiceError, ServiceResult};
use crate::types::UserRole;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;
use uuid::Uuid;

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub role: String,
    pub iat: i64,
    pub exp: i64,
    pub jti: String,
    pub refresh_exp: Option<i64>,
}

// JWT secret - loaded once at startup from the environment/config
static JWT_SECRET: OnceLock<String> = OnceLock::new();

/// Token type
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenType {
    /// Access token (short-lived)
    Access,
    /// Refresh token (long-lived)
    Refresh,
}

/// Initialize JWT module with secret
pub fn initialize(secret: &str) {
    JWT_SECRET.get_or_init(|| secret.to_string());
}

/// Get JWT secret
fn get_secret() -> ServiceResult<&'static str> {
    JWT_SECRET
        .get()
        .map(|s| s.as_str())
        .ok_or_else(|| ServiceError::Configuration("JWT secret not initialized".to_string()))
}

/// Generate a JWT token for an identity.
///
/// The role claim is informational only: the authorization gate always
/// re-derives role and permissions from storage, so a token minted
/// before a role change carries no stale authority.
pub fn generate_token(
    subject_id: &Uuid,
    role: &UserRole,
    token_type: TokenType,
) -> ServiceResult<(String, DateTime<Utc>)> {
    let secret = get_secret()?;

    let now = Utc::now();
    let token_id = Uuid::new_v4().to_string();

    // Set expiration based on token type
    let (expiry, refresh_exp) = match token_type {
        TokenType::Access => {
            // Access tokens expire in 15 minutes
            let exp = now + chrono::Duration::minutes(15);
            (exp, None)
        }
        TokenType::Refresh => {
            // Refresh tokens live for 30 days; the refresh_exp claim is
            // what marks them as refresh tokens at the gate
            let exp = now + chrono::Duration::days(30);
            (exp, Some(exp.timestamp()))
        }
    };

    let claims = Claims {
        sub: subject_id.to_string(),
        role: role.as_str().to_string(),
        iat: now.timestamp(),
        exp: expiry.timestamp(),
        jti: token_id,
        refresh_exp,
    };

    let token = jsonwebtoken::encode(
        &jsonwebtoken::Header::default(),
        &claims,
        &jsonwebtoken::EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|e| ServiceError::Domain(DomainError::Internal(format!("JWT encoding error: {}", e))))?;

    Ok((token, expiry))
}

/// Verify a JWT token's signature and expiry
pub fn verify_token(token: &str) -> ServiceResult<Claims> {
    let secret = get_secret()?;

    let token_data = jsonwebtoken::decode::<Claims>(
        token,
        &jsonwebtoken::DecodingKey::from_secret(secret.as_bytes()),
        &jsonwebtoken::Validation::new(jsonwebtoken::Algorithm::HS256),
    )
    .map_err(|e| match e.kind() {
        jsonwebtoken::errors::ErrorKind::ExpiredSignature => ServiceError::SessionExpired,
        _ => ServiceError::Authentication(format!("Invalid token: {}", e)),
    })?;

    Ok(token_data.claims)
}

/// Decode claims without verifying signature or expiry.
/// Used at logout to extract the jti from tokens that may already be expired.
pub fn decode_unverified(token: &str) -> ServiceResult<Claims> {
    let mut validation = jsonwebtoken::Validation::new(jsonwebtoken::Algorithm::HS256);
    validation.insecure_disable_signature_validation();
    validation.validate_exp = false;

    let token_data = jsonwebtoken::decode::<Claims>(
        token,
        &jsonwebtoken::DecodingKey::from_secret(&[]),
        &validation,
    )
    .map_err(|e| ServiceError::Authentication(format!("Invalid token: {}", e)))?;

    Ok(token_data.claims)
}

/// Generate a refresh token
pub fn generate_refresh_token(
    subject_id: &Uuid,
    role: &UserRole,
) -> ServiceResult<(String, DateTime<Utc>)> {
    generate_token(subject_id, role, TokenType::Refresh)
}

/// Refresh an access token using a refresh token
pub fn refresh_access_token(refresh_token: &str) -> ServiceResult<(String, DateTime<Utc>)> {
    let claims = verify_token(refresh_token)?;

    // Ensure it's a refresh token
    if claims.refresh_exp.is_none() {
        return Err(ServiceError::Authentication("Not a refresh token".to_string()));
    }

    let now = Utc::now().timestamp();
    if let Some(refresh_exp) = claims.refresh_exp {
        if refresh_exp < now {
            return Err(ServiceError::SessionExpired);
        }
    }

    let subject_id = Uuid::parse_str(&claims.sub)
        .map_err(|_| ServiceError::Authentication("Invalid subject ID in token".to_string()))?;

    let role = UserRole::from_str(&claims.role)
        .ok_or_else(|| ServiceError::Authentication("Invalid role in token".to_string()))?;

    generate_token(&subject_id, &role, TokenType::Access)
}
