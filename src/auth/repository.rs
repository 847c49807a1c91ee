use crate::domains::admin::types::{Admin, AdminRow};
use crate::domains::user::types::{User, UserRow};
use crate::errors::{DbError, DbResult};
use async_trait::async_trait;
use chrono::Utc;
use sqlx::{query_as, SqlitePool};
use uuid::Uuid;

#[async_trait]
pub(crate) trait AuthRepository: Send + Sync {
    async fn find_user_by_email(&self, email: &str) -> DbResult<User>;
    async fn find_user_by_id(&self, id: Uuid) -> DbResult<User>;
    async fn find_admin_by_email(&self, email: &str) -> DbResult<Admin>;
    async fn find_admin_by_id(&self, id: Uuid) -> DbResult<Admin>;
    async fn log_login_attempt(
        &self,
        scope: &str,
        email: &str,
        success: bool,
        subject_id: Option<Uuid>,
    ) -> DbResult<()>;
    async fn log_logout(&self, scope: &str, subject_id: Uuid) -> DbResult<()>;
    async fn add_revoked_token(&self, jti: &str, expiry: i64) -> DbResult<()>;
    async fn is_token_revoked(&self, jti: &str) -> DbResult<bool>;
    async fn delete_expired_revoked_tokens(&self) -> DbResult<u64>;
}

pub(crate) struct SqliteAuthRepository {
    pool: SqlitePool,
}

impl SqliteAuthRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AuthRepository for SqliteAuthRepository {
    async fn find_user_by_email(&self, email: &str) -> DbResult<User> {
        let row = query_as::<_, UserRow>("SELECT * FROM users WHERE email = ?")
            .bind(email)
            .fetch_optional(&self.pool)
            .await
            .map_err(DbError::from)?
            .ok_or_else(|| DbError::NotFound("User".to_string(), email.to_string()))?;

        row.into_entity()
            .map_err(|e| DbError::Other(e.to_string()))
    }

    async fn find_user_by_id(&self, id: Uuid) -> DbResult<User> {
        let row = query_as::<_, UserRow>("SELECT * FROM users WHERE id = ?")
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await
            .map_err(DbError::from)?
            .ok_or_else(|| DbError::NotFound("User".to_string(), id.to_string()))?;

        row.into_entity()
            .map_err(|e| DbError::Other(e.to_string()))
    }

    async fn find_admin_by_email(&self, email: &str) -> DbResult<Admin> {
        let row = query_as::<_, AdminRow>("SELECT * FROM admins WHERE email = ?")
            .bind(email)
            .fetch_optional(&self.pool)
            .await
            .map_err(DbError::from)?
            .ok_or_else(|| DbError::NotFound("Admin".to_string(), email.to_string()))?;

        row.into_entity()
            .map_err(|e| DbError::Other(e.to_string()))
    }

    async fn find_admin_by_id(&self, id: Uuid) -> DbResult<Admin> {
        let row = query_as::<_, AdminRow>("SELECT * FROM admins WHERE id = ?")
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await
            .map_err(DbError::from)?
            .ok_or_else(|| DbError::NotFound("Admin".to_string(), id.to_string()))?;

        row.into_entity()
            .map_err(|e| DbError::Other(e.to_string()))
    }

    async fn log_login_attempt(
        &self,
        scope: &str,
        email: &str,
        success: bool,
        subject_id: Option<Uuid>,
    ) -> DbResult<()> {
        let log_id = Uuid::new_v4();
        let now = Utc::now().to_rfc3339();
        let action = if success { "login_success" } else { "login_fail" };
        let entity_table = if scope == "admin" { "admins" } else { "users" };

        sqlx::query(
            "INSERT INTO audit_logs (id, actor_id, actor_scope, action, entity_table, entity_id, details, timestamp)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(log_id.to_string())
        .bind(subject_id.map(|id| id.to_string()))
        .bind(scope)
        .bind(action)
        .bind(entity_table)
        .bind(subject_id.map(|id| id.to_string()))
        .bind(format!("{{\"email\":\"{}\"}}", email))
        .bind(now)
        .execute(&self.pool)
        .await
        .map_err(DbError::from)?;

        Ok(())
    }

    async fn log_logout(&self, scope: &str, subject_id: Uuid) -> DbResult<()> {
        let log_id = Uuid::new_v4();
        let now = Utc::now().to_rfc3339();
        let entity_table = if scope == "admin" { "admins" } else { "users" };

        sqlx::query(
            "INSERT INTO audit_logs (id, actor_id, actor_scope, action, entity_table, entity_id, details, timestamp)
             VALUES (?, ?, ?, 'logout', ?, ?, NULL, ?)",
        )
        .bind(log_id.to_string())
        .bind(subject_id.to_string())
        .bind(scope)
        .bind(entity_table)
        .bind(subject_id.to_string())
        .bind(now)
        .execute(&self.pool)
        .await
        .map_err(DbError::from)?;

        Ok(())
    }

    async fn add_revoked_token(&self, jti: &str, expiry: i64) -> DbResult<()> {
        // Ignore the unique violation if the jti was already revoked
        sqlx::query("INSERT OR IGNORE INTO revoked_tokens (jti, expiry) VALUES (?, ?)")
            .bind(jti)
            .bind(expiry)
            .execute(&self.pool)
            .await
            .map_err(DbError::from)?;
        Ok(())
    }

    async fn is_token_revoked(&self, jti: &str) -> DbResult<bool> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM revoked_tokens WHERE jti = ?")
            .bind(jti)
            .fetch_one(&self.pool)
            .await
            .map_err(DbError::from)?;
        Ok(count > 0)
    }

    async fn delete_expired_revoked_tokens(&self) -> DbResult<u64> {
        let now = Utc::now().timestamp();
        let result = sqlx::query("DELETE FROM revoked_tokens WHERE expiry < ?")
            .bind(now)
            .execute(&self.pool)
            .await
            .map_err(DbError::from)?;
        Ok(result.rows_affected())
    }
}
