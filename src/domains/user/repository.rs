use crate::domains::user::types::{NewUser, UpdateUser, User, UserRow};
use crate::errors::{DbError, DbResult};
use crate::types::{PaginatedResult, PaginationParams};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{query_as, SqlitePool};
use uuid::Uuid;

/// Repository for User entity operations
#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn create(&self, new_user: &NewUser, password_hash: &str) -> DbResult<User>;
    async fn find_by_id(&self, id: Uuid) -> DbResult<User>;
    async fn find_by_email(&self, email: &str) -> DbResult<User>;
    async fn find_all(&self, params: PaginationParams) -> DbResult<PaginatedResult<User>>;
    async fn find_donors_by_blood_group(
        &self,
        blood_group: &str,
        params: PaginationParams,
    ) -> DbResult<PaginatedResult<User>>;
    async fn update(&self, id: Uuid, update: &UpdateUser) -> DbResult<User>;
    async fn update_password(&self, id: Uuid, password_hash: &str) -> DbResult<()>;
    /// Stamp a completed donation: bump the count and set the last donation date.
    async fn record_donation(&self, id: Uuid, donated_at: DateTime<Utc>) -> DbResult<()>;
    async fn set_active(&self, id: Uuid, active: bool) -> DbResult<()>;
}

pub struct SqliteUserRepository {
    pool: SqlitePool,
}

impl SqliteUserRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    async fn fetch_row(&self, id: Uuid) -> DbResult<UserRow> {
        query_as::<_, UserRow>("SELECT * FROM users WHERE id = ?")
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await
            .map_err(DbError::from)?
            .ok_or_else(|| DbError::NotFound("User".to_string(), id.to_string()))
    }
}

#[async_trait]
impl UserRepository for SqliteUserRepository {
    async fn create(&self, new_user: &NewUser, password_hash: &str) -> DbResult<User> {
        let id = Uuid::new_v4();
        let now = Utc::now().to_rfc3339();

        sqlx::query(
            "INSERT INTO users (id, email, password_hash, name, blood_group, location, phone, donation_count, role, active, created_at, updated_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, 0, 'user', 1, ?, ?)",
        )
        .bind(id.to_string())
        .bind(&new_user.email)
        .bind(password_hash)
        .bind(&new_user.name)
        .bind(&new_user.blood_group)
        .bind(&new_user.location)
        .bind(&new_user.phone)
        .bind(&now)
        .bind(&now)
        .execute(&self.pool)
        .await
        .map_err(DbError::from)?;

        self.find_by_id(id).await
    }

    async fn find_by_id(&self, id: Uuid) -> DbResult<User> {
        self.fetch_row(id)
            .await?
            .into_entity()
            .map_err(|e| DbError::Other(e.to_string()))
    }

    async fn find_by_email(&self, email: &str) -> DbResult<User> {
        let row = query_as::<_, UserRow>("SELECT * FROM users WHERE email = ?")
            .bind(email)
            .fetch_optional(&self.pool)
            .await
            .map_err(DbError::from)?
            .ok_or_else(|| DbError::NotFound("User".to_string(), email.to_string()))?;

        row.into_entity()
            .map_err(|e| DbError::Other(e.to_string()))
    }

    async fn find_all(&self, params: PaginationParams) -> DbResult<PaginatedResult<User>> {
        let offset = (params.page.max(1) - 1) * params.per_page;

        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users")
            .fetch_one(&self.pool)
            .await
            .map_err(DbError::from)?;

        let rows = query_as::<_, UserRow>(
            "SELECT * FROM users ORDER BY created_at DESC LIMIT ? OFFSET ?",
        )
        .bind(params.per_page as i64)
        .bind(offset as i64)
        .fetch_all(&self.pool)
        .await
        .map_err(DbError::from)?;

        let mut items = Vec::with_capacity(rows.len());
        for row in rows {
            items.push(row.into_entity().map_err(|e| DbError::Other(e.to_string()))?);
        }

        Ok(PaginatedResult::new(items, total as u64, params))
    }

    async fn find_donors_by_blood_group(
        &self,
        blood_group: &str,
        params: PaginationParams,
    ) -> DbResult<PaginatedResult<User>> {
        let offset = (params.page.max(1) - 1) * params.per_page;

        let total: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM users WHERE blood_group = ? AND active = 1",
        )
        .bind(blood_group)
        .fetch_one(&self.pool)
        .await
        .map_err(DbError::from)?;

        let rows = query_as::<_, UserRow>(
            "SELECT * FROM users WHERE blood_group = ? AND active = 1
             ORDER BY last_donation_date ASC NULLS FIRST LIMIT ? OFFSET ?",
        )
        .bind(blood_group)
        .bind(params.per_page as i64)
        .bind(offset as i64)
        .fetch_all(&self.pool)
        .await
        .map_err(DbError::from)?;

        let mut items = Vec::with_capacity(rows.len());
        for row in rows {
            items.push(row.into_entity().map_err(|e| DbError::Other(e.to_string()))?);
        }

        Ok(PaginatedResult::new(items, total as u64, params))
    }

    async fn update(&self, id: Uuid, update: &UpdateUser) -> DbResult<User> {
        // Verify existence up front so the caller gets NotFound, not a no-op
        let _ = self.fetch_row(id).await?;
        let now = Utc::now().to_rfc3339();

        let mut builder = sqlx::QueryBuilder::new("UPDATE users SET ");
        let mut first = true;
        let mut push_set = |builder: &mut sqlx::QueryBuilder<sqlx::Sqlite>,
                            first: &mut bool,
                            column: &str| {
            if !*first {
                builder.push(", ");
            }
            *first = false;
            builder.push(column);
            builder.push(" = ");
        };

        if let Some(name) = &update.name {
            push_set(&mut builder, &mut first, "name");
            builder.push_bind(name.clone());
        }
        if let Some(blood_group) = &update.blood_group {
            push_set(&mut builder, &mut first, "blood_group");
            builder.push_bind(blood_group.clone());
        }
        if let Some(location) = &update.location {
            push_set(&mut builder, &mut first, "location");
            builder.push_bind(location.clone());
        }
        if let Some(phone) = &update.phone {
            push_set(&mut builder, &mut first, "phone");
            builder.push_bind(phone.clone());
        }
        if let Some(active) = update.active {
            push_set(&mut builder, &mut first, "active");
            builder.push_bind(if active { 1i64 } else { 0i64 });
        }

        push_set(&mut builder, &mut first, "updated_at");
        builder.push_bind(now);
        builder.push(" WHERE id = ");
        builder.push_bind(id.to_string());

        builder
            .build()
            .execute(&self.pool)
            .await
            .map_err(DbError::from)?;

        self.find_by_id(id).await
    }

    async fn update_password(&self, id: Uuid, password_hash: &str) -> DbResult<()> {
        let result = sqlx::query("UPDATE users SET password_hash = ?, updated_at = ? WHERE id = ?")
            .bind(password_hash)
            .bind(Utc::now().to_rfc3339())
            .bind(id.to_string())
            .execute(&self.pool)
            .await
            .map_err(DbError::from)?;

        if result.rows_affected() == 0 {
            return Err(DbError::NotFound("User".to_string(), id.to_string()));
        }
        Ok(())
    }

    async fn record_donation(&self, id: Uuid, donated_at: DateTime<Utc>) -> DbResult<()> {
        let result = sqlx::query(
            "UPDATE users SET last_donation_date = ?, donation_count = donation_count + 1, updated_at = ? WHERE id = ?",
        )
        .bind(donated_at.to_rfc3339())
        .bind(Utc::now().to_rfc3339())
        .bind(id.to_string())
        .execute(&self.pool)
        .await
        .map_err(DbError::from)?;

        if result.rows_affected() == 0 {
            return Err(DbError::NotFound("User".to_string(), id.to_string()));
        }
        Ok(())
    }

    async fn set_active(&self, id: Uuid, active: bool) -> DbResult<()> {
        let result = sqlx::query("UPDATE users SET active = ?, updated_at = ? WHERE id = ?")
            .bind(if active { 1i64 } else { 0i64 })
            .bind(Utc::now().to_rfc3339())
            .bind(id.to_string())
            .execute(&self.pool)
            .await
            .map_err(DbError::from)?;

        if result.rows_affected() == 0 {
            return Err(DbError::NotFound("User".to_string(), id.to_string()));
        }
        Ok(())
    }
}
