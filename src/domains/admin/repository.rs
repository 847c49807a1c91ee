use crate::domains::admin::types::{Admin, AdminRow, NewAdmin, UpdateAdmin};
use crate::errors::{DbError, DbResult};
use crate::types::{PaginatedResult, PaginationParams, Permission};
use async_trait::async_trait;
use chrono::Utc;
use sqlx::{query_as, SqlitePool};
use std::collections::HashSet;
use uuid::Uuid;

/// Repository for Admin entity operations
#[async_trait]
pub trait AdminRepository: Send + Sync {
    async fn create(
        &self,
        new_admin: &NewAdmin,
        password_hash: &str,
        created_by: Uuid,
    ) -> DbResult<Admin>;
    async fn find_by_id(&self, id: Uuid) -> DbResult<Admin>;
    async fn find_by_email(&self, email: &str) -> DbResult<Admin>;
    async fn find_all(&self, params: PaginationParams) -> DbResult<PaginatedResult<Admin>>;
    async fn update(&self, id: Uuid, update: &UpdateAdmin) -> DbResult<Admin>;
    async fn count(&self) -> DbResult<i64>;
    /// Insert the bootstrap superadmin if no admin accounts exist yet.
    async fn seed_superadmin(&self, email: &str, name: &str, password_hash: &str) -> DbResult<bool>;
}

pub struct SqliteAdminRepository {
    pool: SqlitePool,
}

impl SqliteAdminRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

fn permissions_json(names: &[String]) -> DbResult<String> {
    // Normalize through the enum so unknown names never reach the store
    let mut set = HashSet::with_capacity(names.len());
    for name in names {
        let p = Permission::from_str(name)
            .ok_or_else(|| DbError::Other(format!("Unknown permission: {}", name)))?;
        set.insert(p);
    }
    let mut sorted: Vec<&str> = set.iter().map(Permission::as_str).collect();
    sorted.sort_unstable();
    serde_json::to_string(&sorted).map_err(|e| DbError::Other(e.to_string()))
}

#[async_trait]
impl AdminRepository for SqliteAdminRepository {
    async fn create(
        &self,
        new_admin: &NewAdmin,
        password_hash: &str,
        created_by: Uuid,
    ) -> DbResult<Admin> {
        let id = Uuid::new_v4();
        let now = Utc::now().to_rfc3339();
        let permissions = permissions_json(&new_admin.permissions)?;

        sqlx::query(
            "INSERT INTO admins (id, email, password_hash, name, role, permissions, active, created_by, created_at, updated_at)
             VALUES (?, ?, ?, ?, ?, ?, 1, ?, ?, ?)",
        )
        .bind(id.to_string())
        .bind(&new_admin.email)
        .bind(password_hash)
        .bind(&new_admin.name)
        .bind(&new_admin.role)
        .bind(permissions)
        .bind(created_by.to_string())
        .bind(&now)
        .bind(&now)
        .execute(&self.pool)
        .await
        .map_err(DbError::from)?;

        self.find_by_id(id).await
    }

    async fn find_by_id(&self, id: Uuid) -> DbResult<Admin> {
        let row = query_as::<_, AdminRow>("SELECT * FROM admins WHERE id = ?")
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await
            .map_err(DbError::from)?
            .ok_or_else(|| DbError::NotFound("Admin".to_string(), id.to_string()))?;

        row.into_entity()
            .map_err(|e| DbError::Other(e.to_string()))
    }

    async fn find_by_email(&self, email: &str) -> DbResult<Admin> {
        let row = query_as::<_, AdminRow>("SELECT * FROM admins WHERE email = ?")
            .bind(email)
            .fetch_optional(&self.pool)
            .await
            .map_err(DbError::from)?
            .ok_or_else(|| DbError::NotFound("Admin".to_string(), email.to_string()))?;

        row.into_entity()
            .map_err(|e| DbError::Other(e.to_string()))
    }

    async fn find_all(&self, params: PaginationParams) -> DbResult<PaginatedResult<Admin>> {
        let offset = (params.page.max(1) - 1) * params.per_page;

        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM admins")
            .fetch_one(&self.pool)
            .await
            .map_err(DbError::from)?;

        let rows = query_as::<_, AdminRow>(
            "SELECT * FROM admins ORDER BY created_at ASC LIMIT ? OFFSET ?",
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

    async fn update(&self, id: Uuid, update: &UpdateAdmin) -> DbResult<Admin> {
        // Confirm the row exists first
        let _ = self.find_by_id(id).await?;

        let mut builder = sqlx::QueryBuilder::new("UPDATE admins SET ");
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
        if let Some(role) = &update.role {
            push_set(&mut builder, &mut first, "role");
            builder.push_bind(role.clone());
        }
        if let Some(permissions) = &update.permissions {
            let json = permissions_json(permissions)?;
            push_set(&mut builder, &mut first, "permissions");
            builder.push_bind(json);
        }
        if let Some(active) = update.active {
            push_set(&mut builder, &mut first, "active");
            builder.push_bind(if active { 1i64 } else { 0i64 });
        }

        push_set(&mut builder, &mut first, "updated_at");
        builder.push_bind(Utc::now().to_rfc3339());
        builder.push(" WHERE id = ");
        builder.push_bind(id.to_string());

        builder
            .build()
            .execute(&self.pool)
            .await
            .map_err(DbError::from)?;

        self.find_by_id(id).await
    }

    async fn count(&self) -> DbResult<i64> {
        sqlx::query_scalar("SELECT COUNT(*) FROM admins")
            .fetch_one(&self.pool)
            .await
            .map_err(DbError::from)
    }

    async fn seed_superadmin(
        &self,
        email: &str,
        name: &str,
        password_hash: &str,
    ) -> DbResult<bool> {
        if self.count().await? > 0 {
            return Ok(false);
        }

        let id = Uuid::new_v4();
        let now = Utc::now().to_rfc3339();

        sqlx::query(
            "INSERT INTO admins (id, email, password_hash, name, role, permissions, active, created_by, created_at, updated_at)
             VALUES (?, ?, ?, ?, 'superadmin', '[]', 1, NULL, ?, ?)",
        )
        .bind(id.to_string())
        .bind(email)
        .bind(password_hash)
        .bind(name)
        .bind(&now)
        .bind(&now)
        .execute(&self.pool)
        .await
        .map_err(DbError::from)?;

        log::info!("Seeded bootstrap superadmin {}", email);
        Ok(true)
    }
}
