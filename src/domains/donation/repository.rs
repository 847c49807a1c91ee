use crate::domains::donation::types::{Acceptance, AcceptanceRow, AcceptanceStatus};
use crate::errors::{DbError, DbResult};
use crate::types::{PaginatedResult, PaginationParams};
use async_trait::async_trait;
use chrono::Utc;
use sqlx::{query_as, SqlitePool};
use uuid::Uuid;

#[async_trait]
pub trait AcceptanceRepository: Send + Sync {
    /// Insert a new acceptance in the `accepted` state. A violation of
    /// the partial unique index on active (user, request) pairs is
    /// surfaced as `DbError::Conflict`.
    async fn insert(
        &self,
        request_id: Uuid,
        user_id: Uuid,
        blood_group: &str,
        units: i64,
    ) -> DbResult<Acceptance>;
    async fn find_by_id(&self, id: Uuid) -> DbResult<Acceptance>;
    /// The active (non-cancelled) acceptance for a (user, request) pair
    async fn find_active(&self, user_id: Uuid, request_id: Uuid) -> DbResult<Acceptance>;
    /// Overwrite the status; the transport flag is only touched when
    /// one is supplied.
    async fn update_status(
        &self,
        id: Uuid,
        status: AcceptanceStatus,
        needs_transportation: Option<bool>,
    ) -> DbResult<Acceptance>;
    async fn find_by_request(&self, request_id: Uuid) -> DbResult<Vec<Acceptance>>;
    async fn find_by_user(
        &self,
        user_id: Uuid,
        params: PaginationParams,
    ) -> DbResult<PaginatedResult<Acceptance>>;
}

pub struct SqliteAcceptanceRepository {
    pool: SqlitePool,
}

impl SqliteAcceptanceRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AcceptanceRepository for SqliteAcceptanceRepository {
    async fn insert(
        &self,
        request_id: Uuid,
        user_id: Uuid,
        blood_group: &str,
        units: i64,
    ) -> DbResult<Acceptance> {
        let id = Uuid::new_v4();
        let now = Utc::now().to_rfc3339();

        sqlx::query(
            "INSERT INTO acceptances (id, request_id, user_id, blood_group, units, status, needs_transportation, accepted_at, updated_at)
             VALUES (?, ?, ?, ?, ?, 'accepted', 0, ?, ?)",
        )
        .bind(id.to_string())
        .bind(request_id.to_string())
        .bind(user_id.to_string())
        .bind(blood_group)
        .bind(units)
        .bind(&now)
        .bind(&now)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            let db_err = DbError::from(e);
            if db_err.is_unique_violation() {
                DbError::Conflict("An active acceptance already exists for this request".to_string())
            } else {
                db_err
            }
        })?;

        self.find_by_id(id).await
    }

    async fn find_by_id(&self, id: Uuid) -> DbResult<Acceptance> {
        let row = query_as::<_, AcceptanceRow>("SELECT * FROM acceptances WHERE id = ?")
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await
            .map_err(DbError::from)?
            .ok_or_else(|| DbError::NotFound("Acceptance".to_string(), id.to_string()))?;

        row.into_entity()
            .map_err(|e| DbError::Other(e.to_string()))
    }

    async fn find_active(&self, user_id: Uuid, request_id: Uuid) -> DbResult<Acceptance> {
        let row = query_as::<_, AcceptanceRow>(
            "SELECT * FROM acceptances WHERE user_id = ? AND request_id = ? AND status != 'cancelled'",
        )
        .bind(user_id.to_string())
        .bind(request_id.to_string())
        .fetch_optional(&self.pool)
        .await
        .map_err(DbError::from)?
        .ok_or_else(|| DbError::NotFound("Acceptance".to_string(), request_id.to_string()))?;

        row.into_entity()
            .map_err(|e| DbError::Other(e.to_string()))
    }

    async fn update_status(
        &self,
        id: Uuid,
        status: AcceptanceStatus,
        needs_transportation: Option<bool>,
    ) -> DbResult<Acceptance> {
        let result = sqlx::query(
            "UPDATE acceptances SET status = ?, needs_transportation = COALESCE(?, needs_transportation), updated_at = ? WHERE id = ?",
        )
        .bind(status.as_str())
        .bind(needs_transportation.map(|v| if v { 1i64 } else { 0i64 }))
        .bind(Utc::now().to_rfc3339())
        .bind(id.to_string())
        .execute(&self.pool)
        .await
        .map_err(DbError::from)?;

        if result.rows_affected() == 0 {
            return Err(DbError::NotFound("Acceptance".to_string(), id.to_string()));
        }

        self.find_by_id(id).await
    }

    async fn find_by_request(&self, request_id: Uuid) -> DbResult<Vec<Acceptance>> {
        let rows = query_as::<_, AcceptanceRow>(
            "SELECT * FROM acceptances WHERE request_id = ? ORDER BY accepted_at ASC",
        )
        .bind(request_id.to_string())
        .fetch_all(&self.pool)
        .await
        .map_err(DbError::from)?;

        let mut items = Vec::with_capacity(rows.len());
        for row in rows {
            items.push(row.into_entity().map_err(|e| DbError::Other(e.to_string()))?);
        }
        Ok(items)
    }

    async fn find_by_user(
        &self,
        user_id: Uuid,
        params: PaginationParams,
    ) -> DbResult<PaginatedResult<Acceptance>> {
        let offset = (params.page.max(1) - 1) * params.per_page;

        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM acceptances WHERE user_id = ?")
            .bind(user_id.to_string())
            .fetch_one(&self.pool)
            .await
            .map_err(DbError::from)?;

        let rows = query_as::<_, AcceptanceRow>(
            "SELECT * FROM acceptances WHERE user_id = ? ORDER BY accepted_at DESC LIMIT ? OFFSET ?",
        )
        .bind(user_id.to_string())
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
}
