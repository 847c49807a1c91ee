use crate::domains::blood_request::types::{
    BloodRequest, BloodRequestRow, NewBloodRequest, RequestStatus,
};
use crate::errors::{DbError, DbResult};
use crate::types::{PaginatedResult, PaginationParams};
use async_trait::async_trait;
use chrono::Utc;
use sqlx::{query_as, SqlitePool};
use uuid::Uuid;

/// Repository for BloodRequest entity operations
#[async_trait]
pub trait BloodRequestRepository: Send + Sync {
    async fn create(&self, requester_id: Uuid, new_request: &NewBloodRequest)
        -> DbResult<BloodRequest>;
    async fn find_by_id(&self, id: Uuid) -> DbResult<BloodRequest>;
    async fn find_open(&self, params: PaginationParams) -> DbResult<PaginatedResult<BloodRequest>>;
    async fn find_by_requester(
        &self,
        requester_id: Uuid,
        params: PaginationParams,
    ) -> DbResult<PaginatedResult<BloodRequest>>;
    async fn update_status(&self, id: Uuid, status: RequestStatus) -> DbResult<()>;
}

pub struct SqliteBloodRequestRepository {
    pool: SqlitePool,
}

impl SqliteBloodRequestRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    async fn paginate(
        &self,
        where_clause: &str,
        bind: Option<String>,
        params: PaginationParams,
    ) -> DbResult<PaginatedResult<BloodRequest>> {
        let offset = (params.page.max(1) - 1) * params.per_page;

        let count_sql = format!("SELECT COUNT(*) FROM blood_requests WHERE {}", where_clause);
        let mut count_query = sqlx::query_scalar::<_, i64>(&count_sql);
        if let Some(value) = &bind {
            count_query = count_query.bind(value.clone());
        }
        let total = count_query.fetch_one(&self.pool).await.map_err(DbError::from)?;

        let rows_sql = format!(
            "SELECT * FROM blood_requests WHERE {}
             ORDER BY CASE urgency WHEN 'critical' THEN 0 WHEN 'urgent' THEN 1 ELSE 2 END, created_at DESC
             LIMIT ? OFFSET ?",
            where_clause
        );
        let mut rows_query = query_as::<_, BloodRequestRow>(&rows_sql);
        if let Some(value) = &bind {
            rows_query = rows_query.bind(value.clone());
        }
        let rows = rows_query
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

#[async_trait]
impl BloodRequestRepository for SqliteBloodRequestRepository {
    async fn create(
        &self,
        requester_id: Uuid,
        new_request: &NewBloodRequest,
    ) -> DbResult<BloodRequest> {
        let id = Uuid::new_v4();
        let now = Utc::now().to_rfc3339();

        sqlx::query(
            "INSERT INTO blood_requests (id, requester_id, patient_name, blood_group, units, location, urgency, status, created_at, updated_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, 'open', ?, ?)",
        )
        .bind(id.to_string())
        .bind(requester_id.to_string())
        .bind(&new_request.patient_name)
        .bind(&new_request.blood_group)
        .bind(new_request.units)
        .bind(&new_request.location)
        .bind(&new_request.urgency)
        .bind(&now)
        .bind(&now)
        .execute(&self.pool)
        .await
        .map_err(DbError::from)?;

        self.find_by_id(id).await
    }

    async fn find_by_id(&self, id: Uuid) -> DbResult<BloodRequest> {
        let row = query_as::<_, BloodRequestRow>("SELECT * FROM blood_requests WHERE id = ?")
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await
            .map_err(DbError::from)?
            .ok_or_else(|| DbError::NotFound("BloodRequest".to_string(), id.to_string()))?;

        row.into_entity()
            .map_err(|e| DbError::Other(e.to_string()))
    }

    async fn find_open(&self, params: PaginationParams) -> DbResult<PaginatedResult<BloodRequest>> {
        self.paginate("status = 'open'", None, params).await
    }

    async fn find_by_requester(
        &self,
        requester_id: Uuid,
        params: PaginationParams,
    ) -> DbResult<PaginatedResult<BloodRequest>> {
        self.paginate("requester_id = ?", Some(requester_id.to_string()), params)
            .await
    }

    async fn update_status(&self, id: Uuid, status: RequestStatus) -> DbResult<()> {
        let result = sqlx::query("UPDATE blood_requests SET status = ?, updated_at = ? WHERE id = ?")
            .bind(status.as_str())
            .bind(Utc::now().to_rfc3339())
            .bind(id.to_string())
            .execute(&self.pool)
            .await
            .map_err(DbError::from)?;

        if result.rows_affected() == 0 {
            return Err(DbError::NotFound("BloodRequest".to_string(), id.to_string()));
        }
        Ok(())
    }
}
