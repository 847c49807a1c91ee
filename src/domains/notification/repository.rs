use crate::domains::notification::types::{Notification, NotificationRow};
use crate::errors::{DbError, DbResult};
use crate::types::{PaginatedResult, PaginationParams};
use async_trait::async_trait;
use chrono::Utc;
use sqlx::{query_as, SqlitePool};
use uuid::Uuid;

#[async_trait]
pub trait NotificationRepository: Send + Sync {
    async fn insert(&self, user_id: Uuid, title: &str, body: &str) -> DbResult<Notification>;
    async fn find_by_user(
        &self,
        user_id: Uuid,
        params: PaginationParams,
    ) -> DbResult<PaginatedResult<Notification>>;
    async fn mark_read(&self, id: Uuid, user_id: Uuid) -> DbResult<()>;
    async fn unread_count(&self, user_id: Uuid) -> DbResult<i64>;
}

pub struct SqliteNotificationRepository {
    pool: SqlitePool,
}

impl SqliteNotificationRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl NotificationRepository for SqliteNotificationRepository {
    async fn insert(&self, user_id: Uuid, title: &str, body: &str) -> DbResult<Notification> {
        let id = Uuid::new_v4();
        let now = Utc::now().to_rfc3339();

        sqlx::query(
            "INSERT INTO notifications (id, user_id, title, body, read, created_at)
             VALUES (?, ?, ?, ?, 0, ?)",
        )
        .bind(id.to_string())
        .bind(user_id.to_string())
        .bind(title)
        .bind(body)
        .bind(&now)
        .execute(&self.pool)
        .await
        .map_err(DbError::from)?;

        let row = query_as::<_, NotificationRow>("SELECT * FROM notifications WHERE id = ?")
            .bind(id.to_string())
            .fetch_one(&self.pool)
            .await
            .map_err(DbError::from)?;

        row.into_entity()
            .map_err(|e| DbError::Other(e.to_string()))
    }

    async fn find_by_user(
        &self,
        user_id: Uuid,
        params: PaginationParams,
    ) -> DbResult<PaginatedResult<Notification>> {
        let offset = (params.page.max(1) - 1) * params.per_page;

        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM notifications WHERE user_id = ?")
            .bind(user_id.to_string())
            .fetch_one(&self.pool)
            .await
            .map_err(DbError::from)?;

        let rows = query_as::<_, NotificationRow>(
            "SELECT * FROM notifications WHERE user_id = ? ORDER BY created_at DESC LIMIT ? OFFSET ?",
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

    async fn mark_read(&self, id: Uuid, user_id: Uuid) -> DbResult<()> {
        let result = sqlx::query("UPDATE notifications SET read = 1 WHERE id = ? AND user_id = ?")
            .bind(id.to_string())
            .bind(user_id.to_string())
            .execute(&self.pool)
            .await
            .map_err(DbError::from)?;

        if result.rows_affected() == 0 {
            return Err(DbError::NotFound("Notification".to_string(), id.to_string()));
        }
        Ok(())
    }

    async fn unread_count(&self, user_id: Uuid) -> DbResult<i64> {
        sqlx::query_scalar("SELECT COUNT(*) FROM notifications WHERE user_id = ? AND read = 0")
            .bind(user_id.to_string())
            .fetch_one(&self.pool)
            .await
            .map_err(DbError::from)
    }
}
