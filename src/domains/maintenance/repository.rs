use crate::domains::maintenance::types::MaintenanceStatus;
use crate::errors::{DbError, DbResult};
use async_trait::async_trait;
use chrono::Utc;
use sqlx::{FromRow, SqlitePool};
use uuid::Uuid;

#[derive(Debug, FromRow)]
struct AppSettingsRow {
    maintenance_mode: i64,
    maintenance_message: Option<String>,
}

#[async_trait]
pub trait MaintenanceRepository: Send + Sync {
    async fn read(&self) -> DbResult<MaintenanceStatus>;
    async fn write(
        &self,
        enabled: bool,
        message: Option<&str>,
        updated_by: Uuid,
    ) -> DbResult<()>;
}

pub struct SqliteMaintenanceRepository {
    pool: SqlitePool,
}

impl SqliteMaintenanceRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl MaintenanceRepository for SqliteMaintenanceRepository {
    async fn read(&self) -> DbResult<MaintenanceStatus> {
        // The settings row is seeded by the migration; a missing row
        // reads as maintenance off.
        let row = sqlx::query_as::<_, AppSettingsRow>(
            "SELECT maintenance_mode, maintenance_message FROM app_settings WHERE id = 1",
        )
        .fetch_optional(&self.pool)
        .await
        .map_err(DbError::from)?;

        Ok(row
            .map(|r| MaintenanceStatus {
                enabled: r.maintenance_mode != 0,
                message: r.maintenance_message,
            })
            .unwrap_or_default())
    }

    async fn write(&self, enabled: bool, message: Option<&str>, updated_by: Uuid) -> DbResult<()> {
        sqlx::query(
            "UPDATE app_settings SET maintenance_mode = ?, maintenance_message = ?, updated_at = ?, updated_by = ? WHERE id = 1",
        )
        .bind(if enabled { 1i64 } else { 0i64 })
        .bind(message)
        .bind(Utc::now().to_rfc3339())
        .bind(updated_by.to_string())
        .execute(&self.pool)
        .await
        .map_err(DbError::from)?;

        Ok(())
    }
}
