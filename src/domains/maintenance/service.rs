use crate::auth::AuthContext;
use crate::domains::maintenance::repository::MaintenanceRepository;
use crate::domains::maintenance::types::MaintenanceStatus;
use crate::errors::{DbError, DomainError, ServiceError, ServiceResult};
use crate::types::Permission;
use chrono::Utc;
use sqlx::SqlitePool;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use uuid::Uuid;

/// How long a cached maintenance read stays valid
const CACHE_TTL: Duration = Duration::from_secs(30);

struct CachedStatus {
    status: MaintenanceStatus,
    fetched_at: Instant,
}

/// The maintenance flag, persisted in app_settings and served through a
/// short-TTL cache. The cache re-reads on expiry, so a change made by
/// another process shows up within the TTL; a toggle through this
/// service refreshes it immediately.
pub struct MaintenanceService {
    pool: SqlitePool,
    repo: Arc<dyn MaintenanceRepository>,
    cache: Mutex<Option<CachedStatus>>,
}

impl MaintenanceService {
    pub fn new(pool: SqlitePool) -> Self {
        let repo = Arc::new(super::repository::SqliteMaintenanceRepository::new(
            pool.clone(),
        ));
        Self {
            pool,
            repo,
            cache: Mutex::new(None),
        }
    }

    /// Current maintenance status, at most `CACHE_TTL` stale
    pub async fn status(&self) -> ServiceResult<MaintenanceStatus> {
        if let Some(status) = self.cached() {
            return Ok(status);
        }

        let status = self
            .repo
            .read()
            .await
            .map_err(|e| ServiceError::Domain(DomainError::Database(e)))?;
        self.store_in_cache(status.clone());
        Ok(status)
    }

    /// Toggle maintenance mode. Writes through and refreshes the cache.
    pub async fn set(
        &self,
        auth: &AuthContext,
        enabled: bool,
        message: Option<String>,
    ) -> ServiceResult<MaintenanceStatus> {
        auth.authorize(Permission::ToggleMaintenance)?;

        self.repo
            .write(enabled, message.as_deref(), auth.user_id)
            .await
            .map_err(|e| ServiceError::Domain(DomainError::Database(e)))?;

        self.audit_toggle(auth, enabled).await;

        let status = MaintenanceStatus { enabled, message };
        self.store_in_cache(status.clone());

        log::info!(
            "Maintenance mode {} by {}",
            if enabled { "enabled" } else { "disabled" },
            auth.user_id
        );
        Ok(status)
    }

    fn cached(&self) -> Option<MaintenanceStatus> {
        let guard = match self.cache.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        guard.as_ref().and_then(|entry| {
            if entry.fetched_at.elapsed() < CACHE_TTL {
                Some(entry.status.clone())
            } else {
                None
            }
        })
    }

    fn store_in_cache(&self, status: MaintenanceStatus) {
        let mut guard = match self.cache.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        *guard = Some(CachedStatus {
            status,
            fetched_at: Instant::now(),
        });
    }

    async fn audit_toggle(&self, auth: &AuthContext, enabled: bool) {
        let result = sqlx::query(
            "INSERT INTO audit_logs (id, actor_id, actor_scope, action, entity_table, entity_id, details, timestamp)
             VALUES (?, ?, 'admin', 'maintenance_toggled', 'app_settings', '1', ?, ?)",
        )
        .bind(Uuid::new_v4().to_string())
        .bind(auth.user_id.to_string())
        .bind(format!("{{\"enabled\":{}}}", enabled))
        .bind(Utc::now().to_rfc3339())
        .execute(&self.pool)
        .await
        .map_err(DbError::from);

        if let Err(e) = result {
            log::warn!("Failed to audit maintenance toggle: {}", e);
        }
    }
}
