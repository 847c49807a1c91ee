use crate::auth::AuthContext;
use crate::domains::notification::repository::NotificationRepository;
use crate::domains::notification::types::{Notification, Notifier};
use crate::errors::{DbError, DomainError, ServiceError, ServiceResult};
use crate::types::{PaginatedResult, PaginationParams};
use sqlx::SqlitePool;
use std::sync::Arc;
use uuid::Uuid;

/// Stored notifications plus best-effort external delivery.
///
/// The store write is the operation; delivery through the channel is a
/// side effect that is allowed to fail without affecting the caller.
pub struct NotificationService {
    repo: Arc<dyn NotificationRepository>,
    notifier: Arc<dyn Notifier>,
}

impl NotificationService {
    pub fn new(pool: SqlitePool, notifier: Arc<dyn Notifier>) -> Self {
        let repo = Arc::new(super::repository::SqliteNotificationRepository::new(pool));
        Self { repo, notifier }
    }

    /// Store a notification for a user, then attempt delivery
    pub async fn notify(&self, user_id: Uuid, title: &str, body: &str) -> ServiceResult<Notification> {
        let notification = self
            .repo
            .insert(user_id, title, body)
            .await
            .map_err(DomainError::Database)?;

        if let Err(e) = self.notifier.deliver(user_id, title, body).await {
            log::warn!("Notification delivery failed for {}: {}", user_id, e);
        }

        Ok(notification)
    }

    /// The caller's own notifications, newest first
    pub async fn list_notifications(
        &self,
        auth: &AuthContext,
        params: PaginationParams,
    ) -> ServiceResult<PaginatedResult<Notification>> {
        let page = self
            .repo
            .find_by_user(auth.user_id, params)
            .await
            .map_err(DomainError::Database)?;
        Ok(page)
    }

    /// Mark one of the caller's notifications as read
    pub async fn mark_read(&self, auth: &AuthContext, id: Uuid) -> ServiceResult<()> {
        self.repo
            .mark_read(id, auth.user_id)
            .await
            .map_err(|e| match e {
                DbError::NotFound(entity, key) => match Uuid::parse_str(&key) {
                    Ok(nid) => ServiceError::Domain(DomainError::EntityNotFound(entity, nid)),
                    Err(_) => ServiceError::Domain(DomainError::Internal(format!(
                        "{} not found: {}",
                        entity, key
                    ))),
                },
                other => ServiceError::Domain(DomainError::Database(other)),
            })
    }

    pub async fn unread_count(&self, auth: &AuthContext) -> ServiceResult<i64> {
        self.repo
            .unread_count(auth.user_id)
            .await
            .map_err(|e| ServiceError::Domain(DomainError::Database(e)))
    }
}
