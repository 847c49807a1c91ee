use crate::errors::{DomainError, DomainResult, ServiceResult};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// A stored per-user notification
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Notification {
    pub id: Uuid,
    pub user_id: Uuid,
    pub title: String,
    pub body: String,
    pub read: bool,
    pub created_at: DateTime<Utc>,
}

/// External delivery channel (push, WhatsApp, SMS). Delivery is
/// best-effort: failures are logged by the caller and never propagated.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn deliver(&self, user_id: Uuid, title: &str, body: &str) -> ServiceResult<()>;
}

/// Transactional email channel, same best-effort contract.
#[async_trait]
pub trait EmailSender: Send + Sync {
    async fn send(&self, to: &str, subject: &str, body: &str) -> ServiceResult<()>;
}

/// Default channel that only writes to the log. Stands in wherever no
/// real provider is wired up, including tests.
pub struct LoggingNotifier;

#[async_trait]
impl Notifier for LoggingNotifier {
    async fn deliver(&self, user_id: Uuid, title: &str, _body: &str) -> ServiceResult<()> {
        log::info!("Notification for {}: {}", user_id, title);
        Ok(())
    }
}

pub struct LoggingEmailSender;

#[async_trait]
impl EmailSender for LoggingEmailSender {
    async fn send(&self, to: &str, subject: &str, _body: &str) -> ServiceResult<()> {
        log::info!("Email to {}: {}", to, subject);
        Ok(())
    }
}

/// NotificationRow - SQLite row representation
#[derive(Debug, Clone, FromRow)]
pub struct NotificationRow {
    pub id: String,
    pub user_id: String,
    pub title: String,
    pub body: String,
    pub read: i64,
    pub created_at: String,
}

impl NotificationRow {
    pub fn into_entity(self) -> DomainResult<Notification> {
        Ok(Notification {
            id: Uuid::parse_str(&self.id).map_err(|_| DomainError::InvalidUuid(self.id))?,
            user_id: Uuid::parse_str(&self.user_id)
                .map_err(|_| DomainError::InvalidUuid(self.user_id))?,
            title: self.title,
            body: self.body,
            read: self.read != 0,
            created_at: DateTime::parse_from_rfc3339(&self.created_at)
                .map(|dt| dt.with_timezone(&Utc))
                .map_err(|_| {
                    DomainError::Internal(format!("Invalid date format: {}", self.created_at))
                })?,
        })
    }
}
