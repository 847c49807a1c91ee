pub mod repository;
pub mod service;
pub mod types;

pub use repository::{NotificationRepository, SqliteNotificationRepository};
pub use service::NotificationService;
pub use types::{EmailSender, LoggingEmailSender, LoggingNotifier, Notification, Notifier};
