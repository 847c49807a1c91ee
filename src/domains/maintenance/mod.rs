pub mod repository;
pub mod service;
pub mod types;

pub use repository::{MaintenanceRepository, SqliteMaintenanceRepository};
pub use service::MaintenanceService;
pub use types::MaintenanceStatus;
