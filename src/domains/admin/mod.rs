pub mod repository;
pub mod service;
pub mod types;

pub use repository::{AdminRepository, SqliteAdminRepository};
pub use service::AdminService;
pub use types::{Admin, AdminResponse, NewAdmin, UpdateAdmin};
