//! Core library of the Samarpan blood donation coordination platform.
//!
//! Two pieces carry the system: the authorization gate, which resolves
//! a bearer token to an identity whose role and permissions are always
//! re-read from storage, and the donation lifecycle, which moves a
//! donor's acceptance of a blood request through its states and
//! notifies the donor on each transition. The surrounding domains
//! (users, admins, requests, notifications, payments, maintenance)
//! make those two usable as a whole.
//!
//! The crate owns persistence (SQLite via sqlx, embedded migrations)
//! and domain rules; HTTP and rendering live in the embedding binary.

pub mod auth;
pub mod db_migration;
pub mod domains;
pub mod errors;
pub mod globals;
pub mod types;
pub mod validation;

pub use auth::{AuthContext, AuthService};
pub use errors::{DbError, DomainError, ServiceError, ValidationError};
pub use globals::{initialize, initialize_with, Collaborators};
pub use types::{PaginatedResult, PaginationParams, Permission, PermissionGroup, UserRole};
