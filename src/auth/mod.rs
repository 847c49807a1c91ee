pub mod context;
pub mod jwt;
mod repository;
pub mod service;

// Re-export public items
pub use context::AuthContext;
pub use service::{AuthService, LoginResult};

// Export internal items for use within auth module
pub(crate) use repository::AuthRepository;
