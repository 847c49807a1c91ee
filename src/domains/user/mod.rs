pub mod repository;
pub mod service;
pub mod types;

pub use repository::{SqliteUserRepository, UserRepository};
pub use service::UserService;
pub use types::{Credentials, NewUser, UpdateUser, User, UserResponse};
