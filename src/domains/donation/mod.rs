pub mod repository;
pub mod service;
pub mod types;

pub use repository::{AcceptanceRepository, SqliteAcceptanceRepository};
pub use service::DonationService;
pub use types::{
    Acceptance, AcceptanceResponse, AcceptanceStatus, DONATION_INTERVAL_DAYS,
};
