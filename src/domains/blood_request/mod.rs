pub mod repository;
pub mod service;
pub mod types;

pub use repository::{BloodRequestRepository, SqliteBloodRequestRepository};
pub use service::BloodRequestService;
pub use types::{
    BloodRequest, BloodRequestResponse, NewBloodRequest, RequestStatus, Urgency,
};
