pub mod admin;
pub mod blood_request;
pub mod donation;
pub mod maintenance;
pub mod notification;
pub mod payment;
pub mod permission;
pub mod user;
