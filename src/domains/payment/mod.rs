pub mod service;
pub mod types;

pub use service::PaymentService;
pub use types::{
    GatewayOrder, LocalOrderGateway, MonetaryDonation, PaymentDetails, PaymentGateway,
};
