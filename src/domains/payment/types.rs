use crate::errors::{DomainError, DomainResult, ServiceResult};
use crate::validation::{Validate, ValidationBuilder};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// A recorded monetary donation. Written only after the gateway
/// signature has been verified.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonetaryDonation {
    pub id: Uuid,
    pub user_id: Option<Uuid>,
    pub order_id: String,
    pub payment_id: String,
    pub amount_paise: i64,
    pub currency: String,
    pub donor_name: String,
    pub donor_email: String,
    pub created_at: DateTime<Utc>,
}

/// Details supplied when creating an order and confirming a payment
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentDetails {
    pub user_id: Option<Uuid>,
    pub amount_paise: i64,
    pub currency: String,
    pub donor_name: String,
    pub donor_email: String,
}

impl Validate for PaymentDetails {
    fn validate(&self) -> DomainResult<()> {
        ValidationBuilder::new("amount_paise", Some(self.amount_paise))
            .range(100, 10_000_000_00)
            .validate()?;

        ValidationBuilder::new("currency", Some(self.currency.clone()))
            .required()
            .one_of(&["INR"], Some("Only INR is supported"))
            .validate()?;

        ValidationBuilder::new("donor_name", Some(self.donor_name.clone()))
            .required()
            .max_length(80)
            .validate()?;

        ValidationBuilder::new("donor_email", Some(self.donor_email.clone()))
            .required()
            .email()
            .validate()?;

        Ok(())
    }
}

/// An order created with the payment gateway
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayOrder {
    pub order_id: String,
    pub amount_paise: i64,
    pub currency: String,
}

/// The external payment gateway. Only order creation crosses the wire;
/// signature verification happens locally against the shared secret.
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    async fn create_order(&self, amount_paise: i64, currency: &str) -> ServiceResult<GatewayOrder>;
}

/// Default gateway that mints order ids locally. Used in development
/// and tests where no real provider is configured.
pub struct LocalOrderGateway;

#[async_trait]
impl PaymentGateway for LocalOrderGateway {
    async fn create_order(&self, amount_paise: i64, currency: &str) -> ServiceResult<GatewayOrder> {
        Ok(GatewayOrder {
            order_id: format!("order_{}", Uuid::new_v4().simple()),
            amount_paise,
            currency: currency.to_string(),
        })
    }
}

/// MonetaryDonationRow - SQLite row representation
#[derive(Debug, Clone, FromRow)]
pub struct MonetaryDonationRow {
    pub id: String,
    pub user_id: Option<String>,
    pub order_id: String,
    pub payment_id: String,
    pub amount_paise: i64,
    pub currency: String,
    pub donor_name: String,
    pub donor_email: String,
    pub created_at: String,
}

impl MonetaryDonationRow {
    pub fn into_entity(self) -> DomainResult<MonetaryDonation> {
        Ok(MonetaryDonation {
            id: Uuid::parse_str(&self.id).map_err(|_| DomainError::InvalidUuid(self.id))?,
            user_id: self
                .user_id
                .as_deref()
                .map(|id| Uuid::parse_str(id).map_err(|_| DomainError::InvalidUuid(id.to_string())))
                .transpose()?,
            order_id: self.order_id,
            payment_id: self.payment_id,
            amount_paise: self.amount_paise,
            currency: self.currency,
            donor_name: self.donor_name,
            donor_email: self.donor_email,
            created_at: DateTime::parse_from_rfc3339(&self.created_at)
                .map(|dt| dt.with_timezone(&Utc))
                .map_err(|_| {
                    DomainError::Internal(format!("Invalid date format: {}", self.created_at))
                })?,
        })
    }
}
