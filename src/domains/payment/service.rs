use crate::auth::AuthContext;
use crate::domains::payment::types::{
    GatewayOrder, MonetaryDonation, MonetaryDonationRow, PaymentDetails, PaymentGateway,
};
use crate::errors::{DbError, DomainError, ServiceError, ServiceResult};
use crate::types::{PaginatedResult, PaginationParams, Permission};
use crate::validation::Validate;
use chrono::Utc;
use hmac::{Hmac, Mac};
use sha2::Sha256;
use sqlx::{query_as, SqlitePool};
use std::sync::Arc;
use uuid::Uuid;

type HmacSha256 = Hmac<Sha256>;

/// Monetary donation handling: order creation through the gateway and
/// signature-verified confirmation.
pub struct PaymentService {
    pool: SqlitePool,
    gateway: Arc<dyn PaymentGateway>,
    secret: String,
}

impl PaymentService {
    pub fn new(pool: SqlitePool, gateway: Arc<dyn PaymentGateway>, secret: String) -> Self {
        Self {
            pool,
            gateway,
            secret,
        }
    }

    /// Create a gateway order for a monetary donation
    pub async fn create_order(&self, details: &PaymentDetails) -> ServiceResult<GatewayOrder> {
        details.validate()?;

        let order = self
            .gateway
            .create_order(details.amount_paise, &details.currency)
            .await?;

        log::info!(
            "Created payment order {} for {} paise",
            order.order_id,
            order.amount_paise
        );
        Ok(order)
    }

    /// Confirm a payment after the gateway callback.
    ///
    /// The signature is HMAC-SHA256 of `"{order_id}|{payment_id}"` under
    /// the shared secret, hex-encoded. A mismatch writes nothing.
    pub async fn confirm(
        &self,
        order_id: &str,
        payment_id: &str,
        signature: &str,
        details: &PaymentDetails,
    ) -> ServiceResult<MonetaryDonation> {
        details.validate()?;

        if !self.verify_signature(order_id, payment_id, signature) {
            log::warn!("Signature mismatch for payment order {}", order_id);
            return Err(ServiceError::Domain(DomainError::Validation(
                crate::errors::ValidationError::custom("Signature verification failed"),
            )));
        }

        let id = Uuid::new_v4();
        let now = Utc::now().to_rfc3339();

        sqlx::query(
            "INSERT INTO monetary_donations (id, user_id, order_id, payment_id, amount_paise, currency, donor_name, donor_email, created_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(id.to_string())
        .bind(details.user_id.map(|u| u.to_string()))
        .bind(order_id)
        .bind(payment_id)
        .bind(details.amount_paise)
        .bind(&details.currency)
        .bind(&details.donor_name)
        .bind(&details.donor_email)
        .bind(&now)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            let db_err = DbError::from(e);
            if db_err.is_unique_violation() {
                ServiceError::Domain(DomainError::Validation(
                    crate::errors::ValidationError::custom("Payment already recorded"),
                ))
            } else {
                ServiceError::Domain(DomainError::Database(db_err))
            }
        })?;

        let row = query_as::<_, MonetaryDonationRow>(
            "SELECT * FROM monetary_donations WHERE id = ?",
        )
        .bind(id.to_string())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| ServiceError::Domain(DomainError::Database(DbError::from(e))))?;

        let donation = row.into_entity()?;
        log::info!(
            "Recorded monetary donation {} ({} paise, order {})",
            donation.id,
            donation.amount_paise,
            order_id
        );
        Ok(donation)
    }

    /// Constant-time verification of the gateway signature
    pub fn verify_signature(&self, order_id: &str, payment_id: &str, signature: &str) -> bool {
        let payload = format!("{}|{}", order_id, payment_id);

        let mut mac = match HmacSha256::new_from_slice(self.secret.as_bytes()) {
            Ok(mac) => mac,
            Err(_) => return false,
        };
        mac.update(payload.as_bytes());

        let expected = match hex::decode(signature) {
            Ok(bytes) => bytes,
            Err(_) => return false,
        };

        mac.verify_slice(&expected).is_ok()
    }

    /// List recorded monetary donations. Requires payment visibility.
    pub async fn list_donations(
        &self,
        auth: &AuthContext,
        params: PaginationParams,
    ) -> ServiceResult<PaginatedResult<MonetaryDonation>> {
        auth.authorize(Permission::ViewPayments)?;

        let offset = (params.page.max(1) - 1) * params.per_page;

        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM monetary_donations")
            .fetch_one(&self.pool)
            .await
            .map_err(|e| ServiceError::Domain(DomainError::Database(DbError::from(e))))?;

        let rows = query_as::<_, MonetaryDonationRow>(
            "SELECT * FROM monetary_donations ORDER BY created_at DESC LIMIT ? OFFSET ?",
        )
        .bind(params.per_page as i64)
        .bind(offset as i64)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| ServiceError::Domain(DomainError::Database(DbError::from(e))))?;

        let mut items = Vec::with_capacity(rows.len());
        for row in rows {
            items.push(row.into_entity()?);
        }

        Ok(PaginatedResult::new(items, total as u64, params))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn service_with_secret(secret: &str) -> PaymentService {
        struct NoGateway;
        #[async_trait::async_trait]
        impl PaymentGateway for NoGateway {
            async fn create_order(
                &self,
                _amount_paise: i64,
                _currency: &str,
            ) -> ServiceResult<GatewayOrder> {
                unreachable!("not used in signature tests")
            }
        }

        // The pool is never touched by verify_signature
        let pool = sqlx::SqlitePool::connect_lazy("sqlite::memory:").unwrap();
        PaymentService::new(pool, Arc::new(NoGateway), secret.to_string())
    }

    fn sign(secret: &str, order_id: &str, payment_id: &str) -> String {
        let mut mac = HmacSha256::new_from_slice(secret.as_bytes()).unwrap();
        mac.update(format!("{}|{}", order_id, payment_id).as_bytes());
        hex::encode(mac.finalize().into_bytes())
    }

    #[tokio::test]
    async fn valid_signature_verifies() {
        let service = service_with_secret("shared-secret");
        let sig = sign("shared-secret", "order_1", "pay_1");
        assert!(service.verify_signature("order_1", "pay_1", &sig));
    }

    #[tokio::test]
    async fn tampered_payment_id_fails() {
        let service = service_with_secret("shared-secret");
        let sig = sign("shared-secret", "order_1", "pay_1");
        assert!(!service.verify_signature("order_1", "pay_2", &sig));
    }

    #[tokio::test]
    async fn wrong_secret_fails() {
        let service = service_with_secret("shared-secret");
        let sig = sign("other-secret", "order_1", "pay_1");
        assert!(!service.verify_signature("order_1", "pay_1", &sig));
    }

    #[tokio::test]
    async fn non_hex_signature_fails() {
        let service = service_with_secret("shared-secret");
        assert!(!service.verify_signature("order_1", "pay_1", "not-hex!"));
    }
}
