mod common;

use common::{TestContext, PAYMENT_SECRET};
use hmac::{Hmac, Mac};
use samarpan_core::domains::payment::PaymentDetails;
use samarpan_core::{DomainError, ServiceError};
use sha2::Sha256;

fn sign(order_id: &str, payment_id: &str) -> String {
    let mut mac =
        Hmac::<Sha256>::new_from_slice(PAYMENT_SECRET.as_bytes()).expect("hmac key");
    mac.update(format!("{}|{}", order_id, payment_id).as_bytes());
    hex::encode(mac.finalize().into_bytes())
}

fn details() -> PaymentDetails {
    PaymentDetails {
        user_id: None,
        amount_paise: 50_000,
        currency: "INR".to_string(),
        donor_name: "Meera Shah".to_string(),
        donor_email: "meera@samarpan.org".to_string(),
    }
}

#[tokio::test]
async fn verified_payment_is_recorded() {
    let ctx = TestContext::new().await;

    let order = ctx.payments.create_order(&details()).await.expect("order");
    let signature = sign(&order.order_id, "pay_123");

    let donation = ctx
        .payments
        .confirm(&order.order_id, "pay_123", &signature, &details())
        .await
        .expect("confirm");
    assert_eq!(donation.order_id, order.order_id);
    assert_eq!(donation.amount_paise, 50_000);

    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM monetary_donations")
        .fetch_one(&ctx.pool)
        .await
        .unwrap();
    assert_eq!(count, 1);
}

#[tokio::test]
async fn bad_signature_writes_nothing() {
    let ctx = TestContext::new().await;

    let order = ctx.payments.create_order(&details()).await.expect("order");
    let signature = sign(&order.order_id, "pay_other");

    let err = ctx
        .payments
        .confirm(&order.order_id, "pay_123", &signature, &details())
        .await
        .expect_err("signature mismatch");
    assert!(matches!(
        err,
        ServiceError::Domain(DomainError::Validation(_))
    ));
    assert!(err.to_string().contains("Signature verification failed"));

    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM monetary_donations")
        .fetch_one(&ctx.pool)
        .await
        .unwrap();
    assert_eq!(count, 0);
}

#[tokio::test]
async fn replayed_confirmation_is_rejected() {
    let ctx = TestContext::new().await;

    let order = ctx.payments.create_order(&details()).await.expect("order");
    let signature = sign(&order.order_id, "pay_123");

    ctx.payments
        .confirm(&order.order_id, "pay_123", &signature, &details())
        .await
        .expect("first confirm");
    let err = ctx
        .payments
        .confirm(&order.order_id, "pay_123", &signature, &details())
        .await
        .expect_err("order_id is unique");
    assert_eq!(err.status_code(), 400);
}

#[tokio::test]
async fn listing_payments_requires_the_permission() {
    let ctx = TestContext::new().await;
    let (super_ctx, _) = ctx.superadmin().await;
    let (viewer, _) = ctx
        .admin_with(&super_ctx, "finance@samarpan.org", &["view_payments"])
        .await;
    let (other, _) = ctx
        .admin_with(&super_ctx, "blogs@samarpan.org", &["manage_blogs"])
        .await;

    ctx.payments
        .list_donations(&viewer, Default::default())
        .await
        .expect("permission held");
    let err = ctx
        .payments
        .list_donations(&other, Default::default())
        .await
        .expect_err("permission missing");
    assert!(matches!(err, ServiceError::PermissionDenied(_)));
}
