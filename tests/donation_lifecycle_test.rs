mod common;

use common::TestContext;
use samarpan_core::domains::donation::AcceptanceStatus;
use samarpan_core::{DomainError, ServiceError};

#[tokio::test]
async fn accept_creates_acceptance_in_accepted_state() {
    let ctx = TestContext::new().await;
    let (requester, _) = ctx.donor("requester@samarpan.org", "O+").await;
    let (donor, _) = ctx.donor("donor@samarpan.org", "O+").await;
    let request_id = ctx.open_request(&requester, "O+").await;

    let acceptance = ctx.donations.accept(&donor, request_id).await.expect("accept");
    assert_eq!(acceptance.status, "accepted");
    assert_eq!(acceptance.request_id, request_id);
    assert_eq!(acceptance.user_id, donor.user_id);

    // Accepting alone stores no notification
    assert!(ctx.notification_titles(donor.user_id).await.is_empty());
}

#[tokio::test]
async fn blood_group_must_match_byte_for_byte() {
    let ctx = TestContext::new().await;
    let (requester, _) = ctx.donor("requester@samarpan.org", "O+").await;
    let (donor, _) = ctx.donor("donor@samarpan.org", "O-").await;
    let request_id = ctx.open_request(&requester, "O+").await;

    let err = ctx
        .donations
        .accept(&donor, request_id)
        .await
        .expect_err("O- must not match O+");
    match err {
        ServiceError::BloodGroupMismatch {
            user_group,
            requested_group,
        } => {
            assert_eq!(user_group, "O-");
            assert_eq!(requested_group, "O+");
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn donation_interval_is_enforced_with_remaining_days() {
    let ctx = TestContext::new().await;
    let (requester, _) = ctx.donor("requester@samarpan.org", "B+").await;
    let (donor, _) = ctx.donor("donor@samarpan.org", "B+").await;
    let request_id = ctx.open_request(&requester, "B+").await;

    ctx.set_last_donation_days_ago(donor.user_id, 45).await;

    let err = ctx
        .donations
        .accept(&donor, request_id)
        .await
        .expect_err("only 45 days elapsed");
    match err {
        ServiceError::DonationIntervalViolation { remaining_days } => {
            assert_eq!(remaining_days, 45);
        }
        other => panic!("unexpected error: {other}"),
    }

    // At 90 days the donor is eligible again
    ctx.set_last_donation_days_ago(donor.user_id, 90).await;
    ctx.donations.accept(&donor, request_id).await.expect("eligible at 90 days");
}

#[tokio::test]
async fn double_accept_is_a_duplicate() {
    let ctx = TestContext::new().await;
    let (requester, _) = ctx.donor("requester@samarpan.org", "A+").await;
    let (donor, _) = ctx.donor("donor@samarpan.org", "A+").await;
    let request_id = ctx.open_request(&requester, "A+").await;

    ctx.donations.accept(&donor, request_id).await.expect("first accept");
    let err = ctx
        .donations
        .accept(&donor, request_id)
        .await
        .expect_err("second accept");
    assert!(matches!(err, ServiceError::DuplicateAcceptance));
}

#[tokio::test]
async fn transitions_store_one_notification_each() {
    let ctx = TestContext::new().await;
    let (super_ctx, _) = ctx.superadmin().await;
    let (coordinator, _) = ctx
        .admin_with(&super_ctx, "coord@samarpan.org", &["manage_donations"])
        .await;
    let (requester, _) = ctx.donor("requester@samarpan.org", "AB-").await;
    let (donor, _) = ctx.donor("donor@samarpan.org", "AB-").await;
    let request_id = ctx.open_request(&requester, "AB-").await;

    let acceptance = ctx.donations.accept(&donor, request_id).await.unwrap();

    ctx.donations
        .transition(&coordinator, acceptance.id, "transportation_needed", Some(true))
        .await
        .expect("transportation");
    ctx.donations
        .transition(&coordinator, acceptance.id, "image_uploaded", None)
        .await
        .expect("image");
    ctx.donations
        .transition(&coordinator, acceptance.id, "fulfilled", None)
        .await
        .expect("fulfilled");

    let titles = ctx.notification_titles(donor.user_id).await;
    assert_eq!(
        titles,
        vec![
            "Transportation Arranged".to_string(),
            "Donation Image Received".to_string(),
            "Blood Donation Fulfilled ✓".to_string(),
        ]
    );
}

#[tokio::test]
async fn direct_transition_to_fulfilled_is_legal_and_stamps_the_donor() {
    let ctx = TestContext::new().await;
    let (super_ctx, _) = ctx.superadmin().await;
    let (coordinator, _) = ctx
        .admin_with(&super_ctx, "coord@samarpan.org", &["manage_donations"])
        .await;
    let (requester, _) = ctx.donor("requester@samarpan.org", "O-").await;
    let (donor, _) = ctx.donor("donor@samarpan.org", "O-").await;
    let request_id = ctx.open_request(&requester, "O-").await;

    let acceptance = ctx.donations.accept(&donor, request_id).await.unwrap();

    // No intermediate states required
    let updated = ctx
        .donations
        .transition(&coordinator, acceptance.id, "fulfilled", None)
        .await
        .expect("accepted -> fulfilled directly");
    assert_eq!(updated.status, "fulfilled");

    let (count, last): (i64, Option<String>) = sqlx::query_as(
        "SELECT donation_count, last_donation_date FROM users WHERE id = ?",
    )
    .bind(donor.user_id.to_string())
    .fetch_one(&ctx.pool)
    .await
    .unwrap();
    assert_eq!(count, 1);
    assert!(last.is_some());
}

#[tokio::test]
async fn refulfilled_acceptance_counts_one_donation() {
    let ctx = TestContext::new().await;
    let (super_ctx, _) = ctx.superadmin().await;
    let (coordinator, _) = ctx
        .admin_with(&super_ctx, "coord@samarpan.org", &["manage_donations"])
        .await;
    let (requester, _) = ctx.donor("requester@samarpan.org", "B+").await;
    let (donor, _) = ctx.donor("donor@samarpan.org", "B+").await;
    let request_id = ctx.open_request(&requester, "B+").await;
    let acceptance = ctx.donations.accept(&donor, request_id).await.unwrap();

    ctx.donations
        .transition(&coordinator, acceptance.id, "fulfilled", None)
        .await
        .expect("first fulfilled");
    let (count, first_stamp): (i64, Option<String>) = sqlx::query_as(
        "SELECT donation_count, last_donation_date FROM users WHERE id = ?",
    )
    .bind(donor.user_id.to_string())
    .fetch_one(&ctx.pool)
    .await
    .unwrap();
    assert_eq!(count, 1);

    // A coordinator re-sending the same transition must not stamp the
    // donor a second time
    ctx.donations
        .transition(&coordinator, acceptance.id, "fulfilled", None)
        .await
        .expect("re-sent fulfilled");
    let (count, second_stamp): (i64, Option<String>) = sqlx::query_as(
        "SELECT donation_count, last_donation_date FROM users WHERE id = ?",
    )
    .bind(donor.user_id.to_string())
    .fetch_one(&ctx.pool)
    .await
    .unwrap();
    assert_eq!(count, 1, "one physical donation must count once");
    assert_eq!(second_stamp, first_stamp);
}

#[tokio::test]
async fn transport_flag_survives_later_transitions() {
    let ctx = TestContext::new().await;
    let (super_ctx, _) = ctx.superadmin().await;
    let (coordinator, _) = ctx
        .admin_with(&super_ctx, "coord@samarpan.org", &["manage_donations"])
        .await;
    let (requester, _) = ctx.donor("requester@samarpan.org", "A+").await;
    let (donor, _) = ctx.donor("donor@samarpan.org", "A+").await;
    let request_id = ctx.open_request(&requester, "A+").await;
    let acceptance = ctx.donations.accept(&donor, request_id).await.unwrap();

    ctx.donations
        .transition(&coordinator, acceptance.id, "transportation_needed", Some(true))
        .await
        .expect("transportation");

    // Transitions that carry no flag leave the stored one alone
    ctx.donations
        .transition(&coordinator, acceptance.id, "image_uploaded", None)
        .await
        .expect("image");
    ctx.donations
        .transition(&coordinator, acceptance.id, "fulfilled", None)
        .await
        .expect("fulfilled");

    let flag: i64 = sqlx::query_scalar("SELECT needs_transportation FROM acceptances WHERE id = ?")
        .bind(acceptance.id.to_string())
        .fetch_one(&ctx.pool)
        .await
        .unwrap();
    assert_eq!(flag, 1);
}

#[tokio::test]
async fn unrecognized_status_is_a_validation_error() {
    let ctx = TestContext::new().await;
    let (super_ctx, _) = ctx.superadmin().await;
    let (coordinator, _) = ctx
        .admin_with(&super_ctx, "coord@samarpan.org", &["manage_donations"])
        .await;
    let (requester, _) = ctx.donor("requester@samarpan.org", "A-").await;
    let (donor, _) = ctx.donor("donor@samarpan.org", "A-").await;
    let request_id = ctx.open_request(&requester, "A-").await;
    let acceptance = ctx.donations.accept(&donor, request_id).await.unwrap();

    let err = ctx
        .donations
        .transition(&coordinator, acceptance.id, "shipped", None)
        .await
        .expect_err("unknown status");
    assert!(matches!(
        err,
        ServiceError::Domain(DomainError::Validation(_))
    ));
    assert_eq!(err.status_code(), 400);
}

#[tokio::test]
async fn transition_of_missing_acceptance_is_not_found() {
    let ctx = TestContext::new().await;
    let (super_ctx, _) = ctx.superadmin().await;
    let (coordinator, _) = ctx
        .admin_with(&super_ctx, "coord@samarpan.org", &["manage_donations"])
        .await;

    let err = ctx
        .donations
        .transition(&coordinator, uuid::Uuid::new_v4(), "fulfilled", None)
        .await
        .expect_err("no such acceptance");
    assert_eq!(err.status_code(), 404);
}

#[tokio::test]
async fn transition_requires_donation_management() {
    let ctx = TestContext::new().await;
    let (requester, _) = ctx.donor("requester@samarpan.org", "B-").await;
    let (donor, _) = ctx.donor("donor@samarpan.org", "B-").await;
    let request_id = ctx.open_request(&requester, "B-").await;
    let acceptance = ctx.donations.accept(&donor, request_id).await.unwrap();

    let err = ctx
        .donations
        .transition(&donor, acceptance.id, "fulfilled", None)
        .await
        .expect_err("donors cannot drive transitions");
    assert!(matches!(err, ServiceError::PermissionDenied(_)));
}

#[tokio::test]
async fn cancel_is_terminal_but_allows_re_accept() {
    let ctx = TestContext::new().await;
    let (super_ctx, _) = ctx.superadmin().await;
    let (coordinator, _) = ctx
        .admin_with(&super_ctx, "coord@samarpan.org", &["manage_donations"])
        .await;
    let (requester, _) = ctx.donor("requester@samarpan.org", "AB+").await;
    let (donor, _) = ctx.donor("donor@samarpan.org", "AB+").await;
    let request_id = ctx.open_request(&requester, "AB+").await;

    let first = ctx.donations.accept(&donor, request_id).await.unwrap();
    ctx.donations.cancel(&donor, request_id).await.expect("cancel");

    // The record is retained in the terminal state
    let status: String = sqlx::query_scalar("SELECT status FROM acceptances WHERE id = ?")
        .bind(first.id.to_string())
        .fetch_one(&ctx.pool)
        .await
        .unwrap();
    assert_eq!(status, AcceptanceStatus::Cancelled.as_str());

    // A cancelled acceptance cannot be moved forward
    let err = ctx
        .donations
        .transition(&coordinator, first.id, "fulfilled", None)
        .await
        .expect_err("cancelled is terminal");
    assert_eq!(err.status_code(), 400);

    // But the donor may accept the same request again
    let second = ctx.donations.accept(&donor, request_id).await.expect("re-accept");
    assert_ne!(second.id, first.id);
}

#[tokio::test]
async fn cancel_without_active_acceptance_is_not_found() {
    let ctx = TestContext::new().await;
    let (requester, _) = ctx.donor("requester@samarpan.org", "O+").await;
    let (donor, _) = ctx.donor("donor@samarpan.org", "O+").await;
    let request_id = ctx.open_request(&requester, "O+").await;

    let err = ctx
        .donations
        .cancel(&donor, request_id)
        .await
        .expect_err("nothing to cancel");
    assert_eq!(err.status_code(), 404);
}

#[tokio::test]
async fn closed_request_cannot_be_accepted() {
    let ctx = TestContext::new().await;
    let (requester, _) = ctx.donor("requester@samarpan.org", "A+").await;
    let (donor, _) = ctx.donor("donor@samarpan.org", "A+").await;
    let request_id = ctx.open_request(&requester, "A+").await;

    ctx.requests.close_request(&requester, request_id).await.expect("close");

    let err = ctx
        .donations
        .accept(&donor, request_id)
        .await
        .expect_err("request closed");
    assert_eq!(err.status_code(), 400);
}
