mod common;

use common::TestContext;
use samarpan_core::ServiceError;

#[tokio::test]
async fn maintenance_defaults_to_off() {
    let ctx = TestContext::new().await;
    let status = ctx.maintenance.status().await.expect("status");
    assert!(!status.enabled);
    assert!(status.message.is_none());
}

#[tokio::test]
async fn toggle_requires_the_permission_and_writes_through() {
    let ctx = TestContext::new().await;
    let (super_ctx, _) = ctx.superadmin().await;
    let (ops, _) = ctx
        .admin_with(&super_ctx, "ops@samarpan.org", &["toggle_maintenance"])
        .await;
    let (blogs, _) = ctx
        .admin_with(&super_ctx, "blogs@samarpan.org", &["manage_blogs"])
        .await;

    let err = ctx
        .maintenance
        .set(&blogs, true, None)
        .await
        .expect_err("permission missing");
    assert!(matches!(err, ServiceError::PermissionDenied(_)));

    let status = ctx
        .maintenance
        .set(&ops, true, Some("Back soon".to_string()))
        .await
        .expect("toggle on");
    assert!(status.enabled);

    // The write-through refresh makes the change visible immediately
    let status = ctx.maintenance.status().await.expect("status");
    assert!(status.enabled);
    assert_eq!(status.message.as_deref(), Some("Back soon"));

    // And it is persisted, not just cached
    let stored: i64 =
        sqlx::query_scalar("SELECT maintenance_mode FROM app_settings WHERE id = 1")
            .fetch_one(&ctx.pool)
            .await
            .unwrap();
    assert_eq!(stored, 1);
}

#[tokio::test]
async fn cache_serves_stale_reads_within_the_ttl() {
    let ctx = TestContext::new().await;

    // Prime the cache with maintenance off
    assert!(!ctx.maintenance.status().await.unwrap().enabled);

    // Flip the row underneath the cache
    sqlx::query("UPDATE app_settings SET maintenance_mode = 1 WHERE id = 1")
        .execute(&ctx.pool)
        .await
        .unwrap();

    // Within the TTL the cached value is still served
    assert!(!ctx.maintenance.status().await.unwrap().enabled);

    // A fresh service (empty cache) sees the stored value, which is
    // what any reader past the TTL would see
    let fresh = samarpan_core::domains::maintenance::MaintenanceService::new(ctx.pool.clone());
    assert!(fresh.status().await.unwrap().enabled);
}
