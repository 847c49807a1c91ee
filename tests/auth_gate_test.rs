mod common;

use common::{TestContext, PASSWORD};
use samarpan_core::domains::admin::UpdateAdmin;
use samarpan_core::{Permission, ServiceError};

#[tokio::test]
async fn resolve_builds_context_from_storage() {
    let ctx = TestContext::new().await;
    let (super_ctx, _) = ctx.superadmin().await;
    let (_, token) = ctx
        .admin_with(&super_ctx, "blogs@samarpan.org", &["manage_blogs"])
        .await;

    let resolved = ctx
        .auth
        .resolve(&token, Some(Permission::ManageBlogs))
        .await
        .expect("permission held");
    assert!(resolved.has_permission(Permission::ManageBlogs));
    assert!(!resolved.has_permission(Permission::ManageAdmins));
}

#[tokio::test]
async fn permission_revocation_applies_on_next_resolve() {
    let ctx = TestContext::new().await;
    let (super_ctx, _) = ctx.superadmin().await;
    let (admin_ctx, token) = ctx
        .admin_with(&super_ctx, "blogs@samarpan.org", &["manage_blogs"])
        .await;

    // Works while the permission is in storage
    ctx.auth
        .resolve(&token, Some(Permission::ManageBlogs))
        .await
        .expect("permission held");

    // Strip the permission; the token itself is untouched and unexpired
    ctx.admins
        .update_admin(
            &super_ctx,
            admin_ctx.user_id,
            UpdateAdmin {
                permissions: Some(vec![]),
                ..Default::default()
            },
        )
        .await
        .expect("revoke permission");

    let err = ctx
        .auth
        .resolve(&token, Some(Permission::ManageBlogs))
        .await
        .expect_err("revocation must bite immediately");
    assert!(matches!(err, ServiceError::PermissionDenied(_)));
}

#[tokio::test]
async fn suspended_admin_token_fails_resolution() {
    let ctx = TestContext::new().await;
    let (super_ctx, _) = ctx.superadmin().await;
    let (admin_ctx, token) = ctx
        .admin_with(&super_ctx, "ops@samarpan.org", &["manage_users"])
        .await;

    ctx.admins
        .set_active(&super_ctx, admin_ctx.user_id, false)
        .await
        .expect("suspend admin");

    let err = ctx.auth.resolve(&token, None).await.expect_err("suspended");
    assert!(matches!(err, ServiceError::Authentication(_)));
}

#[tokio::test]
async fn plain_user_is_denied_admin_permissions() {
    let ctx = TestContext::new().await;
    let (_, token) = ctx.donor("donor@samarpan.org", "O+").await;

    let err = ctx
        .auth
        .resolve(&token, Some(Permission::ViewDashboard))
        .await
        .expect_err("user holds no admin permission");
    assert!(matches!(err, ServiceError::PermissionDenied(_)));

    // Without a required permission the identity still resolves
    let resolved = ctx.auth.resolve(&token, None).await.expect("plain identity");
    assert_eq!(resolved.email, "donor@samarpan.org");
}

#[tokio::test]
async fn refresh_token_is_not_an_access_credential() {
    let ctx = TestContext::new().await;
    ctx.donor("donor@samarpan.org", "O+").await;

    let login = ctx.auth.login("donor@samarpan.org", PASSWORD).await.unwrap();
    let err = ctx
        .auth
        .resolve(&login.refresh_token, None)
        .await
        .expect_err("refresh token rejected at the gate");
    assert!(matches!(err, ServiceError::Authentication(_)));

    // But it does mint a fresh access token
    let (new_access, _) = ctx.auth.refresh_session(&login.refresh_token).await.unwrap();
    ctx.auth.resolve(&new_access, None).await.expect("new access token");
}

#[tokio::test]
async fn logout_revokes_the_token() {
    let ctx = TestContext::new().await;
    let (donor_ctx, token) = ctx.donor("donor@samarpan.org", "A-").await;

    ctx.auth.resolve(&token, None).await.expect("valid before logout");
    ctx.auth.logout(&donor_ctx, &token, None).await.expect("logout");

    let err = ctx.auth.resolve(&token, None).await.expect_err("revoked jti");
    assert!(matches!(err, ServiceError::Authentication(_)));
}

#[tokio::test]
async fn deleted_identity_fails_resolution() {
    let ctx = TestContext::new().await;
    let (donor_ctx, token) = ctx.donor("gone@samarpan.org", "B+").await;

    sqlx::query("DELETE FROM users WHERE id = ?")
        .bind(donor_ctx.user_id.to_string())
        .execute(&ctx.pool)
        .await
        .unwrap();

    let err = ctx.auth.resolve(&token, None).await.expect_err("identity gone");
    assert!(matches!(err, ServiceError::Authentication(_)));
}

#[tokio::test]
async fn wrong_password_and_inactive_account_fail_login() {
    let ctx = TestContext::new().await;
    let (donor_ctx, _) = ctx.donor("donor@samarpan.org", "AB+").await;

    let err = ctx
        .auth
        .login("donor@samarpan.org", "wrong-password")
        .await
        .expect_err("bad password");
    assert!(matches!(err, ServiceError::Authentication(_)));

    sqlx::query("UPDATE users SET active = 0 WHERE id = ?")
        .bind(donor_ctx.user_id.to_string())
        .execute(&ctx.pool)
        .await
        .unwrap();

    let err = ctx
        .auth
        .login("donor@samarpan.org", PASSWORD)
        .await
        .expect_err("inactive account");
    assert!(matches!(err, ServiceError::Authentication(_)));
}

#[tokio::test]
async fn superadmin_passes_every_permission_check() {
    let ctx = TestContext::new().await;
    let (_, token) = ctx.superadmin().await;

    for permission in Permission::all() {
        ctx.auth
            .resolve(&token, Some(permission))
            .await
            .expect("superadmin holds everything");
    }
}
