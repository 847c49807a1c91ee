#![allow(dead_code)]

use samarpan_core::auth::{jwt, AuthService};
use samarpan_core::db_migration;
use samarpan_core::domains::admin::{AdminService, NewAdmin};
use samarpan_core::domains::blood_request::{BloodRequestService, NewBloodRequest};
use samarpan_core::domains::donation::DonationService;
use samarpan_core::domains::maintenance::MaintenanceService;
use samarpan_core::domains::notification::{LoggingEmailSender, LoggingNotifier, NotificationService};
use samarpan_core::domains::payment::{LocalOrderGateway, PaymentService};
use samarpan_core::domains::user::{NewUser, UserService};
use samarpan_core::AuthContext;
use sqlx::sqlite::SqlitePoolOptions;
use sqlx::SqlitePool;
use std::sync::Arc;

pub const PASSWORD: &str = "Password1!";
pub const PAYMENT_SECRET: &str = "test-payment-secret";

/// Per-test service wiring on an isolated in-memory database
pub struct TestContext {
    pub pool: SqlitePool,
    pub auth: Arc<AuthService>,
    pub users: Arc<UserService>,
    pub admins: Arc<AdminService>,
    pub requests: Arc<BloodRequestService>,
    pub donations: Arc<DonationService>,
    pub notifications: Arc<NotificationService>,
    pub payments: Arc<PaymentService>,
    pub maintenance: Arc<MaintenanceService>,
}

impl TestContext {
    pub async fn new() -> Self {
        let _ = env_logger::builder().is_test(true).try_init();

        // One connection so every query sees the same in-memory database
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .expect("in-memory pool");

        db_migration::apply_migrations(&pool).await.expect("migrations");
        jwt::initialize("integration-test-secret");

        let auth = Arc::new(AuthService::new(pool.clone()));
        let notifications = Arc::new(NotificationService::new(
            pool.clone(),
            Arc::new(LoggingNotifier),
        ));
        let users = Arc::new(UserService::new(
            pool.clone(),
            auth.clone(),
            Arc::new(LoggingEmailSender),
        ));
        let admins = Arc::new(AdminService::new(pool.clone(), auth.clone()));
        let requests = Arc::new(BloodRequestService::new(pool.clone()));
        let donations = Arc::new(DonationService::new(
            pool.clone(),
            users.repository(),
            requests.repository(),
            notifications.clone(),
        ));
        let payments = Arc::new(PaymentService::new(
            pool.clone(),
            Arc::new(LocalOrderGateway),
            PAYMENT_SECRET.to_string(),
        ));
        let maintenance = Arc::new(MaintenanceService::new(pool.clone()));

        Self {
            pool,
            auth,
            users,
            admins,
            requests,
            donations,
            notifications,
            payments,
            maintenance,
        }
    }

    /// Register a donor and log them in
    pub async fn donor(&self, email: &str, blood_group: &str) -> (AuthContext, String) {
        self.users
            .register(NewUser {
                email: email.to_string(),
                password: PASSWORD.to_string(),
                name: "Test Donor".to_string(),
                blood_group: blood_group.to_string(),
                location: "Pune".to_string(),
                phone: None,
            })
            .await
            .expect("register donor");

        let login = self.auth.login(email, PASSWORD).await.expect("login donor");
        (login.auth_context, login.access_token)
    }

    /// Seed the bootstrap superadmin and log it in
    pub async fn superadmin(&self) -> (AuthContext, String) {
        self.admins
            .seed_superadmin("root@samarpan.org", "Root", PASSWORD)
            .await
            .expect("seed superadmin");

        let login = self
            .auth
            .login_admin("root@samarpan.org", PASSWORD)
            .await
            .expect("login superadmin");
        (login.auth_context, login.access_token)
    }

    /// Create an admin with the given permission names and log it in
    pub async fn admin_with(
        &self,
        super_ctx: &AuthContext,
        email: &str,
        permissions: &[&str],
    ) -> (AuthContext, String) {
        self.admins
            .create_admin(
                super_ctx,
                NewAdmin {
                    email: email.to_string(),
                    password: PASSWORD.to_string(),
                    name: "Test Admin".to_string(),
                    role: "admin".to_string(),
                    permissions: permissions.iter().map(|p| p.to_string()).collect(),
                },
            )
            .await
            .expect("create admin");

        let login = self.auth.login_admin(email, PASSWORD).await.expect("login admin");
        (login.auth_context, login.access_token)
    }

    /// Open a blood request on behalf of the given donor
    pub async fn open_request(&self, requester: &AuthContext, blood_group: &str) -> uuid::Uuid {
        self.requests
            .create_request(
                requester,
                NewBloodRequest {
                    patient_name: "Patient".to_string(),
                    blood_group: blood_group.to_string(),
                    units: 2,
                    location: "Pune".to_string(),
                    urgency: "urgent".to_string(),
                },
            )
            .await
            .expect("create request")
            .id
    }

    /// Backdate a donor's last donation by the given number of days
    pub async fn set_last_donation_days_ago(&self, user_id: uuid::Uuid, days: i64) {
        let when = (chrono::Utc::now() - chrono::Duration::days(days)).to_rfc3339();
        sqlx::query("UPDATE users SET last_donation_date = ? WHERE id = ?")
            .bind(when)
            .bind(user_id.to_string())
            .execute(&self.pool)
            .await
            .expect("backdate donation");
    }

    /// Notification titles stored for a user, oldest first
    pub async fn notification_titles(&self, user_id: uuid::Uuid) -> Vec<String> {
        sqlx::query_scalar(
            "SELECT title FROM notifications WHERE user_id = ? ORDER BY created_at ASC, rowid ASC",
        )
        .bind(user_id.to_string())
        .fetch_all(&self.pool)
        .await
        .expect("notification titles")
    }
}
