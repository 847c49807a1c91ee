use crate::auth::{jwt, AuthService};
use crate::db_migration;
use crate::domains::admin::AdminService;
use crate::domains::blood_request::BloodRequestService;
use crate::domains::donation::DonationService;
use crate::domains::maintenance::MaintenanceService;
use crate::domains::notification::{
    EmailSender, LoggingEmailSender, LoggingNotifier, NotificationService, Notifier,
};
use crate::domains::payment::{LocalOrderGateway, PaymentGateway, PaymentService};
use crate::domains::user::UserService;
use crate::errors::{DomainError, ServiceError, ServiceResult};
use lazy_static::lazy_static;
use sqlx::sqlite::SqlitePoolOptions;
use sqlx::SqlitePool;
use std::sync::{Arc, Mutex};

/// External collaborators the core delegates to. Defaults log and
/// succeed, which is what development and tests want.
pub struct Collaborators {
    pub notifier: Arc<dyn Notifier>,
    pub email_sender: Arc<dyn EmailSender>,
    pub payment_gateway: Arc<dyn PaymentGateway>,
}

impl Default for Collaborators {
    fn default() -> Self {
        Self {
            notifier: Arc::new(LoggingNotifier),
            email_sender: Arc::new(LoggingEmailSender),
            payment_gateway: Arc::new(LocalOrderGateway),
        }
    }
}

lazy_static! {
    static ref DB_POOL: Mutex<Option<SqlitePool>> = Mutex::new(None);
    static ref AUTH_SERVICE: Mutex<Option<Arc<AuthService>>> = Mutex::new(None);
    static ref USER_SERVICE: Mutex<Option<Arc<UserService>>> = Mutex::new(None);
    static ref ADMIN_SERVICE: Mutex<Option<Arc<AdminService>>> = Mutex::new(None);
    static ref BLOOD_REQUEST_SERVICE: Mutex<Option<Arc<BloodRequestService>>> = Mutex::new(None);
    static ref DONATION_SERVICE: Mutex<Option<Arc<DonationService>>> = Mutex::new(None);
    static ref NOTIFICATION_SERVICE: Mutex<Option<Arc<NotificationService>>> = Mutex::new(None);
    static ref PAYMENT_SERVICE: Mutex<Option<Arc<PaymentService>>> = Mutex::new(None);
    static ref MAINTENANCE_SERVICE: Mutex<Option<Arc<MaintenanceService>>> = Mutex::new(None);
}

/// Initialize the core with default collaborators
pub async fn initialize(
    db_url: &str,
    jwt_secret: &str,
    payment_secret: &str,
) -> ServiceResult<()> {
    initialize_with(db_url, jwt_secret, payment_secret, Collaborators::default()).await
}

/// Initialize the core: connect the pool, apply migrations, and wire
/// the service registry.
pub async fn initialize_with(
    db_url: &str,
    jwt_secret: &str,
    payment_secret: &str,
    collaborators: Collaborators,
) -> ServiceResult<()> {
    // Pick up a local .env in development; ignored when absent
    dotenv::dotenv().ok();

    let pool = SqlitePoolOptions::new()
        .max_connections(5)
        .connect(db_url)
        .await
        .map_err(|e| {
            ServiceError::Configuration(format!("Failed to connect to database: {}", e))
        })?;

    db_migration::apply_migrations(&pool)
        .await
        .map_err(|e| ServiceError::Domain(DomainError::Database(e)))?;

    jwt::initialize(jwt_secret);

    wire_services(pool, payment_secret, collaborators);

    log::info!("samarpan_core initialized");
    Ok(())
}

/// Wire the registry onto an existing pool. Migrations must already be
/// applied; used by the integration tests.
pub fn wire_services(pool: SqlitePool, payment_secret: &str, collaborators: Collaborators) {
    let auth = Arc::new(AuthService::new(pool.clone()));
    let notifications = Arc::new(NotificationService::new(
        pool.clone(),
        collaborators.notifier,
    ));
    let users = Arc::new(UserService::new(
        pool.clone(),
        auth.clone(),
        collaborators.email_sender,
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
        collaborators.payment_gateway,
        payment_secret.to_string(),
    ));
    let maintenance = Arc::new(MaintenanceService::new(pool.clone()));

    set(&DB_POOL, pool);
    set(&AUTH_SERVICE, auth);
    set(&USER_SERVICE, users);
    set(&ADMIN_SERVICE, admins);
    set(&BLOOD_REQUEST_SERVICE, requests);
    set(&DONATION_SERVICE, donations);
    set(&NOTIFICATION_SERVICE, notifications);
    set(&PAYMENT_SERVICE, payments);
    set(&MAINTENANCE_SERVICE, maintenance);
}

fn set<T>(slot: &Mutex<Option<T>>, value: T) {
    let mut guard = match slot.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    };
    *guard = Some(value);
}

fn get<T: Clone>(slot: &Mutex<Option<T>>, name: &str) -> ServiceResult<T> {
    let guard = match slot.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    };
    guard
        .clone()
        .ok_or_else(|| ServiceError::Configuration(format!("{} not initialized", name)))
}

pub fn get_db_pool() -> ServiceResult<SqlitePool> {
    get(&DB_POOL, "Database pool")
}

pub fn get_auth_service() -> ServiceResult<Arc<AuthService>> {
    get(&AUTH_SERVICE, "Auth service")
}

pub fn get_user_service() -> ServiceResult<Arc<UserService>> {
    get(&USER_SERVICE, "User service")
}

pub fn get_admin_service() -> ServiceResult<Arc<AdminService>> {
    get(&ADMIN_SERVICE, "Admin service")
}

pub fn get_blood_request_service() -> ServiceResult<Arc<BloodRequestService>> {
    get(&BLOOD_REQUEST_SERVICE, "Blood request service")
}

pub fn get_donation_service() -> ServiceResult<Arc<DonationService>> {
    get(&DONATION_SERVICE, "Donation service")
}

pub fn get_notification_service() -> ServiceResult<Arc<NotificationService>> {
    get(&NOTIFICATION_SERVICE, "Notification service")
}

pub fn get_payment_service() -> ServiceResult<Arc<PaymentService>> {
    get(&PAYMENT_SERVICE, "Payment service")
}

pub fn get_maintenance_service() -> ServiceResult<Arc<MaintenanceService>> {
    get(&MAINTENANCE_SERVICE, "Maintenance service")
}
