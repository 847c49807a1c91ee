use crate::auth::AuthContext;
use crate::domains::blood_request::repository::BloodRequestRepository;
use crate::domains::donation::repository::AcceptanceRepository;
use crate::domains::donation::types::{
    AcceptanceResponse, AcceptanceStatus, DONATION_INTERVAL_DAYS,
};
use crate::domains::notification::NotificationService;
use crate::domains::user::repository::UserRepository;
use crate::errors::{DbError, DomainError, ServiceError, ServiceResult};
use crate::types::{PaginatedResult, PaginationParams, Permission};
use chrono::Utc;
use sqlx::SqlitePool;
use std::sync::Arc;
use uuid::Uuid;

/// The donation lifecycle.
///
/// An acceptance is a donor's commitment to an open blood request. It
/// starts in `accepted` and is moved by coordinators through the
/// forward states in any order; `fulfilled` additionally stamps the
/// donor's donation history. `cancelled` is terminal and keeps the
/// record for audit.
pub struct DonationService {
    repo: Arc<dyn AcceptanceRepository>,
    user_repo: Arc<dyn UserRepository>,
    request_repo: Arc<dyn BloodRequestRepository>,
    notifications: Arc<NotificationService>,
}

impl DonationService {
    pub fn new(
        pool: SqlitePool,
        user_repo: Arc<dyn UserRepository>,
        request_repo: Arc<dyn BloodRequestRepository>,
        notifications: Arc<NotificationService>,
    ) -> Self {
        let repo = Arc::new(super::repository::SqliteAcceptanceRepository::new(pool));
        Self {
            repo,
            user_repo,
            request_repo,
            notifications,
        }
    }

    /// Accept an open blood request as the calling donor.
    ///
    /// Preconditions, in order: the request exists and is open, the
    /// donor's blood group matches the request's byte-for-byte, and at
    /// least 90 days have passed since the donor's last donation. The
    /// partial unique index turns a concurrent double-accept into
    /// `DuplicateAcceptance` instead of a second row.
    pub async fn accept(&self, auth: &AuthContext, request_id: Uuid) -> ServiceResult<AcceptanceResponse> {
        let request = self
            .request_repo
            .find_by_id(request_id)
            .await
            .map_err(Self::map_not_found)?;

        if !request.is_open() {
            return Err(ServiceError::Domain(DomainError::Validation(
                crate::errors::ValidationError::custom("Request is not open"),
            )));
        }

        let user = self
            .user_repo
            .find_by_id(auth.user_id)
            .await
            .map_err(Self::map_not_found)?;

        if user.blood_group != request.blood_group {
            return Err(ServiceError::BloodGroupMismatch {
                user_group: user.blood_group,
                requested_group: request.blood_group,
            });
        }

        if let Some(elapsed) = user.days_since_last_donation(Utc::now()) {
            if elapsed < DONATION_INTERVAL_DAYS {
                return Err(ServiceError::DonationIntervalViolation {
                    remaining_days: DONATION_INTERVAL_DAYS - elapsed,
                });
            }
        }

        let acceptance = self
            .repo
            .insert(request_id, auth.user_id, &user.blood_group, request.units)
            .await
            .map_err(|e| match e {
                DbError::Conflict(_) => ServiceError::DuplicateAcceptance,
                other => ServiceError::Domain(DomainError::Database(other)),
            })?;

        log::info!(
            "User {} accepted blood request {} (acceptance {})",
            auth.user_id,
            request_id,
            acceptance.id
        );
        Ok(AcceptanceResponse::from(acceptance))
    }

    /// Move an acceptance to a new status. Coordinator operation.
    ///
    /// No ordering is enforced between the forward states; moving
    /// straight from `accepted` to `fulfilled` is legal. Cancellation
    /// goes through `cancel`, not here.
    pub async fn transition(
        &self,
        auth: &AuthContext,
        acceptance_id: Uuid,
        new_status: &str,
        needs_transportation: Option<bool>,
    ) -> ServiceResult<AcceptanceResponse> {
        auth.authorize(Permission::ManageDonations)?;

        let status = AcceptanceStatus::from_str(new_status).ok_or_else(|| {
            ServiceError::Domain(DomainError::Validation(
                crate::errors::ValidationError::invalid_value(
                    "status",
                    &format!("unrecognized status: {}", new_status),
                ),
            ))
        })?;

        if status.is_terminal() {
            return Err(ServiceError::Domain(DomainError::Validation(
                crate::errors::ValidationError::invalid_value(
                    "status",
                    "cancellation is a donor operation",
                ),
            )));
        }

        let acceptance = self
            .repo
            .find_by_id(acceptance_id)
            .await
            .map_err(Self::map_not_found)?;

        if acceptance.status.is_terminal() {
            return Err(ServiceError::Domain(DomainError::Validation(
                crate::errors::ValidationError::custom("Acceptance has been cancelled"),
            )));
        }

        let updated = self
            .repo
            .update_status(acceptance_id, status, needs_transportation)
            .await
            .map_err(Self::map_not_found)?;

        // Exactly one stored notification per transition; external
        // delivery inside is best-effort.
        if let Some((title, body)) = status.notification_copy() {
            if let Err(e) = self.notifications.notify(updated.user_id, title, body).await {
                log::warn!(
                    "Failed to store transition notification for acceptance {}: {}",
                    acceptance_id,
                    e
                );
            }
        }

        // Stamp the donor only on the first arrival in `fulfilled`; a
        // re-sent fulfilled transition must not count the same physical
        // donation twice.
        if status == AcceptanceStatus::Fulfilled && acceptance.status != AcceptanceStatus::Fulfilled
        {
            self.user_repo
                .record_donation(updated.user_id, Utc::now())
                .await
                .map_err(DomainError::Database)?;
            log::info!(
                "Donation fulfilled: acceptance {} by user {}",
                acceptance_id,
                updated.user_id
            );
        }

        Ok(AcceptanceResponse::from(updated))
    }

    /// Cancel the caller's active acceptance for a request.
    ///
    /// The record moves to terminal `cancelled` and is retained; the
    /// partial unique index ignores it, so the donor may accept the
    /// same request again later.
    pub async fn cancel(&self, auth: &AuthContext, request_id: Uuid) -> ServiceResult<()> {
        let acceptance = self
            .repo
            .find_active(auth.user_id, request_id)
            .await
            .map_err(Self::map_not_found)?;

        self.repo
            .update_status(acceptance.id, AcceptanceStatus::Cancelled, None)
            .await
            .map_err(Self::map_not_found)?;

        log::info!(
            "User {} cancelled acceptance {} for request {}",
            auth.user_id,
            acceptance.id,
            request_id
        );
        Ok(())
    }

    /// All acceptances for a request. Coordinator view.
    pub async fn list_for_request(
        &self,
        auth: &AuthContext,
        request_id: Uuid,
    ) -> ServiceResult<Vec<AcceptanceResponse>> {
        auth.authorize(Permission::ManageDonations)?;

        let items = self
            .repo
            .find_by_request(request_id)
            .await
            .map_err(DomainError::Database)?;
        Ok(items.into_iter().map(AcceptanceResponse::from).collect())
    }

    /// The caller's own donation history, newest first
    pub async fn list_my_donations(
        &self,
        auth: &AuthContext,
        params: PaginationParams,
    ) -> ServiceResult<PaginatedResult<AcceptanceResponse>> {
        let page = self
            .repo
            .find_by_user(auth.user_id, params)
            .await
            .map_err(DomainError::Database)?;
        Ok(page.map(AcceptanceResponse::from))
    }

    fn map_not_found(err: DbError) -> ServiceError {
        match err {
            DbError::NotFound(entity, key) => match Uuid::parse_str(&key) {
                Ok(id) => ServiceError::Domain(DomainError::EntityNotFound(entity, id)),
                Err(_) => ServiceError::Domain(DomainError::Internal(format!(
                    "{} not found: {}",
                    entity, key
                ))),
            },
            other => ServiceError::Domain(DomainError::Database(other)),
        }
    }
}
