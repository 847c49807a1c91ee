use crate::auth::AuthContext;
use crate::domains::blood_request::repository::BloodRequestRepository;
use crate::domains::blood_request::types::{
    BloodRequestResponse, NewBloodRequest, RequestStatus,
};
use crate::errors::{DbError, DomainError, ServiceError, ServiceResult};
use crate::types::{PaginatedResult, PaginationParams, Permission};
use crate::validation::Validate;
use sqlx::SqlitePool;
use std::sync::Arc;
use uuid::Uuid;

/// Blood request management
pub struct BloodRequestService {
    repo: Arc<dyn BloodRequestRepository>,
}

impl BloodRequestService {
    pub fn new(pool: SqlitePool) -> Self {
        let repo = Arc::new(super::repository::SqliteBloodRequestRepository::new(pool));
        Self { repo }
    }

    /// The underlying repository, for services that share it
    pub fn repository(&self) -> Arc<dyn BloodRequestRepository> {
        self.repo.clone()
    }

    /// Create a new open request on behalf of the caller
    pub async fn create_request(
        &self,
        auth: &AuthContext,
        new_request: NewBloodRequest,
    ) -> ServiceResult<BloodRequestResponse> {
        new_request.validate()?;

        let request = self
            .repo
            .create(auth.user_id, &new_request)
            .await
            .map_err(DomainError::Database)?;

        log::info!(
            "User {} opened blood request {} ({} x{} at {})",
            auth.user_id,
            request.id,
            request.blood_group,
            request.units,
            request.location
        );
        Ok(BloodRequestResponse::from(request))
    }

    pub async fn get_request(&self, id: Uuid) -> ServiceResult<BloodRequestResponse> {
        let request = self
            .repo
            .find_by_id(id)
            .await
            .map_err(Self::map_not_found)?;
        Ok(BloodRequestResponse::from(request))
    }

    /// Open requests, most urgent first
    pub async fn list_open_requests(
        &self,
        params: PaginationParams,
    ) -> ServiceResult<PaginatedResult<BloodRequestResponse>> {
        let page = self
            .repo
            .find_open(params)
            .await
            .map_err(DomainError::Database)?;
        Ok(page.map(BloodRequestResponse::from))
    }

    /// Requests opened by the caller
    pub async fn list_my_requests(
        &self,
        auth: &AuthContext,
        params: PaginationParams,
    ) -> ServiceResult<PaginatedResult<BloodRequestResponse>> {
        let page = self
            .repo
            .find_by_requester(auth.user_id, params)
            .await
            .map_err(DomainError::Database)?;
        Ok(page.map(BloodRequestResponse::from))
    }

    /// Close a request. Allowed for its owner or request management.
    pub async fn close_request(&self, auth: &AuthContext, id: Uuid) -> ServiceResult<()> {
        let request = self
            .repo
            .find_by_id(id)
            .await
            .map_err(Self::map_not_found)?;

        if auth.user_id != request.requester_id {
            auth.authorize(Permission::ManageBloodRequests)?;
        }

        if !request.is_open() {
            return Err(ServiceError::Domain(DomainError::Validation(
                crate::errors::ValidationError::custom("Request is not open"),
            )));
        }

        self.repo
            .update_status(id, RequestStatus::Closed)
            .await
            .map_err(DomainError::Database)?;

        log::info!("Blood request {} closed by {}", id, auth.user_id);
        Ok(())
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
