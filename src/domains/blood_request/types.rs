use crate::errors::{DomainError, DomainResult};
use crate::validation::{Validate, ValidationBuilder};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Urgency of a blood request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Urgency {
    Normal,
    Urgent,
    Critical,
}

impl Urgency {
    pub fn as_str(&self) -> &'static str {
        match self {
            Urgency::Normal => "normal",
            Urgency::Urgent => "urgent",
            Urgency::Critical => "critical",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "normal" => Some(Urgency::Normal),
            "urgent" => Some(Urgency::Urgent),
            "critical" => Some(Urgency::Critical),
            _ => None,
        }
    }
}

/// Status of a blood request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RequestStatus {
    Open,
    Fulfilled,
    Closed,
}

impl RequestStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RequestStatus::Open => "open",
            RequestStatus::Fulfilled => "fulfilled",
            RequestStatus::Closed => "closed",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "open" => Some(RequestStatus::Open),
            "fulfilled" => Some(RequestStatus::Fulfilled),
            "closed" => Some(RequestStatus::Closed),
            _ => None,
        }
    }
}

/// Core BloodRequest entity
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BloodRequest {
    pub id: Uuid,
    pub requester_id: Uuid,
    pub patient_name: String,
    pub blood_group: String,
    pub units: i64,
    pub location: String,
    pub urgency: Urgency,
    pub status: RequestStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl BloodRequest {
    pub fn is_open(&self) -> bool {
        matches!(self.status, RequestStatus::Open)
    }
}

/// NewBloodRequest DTO
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewBloodRequest {
    pub patient_name: String,
    pub blood_group: String,
    pub units: i64,
    pub location: String,
    pub urgency: String,
}

impl Validate for NewBloodRequest {
    fn validate(&self) -> DomainResult<()> {
        ValidationBuilder::new("patient_name", Some(self.patient_name.clone()))
            .required()
            .min_length(2)
            .max_length(80)
            .validate()?;

        ValidationBuilder::new("blood_group", Some(self.blood_group.clone()))
            .required()
            .blood_group()
            .validate()?;

        ValidationBuilder::new("units", Some(self.units))
            .range(1, 20)
            .validate()?;

        ValidationBuilder::new("location", Some(self.location.clone()))
            .required()
            .max_length(120)
            .validate()?;

        ValidationBuilder::new("urgency", Some(self.urgency.clone()))
            .required()
            .one_of(&["normal", "urgent", "critical"], Some("Invalid urgency"))
            .validate()?;

        Ok(())
    }
}

/// BloodRequestRow - SQLite row representation
#[derive(Debug, Clone, FromRow)]
pub struct BloodRequestRow {
    pub id: String,
    pub requester_id: String,
    pub patient_name: String,
    pub blood_group: String,
    pub units: i64,
    pub location: String,
    pub urgency: String,
    pub status: String,
    pub created_at: String,
    pub updated_at: String,
}

impl BloodRequestRow {
    pub fn into_entity(self) -> DomainResult<BloodRequest> {
        let parse_datetime = |s: &str| -> DomainResult<DateTime<Utc>> {
            DateTime::parse_from_rfc3339(s)
                .map(|dt| dt.with_timezone(&Utc))
                .map_err(|_| DomainError::Internal(format!("Invalid date format: {}", s)))
        };

        Ok(BloodRequest {
            id: Uuid::parse_str(&self.id).map_err(|_| DomainError::InvalidUuid(self.id))?,
            requester_id: Uuid::parse_str(&self.requester_id)
                .map_err(|_| DomainError::InvalidUuid(self.requester_id))?,
            patient_name: self.patient_name,
            blood_group: self.blood_group,
            units: self.units,
            location: self.location,
            urgency: Urgency::from_str(&self.urgency)
                .ok_or_else(|| DomainError::Internal(format!("Invalid urgency: {}", self.urgency)))?,
            status: RequestStatus::from_str(&self.status)
                .ok_or_else(|| DomainError::Internal(format!("Invalid status: {}", self.status)))?,
            created_at: parse_datetime(&self.created_at)?,
            updated_at: parse_datetime(&self.updated_at)?,
        })
    }
}

/// BloodRequestResponse DTO
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BloodRequestResponse {
    pub id: Uuid,
    pub requester_id: Uuid,
    pub patient_name: String,
    pub blood_group: String,
    pub units: i64,
    pub location: String,
    pub urgency: String,
    pub status: String,
    pub created_at: String,
}

impl From<BloodRequest> for BloodRequestResponse {
    fn from(request: BloodRequest) -> Self {
        Self {
            id: request.id,
            requester_id: request.requester_id,
            patient_name: request.patient_name,
            blood_group: request.blood_group,
            units: request.units,
            location: request.location,
            urgency: request.urgency.as_str().to_string(),
            status: request.status.as_str().to_string(),
            created_at: request.created_at.to_rfc3339(),
        }
    }
}
