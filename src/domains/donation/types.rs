use crate::errors::{DomainError, DomainResult};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Minimum gap between two blood donations by the same donor
pub const DONATION_INTERVAL_DAYS: i64 = 90;

/// Status of an acceptance record.
///
/// The forward states are not ordered: an acceptance may move between
/// any of them, including straight to `Fulfilled`. `Cancelled` is
/// terminal and the record is retained.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AcceptanceStatus {
    Accepted,
    TransportationNeeded,
    ImageUploaded,
    Fulfilled,
    Cancelled,
}

impl AcceptanceStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AcceptanceStatus::Accepted => "accepted",
            AcceptanceStatus::TransportationNeeded => "transportation_needed",
            AcceptanceStatus::ImageUploaded => "image_uploaded",
            AcceptanceStatus::Fulfilled => "fulfilled",
            AcceptanceStatus::Cancelled => "cancelled",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "accepted" => Some(AcceptanceStatus::Accepted),
            "transportation_needed" => Some(AcceptanceStatus::TransportationNeeded),
            "image_uploaded" => Some(AcceptanceStatus::ImageUploaded),
            "fulfilled" => Some(AcceptanceStatus::Fulfilled),
            "cancelled" => Some(AcceptanceStatus::Cancelled),
            _ => None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, AcceptanceStatus::Cancelled)
    }

    /// Notification copy stored for the donor when a transition lands
    /// on this status. `Accepted` and `Cancelled` stay silent.
    pub fn notification_copy(&self) -> Option<(&'static str, &'static str)> {
        match self {
            AcceptanceStatus::TransportationNeeded => Some((
                "Transportation Arranged",
                "A volunteer will contact you to arrange transportation for your donation.",
            )),
            AcceptanceStatus::ImageUploaded => Some((
                "Donation Image Received",
                "The donation image has been received and is being reviewed.",
            )),
            AcceptanceStatus::Fulfilled => Some((
                "Blood Donation Fulfilled ✓",
                "Thank you! Your blood donation has been confirmed. You have helped save a life.",
            )),
            AcceptanceStatus::Accepted | AcceptanceStatus::Cancelled => None,
        }
    }
}

/// A donor's commitment to a blood request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Acceptance {
    pub id: Uuid,
    pub request_id: Uuid,
    pub user_id: Uuid,
    pub blood_group: String,
    pub units: i64,
    pub status: AcceptanceStatus,
    pub needs_transportation: bool,
    pub accepted_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// AcceptanceRow - SQLite row representation
#[derive(Debug, Clone, FromRow)]
pub struct AcceptanceRow {
    pub id: String,
    pub request_id: String,
    pub user_id: String,
    pub blood_group: String,
    pub units: i64,
    pub status: String,
    pub needs_transportation: i64,
    pub accepted_at: String,
    pub updated_at: String,
}

impl AcceptanceRow {
    pub fn into_entity(self) -> DomainResult<Acceptance> {
        let parse_datetime = |s: &str| -> DomainResult<DateTime<Utc>> {
            DateTime::parse_from_rfc3339(s)
                .map(|dt| dt.with_timezone(&Utc))
                .map_err(|_| DomainError::Internal(format!("Invalid date format: {}", s)))
        };

        Ok(Acceptance {
            id: Uuid::parse_str(&self.id).map_err(|_| DomainError::InvalidUuid(self.id))?,
            request_id: Uuid::parse_str(&self.request_id)
                .map_err(|_| DomainError::InvalidUuid(self.request_id))?,
            user_id: Uuid::parse_str(&self.user_id)
                .map_err(|_| DomainError::InvalidUuid(self.user_id))?,
            blood_group: self.blood_group,
            units: self.units,
            status: AcceptanceStatus::from_str(&self.status)
                .ok_or_else(|| DomainError::Internal(format!("Invalid status: {}", self.status)))?,
            needs_transportation: self.needs_transportation != 0,
            accepted_at: parse_datetime(&self.accepted_at)?,
            updated_at: parse_datetime(&self.updated_at)?,
        })
    }
}

/// AcceptanceResponse DTO
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AcceptanceResponse {
    pub id: Uuid,
    pub request_id: Uuid,
    pub user_id: Uuid,
    pub blood_group: String,
    pub units: i64,
    pub status: String,
    pub needs_transportation: bool,
    pub accepted_at: String,
}

impl From<Acceptance> for AcceptanceResponse {
    fn from(acceptance: Acceptance) -> Self {
        Self {
            id: acceptance.id,
            request_id: acceptance.request_id,
            user_id: acceptance.user_id,
            blood_group: acceptance.blood_group,
            units: acceptance.units,
            status: acceptance.status.as_str().to_string(),
            needs_transportation: acceptance.needs_transportation,
            accepted_at: acceptance.accepted_at.to_rfc3339(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_round_trips() {
        for s in [
            "accepted",
            "transportation_needed",
            "image_uploaded",
            "fulfilled",
            "cancelled",
        ] {
            let status = AcceptanceStatus::from_str(s).unwrap();
            assert_eq!(status.as_str(), s);
        }
        assert!(AcceptanceStatus::from_str("shipped").is_none());
    }

    #[test]
    fn only_cancelled_is_terminal() {
        assert!(AcceptanceStatus::Cancelled.is_terminal());
        assert!(!AcceptanceStatus::Fulfilled.is_terminal());
        assert!(!AcceptanceStatus::Accepted.is_terminal());
    }

    #[test]
    fn notification_copy_per_status() {
        assert_eq!(
            AcceptanceStatus::TransportationNeeded
                .notification_copy()
                .map(|(t, _)| t),
            Some("Transportation Arranged")
        );
        assert_eq!(
            AcceptanceStatus::ImageUploaded
                .notification_copy()
                .map(|(t, _)| t),
            Some("Donation Image Received")
        );
        assert_eq!(
            AcceptanceStatus::Fulfilled.notification_copy().map(|(t, _)| t),
            Some("Blood Donation Fulfilled ✓")
        );
        assert!(AcceptanceStatus::Accepted.notification_copy().is_none());
        assert!(AcceptanceStatus::Cancelled.notification_copy().is_none());
    }
}
