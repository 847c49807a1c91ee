use crate::errors::{DomainError, DomainResult};
use crate::types::UserRole;
use crate::validation::{Validate, ValidationBuilder};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Core User entity - a donor/requester account
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub password_hash: String,
    pub name: String,
    pub blood_group: String,
    pub location: String,
    pub phone: Option<String>,
    pub last_donation_date: Option<DateTime<Utc>>,
    pub donation_count: i64,
    pub role: UserRole,
    pub active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Days since the last recorded donation, if any.
    pub fn days_since_last_donation(&self, now: DateTime<Utc>) -> Option<i64> {
        self.last_donation_date
            .map(|last| (now - last).num_days())
    }
}

/// NewUser DTO - used at registration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewUser {
    pub email: String,
    pub password: String, // Plain text password (will be hashed)
    pub name: String,
    pub blood_group: String,
    pub location: String,
    pub phone: Option<String>,
}

impl Validate for NewUser {
    fn validate(&self) -> DomainResult<()> {
        ValidationBuilder::new("email", Some(self.email.clone()))
            .required()
            .email()
            .validate()?;

        ValidationBuilder::new("password", Some(self.password.clone()))
            .required()
            .min_length(8)
            .validate()?;

        ValidationBuilder::new("name", Some(self.name.clone()))
            .required()
            .min_length(2)
            .max_length(50)
            .validate()?;

        ValidationBuilder::new("blood_group", Some(self.blood_group.clone()))
            .required()
            .blood_group()
            .validate()?;

        ValidationBuilder::new("location", Some(self.location.clone()))
            .required()
            .max_length(120)
            .validate()?;

        if let Some(phone) = &self.phone {
            ValidationBuilder::new("phone", Some(phone.clone()))
                .phone()
                .validate()?;
        }

        Ok(())
    }
}

/// UpdateUser DTO - used when updating an existing profile
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct UpdateUser {
    pub name: Option<String>,
    pub blood_group: Option<String>,
    pub location: Option<String>,
    pub phone: Option<String>,
    pub active: Option<bool>,
}

impl Validate for UpdateUser {
    fn validate(&self) -> DomainResult<()> {
        if let Some(name) = &self.name {
            ValidationBuilder::new("name", Some(name.clone()))
                .min_length(2)
                .max_length(50)
                .validate()?;
        }

        if let Some(blood_group) = &self.blood_group {
            ValidationBuilder::new("blood_group", Some(blood_group.clone()))
                .blood_group()
                .validate()?;
        }

        if let Some(location) = &self.location {
            ValidationBuilder::new("location", Some(location.clone()))
                .max_length(120)
                .validate()?;
        }

        if let Some(phone) = &self.phone {
            ValidationBuilder::new("phone", Some(phone.clone()))
                .phone()
                .validate()?;
        }

        Ok(())
    }
}

impl UpdateUser {
    /// Check whether the update payload carries any field changes.
    pub fn is_empty_update(&self) -> bool {
        self.name.is_none()
            && self.blood_group.is_none()
            && self.location.is_none()
            && self.phone.is_none()
            && self.active.is_none()
    }
}

/// Credentials DTO - used for login
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

impl Validate for Credentials {
    fn validate(&self) -> DomainResult<()> {
        ValidationBuilder::new("email", Some(self.email.clone()))
            .required()
            .email()
            .validate()?;

        ValidationBuilder::new("password", Some(self.password.clone()))
            .required()
            .validate()?;

        Ok(())
    }
}

/// UserRow - SQLite row representation for mapping from database
#[derive(Debug, Clone, FromRow)]
pub struct UserRow {
    pub id: String,
    pub email: String,
    pub password_hash: String,
    pub name: String,
    pub blood_group: String,
    pub location: String,
    pub phone: Option<String>,
    pub last_donation_date: Option<String>,
    pub donation_count: i64,
    pub role: String,
    pub active: i64,
    pub created_at: String,
    pub updated_at: String,
}

impl UserRow {
    /// Convert database row to domain entity
    pub fn into_entity(self) -> DomainResult<User> {
        let parse_datetime = |s: &str| -> DomainResult<DateTime<Utc>> {
            DateTime::parse_from_rfc3339(s)
                .map(|dt| dt.with_timezone(&Utc))
                .map_err(|_| DomainError::Internal(format!("Invalid date format: {}", s)))
        };

        Ok(User {
            id: Uuid::parse_str(&self.id).map_err(|_| DomainError::InvalidUuid(self.id))?,
            email: self.email,
            password_hash: self.password_hash,
            name: self.name,
            blood_group: self.blood_group,
            location: self.location,
            phone: self.phone,
            last_donation_date: self
                .last_donation_date
                .as_deref()
                .map(parse_datetime)
                .transpose()?,
            donation_count: self.donation_count,
            role: UserRole::from_str(&self.role)
                .ok_or_else(|| DomainError::Internal(format!("Invalid role: {}", self.role)))?,
            active: self.active != 0,
            created_at: parse_datetime(&self.created_at)?,
            updated_at: parse_datetime(&self.updated_at)?,
        })
    }
}

/// UserResponse DTO - used for API responses (excludes sensitive fields)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserResponse {
    pub id: Uuid,
    pub email: String,
    pub name: String,
    pub blood_group: String,
    pub location: String,
    pub phone: Option<String>,
    pub last_donation_date: Option<String>,
    pub donation_count: i64,
    pub active: bool,
    pub created_at: String,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            email: user.email,
            name: user.name,
            blood_group: user.blood_group,
            location: user.location,
            phone: user.phone,
            last_donation_date: user.last_donation_date.map(|dt| dt.to_rfc3339()),
            donation_count: user.donation_count,
            active: user.active,
            created_at: user.created_at.to_rfc3339(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_new_user() -> NewUser {
        NewUser {
            email: "donor@samarpan.org".to_string(),
            password: "Donor123!".to_string(),
            name: "Asha Rao".to_string(),
            blood_group: "O+".to_string(),
            location: "Pune".to_string(),
            phone: Some("+919876543210".to_string()),
        }
    }

    #[test]
    fn new_user_validates() {
        assert!(valid_new_user().validate().is_ok());
    }

    #[test]
    fn new_user_rejects_bad_blood_group() {
        let mut user = valid_new_user();
        user.blood_group = "o+".to_string();
        assert!(user.validate().is_err());
    }

    #[test]
    fn new_user_rejects_short_password() {
        let mut user = valid_new_user();
        user.password = "short".to_string();
        assert!(user.validate().is_err());
    }

    #[test]
    fn days_since_last_donation() {
        let now = Utc::now();
        let mut user_row_entity = User {
            id: Uuid::new_v4(),
            email: "d@x.org".into(),
            password_hash: String::new(),
            name: "D".into(),
            blood_group: "A+".into(),
            location: "Pune".into(),
            phone: None,
            last_donation_date: Some(now - chrono::Duration::days(45)),
            donation_count: 1,
            role: UserRole::User,
            active: true,
            created_at: now,
            updated_at: now,
        };
        assert_eq!(user_row_entity.days_since_last_donation(now), Some(45));
        user_row_entity.last_donation_date = None;
        assert_eq!(user_row_entity.days_since_last_donation(now), None);
    }
}
