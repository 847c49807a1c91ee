use crate::errors::{DomainError, DomainResult, ValidationError};
use crate::types::BLOOD_GROUPS;
use once_cell::sync::Lazy;
use regex::Regex;
use sqlx::{query_scalar, SqlitePool};

/// A trait that entities should implement for validation.
pub trait Validate {
    /// Validates the entity and returns an error if validation fails.
    fn validate(&self) -> DomainResult<()>;
}

// Common regex patterns
static EMAIL_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}$").unwrap());

static PHONE_REGEX: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\+?[0-9]{8,15}$").unwrap());

/// Struct for configuring validations in a fluent style
#[derive(Default)]
pub struct ValidationBuilder<T> {
    field_name: String,
    value: Option<T>,
    errors: Vec<ValidationError>,
}

/// Generic validation implementations
impl<T> ValidationBuilder<T> {
    pub fn new(field_name: &str, value: Option<T>) -> Self {
        Self {
            field_name: field_name.to_string(),
            value,
            errors: Vec::new(),
        }
    }

    pub fn required(mut self) -> Self
    where
        T: Default + PartialEq,
    {
        if self.value.is_none() || self.value == Some(T::default()) {
            self.errors.push(ValidationError::required(&self.field_name));
        }
        self
    }

    /// Complete validation and return result
    pub fn validate(self) -> DomainResult<()> {
        if self.errors.is_empty() {
            Ok(())
        } else {
            // Return the first error for simplicity
            Err(DomainError::Validation(self.errors[0].clone()))
        }
    }
}

/// String-specific validations
impl ValidationBuilder<String> {
    pub fn min_length(mut self, min: usize) -> Self {
        if let Some(value) = &self.value {
            if value.len() < min {
                self.errors
                    .push(ValidationError::min_length(&self.field_name, min));
            }
        }
        self
    }

    pub fn max_length(mut self, max: usize) -> Self {
        if let Some(value) = &self.value {
            if value.len() > max {
                self.errors
                    .push(ValidationError::max_length(&self.field_name, max));
            }
        }
        self
    }

    pub fn matches_pattern(mut self, pattern: &Regex, message: &str) -> Self {
        if let Some(value) = &self.value {
            if !pattern.is_match(value) {
                self.errors
                    .push(ValidationError::format(&self.field_name, message));
            }
        }
        self
    }

    pub fn email(self) -> Self {
        self.matches_pattern(&EMAIL_REGEX, "must be a valid email address")
    }

    pub fn phone(self) -> Self {
        self.matches_pattern(&PHONE_REGEX, "must be a valid phone number")
    }

    pub fn one_of(mut self, allowed_values: &[&str], message: Option<&str>) -> Self {
        if let Some(value) = &self.value {
            if !allowed_values.contains(&value.as_str()) {
                let reason = message.unwrap_or("must be one of the allowed values");
                self.errors
                    .push(ValidationError::invalid_value(&self.field_name, reason));
            }
        }
        self
    }

    /// Must be one of the eight recognized blood group strings, verbatim.
    pub fn blood_group(self) -> Self {
        self.one_of(&BLOOD_GROUPS, Some("must be a valid blood group"))
    }
}

/// Numeric validations
impl<T> ValidationBuilder<T>
where
    T: PartialOrd + Clone + std::fmt::Display,
{
    pub fn min(mut self, min: T) -> Self {
        if let Some(value) = &self.value {
            if value < &min {
                self.errors.push(ValidationError::range(
                    &self.field_name,
                    min.to_string(),
                    "maximum".to_string(),
                ));
            }
        }
        self
    }

    pub fn range(mut self, min: T, max: T) -> Self {
        if let Some(value) = &self.value {
            if value < &min || value > &max {
                self.errors.push(ValidationError::range(
                    &self.field_name,
                    min.to_string(),
                    max.to_string(),
                ));
            }
        }
        self
    }
}

/// Uniqueness validation helper (relies on database access)
pub async fn validate_unique(
    pool: &SqlitePool,
    table: &str,
    field: &str,
    value: &str,
    exclude_id: Option<&str>,
    field_name: &str,
) -> DomainResult<()> {
    let query = match exclude_id {
        Some(_) => format!("SELECT COUNT(*) FROM {} WHERE {} = ? AND id != ?", table, field),
        None => format!("SELECT COUNT(*) FROM {} WHERE {} = ?", table, field),
    };

    let count: i64 = match exclude_id {
        Some(id) => query_scalar(&query)
            .bind(value)
            .bind(id)
            .fetch_one(pool)
            .await
            .map_err(|e| DomainError::Database(e.into()))?,
        None => query_scalar(&query)
            .bind(value)
            .fetch_one(pool)
            .await
            .map_err(|e| DomainError::Database(e.into()))?,
    };

    if count > 0 {
        return Err(DomainError::Validation(ValidationError::unique(field_name)));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn email_validation() {
        assert!(ValidationBuilder::new("email", Some("donor@samarpan.org".to_string()))
            .email()
            .validate()
            .is_ok());
        assert!(ValidationBuilder::new("email", Some("not-an-email".to_string()))
            .email()
            .validate()
            .is_err());
    }

    #[test]
    fn blood_group_must_be_verbatim() {
        assert!(ValidationBuilder::new("blood_group", Some("O+".to_string()))
            .blood_group()
            .validate()
            .is_ok());
        // case matters
        assert!(ValidationBuilder::new("blood_group", Some("o+".to_string()))
            .blood_group()
            .validate()
            .is_err());
        assert!(ValidationBuilder::new("blood_group", Some("C+".to_string()))
            .blood_group()
            .validate()
            .is_err());
    }

    #[test]
    fn required_rejects_empty_string() {
        assert!(ValidationBuilder::new("name", Some(String::new()))
            .required()
            .validate()
            .is_err());
    }
}
