//! Field validation for inbound requests

use super::error::{FieldError, ServiceError, ServiceResult};
use crate::core_store::types::{self, Timestamp};
use chrono::{DateTime, Utc};

/// A request body that can check its own fields
pub trait Validate {
    /// Every rule the value breaks; empty when valid
    fn field_errors(&self) -> Vec<FieldError>;

    fn validate(&self) -> ServiceResult<()> {
        let errors = self.field_errors();
        if errors.is_empty() {
            Ok(())
        } else {
            Err(ServiceError::Validation(errors))
        }
    }
}

/// Record an error unless `value`, trimmed, has at least `min` characters
pub fn min_chars(errors: &mut Vec<FieldError>, field: &str, value: &str, min: usize, message: &str) {
    if value.trim().chars().count() < min {
        errors.push(FieldError::new(field, message));
    }
}

/// Trim and lower-case an email address
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Structural email check: `local@domain.tld`, no whitespace
pub fn is_valid_email(email: &str) -> bool {
    let email = email.trim();
    if email.len() > 254 || email.chars().any(char::is_whitespace) {
        return false;
    }
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    if local.is_empty() || domain.contains('@') {
        return false;
    }
    let labels: Vec<&str> = domain.split('.').collect();
    labels.len() >= 2
        && labels.iter().all(|l| {
            !l.is_empty() && !l.starts_with('-') && !l.ends_with('-')
                && l.chars().all(|c| c.is_alphanumeric() || c == '-')
        })
        && labels.last().is_some_and(|tld| tld.chars().count() >= 2)
}

pub fn check_email(errors: &mut Vec<FieldError>, field: &str, email: &str) {
    if !is_valid_email(email) {
        errors.push(FieldError::new(field, "Enter a valid email"));
    }
}

/// Parse an RFC 3339 timestamp at storage (millisecond) precision
pub fn parse_timestamp(value: &str) -> Option<Timestamp> {
    let parsed = DateTime::parse_from_rfc3339(value.trim()).ok()?;
    types::from_millis(parsed.with_timezone(&Utc).timestamp_millis())
}
