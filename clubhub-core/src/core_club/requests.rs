//! Request bodies accepted by the services

use super::error::{FieldError, ServiceError, ServiceResult};
use super::validation::{check_email, min_chars, parse_timestamp, Validate};
use crate::core_store::types::Timestamp;
use serde::Deserialize;
use std::fmt;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CreateClubRequest {
    pub club_name: String,
    pub description: String,
}

impl Validate for CreateClubRequest {
    fn field_errors(&self) -> Vec<FieldError> {
        let mut errors = Vec::new();
        min_chars(&mut errors, "clubName", &self.club_name, 2, "Club name must be at least 2 characters");
        min_chars(&mut errors, "description", &self.description, 5, "Description must be at least 5 characters");
        errors
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CreateEventRequest {
    pub title: String,
    pub description: String,
    pub venue: String,
    /// RFC 3339
    pub start_time: String,
    /// RFC 3339
    pub end_time: String,
}

impl CreateEventRequest {
    /// Parsed `(start, end)`, rejecting unparsable or inverted ranges
    pub fn schedule(&self) -> ServiceResult<(Timestamp, Timestamp)> {
        let mut errors = Vec::new();
        let schedule = self.check_schedule(&mut errors);
        match schedule {
            Some(range) if errors.is_empty() => Ok(range),
            _ => Err(ServiceError::Validation(errors)),
        }
    }

    fn check_schedule(&self, errors: &mut Vec<FieldError>) -> Option<(Timestamp, Timestamp)> {
        let start = parse_timestamp(&self.start_time);
        let end = parse_timestamp(&self.end_time);
        if start.is_none() {
            errors.push(FieldError::new("startTime", "Start time must be an RFC 3339 timestamp"));
        }
        if end.is_none() {
            errors.push(FieldError::new("endTime", "End time must be an RFC 3339 timestamp"));
        }
        let (start, end) = (start?, end?);
        if start >= end {
            errors.push(FieldError::new("endTime", "End time must be after start time"));
            return None;
        }
        Some((start, end))
    }
}

impl Validate for CreateEventRequest {
    fn field_errors(&self) -> Vec<FieldError> {
        let mut errors = Vec::new();
        min_chars(&mut errors, "title", &self.title, 2, "Title must be at least 2 characters");
        min_chars(&mut errors, "description", &self.description, 5, "Description must be at least 5 characters");
        min_chars(&mut errors, "venue", &self.venue, 5, "Venue must be at least 5 characters");
        self.check_schedule(&mut errors);
        errors
    }
}

#[derive(Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RegisterRequest {
    pub email: String,
    pub name: String,
    pub password: String,
    #[serde(alias = "institute_id")]
    pub institute_id: String,
}

impl fmt::Debug for RegisterRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RegisterRequest")
            .field("email", &self.email)
            .field("name", &self.name)
            .field("password", &"<redacted>")
            .field("institute_id", &self.institute_id)
            .finish()
    }
}

impl Validate for RegisterRequest {
    fn field_errors(&self) -> Vec<FieldError> {
        let mut errors = Vec::new();
        check_email(&mut errors, "email", &self.email);
        min_chars(&mut errors, "name", &self.name, 3, "Name must be at least 3 characters");
        if self.password.chars().count() < 6 {
            errors.push(FieldError::new("password", "Password must be at least 6 characters"));
        }
        min_chars(&mut errors, "instituteId", &self.institute_id, 3, "Institute id must be at least 3 characters");
        errors
    }
}

#[derive(Clone, Default, Deserialize)]
#[serde(default)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

impl fmt::Debug for LoginRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoginRequest")
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .finish()
    }
}

impl Validate for LoginRequest {
    fn field_errors(&self) -> Vec<FieldError> {
        let mut errors = Vec::new();
        check_email(&mut errors, "email", &self.email);
        if self.password.is_empty() {
            errors.push(FieldError::new("password", "Password must not be empty"));
        }
        errors
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct OrganiserRequest {
    pub email: String,
}

impl Validate for OrganiserRequest {
    fn field_errors(&self) -> Vec<FieldError> {
        let mut errors = Vec::new();
        check_email(&mut errors, "email", &self.email);
        errors
    }
}
