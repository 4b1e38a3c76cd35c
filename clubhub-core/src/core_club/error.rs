//! Domain error taxonomy shared by the club, event and user services

use crate::core_auth::{PasswordError, TokenError};
use crate::core_store::StoreError;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// One rejected request field
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

impl FieldError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

#[derive(Error, Debug)]
pub enum ServiceError {
    #[error("Validation failed")]
    Validation(Vec<FieldError>),

    #[error("{0}")]
    Conflict(String),

    #[error("{0}")]
    Authentication(String),

    #[error("{0}")]
    Authorization(String),

    #[error("{0}")]
    NotFound(String),

    #[error("Storage error: {0}")]
    Storage(StoreError),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<StoreError> for ServiceError {
    fn from(err: StoreError) -> Self {
        match err {
            // unique keys are club names and emails; both surface as conflicts
            StoreError::UniqueViolation(detail) => {
                tracing::debug!(%detail, "Unique constraint rejected write");
                ServiceError::Conflict("Resource already exists".to_string())
            }
            other => ServiceError::Storage(other),
        }
    }
}

impl From<PasswordError> for ServiceError {
    fn from(err: PasswordError) -> Self {
        ServiceError::Internal(err.to_string())
    }
}

impl From<TokenError> for ServiceError {
    fn from(err: TokenError) -> Self {
        match err {
            TokenError::Encoding(message) => ServiceError::Internal(message),
            TokenError::Expired => ServiceError::Authentication("Session expired".to_string()),
            TokenError::Malformed | TokenError::BadSignature => {
                ServiceError::Authentication("Invalid session token".to_string())
            }
        }
    }
}

impl ServiceError {
    pub fn not_found(what: impl Into<String>) -> Self {
        ServiceError::NotFound(what.into())
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        ServiceError::Authorization(message.into())
    }

    /// A single-field validation failure
    pub fn invalid(field: &str, message: &str) -> Self {
        ServiceError::Validation(vec![FieldError::new(field, message)])
    }
}

pub type ServiceResult<T> = Result<T, ServiceError>;
