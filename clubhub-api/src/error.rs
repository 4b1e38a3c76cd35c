//! Error-to-response mapping for the HTTP surface

use axum::extract::rejection::{JsonRejection, PathRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use clubhub_core::core_club::{FieldError, ServiceError};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Body of every failed request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Vec<FieldError>>,
}

#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Service(#[from] ServiceError),

    #[error("Invalid request body: {0}")]
    MalformedBody(String),

    #[error("Invalid path parameter: {0}")]
    MalformedPath(String),

    #[error("Method not allowed")]
    MethodNotAllowed,

    #[error("Missing or invalid auth token")]
    MissingToken,

    #[error("Worker task failed: {0}")]
    Worker(#[from] tokio::task::JoinError),
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::MalformedBody(rejection.body_text())
    }
}

impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        ApiError::MalformedPath(rejection.body_text())
    }
}

impl ApiError {
    pub fn not_found(message: &str) -> Self {
        ApiError::Service(ServiceError::not_found(message))
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error, details) = match self {
            ApiError::Service(ServiceError::Validation(fields)) => (
                StatusCode::BAD_REQUEST,
                "Validation failed".to_string(),
                Some(fields),
            ),
            ApiError::Service(ServiceError::Conflict(msg)) => (StatusCode::CONFLICT, msg, None),
            ApiError::Service(ServiceError::Authentication(msg)) => {
                (StatusCode::UNAUTHORIZED, msg, None)
            }
            ApiError::Service(ServiceError::Authorization(msg)) => {
                (StatusCode::FORBIDDEN, msg, None)
            }
            ApiError::Service(ServiceError::NotFound(msg)) => (StatusCode::NOT_FOUND, msg, None),
            ApiError::MalformedBody(msg) | ApiError::MalformedPath(msg) => {
                (StatusCode::BAD_REQUEST, msg, None)
            }
            ApiError::MethodNotAllowed => (
                StatusCode::METHOD_NOT_ALLOWED,
                "Method not allowed".to_string(),
                None,
            ),
            ApiError::MissingToken => (
                StatusCode::UNAUTHORIZED,
                "Please authenticate using a valid token".to_string(),
                None,
            ),
            err @ (ApiError::Service(ServiceError::Storage(_))
            | ApiError::Service(ServiceError::Internal(_))
            | ApiError::Worker(_)) => {
                tracing::error!(error = %err, "Request failed");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal Server Error".to_string(),
                    None,
                )
            }
        };

        (status, Json(ErrorResponse { error, details })).into_response()
    }
}

pub type ApiResult<T> = Result<T, ApiError>;
