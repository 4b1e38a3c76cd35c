//! HTTP handlers, one module per resource

pub mod clubs;
pub mod events;
pub mod health;
pub mod users;

use crate::error::{ApiError, ApiResult};
use clubhub_core::core_club::ServiceResult;

/// Run a synchronous service call on the blocking pool
pub async fn blocking<T, F>(f: F) -> ApiResult<T>
where
    F: FnOnce() -> ServiceResult<T> + Send + 'static,
    T: Send + 'static,
{
    Ok(tokio::task::spawn_blocking(f).await??)
}

/// Fallback for unknown routes
pub async fn not_found() -> ApiError {
    ApiError::not_found("Route not found")
}
