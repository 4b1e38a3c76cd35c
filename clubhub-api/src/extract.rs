//! Request extractors: authenticated caller, JSON bodies and path ids

use crate::error::{ApiError, ApiResult};
use crate::handlers::blocking;
use crate::state::AppState;
use axum::extract::{FromRequest, FromRequestParts};
use axum::http::request::Parts;
use axum::http::{header, HeaderMap};
use axum::async_trait;
use clubhub_core::core_store::UserId;
use std::str::FromStr;
use std::sync::Arc;

/// Legacy header carrying the raw session token
pub const AUTH_TOKEN_HEADER: &str = "auth-token";

/// The user a request is authenticated as
#[derive(Debug, Clone, Copy)]
pub struct AuthUser(pub UserId);

/// Session token from `Authorization: Bearer <token>`, else from `auth-token`
pub fn session_token(headers: &HeaderMap) -> Option<String> {
    let bearer = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| {
            let (scheme, token) = v.trim_start().split_once(' ')?;
            scheme.eq_ignore_ascii_case("bearer").then_some(token)
        });

    bearer
        .or_else(|| headers.get(AUTH_TOKEN_HEADER).and_then(|v| v.to_str().ok()))
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_string)
}

#[async_trait]
impl FromRequestParts<Arc<AppState>> for AuthUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let token = session_token(&parts.headers).ok_or(ApiError::MissingToken)?;
        let users = state.users.clone();
        let user_id = blocking(move || users.authenticate(&token)).await?;
        Ok(AuthUser(user_id))
    }
}

/// JSON body whose parse failures surface as 400 with the error envelope
#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(ApiError))]
pub struct JsonBody<T>(pub T);

/// Path parameters whose extraction failures surface as 400 with the error envelope
#[derive(Debug, FromRequestParts)]
#[from_request(via(axum::extract::Path), rejection(ApiError))]
pub struct PathParam<T>(pub T);

/// Parse a path id; anything unparsable is reported as not found
pub fn parse_id<T: FromStr>(raw: &str, not_found: &str) -> ApiResult<T> {
    raw.parse().map_err(|_| ApiError::not_found(not_found))
}
