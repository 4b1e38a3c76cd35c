//! Account routes

use super::blocking;
use crate::error::ApiResult;
use crate::extract::{AuthUser, JsonBody};
use crate::state::AppState;
use axum::extract::State;
use axum::Json;
use clubhub_core::core_club::{LoginRequest, MyProfile, RegisterRequest, SessionToken};
use clubhub_core::core_store::UserProfile;
use std::sync::Arc;

/// POST /registerUser
pub async fn register(
    State(state): State<Arc<AppState>>,
    JsonBody(request): JsonBody<RegisterRequest>,
) -> ApiResult<Json<SessionToken>> {
    let users = state.users.clone();
    Ok(Json(blocking(move || users.register(&request)).await?))
}

/// POST /loginUser
pub async fn login(
    State(state): State<Arc<AppState>>,
    JsonBody(request): JsonBody<LoginRequest>,
) -> ApiResult<Json<SessionToken>> {
    let users = state.users.clone();
    Ok(Json(blocking(move || users.login(&request)).await?))
}

/// GET /allUsers
pub async fn all_users(
    State(state): State<Arc<AppState>>,
    AuthUser(user_id): AuthUser,
) -> ApiResult<Json<Vec<UserProfile>>> {
    let users = state.users.clone();
    Ok(Json(blocking(move || users.list_users(&user_id)).await?))
}

/// GET /myData
pub async fn my_data(
    State(state): State<Arc<AppState>>,
    AuthUser(user_id): AuthUser,
) -> ApiResult<Json<MyProfile>> {
    let users = state.users.clone();
    Ok(Json(blocking(move || users.my_profile(&user_id)).await?))
}
