//! Club routes

use super::blocking;
use crate::error::ApiResult;
use crate::extract::{parse_id, AuthUser, JsonBody, PathParam};
use crate::state::AppState;
use axum::extract::State;
use axum::Json;
use clubhub_core::core_club::CreateClubRequest;
use clubhub_core::core_store::{Club, ClubId, UserProfile};
use std::sync::Arc;

const NO_CLUB: &str = "No club found";

/// GET /allClubs
pub async fn all_clubs(State(state): State<Arc<AppState>>) -> ApiResult<Json<Vec<Club>>> {
    let clubs = state.clubs.clone();
    Ok(Json(blocking(move || clubs.list_clubs()).await?))
}

/// PUT /addClub
pub async fn add_club(
    State(state): State<Arc<AppState>>,
    AuthUser(user_id): AuthUser,
    JsonBody(request): JsonBody<CreateClubRequest>,
) -> ApiResult<Json<Club>> {
    let clubs = state.clubs.clone();
    Ok(Json(blocking(move || clubs.create_club(&user_id, &request)).await?))
}

/// DELETE /deleteClub/:id
pub async fn delete_club(
    State(state): State<Arc<AppState>>,
    AuthUser(user_id): AuthUser,
    PathParam(raw_id): PathParam<String>,
) -> ApiResult<Json<String>> {
    let club_id: ClubId = parse_id(&raw_id, NO_CLUB)?;
    let clubs = state.clubs.clone();
    blocking(move || clubs.delete_club(&user_id, &club_id)).await?;
    Ok(Json(format!("removed club id: {}", club_id)))
}

/// GET /clubData/:id
pub async fn club_data(
    State(state): State<Arc<AppState>>,
    AuthUser(_): AuthUser,
    PathParam(raw_id): PathParam<String>,
) -> ApiResult<Json<Club>> {
    let club_id: ClubId = parse_id(&raw_id, NO_CLUB)?;
    let clubs = state.clubs.clone();
    Ok(Json(blocking(move || clubs.get_club(&club_id)).await?))
}

/// PUT /follow/:Clubid
pub async fn follow(
    State(state): State<Arc<AppState>>,
    AuthUser(user_id): AuthUser,
    PathParam(raw_id): PathParam<String>,
) -> ApiResult<Json<UserProfile>> {
    let club_id: ClubId = parse_id(&raw_id, NO_CLUB)?;
    let clubs = state.clubs.clone();
    Ok(Json(blocking(move || clubs.follow_club(&user_id, &club_id)).await?))
}

/// PUT /unfollow/:Clubid
pub async fn unfollow(
    State(state): State<Arc<AppState>>,
    AuthUser(user_id): AuthUser,
    PathParam(raw_id): PathParam<String>,
) -> ApiResult<Json<UserProfile>> {
    let club_id: ClubId = parse_id(&raw_id, NO_CLUB)?;
    let clubs = state.clubs.clone();
    Ok(Json(blocking(move || clubs.unfollow_club(&user_id, &club_id)).await?))
}
