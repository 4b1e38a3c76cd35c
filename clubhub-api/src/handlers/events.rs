//! Event and organiser routes

use super::blocking;
use crate::error::ApiResult;
use crate::extract::{parse_id, AuthUser, JsonBody, PathParam};
use crate::state::AppState;
use axum::extract::State;
use axum::Json;
use clubhub_core::core_club::{CreateEventRequest, OrganiserRequest};
use clubhub_core::core_store::{ClubId, Event, EventId, EventListing, OrganiserInfo};
use std::sync::Arc;

const NO_EVENT: &str = "No event found";

/// GET /allEvents
pub async fn all_events(State(state): State<Arc<AppState>>) -> ApiResult<Json<Vec<EventListing>>> {
    let events = state.events.clone();
    Ok(Json(blocking(move || events.list_events()).await?))
}

/// GET /eventData/:eventid
pub async fn event_data(
    State(state): State<Arc<AppState>>,
    PathParam(raw_id): PathParam<String>,
) -> ApiResult<Json<Event>> {
    let event_id: EventId = parse_id(&raw_id, NO_EVENT)?;
    let events = state.events.clone();
    Ok(Json(blocking(move || events.get_event(&event_id)).await?))
}

/// PUT /addEvent/:clubId
pub async fn add_event(
    State(state): State<Arc<AppState>>,
    AuthUser(user_id): AuthUser,
    PathParam(raw_club_id): PathParam<String>,
    JsonBody(request): JsonBody<CreateEventRequest>,
) -> ApiResult<Json<Event>> {
    let club_id: ClubId = parse_id(&raw_club_id, "Club not found")?;
    let events = state.events.clone();
    Ok(Json(
        blocking(move || events.create_event(&user_id, &club_id, &request)).await?,
    ))
}

/// DELETE /deleteEvent/:id
pub async fn delete_event(
    State(state): State<Arc<AppState>>,
    AuthUser(user_id): AuthUser,
    PathParam(raw_id): PathParam<String>,
) -> ApiResult<Json<String>> {
    let event_id: EventId = parse_id(&raw_id, NO_EVENT)?;
    let events = state.events.clone();
    blocking(move || events.delete_event(&user_id, &event_id)).await?;
    Ok(Json(format!("removed event {}", event_id)))
}

/// POST /addOrganiser/:id
pub async fn add_organiser(
    State(state): State<Arc<AppState>>,
    AuthUser(user_id): AuthUser,
    PathParam(raw_id): PathParam<String>,
    JsonBody(request): JsonBody<OrganiserRequest>,
) -> ApiResult<Json<OrganiserInfo>> {
    let event_id: EventId = parse_id(&raw_id, NO_EVENT)?;
    let events = state.events.clone();
    Ok(Json(
        blocking(move || events.add_organiser(&user_id, &event_id, &request)).await?,
    ))
}

/// DELETE /deleteOrganiser/:ide/:emailOrg
pub async fn delete_organiser(
    State(state): State<Arc<AppState>>,
    AuthUser(user_id): AuthUser,
    PathParam((raw_id, email)): PathParam<(String, String)>,
) -> ApiResult<Json<Vec<OrganiserInfo>>> {
    let event_id: EventId = parse_id(&raw_id, NO_EVENT)?;
    let events = state.events.clone();
    Ok(Json(
        blocking(move || events.remove_organiser(&user_id, &event_id, &email)).await?,
    ))
}
