//! API routes definition

use crate::error::ApiError;
use crate::handlers::{self, clubs, events, health, users};
use crate::state::AppState;
use axum::http::{header, StatusCode};
use axum::middleware;
use axum::response::{IntoResponse, Response};
use axum::routing::{delete, get, post, put};
use axum::Router;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

/// Build the API router with all endpoints
pub fn build_router(state: Arc<AppState>, cors_allow_any_origin: bool) -> Router {
    let router = Router::new()
        // Club routes
        .route("/allClubs", get(clubs::all_clubs))
        .route("/addClub", put(clubs::add_club))
        .route("/deleteClub/:id", delete(clubs::delete_club))
        .route("/clubData/:id", get(clubs::club_data))
        .route("/follow/:id", put(clubs::follow))
        .route("/unfollow/:id", put(clubs::unfollow))
        // Event routes
        .route("/allEvents", get(events::all_events))
        .route("/eventData/:id", get(events::event_data))
        .route("/addEvent/:club_id", put(events::add_event))
        .route("/deleteEvent/:id", delete(events::delete_event))
        .route("/addOrganiser/:id", post(events::add_organiser))
        .route("/deleteOrganiser/:id/:email", delete(events::delete_organiser))
        // User routes
        .route("/registerUser", post(users::register))
        .route("/loginUser", post(users::login))
        .route("/allUsers", get(users::all_users))
        .route("/myData", get(users::my_data))
        // Health
        .route("/health", get(health::health))
        .fallback(handlers::not_found)
        .with_state(state)
        .layer(middleware::map_response(method_not_allowed_envelope))
        .layer(TraceLayer::new_for_http());

    if cors_allow_any_origin {
        router.layer(CorsLayer::permissive())
    } else {
        router
    }
}

/// Give the router's bare 405 the same error body as every other failure, keeping `Allow`
async fn method_not_allowed_envelope(response: Response) -> Response {
    if response.status() != StatusCode::METHOD_NOT_ALLOWED {
        return response;
    }

    let allow = response.headers().get(header::ALLOW).cloned();
    let mut enveloped = ApiError::MethodNotAllowed.into_response();
    if let Some(allow) = allow {
        enveloped.headers_mut().insert(header::ALLOW, allow);
    }
    enveloped
}
