//! Liveness report

use crate::state::AppState;
use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use clubhub_core::health::{checks, HealthCheck};
use std::sync::Arc;

/// GET /health
pub async fn health(State(state): State<Arc<AppState>>) -> (StatusCode, Json<HealthCheck>) {
    let store = state.store.clone();
    let ping = match tokio::task::spawn_blocking(move || store.ping()).await {
        Ok(result) => result.map_err(|e| e.to_string()),
        Err(e) => Err(e.to_string()),
    };

    let report = state.health.report(vec![checks::check_store(ping)]);
    let status = StatusCode::from_u16(report.status.to_http_status())
        .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    (status, Json(report))
}
