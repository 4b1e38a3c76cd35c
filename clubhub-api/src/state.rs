//! State shared by every request handler

use clubhub_core::core_club::{ClubService, EventService, ServiceResult, UserService};
use clubhub_core::health::HealthChecker;
use clubhub_core::{ClubStore, Config};
use std::sync::Arc;

#[derive(Debug, Clone)]
pub struct AppState {
    pub store: Arc<ClubStore>,
    pub clubs: ClubService,
    pub events: EventService,
    pub users: UserService,
    pub health: HealthChecker,
}

impl AppState {
    pub fn new(store: Arc<ClubStore>, config: &Config) -> ServiceResult<Self> {
        Ok(Self {
            clubs: ClubService::new(store.clone(), config.auth.restrict_club_creation),
            events: EventService::new(store.clone()),
            users: UserService::from_config(store.clone(), &config.auth)?,
            health: HealthChecker::new(env!("CARGO_PKG_VERSION")),
            store,
        })
    }
}
