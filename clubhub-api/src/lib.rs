//! HTTP surface of the ClubHub backend

pub mod api;
pub mod error;
pub mod extract;
pub mod handlers;
pub mod server;
pub mod state;

pub use api::build_router;
pub use error::{ApiError, ApiResult, ErrorResponse};
pub use server::ClubHubServer;
pub use state::AppState;
