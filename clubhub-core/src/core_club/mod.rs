//! Club, event and user services
//!
//! Each service takes the authenticated caller's id where the operation is
//! protected and performs its reads and writes in a single store transaction.

pub mod club_service;
pub mod error;
pub mod event_service;
pub mod requests;
pub mod user_service;
pub mod validation;

#[cfg(test)]
mod test_support;

pub use club_service::{CascadeReport, ClubService};
pub use error::{FieldError, ServiceError, ServiceResult};
pub use event_service::EventService;
pub use requests::{
    CreateClubRequest, CreateEventRequest, LoginRequest, OrganiserRequest, RegisterRequest,
};
pub use user_service::{MyProfile, SessionToken, UserService};
pub use validation::Validate;
