//! Core of the ClubHub campus club and event backend

pub mod config;
pub mod core_auth;
pub mod core_club;
pub mod core_store;
pub mod health;
pub mod logging;
pub mod shutdown;

pub use config::{Config, ConfigError};
pub use core_club::{ClubService, EventService, ServiceError, UserService};
pub use core_store::{ClubStore, StoreError};
pub use logging::{init_logging, init_logging_with_config, LogConfig, LogLevel};
pub use shutdown::ShutdownCoordinator;
