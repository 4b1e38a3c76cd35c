//! Persistence layer: identifiers, records and the SQLite-backed store
//!
//! ```no_run
//! use clubhub_core::core_store::{ClubStore, StoreError};
//!
//! # fn main() -> Result<(), StoreError> {
//! let store = ClubStore::memory()?;
//! let clubs = store.read(|c| c.list_clubs())?;
//! assert!(clubs.is_empty());
//! # Ok(())
//! # }
//! ```

pub mod errors;
pub mod model;
pub mod storage;
pub mod types;

pub use errors::{StoreError, StoreResult};
pub use model::{Club, ClubRole, Event, EventListing, Membership, OrganiserInfo, User, UserProfile};
pub use storage::{ClubStore, Collections};
pub use types::{ClubId, EventId, IdParseError, Timestamp, UserId};
