//! Records held in the three collections

pub mod club;
pub mod event;
pub mod user;

pub use club::Club;
pub use event::{Event, EventListing, OrganiserInfo};
pub use user::{ClubRole, Membership, User, UserProfile};
