//! SQLite storage for the three collections

pub mod migrations;
pub mod sql_store;

pub use sql_store::{ClubStore, Collections};
