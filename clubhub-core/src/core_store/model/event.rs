//! Event records and the enriched listing view

use crate::core_store::types::{self, ClubId, EventId, Timestamp, UserId};
use serde::{Deserialize, Serialize};

/// An event owned by a club
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Event {
    pub id: EventId,
    pub title: String,
    pub description: String,
    pub creator: UserId,
    pub of_club: ClubId,
    pub start_time: Timestamp,
    pub end_time: Timestamp,
    pub venue: String,
    /// Insertion-ordered, no duplicates
    pub organisers: Vec<UserId>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl Event {
    /// A new event whose only organiser is its creator
    pub fn new(
        of_club: ClubId,
        creator: UserId,
        title: String,
        description: String,
        venue: String,
        start_time: Timestamp,
        end_time: Timestamp,
    ) -> Self {
        let now = types::now();
        Event {
            id: EventId::generate(),
            title,
            description,
            creator,
            of_club,
            start_time,
            end_time,
            venue,
            organisers: vec![creator],
            created_at: now,
            updated_at: now,
        }
    }

    pub fn is_creator(&self, user_id: &UserId) -> bool {
        &self.creator == user_id
    }
}

/// Public identity of an organiser
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrganiserInfo {
    pub email: String,
    pub name: String,
}

/// Event with club, creator and organiser names resolved for display
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventListing {
    #[serde(flatten)]
    pub event: Event,
    /// `None` when the parent club no longer resolves
    pub club_name: Option<String>,
    pub creator_name: Option<String>,
    pub organiser_details: Vec<OrganiserInfo>,
}
