//! Club records

use crate::core_store::types::{self, ClubId, Timestamp, UserId};
use serde::{Deserialize, Serialize};

/// A named community with one creator
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Club {
    pub id: ClubId,
    /// Unique across clubs
    pub club_name: String,
    pub description: String,
    pub creator: UserId,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl Club {
    pub fn new(club_name: String, description: String, creator: UserId) -> Self {
        let now = types::now();
        Club {
            id: ClubId::generate(),
            club_name,
            description,
            creator,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn is_creator(&self, user_id: &UserId) -> bool {
        &self.creator == user_id
    }
}
