//! User records and their public projection

use crate::core_store::types::{ClubId, EventId, Timestamp, UserId};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Role a member holds inside a club
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ClubRole {
    #[default]
    Member,
    VicePresident,
    President,
}

impl ClubRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            ClubRole::Member => "member",
            ClubRole::VicePresident => "vice-president",
            ClubRole::President => "president",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown club role: {0}")]
pub struct UnknownRole(pub String);

impl FromStr for ClubRole {
    type Err = UnknownRole;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "member" => Ok(ClubRole::Member),
            "vice-president" => Ok(ClubRole::VicePresident),
            "president" => Ok(ClubRole::President),
            other => Err(UnknownRole(other.to_string())),
        }
    }
}

impl fmt::Display for ClubRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A user's role-tagged association with a club
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Membership {
    pub club_id: ClubId,
    pub role: ClubRole,
}

/// Full user record, including the credential hash. Never serialized to clients.
#[derive(Debug, Clone)]
pub struct User {
    pub id: UserId,
    /// Normalised (trimmed, lower-case); unique across users
    pub email: String,
    pub name: String,
    pub password_hash: String,
    pub institute_id: String,
    pub following_clubs: Vec<ClubId>,
    pub memberships: Vec<Membership>,
    pub events_created: Vec<EventId>,
    /// Elevated privilege to create clubs when creation is restricted
    pub can_create_club: bool,
    pub is_admin: bool,
    pub created_at: Timestamp,
}

impl User {
    pub fn new(
        email: String,
        name: String,
        password_hash: String,
        institute_id: String,
    ) -> Self {
        User {
            id: UserId::generate(),
            email,
            name,
            password_hash,
            institute_id,
            following_clubs: Vec::new(),
            memberships: Vec::new(),
            events_created: Vec::new(),
            can_create_club: false,
            is_admin: false,
            created_at: crate::core_store::types::now(),
        }
    }

    /// Grant both administrator and club-creation privileges
    pub fn promote_to_admin(&mut self) {
        self.is_admin = true;
        self.can_create_club = true;
    }

    pub fn may_create_clubs(&self) -> bool {
        self.is_admin || self.can_create_club
    }

    pub fn is_following(&self, club_id: &ClubId) -> bool {
        self.following_clubs.contains(club_id)
    }

    pub fn membership_in(&self, club_id: &ClubId) -> Option<&Membership> {
        self.memberships.iter().find(|m| &m.club_id == club_id)
    }

    pub fn has_any_membership(&self) -> bool {
        !self.memberships.is_empty()
    }

    /// The client-facing view with the credential hash stripped
    pub fn profile(&self) -> UserProfile {
        UserProfile {
            id: self.id,
            email: self.email.clone(),
            name: self.name.clone(),
            institute_id: self.institute_id.clone(),
            following_clubs: self.following_clubs.clone(),
            memberships: self.memberships.clone(),
            events_created: self.events_created.clone(),
            can_create_club: self.can_create_club,
            is_admin: self.is_admin,
            created_at: self.created_at,
        }
    }
}

/// User as returned by the API
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub id: UserId,
    pub email: String,
    pub name: String,
    pub institute_id: String,
    pub following_clubs: Vec<ClubId>,
    pub memberships: Vec<Membership>,
    pub events_created: Vec<EventId>,
    pub can_create_club: bool,
    pub is_admin: bool,
    pub created_at: Timestamp,
}
