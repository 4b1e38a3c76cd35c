//! Club lifecycle: creation, lookup, follow sets and the cascading delete

use super::error::{ServiceError, ServiceResult};
use super::requests::CreateClubRequest;
use super::validation::Validate;
use crate::core_store::{Club, ClubId, ClubRole, ClubStore, Collections, User, UserId, UserProfile};
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// What a club deletion removed
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CascadeReport {
    pub memberships_removed: usize,
    pub follows_removed: usize,
    pub events_deleted: usize,
    pub created_refs_removed: usize,
}

/// Resolve the authenticated caller inside a transaction
pub(crate) fn caller(c: &Collections<'_>, id: &UserId) -> ServiceResult<User> {
    c.find_user(id)?
        .ok_or_else(|| ServiceError::Authentication("User not found".to_string()))
}

#[derive(Debug, Clone)]
pub struct ClubService {
    store: Arc<ClubStore>,
    restrict_creation: bool,
}

impl ClubService {
    /// `restrict_creation` limits club creation to admins and privileged users
    pub fn new(store: Arc<ClubStore>, restrict_creation: bool) -> Self {
        Self {
            store,
            restrict_creation,
        }
    }

    pub fn list_clubs(&self) -> ServiceResult<Vec<Club>> {
        let clubs = self.store.read(|c| c.list_clubs())?;
        debug!(count = clubs.len(), "Listed clubs");
        Ok(clubs)
    }

    pub fn get_club(&self, club_id: &ClubId) -> ServiceResult<Club> {
        self.store
            .read(|c| c.find_club(club_id))?
            .ok_or_else(|| ServiceError::not_found("No club found"))
    }

    /// Create a club owned by `caller`, who also becomes a follower and member
    pub fn create_club(&self, caller_id: &UserId, request: &CreateClubRequest) -> ServiceResult<Club> {
        request.validate()?;
        let name = request.club_name.trim().to_string();
        let description = request.description.trim().to_string();

        let club = self.store.write(|c| -> ServiceResult<Club> {
            if c.find_club_by_name(&name)?.is_some() {
                return Err(ServiceError::Conflict("Club already exists".to_string()));
            }

            let user = caller(c, caller_id)?;
            if self.restrict_creation && !user.may_create_clubs() {
                warn!(user_id = %user.id, "Club creation denied");
                return Err(ServiceError::unauthorized("Not allowed to create clubs"));
            }

            let club = Club::new(name, description, user.id);
            c.insert_club(&club)?;
            c.add_following(&user.id, &club.id)?;
            c.add_membership(&user.id, &club.id, ClubRole::Member)?;
            Ok(club)
        })?;

        info!(club_id = %club.id, creator = %club.creator, name = %club.club_name, "Club created");
        Ok(club)
    }

    /// Delete a club and every reference to it. Only the creator may do this.
    ///
    /// Users lose the club from their membership and follow sets; events of the
    /// club are deleted together with their organiser rows and their ids are
    /// removed from their creators' created-events sets.
    pub fn delete_club(&self, caller_id: &UserId, club_id: &ClubId) -> ServiceResult<CascadeReport> {
        let report = self.store.write(|c| -> ServiceResult<CascadeReport> {
            let club = c.find_club(club_id)?.ok_or_else(|| ServiceError::not_found("No club found"))?;
            if !club.is_creator(caller_id) {
                warn!(%club_id, user_id = %caller_id, "Club deletion denied");
                return Err(ServiceError::unauthorized("Unauthorized"));
            }

            c.delete_club(club_id)?;
            let mut report = CascadeReport {
                memberships_removed: c.pull_club_from_memberships(club_id)?,
                follows_removed: c.pull_club_from_follows(club_id)?,
                ..CascadeReport::default()
            };

            for (event_id, creator) in c.events_of_club(club_id)? {
                if c.delete_event(&event_id)? {
                    report.events_deleted += 1;
                }
                if c.remove_created_event(&creator, &event_id)? {
                    report.created_refs_removed += 1;
                }
            }
            Ok(report)
        })?;

        info!(
            %club_id,
            memberships = report.memberships_removed,
            follows = report.follows_removed,
            events = report.events_deleted,
            created_refs = report.created_refs_removed,
            "Club deleted"
        );
        Ok(report)
    }

    pub fn follow_club(&self, caller_id: &UserId, club_id: &ClubId) -> ServiceResult<UserProfile> {
        self.update_follow(caller_id, club_id, true)
    }

    pub fn unfollow_club(&self, caller_id: &UserId, club_id: &ClubId) -> ServiceResult<UserProfile> {
        self.update_follow(caller_id, club_id, false)
    }

    fn update_follow(&self, caller_id: &UserId, club_id: &ClubId, follow: bool) -> ServiceResult<UserProfile> {
        let profile = self.store.write(|c| -> ServiceResult<UserProfile> {
            if c.find_club(club_id)?.is_none() {
                return Err(ServiceError::not_found("No club found"));
            }
            let user = caller(c, caller_id)?;

            let changed = if follow {
                c.add_following(&user.id, club_id)?
            } else {
                c.remove_following(&user.id, club_id)?
            };
            debug!(%club_id, user_id = %user.id, follow, changed, "Follow set updated");

            Ok(caller(c, &user.id)?.profile())
        })?;
        Ok(profile)
    }
}
