//! Events: listing, creation, deletion and organiser management

use super::club_service::caller;
use super::error::{ServiceError, ServiceResult};
use super::requests::{CreateEventRequest, OrganiserRequest};
use super::validation::{normalize_email, Validate};
use crate::core_store::types;
use crate::core_store::{ClubId, ClubStore, Event, EventId, EventListing, OrganiserInfo, UserId};
use std::sync::Arc;
use tracing::{debug, info, warn};

#[derive(Debug, Clone)]
pub struct EventService {
    store: Arc<ClubStore>,
}

impl EventService {
    pub fn new(store: Arc<ClubStore>) -> Self {
        Self { store }
    }

    /// Every event by ascending start time, with display names resolved
    pub fn list_events(&self) -> ServiceResult<Vec<EventListing>> {
        let events = self.store.read(|c| c.list_event_listings())?;
        debug!(count = events.len(), "Listed events");
        Ok(events)
    }

    pub fn get_event(&self, event_id: &EventId) -> ServiceResult<Event> {
        self.store
            .read(|c| c.find_event(event_id))?
            .ok_or_else(|| ServiceError::not_found("No event found"))
    }

    /// Create an event in `club_id`. The caller must hold at least one club membership.
    pub fn create_event(
        &self,
        caller_id: &UserId,
        club_id: &ClubId,
        request: &CreateEventRequest,
    ) -> ServiceResult<Event> {
        request.validate()?;
        let (start_time, end_time) = request.schedule()?;

        let event = self.store.write(|c| -> ServiceResult<Event> {
            if c.find_club(club_id)?.is_none() {
                return Err(ServiceError::not_found("Club not found"));
            }
            let user = caller(c, caller_id)?;
            if !user.has_any_membership() {
                warn!(user_id = %user.id, %club_id, "Event creation denied: no memberships");
                return Err(ServiceError::unauthorized("Only club members can create events"));
            }

            let event = Event::new(
                *club_id,
                user.id,
                request.title.trim().to_string(),
                request.description.trim().to_string(),
                request.venue.trim().to_string(),
                start_time,
                end_time,
            );
            c.insert_event(&event)?;
            c.add_created_event(&user.id, &event.id)?;
            Ok(event)
        })?;

        info!(event_id = %event.id, club_id = %event.of_club, creator = %event.creator, "Event created");
        Ok(event)
    }

    /// Delete an event. Only its creator may do this.
    pub fn delete_event(&self, caller_id: &UserId, event_id: &EventId) -> ServiceResult<()> {
        self.store.write(|c| -> ServiceResult<()> {
            let event = c.find_event(event_id)?.ok_or_else(|| ServiceError::not_found("No event found"))?;
            if !event.is_creator(caller_id) {
                warn!(%event_id, user_id = %caller_id, "Event deletion denied");
                return Err(ServiceError::unauthorized("Unauthorized"));
            }

            c.delete_event(event_id)?;
            c.remove_created_event(&event.creator, event_id)?;
            Ok(())
        })?;

        info!(%event_id, "Event deleted");
        Ok(())
    }

    /// Add the user registered under `request.email` as an organiser
    pub fn add_organiser(
        &self,
        caller_id: &UserId,
        event_id: &EventId,
        request: &OrganiserRequest,
    ) -> ServiceResult<OrganiserInfo> {
        request.validate()?;
        let email = normalize_email(&request.email);

        let info = self.store.write(|c| -> ServiceResult<OrganiserInfo> {
            let event = c.find_event(event_id)?.ok_or_else(|| ServiceError::not_found("No event found"))?;
            if !event.is_creator(caller_id) {
                warn!(%event_id, user_id = %caller_id, "Organiser change denied");
                return Err(ServiceError::unauthorized("Unauthorized"));
            }

            let target = c
                .find_user_by_email(&email)?
                .ok_or_else(|| ServiceError::not_found("No organiser found to add"))?;
            if event.is_creator(&target.id) {
                return Err(ServiceError::Conflict("You are already an organiser.".to_string()));
            }

            if c.add_organiser(event_id, &target.id)? {
                c.touch_event(event_id, types::now())?;
            }
            Ok(OrganiserInfo {
                email: target.email,
                name: target.name,
            })
        })?;

        info!(%event_id, organiser = %info.email, "Organiser added");
        Ok(info)
    }

    /// Remove an organiser by email, returning the remaining organisers in the order they were added
    pub fn remove_organiser(
        &self,
        caller_id: &UserId,
        event_id: &EventId,
        email: &str,
    ) -> ServiceResult<Vec<OrganiserInfo>> {
        let email = normalize_email(email);

        let remaining = self.store.write(|c| -> ServiceResult<Vec<OrganiserInfo>> {
            let event = c.find_event(event_id)?.ok_or_else(|| ServiceError::not_found("No event found"))?;
            if !event.is_creator(caller_id) {
                warn!(%event_id, user_id = %caller_id, "Organiser change denied");
                return Err(ServiceError::unauthorized("Unauthorized"));
            }

            let not_organiser =
                || ServiceError::not_found("No organiser found or not associated with the event");
            let target = c.find_user_by_email(&email)?.ok_or_else(not_organiser)?;
            if !c.remove_organiser(event_id, &target.id)? {
                return Err(not_organiser());
            }
            c.touch_event(event_id, types::now())?;

            Ok(c.organiser_profiles(event_id)?)
        })?;

        info!(%event_id, organiser = %email, "Organiser removed");
        Ok(remaining)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core_club::club_service::ClubService;
    use crate::core_club::requests::CreateClubRequest;
    use crate::core_club::test_support::{load_user, seed_user, store};
    use crate::core_store::Club;

    struct Fixture {
        store: Arc<ClubStore>,
        events: EventService,
        ada: UserId,
        bob: UserId,
        club: Club,
    }

    fn fixture() -> Fixture {
        let store = store();
        let ada = seed_user(&store, "ada@campus.edu", "Ada");
        let bob = seed_user(&store, "bob@campus.edu", "Bob");
        let club = ClubService::new(store.clone(), false)
            .create_club(
                &ada,
                &CreateClubRequest {
                    club_name: "Robotics".to_string(),
                    description: "We build robots".to_string(),
                },
            )
            .unwrap();

        Fixture {
            events: EventService::new(store.clone()),
            store,
            ada,
            bob,
            club,
        }
    }

    fn request(title: &str, start: &str, end: &str) -> CreateEventRequest {
        CreateEventRequest {
            title: title.to_string(),
            description: "An evening of robots".to_string(),
            venue: "Lab 3, East Wing".to_string(),
            start_time: start.to_string(),
            end_time: end.to_string(),
        }
    }

    fn meetup(f: &Fixture) -> Event {
        f.events
            .create_event(
                &f.ada,
                &f.club.id,
                &request("Meetup", "2030-01-10T18:00:00Z", "2030-01-10T20:00:00Z"),
            )
            .unwrap()
    }

    fn organiser(email: &str) -> OrganiserRequest {
        OrganiserRequest {
            email: email.to_string(),
        }
    }

    #[test]
    fn test_create_event_records_creator() {
        let f = fixture();
        let event = meetup(&f);

        assert_eq!(event.creator, f.ada);
        assert_eq!(event.organisers, vec![f.ada]);
        assert_eq!(event.of_club, f.club.id);
        assert_eq!(load_user(&f.store, &f.ada).events_created, vec![event.id]);
        assert_eq!(f.events.get_event(&event.id).unwrap(), event);
    }

    #[test]
    fn test_create_event_requires_a_membership() {
        let f = fixture();
        let err = f
            .events
            .create_event(
                &f.bob,
                &f.club.id,
                &request("Meetup", "2030-01-10T18:00:00Z", "2030-01-10T20:00:00Z"),
            )
            .unwrap_err();
        assert!(matches!(err, ServiceError::Authorization(_)));
    }

    #[test]
    fn test_create_event_rejects_bad_input() {
        let f = fixture();
        let inverted = request("Meetup", "2030-01-10T20:00:00Z", "2030-01-10T18:00:00Z");
        assert!(matches!(
            f.events.create_event(&f.ada, &f.club.id, &inverted),
            Err(ServiceError::Validation(_))
        ));

        let valid = request("Meetup", "2030-01-10T18:00:00Z", "2030-01-10T20:00:00Z");
        assert!(matches!(
            f.events.create_event(&f.ada, &ClubId::generate(), &valid),
            Err(ServiceError::NotFound(_))
        ));
    }

    #[test]
    fn test_list_events_sorted_by_start() {
        let f = fixture();
        for (title, start, end) in [
            ("Late", "2030-03-01T10:00:00Z", "2030-03-01T11:00:00Z"),
            ("Early", "2030-01-01T10:00:00Z", "2030-01-01T11:00:00Z"),
            ("Middle", "2030-02-01T10:00:00Z", "2030-02-01T11:00:00Z"),
        ] {
            f.events.create_event(&f.ada, &f.club.id, &request(title, start, end)).unwrap();
        }

        let listings = f.events.list_events().unwrap();
        let titles: Vec<_> = listings.iter().map(|l| l.event.title.as_str()).collect();
        assert_eq!(titles, vec!["Early", "Middle", "Late"]);
        assert!(listings.iter().all(|l| l.club_name.as_deref() == Some("Robotics")));
        assert!(listings.iter().all(|l| l.creator_name.as_deref() == Some("Ada")));
    }

    #[test]
    fn test_delete_event_creator_only() {
        let f = fixture();
        let event = meetup(&f);

        assert!(matches!(
            f.events.delete_event(&f.bob, &event.id),
            Err(ServiceError::Authorization(_))
        ));

        f.events.delete_event(&f.ada, &event.id).unwrap();
        assert!(matches!(f.events.get_event(&event.id), Err(ServiceError::NotFound(_))));
        assert!(load_user(&f.store, &f.ada).events_created.is_empty());
        assert!(matches!(
            f.events.delete_event(&f.ada, &event.id),
            Err(ServiceError::NotFound(_))
        ));
    }

    #[test]
    fn test_add_and_remove_organisers() {
        let f = fixture();
        let event = meetup(&f);

        let added = f.events.add_organiser(&f.ada, &event.id, &organiser(" Bob@Campus.edu ")).unwrap();
        assert_eq!(added, OrganiserInfo { email: "bob@campus.edu".to_string(), name: "Bob".to_string() });

        // adding again leaves a single entry
        f.events.add_organiser(&f.ada, &event.id, &organiser("bob@campus.edu")).unwrap();
        assert_eq!(f.events.get_event(&event.id).unwrap().organisers, vec![f.ada, f.bob]);

        let remaining = f.events.remove_organiser(&f.ada, &event.id, "bob@campus.edu").unwrap();
        assert_eq!(remaining, vec![OrganiserInfo { email: "ada@campus.edu".to_string(), name: "Ada".to_string() }]);
    }

    #[test]
    fn test_organiser_errors() {
        let f = fixture();
        let event = meetup(&f);

        assert!(matches!(
            f.events.add_organiser(&f.ada, &event.id, &organiser("ada@campus.edu")),
            Err(ServiceError::Conflict(_))
        ));
        assert!(matches!(
            f.events.add_organiser(&f.bob, &event.id, &organiser("bob@campus.edu")),
            Err(ServiceError::Authorization(_))
        ));
        assert!(matches!(
            f.events.add_organiser(&f.ada, &event.id, &organiser("ghost@campus.edu")),
            Err(ServiceError::NotFound(_))
        ));
        assert!(matches!(
            f.events.add_organiser(&f.ada, &event.id, &organiser("not-an-email")),
            Err(ServiceError::Validation(_))
        ));
        assert!(matches!(
            f.events.add_organiser(&f.ada, &EventId::generate(), &organiser("bob@campus.edu")),
            Err(ServiceError::NotFound(_))
        ));

        assert!(matches!(
            f.events.remove_organiser(&f.ada, &event.id, "bob@campus.edu"),
            Err(ServiceError::NotFound(_))
        ));
        assert!(matches!(
            f.events.remove_organiser(&f.ada, &event.id, "ghost@campus.edu"),
            Err(ServiceError::NotFound(_))
        ));
        assert!(matches!(
            f.events.remove_organiser(&f.bob, &event.id, "ada@campus.edu"),
            Err(ServiceError::Authorization(_))
        ));
    }
}
