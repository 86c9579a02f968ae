//! Event operations, including the live feed subscription.

use serde_json::json;
use tracing::{instrument, warn};

use rallypoint_core::{ClubId, EventId, UserId};

use crate::client::Client;
use crate::error::{ClientError, Result};
use crate::models::{Event, EventFields, NewEvent, UserProfileFields};
use crate::store::{Document, Query, collections};
use crate::subscription::{self, Subscription};

/// What happened when a user joined an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinEventOutcome {
    /// The user was added to the attendee set.
    Attending,
    /// The event was at capacity; the user was added to the waitlist.
    Waitlisted,
}

/// Event operations, borrowed from a [`Client`].
pub struct Events<'a> {
    client: &'a Client,
}

impl<'a> Events<'a> {
    pub(crate) const fn new(client: &'a Client) -> Self {
        Self { client }
    }

    /// Create an event under a club.
    ///
    /// Fetches the club to denormalize its name onto the event for
    /// display.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::NotFound` when the club does not exist.
    #[instrument(skip(self, new), fields(club = %new.club_id, title = %new.title))]
    pub async fn create(&self, new: NewEvent) -> Result<Event> {
        self.client.require_uid()?;
        let club = self.client.clubs().get(&new.club_id).await?;

        let fields = new.into_fields(club.name);
        let doc = self
            .client
            .store()
            .create(collections::EVENTS, &fields)
            .await?;
        Ok(Event::from_doc(doc))
    }

    /// Read one event.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::NotFound` when the event does not exist.
    #[instrument(skip(self), fields(event = %id))]
    pub async fn get(&self, id: &EventId) -> Result<Event> {
        let doc = self
            .client
            .store()
            .get(collections::EVENTS, id.as_str())
            .await
            .map_err(|e| ClientError::from_store(e, || format!("event {id}")))?;
        Ok(Event::from_doc(doc))
    }

    /// List a club's events, sorted by start time client-side.
    ///
    /// # Errors
    ///
    /// Returns a store error; callers rendering an empty state can
    /// `unwrap_or_default()`.
    #[instrument(skip(self), fields(club = %club))]
    pub async fn list_for_club(&self, club: &ClubId) -> Result<Vec<Event>> {
        let docs = self
            .client
            .store()
            .query(
                collections::EVENTS,
                &Query::all().filter_eq("clubId", club.as_str()),
            )
            .await?;
        Ok(normalize(docs))
    }

    /// List public events, sorted by start time client-side.
    ///
    /// # Errors
    ///
    /// Returns a store error.
    #[instrument(skip(self))]
    pub async fn list_public(&self) -> Result<Vec<Event>> {
        let docs = self
            .client
            .store()
            .query(collections::EVENTS, &Query::all().filter_eq("isPublic", true))
            .await?;
        Ok(normalize(docs))
    }

    /// Join an event as the signed-in user.
    ///
    /// At capacity the user goes on the waitlist instead of the attendee
    /// set; the two sets stay disjoint. Joining twice fails without
    /// writing anything.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::Conflict` when already attending or already
    /// waitlisted.
    #[instrument(skip(self), fields(event = %id))]
    pub async fn join(&self, id: &EventId) -> Result<JoinEventOutcome> {
        let uid = self.client.require_uid()?;
        let event = self.get(id).await?;

        // Read-then-write on the membership arrays; concurrent joins can
        // race past the capacity check.
        match plan_join(event, uid)? {
            JoinPlan::Attend(attendees) => {
                self.client
                    .store()
                    .patch(collections::EVENTS, id.as_str(), &json!({ "attendees": attendees }))
                    .await?;
                Ok(JoinEventOutcome::Attending)
            }
            JoinPlan::Waitlist(waitlist) => {
                self.client
                    .store()
                    .patch(collections::EVENTS, id.as_str(), &json!({ "waitlist": waitlist }))
                    .await?;
                Ok(JoinEventOutcome::Waitlisted)
            }
        }
    }

    /// Leave an event: removes the user from both the attendee set and the
    /// waitlist.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::NotFound` when the event does not exist.
    #[instrument(skip(self), fields(event = %id))]
    pub async fn leave(&self, id: &EventId) -> Result<()> {
        let uid = self.client.require_uid()?;
        let event = self.get(id).await?;

        let attendees: Vec<UserId> = event.attendees.into_iter().filter(|a| *a != uid).collect();
        let waitlist: Vec<UserId> = event.waitlist.into_iter().filter(|w| *w != uid).collect();

        self.client
            .store()
            .patch(
                collections::EVENTS,
                id.as_str(),
                &json!({ "attendees": attendees, "waitlist": waitlist }),
            )
            .await?;
        Ok(())
    }

    /// Like an event.
    ///
    /// Dual write: the user goes into the event's likes set and the event
    /// into the user's liked set. The two patches are separate requests
    /// with no transaction; a failure between them leaves the sets
    /// disagreeing until the next like/unlike.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::NotFound` when the event or the user profile
    /// does not exist.
    #[instrument(skip(self), fields(event = %id))]
    pub async fn like(&self, id: &EventId) -> Result<()> {
        let uid = self.client.require_uid()?;
        let event = self.get(id).await?;
        let profile = self.profile_fields(&uid).await?;

        if !event.likes.contains(&uid) {
            let mut likes = event.likes;
            likes.push(uid.clone());
            self.client
                .store()
                .patch(collections::EVENTS, id.as_str(), &json!({ "likes": likes }))
                .await?;
        }

        if !profile.liked_events.contains(id) {
            let mut liked = profile.liked_events;
            liked.push(id.clone());
            self.client
                .store()
                .patch(collections::USERS, uid.as_str(), &json!({ "likedEvents": liked }))
                .await?;
        }

        Ok(())
    }

    /// Unlike an event (inverse dual write of [`Self::like`]).
    ///
    /// # Errors
    ///
    /// Returns `ClientError::NotFound` when the event or the user profile
    /// does not exist.
    #[instrument(skip(self), fields(event = %id))]
    pub async fn unlike(&self, id: &EventId) -> Result<()> {
        let uid = self.client.require_uid()?;
        let event = self.get(id).await?;
        let profile = self.profile_fields(&uid).await?;

        let likes: Vec<UserId> = event.likes.into_iter().filter(|u| *u != uid).collect();
        self.client
            .store()
            .patch(collections::EVENTS, id.as_str(), &json!({ "likes": likes }))
            .await?;

        let liked: Vec<EventId> = profile
            .liked_events
            .into_iter()
            .filter(|e| e != id)
            .collect();
        self.client
            .store()
            .patch(collections::USERS, uid.as_str(), &json!({ "likedEvents": liked }))
            .await?;

        Ok(())
    }

    /// Bookmark an event. Writes the user's bookmarked set only; the event
    /// document is untouched.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::NotFound` when the user profile does not
    /// exist.
    #[instrument(skip(self), fields(event = %id))]
    pub async fn bookmark(&self, id: &EventId) -> Result<()> {
        let uid = self.client.require_uid()?;
        let profile = self.profile_fields(&uid).await?;

        if profile.bookmarked_events.contains(id) {
            return Ok(());
        }

        let mut bookmarks = profile.bookmarked_events;
        bookmarks.push(id.clone());
        self.client
            .store()
            .patch(
                collections::USERS,
                uid.as_str(),
                &json!({ "bookmarkedEvents": bookmarks }),
            )
            .await?;
        Ok(())
    }

    /// Remove a bookmark.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::NotFound` when the user profile does not
    /// exist.
    #[instrument(skip(self), fields(event = %id))]
    pub async fn unbookmark(&self, id: &EventId) -> Result<()> {
        let uid = self.client.require_uid()?;
        let profile = self.profile_fields(&uid).await?;

        let bookmarks: Vec<EventId> = profile
            .bookmarked_events
            .into_iter()
            .filter(|e| e != id)
            .collect();
        self.client
            .store()
            .patch(
                collections::USERS,
                uid.as_str(),
                &json!({ "bookmarkedEvents": bookmarks }),
            )
            .await?;
        Ok(())
    }

    /// Subscribe to a club's events.
    ///
    /// Pushed updates arrive normalized and sorted; if the live channel
    /// fails, the subscription silently downgrades to polling the plain
    /// read. Cancel via the returned handle.
    pub fn subscribe_for_club(
        &self,
        club: &ClubId,
        on_update: impl FnMut(Vec<Event>) + Send + 'static,
    ) -> Subscription {
        self.subscribe(
            Query::all().filter_eq("clubId", club.as_str()),
            on_update,
        )
    }

    /// Subscribe to the public event feed (same fallback behavior as
    /// [`Self::subscribe_for_club`]).
    pub fn subscribe_public(
        &self,
        on_update: impl FnMut(Vec<Event>) + Send + 'static,
    ) -> Subscription {
        self.subscribe(Query::all().filter_eq("isPublic", true), on_update)
    }

    fn subscribe(
        &self,
        query: Query,
        on_update: impl FnMut(Vec<Event>) + Send + 'static,
    ) -> Subscription {
        use futures::StreamExt;

        let store = self.client.store().clone();
        Subscription::spawn(async move {
            // Open the push channel; if that fails, start out polling.
            let live = match store.watch::<EventFields>(collections::EVENTS, &query).await {
                Ok(stream) => Some(stream.map(|frame| {
                    frame.map(normalize).map_err(ClientError::from)
                })),
                Err(e) => {
                    warn!(error = %e, "live channel unavailable, polling instead");
                    None
                }
            };

            let poll = {
                let store = store.clone();
                let query = query.clone();
                move || {
                    let store = store.clone();
                    let query = query.clone();
                    async move {
                        store
                            .query::<EventFields>(collections::EVENTS, &query)
                            .await
                            .map(normalize)
                            .map_err(ClientError::from)
                    }
                }
            };

            subscription::drive(live, poll, subscription::POLL_PERIOD, on_update).await;
        })
    }

    async fn profile_fields(&self, uid: &UserId) -> Result<UserProfileFields> {
        let doc = self
            .client
            .store()
            .get::<UserProfileFields>(collections::USERS, uid.as_str())
            .await
            .map_err(|e| ClientError::from_store(e, || format!("profile for {uid}")))?;
        Ok(doc.fields)
    }
}

/// Which membership array a join writes, with its new contents.
#[derive(Debug)]
enum JoinPlan {
    Attend(Vec<UserId>),
    Waitlist(Vec<UserId>),
}

/// Decide where a joining user lands. A duplicate join (either set) is an
/// error and writes nothing; a full event waitlists instead of attending.
fn plan_join(event: Event, uid: UserId) -> Result<JoinPlan> {
    if event.is_attending(&uid) {
        return Err(ClientError::Conflict("already attending".to_string()));
    }
    if event.waitlist.contains(&uid) {
        return Err(ClientError::Conflict("already on the waitlist".to_string()));
    }

    if event.is_full() {
        let mut waitlist = event.waitlist;
        waitlist.push(uid);
        return Ok(JoinPlan::Waitlist(waitlist));
    }

    let mut attendees = event.attendees;
    attendees.push(uid);
    Ok(JoinPlan::Attend(attendees))
}

/// Convert a raw result set and sort it by start time (the query applies
/// no server-side ordering).
fn normalize(docs: Vec<Document<EventFields>>) -> Vec<Event> {
    let mut events: Vec<Event> = docs.into_iter().map(Event::from_doc).collect();
    sort_by_start(&mut events);
    events
}

/// Sort events by start time, earliest first, ids as tiebreak for a
/// stable order.
pub(crate) fn sort_by_start(events: &mut [Event]) {
    events.sort_by(|a, b| {
        a.start_time
            .cmp(&b.start_time)
            .then_with(|| a.id.cmp(&b.id))
    });
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn event_doc(id: &str, start: &str) -> Document<EventFields> {
        Document {
            id: id.to_string().into(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
            fields: serde_json::from_value(serde_json::json!({
                "clubId": "c_1",
                "clubName": "Trail Runners",
                "title": format!("Event {id}"),
                "startTime": start,
            }))
            .unwrap(),
        }
    }

    #[test]
    fn test_normalize_sorts_by_start_time() {
        let docs = vec![
            event_doc("e_2", "2026-05-01T10:00:00Z"),
            event_doc("e_1", "2026-04-01T10:00:00Z"),
            event_doc("e_3", "2026-04-15T10:00:00Z"),
        ];
        let events = normalize(docs);
        let ids: Vec<&str> = events.iter().map(|e| e.id.as_str()).collect();
        assert_eq!(ids, vec!["e_1", "e_3", "e_2"]);
    }

    fn event_with(attendees: &[&str], waitlist: &[&str], max: Option<u32>) -> Event {
        let mut doc = event_doc("e_1", "2026-04-11T08:00:00Z");
        doc.fields.attendees = attendees.iter().map(|u| UserId::new(*u)).collect();
        doc.fields.waitlist = waitlist.iter().map(|u| UserId::new(*u)).collect();
        doc.fields.max_attendees = max;
        Event::from_doc(doc)
    }

    #[test]
    fn test_join_open_event_attends() {
        let plan = plan_join(event_with(&["u_1"], &[], Some(3)), UserId::new("u_2")).unwrap();
        match plan {
            JoinPlan::Attend(attendees) => {
                assert_eq!(attendees, vec![UserId::new("u_1"), UserId::new("u_2")]);
            }
            JoinPlan::Waitlist(_) => panic!("expected attend"),
        }
    }

    #[test]
    fn test_join_full_event_waitlists() {
        let plan = plan_join(event_with(&["u_1", "u_2"], &[], Some(2)), UserId::new("u_3")).unwrap();
        match plan {
            JoinPlan::Waitlist(waitlist) => assert_eq!(waitlist, vec![UserId::new("u_3")]),
            JoinPlan::Attend(_) => panic!("expected waitlist"),
        }
    }

    #[test]
    fn test_join_twice_is_a_conflict() {
        let err = plan_join(event_with(&["u_1"], &[], Some(3)), UserId::new("u_1")).unwrap_err();
        assert!(matches!(err, ClientError::Conflict(ref m) if m == "already attending"));

        let err = plan_join(event_with(&["u_1"], &["u_2"], Some(1)), UserId::new("u_2")).unwrap_err();
        assert!(matches!(err, ClientError::Conflict(_)));
    }

    #[test]
    fn test_unlimited_event_never_waitlists() {
        let plan = plan_join(event_with(&["u_1", "u_2"], &[], None), UserId::new("u_3")).unwrap();
        assert!(matches!(plan, JoinPlan::Attend(_)));
    }

    #[test]
    fn test_sort_ties_break_on_id() {
        let t = Utc.with_ymd_and_hms(2026, 4, 1, 10, 0, 0).unwrap();
        let mut events = normalize(vec![
            event_doc("e_9", "2026-04-01T10:00:00Z"),
            event_doc("e_1", "2026-04-01T10:00:00Z"),
        ]);
        sort_by_start(&mut events);
        assert_eq!(events[0].id.as_str(), "e_1");
        assert_eq!(events[0].start_time, t);
    }
}
