//! Event documents.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use rallypoint_core::{ClubId, EventId, UserId};

use crate::store::Document;

const fn default_true() -> bool {
    true
}

/// Stored event fields.
///
/// `name`, `date`, `capacity`, and `clubTitle` are legacy names; reads
/// accept both. The club name is denormalized onto the event for display.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct EventFields {
    pub club_id: ClubId,
    #[serde(alias = "clubTitle")]
    pub club_name: String,
    #[serde(alias = "name")]
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(alias = "date")]
    pub start_time: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_time: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none", alias = "capacity")]
    pub max_attendees: Option<u32>,
    #[serde(default = "default_true", alias = "public")]
    pub is_public: bool,
    #[serde(default, skip_serializing_if = "Option::is_none", alias = "photoUrl")]
    pub image_url: Option<String>,
    #[serde(default)]
    pub attendees: Vec<UserId>,
    #[serde(default)]
    pub waitlist: Vec<UserId>,
    #[serde(default)]
    pub likes: Vec<UserId>,
}

/// An event as callers see it.
///
/// Invariant (maintained by the join/leave operations): the attendee set
/// and the waitlist are disjoint.
#[derive(Debug, Clone)]
pub struct Event {
    pub id: EventId,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub club_id: ClubId,
    pub club_name: String,
    pub title: String,
    pub description: Option<String>,
    pub location: Option<String>,
    pub start_time: DateTime<Utc>,
    pub end_time: Option<DateTime<Utc>>,
    pub max_attendees: Option<u32>,
    pub is_public: bool,
    pub image_url: Option<String>,
    pub attendees: Vec<UserId>,
    pub waitlist: Vec<UserId>,
    pub likes: Vec<UserId>,
}

impl Event {
    pub(crate) fn from_doc(doc: Document<EventFields>) -> Self {
        let f = doc.fields;
        Self {
            id: EventId::new(doc.id.as_str()),
            created_at: doc.created_at,
            updated_at: doc.updated_at,
            club_id: f.club_id,
            club_name: f.club_name,
            title: f.title,
            description: f.description,
            location: f.location,
            start_time: f.start_time,
            end_time: f.end_time,
            max_attendees: f.max_attendees,
            is_public: f.is_public,
            image_url: f.image_url,
            attendees: f.attendees,
            waitlist: f.waitlist,
            likes: f.likes,
        }
    }

    /// Whether the user is in the attendee set.
    #[must_use]
    pub fn is_attending(&self, user: &UserId) -> bool {
        self.attendees.contains(user)
    }

    /// Whether the attendee set has reached capacity.
    #[must_use]
    pub fn is_full(&self) -> bool {
        self.max_attendees
            .is_some_and(|max| self.attendees.len() >= max as usize)
    }
}

/// Payload for creating an event.
///
/// The create operation fetches the owning club to denormalize its name
/// onto the event.
#[derive(Debug, Clone)]
pub struct NewEvent {
    pub club_id: ClubId,
    pub title: String,
    pub description: Option<String>,
    pub location: Option<String>,
    pub start_time: DateTime<Utc>,
    pub end_time: Option<DateTime<Utc>>,
    pub max_attendees: Option<u32>,
    pub is_public: bool,
    pub image_url: Option<String>,
}

impl NewEvent {
    pub(crate) fn into_fields(self, club_name: String) -> EventFields {
        EventFields {
            club_id: self.club_id,
            club_name,
            title: self.title,
            description: self.description,
            location: self.location,
            start_time: self.start_time,
            end_time: self.end_time,
            max_attendees: self.max_attendees,
            is_public: self.is_public,
            image_url: self.image_url,
            attendees: Vec::new(),
            waitlist: Vec::new(),
            likes: Vec::new(),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_event_fields_accepts_legacy_names() {
        let json = r#"{
            "clubId": "c_1",
            "clubTitle": "Trail Runners",
            "name": "Saturday long run",
            "date": "2026-04-11T08:00:00Z",
            "capacity": 20,
            "public": false
        }"#;
        let fields: EventFields = serde_json::from_str(json).unwrap();
        assert_eq!(fields.club_name, "Trail Runners");
        assert_eq!(fields.title, "Saturday long run");
        assert_eq!(fields.max_attendees, Some(20));
        assert!(!fields.is_public);
        assert!(fields.attendees.is_empty());
        assert!(fields.waitlist.is_empty());
    }

    #[test]
    fn test_is_public_defaults_to_true() {
        let json = r#"{
            "clubId": "c_1",
            "clubName": "Trail Runners",
            "title": "Open run",
            "startTime": "2026-04-11T08:00:00Z"
        }"#;
        let fields: EventFields = serde_json::from_str(json).unwrap();
        assert!(fields.is_public);
    }

    #[test]
    fn test_is_full() {
        let json = r#"{
            "clubId": "c_1",
            "clubName": "Trail Runners",
            "title": "Open run",
            "startTime": "2026-04-11T08:00:00Z",
            "maxAttendees": 2,
            "attendees": ["u_1", "u_2"]
        }"#;
        let fields: EventFields = serde_json::from_str(json).unwrap();
        let doc = Document {
            id: "e_1".to_string().into(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
            fields,
        };
        let event = Event::from_doc(doc);
        assert!(event.is_full());
        assert!(event.is_attending(&UserId::new("u_1")));
        assert!(!event.is_attending(&UserId::new("u_3")));
    }
}
