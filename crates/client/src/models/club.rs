//! Club documents and join requests.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use rallypoint_core::{ClubId, JoinRequestId, Patch, UserId};

use crate::store::Document;

/// Stored club fields.
///
/// `title` and `photoUrl` are legacy names still present in older
/// documents; reads accept both.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ClubFields {
    #[serde(alias = "title")]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, alias = "public")]
    pub is_public: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none", alias = "photoUrl")]
    pub image_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(alias = "creatorId")]
    pub created_by: UserId,
    #[serde(default)]
    pub members: Vec<UserId>,
    #[serde(default)]
    pub admins: Vec<UserId>,
}

/// A club as callers see it.
#[derive(Debug, Clone)]
pub struct Club {
    pub id: ClubId,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub name: String,
    pub description: Option<String>,
    pub is_public: bool,
    pub category: Option<String>,
    pub image_url: Option<String>,
    pub location: Option<String>,
    pub created_by: UserId,
    pub members: Vec<UserId>,
    pub admins: Vec<UserId>,
}

impl Club {
    pub(crate) fn from_doc(doc: Document<ClubFields>) -> Self {
        let f = doc.fields;
        Self {
            id: ClubId::new(doc.id.as_str()),
            created_at: doc.created_at,
            updated_at: doc.updated_at,
            name: f.name,
            description: f.description,
            is_public: f.is_public,
            category: f.category,
            image_url: f.image_url,
            location: f.location,
            created_by: f.created_by,
            members: f.members,
            admins: f.admins,
        }
    }

    /// Whether the user is a member.
    #[must_use]
    pub fn is_member(&self, user: &UserId) -> bool {
        self.members.contains(user)
    }
}

/// Payload for creating a club, in UI vocabulary.
///
/// The create operation renames these to storage vocabulary and fills in
/// the creator-derived fields (`createdBy`, initial member/admin sets).
#[derive(Debug, Clone)]
pub struct NewClub {
    /// Club title as entered in the UI.
    pub title: String,
    /// Free-form "about" text.
    pub about: Option<String>,
    /// Whether anyone can join directly.
    pub is_public: bool,
    pub category: Option<String>,
    pub image_url: Option<String>,
    pub location: Option<String>,
}

impl NewClub {
    /// Build the stored field set for a creator.
    ///
    /// The member set always contains the creator.
    pub(crate) fn into_fields(self, creator: UserId) -> ClubFields {
        ClubFields {
            name: self.title,
            description: self.about,
            is_public: self.is_public,
            category: self.category,
            image_url: self.image_url,
            location: self.location,
            created_by: creator.clone(),
            members: vec![creator.clone()],
            admins: vec![creator],
        }
    }
}

/// Field-by-field club update.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClubPatch {
    #[serde(default, skip_serializing_if = "Patch::is_keep")]
    pub name: Patch<String>,
    #[serde(default, skip_serializing_if = "Patch::is_keep")]
    pub description: Patch<String>,
    #[serde(default, skip_serializing_if = "Patch::is_keep")]
    pub is_public: Patch<bool>,
    #[serde(default, skip_serializing_if = "Patch::is_keep")]
    pub category: Patch<String>,
    #[serde(default, skip_serializing_if = "Patch::is_keep")]
    pub image_url: Patch<String>,
    #[serde(default, skip_serializing_if = "Patch::is_keep")]
    pub location: Patch<String>,
}

/// Lifecycle of a join request for a private club.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JoinRequestStatus {
    Pending,
    Approved,
    Declined,
}

/// Stored join-request fields.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct JoinRequestFields {
    pub club_id: ClubId,
    pub user_id: UserId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    pub status: JoinRequestStatus,
}

/// A pending request to join a private club.
#[derive(Debug, Clone)]
pub struct JoinRequest {
    pub id: JoinRequestId,
    pub created_at: DateTime<Utc>,
    pub club_id: ClubId,
    pub user_id: UserId,
    pub message: Option<String>,
    pub status: JoinRequestStatus,
}

impl JoinRequest {
    pub(crate) fn from_doc(doc: Document<JoinRequestFields>) -> Self {
        let f = doc.fields;
        Self {
            id: JoinRequestId::new(doc.id.as_str()),
            created_at: doc.created_at,
            club_id: f.club_id,
            user_id: f.user_id,
            message: f.message,
            status: f.status,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_new_club_renames_to_storage_vocabulary() {
        let new = NewClub {
            title: "Trail Runners".to_string(),
            about: None,
            is_public: true,
            category: Some("running".to_string()),
            image_url: None,
            location: None,
        };
        let fields = new.into_fields(UserId::new("u_1"));
        let json = serde_json::to_value(&fields).unwrap();

        assert_eq!(json["name"], "Trail Runners");
        assert_eq!(json["isPublic"], true);
        assert_eq!(json["createdBy"], "u_1");
        assert_eq!(json["members"], serde_json::json!(["u_1"]));
        assert_eq!(json["admins"], serde_json::json!(["u_1"]));
        // Optional fields are omitted, not serialized as null
        assert!(json.get("description").is_none());
        assert!(json.get("imageUrl").is_none());
    }

    #[test]
    fn test_club_fields_accepts_legacy_names() {
        let json = r#"{
            "title": "Chess Society",
            "public": true,
            "photoUrl": "https://img.example/c.jpg",
            "creatorId": "u_2"
        }"#;
        let fields: ClubFields = serde_json::from_str(json).unwrap();
        assert_eq!(fields.name, "Chess Society");
        assert!(fields.is_public);
        assert_eq!(fields.image_url.as_deref(), Some("https://img.example/c.jpg"));
        assert_eq!(fields.created_by, UserId::new("u_2"));
        assert!(fields.members.is_empty());
    }

    #[test]
    fn test_club_patch_distinguishes_clear_from_keep() {
        let patch = ClubPatch {
            description: Patch::Clear,
            is_public: Patch::Set(false),
            ..ClubPatch::default()
        };
        let json = serde_json::to_string(&patch).unwrap();
        assert_eq!(json, r#"{"description":null,"isPublic":false}"#);
    }
}
