//! User profile documents and the merged session view.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use rallypoint_core::{EventId, Patch, UserId};

use super::store::ShippingAddress;
use crate::auth::AuthIdentity;
use crate::store::Document;

/// Stored user-profile fields.
///
/// The profile document is keyed by the auth uid. `name`, `avatarUrl`,
/// `likes`, and `bookmarks` are legacy names; reads accept both.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct UserProfileFields {
    #[serde(default, skip_serializing_if = "Option::is_none", alias = "name")]
    pub display_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none", alias = "avatarUrl")]
    pub photo_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bio: Option<String>,
    #[serde(default, alias = "likes")]
    pub liked_events: Vec<EventId>,
    #[serde(default, alias = "bookmarks")]
    pub bookmarked_events: Vec<EventId>,
    #[serde(default)]
    pub addresses: Vec<ShippingAddress>,
}

/// A user's extended profile document.
#[derive(Debug, Clone)]
pub struct UserProfile {
    pub uid: UserId,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub display_name: Option<String>,
    pub email: Option<String>,
    pub photo_url: Option<String>,
    pub bio: Option<String>,
    pub liked_events: Vec<EventId>,
    pub bookmarked_events: Vec<EventId>,
    pub addresses: Vec<ShippingAddress>,
}

impl UserProfile {
    pub(crate) fn from_doc(doc: Document<UserProfileFields>) -> Self {
        let f = doc.fields;
        Self {
            uid: UserId::new(doc.id.as_str()),
            created_at: doc.created_at,
            updated_at: doc.updated_at,
            display_name: f.display_name,
            email: f.email,
            photo_url: f.photo_url,
            bio: f.bio,
            liked_events: f.liked_events,
            bookmarked_events: f.bookmarked_events,
            addresses: f.addresses,
        }
    }
}

/// Field-by-field profile update.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfilePatch {
    #[serde(default, skip_serializing_if = "Patch::is_keep")]
    pub display_name: Patch<String>,
    #[serde(default, skip_serializing_if = "Patch::is_keep")]
    pub photo_url: Patch<String>,
    #[serde(default, skip_serializing_if = "Patch::is_keep")]
    pub bio: Patch<String>,
}

/// The signed-in user as the UI consumes it: base identity merged with the
/// extended profile document.
///
/// `profile` is `None` when the profile fetch failed; the bare identity is
/// still usable.
#[derive(Debug, Clone)]
pub struct SessionUser {
    pub uid: UserId,
    pub email: String,
    pub display_name: Option<String>,
    pub photo_url: Option<String>,
    pub profile: Option<UserProfile>,
}

impl SessionUser {
    /// Merge the base identity with a fetched profile.
    ///
    /// Profile values win for display name and photo; the identity is the
    /// fallback when the profile is missing a field (or missing entirely).
    pub(crate) fn merge(identity: &AuthIdentity, profile: Option<UserProfile>) -> Self {
        let display_name = profile
            .as_ref()
            .and_then(|p| p.display_name.clone())
            .or_else(|| identity.display_name.clone());
        let photo_url = profile
            .as_ref()
            .and_then(|p| p.photo_url.clone())
            .or_else(|| identity.photo_url.clone());

        Self {
            uid: identity.uid.clone(),
            email: identity.email.clone(),
            display_name,
            photo_url,
            profile,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use secrecy::SecretString;

    fn identity() -> AuthIdentity {
        AuthIdentity {
            uid: UserId::new("u_1"),
            email: "robin@example.com".to_string(),
            display_name: Some("robin".to_string()),
            photo_url: None,
            id_token: SecretString::from("tok"),
            refresh_token: SecretString::from("ref"),
        }
    }

    fn profile() -> UserProfile {
        UserProfile {
            uid: UserId::new("u_1"),
            created_at: Utc::now(),
            updated_at: Utc::now(),
            display_name: Some("Robin Okafor".to_string()),
            email: Some("robin@example.com".to_string()),
            photo_url: Some("https://img.example/r.jpg".to_string()),
            bio: None,
            liked_events: Vec::new(),
            bookmarked_events: Vec::new(),
            addresses: Vec::new(),
        }
    }

    #[test]
    fn test_merge_prefers_profile_values() {
        let merged = SessionUser::merge(&identity(), Some(profile()));
        assert_eq!(merged.display_name.as_deref(), Some("Robin Okafor"));
        assert_eq!(merged.photo_url.as_deref(), Some("https://img.example/r.jpg"));
        assert!(merged.profile.is_some());
    }

    #[test]
    fn test_merge_falls_back_to_identity() {
        let merged = SessionUser::merge(&identity(), None);
        assert_eq!(merged.display_name.as_deref(), Some("robin"));
        assert!(merged.photo_url.is_none());
        assert!(merged.profile.is_none());
    }

    #[test]
    fn test_profile_fields_accepts_legacy_names() {
        let json = r#"{
            "name": "Robin",
            "avatarUrl": "https://img.example/r.jpg",
            "likes": ["e_1"],
            "bookmarks": ["e_2", "e_3"]
        }"#;
        let fields: UserProfileFields = serde_json::from_str(json).unwrap();
        assert_eq!(fields.display_name.as_deref(), Some("Robin"));
        assert_eq!(fields.liked_events, vec![EventId::new("e_1")]);
        assert_eq!(fields.bookmarked_events.len(), 2);
    }
}
