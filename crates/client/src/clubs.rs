//! Club operations.

use serde_json::json;
use tracing::instrument;

use rallypoint_core::{ClubId, JoinRequestId, UserId};

use crate::client::Client;
use crate::error::{ClientError, Result};
use crate::models::{Club, ClubPatch, JoinRequest, JoinRequestFields, JoinRequestStatus, NewClub};
use crate::store::{Query, collections};

/// What happened when a user asked to join a club.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JoinOutcome {
    /// Public club: the user was added to the member set directly.
    Joined,
    /// Private club: a pending join request was created instead.
    Requested(JoinRequestId),
}

/// Club operations, borrowed from a [`Client`].
pub struct Clubs<'a> {
    client: &'a Client,
}

impl<'a> Clubs<'a> {
    pub(crate) const fn new(client: &'a Client) -> Self {
        Self { client }
    }

    /// Create a club owned by the signed-in user.
    ///
    /// The member and admin sets start with the creator, so the member-set
    /// invariant (always contains the creator) holds from the first write.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::NotSignedIn` without a session, or a store
    /// error.
    #[instrument(skip(self, new), fields(title = %new.title))]
    pub async fn create(&self, new: NewClub) -> Result<Club> {
        let uid = self.client.require_uid()?;
        let fields = new.into_fields(uid);
        let doc = self
            .client
            .store()
            .create(collections::CLUBS, &fields)
            .await?;
        Ok(Club::from_doc(doc))
    }

    /// Read one club.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::NotFound` when the club does not exist.
    #[instrument(skip(self), fields(club = %id))]
    pub async fn get(&self, id: &ClubId) -> Result<Club> {
        let doc = self
            .client
            .store()
            .get(collections::CLUBS, id.as_str())
            .await
            .map_err(|e| ClientError::from_store(e, || format!("club {id}")))?;
        Ok(Club::from_doc(doc))
    }

    /// List clubs anyone can browse, sorted by name client-side.
    ///
    /// # Errors
    ///
    /// Returns a store error; callers rendering an empty state can
    /// `unwrap_or_default()`.
    #[instrument(skip(self))]
    pub async fn list_public(&self) -> Result<Vec<Club>> {
        let docs = self
            .client
            .store()
            .query(collections::CLUBS, &Query::all().filter_eq("isPublic", true))
            .await?;
        let mut clubs: Vec<Club> = docs.into_iter().map(Club::from_doc).collect();
        sort_by_name(&mut clubs);
        Ok(clubs)
    }

    /// List clubs the user is a member of, sorted by name client-side.
    ///
    /// # Errors
    ///
    /// Returns a store error.
    #[instrument(skip(self), fields(user = %user))]
    pub async fn list_joined(&self, user: &UserId) -> Result<Vec<Club>> {
        let docs = self
            .client
            .store()
            .query(
                collections::CLUBS,
                &Query::all().filter_array_contains("members", user.as_str()),
            )
            .await?;
        let mut clubs: Vec<Club> = docs.into_iter().map(Club::from_doc).collect();
        sort_by_name(&mut clubs);
        Ok(clubs)
    }

    /// Apply a field-by-field update.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::NotFound` when the club does not exist.
    #[instrument(skip(self, patch), fields(club = %id))]
    pub async fn update(&self, id: &ClubId, patch: ClubPatch) -> Result<()> {
        self.client
            .store()
            .patch(collections::CLUBS, id.as_str(), &patch)
            .await
            .map_err(|e| ClientError::from_store(e, || format!("club {id}")))
    }

    /// Join a club as the signed-in user.
    ///
    /// Public clubs add the user to the member set directly; private clubs
    /// get a pending join request instead. Joining a club the user is
    /// already a member of fails without writing anything.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::Conflict` when already a member.
    #[instrument(skip(self), fields(club = %id))]
    pub async fn join(&self, id: &ClubId) -> Result<JoinOutcome> {
        let uid = self.client.require_uid()?;
        let club = self.get(id).await?;

        if club.is_member(&uid) {
            return Err(ClientError::Conflict(
                "already a member of this club".to_string(),
            ));
        }

        if club.is_public {
            // Read-then-write on the member array; concurrent joins can
            // drop one another's entry.
            let mut members = club.members;
            members.push(uid);
            self.client
                .store()
                .patch(collections::CLUBS, id.as_str(), &json!({ "members": members }))
                .await?;
            return Ok(JoinOutcome::Joined);
        }

        let fields = JoinRequestFields {
            club_id: id.clone(),
            user_id: uid,
            message: None,
            status: JoinRequestStatus::Pending,
        };
        let doc = self
            .client
            .store()
            .create::<_, JoinRequestFields>(collections::CLUB_JOIN_REQUESTS, &fields)
            .await?;
        Ok(JoinOutcome::Requested(JoinRequestId::new(doc.id.as_str())))
    }

    /// Leave a club: removes the user from the member and admin sets.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::NotFound` when the club does not exist.
    #[instrument(skip(self), fields(club = %id))]
    pub async fn leave(&self, id: &ClubId) -> Result<()> {
        let uid = self.client.require_uid()?;
        let club = self.get(id).await?;

        let members: Vec<UserId> = club.members.into_iter().filter(|m| *m != uid).collect();
        let admins: Vec<UserId> = club.admins.into_iter().filter(|a| *a != uid).collect();

        self.client
            .store()
            .patch(
                collections::CLUBS,
                id.as_str(),
                &json!({ "members": members, "admins": admins }),
            )
            .await?;
        Ok(())
    }

    /// Pending join requests for a club.
    ///
    /// # Errors
    ///
    /// Returns a store error.
    #[instrument(skip(self), fields(club = %club))]
    pub async fn pending_requests(&self, club: &ClubId) -> Result<Vec<JoinRequest>> {
        let docs = self
            .client
            .store()
            .query(
                collections::CLUB_JOIN_REQUESTS,
                &Query::all()
                    .filter_eq("clubId", club.as_str())
                    .filter_eq("status", "pending"),
            )
            .await?;
        Ok(docs.into_iter().map(JoinRequest::from_doc).collect())
    }

    /// Approve a pending join request, adding the requester to the member
    /// set.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::Conflict` when the request is not pending.
    #[instrument(skip(self), fields(request = %id))]
    pub async fn approve_join_request(&self, id: &JoinRequestId) -> Result<()> {
        let doc = self
            .client
            .store()
            .get::<JoinRequestFields>(collections::CLUB_JOIN_REQUESTS, id.as_str())
            .await
            .map_err(|e| ClientError::from_store(e, || format!("join request {id}")))?;
        let request = JoinRequest::from_doc(doc);

        if request.status != JoinRequestStatus::Pending {
            return Err(ClientError::Conflict(
                "join request already resolved".to_string(),
            ));
        }

        let club = self.get(&request.club_id).await?;
        if !club.is_member(&request.user_id) {
            let mut members = club.members;
            members.push(request.user_id.clone());
            self.client
                .store()
                .patch(
                    collections::CLUBS,
                    request.club_id.as_str(),
                    &json!({ "members": members }),
                )
                .await?;
        }

        self.client
            .store()
            .patch(
                collections::CLUB_JOIN_REQUESTS,
                id.as_str(),
                &json!({ "status": JoinRequestStatus::Approved }),
            )
            .await?;
        Ok(())
    }

    /// Decline a pending join request.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::NotFound` when the request does not exist.
    #[instrument(skip(self), fields(request = %id))]
    pub async fn decline_join_request(&self, id: &JoinRequestId) -> Result<()> {
        self.client
            .store()
            .patch(
                collections::CLUB_JOIN_REQUESTS,
                id.as_str(),
                &json!({ "status": JoinRequestStatus::Declined }),
            )
            .await
            .map_err(|e| ClientError::from_store(e, || format!("join request {id}")))
    }

    /// Delete a club. Only the creator may delete.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::Conflict` when the signed-in user is not the
    /// creator.
    #[instrument(skip(self), fields(club = %id))]
    pub async fn delete(&self, id: &ClubId) -> Result<()> {
        let uid = self.client.require_uid()?;
        let club = self.get(id).await?;

        if club.created_by != uid {
            return Err(ClientError::Conflict(
                "only the club creator can delete it".to_string(),
            ));
        }

        self.client
            .store()
            .delete(collections::CLUBS, id.as_str())
            .await?;
        Ok(())
    }
}

/// Case-insensitive name sort; the store applies no ordering.
fn sort_by_name(clubs: &mut [Club]) {
    clubs.sort_by(|a, b| {
        a.name
            .to_lowercase()
            .cmp(&b.name.to_lowercase())
            .then_with(|| a.id.cmp(&b.id))
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    fn club(id: &str, name: &str) -> Club {
        Club {
            id: ClubId::new(id),
            created_at: chrono::Utc::now(),
            updated_at: chrono::Utc::now(),
            name: name.to_string(),
            description: None,
            is_public: true,
            category: None,
            image_url: None,
            location: None,
            created_by: UserId::new("u_1"),
            members: vec![UserId::new("u_1")],
            admins: vec![UserId::new("u_1")],
        }
    }

    #[test]
    fn test_sort_by_name_is_case_insensitive() {
        let mut clubs = vec![club("c_3", "swim team"), club("c_1", "Archery"), club("c_2", "chess")];
        sort_by_name(&mut clubs);
        let names: Vec<&str> = clubs.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["Archery", "chess", "swim team"]);
    }

    #[test]
    fn test_join_outcome_eq() {
        assert_eq!(JoinOutcome::Joined, JoinOutcome::Joined);
        assert_ne!(
            JoinOutcome::Joined,
            JoinOutcome::Requested(JoinRequestId::new("r_1"))
        );
    }
}
