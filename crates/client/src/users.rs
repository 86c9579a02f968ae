//! User, profile, and session operations.

use tracing::{debug, instrument, warn};

use rallypoint_core::{Email, UserId};

use crate::client::Client;
use crate::error::{ClientError, Result};
use crate::models::{ProfilePatch, SessionUser, UserProfile, UserProfileFields};
use crate::store::collections;
use crate::subscription::Subscription;

/// User and session operations, borrowed from a [`Client`].
pub struct Users<'a> {
    client: &'a Client,
}

impl<'a> Users<'a> {
    pub(crate) const fn new(client: &'a Client) -> Self {
        Self { client }
    }

    /// Create an account: credential, display name, and the matching
    /// profile document (keyed by the new uid), in that order.
    ///
    /// # Errors
    ///
    /// Surfaces the first failing step. If the profile write fails the
    /// credential already exists; a retry will sign in and may re-create
    /// the profile.
    #[instrument(skip(self, password), fields(email = %email))]
    pub async fn sign_up(
        &self,
        email: &Email,
        password: &str,
        display_name: &str,
    ) -> Result<SessionUser> {
        self.client.auth().sign_up(email, password).await?;
        let identity = self
            .client
            .auth()
            .update_profile(Some(display_name), None)
            .await?;

        let fields = UserProfileFields {
            display_name: Some(display_name.to_string()),
            email: Some(email.as_str().to_string()),
            ..UserProfileFields::default()
        };
        let doc = self
            .client
            .store()
            .put(collections::USERS, identity.uid.as_str(), &fields)
            .await?;

        let profile = UserProfile::from_doc(doc);
        self.client
            .profiles()
            .insert(identity.uid.clone(), profile.clone())
            .await;

        Ok(SessionUser::merge(&identity, Some(profile)))
    }

    /// Sign in and merge the extended profile with the base identity.
    ///
    /// A failing profile fetch falls back to the bare identity rather
    /// than failing the sign-in.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidCredentials` (wrapped) when the
    /// email/password pair is rejected.
    #[instrument(skip(self, password), fields(email = %email))]
    pub async fn sign_in(&self, email: &Email, password: &str) -> Result<SessionUser> {
        let identity = self.client.auth().sign_in(email, password).await?;

        let profile = match fetch_profile(self.client, &identity.uid).await {
            Ok(profile) => Some(profile),
            Err(e) => {
                warn!(uid = %identity.uid, error = %e, "profile fetch failed, using bare identity");
                None
            }
        };

        Ok(SessionUser::merge(&identity, profile))
    }

    /// Sign out: drops the session client-side and notifies subscribers.
    pub fn sign_out(&self) {
        self.client.auth().sign_out();
    }

    /// Read a user's extended profile (cached for five minutes).
    ///
    /// # Errors
    ///
    /// Returns `ClientError::NotFound` when the profile document does not
    /// exist.
    #[instrument(skip(self), fields(user = %uid))]
    pub async fn profile(&self, uid: &UserId) -> Result<UserProfile> {
        fetch_profile(self.client, uid).await
    }

    /// Apply a field-by-field update to the signed-in user's profile.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::NotSignedIn` without a session.
    #[instrument(skip(self, patch))]
    pub async fn update_profile(&self, patch: ProfilePatch) -> Result<()> {
        let uid = self.client.require_uid()?;
        self.client
            .store()
            .patch(collections::USERS, uid.as_str(), &patch)
            .await
            .map_err(|e| ClientError::from_store(e, || format!("profile for {uid}")))?;

        // The cached copy is stale now
        self.client.profiles().invalidate(&uid).await;
        Ok(())
    }

    /// Subscribe to auth-state changes.
    ///
    /// The callback fires with the current state immediately, then on
    /// every sign-in, profile update, and sign-out. On each change the
    /// extended profile is fetched (through the cache) and merged with
    /// the base identity; if the fetch fails, the callback still fires
    /// with the bare identity.
    pub fn watch_session(
        &self,
        mut on_change: impl FnMut(Option<SessionUser>) + Send + 'static,
    ) -> Subscription {
        let client = self.client.clone();
        Subscription::spawn(async move {
            let mut rx = client.auth().subscribe();
            loop {
                let identity = rx.borrow_and_update().clone();
                let session = match identity {
                    Some(identity) => {
                        let profile = match fetch_profile(&client, &identity.uid).await {
                            Ok(profile) => Some(profile),
                            Err(e) => {
                                warn!(uid = %identity.uid, error = %e,
                                    "profile fetch failed, using bare identity");
                                None
                            }
                        };
                        Some(SessionUser::merge(&identity, profile))
                    }
                    None => None,
                };
                on_change(session);

                if rx.changed().await.is_err() {
                    debug!("auth channel closed, session watch ending");
                    break;
                }
            }
        })
    }
}

/// Fetch a profile through the client's cache.
async fn fetch_profile(client: &Client, uid: &UserId) -> Result<UserProfile> {
    if let Some(cached) = client.profiles().get(uid).await {
        return Ok(cached);
    }

    let doc = client
        .store()
        .get::<UserProfileFields>(collections::USERS, uid.as_str())
        .await
        .map_err(|e| ClientError::from_store(e, || format!("profile for {uid}")))?;

    let profile = UserProfile::from_doc(doc);
    client.profiles().insert(uid.clone(), profile.clone()).await;
    Ok(profile)
}
