//! The client context object.
//!
//! The original mobile layer kept initialized app/auth/db/storage handles
//! in global singletons. Here the handles live in one explicitly
//! constructed [`Client`] that every backend operation borrows; there is
//! no global state and teardown is drop.

use std::sync::Arc;
use std::time::Duration;

use moka::future::Cache;
use reqwest::header::{HeaderMap, HeaderValue};
use secrecy::ExposeSecret;

use rallypoint_core::UserId;

use crate::auth::AuthClient;
use crate::error::{ClientError, Result};
use crate::blobs::BlobStore;
use crate::clubs::Clubs;
use crate::config::Config;
use crate::events::Events;
use crate::featured::Featured;
use crate::images::Images;
use crate::models::UserProfile;
use crate::shop::Shop;
use crate::store::DocumentStore;
use crate::users::Users;

/// Capacity of the profile cache.
const PROFILE_CACHE_CAPACITY: u64 = 1000;
/// Profile cache TTL.
const PROFILE_CACHE_TTL: Duration = Duration::from_secs(300); // 5 minutes

/// Context object for all backend access.
///
/// Cheaply cloneable via `Arc`; construct once from [`Config`] and pass
/// it (or clones) to everything that talks to the backend.
#[derive(Clone)]
pub struct Client {
    inner: Arc<ClientInner>,
}

struct ClientInner {
    config: Config,
    store: DocumentStore,
    auth: AuthClient,
    blobs: BlobStore,
    profiles: Cache<UserId, UserProfile>,
}

impl Client {
    /// Create a new client from configuration.
    ///
    /// # Panics
    ///
    /// Panics if the API key contains invalid header characters.
    #[must_use]
    pub fn new(config: Config) -> Self {
        let mut headers = HeaderMap::new();
        headers.insert(
            "X-Api-Key",
            HeaderValue::from_str(config.api_key.expose_secret())
                .expect("Invalid API key for header"),
        );

        let http = reqwest::Client::builder()
            .default_headers(headers)
            .build()
            .expect("Failed to build HTTP client");

        let store = DocumentStore::new(http.clone(), config.collections_url());
        let auth = AuthClient::new(http.clone(), config.identity_url());
        let blobs = BlobStore::new(http, config.bucket_url());

        let profiles = Cache::builder()
            .max_capacity(PROFILE_CACHE_CAPACITY)
            .time_to_live(PROFILE_CACHE_TTL)
            .build();

        Self {
            inner: Arc::new(ClientInner {
                config,
                store,
                auth,
                blobs,
                profiles,
            }),
        }
    }

    /// Get a reference to the configuration.
    #[must_use]
    pub fn config(&self) -> &Config {
        &self.inner.config
    }

    /// Get a reference to the document store client.
    #[must_use]
    pub fn store(&self) -> &DocumentStore {
        &self.inner.store
    }

    /// Get a reference to the identity client.
    #[must_use]
    pub fn auth(&self) -> &AuthClient {
        &self.inner.auth
    }

    /// Get a reference to the blob store client.
    #[must_use]
    pub fn blobs(&self) -> &BlobStore {
        &self.inner.blobs
    }

    /// The profile cache shared by the session subscription.
    pub(crate) fn profiles(&self) -> &Cache<UserId, UserProfile> {
        &self.inner.profiles
    }

    /// The signed-in uid, or `ClientError::NotSignedIn`.
    pub(crate) fn require_uid(&self) -> Result<UserId> {
        self.inner.auth.current_uid().ok_or(ClientError::NotSignedIn)
    }

    /// Club operations.
    #[must_use]
    pub const fn clubs(&self) -> Clubs<'_> {
        Clubs::new(self)
    }

    /// Event operations.
    #[must_use]
    pub const fn events(&self) -> Events<'_> {
        Events::new(self)
    }

    /// Featured-placement operations.
    #[must_use]
    pub const fn featured(&self) -> Featured<'_> {
        Featured::new(self)
    }

    /// Store (commerce) operations.
    #[must_use]
    pub const fn shop(&self) -> Shop<'_> {
        Shop::new(self)
    }

    /// User and session operations.
    #[must_use]
    pub const fn users(&self) -> Users<'_> {
        Users::new(self)
    }

    /// Image upload/delete operations.
    #[must_use]
    pub const fn images(&self) -> Images<'_> {
        Images::new(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_is_clone_send_sync() {
        fn assert_clone<T: Clone>() {}
        fn assert_send_sync<T: Send + Sync>() {}
        assert_clone::<Client>();
        assert_send_sync::<Client>();
    }
}
