//! Identity provider client and session state.
//!
//! Credential verification is the hosted identity provider's job; this
//! client only exchanges email/password for an identity, keeps the current
//! session in a watch channel, and exposes the auth-state-change
//! subscription the mobile frontends build on. Sign-out is client-side:
//! the session is dropped, no request is made.

use secrecy::{ExposeSecret, SecretString};
use thiserror::Error;
use tokio::sync::watch;
use tracing::{debug, instrument};

use rallypoint_core::{Email, UserId};

/// Errors that can occur when interacting with the identity provider.
#[derive(Debug, Error)]
pub enum AuthError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Email/password did not match an account.
    #[error("invalid email or password")]
    InvalidCredentials,

    /// An account with this email already exists.
    #[error("an account with this email already exists")]
    UserAlreadyExists,

    /// The password was rejected as too weak.
    #[error("weak password: {0}")]
    WeakPassword(String),

    /// No user is signed in.
    #[error("not signed in")]
    NotSignedIn,

    /// The identity provider returned an error.
    #[error("identity error ({code}): {message}")]
    Api {
        /// Error code from the provider.
        code: String,
        /// Error message.
        message: String,
    },

    /// Failed to parse a response body.
    #[error("parse error: {0}")]
    Parse(String),
}

/// The signed-in identity as the provider reports it.
///
/// Implements `Debug` manually to redact tokens.
#[derive(Clone)]
pub struct AuthIdentity {
    /// Provider-assigned user id.
    pub uid: UserId,
    /// Account email.
    pub email: String,
    /// Display name, if set.
    pub display_name: Option<String>,
    /// Avatar URL, if set.
    pub photo_url: Option<String>,
    /// Bearer token for authenticated calls.
    pub id_token: SecretString,
    /// Token used to refresh the session.
    pub refresh_token: SecretString,
}

impl std::fmt::Debug for AuthIdentity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthIdentity")
            .field("uid", &self.uid)
            .field("email", &self.email)
            .field("display_name", &self.display_name)
            .field("photo_url", &self.photo_url)
            .field("id_token", &"[REDACTED]")
            .field("refresh_token", &"[REDACTED]")
            .finish()
    }
}

/// Wire shape of the provider's account endpoints.
#[derive(Debug, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
struct AccountResponse {
    uid: String,
    email: String,
    #[serde(default)]
    display_name: Option<String>,
    #[serde(default)]
    photo_url: Option<String>,
    id_token: String,
    refresh_token: String,
}

impl From<AccountResponse> for AuthIdentity {
    fn from(account: AccountResponse) -> Self {
        Self {
            uid: UserId::new(account.uid),
            email: account.email,
            display_name: account.display_name,
            photo_url: account.photo_url,
            id_token: SecretString::from(account.id_token),
            refresh_token: SecretString::from(account.refresh_token),
        }
    }
}

/// Error envelope returned by the identity provider.
#[derive(Debug, serde::Deserialize)]
struct IdentityErrorBody {
    error: IdentityErrorDetail,
}

#[derive(Debug, serde::Deserialize)]
struct IdentityErrorDetail {
    code: String,
    message: String,
}

/// Client for the hosted identity provider.
#[derive(Debug, Clone)]
pub struct AuthClient {
    http: reqwest::Client,
    base: String,
    session: watch::Sender<Option<AuthIdentity>>,
}

impl AuthClient {
    /// Create a new identity client with no signed-in session.
    #[must_use]
    pub fn new(http: reqwest::Client, base: String) -> Self {
        let (session, _) = watch::channel(None);
        Self {
            http,
            base,
            session,
        }
    }

    /// The currently signed-in identity, if any.
    #[must_use]
    pub fn current(&self) -> Option<AuthIdentity> {
        self.session.borrow().clone()
    }

    /// The currently signed-in user id, if any.
    #[must_use]
    pub fn current_uid(&self) -> Option<UserId> {
        self.session.borrow().as_ref().map(|id| id.uid.clone())
    }

    /// Subscribe to auth-state changes.
    ///
    /// The receiver observes every sign-in, profile update, and sign-out.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<Option<AuthIdentity>> {
        self.session.subscribe()
    }

    /// Create a new credential.
    ///
    /// On success the new identity becomes the current session.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::UserAlreadyExists` or `AuthError::WeakPassword`
    /// when the provider rejects the credential, or a transport/API error.
    #[instrument(skip(self, password), fields(email = %email))]
    pub async fn sign_up(&self, email: &Email, password: &str) -> Result<AuthIdentity, AuthError> {
        let identity = self
            .account_call(
                "accounts:signUp",
                &serde_json::json!({
                    "email": email.as_str(),
                    "password": password,
                }),
            )
            .await?;

        self.session.send_replace(Some(identity.clone()));
        debug!(uid = %identity.uid, "signed up");
        Ok(identity)
    }

    /// Sign in with email and password.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidCredentials` when the email/password pair
    /// is rejected, or a transport/API error.
    #[instrument(skip(self, password), fields(email = %email))]
    pub async fn sign_in(&self, email: &Email, password: &str) -> Result<AuthIdentity, AuthError> {
        let identity = self
            .account_call(
                "accounts:signInWithPassword",
                &serde_json::json!({
                    "email": email.as_str(),
                    "password": password,
                }),
            )
            .await?;

        self.session.send_replace(Some(identity.clone()));
        debug!(uid = %identity.uid, "signed in");
        Ok(identity)
    }

    /// Update the display name and/or photo URL on the current session.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::NotSignedIn` when no session is active, or a
    /// transport/API error.
    #[instrument(skip(self))]
    pub async fn update_profile(
        &self,
        display_name: Option<&str>,
        photo_url: Option<&str>,
    ) -> Result<AuthIdentity, AuthError> {
        let current = self.current().ok_or(AuthError::NotSignedIn)?;

        let mut body = serde_json::json!({
            "idToken": current.id_token.expose_secret(),
        });
        if let Some(name) = display_name {
            body["displayName"] = serde_json::Value::String(name.to_string());
        }
        if let Some(url) = photo_url {
            body["photoUrl"] = serde_json::Value::String(url.to_string());
        }

        let identity = self.account_call("accounts:update", &body).await?;
        self.session.send_replace(Some(identity.clone()));
        Ok(identity)
    }

    /// Sign out.
    ///
    /// Client-side only: drops the session and notifies subscribers.
    pub fn sign_out(&self) {
        self.session.send_replace(None);
        debug!("signed out");
    }

    /// POST one account endpoint and decode the identity.
    async fn account_call(
        &self,
        endpoint: &str,
        body: &serde_json::Value,
    ) -> Result<AuthIdentity, AuthError> {
        let url = format!("{}/{endpoint}", self.base);
        let response = self.http.post(url).json(body).send().await?;

        let status = response.status();
        let text = response.text().await?;
        if !status.is_success() {
            return Err(decode_error(status, &text));
        }

        let account: AccountResponse = serde_json::from_str(&text)
            .map_err(|e| AuthError::Parse(format!("account response: {e}")))?;
        Ok(account.into())
    }
}

/// Map an error status and body to an `AuthError`.
fn decode_error(status: reqwest::StatusCode, body: &str) -> AuthError {
    let Ok(envelope) = serde_json::from_str::<IdentityErrorBody>(body) else {
        return AuthError::Api {
            code: "unknown".to_string(),
            message: format!("HTTP {status}"),
        };
    };

    match envelope.error.code.as_str() {
        "EMAIL_EXISTS" => AuthError::UserAlreadyExists,
        "INVALID_LOGIN_CREDENTIALS" | "INVALID_PASSWORD" | "EMAIL_NOT_FOUND" => {
            AuthError::InvalidCredentials
        }
        "WEAK_PASSWORD" => AuthError::WeakPassword(envelope.error.message),
        _ => AuthError::Api {
            code: envelope.error.code,
            message: envelope.error.message,
        },
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn test_client() -> AuthClient {
        AuthClient::new(
            reqwest::Client::new(),
            "https://cloud.rallypoint.app/v1/identity".to_string(),
        )
    }

    fn test_identity() -> AuthIdentity {
        AuthIdentity {
            uid: UserId::new("u_1"),
            email: "member@example.com".to_string(),
            display_name: Some("Robin".to_string()),
            photo_url: None,
            id_token: SecretString::from("tok_d41d8cd98f"),
            refresh_token: SecretString::from("ref_98f00b204e"),
        }
    }

    #[test]
    fn test_session_starts_empty() {
        let client = test_client();
        assert!(client.current().is_none());
        assert!(client.current_uid().is_none());
    }

    #[test]
    fn test_sign_out_notifies_subscribers() {
        let client = test_client();
        let rx = client.subscribe();

        client.session.send_replace(Some(test_identity()));
        assert_eq!(client.current_uid(), Some(UserId::new("u_1")));

        client.sign_out();
        assert!(client.current().is_none());
        assert!(rx.borrow().is_none());
    }

    #[test]
    fn test_identity_debug_redacts_tokens() {
        let debug_output = format!("{:?}", test_identity());
        assert!(debug_output.contains("[REDACTED]"));
        assert!(!debug_output.contains("tok_d41d8cd98f"));
        assert!(!debug_output.contains("ref_98f00b204e"));
    }

    #[test]
    fn test_decode_error_mapping() {
        let err = decode_error(
            reqwest::StatusCode::BAD_REQUEST,
            r#"{"error":{"code":"EMAIL_EXISTS","message":"email exists"}}"#,
        );
        assert!(matches!(err, AuthError::UserAlreadyExists));

        let err = decode_error(
            reqwest::StatusCode::BAD_REQUEST,
            r#"{"error":{"code":"INVALID_LOGIN_CREDENTIALS","message":"bad login"}}"#,
        );
        assert!(matches!(err, AuthError::InvalidCredentials));

        let err = decode_error(
            reqwest::StatusCode::BAD_REQUEST,
            r#"{"error":{"code":"WEAK_PASSWORD","message":"too short"}}"#,
        );
        assert!(matches!(err, AuthError::WeakPassword(ref m) if m == "too short"));
    }

    #[test]
    fn test_account_response_deserializes() {
        let json = r#"{
            "uid": "u_9",
            "email": "member@example.com",
            "displayName": "Robin",
            "idToken": "tok",
            "refreshToken": "ref"
        }"#;
        let account: AccountResponse = serde_json::from_str(json).unwrap();
        assert_eq!(account.uid, "u_9");
        assert_eq!(account.display_name.as_deref(), Some("Robin"));
        assert!(account.photo_url.is_none());
    }
}
