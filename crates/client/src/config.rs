//! Client configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `RALLYPOINT_API_KEY` - Backend API key (secret)
//! - `RALLYPOINT_PROJECT_ID` - Hosted backend project identifier
//! - `RALLYPOINT_STORAGE_BUCKET` - Blob storage bucket name
//! - `RALLYPOINT_SENDER_ID` - Push-messaging sender id
//! - `RALLYPOINT_APP_ID` - Application identifier issued by the backend
//!
//! ## Optional
//! - `RALLYPOINT_API_BASE` - Backend base URL
//!   (default: `https://cloud.rallypoint.app`)
//! - `RALLYPOINT_CART_PATH` - Local cart persistence file
//!   (default: `<data dir>/rallypoint/cart.json`)

use std::path::PathBuf;

use secrecy::SecretString;
use thiserror::Error;

/// Default backend base URL.
const DEFAULT_API_BASE: &str = "https://cloud.rallypoint.app";

/// Configuration errors that can occur during loading.
///
/// A missing required variable is fatal at startup; nothing else in this
/// layer is.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Rallypoint client configuration.
///
/// Implements `Debug` manually to redact the API key.
#[derive(Clone)]
pub struct Config {
    /// Backend API key, sent as `X-Api-Key` on every request.
    pub api_key: SecretString,
    /// Hosted backend project identifier.
    pub project_id: String,
    /// Blob storage bucket name.
    pub storage_bucket: String,
    /// Push-messaging sender id (carried for push registration; not used
    /// by this layer directly).
    pub sender_id: String,
    /// Application identifier issued by the backend.
    pub app_id: String,
    /// Backend base URL.
    pub api_base: String,
    /// Local cart persistence file.
    pub cart_path: PathBuf,
}

impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("api_key", &"[REDACTED]")
            .field("project_id", &self.project_id)
            .field("storage_bucket", &self.storage_bucket)
            .field("sender_id", &self.sender_id)
            .field("app_id", &self.app_id)
            .field("api_base", &self.api_base)
            .field("cart_path", &self.cart_path)
            .finish()
    }
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::MissingEnvVar` if a required variable is
    /// absent. Missing configuration is the only fatal startup condition
    /// in this layer.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        Ok(Self {
            api_key: get_required_secret("RALLYPOINT_API_KEY")?,
            project_id: get_required_env("RALLYPOINT_PROJECT_ID")?,
            storage_bucket: get_required_env("RALLYPOINT_STORAGE_BUCKET")?,
            sender_id: get_required_env("RALLYPOINT_SENDER_ID")?,
            app_id: get_required_env("RALLYPOINT_APP_ID")?,
            api_base: get_env_or_default("RALLYPOINT_API_BASE", DEFAULT_API_BASE),
            cart_path: get_optional_env("RALLYPOINT_CART_PATH")
                .map_or_else(default_cart_path, PathBuf::from),
        })
    }

    /// Base URL for the project's document collections.
    #[must_use]
    pub fn collections_url(&self) -> String {
        format!(
            "{}/v1/projects/{}/collections",
            self.api_base, self.project_id
        )
    }

    /// Base URL for the identity provider.
    #[must_use]
    pub fn identity_url(&self) -> String {
        format!("{}/v1/identity", self.api_base)
    }

    /// Base URL for the project's blob storage bucket.
    #[must_use]
    pub fn bucket_url(&self) -> String {
        format!(
            "{}/v1/projects/{}/buckets/{}",
            self.api_base, self.project_id, self.storage_bucket
        )
    }
}

/// Default cart persistence path under the user's data directory.
fn default_cart_path() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("rallypoint")
        .join("cart.json")
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Get a required environment variable.
fn get_required_env(key: &str) -> Result<String, ConfigError> {
    std::env::var(key).map_err(|_| ConfigError::MissingEnvVar(key.to_string()))
}

/// Get a required environment variable as a secret.
fn get_required_secret(key: &str) -> Result<SecretString, ConfigError> {
    let value = get_required_env(key)?;
    Ok(SecretString::from(value))
}

/// Get an optional environment variable.
fn get_optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok()
}

/// Get an environment variable with a default value.
fn get_env_or_default(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn test_config() -> Config {
        Config {
            api_key: SecretString::from("rk_test_5f2d8a91c44e"),
            project_id: "demo-project".to_string(),
            storage_bucket: "demo-media".to_string(),
            sender_id: "513778241".to_string(),
            app_id: "1:513778241:app:9bd2f7".to_string(),
            api_base: "https://cloud.rallypoint.app".to_string(),
            cart_path: PathBuf::from("/tmp/cart.json"),
        }
    }

    #[test]
    fn test_collections_url() {
        assert_eq!(
            test_config().collections_url(),
            "https://cloud.rallypoint.app/v1/projects/demo-project/collections"
        );
    }

    #[test]
    fn test_identity_url() {
        assert_eq!(
            test_config().identity_url(),
            "https://cloud.rallypoint.app/v1/identity"
        );
    }

    #[test]
    fn test_bucket_url() {
        assert_eq!(
            test_config().bucket_url(),
            "https://cloud.rallypoint.app/v1/projects/demo-project/buckets/demo-media"
        );
    }

    #[test]
    fn test_debug_redacts_api_key() {
        let debug_output = format!("{:?}", test_config());
        assert!(debug_output.contains("[REDACTED]"));
        assert!(!debug_output.contains("rk_test_5f2d8a91c44e"));
        assert!(debug_output.contains("demo-project"));
    }
}
