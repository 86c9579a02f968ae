//! Unified error handling for the data-access layer.
//!
//! Every exported operation returns [`Result`]. Nothing here panics: all
//! underlying failures are caught and mapped to a `ClientError` whose
//! `Display` is a human-readable message suitable for the UI. Read-many
//! operations return an empty list as their natural empty value, so a
//! caller that only wants to render an empty state on failure can
//! `unwrap_or_default()`.

use thiserror::Error;

use crate::auth::AuthError;
use crate::blobs::BlobError;
use crate::store::StoreError;

/// Operation-level error for the data-access layer.
#[derive(Debug, Error)]
pub enum ClientError {
    /// Document store operation failed.
    #[error("store error: {0}")]
    Store(#[from] StoreError),

    /// Identity provider operation failed.
    #[error("auth error: {0}")]
    Auth(#[from] AuthError),

    /// Blob store operation failed.
    #[error("blob error: {0}")]
    Blob(#[from] BlobError),

    /// Local file access failed (image uploads read local files).
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// A referenced entity does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// The operation conflicts with current state (e.g. already attending).
    #[error("{0}")]
    Conflict(String),

    /// The caller supplied an invalid value.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// The operation requires a signed-in user.
    #[error("not signed in")]
    NotSignedIn,
}

impl ClientError {
    /// Map a store error, turning a missing document into a descriptive
    /// `NotFound` for the named entity.
    pub(crate) fn from_store(e: StoreError, entity: impl FnOnce() -> String) -> Self {
        match e {
            StoreError::NotFound(_) => Self::NotFound(entity()),
            other => Self::Store(other),
        }
    }
}

/// Result type alias for `ClientError`.
pub type Result<T> = std::result::Result<T, ClientError>;
