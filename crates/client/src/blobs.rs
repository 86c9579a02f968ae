//! Blob store client.
//!
//! Objects are addressed by path string. The store supports put (with
//! content-type metadata), returning a public download URL, and delete.
//! The upload/serving pipeline behind those two verbs is the hosted
//! service's concern.

use thiserror::Error;
use tracing::instrument;
use url::Url;

/// Errors that can occur when talking to the blob store.
#[derive(Debug, Error)]
pub enum BlobError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The store returned an error.
    #[error("blob store error ({code}): {message}")]
    Api {
        /// Error code from the store.
        code: String,
        /// Error message.
        message: String,
    },

    /// A download URL could not be mapped back to an object path.
    #[error("not an object URL: {0}")]
    InvalidUrl(String),

    /// Failed to parse a response body.
    #[error("parse error: {0}")]
    Parse(String),
}

/// Response body for a successful put.
#[derive(Debug, serde::Deserialize)]
struct PutResponse {
    url: String,
}

/// Error envelope returned by the store.
#[derive(Debug, serde::Deserialize)]
struct BlobErrorBody {
    error: BlobErrorDetail,
}

#[derive(Debug, serde::Deserialize)]
struct BlobErrorDetail {
    code: String,
    message: String,
}

/// Client for the project's blob storage bucket.
#[derive(Debug, Clone)]
pub struct BlobStore {
    http: reqwest::Client,
    base: String,
}

impl BlobStore {
    /// Create a new blob store client.
    ///
    /// `base` is the project's bucket URL; `http` must already carry the
    /// API key header.
    #[must_use]
    pub const fn new(http: reqwest::Client, base: String) -> Self {
        Self { http, base }
    }

    fn object_url(&self, path: &str) -> String {
        format!("{}/objects/{path}", self.base)
    }

    /// Upload an object and return its public download URL.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the store rejects it.
    #[instrument(skip(self, bytes), fields(path = %path, len = bytes.len()))]
    pub async fn put(
        &self,
        path: &str,
        content_type: &str,
        bytes: Vec<u8>,
    ) -> Result<String, BlobError> {
        let response = self
            .http
            .put(self.object_url(path))
            .header(reqwest::header::CONTENT_TYPE, content_type)
            .body(bytes)
            .send()
            .await?;

        let status = response.status();
        let text = response.text().await?;
        if !status.is_success() {
            return Err(decode_error(status, &text));
        }

        let parsed: PutResponse = serde_json::from_str(&text)
            .map_err(|e| BlobError::Parse(format!("put response: {e}")))?;
        Ok(parsed.url)
    }

    /// Delete an object by path.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the store rejects it.
    #[instrument(skip(self), fields(path = %path))]
    pub async fn delete(&self, path: &str) -> Result<(), BlobError> {
        let response = self.http.delete(self.object_url(path)).send().await?;

        let status = response.status();
        if status.is_success() {
            return Ok(());
        }
        let text = response.text().await?;
        Err(decode_error(status, &text))
    }

    /// Delete an object by its public download URL.
    ///
    /// # Errors
    ///
    /// Returns `BlobError::InvalidUrl` when the URL does not point into an
    /// object path, or the underlying delete error.
    pub async fn delete_by_url(&self, url: &str) -> Result<(), BlobError> {
        let path = object_path_from_url(url)?;
        self.delete(&path).await
    }
}

/// Extract the object path from a public download URL.
fn object_path_from_url(url: &str) -> Result<String, BlobError> {
    let parsed = Url::parse(url).map_err(|_| BlobError::InvalidUrl(url.to_string()))?;
    let path = parsed.path();

    path.split_once("/objects/")
        .map(|(_, object_path)| object_path.to_string())
        .filter(|p| !p.is_empty())
        .ok_or_else(|| BlobError::InvalidUrl(url.to_string()))
}

/// Map an error status and body to a `BlobError`.
fn decode_error(status: reqwest::StatusCode, body: &str) -> BlobError {
    serde_json::from_str::<BlobErrorBody>(body).map_or_else(
        |_| BlobError::Api {
            code: "unknown".to_string(),
            message: format!("HTTP {status}"),
        },
        |envelope| BlobError::Api {
            code: envelope.error.code,
            message: envelope.error.message,
        },
    )
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_object_path_from_url() {
        let url = "https://cloud.rallypoint.app/v1/projects/demo/buckets/media/objects/events/4f1c.jpg";
        assert_eq!(
            object_path_from_url(url).unwrap(),
            "events/4f1c.jpg"
        );
    }

    #[test]
    fn test_object_path_rejects_foreign_url() {
        assert!(object_path_from_url("https://example.com/picture.jpg").is_err());
        assert!(object_path_from_url("not a url").is_err());
        assert!(object_path_from_url("https://cloud.rallypoint.app/v1/objects/").is_err());
    }

    #[test]
    fn test_decode_error_envelope() {
        let err = decode_error(
            reqwest::StatusCode::FORBIDDEN,
            r#"{"error":{"code":"permission_denied","message":"read-only key"}}"#,
        );
        assert!(matches!(err, BlobError::Api { ref code, .. } if code == "permission_denied"));
    }
}
