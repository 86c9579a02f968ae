//! Image upload and delete.
//!
//! Uploads read a local file, infer the content type from the extension,
//! and store the bytes under a fresh object name; the blob store hands
//! back the public URL the document fields reference.

use std::path::Path;

use tracing::instrument;

use crate::client::Client;
use crate::error::{ClientError, Result};

/// Image operations, borrowed from a [`Client`].
pub struct Images<'a> {
    client: &'a Client,
}

impl<'a> Images<'a> {
    pub(crate) const fn new(client: &'a Client) -> Self {
        Self { client }
    }

    /// Upload a local image and return its public URL.
    ///
    /// The object lands under `folder/` with a uuid name, keeping the
    /// original extension.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::Io` when the local file cannot be read, or a
    /// blob store error.
    #[instrument(skip(self), fields(path = %path.display(), folder = %folder))]
    pub async fn upload(&self, path: &Path, folder: &str) -> Result<String> {
        let bytes = tokio::fs::read(path).await?;

        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .map_or_else(|| "bin".to_string(), str::to_lowercase);
        let object = format!("{folder}/{}.{extension}", uuid::Uuid::new_v4());

        let url = self
            .client
            .blobs()
            .put(&object, content_type_for(&extension), bytes)
            .await?;
        Ok(url)
    }

    /// Delete an image by its public URL.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::Blob` when the URL is not an object URL or
    /// the delete fails.
    #[instrument(skip(self), fields(url = %url))]
    pub async fn delete(&self, url: &str) -> Result<()> {
        self.client
            .blobs()
            .delete_by_url(url)
            .await
            .map_err(ClientError::from)
    }
}

/// Content type for an image file extension.
fn content_type_for(extension: &str) -> &'static str {
    match extension {
        "jpg" | "jpeg" => "image/jpeg",
        "png" => "image/png",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "heic" => "image/heic",
        _ => "application/octet-stream",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_content_type_for_known_extensions() {
        assert_eq!(content_type_for("jpg"), "image/jpeg");
        assert_eq!(content_type_for("jpeg"), "image/jpeg");
        assert_eq!(content_type_for("png"), "image/png");
        assert_eq!(content_type_for("webp"), "image/webp");
    }

    #[test]
    fn test_content_type_for_unknown_extension() {
        assert_eq!(content_type_for("pdf"), "application/octet-stream");
        assert_eq!(content_type_for(""), "application/octet-stream");
    }
}
