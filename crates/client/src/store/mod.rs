//! Document store client.
//!
//! Thin REST client for the hosted document database. Documents are opaque
//! JSON field sets wrapped in a server-maintained envelope (id plus
//! creation/update timestamps). Queries support equality and
//! array-membership filters only; anything needing an ordering is sorted
//! client-side by the domain services so no composite index is required.

mod watch;

pub use watch::WatchFrame;

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::instrument;

use rallypoint_core::DocumentId;

/// Collection names consumed by this layer.
pub mod collections {
    pub const USERS: &str = "users";
    pub const CLUBS: &str = "clubs";
    pub const CLUB_JOIN_REQUESTS: &str = "clubJoinRequests";
    pub const EVENTS: &str = "events";
    pub const FEATURED_EVENTS: &str = "featuredEvents";
    pub const STORE_ITEMS: &str = "storeItems";
    pub const STORE_ORDERS: &str = "storeOrders";
}

/// Errors that can occur when talking to the document store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The backend returned an error envelope.
    #[error("backend error ({code}): {message}")]
    Api {
        /// Error code from the backend.
        code: String,
        /// Error message.
        message: String,
    },

    /// The requested document does not exist.
    #[error("document not found: {0}")]
    NotFound(String),

    /// Failed to parse a response body.
    #[error("parse error: {0}")]
    Parse(String),

    /// The watch stream failed mid-flight.
    #[error("stream error: {0}")]
    Stream(String),
}

/// A stored document: server-assigned id and timestamps around the caller's
/// field set.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Document<T> {
    /// Server-assigned opaque id.
    pub id: DocumentId,
    /// Server-stamped creation time.
    pub created_at: DateTime<Utc>,
    /// Server-stamped last update time.
    pub updated_at: DateTime<Utc>,
    /// The document's fields.
    pub fields: T,
}

/// A filter operator supported by the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum FilterOp {
    /// Field equals value.
    Eq,
    /// Array field contains value.
    ArrayContains,
}

/// One filter clause.
#[derive(Debug, Clone, Serialize)]
pub struct Filter {
    /// Field name in storage vocabulary.
    pub field: String,
    /// Filter operator.
    pub op: FilterOp,
    /// Value to match.
    pub value: serde_json::Value,
}

/// A query over one collection: conjunction of filters, optional limit.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Query {
    /// Filter clauses (all must match).
    pub filters: Vec<Filter>,
    /// Maximum number of documents to return.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<u32>,
}

impl Query {
    /// An unfiltered query over the whole collection.
    #[must_use]
    pub fn all() -> Self {
        Self::default()
    }

    /// Add an equality filter.
    #[must_use]
    pub fn filter_eq(mut self, field: &str, value: impl Serialize) -> Self {
        self.filters.push(Filter {
            field: field.to_string(),
            op: FilterOp::Eq,
            value: serde_json::to_value(value).unwrap_or(serde_json::Value::Null),
        });
        self
    }

    /// Add an array-membership filter.
    #[must_use]
    pub fn filter_array_contains(mut self, field: &str, value: impl Serialize) -> Self {
        self.filters.push(Filter {
            field: field.to_string(),
            op: FilterOp::ArrayContains,
            value: serde_json::to_value(value).unwrap_or(serde_json::Value::Null),
        });
        self
    }

    /// Cap the number of returned documents.
    #[must_use]
    pub const fn limit(mut self, limit: u32) -> Self {
        self.limit = Some(limit);
        self
    }
}

/// Error envelope returned by the backend.
#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    error: ApiErrorDetail,
}

/// Nested error details.
#[derive(Debug, Deserialize)]
struct ApiErrorDetail {
    code: String,
    message: String,
}

/// Response body for a query.
#[derive(Debug, Deserialize)]
struct QueryResponse<T> {
    documents: Vec<Document<T>>,
}

/// Client for the hosted document store.
///
/// Cheap to clone; the underlying `reqwest::Client` already carries the
/// `X-Api-Key` header.
#[derive(Debug, Clone)]
pub struct DocumentStore {
    http: reqwest::Client,
    base: String,
}

impl DocumentStore {
    /// Create a new document store client.
    ///
    /// `base` is the project's collections URL; `http` must already carry
    /// the API key header.
    #[must_use]
    pub const fn new(http: reqwest::Client, base: String) -> Self {
        Self { http, base }
    }

    pub(crate) fn http(&self) -> &reqwest::Client {
        &self.http
    }

    pub(crate) fn collection_url(&self, collection: &str) -> String {
        format!("{}/{collection}", self.base)
    }

    fn document_url(&self, collection: &str, id: &str) -> String {
        format!("{}/{collection}/documents/{id}", self.base)
    }

    /// Create a document with a server-assigned id.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the backend rejects it.
    #[instrument(skip(self, fields), fields(collection = %collection))]
    pub async fn create<T, R>(&self, collection: &str, fields: &T) -> Result<Document<R>, StoreError>
    where
        T: Serialize + Sync,
        R: DeserializeOwned,
    {
        let url = format!("{}/documents", self.collection_url(collection));
        let response = self
            .http
            .post(url)
            .json(&serde_json::json!({ "fields": fields }))
            .send()
            .await?;
        Self::decode_document(response).await
    }

    /// Create or replace a document with a caller-chosen id.
    ///
    /// Used for documents keyed by an external identity, e.g. the `users`
    /// profile document keyed by the auth uid.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the backend rejects it.
    #[instrument(skip(self, fields), fields(collection = %collection, id = %id))]
    pub async fn put<T, R>(
        &self,
        collection: &str,
        id: &str,
        fields: &T,
    ) -> Result<Document<R>, StoreError>
    where
        T: Serialize + Sync,
        R: DeserializeOwned,
    {
        let response = self
            .http
            .put(self.document_url(collection, id))
            .json(&serde_json::json!({ "fields": fields }))
            .send()
            .await?;
        Self::decode_document(response).await
    }

    /// Read one document.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::NotFound` when the document does not exist.
    #[instrument(skip(self), fields(collection = %collection, id = %id))]
    pub async fn get<T>(&self, collection: &str, id: &str) -> Result<Document<T>, StoreError>
    where
        T: DeserializeOwned,
    {
        let response = self.http.get(self.document_url(collection, id)).send().await?;
        Self::decode_document(response).await
    }

    /// Read one document, mapping absence to `None`.
    ///
    /// # Errors
    ///
    /// Returns an error for any failure other than a missing document.
    pub async fn get_opt<T>(
        &self,
        collection: &str,
        id: &str,
    ) -> Result<Option<Document<T>>, StoreError>
    where
        T: DeserializeOwned,
    {
        match self.get(collection, id).await {
            Ok(doc) => Ok(Some(doc)),
            Err(StoreError::NotFound(_)) => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// Merge-patch a document's fields.
    ///
    /// Keys present in `patch` are written; a JSON `null` clears the field;
    /// absent keys are left untouched.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::NotFound` when the document does not exist.
    #[instrument(skip(self, patch), fields(collection = %collection, id = %id))]
    pub async fn patch<T>(&self, collection: &str, id: &str, patch: &T) -> Result<(), StoreError>
    where
        T: Serialize + Sync,
    {
        let response = self
            .http
            .patch(self.document_url(collection, id))
            .json(&serde_json::json!({ "fields": patch }))
            .send()
            .await?;
        Self::check_status(response).await
    }

    /// Delete a document.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails; deleting an already-absent
    /// document is `StoreError::NotFound`.
    #[instrument(skip(self), fields(collection = %collection, id = %id))]
    pub async fn delete(&self, collection: &str, id: &str) -> Result<(), StoreError> {
        let response = self
            .http
            .delete(self.document_url(collection, id))
            .send()
            .await?;
        Self::check_status(response).await
    }

    /// Run a query against one collection.
    ///
    /// The store applies no ordering; callers sort client-side.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the backend rejects the
    /// query.
    #[instrument(skip(self, query), fields(collection = %collection))]
    pub async fn query<T>(
        &self,
        collection: &str,
        query: &Query,
    ) -> Result<Vec<Document<T>>, StoreError>
    where
        T: DeserializeOwned,
    {
        let url = format!("{}:query", self.collection_url(collection));
        let response = self.http.post(url).json(query).send().await?;

        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            return Err(Self::decode_error(status, &body));
        }

        let parsed: QueryResponse<T> = serde_json::from_str(&body)
            .map_err(|e| StoreError::Parse(format!("query response: {e}")))?;
        Ok(parsed.documents)
    }

    /// Decode a document body, mapping error statuses first.
    async fn decode_document<T>(response: reqwest::Response) -> Result<Document<T>, StoreError>
    where
        T: DeserializeOwned,
    {
        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            return Err(Self::decode_error(status, &body));
        }

        serde_json::from_str(&body).map_err(|e| StoreError::Parse(format!("document body: {e}")))
    }

    /// Check a bodyless response for success.
    async fn check_status(response: reqwest::Response) -> Result<(), StoreError> {
        let status = response.status();
        if status.is_success() {
            return Ok(());
        }
        let body = response.text().await?;
        Err(Self::decode_error(status, &body))
    }

    /// Map an error status and body to a `StoreError`.
    fn decode_error(status: reqwest::StatusCode, body: &str) -> StoreError {
        if let Ok(envelope) = serde_json::from_str::<ApiErrorBody>(body) {
            if status == reqwest::StatusCode::NOT_FOUND {
                return StoreError::NotFound(envelope.error.message);
            }
            return StoreError::Api {
                code: envelope.error.code,
                message: envelope.error.message,
            };
        }

        tracing::error!(
            status = %status,
            body = %body.chars().take(500).collect::<String>(),
            "document store returned undecodable error body"
        );

        if status == reqwest::StatusCode::NOT_FOUND {
            return StoreError::NotFound(format!("HTTP {status}"));
        }
        StoreError::Api {
            code: "unknown".to_string(),
            message: format!("HTTP {status}"),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_query_wire_shape() {
        let query = Query::all()
            .filter_eq("clubId", "c_7")
            .filter_array_contains("members", "u_1")
            .limit(25);
        let json = serde_json::to_value(&query).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "filters": [
                    {"field": "clubId", "op": "eq", "value": "c_7"},
                    {"field": "members", "op": "arrayContains", "value": "u_1"}
                ],
                "limit": 25
            })
        );
    }

    #[test]
    fn test_query_omits_absent_limit() {
        let json = serde_json::to_string(&Query::all().filter_eq("isPublic", true)).unwrap();
        assert!(!json.contains("limit"));
    }

    #[test]
    fn test_decode_error_envelope() {
        let err = DocumentStore::decode_error(
            reqwest::StatusCode::FORBIDDEN,
            r#"{"error":{"code":"permission_denied","message":"no access"}}"#,
        );
        assert!(matches!(err, StoreError::Api { ref code, .. } if code == "permission_denied"));
    }

    #[test]
    fn test_decode_error_not_found() {
        let err = DocumentStore::decode_error(
            reqwest::StatusCode::NOT_FOUND,
            r#"{"error":{"code":"not_found","message":"no such document"}}"#,
        );
        assert!(matches!(err, StoreError::NotFound(ref m) if m == "no such document"));
    }

    #[test]
    fn test_decode_error_unstructured_body() {
        let err = DocumentStore::decode_error(reqwest::StatusCode::BAD_GATEWAY, "<html>oops</html>");
        assert!(matches!(err, StoreError::Api { ref code, .. } if code == "unknown"));
    }

    #[test]
    fn test_document_envelope_deserializes() {
        let json = r#"{
            "id": "e_81",
            "createdAt": "2026-03-01T10:00:00Z",
            "updatedAt": "2026-03-02T09:30:00Z",
            "fields": {"title": "Track night"}
        }"#;
        let doc: Document<serde_json::Value> = serde_json::from_str(json).unwrap();
        assert_eq!(doc.id.as_str(), "e_81");
        assert_eq!(doc.fields["title"], "Track night");
    }
}
