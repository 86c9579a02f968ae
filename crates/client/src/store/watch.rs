//! Streaming watch channel for live queries.
//!
//! `:watch` holds the connection open and pushes one newline-delimited JSON
//! frame for every result-set change. Frames are parsed incrementally from
//! the byte stream; the subscription layer decides what to do when the
//! channel errors (it downgrades to polling).

use async_stream::stream;
use futures::Stream;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use tracing::instrument;

use super::{Document, DocumentStore, Query, StoreError};

/// One pushed frame: the full result set at that instant.
#[derive(Debug, Deserialize)]
pub struct WatchFrame<T> {
    /// Documents matching the watched query.
    pub documents: Vec<Document<T>>,
}

impl DocumentStore {
    /// Open a live channel on a query.
    ///
    /// Returns a stream that yields the full matching result set on every
    /// change, starting with the current result set. The stream ends when
    /// the server closes the connection; a mid-flight failure is yielded
    /// as an `Err` item.
    ///
    /// # Errors
    ///
    /// Returns an error if the channel cannot be opened at all.
    #[instrument(skip(self, query), fields(collection = %collection))]
    pub async fn watch<T>(
        &self,
        collection: &str,
        query: &Query,
    ) -> Result<impl Stream<Item = Result<Vec<Document<T>>, StoreError>>, StoreError>
    where
        T: DeserializeOwned,
    {
        let url = format!("{}:watch", self.collection_url(collection));
        let response = self.http().post(url).json(query).send().await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await?;
            return Err(Self::decode_error(status, &body));
        }

        // Parse ND-JSON frames as bytes arrive
        Ok(stream! {
            use futures::StreamExt;

            let mut buffer = String::new();
            let mut byte_stream = std::pin::pin!(response.bytes_stream());

            while let Some(chunk_result) = byte_stream.next().await {
                match chunk_result {
                    Ok(chunk) => {
                        let text = match std::str::from_utf8(&chunk) {
                            Ok(t) => t,
                            Err(e) => {
                                yield Err(StoreError::Stream(format!("invalid UTF-8: {e}")));
                                continue;
                            }
                        };

                        buffer.push_str(text);

                        while let Some(line) = extract_line(&mut buffer) {
                            if line.trim().is_empty() {
                                continue;
                            }
                            match serde_json::from_str::<WatchFrame<T>>(&line) {
                                Ok(frame) => yield Ok(frame.documents),
                                Err(e) => {
                                    yield Err(StoreError::Parse(format!("watch frame: {e}")));
                                }
                            }
                        }
                    }
                    Err(e) => {
                        yield Err(StoreError::Stream(e.to_string()));
                    }
                }
            }
        })
    }
}

/// Extract one complete line from the buffer.
///
/// Returns `Some(line)` if a newline was found (and removes the line from
/// the buffer), or `None` if no complete line is available yet.
fn extract_line(buffer: &mut String) -> Option<String> {
    buffer.find('\n').map(|idx| {
        let line = buffer[..idx].to_string();
        *buffer = buffer[idx + 1..].to_string();
        line
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_line() {
        let mut buffer = "{\"documents\":[]}\n{\"documents\"".to_string();

        let line = extract_line(&mut buffer);
        assert_eq!(line.as_deref(), Some("{\"documents\":[]}"));

        // Second frame is incomplete, so nothing is extracted
        assert!(extract_line(&mut buffer).is_none());
        assert_eq!(buffer, "{\"documents\"");
    }

    #[test]
    fn test_extract_line_blank_frames() {
        let mut buffer = "\n\n{\"documents\":[]}\n".to_string();
        assert_eq!(extract_line(&mut buffer).as_deref(), Some(""));
        assert_eq!(extract_line(&mut buffer).as_deref(), Some(""));
        assert_eq!(
            extract_line(&mut buffer).as_deref(),
            Some("{\"documents\":[]}")
        );
        assert!(extract_line(&mut buffer).is_none());
    }

    #[test]
    fn test_watch_frame_deserializes() {
        let json = r#"{"documents":[{
            "id": "e_1",
            "createdAt": "2026-03-01T10:00:00Z",
            "updatedAt": "2026-03-01T10:00:00Z",
            "fields": {"title": "Open run"}
        }]}"#;
        let frame: WatchFrame<serde_json::Value> = serde_json::from_str(json).unwrap();
        assert_eq!(frame.documents.len(), 1);
        assert_eq!(frame.documents[0].fields["title"], "Open run");
    }
}
