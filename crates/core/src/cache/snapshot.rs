//! Cached response snapshots.

use serde::{Deserialize, Serialize};

/// An immutable copy of a response, keyed by request identity within a
/// partition.
///
/// Snapshots are byte-for-byte copies of what the network returned (status,
/// headers, body), plus the fetch timestamp. Strategies also synthesize
/// placeholder snapshots for offline fallbacks; those never enter a
/// partition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    /// URL the response was fetched from (after canonicalization).
    pub url: String,
    /// HTTP status code.
    pub status: u16,
    /// Content-Type header, if present.
    pub content_type: Option<String>,
    /// Response headers in arrival order.
    pub headers: Vec<(String, String)>,
    /// Response body bytes.
    pub body: Vec<u8>,
    /// RFC 3339 timestamp of when the response was fetched.
    pub fetched_at: String,
}

impl Snapshot {
    /// Build a snapshot for a freshly fetched response.
    pub fn new(
        url: impl Into<String>, status: u16, content_type: Option<String>, headers: Vec<(String, String)>,
        body: Vec<u8>,
    ) -> Self {
        Self {
            url: url.into(),
            status,
            content_type,
            headers,
            body,
            fetched_at: chrono::Utc::now().to_rfc3339(),
        }
    }

    /// Synthesize a plain-text placeholder response.
    ///
    /// Used for offline fallbacks; carries no origin headers.
    pub fn synthesized(url: impl Into<String>, status: u16, body: &str) -> Self {
        Self {
            url: url.into(),
            status,
            content_type: Some("text/plain".to_string()),
            headers: Vec::new(),
            body: body.as_bytes().to_vec(),
            fetched_at: chrono::Utc::now().to_rfc3339(),
        }
    }

    /// Synthesize an empty 200 response.
    ///
    /// Returned for failed analytics requests, which must never break the
    /// page.
    pub fn empty(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            status: 200,
            content_type: None,
            headers: Vec::new(),
            body: Vec::new(),
            fetched_at: chrono::Utc::now().to_rfc3339(),
        }
    }

    /// Whether this response is eligible for persistence.
    ///
    /// Only plain 200 responses are ever written to a partition; partial
    /// and error responses would poison the cache with failures.
    pub fn is_cacheable(&self) -> bool {
        self.status == 200
    }
}
