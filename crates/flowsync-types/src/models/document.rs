//! Flow document model.

use bytes::Bytes;
use chrono::{DateTime, NaiveDateTime, Utc};
use sha2::{Digest, Sha256};

/// Timestamp format used by the remote service for `gmt_modified` fields.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// A flow descriptor as observed from either side at a single instant.
///
/// Constructed fresh on every fetch/read and discarded after the sync
/// decision is applied; never cached beyond the single comparison.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlowDocument {
    /// Id of the entity this document belongs to.
    pub entity_id: String,
    /// Opaque document payload. Round-trips exactly; may be empty.
    pub content: Bytes,
    /// The document's own declared modification timestamp (server-assigned).
    pub modified_at: DateTime<Utc>,
    /// SHA-256 hex digest of `content`. Derived, never set independently.
    content_hash: String,
}

impl FlowDocument {
    /// Build a document, deriving the content hash from the raw bytes.
    pub fn new(entity_id: impl Into<String>, content: Bytes, modified_at: DateTime<Utc>) -> Self {
        let content_hash = hash_content(&content);
        Self {
            entity_id: entity_id.into(),
            content,
            modified_at,
            content_hash,
        }
    }

    /// The derived content hash.
    pub fn content_hash(&self) -> &str {
        &self.content_hash
    }
}

/// SHA-256 hex digest of raw document bytes.
pub fn hash_content(content: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(content);
    format!("{:x}", hasher.finalize())
}

/// Parse a `gmt_modified` string (`YYYY-MM-DD HH:MM:SS`, interpreted as UTC).
pub fn parse_gmt_modified(s: &str) -> Result<DateTime<Utc>, chrono::ParseError> {
    NaiveDateTime::parse_from_str(s, TIMESTAMP_FORMAT).map(|naive| naive.and_utc())
}

/// Format a timestamp the way the remote service declares it.
pub fn format_gmt_modified(ts: DateTime<Utc>) -> String {
    ts.format(TIMESTAMP_FORMAT).to_string()
}
