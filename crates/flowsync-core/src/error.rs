//! Unified error types for Flowsync Core.

use thiserror::Error;

/// Main error type for all sync operations.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum SyncError {
    /// Network request failed (HTTP client).
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// File system I/O operation failed.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Filesystem watcher setup or runtime failure.
    #[error("Watch error: {0}")]
    Watch(#[from] notify::Error),

    /// Document content was malformed beyond plain JSON errors.
    #[error("Parse error for {entity_id}: {message}")]
    Parse {
        /// Entity whose document failed to parse.
        entity_id: String,
        /// Description of the parse failure.
        message: String,
    },

    /// Remote has no flow for the entity.
    #[error("Flow not found for {entity_id}")]
    NotFound {
        /// Entity the remote does not know.
        entity_id: String,
    },

    /// Remote returned an empty payload for the entity.
    #[error("Empty flow payload for {entity_id}")]
    EmptyPayload {
        /// Entity whose payload was empty.
        entity_id: String,
    },

    /// Remote rejected a pushed flow (validation failure).
    #[error("Push rejected for {entity_id} ({status}): {message}")]
    Rejected {
        /// Entity whose push was rejected.
        entity_id: String,
        /// HTTP status code from the remote.
        status: u16,
        /// Error body from the remote.
        message: String,
    },

    /// Remote has independently newer data than the push basis.
    #[error("Push conflict for {entity_id}: remote has newer data")]
    Conflict {
        /// Entity whose push conflicted.
        entity_id: String,
    },

    /// Configuration loading or validation failed. Fatal at startup.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Store-corruption-level invariant violation. Indicates a bug, not an
    /// environmental condition; always fatal.
    #[error("Invariant violation: {0}")]
    Invariant(String),
}

impl SyncError {
    /// Whether this error should escalate out of the driving loop rather
    /// than be retried on the next trigger.
    pub const fn is_fatal(&self) -> bool {
        matches!(self, Self::Invariant(_) | Self::Config(_))
    }

    /// Whether the next natural trigger is expected to self-heal this error.
    pub const fn is_transient(&self) -> bool {
        matches!(self, Self::Network(_) | Self::Io(_) | Self::EmptyPayload { .. })
    }
}

/// Result type alias for sync operations.
pub type SyncResult<T> = Result<T, SyncError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fatal_classification() {
        assert!(SyncError::Invariant("negative timestamp".into()).is_fatal());
        assert!(SyncError::Config("missing token".into()).is_fatal());
        assert!(!SyncError::Conflict { entity_id: "b".into() }.is_fatal());
        assert!(!SyncError::NotFound { entity_id: "b".into() }.is_fatal());
    }

    #[test]
    fn test_transient_classification() {
        assert!(SyncError::EmptyPayload { entity_id: "b".into() }.is_transient());
        assert!(!SyncError::Conflict { entity_id: "b".into() }.is_transient());
        assert!(
            !SyncError::Rejected { entity_id: "b".into(), status: 422, message: String::new() }
                .is_transient()
        );
    }
}
