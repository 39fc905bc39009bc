//! Tracked entity state and sync decisions.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Which side last won a sync for an entity. Diagnostics only, never
/// consulted by the decision logic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SyncDirection {
    /// No transfer has been confirmed yet.
    #[default]
    None,
    /// Remote → local was the last confirmed transfer.
    Pulled,
    /// Local → remote was the last confirmed transfer.
    Pushed,
}

impl std::fmt::Display for SyncDirection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SyncDirection::None => write!(f, "none"),
            SyncDirection::Pulled => write!(f, "pulled"),
            SyncDirection::Pushed => write!(f, "pushed"),
        }
    }
}

/// Side a candidate document was observed from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Origin {
    /// Candidate fetched from the remote service (Puller path).
    Remote,
    /// Candidate read from the local output mirror (Pusher path).
    Local,
}

impl Origin {
    /// The direction a confirmed transfer from this origin records.
    pub const fn direction(self) -> SyncDirection {
        match self {
            Origin::Remote => SyncDirection::Pulled,
            Origin::Local => SyncDirection::Pushed,
        }
    }
}

/// Why a candidate was skipped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// Content hash matches the last confirmed-synced version.
    AlreadySynced,
    /// Candidate timestamp is older than the last confirmed-synced version.
    Stale,
    /// Equal timestamps with differing content. Anomaly; never applied.
    TimestampTie,
}

/// Outcome of a sync decision for one candidate document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    /// Transfer the candidate in the direction implied by its origin.
    Apply(Origin),
    /// Do not transfer.
    Skip(SkipReason),
}

impl Decision {
    /// Whether this decision calls for a transfer.
    pub const fn is_apply(&self) -> bool {
        matches!(self, Decision::Apply(_))
    }
}

/// Last known synced state for one tracked entity.
///
/// Invariant: `last_content_hash`/`last_known_modified` always describe the
/// most recently confirmed-synced version, the version that is, as far as
/// the engine knows, identical on both sides. Updated only after a physical
/// transfer succeeds.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TrackedEntity {
    /// Opaque unique identifier, stable for the entity's lifetime.
    pub id: String,
    /// Human label, informational only.
    pub display_name: String,
    /// Digest of the last confirmed-synced document bytes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_content_hash: Option<String>,
    /// Server-assigned timestamp paired with `last_content_hash`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_known_modified: Option<DateTime<Utc>>,
    /// Which side last won.
    #[serde(default)]
    pub last_synced_direction: SyncDirection,
}

impl TrackedEntity {
    /// Create a fresh record with no confirmed-synced version.
    pub fn new(id: impl Into<String>, display_name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            display_name: display_name.into(),
            last_content_hash: None,
            last_known_modified: None,
            last_synced_direction: SyncDirection::None,
        }
    }

    /// Whether any transfer has been confirmed for this entity.
    pub const fn has_synced(&self) -> bool {
        self.last_content_hash.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fresh_entity_has_no_synced_state() {
        let e = TrackedEntity::new("bot-1", "Support Bot");
        assert!(!e.has_synced());
        assert_eq!(e.last_synced_direction, SyncDirection::None);
    }

    #[test]
    fn test_origin_maps_to_direction() {
        assert_eq!(Origin::Remote.direction(), SyncDirection::Pulled);
        assert_eq!(Origin::Local.direction(), SyncDirection::Pushed);
    }
}
