//! In-memory entity store with per-id mutual exclusion.
//!
//! The store exclusively owns [`TrackedEntity`] records. Callers never hold
//! private copies; they lock a record immediately before deciding, so a
//! decision is never based on a stale in-memory snapshot. Different entities
//! proceed fully in parallel; there is no cross-entity locking.

use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::Mutex;

use flowsync_types::{BotEntry, TrackedEntity};

/// Per-entity tracked state, keyed by entity id.
#[derive(Default)]
pub struct EntityStore {
    entities: DashMap<String, Arc<Mutex<TrackedEntity>>>,
}

impl EntityStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self {
            entities: DashMap::new(),
        }
    }

    /// Pre-register the configured bots so records exist from startup.
    pub fn register_bots(&self, bots: &[BotEntry]) {
        for bot in bots {
            self.entry(&bot.id, &bot.name);
        }
    }

    /// Handle to the record for `id`, creating it on first observation.
    ///
    /// Records are never removed while the process runs.
    pub fn entry(&self, id: &str, display_name: &str) -> Arc<Mutex<TrackedEntity>> {
        self.entities
            .entry(id.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(TrackedEntity::new(id, display_name))))
            .clone()
    }

    /// Snapshot of a record for diagnostics, if one exists.
    pub async fn get(&self, id: &str) -> Option<TrackedEntity> {
        let handle = self.entities.get(id)?.clone();
        let record = handle.lock().await;
        Some(record.clone())
    }

    /// Number of tracked entities.
    pub fn len(&self) -> usize {
        self.entities.len()
    }

    /// Whether the store has no tracked entities.
    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }
}
