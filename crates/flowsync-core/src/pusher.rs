//! Event-driven local → remote driver.
//!
//! Consumes change notifications from the output-directory watcher. Bursts
//! of events for the same entity within the debounce window collapse into a
//! single attempt that reads the latest on-disk content. A failed or
//! conflicted push leaves the entity uncommitted, so the next notification
//! (or the next pull) reconciles.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, watch};
use tokio::time::{sleep_until, Instant};
use tracing::{debug, info, warn};

use flowsync_types::{Decision, Origin, SyncSettings};

use crate::engine::SyncEngine;
use crate::error::{SyncError, SyncResult};
use crate::gateway::RemoteGateway;
use crate::mirror::LocalMirror;

/// Drives the local → remote direction from filesystem change events.
pub struct Pusher<G> {
    engine: Arc<SyncEngine>,
    gateway: Arc<G>,
    mirror: Arc<LocalMirror>,
    settings: Arc<SyncSettings>,
}

impl<G: RemoteGateway> Pusher<G> {
    pub fn new(
        engine: Arc<SyncEngine>,
        gateway: Arc<G>,
        mirror: Arc<LocalMirror>,
        settings: Arc<SyncSettings>,
    ) -> Self {
        Self {
            engine,
            gateway,
            mirror,
            settings,
        }
    }

    /// Run until shutdown or until the watcher channel closes.
    ///
    /// Events are debounced per file stem: each new event for a stem resets
    /// its deadline; the stem fires once its deadline passes quietly.
    pub async fn run(
        self,
        mut events: mpsc::UnboundedReceiver<String>,
        mut shutdown: watch::Receiver<bool>,
    ) -> SyncResult<()> {
        let debounce = Duration::from_millis(self.settings.debounce_ms);
        info!("Pusher started, debounce {}ms", debounce.as_millis());

        let mut pending: HashMap<String, Instant> = HashMap::new();

        loop {
            let next_deadline = pending.values().min().copied();

            tokio::select! {
                maybe = events.recv() => {
                    match maybe {
                        Some(stem) => {
                            pending.insert(stem, Instant::now() + debounce);
                        }
                        None => {
                            info!("Watcher channel closed, Pusher stopping");
                            return Ok(());
                        }
                    }
                }
                _ = sleep_until(next_deadline.unwrap_or_else(Instant::now)),
                        if next_deadline.is_some() => {
                    let now = Instant::now();
                    let due: Vec<String> = pending
                        .iter()
                        .filter(|(_, deadline)| **deadline <= now)
                        .map(|(stem, _)| stem.clone())
                        .collect();
                    for stem in due {
                        pending.remove(&stem);
                        self.dispatch(&stem).await?;
                    }
                }
                _ = shutdown.changed() => {
                    info!("Pusher shutting down");
                    return Ok(());
                }
            }
        }
    }

    /// Handle one debounced change, isolating per-entity errors.
    async fn dispatch(&self, stem: &str) -> SyncResult<()> {
        match self.handle_change(stem).await {
            Ok(Some(decision)) => {
                debug!("Push {}: {:?}", stem, decision);
                Ok(())
            }
            Ok(None) => {
                debug!("Ignoring change to unconfigured file {}", stem);
                Ok(())
            }
            Err(e) if e.is_fatal() => Err(e),
            Err(SyncError::Conflict { entity_id }) => {
                info!(
                    "Push conflict for {}: remote is newer, deferring to next pull",
                    entity_id
                );
                Ok(())
            }
            Err(e) => {
                warn!("Push failed for {}: {}", stem, e);
                Ok(())
            }
        }
    }

    /// Read the changed output document and offer it to the engine.
    ///
    /// Returns `None` when the stem does not map to a configured bot.
    /// Public so tests drive changes directly without a live watcher.
    pub async fn handle_change(&self, stem: &str) -> SyncResult<Option<Decision>> {
        let Some(bot_id) = self.settings.bot_id_for_name(stem) else {
            return Ok(None);
        };

        // Read happens outside any entity lock; the document's declared
        // timestamp is the decision basis, never the file's mtime.
        let (candidate, flow_settings) = self.mirror.read_output(bot_id, stem).await?;

        let gateway = self.gateway.clone();
        let bot_id_owned = bot_id.to_string();
        let decision = self
            .engine
            .sync_with(stem, candidate, Origin::Local, move |doc| async move {
                gateway
                    .push(&bot_id_owned, &flow_settings, doc.modified_at)
                    .await
            })
            .await?;

        Ok(Some(decision))
    }
}
