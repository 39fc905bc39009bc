//! Periodic remote → local driver.
//!
//! One cycle per `pull_interval` seconds. Each configured bot is fetched,
//! offered to the sync engine, and written to the input mirror when the
//! remote copy is newer or unseen. Per-entity failures never abort the cycle
//! for other entities; only invariant violations escalate.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::time::interval;
use tracing::{debug, info, warn};

use flowsync_types::{BotEntry, Decision, FlowDocument, Origin, SyncSettings};

use crate::engine::SyncEngine;
use crate::error::SyncResult;
use crate::gateway::RemoteGateway;
use crate::mirror::{LocalMirror, MirrorDocument};

/// Drives the remote → local direction on a fixed cadence.
pub struct Puller<G> {
    engine: Arc<SyncEngine>,
    gateway: Arc<G>,
    mirror: Arc<LocalMirror>,
    settings: Arc<SyncSettings>,
}

impl<G: RemoteGateway> Puller<G> {
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

    /// Run until shutdown, executing one cycle per interval tick.
    pub async fn run(self, mut shutdown: watch::Receiver<bool>) -> SyncResult<()> {
        let period = Duration::from_secs(self.settings.effective_pull_interval());
        info!("Puller started, interval {}s", period.as_secs());
        let mut tick = interval(period);

        loop {
            tokio::select! {
                _ = tick.tick() => {
                    self.run_cycle().await?;
                }
                _ = shutdown.changed() => {
                    info!("Puller shutting down");
                    return Ok(());
                }
            }
        }
    }

    /// One full pull cycle over every configured bot.
    ///
    /// Public so tests drive cycles directly without waiting on timers.
    pub async fn run_cycle(&self) -> SyncResult<()> {
        for bot in &self.settings.bot_list {
            match self.pull_one(bot).await {
                Ok(decision) => {
                    debug!("Pull {} ({}): {:?}", bot.id, bot.name, decision);
                }
                Err(e) if e.is_fatal() => return Err(e),
                Err(e) => {
                    warn!("Pull failed for {} ({}): {}", bot.id, bot.name, e);
                }
            }
        }
        Ok(())
    }

    /// Fetch one bot's flow and offer it to the engine.
    pub async fn pull_one(&self, bot: &BotEntry) -> SyncResult<Decision> {
        // Fetch happens outside any entity lock.
        let remote = self.gateway.fetch(&bot.id).await?;
        let content = MirrorDocument::from_remote(&remote).to_bytes()?;
        let candidate = FlowDocument::new(bot.id.clone(), content, remote.modified_at);

        let mirror = self.mirror.clone();
        let name = bot.name.clone();
        self.engine
            .sync_with(&bot.name, candidate, Origin::Remote, move |doc| async move {
                mirror.write_input(&name, &doc.content).await
            })
            .await
    }
}
