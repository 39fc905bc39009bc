//! Flowsync Daemon
//!
//! A headless daemon that keeps bot flow descriptors consistent between the
//! remote bot platform and a local filesystem mirror, in both directions:
//!
//! - a periodic Puller fetches remote flows and writes newer ones to the
//!   input directory;
//! - an event-driven Pusher watches the output directory and pushes newer
//!   local edits back to the platform.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use flowsync_core::{
    load_settings, watch_output, EntityStore, HttpGateway, LocalMirror, Puller, Pusher, SyncEngine,
};

#[derive(Parser, Debug)]
#[command(name = "flowsync-daemon", about, version)]
struct Args {
    /// Path to the JSON configuration file.
    #[arg(short, long, env = "FLOWSYNC_CONFIG", default_value = "config.json")]
    config: PathBuf,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();
    let settings = Arc::new(
        load_settings(&args.config)
            .with_context(|| format!("loading {}", args.config.display()))?,
    );
    info!(
        "Flowsync starting: {} bots, pull every {}s",
        settings.bot_list.len(),
        settings.effective_pull_interval()
    );

    let mirror = Arc::new(LocalMirror::new(&settings.input_dir, &settings.output_dir));
    mirror.ensure_dirs().await.context("creating mirror directories")?;

    let gateway = Arc::new(HttpGateway::new(
        settings.base_url.clone(),
        settings.token.clone(),
        Duration::from_secs(settings.request_timeout_secs),
    )?);

    let engine = Arc::new(SyncEngine::new(EntityStore::new()));
    engine.store().register_bots(&settings.bot_list);

    let (_watcher, events) = watch_output(mirror.output_dir())?;

    let (shutdown_tx, shutdown_rx) = tokio::sync::watch::channel(false);

    let puller = Puller::new(engine.clone(), gateway.clone(), mirror.clone(), settings.clone());
    let pusher = Pusher::new(engine, gateway, mirror, settings);

    let mut puller_task = tokio::spawn(puller.run(shutdown_rx.clone()));
    let mut pusher_task = tokio::spawn(pusher.run(events, shutdown_rx));

    let (mut puller_done, mut pusher_done) = (false, false);
    tokio::select! {
        _ = tokio::signal::ctrl_c() => {
            info!("Shutdown requested");
        }
        result = &mut puller_task => {
            report_exit("Puller", result);
            puller_done = true;
        }
        result = &mut pusher_task => {
            report_exit("Pusher", result);
            pusher_done = true;
        }
    }
    let _ = shutdown_tx.send(true);

    // Let in-flight per-entity syncs finish or fail cleanly.
    let _ = tokio::time::timeout(Duration::from_secs(10), async {
        if !puller_done {
            report_exit("Puller", puller_task.await);
        }
        if !pusher_done {
            report_exit("Pusher", pusher_task.await);
        }
    })
    .await;

    info!("Flowsync stopped");
    Ok(())
}

fn report_exit(task: &str, result: Result<flowsync_core::SyncResult<()>, tokio::task::JoinError>) {
    match result {
        Ok(Ok(())) => info!("{} exited", task),
        Ok(Err(e)) => error!("{} failed: {}", task, e),
        Err(e) => error!("{} panicked: {}", task, e),
    }
}
