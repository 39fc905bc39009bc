//! Output-directory change notifications.
//!
//! Wraps a `notify` watcher and forwards relevant events as bare mirror file
//! stems (display names) over a tokio channel. Debouncing happens in the
//! Pusher; this module only filters noise: non-JSON files, hidden files, and
//! editor temp artifacts.

use std::path::Path;

use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc;
use tracing::{error, info};

use crate::error::SyncResult;

/// A live subscription to output-directory changes.
///
/// Dropping this stops the underlying watcher, which closes the event
/// channel and ends the Pusher loop.
pub struct OutputWatcher {
    _watcher: RecommendedWatcher,
}

/// Start watching `dir`. Returns the subscription handle and the stream of
/// changed file stems.
pub fn watch_output(dir: &Path) -> SyncResult<(OutputWatcher, mpsc::UnboundedReceiver<String>)> {
    let (tx, rx) = mpsc::unbounded_channel();

    let mut watcher =
        notify::recommended_watcher(move |res: Result<Event, notify::Error>| match res {
            Ok(event) => {
                for stem in stems_of_interest(&event) {
                    // Receiver dropped means we are shutting down.
                    let _ = tx.send(stem);
                }
            }
            Err(e) => {
                error!("File watcher error: {}", e);
            }
        })?;

    watcher.watch(dir, RecursiveMode::NonRecursive)?;
    info!("Watching output directory: {}", dir.display());

    Ok((OutputWatcher { _watcher: watcher }, rx))
}

fn stems_of_interest(event: &Event) -> Vec<String> {
    if !matches!(event.kind, EventKind::Create(_) | EventKind::Modify(_)) {
        return Vec::new();
    }

    event
        .paths
        .iter()
        .filter(|path| !should_ignore(path))
        .filter(|path| path.extension().and_then(|e| e.to_str()) == Some("json"))
        .filter_map(|path| path.file_stem().and_then(|s| s.to_str()).map(String::from))
        .collect()
}

fn should_ignore(path: &Path) -> bool {
    let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
        return true;
    };
    // Hidden files and common editor temp artifacts.
    name.starts_with('.')
        || name.ends_with('~')
        || name.ends_with(".tmp")
        || name.ends_with(".swp")
        || (name.starts_with('#') && name.ends_with('#'))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use tempfile::TempDir;

    #[test]
    fn test_event_filtering() {
        let mk = |kind, paths: &[&str]| Event {
            kind,
            paths: paths.iter().map(std::path::PathBuf::from).collect(),
            attrs: Default::default(),
        };

        let create = mk(
            EventKind::Create(notify::event::CreateKind::File),
            &["/out/support.json"],
        );
        assert_eq!(stems_of_interest(&create), vec!["support".to_string()]);

        let noise = mk(
            EventKind::Modify(notify::event::ModifyKind::Any),
            &[
                "/out/.hidden.json",
                "/out/support.json.tmp",
                "/out/notes.txt",
                "/out/#support.json#",
            ],
        );
        assert!(stems_of_interest(&noise).is_empty());

        let remove = mk(
            EventKind::Remove(notify::event::RemoveKind::File),
            &["/out/support.json"],
        );
        assert!(stems_of_interest(&remove).is_empty());
    }

    #[tokio::test]
    async fn test_watcher_reports_json_writes() {
        let tmp = TempDir::new().unwrap();
        let (_watcher, mut rx) = watch_output(tmp.path()).unwrap();

        tokio::fs::write(tmp.path().join("support.json"), b"{}")
            .await
            .unwrap();

        let stem = tokio::time::timeout(Duration::from_secs(5), rx.recv())
            .await
            .expect("watcher should report the write")
            .expect("channel open");
        assert_eq!(stem, "support");
    }
}
