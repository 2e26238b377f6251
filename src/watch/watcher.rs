// src/watch/watcher.rs

use std::path::{Path, PathBuf};

use anyhow::Result;
use notify::{Config, Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::watch::hash::ContentGate;

/// Keeps the underlying `RecommendedWatcher` alive. Dropping this handle
/// stops file watching and closes the change stream.
pub struct WatcherHandle {
    _inner: RecommendedWatcher,
}

impl std::fmt::Debug for WatcherHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WatcherHandle").finish()
    }
}

/// Watch `root` recursively and forward every changed file as a
/// root-relative, `/`-separated path on `changes_tx`.
///
/// With `use_hash`, changes that leave a file's content identical are
/// dropped here.
pub fn spawn_watcher(
    root: impl Into<PathBuf>,
    use_hash: bool,
    changes_tx: mpsc::Sender<String>,
) -> Result<WatcherHandle> {
    let root = root.into();
    let root = root.canonicalize().unwrap_or(root);

    // Channel from the blocking notify callback into the async world.
    let (event_tx, mut event_rx) = mpsc::unbounded_channel::<Event>();

    let mut watcher = RecommendedWatcher::new(
        move |res: notify::Result<Event>| match res {
            // A closed receiver means the session is shutting down.
            Ok(event) => {
                let _ = event_tx.send(event);
            }
            Err(err) => eprintln!("assetflow: file watch error: {err}"),
        },
        Config::default(),
    )?;

    watcher.watch(&root, RecursiveMode::Recursive)?;
    info!(root = %root.display(), use_hash, "file watcher started");

    tokio::spawn(async move {
        let mut gate = use_hash.then(ContentGate::new);

        while let Some(event) = event_rx.recv().await {
            if matches!(event.kind, EventKind::Access(_)) {
                continue;
            }
            debug!(?event, "received notify event");

            for path in event.paths {
                if path.is_dir() {
                    continue;
                }
                let Some(rel) = relative_str(&root, &path) else {
                    warn!("could not relativize path {:?} against root {:?}", path, root);
                    continue;
                };
                if let Some(gate) = gate.as_mut() {
                    if !gate.should_forward(&path) {
                        continue;
                    }
                }
                if changes_tx.send(rel).await.is_err() {
                    debug!("change receiver closed, stopping watcher loop");
                    return;
                }
            }
        }
        debug!("watcher event loop finished");
    });

    Ok(WatcherHandle { _inner: watcher })
}

/// `path` relative to `root` with forward slashes.
///
/// Falls back to canonical paths when the event path uses a different
/// absolute prefix for the same directory (macOS `/private/var`).
pub fn relative_str(root: &Path, path: &Path) -> Option<String> {
    let to_string = |rel: &Path| rel.to_string_lossy().replace('\\', "/");

    if let Ok(rel) = path.strip_prefix(root) {
        return Some(to_string(rel));
    }

    let root_canon = root.canonicalize().ok()?;
    let path_canon = path.canonicalize().ok()?;
    path_canon.strip_prefix(&root_canon).ok().map(to_string)
}
