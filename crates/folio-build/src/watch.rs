//! Live reload support.
//!
//! [`watch`] starts a recursive `notify` watcher on the source directory. Raw
//! events go through an [`EventDebouncer`]; a drain thread sends each settled
//! batch to the returned [`ChangeReceiver`]. Dropping the [`WatchHandle`] (or
//! calling [`WatchHandle::stop`]) ends the drain thread, which closes the
//! receiver.

use std::path::{Component, Path, PathBuf};
use std::sync::{Arc, mpsc};
use std::thread;
use std::time::Duration;

use notify::{RecursiveMode, Watcher};

use crate::debouncer::EventDebouncer;

/// Interval at which the drain thread checks for settled events.
const DRAIN_INTERVAL: Duration = Duration::from_millis(50);

/// Watcher error.
#[derive(Debug, thiserror::Error)]
#[error("Failed to watch {}: {source}", .path.display())]
pub struct WatchError {
    /// Watched directory.
    pub path: PathBuf,
    /// Underlying notify error.
    #[source]
    pub source: notify::Error,
}

/// Kind of source change.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ChangeKind {
    Created,
    Modified,
    Removed,
}

/// A settled change, relative to the source directory.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ChangeEvent {
    /// Path relative to the watched directory.
    pub path: PathBuf,
    /// Kind of change.
    pub kind: ChangeKind,
}

/// Receiver of change batches.
pub struct ChangeReceiver {
    rx: mpsc::Receiver<Vec<ChangeEvent>>,
}

impl ChangeReceiver {
    /// Wait for the next batch. Returns `None` once watching stopped.
    pub fn recv(&self) -> Option<Vec<ChangeEvent>> {
        self.rx.recv().ok()
    }

    /// Blocking iterator over batches, ending when watching stops.
    pub fn iter(&self) -> impl Iterator<Item = Vec<ChangeEvent>> + '_ {
        self.rx.iter()
    }
}

/// Keeps the watcher alive. Dropping it stops watching.
pub struct WatchHandle {
    _shutdown: Option<mpsc::Sender<()>>,
}

impl WatchHandle {
    /// Stop watching.
    pub fn stop(mut self) {
        self._shutdown.take();
    }
}

/// Watch `source_dir` for changes.
///
/// Paths under any of `excluded` (typically an output directory nested in the
/// source tree) and paths with a component starting with `.` or `_` are
/// ignored, matching what the indexer skips.
pub fn watch(
    source_dir: &Path,
    debounce: Duration,
    excluded: &[PathBuf],
) -> Result<(ChangeReceiver, WatchHandle), WatchError> {
    let watch_err = |source| WatchError {
        path: source_dir.to_path_buf(),
        source,
    };

    let (event_tx, event_rx) = mpsc::channel();
    let (shutdown_tx, shutdown_rx) = mpsc::channel::<()>();
    let debouncer = Arc::new(EventDebouncer::new(debounce));

    let root_dir = absolute(source_dir);
    let root = root_dir.clone();
    let excluded: Vec<PathBuf> = excluded.iter().map(|p| absolute(p)).collect();
    let watcher_debouncer = Arc::clone(&debouncer);
    let mut watcher = notify::recommended_watcher(move |res: notify::Result<notify::Event>| {
        let Ok(event) = res else { return };
        let Some(kind) = change_kind(event.kind) else {
            return;
        };
        for path in event.paths {
            if excluded.iter().any(|e| path.starts_with(e)) {
                continue;
            }
            if let Some(relative) = relevant_path(&root, &path) {
                watcher_debouncer.record(relative, kind);
            }
        }
    })
    .map_err(watch_err)?;

    watcher
        .watch(&root_dir, RecursiveMode::Recursive)
        .map_err(watch_err)?;
    tracing::info!(path = %source_dir.display(), "Watching for changes");

    // The watcher moves into the drain thread so it lives as long as the thread
    thread::spawn(move || {
        let _watcher = watcher;
        loop {
            match shutdown_rx.recv_timeout(DRAIN_INTERVAL) {
                Ok(()) | Err(mpsc::RecvTimeoutError::Disconnected) => break,
                Err(mpsc::RecvTimeoutError::Timeout) => {}
            }

            let batch = debouncer.drain_ready();
            if !batch.is_empty() && event_tx.send(batch).is_err() {
                break;
            }
        }
        tracing::debug!("Stopped watching");
    });

    Ok((
        ChangeReceiver { rx: event_rx },
        WatchHandle {
            _shutdown: Some(shutdown_tx),
        },
    ))
}

fn absolute(path: &Path) -> PathBuf {
    std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf())
}

fn change_kind(kind: notify::EventKind) -> Option<ChangeKind> {
    match kind {
        notify::EventKind::Create(_) => Some(ChangeKind::Created),
        notify::EventKind::Modify(_) => Some(ChangeKind::Modified),
        notify::EventKind::Remove(_) => Some(ChangeKind::Removed),
        _ => None,
    }
}

/// Path relative to `root`, or `None` if it is outside or hidden.
fn relevant_path(root: &Path, path: &Path) -> Option<PathBuf> {
    let relative = path.strip_prefix(root).ok()?;
    let hidden = relative.components().any(|c| match c {
        Component::Normal(name) => {
            let name = name.to_string_lossy();
            name.starts_with('.') || name.starts_with('_')
        }
        _ => false,
    });
    (!hidden && relative.components().next().is_some()).then(|| relative.to_path_buf())
}
