//! Change event debouncing.
//!
//! Editors often emit several events per save. [`EventDebouncer`] coalesces
//! them into one pending event per path and releases it once the path has
//! been quiet for the debounce period.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use crate::watch::{ChangeEvent, ChangeKind};

struct PendingEvent {
    kind: ChangeKind,
    deadline: Instant,
}

/// Thread-safe event debouncer.
pub(crate) struct EventDebouncer {
    pending: Mutex<HashMap<PathBuf, PendingEvent>>,
    debounce_duration: Duration,
}

impl EventDebouncer {
    pub fn new(debounce_duration: Duration) -> Self {
        Self {
            pending: Mutex::new(HashMap::new()),
            debounce_duration,
        }
    }

    /// Record an event, merging it with any pending event for the same path.
    pub fn record(&self, path: PathBuf, kind: ChangeKind) {
        use std::collections::hash_map::Entry;

        let mut pending = self.pending.lock().unwrap();
        let deadline = Instant::now() + self.debounce_duration;

        match pending.entry(path) {
            Entry::Vacant(entry) => {
                entry.insert(PendingEvent { kind, deadline });
            }
            Entry::Occupied(mut entry) => match coalesce(entry.get().kind, kind) {
                Some(kind) => {
                    let event = entry.get_mut();
                    event.kind = kind;
                    event.deadline = deadline;
                }
                None => {
                    entry.remove();
                }
            },
        }
    }

    /// Remove and return events whose deadline has passed, sorted by path.
    pub fn drain_ready(&self) -> Vec<ChangeEvent> {
        let mut pending = self.pending.lock().unwrap();
        let now = Instant::now();

        let mut ready: Vec<ChangeEvent> = Vec::new();
        pending.retain(|path, event| {
            if event.deadline <= now {
                ready.push(ChangeEvent {
                    path: path.clone(),
                    kind: event.kind,
                });
                false
            } else {
                true
            }
        });
        ready.sort_by(|a, b| a.path.cmp(&b.path));
        ready
    }
}

/// Merge two event kinds for one path.
///
/// Returns `None` when the pair cancels out (created, then removed).
#[allow(clippy::match_same_arms)]
fn coalesce(existing: ChangeKind, new: ChangeKind) -> Option<ChangeKind> {
    use ChangeKind::{Created, Modified, Removed};

    match (existing, new) {
        (Created, Created | Modified) => Some(Created),
        (Created, Removed) => None,

        (Modified, Created) => Some(Created),
        (Modified, Modified) => Some(Modified),
        (Modified, Removed) => Some(Removed),

        // Replaced in place
        (Removed, Created) => Some(Modified),
        (Removed, Modified | Removed) => Some(Removed),
    }
}
