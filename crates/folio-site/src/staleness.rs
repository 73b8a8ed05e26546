//! Per-node regeneration decisions.
//!
//! A node is stale when it has no output artifact yet, or when its source was
//! modified strictly after the artifact. Equal timestamps count as fresh, so a
//! source saved within the filesystem's timestamp resolution of the last build
//! can be missed.

use std::fs;
use std::time::SystemTime;

use crate::node::Node;

/// Decides whether a node must be regenerated.
#[derive(Clone, Copy, Debug, Default)]
pub struct StalenessOracle {
    force: bool,
}

impl StalenessOracle {
    /// Oracle comparing source and output modification times.
    pub fn new() -> Self {
        Self::default()
    }

    /// Oracle reporting every node as stale.
    pub fn always_stale() -> Self {
        Self { force: true }
    }

    /// Whether `node` must be regenerated.
    ///
    /// An unreadable source is reported stale so the failure surfaces when the
    /// node is interpreted.
    pub fn is_stale(&self, node: &Node) -> bool {
        if self.force {
            return true;
        }
        let output = modified(node.output_path());
        let Some(source) = modified(node.source_path()) else {
            return true;
        };
        is_stale_at(source, output)
    }
}

/// Staleness rule on raw timestamps.
pub fn is_stale_at(source: SystemTime, output: Option<SystemTime>) -> bool {
    output.is_none_or(|output| source > output)
}

fn modified(path: &std::path::Path) -> Option<SystemTime> {
    fs::metadata(path).and_then(|m| m.modified()).ok()
}
