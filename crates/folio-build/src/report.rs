use folio_theme::StaticInstall;

use crate::error::NodeFailure;

/// Outcome of one build run.
#[derive(Debug)]
pub struct BuildReport {
    /// Nodes found by the indexer.
    pub indexed: usize,
    /// Documents converted by their handler in this run.
    pub interpreted: usize,
    /// Documents served from the content cache.
    pub reused: usize,
    /// Pages written through the renderer.
    pub rendered: usize,
    /// Pass-through files copied to the output tree.
    pub copied: usize,
    /// Reference paths dropped because another node took their tree slot.
    pub skipped: Vec<String>,
    /// Static asset installation result.
    pub static_assets: StaticInstall,
    /// Nodes that failed, in reference path order.
    pub failures: Vec<NodeFailure>,
}

impl BuildReport {
    /// True when no node failed.
    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }
}
