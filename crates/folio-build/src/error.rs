//! Build error types.
//!
//! [`BuildError`] aborts the whole run. [`NodeError`] is recorded against a
//! single reference path and the build carries on with the remaining nodes.

use std::path::PathBuf;

use folio_cache::{CacheError, CacheKey};
use folio_site::{HandlerError, IndexError};
use folio_theme::{AssetError, RenderError};

/// Fatal build error.
#[derive(Debug, thiserror::Error)]
pub enum BuildError {
    /// Source root is missing, not a directory, or unreadable.
    #[error(transparent)]
    Index(#[from] IndexError),
    /// A node judged fresh has no cached content.
    #[error("Cache inconsistency: {reference_path} is up to date but has no cached content (key {key})")]
    CacheMiss {
        /// Node whose slot is missing.
        reference_path: String,
        /// Missing slot.
        key: CacheKey,
    },
    /// Reading the cache failed.
    #[error("Failed to read cached content for {reference_path}: {source}")]
    Cache {
        /// Node being read.
        reference_path: String,
        /// Underlying error.
        #[source]
        source: CacheError,
    },
    /// The static asset destination exists and was not created by Folio.
    #[error("Static asset destination already exists: {}", .0.display())]
    StaticAssetConflict(PathBuf),
    /// The theme has no static asset folder.
    #[error("Static assets not found: {}", .0.display())]
    StaticAssetMissing(PathBuf),
    /// Copying static assets failed.
    #[error("Failed to install static assets: {0}")]
    StaticAsset(#[source] AssetError),
    /// Worker pool could not be created.
    #[error("Failed to start worker pool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),
    /// Filesystem error outside per-node work.
    #[error("I/O error at {}: {source}", .path.display())]
    Io {
        /// Path being accessed.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },
}

impl From<AssetError> for BuildError {
    fn from(e: AssetError) -> Self {
        match e {
            AssetError::Missing(path) => Self::StaticAssetMissing(path),
            AssetError::Conflict(path) => Self::StaticAssetConflict(path),
            e @ AssetError::Io { .. } => Self::StaticAsset(e),
        }
    }
}

/// Error confined to one node.
#[derive(Debug, thiserror::Error)]
pub enum NodeError {
    /// The handler failed to interpret the source.
    #[error(transparent)]
    Handler(#[from] HandlerError),
    /// The page template failed.
    #[error(transparent)]
    Render(#[from] RenderError),
    /// Storing interpreted content failed.
    #[error(transparent)]
    Cache(#[from] CacheError),
    /// Writing output failed.
    #[error("Failed to write {}: {source}", .path.display())]
    Io {
        /// Output path.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },
}

/// A failed node and its cause.
#[derive(Debug)]
pub struct NodeFailure {
    /// Reference path of the node.
    pub reference_path: String,
    /// What went wrong.
    pub error: NodeError,
}
