//! Source tree discovery.
//!
//! [`PathIndexer`] walks the source root depth-first and returns one [`Node`]
//! per surviving entry, sorted by reference path. Entries whose name starts
//! with `.` or `_` are skipped together with everything below them, which keeps
//! per-directory override files (`.<name>.json`, `.<name>.yml`) and private
//! folders out of the site.

use std::fs;
use std::path::{Path, PathBuf};

use crate::node::{Node, NodeKind};

/// Indexing error.
#[derive(Debug, thiserror::Error)]
pub enum IndexError {
    /// Source root is missing or not a directory.
    #[error("Invalid source directory: {}", .0.display())]
    InvalidTarget(PathBuf),
    /// Listing a directory failed.
    #[error("Failed to read {}: {source}", .path.display())]
    Io {
        /// Directory being listed.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },
}

/// Walks a source directory into an ordered node list.
pub struct PathIndexer {
    source_root: PathBuf,
    output_root: PathBuf,
}

impl PathIndexer {
    /// Create an indexer mirroring `source_root` under `output_root`.
    ///
    /// Both roots are made absolute against the current directory.
    pub fn new(source_root: impl Into<PathBuf>, output_root: impl Into<PathBuf>) -> Self {
        Self {
            source_root: absolute(source_root.into()),
            output_root: absolute(output_root.into()),
        }
    }

    /// Walk the source tree.
    ///
    /// If the output root lies inside the source root it is not indexed.
    pub fn walk(&self) -> Result<Vec<Node>, IndexError> {
        if !self.source_root.is_dir() {
            return Err(IndexError::InvalidTarget(self.source_root.clone()));
        }

        let mut nodes = Vec::new();
        self.walk_directory(&self.source_root, "", &mut nodes)?;
        nodes.sort_by(|a, b| a.reference_path().cmp(b.reference_path()));

        tracing::info!(
            root = %self.source_root.display(),
            nodes = nodes.len(),
            "Indexed source tree"
        );
        Ok(nodes)
    }

    fn walk_directory(
        &self,
        dir: &Path,
        prefix: &str,
        nodes: &mut Vec<Node>,
    ) -> Result<(), IndexError> {
        let io_err = |source| IndexError::Io {
            path: dir.to_path_buf(),
            source,
        };

        for entry in fs::read_dir(dir).map_err(io_err)? {
            let entry = entry.map_err(io_err)?;
            let Ok(file_name) = entry.file_name().into_string() else {
                tracing::warn!(path = %entry.path().display(), "Skipped non UTF-8 name");
                continue;
            };
            if is_excluded(&file_name) {
                tracing::debug!(path = %entry.path().display(), "Skipped excluded entry");
                continue;
            }

            let path = entry.path();
            if path == self.output_root {
                continue;
            }

            let reference_path = if prefix.is_empty() {
                file_name
            } else {
                format!("{prefix}/{file_name}")
            };

            // Follows symlinks, so linked folders are indexed like real ones
            let is_dir = path.is_dir();
            let kind = if is_dir {
                NodeKind::Directory
            } else {
                NodeKind::File
            };
            nodes.push(Node::new(
                path.clone(),
                reference_path.clone(),
                &self.output_root,
                kind,
            ));

            if is_dir {
                self.walk_directory(&path, &reference_path, nodes)?;
            }
        }
        Ok(())
    }
}

fn absolute(path: PathBuf) -> PathBuf {
    std::path::absolute(&path).unwrap_or(path)
}

/// Hidden (`.`) and private (`_`) entries never become nodes.
fn is_excluded(file_name: &str) -> bool {
    file_name.starts_with('.') || file_name.starts_with('_')
}
