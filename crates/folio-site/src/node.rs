//! Flat node descriptors produced by the indexer.

use std::path::{Path, PathBuf};

use folio_cache::CacheKey;

/// Filesystem entry type, fixed at creation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum NodeKind {
    /// Regular file.
    File,
    /// Directory.
    Directory,
}

/// Index of a handler inside its [`HandlerRegistry`](crate::HandlerRegistry).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct HandlerId(pub(crate) usize);

/// One file or directory under the source root.
///
/// Nodes are immutable apart from the single handler binding performed by
/// [`HandlerRegistry::assign`](crate::HandlerRegistry::assign).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Node {
    source_path: PathBuf,
    reference_path: String,
    output_path: PathBuf,
    link_path: String,
    kind: NodeKind,
    name: String,
    handler: Option<HandlerId>,
    cache_key: CacheKey,
}

impl Node {
    /// Create a node for `reference_path` (slash separated, relative to the source root).
    pub fn new(
        source_path: PathBuf,
        reference_path: String,
        output_root: &Path,
        kind: NodeKind,
    ) -> Self {
        let output_path = output_root.join(&reference_path);
        let name = match kind {
            NodeKind::File => strip_extension(&reference_path).to_owned(),
            NodeKind::Directory => reference_path.clone(),
        };
        let cache_key = CacheKey::for_reference_path(&reference_path);
        Self {
            source_path,
            link_path: reference_path.clone(),
            reference_path,
            output_path,
            kind,
            name,
            handler: None,
            cache_key,
        }
    }

    /// Absolute location of the source entry.
    pub fn source_path(&self) -> &Path {
        &self.source_path
    }

    /// Path relative to the source root, `/` separated. Unique per indexing run.
    pub fn reference_path(&self) -> &str {
        &self.reference_path
    }

    /// Destination under the output root.
    pub fn output_path(&self) -> &Path {
        &self.output_path
    }

    /// Output location relative to the output root, used for cross-page links.
    pub fn link_path(&self) -> &str {
        &self.link_path
    }

    pub fn kind(&self) -> NodeKind {
        self.kind
    }

    pub fn is_file(&self) -> bool {
        self.kind == NodeKind::File
    }

    /// Reference path without its file extension; the tree path of the node.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Last segment of the reference path.
    pub fn file_name(&self) -> &str {
        self.reference_path
            .rsplit_once('/')
            .map_or(self.reference_path.as_str(), |(_, f)| f)
    }

    /// File extension without the dot, as written on disk.
    pub fn extension(&self) -> Option<&str> {
        if self.kind == NodeKind::Directory {
            return None;
        }
        let file_name = self.file_name();
        match file_name.rfind('.') {
            Some(0) | None => None,
            Some(i) => Some(&file_name[i + 1..]),
        }
    }

    pub fn handler(&self) -> Option<HandlerId> {
        self.handler
    }

    /// Whether a handler has been bound.
    pub fn is_handled(&self) -> bool {
        self.handler.is_some()
    }

    /// Digest of the reference path locating interpreted content.
    pub fn cache_key(&self) -> &CacheKey {
        &self.cache_key
    }

    /// Bind `handler` and rewrite the output and link extensions to `.html`.
    ///
    /// Returns `false` without touching the node if a handler is already bound.
    pub(crate) fn bind_handler(&mut self, handler: HandlerId) -> bool {
        if self.handler.is_some() {
            return false;
        }
        self.handler = Some(handler);
        self.output_path.set_extension("html");
        self.link_path = format!("{}.html", strip_extension(&self.reference_path));
        true
    }
}

/// Strip the extension of the last segment of a slash separated path.
fn strip_extension(path: &str) -> &str {
    let start = path.rfind('/').map_or(0, |i| i + 1);
    match path[start..].rfind('.') {
        Some(0) | None => path,
        Some(i) => &path[..start + i],
    }
}
