//! Hierarchical document tree.
//!
//! [`TreeAssembler`] folds the sorted node list into a [`DocTree`]. Entries
//! live in a flat arena addressed by [`DocId`]; each entry is either a
//! [`DirectoryLevel`] owning a sorted map of children, or a [`DocumentLeaf`]
//! wrapping one file node. Children point back to their level through an
//! explicit `parent` id.
//!
//! Directory queries (`title`, `path`, `kind`) delegate to the level's index
//! document when it has one.
//!
//! Navigation relationships (ancestors, neighbours, relative links) are
//! computed on demand from the arena.

use std::collections::{BTreeMap, HashMap};

use crate::node::{Node, NodeKind};

/// Handle of an entry in a [`DocTree`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DocId(usize);

/// A directory level of the tree.
#[derive(Debug)]
pub struct DirectoryLevel {
    segment: String,
    parent: Option<DocId>,
    level: usize,
    children: BTreeMap<String, DocId>,
    node: Option<Node>,
}

/// A file leaf of the tree.
#[derive(Debug)]
pub struct DocumentLeaf {
    segment: String,
    parent: DocId,
    level: usize,
    node: Node,
    title: Option<String>,
}

/// Tree entry.
#[derive(Debug)]
pub enum DocEntry {
    /// Directory level, possibly created on demand without a node.
    Directory(DirectoryLevel),
    /// File document.
    Document(DocumentLeaf),
}

impl DocEntry {
    /// Tree path segment (empty for the root).
    pub fn segment(&self) -> &str {
        match self {
            Self::Directory(d) => &d.segment,
            Self::Document(d) => &d.segment,
        }
    }

    /// Containing directory level.
    pub fn parent(&self) -> Option<DocId> {
        match self {
            Self::Directory(d) => d.parent,
            Self::Document(d) => Some(d.parent),
        }
    }

    /// Depth from the root (root = 0).
    pub fn level(&self) -> usize {
        match self {
            Self::Directory(d) => d.level,
            Self::Document(d) => d.level,
        }
    }

    /// Underlying node; `None` for the root and on-demand levels.
    pub fn node(&self) -> Option<&Node> {
        match self {
            Self::Directory(d) => d.node.as_ref(),
            Self::Document(d) => Some(&d.node),
        }
    }

    pub fn is_directory(&self) -> bool {
        matches!(self, Self::Directory(_))
    }
}

/// One entry of a neighbour listing.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Neighbour {
    /// Sibling entry.
    pub id: DocId,
    /// True if this entry is the queried one.
    pub current: bool,
}

/// Builds a [`DocTree`] from a sorted node list.
pub struct TreeAssembler {
    index_name: String,
    titles: HashMap<String, String>,
}

impl Default for TreeAssembler {
    fn default() -> Self {
        Self::new()
    }
}

impl TreeAssembler {
    /// Assembler treating `index` documents as directory indexes.
    pub fn new() -> Self {
        Self {
            index_name: "index".to_owned(),
            titles: HashMap::new(),
        }
    }

    /// Override the directory index document name.
    #[must_use]
    pub fn with_index_name(mut self, index_name: impl Into<String>) -> Self {
        self.index_name = index_name.into();
        self
    }

    /// Document titles keyed by reference path.
    #[must_use]
    pub fn with_titles(mut self, titles: HashMap<String, String>) -> Self {
        self.titles = titles;
        self
    }

    /// Insert `nodes` in order.
    ///
    /// The first node reaching a tree slot wins. A later node resolving to an
    /// occupied slot is skipped and recorded in [`DocTree::skipped`]. The only
    /// exception is a directory node arriving at a level that was created on
    /// demand, which then adopts the node.
    pub fn assemble(mut self, nodes: impl IntoIterator<Item = Node>) -> DocTree {
        let mut tree = DocTree {
            entries: vec![DocEntry::Directory(DirectoryLevel {
                segment: String::new(),
                parent: None,
                level: 0,
                children: BTreeMap::new(),
                node: None,
            })],
            index_name: self.index_name,
            skipped: Vec::new(),
        };

        for node in nodes {
            let title = self.titles.remove(node.reference_path());
            tree.insert(node, title);
        }

        tracing::debug!(
            entries = tree.entries.len(),
            skipped = tree.skipped.len(),
            "Assembled document tree"
        );
        tree
    }
}

/// Hierarchical view of one build's nodes.
#[derive(Debug)]
pub struct DocTree {
    entries: Vec<DocEntry>,
    index_name: String,
    skipped: Vec<String>,
}

impl DocTree {
    const ROOT: DocId = DocId(0);

    fn insert(&mut self, node: Node, title: Option<String>) {
        let name = node.name().to_owned();
        let mut segments: Vec<&str> = name.split('/').collect();
        let Some(last) = segments.pop() else {
            return;
        };

        let mut current = Self::ROOT;
        for segment in segments {
            match self.child_level(current, segment) {
                Some(level) => current = level,
                None => {
                    self.skip(&node);
                    return;
                }
            }
        }

        let existing = self.directory(current).and_then(|d| d.children.get(last).copied());
        match existing {
            None => {
                let level = self.entries[current.0].level() + 1;
                let entry = match node.kind() {
                    NodeKind::File => DocEntry::Document(DocumentLeaf {
                        segment: last.to_owned(),
                        parent: current,
                        level,
                        node,
                        title,
                    }),
                    NodeKind::Directory => DocEntry::Directory(DirectoryLevel {
                        segment: last.to_owned(),
                        parent: Some(current),
                        level,
                        children: BTreeMap::new(),
                        node: Some(node),
                    }),
                };
                self.push_child(current, last, entry);
            }
            Some(id) => {
                if let DocEntry::Directory(dir) = &mut self.entries[id.0]
                    && dir.node.is_none()
                    && !node.is_file()
                {
                    dir.node = Some(node);
                } else {
                    self.skip(&node);
                }
            }
        }
    }

    /// Directory level `segment` below `parent`, created on demand.
    ///
    /// Returns `None` when a document already occupies the slot.
    fn child_level(&mut self, parent: DocId, segment: &str) -> Option<DocId> {
        let existing = self.directory(parent)?.children.get(segment).copied();
        match existing {
            Some(id) => self.entries[id.0].is_directory().then_some(id),
            None => {
                let level = self.entries[parent.0].level() + 1;
                let entry = DocEntry::Directory(DirectoryLevel {
                    segment: segment.to_owned(),
                    parent: Some(parent),
                    level,
                    children: BTreeMap::new(),
                    node: None,
                });
                Some(self.push_child(parent, segment, entry))
            }
        }
    }

    fn push_child(&mut self, parent: DocId, segment: &str, entry: DocEntry) -> DocId {
        let id = DocId(self.entries.len());
        self.entries.push(entry);
        if let DocEntry::Directory(dir) = &mut self.entries[parent.0] {
            dir.children.insert(segment.to_owned(), id);
        }
        id
    }

    fn skip(&mut self, node: &Node) {
        tracing::debug!(path = %node.reference_path(), "Skipped duplicate tree slot");
        self.skipped.push(node.reference_path().to_owned());
    }

    fn directory(&self, id: DocId) -> Option<&DirectoryLevel> {
        match &self.entries[id.0] {
            DocEntry::Directory(dir) => Some(dir),
            DocEntry::Document(_) => None,
        }
    }

    /// Root level.
    pub fn root(&self) -> DocId {
        Self::ROOT
    }

    /// Entry for `id`.
    ///
    /// # Panics
    ///
    /// Panics if `id` belongs to another tree.
    pub fn get(&self, id: DocId) -> &DocEntry {
        &self.entries[id.0]
    }

    /// Number of entries, root included.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True if nothing but the root exists.
    pub fn is_empty(&self) -> bool {
        self.entries.len() == 1
    }

    /// Reference paths of nodes dropped because their slot was taken.
    pub fn skipped(&self) -> &[String] {
        &self.skipped
    }

    /// All entry ids in insertion order, root first.
    pub fn ids(&self) -> impl Iterator<Item = DocId> + '_ {
        (0..self.entries.len()).map(DocId)
    }

    /// Document leaves in insertion order.
    pub fn documents(&self) -> impl Iterator<Item = DocId> + '_ {
        self.ids().filter(|&id| !self.entries[id.0].is_directory())
    }

    /// Entry at tree path `name` (node name form, e.g. `guide/setup`).
    /// The empty string resolves to the root.
    pub fn find(&self, name: &str) -> Option<DocId> {
        name.split('/')
            .filter(|s| !s.is_empty())
            .try_fold(Self::ROOT, |current, segment| {
                self.directory(current)?.children.get(segment).copied()
            })
    }

    /// Children of a directory level, sorted by segment.
    pub fn children(&self, id: DocId) -> impl Iterator<Item = DocId> + '_ {
        self.directory(id)
            .into_iter()
            .flat_map(|dir| dir.children.values().copied())
    }

    pub fn parent(&self, id: DocId) -> Option<DocId> {
        self.entries[id.0].parent()
    }

    pub fn level(&self, id: DocId) -> usize {
        self.entries[id.0].level()
    }

    pub fn node(&self, id: DocId) -> Option<&Node> {
        self.entries[id.0].node()
    }

    /// Index document of a directory level.
    pub fn index(&self, id: DocId) -> Option<DocId> {
        let child = *self.directory(id)?.children.get(&self.index_name)?;
        (!self.entries[child.0].is_directory()).then_some(child)
    }

    /// Whether `id` is the index document of its level.
    pub fn is_index(&self, id: DocId) -> bool {
        self.parent(id)
            .is_some_and(|parent| self.index(parent) == Some(id))
    }

    /// Entry that speaks for `id`: its index document for directories.
    fn delegate(&self, id: DocId) -> Option<DocId> {
        match &self.entries[id.0] {
            DocEntry::Document(_) => Some(id),
            DocEntry::Directory(_) => self.index(id),
        }
    }

    /// Document title, or the index document's title for directories.
    pub fn title(&self, id: DocId) -> Option<&str> {
        match &self.entries[self.delegate(id)?.0] {
            DocEntry::Document(doc) => doc.title.as_deref(),
            DocEntry::Directory(_) => None,
        }
    }

    /// Reference path, or the index document's for directories.
    pub fn path(&self, id: DocId) -> Option<&str> {
        self.node(self.delegate(id)?).map(Node::reference_path)
    }

    /// Output link path, or the index document's for directories.
    pub fn link_path(&self, id: DocId) -> Option<&str> {
        self.node(self.delegate(id)?).map(Node::link_path)
    }

    /// Node kind, or the index document's for directories.
    pub fn kind(&self, id: DocId) -> NodeKind {
        self.delegate(id)
            .and_then(|d| self.node(d))
            .map_or(NodeKind::Directory, Node::kind)
    }

    /// Whether `id` is a document with a bound handler.
    pub fn is_page(&self, id: DocId) -> bool {
        matches!(&self.entries[id.0], DocEntry::Document(doc) if doc.node.is_handled())
    }

    /// Directory levels from the root down to the level containing `id`.
    ///
    /// An index document stands for its own directory, so that directory is
    /// left out of the chain.
    pub fn ancestors(&self, id: DocId) -> Vec<DocId> {
        let mut current = self.parent(id);
        if self.is_index(id) {
            current = current.and_then(|p| self.parent(p));
        }

        let mut ancestors = Vec::new();
        while let Some(level) = current {
            ancestors.push(level);
            current = self.parent(level);
        }
        ancestors.reverse();
        ancestors
    }

    /// Pages and indexed directories of the level containing `id`.
    ///
    /// For a directory the listing covers its own children. Entries are sorted
    /// by segment with the level's index document promoted to the front.
    pub fn neighbours(&self, id: DocId) -> Vec<Neighbour> {
        let level = if self.entries[id.0].is_directory() {
            Some(id)
        } else {
            self.parent(id)
        };
        let Some(level) = level else {
            return Vec::new();
        };
        let index = self.index(level);
        let current_index = (level == id).then_some(index).flatten();

        let mut neighbours: Vec<Neighbour> = self
            .children(level)
            .filter(|&child| {
                if self.entries[child.0].is_directory() {
                    self.index(child).is_some_and(|i| self.is_page(i))
                } else {
                    self.is_page(child)
                }
            })
            .map(|child| Neighbour {
                id: child,
                current: child == id || Some(child) == current_index,
            })
            .collect();

        if let Some(pos) = neighbours.iter().position(|n| Some(n.id) == index) {
            let index_entry = neighbours.remove(pos);
            neighbours.insert(0, index_entry);
        }
        neighbours
    }

    /// [`relative_path_to`] between the paths of two entries.
    pub fn relative_path_to(&self, id: DocId, base: DocId) -> Option<String> {
        Some(relative_path_to(self.path(id)?, self.path(base)?))
    }
}

/// Anchored reference from `base` to `path`, both reference paths.
///
/// Equal paths give a same-page anchor (`#<file name>`). Otherwise the result
/// climbs from `base` to the shared prefix with `../`, descends into the
/// divergent suffix of `path` and ends with `#<shared depth>`:
///
/// ```
/// use folio_site::relative_path_to;
///
/// assert_eq!(relative_path_to("a/b/c.md", "a/d.md"), "../b/c.md#1");
/// assert_eq!(relative_path_to("a/d.md", "a/d.md"), "#d.md");
/// ```
pub fn relative_path_to(path: &str, base: &str) -> String {
    if path == base {
        let file_name = path.rsplit_once('/').map_or(path, |(_, f)| f);
        return format!("#{file_name}");
    }

    let path_segs: Vec<&str> = path.split('/').collect();
    let base_segs: Vec<&str> = base.split('/').collect();
    let common = path_segs
        .iter()
        .zip(&base_segs)
        .take_while(|(a, b)| a == b)
        .count();

    let ups = "../".repeat(base_segs.len() - common);
    let suffix = path_segs[common..].join("/");
    format!("{ups}{suffix}#{common}")
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use super::*;
    use crate::node::HandlerId;
    use pretty_assertions::assert_eq;

    static_assertions::assert_impl_all!(DocTree: Send, Sync);

    fn page(reference_path: &str) -> Node {
        let mut node = Node::new(
            Path::new("/src").join(reference_path),
            reference_path.to_owned(),
            Path::new("/out"),
            NodeKind::File,
        );
        node.bind_handler(HandlerId(0));
        node
    }

    fn asset(reference_path: &str) -> Node {
        Node::new(
            Path::new("/src").join(reference_path),
            reference_path.to_owned(),
            Path::new("/out"),
            NodeKind::File,
        )
    }

    fn dir(reference_path: &str) -> Node {
        Node::new(
            Path::new("/src").join(reference_path),
            reference_path.to_owned(),
            Path::new("/out"),
            NodeKind::Directory,
        )
    }

    fn names(tree: &DocTree, neighbours: &[Neighbour]) -> Vec<String> {
        neighbours
            .iter()
            .map(|n| {
                let name = tree.node(n.id).map_or("", Node::name);
                if n.current {
                    format!("*{name}")
                } else {
                    name.to_owned()
                }
            })
            .collect()
    }

    fn site() -> DocTree {
        TreeAssembler::new()
            .with_titles(HashMap::from([
                ("index.md".to_owned(), "Home".to_owned()),
                ("guide/index.md".to_owned(), "Guide".to_owned()),
                ("guide/setup.md".to_owned(), "Setup".to_owned()),
            ]))
            .assemble(vec![
                dir("guide"),
                page("guide/index.md"),
                page("guide/setup.md"),
                page("index.md"),
            ])
    }

    #[test]
    fn test_levels_follow_depth() {
        let tree = site();
        let guide = tree.find("guide").unwrap();
        let setup = tree.find("guide/setup").unwrap();

        assert_eq!(tree.level(tree.root()), 0);
        assert_eq!(tree.level(guide), 1);
        assert_eq!(tree.level(setup), 2);
        assert_eq!(tree.parent(setup), Some(guide));
        assert_eq!(tree.parent(guide), Some(tree.root()));
    }

    #[test]
    fn test_directory_delegates_to_index() {
        let tree = site();
        let guide = tree.find("guide").unwrap();

        assert_eq!(tree.title(guide), Some("Guide"));
        assert_eq!(tree.path(guide), Some("guide/index.md"));
        assert_eq!(tree.link_path(guide), Some("guide/index.html"));
        assert_eq!(tree.kind(guide), NodeKind::File);
        assert_eq!(tree.title(tree.root()), Some("Home"));
    }

    #[test]
    fn test_directory_without_index_uses_defaults() {
        let tree = TreeAssembler::new().assemble(vec![dir("misc"), page("misc/notes.md")]);
        let misc = tree.find("misc").unwrap();

        assert_eq!(tree.title(misc), None);
        assert_eq!(tree.path(misc), None);
        assert_eq!(tree.kind(misc), NodeKind::Directory);
    }

    #[test]
    fn test_ancestors_skip_own_directory_for_index() {
        let tree = site();
        let root = tree.root();
        let guide = tree.find("guide").unwrap();

        let guide_index = tree.find("guide/index").unwrap();
        assert_eq!(tree.ancestors(guide_index), vec![root]);
        assert_eq!(tree.path(root), Some("index.md"));

        let setup = tree.find("guide/setup").unwrap();
        assert_eq!(tree.ancestors(setup), vec![root, guide]);

        let home = tree.find("index").unwrap();
        assert!(tree.ancestors(home).is_empty());
    }

    #[test]
    fn test_neighbours_promote_index() {
        let tree = TreeAssembler::new().assemble(vec![
            dir("a"),
            page("a/b.md"),
            dir("a/c"),
            page("a/c/index.md"),
            page("a/index.md"),
        ]);
        let a = tree.find("a").unwrap();
        let b = tree.find("a/b").unwrap();

        assert_eq!(names(&tree, &tree.neighbours(a)), vec!["*a/index", "a/b", "a/c"]);
        assert_eq!(names(&tree, &tree.neighbours(b)), vec!["a/index", "*a/b", "a/c"]);
    }

    #[test]
    fn test_neighbours_promote_index_any_insertion_order() {
        let tree = TreeAssembler::new().assemble(vec![
            page("a/c/index.md"),
            page("a/b.md"),
            page("a/index.md"),
        ]);
        let a = tree.find("a").unwrap();

        let neighbours = tree.neighbours(a);
        assert_eq!(tree.node(neighbours[0].id).unwrap().name(), "a/index");
        assert_eq!(neighbours.len(), 3);
    }

    #[test]
    fn test_neighbours_exclude_assets_and_unindexed_directories() {
        let tree = TreeAssembler::new().assemble(vec![
            page("alpha.md"),
            dir("images"),
            asset("images/logo.png"),
            page("index.md"),
            asset("robots.txt"),
        ]);
        let alpha = tree.find("alpha").unwrap();

        assert_eq!(names(&tree, &tree.neighbours(alpha)), vec!["index", "*alpha"]);
    }

    #[test]
    fn test_duplicate_slot_first_wins() {
        let tree = TreeAssembler::new().assemble(vec![page("intro.md"), page("intro.rst")]);
        let intro = tree.find("intro").unwrap();

        assert_eq!(tree.path(intro), Some("intro.md"));
        assert_eq!(tree.skipped(), ["intro.rst".to_owned()]);
        assert_eq!(tree.documents().count(), 1);
    }

    #[test]
    fn test_file_does_not_replace_directory_slot() {
        let tree = TreeAssembler::new().assemble(vec![
            dir("guide"),
            page("guide.md"),
            page("guide/setup.md"),
        ]);

        let guide = tree.find("guide").unwrap();
        assert!(tree.get(guide).is_directory());
        assert_eq!(tree.skipped(), ["guide.md".to_owned()]);
        assert!(tree.find("guide/setup").is_some());
    }

    #[test]
    fn test_directory_node_adopts_on_demand_level() {
        let tree = TreeAssembler::new().assemble(vec![page("guide/setup.md"), dir("guide")]);
        let guide = tree.find("guide").unwrap();

        assert_eq!(tree.node(guide).map(Node::reference_path), Some("guide"));
        assert!(tree.skipped().is_empty());
    }

    #[test]
    fn test_children_under_document_slot_are_skipped() {
        let tree = TreeAssembler::new().assemble(vec![page("a.md"), page("a/b.md")]);

        assert_eq!(tree.skipped(), ["a/b.md".to_owned()]);
    }

    #[test]
    fn test_relative_path_to_climbs_one_level() {
        assert_eq!(relative_path_to("a/b/c.md", "a/d.md"), "../b/c.md#1");
    }

    #[test]
    fn test_relative_path_to_same_page_anchor() {
        assert_eq!(relative_path_to("guide/setup.md", "guide/setup.md"), "#setup.md");
    }

    #[test]
    fn test_relative_path_to_unrelated_roots() {
        assert_eq!(relative_path_to("x/y.md", "a/b/c.md"), "../../../x/y.md#0");
    }

    #[test]
    fn test_tree_relative_path_to_between_entries() {
        let tree = site();
        let setup = tree.find("guide/setup").unwrap();
        let home = tree.find("index").unwrap();

        assert_eq!(
            tree.relative_path_to(setup, home),
            Some("../guide/setup.md#0".to_owned())
        );
    }

    #[test]
    fn test_find_root_and_missing() {
        let tree = site();
        assert_eq!(tree.find(""), Some(tree.root()));
        assert_eq!(tree.find("nope"), None);
    }
}
