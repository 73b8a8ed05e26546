//! Navigation entries for page templates.

use folio_site::{DocId, DocTree};
use folio_theme::NavEntry;

/// Title shown for the site root when it has no index document.
const ROOT_TITLE: &str = "Home";

/// Compute a relative link from one output path to another (RFC 3986).
///
/// The last segment of `from` is the page itself, so links resolve against
/// its directory.
///
/// ```ignore
/// assert_eq!(relative_link("guide/setup.html", "index.html"), "../index.html");
/// assert_eq!(relative_link("index.html", "guide/index.html"), "guide/index.html");
/// ```
pub(crate) fn relative_link(from: &str, to: &str) -> String {
    let from_segs: Vec<&str> = from.split('/').filter(|s| !s.is_empty()).collect();
    let to_segs: Vec<&str> = to.split('/').filter(|s| !s.is_empty()).collect();

    let from_dir = if from.ends_with('/') || from_segs.is_empty() {
        &from_segs[..]
    } else {
        &from_segs[..from_segs.len() - 1]
    };

    let common = from_dir
        .iter()
        .zip(&to_segs)
        .take_while(|(a, b)| a == b)
        .count();

    let result = format!(
        "{}{}",
        "../".repeat(from_dir.len() - common),
        to_segs[common..].join("/")
    );
    if result.is_empty() {
        "./".to_owned()
    } else {
        result
    }
}

/// Title of an entry, falling back to its tree segment.
pub(crate) fn display_title(tree: &DocTree, id: DocId) -> String {
    if let Some(title) = tree.title(id) {
        return title.to_owned();
    }
    match tree.get(id).segment() {
        "" => ROOT_TITLE.to_owned(),
        segment => segment.to_owned(),
    }
}

/// Breadcrumb entries for `page`, linked relative to `page_link`.
pub(crate) fn ancestors(tree: &DocTree, page: DocId, page_link: &str) -> Vec<NavEntry> {
    tree.ancestors(page)
        .into_iter()
        .map(|id| NavEntry {
            title: display_title(tree, id),
            href: tree.link_path(id).map(|to| relative_link(page_link, to)),
            current: false,
            is_directory: true,
        })
        .collect()
}

/// Sibling menu entries for `page`, linked relative to `page_link`.
pub(crate) fn neighbours(tree: &DocTree, page: DocId, page_link: &str) -> Vec<NavEntry> {
    tree.neighbours(page)
        .into_iter()
        .map(|n| NavEntry {
            title: display_title(tree, n.id),
            href: tree.link_path(n.id).map(|to| relative_link(page_link, to)),
            current: n.current,
            is_directory: tree.get(n.id).is_directory(),
        })
        .collect()
}
