use serde::Serialize;

/// Link shown in breadcrumbs or the sibling menu.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct NavEntry {
    /// Display title.
    pub title: String,
    /// Link relative to the current page; `None` for directories without an index.
    pub href: Option<String>,
    /// True for the page being rendered.
    pub current: bool,
    /// True if the entry stands for a directory.
    pub is_directory: bool,
}

/// Values available to a page template.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct PageContext {
    /// Page title.
    pub title: String,
    /// Interpreted HTML body.
    pub content: String,
    /// Breadcrumb chain from the site root.
    pub ancestors: Vec<NavEntry>,
    /// Pages sharing the current directory, index first.
    pub neighbours: Vec<NavEntry>,
    /// Relative path from the page to the static asset folder.
    pub static_path: String,
    /// Directory depth of the page (0 at the site root).
    pub level: usize,
}

/// Relative path from a page at `depth` to the static folder `static_dir`.
///
/// ```
/// assert_eq!(folio_theme::static_path(0, "_static"), "_static");
/// assert_eq!(folio_theme::static_path(2, "_static"), "../../_static");
/// ```
pub fn static_path(depth: usize, static_dir: &str) -> String {
    format!("{}{static_dir}", "../".repeat(depth))
}
