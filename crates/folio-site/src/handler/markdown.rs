use std::fs;

use pulldown_cmark::{Options, Parser, html};

use super::{Handler, HandlerError, has_extension};
use crate::node::Node;

/// In-process Markdown converter (GitHub-flavoured extensions enabled).
pub struct MarkdownHandler {
    extensions: Vec<String>,
    options: Options,
}

impl MarkdownHandler {
    /// Handler for `.md` and `.markdown` files.
    pub fn new() -> Self {
        Self::with_extensions(["md", "markdown"])
    }

    /// Handler for a custom extension list.
    pub fn with_extensions<I, S>(extensions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            extensions: extensions.into_iter().map(Into::into).collect(),
            options: Options::ENABLE_TABLES
                | Options::ENABLE_STRIKETHROUGH
                | Options::ENABLE_TASKLISTS
                | Options::ENABLE_GFM,
        }
    }

    /// Convert Markdown text to HTML.
    pub fn convert(&self, markdown: &str) -> String {
        let parser = Parser::new_ext(markdown, self.options);
        let mut output = String::with_capacity(markdown.len() * 3 / 2);
        html::push_html(&mut output, parser);
        output
    }
}

impl Default for MarkdownHandler {
    fn default() -> Self {
        Self::new()
    }
}

impl Handler for MarkdownHandler {
    fn name(&self) -> &str {
        "markdown"
    }

    fn can_handle(&self, node: &Node) -> bool {
        has_extension(node, &self.extensions)
    }

    fn interpret(&self, node: &Node) -> Result<String, HandlerError> {
        let markdown = fs::read_to_string(node.source_path()).map_err(|source| HandlerError::Io {
            path: node.source_path().to_path_buf(),
            source,
        })?;
        Ok(self.convert(&markdown))
    }
}
