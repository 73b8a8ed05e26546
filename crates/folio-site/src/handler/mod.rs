//! Content handlers and capability-based dispatch.
//!
//! A [`Handler`] recognises nodes it can interpret and turns their source into
//! HTML. [`HandlerRegistry`] tests handlers in registration order and binds
//! the first one whose [`Handler::can_handle`] returns true. Nodes no handler
//! accepts are copied verbatim during emission.

mod command;
mod markdown;
mod title;

use std::path::PathBuf;
use std::process::ExitStatus;

pub use command::CommandHandler;
pub use markdown::MarkdownHandler;
pub use title::extract_title;

use crate::node::{HandlerId, Node};

/// Handler invocation error.
#[derive(Debug, thiserror::Error)]
pub enum HandlerError {
    /// External converter could not be started (e.g. binary not installed).
    #[error("Failed to run {program}: {source}")]
    Spawn {
        /// Program name.
        program: String,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },
    /// External converter exited unsuccessfully.
    #[error("{program} failed ({status}): {stderr}")]
    Failed {
        /// Program name.
        program: String,
        /// Exit status.
        status: ExitStatus,
        /// Captured standard error, trimmed.
        stderr: String,
    },
    /// Reading the source failed.
    #[error("Failed to read {}: {source}", .path.display())]
    Io {
        /// Source file.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },
    /// Converter output was not valid UTF-8.
    #[error("{program} produced invalid UTF-8: {source}")]
    Utf8 {
        /// Program name.
        program: String,
        /// Decoding error.
        #[source]
        source: std::string::FromUtf8Error,
    },
}

/// A pluggable content transform.
pub trait Handler: Send + Sync {
    /// Short name shown in listings (e.g. "markdown").
    fn name(&self) -> &str;

    /// Whether this handler can interpret `node`.
    fn can_handle(&self, node: &Node) -> bool;

    /// Convert the node's source into HTML.
    fn interpret(&self, node: &Node) -> Result<String, HandlerError>;
}

/// Ordered handler list with first-match dispatch.
#[derive(Default)]
pub struct HandlerRegistry {
    handlers: Vec<Box<dyn Handler>>,
}

impl HandlerRegistry {
    /// Empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a handler after all previously registered ones.
    pub fn register(&mut self, handler: impl Handler + 'static) -> HandlerId {
        self.handlers.push(Box::new(handler));
        HandlerId(self.handlers.len() - 1)
    }

    /// Builder-style [`register`](Self::register).
    #[must_use]
    pub fn with(mut self, handler: impl Handler + 'static) -> Self {
        self.register(handler);
        self
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }

    /// First handler accepting `node`, in registration order.
    pub fn find(&self, node: &Node) -> Option<HandlerId> {
        self.handlers
            .iter()
            .position(|h| h.can_handle(node))
            .map(HandlerId)
    }

    /// Handler registered under `id`.
    ///
    /// Returns `None` for ids issued by another registry.
    pub fn get(&self, id: HandlerId) -> Option<&dyn Handler> {
        self.handlers.get(id.0).map(AsRef::as_ref)
    }

    /// Handler bound to `node`, if any.
    pub fn handler_for(&self, node: &Node) -> Option<&dyn Handler> {
        node.handler().and_then(|id| self.get(id))
    }

    /// Bind a handler to every node some handler accepts.
    ///
    /// Nodes already bound keep their handler. Returns the number of nodes
    /// bound by this call.
    pub fn assign(&self, nodes: &mut [Node]) -> usize {
        let mut bound = 0;
        for node in nodes.iter_mut().filter(|n| !n.is_handled()) {
            let Some(id) = self.find(node) else {
                continue;
            };
            if node.bind_handler(id) {
                tracing::debug!(
                    path = %node.reference_path(),
                    handler = self.handlers[id.0].name(),
                    "Bound handler"
                );
                bound += 1;
            }
        }
        bound
    }
}

/// Case-insensitive extension match for file nodes.
fn has_extension(node: &Node, extensions: &[String]) -> bool {
    node.is_file()
        && node
            .extension()
            .is_some_and(|ext| extensions.iter().any(|e| e.eq_ignore_ascii_case(ext)))
}
