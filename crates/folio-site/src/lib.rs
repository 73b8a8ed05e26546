//! Source side of the Folio build pipeline.
//!
//! - [`PathIndexer`] walks the source root into a sorted list of [`Node`]s.
//! - [`StalenessOracle`] decides per node whether output must be regenerated.
//! - [`HandlerRegistry`] binds each node to the first [`Handler`] accepting it.
//! - [`TreeAssembler`] folds interpreted nodes into a navigable [`DocTree`].
//!
//! # Example
//!
//! ```no_run
//! use folio_site::{HandlerRegistry, MarkdownHandler, PathIndexer, TreeAssembler};
//!
//! let mut nodes = PathIndexer::new("docs", "build").walk()?;
//! let registry = HandlerRegistry::new().with(MarkdownHandler::new());
//! registry.assign(&mut nodes);
//! let tree = TreeAssembler::new().assemble(nodes);
//! # Ok::<(), folio_site::IndexError>(())
//! ```

mod handler;
mod indexer;
mod node;
mod staleness;
mod tree;

pub use handler::{
    CommandHandler, Handler, HandlerError, HandlerRegistry, MarkdownHandler, extract_title,
};
pub use indexer::{IndexError, PathIndexer};
pub use node::{HandlerId, Node, NodeKind};
pub use staleness::{StalenessOracle, is_stale_at};
pub use tree::{
    DirectoryLevel, DocEntry, DocId, DocTree, DocumentLeaf, Neighbour, TreeAssembler,
    relative_path_to,
};
