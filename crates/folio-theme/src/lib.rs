//! Theme layer of Folio: page templates and static assets.
//!
//! The build pipeline hands every document to a [`Renderer`] together with a
//! [`PageContext`]. [`TemplateRenderer`] implements it with minijinja and a
//! built-in default theme; [`install_static`] copies theme assets into the
//! output tree without ever clobbering a folder it did not create.

mod assets;
mod context;
mod renderer;

pub use assets::{AssetError, STAMP_FILE, StaticInstall, install_static};
pub use context::{NavEntry, PageContext, static_path};
pub use renderer::{DEFAULT_LAYOUT, RenderError, Renderer, TemplateRenderer};
