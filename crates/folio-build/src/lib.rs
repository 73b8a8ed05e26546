//! Build orchestration for Folio.
//!
//! [`SiteBuilder`] ties the source side ([`folio_site`]), the content cache
//! ([`folio_cache`]) and the theme layer ([`folio_theme`]) into one
//! incremental build:
//!
//! ```no_run
//! use folio_build::SiteBuilder;
//! use folio_config::Config;
//!
//! let config = Config::load(None, None)?;
//! let report = SiteBuilder::new(config)?.run()?;
//! println!("{} pages rendered", report.rendered);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! [`watch`] reports source changes so callers can rebuild.

mod builder;
mod debouncer;
mod error;
mod fs;
mod nav;
mod report;
mod watch;

pub use builder::{SiteBuilder, registry_from_config};
pub use error::{BuildError, NodeError, NodeFailure};
pub use report::BuildReport;
pub use watch::{ChangeEvent, ChangeKind, ChangeReceiver, WatchError, WatchHandle, watch};
