//! Static theme asset installation.
//!
//! Assets are copied once into the output tree. The destination folder gets a
//! [`STAMP_FILE`] marker; a later build finding the marker leaves the folder
//! alone, while a destination that exists without the marker belongs to
//! someone else and is never overwritten.

use std::fs;
use std::path::{Path, PathBuf};

/// Marker file written into a static folder created by Folio.
pub const STAMP_FILE: &str = ".folio-static";

const BUILTIN_ASSETS: &[(&str, &[u8])] = &[(
    "folio.css",
    include_bytes!("../theme/static/folio.css"),
)];

/// Static asset installation error.
#[derive(Debug, thiserror::Error)]
pub enum AssetError {
    /// The theme has no `static/` folder.
    #[error("Static assets not found: {}", .0.display())]
    Missing(PathBuf),
    /// The destination exists and was not created by Folio.
    #[error("Static asset destination already exists: {}", .0.display())]
    Conflict(PathBuf),
    /// Copying failed.
    #[error("Failed to copy static asset {}: {source}", .path.display())]
    Io {
        /// File or folder being written.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },
}

/// Result of [`install_static`].
#[derive(Debug, PartialEq, Eq)]
pub enum StaticInstall {
    /// Assets were copied; holds the number of files.
    Copied(usize),
    /// A previous build already installed the folder.
    AlreadyInstalled,
}

/// Copy theme assets into `destination`.
///
/// With `theme_dir`, the contents of `<theme_dir>/static` are copied; without
/// it, the built-in stylesheet is written.
pub fn install_static(
    theme_dir: Option<&Path>,
    destination: &Path,
) -> Result<StaticInstall, AssetError> {
    let source = theme_dir.map(|dir| dir.join("static"));
    if let Some(source) = &source
        && !source.is_dir()
    {
        return Err(AssetError::Missing(source.clone()));
    }

    if destination.exists() {
        if destination.join(STAMP_FILE).is_file() {
            tracing::debug!(path = %destination.display(), "Static assets already installed");
            return Ok(StaticInstall::AlreadyInstalled);
        }
        return Err(AssetError::Conflict(destination.to_path_buf()));
    }

    create_dir(destination)?;
    let copied = match &source {
        Some(source) => copy_tree(source, destination)?,
        None => {
            for (name, bytes) in BUILTIN_ASSETS {
                write_file(&destination.join(name), bytes)?;
            }
            BUILTIN_ASSETS.len()
        }
    };
    write_file(&destination.join(STAMP_FILE), b"")?;

    tracing::info!(path = %destination.display(), files = copied, "Installed static assets");
    Ok(StaticInstall::Copied(copied))
}

fn copy_tree(source: &Path, destination: &Path) -> Result<usize, AssetError> {
    let io_err = |path: &Path| {
        let path = path.to_path_buf();
        move |source| AssetError::Io { path, source }
    };

    let mut copied = 0;
    for entry in fs::read_dir(source).map_err(io_err(source))? {
        let entry = entry.map_err(io_err(source))?;
        let from = entry.path();
        let to = destination.join(entry.file_name());
        if from.is_dir() {
            create_dir(&to)?;
            copied += copy_tree(&from, &to)?;
        } else {
            fs::copy(&from, &to).map_err(io_err(&to))?;
            copied += 1;
        }
    }
    Ok(copied)
}

fn create_dir(path: &Path) -> Result<(), AssetError> {
    fs::create_dir_all(path).map_err(|source| AssetError::Io {
        path: path.to_path_buf(),
        source,
    })
}

fn write_file(path: &Path, bytes: &[u8]) -> Result<(), AssetError> {
    fs::write(path, bytes).map_err(|source| AssetError::Io {
        path: path.to_path_buf(),
        source,
    })
}
