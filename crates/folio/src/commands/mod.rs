//! CLI command implementations.

pub(crate) mod build;
pub(crate) mod index;

use std::path::Path;

pub(crate) use build::BuildArgs;
pub(crate) use index::IndexArgs;

use crate::error::CliError;

/// Ensure the `.folio/` project directory exists with a `.gitignore`.
fn ensure_project_dir(project_dir: &Path) -> Result<(), CliError> {
    std::fs::create_dir_all(project_dir)?;

    let gitignore_path = project_dir.join(".gitignore");
    if !gitignore_path.exists() {
        let _ = std::fs::write(&gitignore_path, "# Automatically created by folio\n*\n");
    }

    Ok(())
}
