use std::fs;
use std::io::ErrorKind;
use std::path::Path;

/// Create `path` and its parents.
///
/// A directory that already exists, possibly created concurrently by another
/// worker, is not an error.
pub(crate) fn ensure_dir(path: &Path) -> std::io::Result<()> {
    match fs::create_dir_all(path) {
        Err(e) if e.kind() == ErrorKind::AlreadyExists && path.is_dir() => Ok(()),
        result => result,
    }
}
