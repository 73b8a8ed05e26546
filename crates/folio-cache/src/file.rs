//! File-based content cache.
//!
//! [`FileContentCache`] keeps one file per [`CacheKey`] in a flat directory:
//!
//! ```text
//! {root}/
//! +-- 3f1a...e9   # interpreted HTML for one reference path
//! +-- 9c07...42
//! ```
//!
//! `put` writes a temporary file inside `root` and renames it over the slot,
//! so an interrupted build never leaves a truncated entry behind. Writers for
//! the same key are serialised through a per-key lock.

use std::collections::HashMap;
use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use tempfile::NamedTempFile;

use crate::{CacheError, CacheKey, ContentCache};

/// [`ContentCache`] stored as a flat directory on disk.
pub struct FileContentCache {
    root: PathBuf,
    locks: Mutex<HashMap<CacheKey, Arc<Mutex<()>>>>,
}

impl FileContentCache {
    /// Open the cache at `root`, creating the directory if needed.
    pub fn open(root: impl Into<PathBuf>) -> std::io::Result<Self> {
        let root = root.into();
        fs::create_dir_all(&root)?;
        tracing::debug!(root = %root.display(), "Opened content cache");
        Ok(Self {
            root,
            locks: Mutex::new(HashMap::new()),
        })
    }

    /// Cache directory.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn slot(&self, key: &CacheKey) -> PathBuf {
        self.root.join(key.as_str())
    }

    fn key_lock(&self, key: &CacheKey) -> Arc<Mutex<()>> {
        let mut locks = self.locks.lock().unwrap();
        Arc::clone(locks.entry(key.clone()).or_default())
    }
}

impl ContentCache for FileContentCache {
    fn get(&self, key: &CacheKey) -> Result<String, CacheError> {
        match fs::read_to_string(self.slot(key)) {
            Ok(content) => Ok(content),
            Err(e) if e.kind() == ErrorKind::NotFound => Err(CacheError::Miss(key.clone())),
            Err(source) => Err(CacheError::Io {
                key: key.clone(),
                source,
            }),
        }
    }

    fn put(&self, key: &CacheKey, content: &str) -> Result<(), CacheError> {
        let io_err = |source| CacheError::Io {
            key: key.clone(),
            source,
        };

        let lock = self.key_lock(key);
        let _guard = lock.lock().unwrap();

        let mut tmp = NamedTempFile::new_in(&self.root).map_err(io_err)?;
        tmp.write_all(content.as_bytes()).map_err(io_err)?;
        tmp.persist(self.slot(key)).map_err(|e| io_err(e.error))?;

        tracing::debug!(key = %key, bytes = content.len(), "Cached content");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::thread;

    use super::*;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    static_assertions::assert_impl_all!(FileContentCache: Send, Sync);

    #[test]
    fn test_put_and_get() {
        let tmp = TempDir::new().unwrap();
        let cache = FileContentCache::open(tmp.path().join("cache")).unwrap();
        let key = CacheKey::for_reference_path("guide/setup.md");

        cache.put(&key, "<h1>Setup</h1>").unwrap();

        assert!(tmp.path().join("cache").join(key.as_str()).is_file());
        assert_eq!(cache.get(&key).unwrap(), "<h1>Setup</h1>");
    }

    #[test]
    fn test_get_missing_slot_is_miss() {
        let tmp = TempDir::new().unwrap();
        let cache = FileContentCache::open(tmp.path()).unwrap();
        let key = CacheKey::for_reference_path("missing.md");

        assert!(matches!(cache.get(&key), Err(CacheError::Miss(_))));
    }

    #[test]
    fn test_put_overwrites_slot() {
        let tmp = TempDir::new().unwrap();
        let cache = FileContentCache::open(tmp.path()).unwrap();
        let key = CacheKey::for_reference_path("index.md");

        cache.put(&key, "first").unwrap();
        cache.put(&key, "second").unwrap();

        assert_eq!(cache.get(&key).unwrap(), "second");
    }

    #[test]
    fn test_layout_is_flat_hex_files() {
        let tmp = TempDir::new().unwrap();
        let cache = FileContentCache::open(tmp.path()).unwrap();
        let key = CacheKey::for_reference_path("a/b/c.md");

        cache.put(&key, "content").unwrap();

        let names: Vec<String> = fs::read_dir(tmp.path())
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec![key.as_str().to_owned()]);
    }

    #[test]
    fn test_open_creates_nested_root() {
        let tmp = TempDir::new().unwrap();
        let root = tmp.path().join("deeply/nested/cache");

        let cache = FileContentCache::open(&root).unwrap();

        assert!(root.is_dir());
        assert_eq!(cache.root(), root);
    }

    #[test]
    fn test_reopen_keeps_entries() {
        let tmp = TempDir::new().unwrap();
        let key = CacheKey::for_reference_path("index.md");
        FileContentCache::open(tmp.path())
            .unwrap()
            .put(&key, "kept")
            .unwrap();

        let reopened = FileContentCache::open(tmp.path()).unwrap();
        assert_eq!(reopened.get(&key).unwrap(), "kept");
    }

    #[test]
    fn test_concurrent_puts_same_key() {
        let tmp = TempDir::new().unwrap();
        let cache = Arc::new(FileContentCache::open(tmp.path()).unwrap());
        let key = CacheKey::for_reference_path("hot.md");

        let handles: Vec<_> = (0..8)
            .map(|i| {
                let cache = Arc::clone(&cache);
                let key = key.clone();
                thread::spawn(move || cache.put(&key, &format!("writer-{i}")).unwrap())
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        let content = cache.get(&key).unwrap();
        assert!(content.starts_with("writer-"), "unexpected content {content}");
        // Only the slot remains, no leftover temporary files
        assert_eq!(fs::read_dir(tmp.path()).unwrap().count(), 1);
    }
}
