//! Content cache for interpreted documents.
//!
//! Interpreted HTML is stored under a [`CacheKey`], a SHA-256 digest of the
//! node's reference path. The key does not depend on file content: editing a
//! file overwrites its slot, renaming a file leaves the old slot orphaned.
//! Orphaned slots are never purged.
//!
//! # Implementations
//!
//! - [`FileContentCache`]: flat directory with one file per key, atomic `put`
//! - [`MemoryContentCache`]: in-memory map, for tests and embedding
//!
//! # Example
//!
//! ```
//! use folio_cache::{CacheKey, ContentCache, MemoryContentCache};
//!
//! let cache = MemoryContentCache::default();
//! let key = CacheKey::for_reference_path("guide/setup.md");
//! cache.put(&key, "<h1>Setup</h1>").unwrap();
//! assert_eq!(cache.get(&key).unwrap(), "<h1>Setup</h1>");
//! ```

mod file;
mod memory;

use std::fmt;

use sha2::{Digest, Sha256};

pub use file::FileContentCache;
pub use memory::MemoryContentCache;

/// Hex-encoded SHA-256 digest of a reference path.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CacheKey(String);

impl CacheKey {
    /// Compute the key for a reference path.
    #[must_use]
    pub fn for_reference_path(reference_path: &str) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(reference_path.as_bytes());
        Self(hex::encode(hasher.finalize()))
    }

    /// Hex digest, also used as the slot file name.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Cache error.
#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    /// No slot exists for the key.
    #[error("no cached content for key {0}")]
    Miss(CacheKey),
    /// Reading or writing a slot failed.
    #[error("cache I/O error for key {key}: {source}")]
    Io {
        /// Slot being accessed.
        key: CacheKey,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },
}

/// Store of interpreted document content.
///
/// Implementations must be safe to share across worker threads. Concurrent
/// `put` calls for the same key are serialised; a reader never observes a
/// partially written slot.
pub trait ContentCache: Send + Sync {
    /// Read the content stored for `key`.
    ///
    /// Returns [`CacheError::Miss`] when the slot does not exist.
    fn get(&self, key: &CacheKey) -> Result<String, CacheError>;

    /// Store `content` under `key`, replacing any previous content.
    fn put(&self, key: &CacheKey, content: &str) -> Result<(), CacheError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    static_assertions::assert_impl_all!(CacheKey: Send, Sync);

    #[test]
    fn test_key_is_stable_hex_digest() {
        let key = CacheKey::for_reference_path("docs/intro.md");
        assert_eq!(key, CacheKey::for_reference_path("docs/intro.md"));
        assert_eq!(key.as_str().len(), 64);
        assert!(key.as_str().chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_key_differs_per_reference_path() {
        assert_ne!(
            CacheKey::for_reference_path("docs/intro.md"),
            CacheKey::for_reference_path("docs/intro.rst")
        );
    }

    #[test]
    fn test_key_known_digest() {
        // sha256 of the empty string
        let key = CacheKey::for_reference_path("");
        assert_eq!(
            key.to_string(),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }
}
