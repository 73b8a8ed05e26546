//! In-memory content cache.

use std::collections::HashMap;
use std::sync::RwLock;

use crate::{CacheError, CacheKey, ContentCache};

/// [`ContentCache`] backed by a map, lost when dropped.
#[derive(Debug, Default)]
pub struct MemoryContentCache {
    entries: RwLock<HashMap<CacheKey, String>>,
}

impl ContentCache for MemoryContentCache {
    fn get(&self, key: &CacheKey) -> Result<String, CacheError> {
        self.entries
            .read()
            .unwrap()
            .get(key)
            .cloned()
            .ok_or_else(|| CacheError::Miss(key.clone()))
    }

    fn put(&self, key: &CacheKey, content: &str) -> Result<(), CacheError> {
        self.entries
            .write()
            .unwrap()
            .insert(key.clone(), content.to_owned());
        Ok(())
    }
}
