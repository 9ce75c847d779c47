//! Session-scoped blueprint cache keyed by canonical template path.
//!
//! Parsing is deterministic and idempotent for a fixed file, so last-writer-
//! wins is acceptable for concurrent population of the same key. Entries are
//! invalidated when the file's modification time changes; there is no
//! on-disk representation.

use crate::error::Result;
use crate::model::Blueprint;
use crate::parse::parse_blueprint;
use rustc_hash::FxHashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::SystemTime;

#[derive(Clone)]
struct CacheEntry {
    blueprint: Arc<Blueprint>,
    modified: Option<SystemTime>,
}

#[derive(Default)]
pub struct BlueprintCache {
    entries: Mutex<FxHashMap<PathBuf, CacheEntry>>,
}

impl BlueprintCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the cached blueprint for `path`, parsing (and storing) it on a
    /// cold or stale entry.
    pub fn get_or_parse(&self, path: &Path) -> Result<Arc<Blueprint>> {
        let canonical = fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf());
        let modified = fs::metadata(&canonical).ok().and_then(|m| m.modified().ok());

        {
            let entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
            if let Some(entry) = entries.get(&canonical) {
                if entry.modified == modified {
                    tracing::debug!(path = %canonical.display(), "blueprint cache hit");
                    return Ok(Arc::clone(&entry.blueprint));
                }
                tracing::debug!(path = %canonical.display(), "blueprint cache stale");
            }
        }

        // Parse outside the lock; concurrent writers for the same key race
        // harmlessly because parsing a fixed file is deterministic.
        let blueprint = Arc::new(parse_blueprint(&canonical)?);
        let entry = CacheEntry {
            blueprint: Arc::clone(&blueprint),
            modified,
        };
        let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        entries.insert(canonical, entry);
        Ok(blueprint)
    }

    pub fn invalidate(&self, path: &Path) {
        let canonical = fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf());
        let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        entries.remove(&canonical);
    }

    pub fn clear(&self) {
        let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write as _;

    #[test]
    fn hit_returns_shared_instance() {
        let dir = tempfile::tempdir().unwrap();
        let path = crate::parse::tests::write_template(&dir);

        let cache = BlueprintCache::new();
        let first = cache.get_or_parse(&path).unwrap();
        let second = cache.get_or_parse(&path).unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn mtime_change_invalidates_entry() {
        let dir = tempfile::tempdir().unwrap();
        let path = crate::parse::tests::write_template(&dir);

        let cache = BlueprintCache::new();
        let first = cache.get_or_parse(&path).unwrap();

        // Rewrite the template with a different model identifier and force a
        // distinct mtime.
        let updated = crate::parse::tests::TEMPLATE.replace("id-model-1", "id-model-2");
        std::thread::sleep(std::time::Duration::from_millis(20));
        let mut file = std::fs::File::create(&path).unwrap();
        file.write_all(updated.as_bytes()).unwrap();
        file.sync_all().unwrap();
        drop(file);

        let second = cache.get_or_parse(&path).unwrap();
        if second.model_identifier != first.model_identifier {
            assert_eq!(second.model_identifier.as_deref(), Some("id-model-2"));
        } else {
            // Filesystems with coarse mtime granularity may still serve the
            // old entry; explicit invalidation must always work.
            cache.invalidate(&path);
            let third = cache.get_or_parse(&path).unwrap();
            assert_eq!(third.model_identifier.as_deref(), Some("id-model-2"));
        }
    }

    #[test]
    fn clear_empties_the_cache() {
        let dir = tempfile::tempdir().unwrap();
        let path = crate::parse::tests::write_template(&dir);
        let cache = BlueprintCache::new();
        cache.get_or_parse(&path).unwrap();
        assert!(!cache.is_empty());
        cache.clear();
        assert!(cache.is_empty());
    }
}
