//! Build-scoped memoization of parsed JSON config files.
//!
//! A build reads the same manifests repeatedly (the project manifest during
//! staging, each package manifest for hooks, overlays, and license lookup).
//! [`ConfigCache`] parses each file once per build and serves clones of the
//! parsed value afterward.
//!
//! The cache is owned by one builder and cleared at the start of every
//! `build()` call, so the watch loop never serves stale manifests after a
//! file changed on disk. Concurrent dependency tasks share it through
//! `Arc`; the map itself is lock-free for readers.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use dashmap::DashMap;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::core::DpmError;

/// Memoized JSON loader keyed by absolute path.
#[derive(Default)]
pub struct ConfigCache {
    entries: DashMap<PathBuf, Arc<Value>>,
}

impl ConfigCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drop all cached entries. Called at the start of every build.
    pub fn clear(&self) {
        self.entries.clear();
    }

    /// Read and parse a JSON file, memoized by absolute path.
    ///
    /// # Errors
    ///
    /// I/O and JSON syntax errors surface as [`DpmError`]; failed reads are
    /// not cached, so a later retry sees the current file.
    pub fn read_value(&self, path: &Path) -> Result<Arc<Value>, DpmError> {
        let key = path.canonicalize().unwrap_or_else(|_| path.to_path_buf());
        if let Some(cached) = self.entries.get(&key) {
            return Ok(Arc::clone(&cached));
        }

        let text = std::fs::read_to_string(path)?;
        let parsed: Value = serde_json::from_str(&text)?;
        let value = Arc::new(parsed);
        self.entries.insert(key, Arc::clone(&value));
        Ok(value)
    }

    /// Read a JSON file and deserialize it into `T`, memoized.
    pub fn read<T: DeserializeOwned>(&self, path: &Path) -> Result<T, DpmError> {
        let value = self.read_value(path)?;
        Ok(serde_json::from_value((*value).clone())?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serves_cached_value_until_cleared() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("config.json");
        std::fs::write(&path, r#"{"value": 1}"#).unwrap();

        let cache = ConfigCache::new();
        assert_eq!(cache.read_value(&path).unwrap()["value"], 1);

        // A change on disk is invisible until the cache is cleared.
        std::fs::write(&path, r#"{"value": 2}"#).unwrap();
        assert_eq!(cache.read_value(&path).unwrap()["value"], 1);

        cache.clear();
        assert_eq!(cache.read_value(&path).unwrap()["value"], 2);
    }

    #[test]
    fn failed_reads_are_not_cached() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("late.json");

        let cache = ConfigCache::new();
        assert!(cache.read_value(&path).is_err());

        std::fs::write(&path, r#"{"late": true}"#).unwrap();
        assert_eq!(cache.read_value(&path).unwrap()["late"], true);
    }
}
