//! Staging storage for the build workspace.
//!
//! The whole merge pipeline writes into an ephemeral workspace and only
//! touches the real output directory during the final export. The workspace
//! is addressed through the [`TreeStorage`] trait so the pipeline never
//! cares whether it is staging on disk or in memory:
//!
//! - [`DiskStorage`] (the default) stages under a temporary directory that
//!   is removed when the [`Workspace`] is dropped, build success or not.
//! - [`MemoryStorage`] keeps the staged tree in a map; tests use it to
//!   exercise pipeline stages without touching the disk.
//!
//! All paths handed to a storage are relative to the workspace root.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use anyhow::{Context, Result};
use tempfile::TempDir;
use walkdir::WalkDir;

use crate::utils::fs as fsutil;

/// Capability interface of a staging area.
pub trait TreeStorage: Send + Sync {
    /// Write a file, creating parent directories as needed.
    fn write_file(&self, rel: &Path, contents: &[u8]) -> Result<()>;

    /// Read a staged file.
    fn read_file(&self, rel: &Path) -> Result<Vec<u8>>;

    /// Remove a staged file; missing files are a no-op.
    fn remove_file(&self, rel: &Path) -> Result<()>;

    /// Whether a staged file exists at this path.
    fn exists(&self, rel: &Path) -> bool;

    /// Copy a real directory tree from disk into the staging area.
    /// A missing source is a no-op.
    fn import_tree(&self, src: &Path, dest: &Path) -> Result<()>;

    /// All staged file paths under `rel_root`, workspace-relative, sorted.
    fn walk_files(&self, rel_root: &Path) -> Result<Vec<PathBuf>>;

    /// Write the staged tree out to a real directory.
    fn export_to(&self, dest: &Path) -> Result<()>;
}

/// Disk-backed staging area rooted at an existing directory.
pub struct DiskStorage {
    root: PathBuf,
}

impl DiskStorage {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn resolve(&self, rel: &Path) -> PathBuf {
        self.root.join(rel)
    }
}

impl TreeStorage for DiskStorage {
    fn write_file(&self, rel: &Path, contents: &[u8]) -> Result<()> {
        let path = self.resolve(rel);
        if let Some(parent) = path.parent() {
            fsutil::ensure_dir(parent)?;
        }
        std::fs::write(&path, contents)
            .with_context(|| format!("Failed to stage file: {}", path.display()))
    }

    fn read_file(&self, rel: &Path) -> Result<Vec<u8>> {
        let path = self.resolve(rel);
        std::fs::read(&path).with_context(|| format!("Failed to read staged file: {}", path.display()))
    }

    fn remove_file(&self, rel: &Path) -> Result<()> {
        let path = self.resolve(rel);
        if path.exists() {
            std::fs::remove_file(&path)
                .with_context(|| format!("Failed to remove staged file: {}", path.display()))?;
        }
        Ok(())
    }

    fn exists(&self, rel: &Path) -> bool {
        self.resolve(rel).is_file()
    }

    fn import_tree(&self, src: &Path, dest: &Path) -> Result<()> {
        fsutil::copy_dir(src, &self.resolve(dest))
    }

    fn walk_files(&self, rel_root: &Path) -> Result<Vec<PathBuf>> {
        let root = self.resolve(rel_root);
        if !root.exists() {
            return Ok(Vec::new());
        }

        let mut files = Vec::new();
        for entry in WalkDir::new(&root).sort_by_file_name() {
            let entry = entry?;
            if entry.file_type().is_file() {
                let rel = entry
                    .path()
                    .strip_prefix(&self.root)
                    .expect("walked path is under the storage root");
                files.push(rel.to_path_buf());
            }
        }
        Ok(files)
    }

    fn export_to(&self, dest: &Path) -> Result<()> {
        fsutil::copy_dir(&self.root, dest)
    }
}

/// In-memory staging area; file contents keyed by relative path.
#[derive(Default)]
pub struct MemoryStorage {
    files: Mutex<BTreeMap<PathBuf, Vec<u8>>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

impl TreeStorage for MemoryStorage {
    fn write_file(&self, rel: &Path, contents: &[u8]) -> Result<()> {
        self.files
            .lock()
            .expect("storage lock poisoned")
            .insert(rel.to_path_buf(), contents.to_vec());
        Ok(())
    }

    fn read_file(&self, rel: &Path) -> Result<Vec<u8>> {
        self.files
            .lock()
            .expect("storage lock poisoned")
            .get(rel)
            .cloned()
            .with_context(|| format!("No staged file at {}", rel.display()))
    }

    fn remove_file(&self, rel: &Path) -> Result<()> {
        self.files.lock().expect("storage lock poisoned").remove(rel);
        Ok(())
    }

    fn exists(&self, rel: &Path) -> bool {
        self.files
            .lock()
            .expect("storage lock poisoned")
            .contains_key(rel)
    }

    fn import_tree(&self, src: &Path, dest: &Path) -> Result<()> {
        if !src.exists() {
            return Ok(());
        }
        for entry in WalkDir::new(src).sort_by_file_name() {
            let entry = entry?;
            if entry.file_type().is_file() {
                let rel = entry
                    .path()
                    .strip_prefix(src)
                    .expect("walked path is under the import root");
                let contents = std::fs::read(entry.path())
                    .with_context(|| format!("Failed to read {}", entry.path().display()))?;
                self.write_file(&dest.join(rel), &contents)?;
            }
        }
        Ok(())
    }

    fn walk_files(&self, rel_root: &Path) -> Result<Vec<PathBuf>> {
        Ok(self
            .files
            .lock()
            .expect("storage lock poisoned")
            .keys()
            .filter(|path| path.starts_with(rel_root))
            .cloned()
            .collect())
    }

    fn export_to(&self, dest: &Path) -> Result<()> {
        fsutil::ensure_dir(dest)?;
        for (rel, contents) in self.files.lock().expect("storage lock poisoned").iter() {
            let path = dest.join(rel);
            if let Some(parent) = path.parent() {
                fsutil::ensure_dir(parent)?;
            }
            std::fs::write(&path, contents)
                .with_context(|| format!("Failed to export {}", path.display()))?;
        }
        Ok(())
    }
}

/// The ephemeral workspace of one build.
///
/// Owns the staging storage and, for disk staging, the temporary directory
/// backing it. Dropping the workspace tears the staging area down, which is
/// what guarantees a failed build leaves nothing behind.
pub struct Workspace {
    storage: Arc<dyn TreeStorage>,
    _staging_dir: Option<TempDir>,
}

impl Workspace {
    /// Disk-backed workspace under a fresh temporary directory.
    pub fn disk() -> Result<Self> {
        let staging_dir = TempDir::with_prefix("dpm-staging-")
            .context("Failed to create staging directory")?;
        let storage = Arc::new(DiskStorage::new(staging_dir.path()));
        Ok(Self {
            storage,
            _staging_dir: Some(staging_dir),
        })
    }

    /// Memory-backed workspace.
    pub fn memory() -> Self {
        Self {
            storage: Arc::new(MemoryStorage::new()),
            _staging_dir: None,
        }
    }

    /// The staging storage, shareable across concurrent tasks.
    pub fn storage(&self) -> Arc<dyn TreeStorage> {
        Arc::clone(&self.storage)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn exercise_storage(storage: &dyn TreeStorage) {
        storage
            .write_file(Path::new("base/data/ns/function/hi.mcfunction"), b"say hi")
            .unwrap();
        storage.write_file(Path::new("base/other.txt"), b"x").unwrap();

        assert!(storage.exists(Path::new("base/other.txt")));
        assert_eq!(
            storage
                .read_file(Path::new("base/data/ns/function/hi.mcfunction"))
                .unwrap(),
            b"say hi"
        );

        let walked = storage.walk_files(Path::new("base/data")).unwrap();
        assert_eq!(
            walked,
            vec![PathBuf::from("base/data/ns/function/hi.mcfunction")]
        );

        storage.remove_file(Path::new("base/other.txt")).unwrap();
        assert!(!storage.exists(Path::new("base/other.txt")));
        // Removing twice is fine.
        storage.remove_file(Path::new("base/other.txt")).unwrap();
    }

    #[test]
    fn memory_storage_roundtrip() {
        exercise_storage(&MemoryStorage::new());
    }

    #[test]
    fn disk_storage_roundtrip() {
        let tmp = tempfile::tempdir().unwrap();
        exercise_storage(&DiskStorage::new(tmp.path()));
    }

    #[test]
    fn walk_does_not_match_sibling_prefixes() {
        let storage = MemoryStorage::new();
        storage.write_file(Path::new("dep/data/a.json"), b"{}").unwrap();
        storage.write_file(Path::new("dep/database/b.json"), b"{}").unwrap();

        let walked = storage.walk_files(Path::new("dep/data")).unwrap();
        assert_eq!(walked, vec![PathBuf::from("dep/data/a.json")]);
    }

    #[test]
    fn import_and_export_move_trees_between_disk_and_storage() {
        let src = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(src.path().join("data/ns")).unwrap();
        std::fs::write(src.path().join("data/ns/f.json"), "{}").unwrap();

        let storage = MemoryStorage::new();
        storage.import_tree(src.path(), Path::new("pkg")).unwrap();
        assert!(storage.exists(Path::new("pkg/data/ns/f.json")));

        // Importing a missing tree is a no-op.
        storage
            .import_tree(&src.path().join("missing"), Path::new("ghost"))
            .unwrap();
        assert!(storage.walk_files(Path::new("ghost")).unwrap().is_empty());

        let out = tempfile::tempdir().unwrap();
        let dest = out.path().join("export");
        storage.export_to(&dest).unwrap();
        assert_eq!(
            std::fs::read_to_string(dest.join("pkg/data/ns/f.json")).unwrap(),
            "{}"
        );
    }
}
