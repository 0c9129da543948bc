//! Placeholder generation for overlay-scoped content.
//!
//! Content that only exists inside a version-scoped overlay still needs a
//! file at the same path in the unconditional `data` tree, so references
//! stay valid for format versions no overlay covers. Every file under every
//! collected data sub-tree gets a placeholder at the corresponding path
//! under the root `data` tree.

use std::path::{Path, PathBuf};

use anyhow::Result;

use crate::constants::DATA_DIR;
use crate::storage::TreeStorage;

/// Non-executable credit payload written into every placeholder.
const PLACEHOLDER_PAYLOAD: &[u8] = b"# \n# Placeholder generated by dpm.\n# The content for this path is provided by a version-scoped overlay.\n# \n";

/// What to do when a placeholder path already holds a real file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaceholderPolicy {
    /// Replace whatever is there (the historical behavior).
    Overwrite,
    /// Keep existing files and only fill genuinely missing paths.
    Preserve,
}

/// Walk every data sub-tree and write placeholders under the root `data`
/// tree.
pub(super) fn generate(
    storage: &dyn TreeStorage,
    data_subtrees: &[PathBuf],
    policy: PlaceholderPolicy,
) -> Result<()> {
    let target_root = Path::new(DATA_DIR);
    for subtree in data_subtrees {
        for file in storage.walk_files(subtree)? {
            let rel = file
                .strip_prefix(subtree)
                .expect("walked path is under its sub-tree");
            let dest = target_root.join(rel);
            if policy == PlaceholderPolicy::Preserve && storage.exists(&dest) {
                continue;
            }
            storage.write_file(&dest, PLACEHOLDER_PAYLOAD)?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStorage;

    fn seeded_storage() -> MemoryStorage {
        let storage = MemoryStorage::new();
        storage
            .write_file(Path::new("base/data/ns/function/a.mcfunction"), b"say a")
            .unwrap();
        storage
            .write_file(Path::new("dep_main/data/dep/loot.json"), b"{}")
            .unwrap();
        storage
    }

    #[test]
    fn mirrors_every_subtree_file_into_the_root_data_tree() {
        let storage = seeded_storage();
        generate(
            &storage,
            &[PathBuf::from("base/data"), PathBuf::from("dep_main/data")],
            PlaceholderPolicy::Overwrite,
        )
        .unwrap();

        assert!(storage.exists(Path::new("data/ns/function/a.mcfunction")));
        assert!(storage.exists(Path::new("data/dep/loot.json")));
        // The source trees stay untouched.
        assert_eq!(
            storage
                .read_file(Path::new("base/data/ns/function/a.mcfunction"))
                .unwrap(),
            b"say a"
        );
    }

    #[test]
    fn overwrite_policy_replaces_existing_files() {
        let storage = seeded_storage();
        storage
            .write_file(Path::new("data/ns/function/a.mcfunction"), b"real content")
            .unwrap();

        generate(&storage, &[PathBuf::from("base/data")], PlaceholderPolicy::Overwrite).unwrap();
        assert_eq!(
            storage
                .read_file(Path::new("data/ns/function/a.mcfunction"))
                .unwrap(),
            PLACEHOLDER_PAYLOAD
        );
    }

    #[test]
    fn preserve_policy_keeps_existing_files() {
        let storage = seeded_storage();
        storage
            .write_file(Path::new("data/ns/function/a.mcfunction"), b"real content")
            .unwrap();

        generate(&storage, &[PathBuf::from("base/data")], PlaceholderPolicy::Preserve).unwrap();
        assert_eq!(
            storage
                .read_file(Path::new("data/ns/function/a.mcfunction"))
                .unwrap(),
            b"real content"
        );
    }
}
