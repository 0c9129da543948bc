//! Load/tick function tag assembly.
//!
//! The merged tag files are the single authoritative registration point for
//! lifecycle hooks. Any copy a dependency (or the project) shipped inside
//! its own data tree is deleted first; two registrations of the same tag in
//! different overlay trees would otherwise shadow each other at runtime.

use std::path::Path;

use anyhow::Result;
use serde_json::json;

use crate::constants::{DATA_DIR, LOAD_TAG_FILE, TAG_FUNCTION_SUBPATH, TICK_TAG_FILE};
use crate::storage::TreeStorage;

/// Delete stale hook tags from every collected data sub-tree, then write
/// the merged tags at the workspace root's `data` tree.
pub(super) fn write_hook_tags(
    storage: &dyn TreeStorage,
    data_subtrees: &[std::path::PathBuf],
    load_entries: &[String],
    tick_entries: &[String],
) -> Result<()> {
    for subtree in data_subtrees {
        let tag_dir = subtree.join(TAG_FUNCTION_SUBPATH);
        storage.remove_file(&tag_dir.join(LOAD_TAG_FILE))?;
        storage.remove_file(&tag_dir.join(TICK_TAG_FILE))?;
    }

    let tag_dir = Path::new(DATA_DIR).join(TAG_FUNCTION_SUBPATH);
    storage.write_file(
        &tag_dir.join(LOAD_TAG_FILE),
        serde_json::to_string_pretty(&json!({ "values": load_entries }))?.as_bytes(),
    )?;
    storage.write_file(
        &tag_dir.join(TICK_TAG_FILE),
        serde_json::to_string_pretty(&json!({ "replace": false, "values": tick_entries }))?
            .as_bytes(),
    )?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStorage;
    use std::path::PathBuf;

    #[test]
    fn writes_merged_tags_and_removes_stale_copies() {
        let storage = MemoryStorage::new();
        let stale = Path::new("dep_main/data")
            .join(TAG_FUNCTION_SUBPATH)
            .join(LOAD_TAG_FILE);
        storage.write_file(&stale, br#"{"values": ["dep:own_load"]}"#).unwrap();

        write_hook_tags(
            &storage,
            &[PathBuf::from("dep_main/data")],
            &["proj:init".to_string(), "dep:setup".to_string()],
            &["dep:tick".to_string()],
        )
        .unwrap();

        assert!(!storage.exists(&stale));

        let load: serde_json::Value = serde_json::from_slice(
            &storage
                .read_file(&Path::new("data").join(TAG_FUNCTION_SUBPATH).join(LOAD_TAG_FILE))
                .unwrap(),
        )
        .unwrap();
        assert_eq!(load, json!({"values": ["proj:init", "dep:setup"]}));

        let tick: serde_json::Value = serde_json::from_slice(
            &storage
                .read_file(&Path::new("data").join(TAG_FUNCTION_SUBPATH).join(TICK_TAG_FILE))
                .unwrap(),
        )
        .unwrap();
        assert_eq!(tick, json!({"replace": false, "values": ["dep:tick"]}));
    }

    #[test]
    fn repeated_hook_entries_are_preserved() {
        let storage = MemoryStorage::new();
        write_hook_tags(
            &storage,
            &[],
            &["a:f".to_string(), "a:f".to_string()],
            &[],
        )
        .unwrap();

        let load: serde_json::Value = serde_json::from_slice(
            &storage
                .read_file(&Path::new("data").join(TAG_FUNCTION_SUBPATH).join(LOAD_TAG_FILE))
                .unwrap(),
        )
        .unwrap();
        assert_eq!(load["values"].as_array().unwrap().len(), 2);
    }
}
