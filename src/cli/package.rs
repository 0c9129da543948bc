//! `dpm package` - scaffold a publishable package.
//!
//! Lays out the directory structure a package repository needs: a base
//! datapack, an example overlay, and a `dpm-package.json` describing them.

use anyhow::Result;
use serde_json::json;

use crate::constants::{DEFAULT_LICENSE_PATH, PACK_DESCRIPTOR, PACKAGE_MANIFEST};
use crate::core::Reporter;
use crate::utils::fs as fsutil;

pub fn execute(reporter: &dyn Reporter) -> Result<()> {
    let cwd = std::env::current_dir()?;

    for dir in ["overlays/example", "datapack/data"] {
        let path = cwd.join(dir);
        if !path.exists() {
            fsutil::ensure_dir(&path)?;
            reporter.info(&format!("Created folder: {dir}"));
        }
    }

    let descriptor_path = cwd.join("datapack").join(PACK_DESCRIPTOR);
    if !descriptor_path.exists() {
        let descriptor = json!({
            "pack": {
                "pack_format": 48,
                "description": "Example package"
            }
        });
        fsutil::write_json_file(&descriptor_path, &descriptor)?;
        reporter.success(&format!("Created datapack/{PACK_DESCRIPTOR}"));
    }

    let manifest_path = cwd.join(PACKAGE_MANIFEST);
    if manifest_path.exists() {
        reporter.warn(&format!("{PACKAGE_MANIFEST} already exists. Skipping creation."));
        return Ok(());
    }

    let manifest = json!({
        "name": "Example Package",
        "description": "An example DPM package.",
        "author": "Someone",
        "licensePath": DEFAULT_LICENSE_PATH,
        "supportedVersions": "10-27",
        "base": "./datapack",
        "overlays": {
            "<10": "./overlays/example",
            ">=28": "./overlays/example"
        },
        "load": ["namespace:load"],
        "tick": ["namespace:tick"]
    });
    fsutil::write_json_file(&manifest_path, &manifest)?;
    reporter.success(&format!("Created {PACKAGE_MANIFEST} template."));
    reporter.info("Edit the manifest, then publish the repository to share the package.");
    Ok(())
}
