//! `dpm init` - create a template project manifest.

use std::path::Path;

use anyhow::Result;
use serde_json::json;

use crate::constants::{
    DEFAULT_BUILD_PATH, DEFAULT_DATAPACK_PATH, DEFAULT_LICENSE_PATH, PROJECT_MANIFEST,
};
use crate::core::Reporter;
use crate::utils::fs as fsutil;

pub fn execute(reporter: &dyn Reporter) -> Result<()> {
    let cwd = std::env::current_dir()?;
    create_template(&cwd, reporter)
}

/// Write a template `dpm.json` into `dir` unless one already exists.
pub(super) fn create_template(dir: &Path, reporter: &dyn Reporter) -> Result<()> {
    let manifest_path = dir.join(PROJECT_MANIFEST);
    if manifest_path.exists() {
        reporter.warn(&format!("{PROJECT_MANIFEST} already exists. Skipping creation."));
        return Ok(());
    }

    let name = dir
        .file_name()
        .map_or_else(|| "datapack".to_string(), |n| n.to_string_lossy().into_owned());
    let template = json!({
        "name": name,
        "licensePath": DEFAULT_LICENSE_PATH,
        "datapackPath": DEFAULT_DATAPACK_PATH,
        "buildPath": DEFAULT_BUILD_PATH,
        "dependencies": []
    });
    fsutil::write_json_file(&manifest_path, &template)?;

    reporter.success(&format!("Created template {PROJECT_MANIFEST}"));
    reporter.info("Edit the metadata, then add dependencies with 'dpm install owner/repo'.");
    Ok(())
}
