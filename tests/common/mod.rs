//! Shared fixtures for DPM integration tests.

// Not every helper is used by every test file.
#![allow(dead_code)]

use std::path::{Path, PathBuf};

use anyhow::Result;
use serde_json::Value;
use tempfile::TempDir;

use dpm_cli::constants::{MODULES_DIR, PACK_DESCRIPTOR, PACKAGE_MANIFEST, PROJECT_MANIFEST};
use dpm_cli::manifest::PackageId;

/// A throwaway project directory with helpers for laying out sources,
/// installed packages, and reading the build output.
pub struct TestProject {
    _tmp: TempDir,
    root: PathBuf,
}

impl TestProject {
    pub fn new() -> Result<Self> {
        let tmp = TempDir::with_prefix("dpm-test-")?;
        let root = tmp.path().canonicalize()?;
        Ok(Self { _tmp: tmp, root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn build_dir(&self) -> PathBuf {
        self.root.join("build")
    }

    /// Write `dpm.json` at the project root.
    pub fn write_manifest(&self, manifest: &Value) -> Result<()> {
        std::fs::write(
            self.root.join(PROJECT_MANIFEST),
            serde_json::to_string_pretty(manifest)?,
        )?;
        Ok(())
    }

    /// Write a file under the datapack source directory (`src/`).
    pub fn write_source_file(&self, rel: &str, contents: &str) -> Result<()> {
        let path = self.root.join("src").join(rel);
        std::fs::create_dir_all(path.parent().expect("nested path"))?;
        std::fs::write(path, contents)?;
        Ok(())
    }

    /// Write a minimal pack descriptor into the datapack source.
    pub fn write_descriptor(&self, pack_format: i64) -> Result<()> {
        self.write_source_file(
            PACK_DESCRIPTOR,
            &serde_json::to_string_pretty(&serde_json::json!({
                "pack": {"pack_format": pack_format, "description": "test pack"}
            }))?,
        )
    }

    /// Lay out an installed package in the module cache, as `dpm install`
    /// would have left it.
    pub fn install_package(
        &self,
        spec: &str,
        manifest: &Value,
        files: &[(&str, &str)],
    ) -> Result<PathBuf> {
        let id = PackageId::parse(spec)?;
        let pkg_dir = self.root.join(MODULES_DIR).join(id.cache_dir_name());
        std::fs::create_dir_all(&pkg_dir)?;
        std::fs::write(
            pkg_dir.join(PACKAGE_MANIFEST),
            serde_json::to_string_pretty(manifest)?,
        )?;
        for (rel, contents) in files {
            let path = pkg_dir.join(rel);
            std::fs::create_dir_all(path.parent().expect("nested path"))?;
            std::fs::write(path, contents)?;
        }
        Ok(pkg_dir)
    }

    /// Parse a JSON file from the build output.
    pub fn read_output_json(&self, rel: &str) -> Result<Value> {
        let text = std::fs::read_to_string(self.build_dir().join(rel))?;
        Ok(serde_json::from_str(&text)?)
    }

    /// Read a text file from the build output.
    pub fn read_output(&self, rel: &str) -> Result<String> {
        Ok(std::fs::read_to_string(self.build_dir().join(rel))?)
    }

    /// Snapshot the build output as (relative path, contents) pairs, sorted.
    pub fn output_snapshot(&self) -> Result<Vec<(PathBuf, Vec<u8>)>> {
        let mut snapshot = Vec::new();
        for entry in walk(&self.build_dir())? {
            let contents = std::fs::read(&entry)?;
            let rel = entry
                .strip_prefix(self.build_dir())
                .expect("entry under build dir")
                .to_path_buf();
            snapshot.push((rel, contents));
        }
        snapshot.sort();
        Ok(snapshot)
    }
}

fn walk(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    if !dir.exists() {
        return Ok(files);
    }
    for entry in std::fs::read_dir(dir)? {
        let entry = entry?;
        if entry.file_type()?.is_dir() {
            files.extend(walk(&entry.path())?);
        } else {
            files.push(entry.path());
        }
    }
    Ok(files)
}

/// A manifest for a project named `name` depending on `dependencies`.
pub fn project_manifest(name: &str, dependencies: &[&str]) -> Value {
    serde_json::json!({
        "name": name,
        "datapackPath": "./src",
        "buildPath": "./build",
        "dependencies": dependencies,
        "load": [format!("{name}:init")],
    })
}
