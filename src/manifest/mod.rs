//! Manifest parsing and validation.
//!
//! Two manifest kinds exist:
//!
//! - [`ProjectManifest`] (`dpm.json`) describes the project being built:
//!   where its datapack source lives, where the output goes, and which
//!   packages it depends on. It is discovered by walking parent directories,
//!   the way most build tools find their project file.
//! - [`PackageManifest`] (`dpm-package.json`) is a dependency's own
//!   declaration: its base content directory, optional version-scoped
//!   overlays, supported version range, license location, and the function
//!   hooks it contributes.
//!
//! Both are plain JSON. Unknown fields are tolerated so manifests can carry
//! metadata (description, author) this tool does not interpret.

mod package_id;

pub use package_id::PackageId;

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::constants::{
    DEFAULT_BASE_PATH, DEFAULT_BUILD_PATH, DEFAULT_DATAPACK_PATH, DEFAULT_LICENSE_PATH,
    DEFAULT_SUPPORTED_VERSIONS, PROJECT_MANIFEST,
};
use crate::core::DpmError;
use crate::version::FormatRange;

/// The project manifest, `dpm.json`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectManifest {
    /// Project name.
    pub name: String,

    /// Path to the project's own license file, relative to the project root.
    #[serde(default = "default_license_path")]
    pub license_path: String,

    /// Datapack source directory, relative to the project root.
    #[serde(default = "default_datapack_path")]
    pub datapack_path: String,

    /// Output directory the merged tree is exported to.
    #[serde(default = "default_build_path")]
    pub build_path: String,

    /// Package identifiers, in priority order. Later entries win when
    /// overlays overlap at runtime.
    #[serde(default)]
    pub dependencies: Vec<String>,

    /// Function identifiers the project itself registers on the load hook.
    #[serde(default)]
    pub load: Vec<String>,

    /// Function identifiers the project itself registers on the tick hook.
    #[serde(default)]
    pub tick: Vec<String>,
}

impl ProjectManifest {
    /// Load the manifest from an exact path.
    ///
    /// # Errors
    ///
    /// [`DpmError::ManifestNotFound`] if the file does not exist,
    /// [`DpmError::ManifestParseError`] if it is not valid JSON for this
    /// shape.
    pub fn load(path: &Path) -> Result<Self, DpmError> {
        if !path.exists() {
            return Err(DpmError::ManifestNotFound);
        }
        let text = std::fs::read_to_string(path)?;
        serde_json::from_str(&text).map_err(|e| DpmError::ManifestParseError {
            file: path.display().to_string(),
            reason: e.to_string(),
        })
    }

    /// Resolve the datapack source directory against the project root.
    pub fn datapack_src(&self, project_dir: &Path) -> PathBuf {
        project_dir.join(&self.datapack_path)
    }

    /// Resolve the build output directory against the project root.
    pub fn build_dir(&self, project_dir: &Path) -> PathBuf {
        project_dir.join(&self.build_path)
    }

    /// Resolve the project license path against the project root.
    pub fn license_file(&self, project_dir: &Path) -> PathBuf {
        project_dir.join(&self.license_path)
    }
}

/// A dependency's manifest, `dpm-package.json`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PackageManifest {
    /// Package display name.
    pub name: String,

    /// Base content directory, relative to the package root.
    #[serde(default = "default_base_path")]
    pub base: String,

    /// Version-scoped overlay directories: range expression → path relative
    /// to the package root. Processed as a set; entries are staged in key
    /// order for determinism.
    #[serde(default)]
    pub overlays: BTreeMap<String, String>,

    /// Range expression for the versions the base content supports.
    #[serde(default = "default_supported_versions")]
    pub supported_versions: String,

    /// Path to the package license file, relative to the package root.
    #[serde(default = "default_license_path")]
    pub license_path: String,

    /// Function identifiers contributed to the load hook.
    #[serde(default)]
    pub load: Vec<String>,

    /// Function identifiers contributed to the tick hook.
    #[serde(default)]
    pub tick: Vec<String>,
}

impl PackageManifest {
    /// Check that every range expression in the manifest parses.
    ///
    /// Called before a package contributes anything to a build, so a
    /// malformed `supportedVersions` or overlay key is caught while the
    /// package can still be skipped cleanly.
    pub fn validate(&self) -> Result<(), DpmError> {
        FormatRange::resolve(&self.supported_versions)?;
        for range_expr in self.overlays.keys() {
            FormatRange::resolve(range_expr)?;
        }
        Ok(())
    }
}

/// Find the nearest `dpm.json` in `start` or any of its ancestors.
pub fn find_project_manifest(start: &Path) -> Option<PathBuf> {
    let start = start.canonicalize().unwrap_or_else(|_| start.to_path_buf());
    start
        .ancestors()
        .map(|dir| dir.join(PROJECT_MANIFEST))
        .find(|candidate| candidate.is_file())
}

fn default_license_path() -> String {
    DEFAULT_LICENSE_PATH.to_string()
}

fn default_datapack_path() -> String {
    DEFAULT_DATAPACK_PATH.to_string()
}

fn default_build_path() -> String {
    DEFAULT_BUILD_PATH.to_string()
}

fn default_base_path() -> String {
    DEFAULT_BASE_PATH.to_string()
}

fn default_supported_versions() -> String {
    DEFAULT_SUPPORTED_VERSIONS.to_string()
}
