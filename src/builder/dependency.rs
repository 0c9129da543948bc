//! Per-dependency merge work.
//!
//! Each declared dependency is staged by one task that produces a local
//! [`DependencyContribution`]; nothing is written to shared build state from
//! here. A dependency that cannot contribute - missing from the cache,
//! missing or invalid manifest, malformed identifier - is reported and
//! skipped, never failing the build.

use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use anyhow::{Context, Result};
use regex::Regex;
use tracing::debug;

use super::OverlayContribution;
use crate::cache::ConfigCache;
use crate::constants::{DATA_DIR, PACKAGE_MANIFEST};
use crate::core::Reporter;
use crate::manifest::{PackageId, PackageManifest};
use crate::storage::TreeStorage;

/// Runs of characters that cannot appear in an overlay directory name.
static FOLDER_UNSAFE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\W+").expect("valid regex"));

/// Everything one dependency adds to a build, collected locally so the
/// orchestrator can fold contributions back in declaration order.
#[derive(Debug, Default)]
pub struct DependencyContribution {
    pub load: Vec<String>,
    pub tick: Vec<String>,
    /// Workspace-relative `data` trees this dependency staged.
    pub data_subtrees: Vec<PathBuf>,
    /// Overlay contributions: base content first, then declared overlays.
    pub overlays: Vec<OverlayContribution>,
    pub license_fragment: Option<String>,
}

/// Stage one dependency into the workspace.
///
/// Returns `None` when the dependency is skipped; the reason has already
/// been reported. Unexpected I/O failures while copying are downgraded to
/// a skip as well - one broken dependency must not abort the build.
pub(super) fn stage_dependency(
    spec: &str,
    modules_dir: &Path,
    storage: &dyn TreeStorage,
    cache: &ConfigCache,
    reporter: &dyn Reporter,
) -> Option<DependencyContribution> {
    match try_stage(spec, modules_dir, storage, cache, reporter) {
        Ok(contribution) => contribution,
        Err(e) => {
            reporter.error(&format!("Failed to merge dependency {spec}: {e:#}"));
            None
        }
    }
}

fn try_stage(
    spec: &str,
    modules_dir: &Path,
    storage: &dyn TreeStorage,
    cache: &ConfigCache,
    reporter: &dyn Reporter,
) -> Result<Option<DependencyContribution>> {
    let id = match PackageId::parse(spec) {
        Ok(id) => id,
        Err(e) => {
            reporter.error(&e.to_string());
            return Ok(None);
        }
    };

    let dep_dir = modules_dir.join(id.cache_dir_name());
    if !dep_dir.is_dir() {
        reporter.warn(&format!("Dependency not found: {spec}"));
        return Ok(None);
    }

    let manifest_path = dep_dir.join(PACKAGE_MANIFEST);
    if !manifest_path.is_file() {
        reporter.warn(&format!("Invalid package (missing {PACKAGE_MANIFEST}): {spec}"));
        return Ok(None);
    }
    let manifest: PackageManifest = match cache.read(&manifest_path) {
        Ok(manifest) => manifest,
        Err(e) => {
            reporter.warn(&format!("Invalid package manifest for {spec}: {e}"));
            return Ok(None);
        }
    };
    if let Err(e) = manifest.validate() {
        reporter.warn(&format!("Invalid package manifest for {spec}: {e}"));
        return Ok(None);
    }

    let dep_name = id.cache_dir_name();
    let mut contribution = DependencyContribution {
        load: manifest.load.clone(),
        tick: manifest.tick.clone(),
        ..Default::default()
    };

    // Base content lands in a sub-tree named after the dependency.
    let base_dest = Path::new(&dep_name).join(DATA_DIR);
    storage
        .import_tree(&dep_dir.join(&manifest.base), &base_dest)
        .with_context(|| format!("Failed to stage base content of {spec}"))?;
    contribution.data_subtrees.push(base_dest);
    contribution.overlays.push(OverlayContribution {
        range_expr: manifest.supported_versions.clone(),
        directory: dep_name.clone(),
    });

    // Overlays are namespaced with the dependency name so two packages can
    // ship identically-named overlay folders without colliding.
    for (range_expr, overlay_path) in &manifest.overlays {
        let folder = Path::new(overlay_path)
            .file_name()
            .map_or_else(|| "overlay".to_string(), |n| n.to_string_lossy().into_owned());
        let dest_name = format!("{dep_name}_{}", FOLDER_UNSAFE.replace_all(&folder, "_"));

        let dest = Path::new(&dest_name).join(DATA_DIR);
        storage
            .import_tree(&dep_dir.join(overlay_path), &dest)
            .with_context(|| format!("Failed to stage overlay {overlay_path} of {spec}"))?;
        contribution.data_subtrees.push(dest);
        contribution.overlays.push(OverlayContribution {
            range_expr: range_expr.clone(),
            directory: dest_name,
        });
    }

    let license_path = dep_dir.join(&manifest.license_path);
    if license_path.is_file() {
        let text = std::fs::read_to_string(&license_path)
            .with_context(|| format!("Failed to read {}", license_path.display()))?;
        contribution.license_fragment = Some(format!(
            "----- [{spec}] ( {} ) -----\n{text}",
            id.source_url()
        ));
    }

    debug!(dependency = spec, "merged dependency");
    Ok(Some(contribution))
}
