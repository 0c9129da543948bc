//! Remote package installation.
//!
//! Packages live in GitHub repositories; installing one downloads the
//! declared branch as a zip archive and extracts it into the local cache at
//! `dpm_modules/{owner}_{repo}_{branch}/`. Before paying for the archive
//! download, the package manifest is fetched from the raw file endpoint and
//! validated, so a repository that is not a package fails fast.
//!
//! No version resolution happens here: each dependency is fetched
//! independently by name and branch.

use std::io::Cursor;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::debug;

use crate::constants::{MIN_ARCHIVE_SIZE, MODULES_DIR};
use crate::core::{DpmError, Reporter};
use crate::manifest::{PackageId, PackageManifest};
use crate::utils::fs as fsutil;

/// Download and extract one package into the project's module cache.
///
/// # Errors
///
/// [`DpmError::PackageFetchFailed`] for missing or invalid remote
/// manifests and bad archives; transport errors carry their own context.
pub async fn install_package(
    id: &PackageId,
    project_dir: &Path,
    reporter: &dyn Reporter,
) -> Result<PathBuf> {
    let modules_dir = project_dir.join(MODULES_DIR);
    fsutil::ensure_dir(&modules_dir)?;

    let client = reqwest::Client::new();

    // Manifest pre-check: cheap, and catches "not a dpm package" before the
    // archive download.
    let manifest_url = id.manifest_url();
    debug!(url = manifest_url, "fetching package manifest");
    let response = client
        .get(&manifest_url)
        .send()
        .await
        .with_context(|| format!("Failed to reach {manifest_url}"))?;
    if !response.status().is_success() {
        return Err(DpmError::PackageFetchFailed {
            package: id.to_string(),
            reason: "no dpm-package.json at the branch root".to_string(),
        }
        .into());
    }
    let manifest_text = response.text().await.context("Failed to read package manifest")?;
    let manifest: PackageManifest =
        serde_json::from_str(&manifest_text).map_err(|e| DpmError::PackageFetchFailed {
            package: id.to_string(),
            reason: format!("invalid dpm-package.json: {e}"),
        })?;
    manifest.validate().map_err(|e| DpmError::PackageFetchFailed {
        package: id.to_string(),
        reason: e.to_string(),
    })?;

    let archive_url = id.archive_url();
    reporter.debug(&format!("- {archive_url}"));
    let archive = client
        .get(&archive_url)
        .send()
        .await
        .with_context(|| format!("Failed to reach {archive_url}"))?
        .error_for_status()
        .map_err(|e| DpmError::PackageFetchFailed {
            package: id.to_string(),
            reason: e.to_string(),
        })?
        .bytes()
        .await
        .context("Failed to download archive")?;
    if archive.len() < MIN_ARCHIVE_SIZE {
        return Err(DpmError::PackageFetchFailed {
            package: id.to_string(),
            reason: "downloaded archive is invalid or empty".to_string(),
        }
        .into());
    }

    let pkg_dir = modules_dir.join(id.cache_dir_name());
    fsutil::remove_dir_all(&pkg_dir)?;
    let prefix = id.archive_prefix();
    let dest = pkg_dir.clone();
    tokio::task::spawn_blocking(move || extract_branch_archive(&archive, &prefix, &dest))
        .await
        .context("archive extraction task panicked")??;

    reporter.success(&format!("Installed {id} > {}", pkg_dir.display()));
    Ok(pkg_dir)
}

/// Remove a package from the module cache. Returns whether it was present.
pub fn uninstall_package(id: &PackageId, project_dir: &Path) -> Result<bool> {
    let pkg_dir = project_dir.join(MODULES_DIR).join(id.cache_dir_name());
    if !pkg_dir.exists() {
        return Ok(false);
    }
    fsutil::remove_dir_all(&pkg_dir)?;
    Ok(true)
}

/// Extract the entries under `prefix` (the `{repo}-{branch}/` directory
/// GitHub wraps branch archives in) into `dest`, dropping the prefix.
fn extract_branch_archive(bytes: &[u8], prefix: &str, dest: &Path) -> Result<()> {
    let mut archive =
        zip::ZipArchive::new(Cursor::new(bytes)).context("Failed to open archive")?;

    for index in 0..archive.len() {
        let mut file = archive.by_index(index)?;
        // enclosed_name rejects entries that would escape the destination.
        let Some(name) = file.enclosed_name() else {
            continue;
        };
        let Ok(rel) = name.strip_prefix(prefix) else {
            continue;
        };
        if rel.as_os_str().is_empty() {
            continue;
        }

        let out_path = dest.join(rel);
        if file.is_dir() {
            fsutil::ensure_dir(&out_path)?;
        } else {
            if let Some(parent) = out_path.parent() {
                fsutil::ensure_dir(parent)?;
            }
            let mut out = std::fs::File::create(&out_path)
                .with_context(|| format!("Failed to create {}", out_path.display()))?;
            std::io::copy(&mut file, &mut out)
                .with_context(|| format!("Failed to extract {}", out_path.display()))?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use zip::write::SimpleFileOptions;

    fn branch_archive(prefix: &str) -> Vec<u8> {
        let mut cursor = Cursor::new(Vec::new());
        let mut writer = zip::ZipWriter::new(&mut cursor);
        let options = SimpleFileOptions::default();

        writer.add_directory(format!("{prefix}datapack"), options).unwrap();
        writer
            .start_file(format!("{prefix}dpm-package.json"), options)
            .unwrap();
        writer.write_all(br#"{"name": "pkg"}"#).unwrap();
        writer
            .start_file(format!("{prefix}datapack/thing.json"), options)
            .unwrap();
        writer.write_all(b"{}").unwrap();
        // Entries outside the branch prefix are dropped.
        writer.start_file("stray.txt", options).unwrap();
        writer.write_all(b"nope").unwrap();
        writer.finish().unwrap();
        cursor.into_inner()
    }

    #[test]
    fn extracts_only_the_branch_prefix() {
        let tmp = tempfile::tempdir().unwrap();
        let dest = tmp.path().join("alice_pkg_main");
        let bytes = branch_archive("pkg-main/");

        extract_branch_archive(&bytes, "pkg-main/", &dest).unwrap();

        assert_eq!(
            std::fs::read_to_string(dest.join("dpm-package.json")).unwrap(),
            r#"{"name": "pkg"}"#
        );
        assert_eq!(
            std::fs::read_to_string(dest.join("datapack/thing.json")).unwrap(),
            "{}"
        );
        assert!(!dest.join("stray.txt").exists());
    }

    #[test]
    fn uninstall_reports_presence() {
        let tmp = tempfile::tempdir().unwrap();
        let id = PackageId::parse("alice/pkg").unwrap();
        let pkg_dir = tmp.path().join(MODULES_DIR).join(id.cache_dir_name());
        std::fs::create_dir_all(&pkg_dir).unwrap();

        assert!(uninstall_package(&id, tmp.path()).unwrap());
        assert!(!pkg_dir.exists());
        assert!(!uninstall_package(&id, tmp.path()).unwrap());
    }
}
