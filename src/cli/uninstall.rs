//! `dpm uninstall` - remove packages and their cached files.

use anyhow::{Context, Result};
use serde_json::Value;

use crate::constants::PROJECT_MANIFEST;
use crate::core::{DpmError, Reporter};
use crate::installer;
use crate::manifest::{PackageId, find_project_manifest};

pub fn execute(packages: Vec<String>, reporter: &dyn Reporter) -> Result<()> {
    if packages.is_empty() {
        reporter.warn("No packages specified to uninstall.");
        reporter.info("Example: dpm uninstall owner/repo");
        return Ok(());
    }

    let cwd = std::env::current_dir()?;
    let manifest_path = find_project_manifest(&cwd).ok_or(DpmError::ManifestNotFound)?;
    let project_dir = manifest_path
        .parent()
        .expect("manifest path has a parent")
        .to_path_buf();

    let mut doc: Value = serde_json::from_str(&std::fs::read_to_string(&manifest_path)?)
        .with_context(|| format!("Failed to parse {}", manifest_path.display()))?;

    let removed = remove_dependencies(&mut doc, &packages);
    std::fs::write(&manifest_path, serde_json::to_string_pretty(&doc)?)
        .with_context(|| format!("Failed to update {}", manifest_path.display()))?;
    if removed > 0 {
        reporter.success(&format!("Removed {removed} package(s) from dpm.json"));
    } else {
        reporter.warn("No matching packages found in dependencies.");
    }

    for pkg in &packages {
        let id = match PackageId::parse(pkg) {
            Ok(id) => id,
            Err(e) => {
                reporter.error(&e.to_string());
                continue;
            }
        };
        if installer::uninstall_package(&id, &project_dir)? {
            reporter.info(&format!("Deleted local files for {pkg}"));
        }
    }

    reporter.success("Uninstall complete.");
    Ok(())
}

fn remove_dependencies(doc: &mut Value, packages: &[String]) -> usize {
    let Some(deps) = doc.get_mut("dependencies").and_then(Value::as_array_mut) else {
        return 0;
    };
    let before = deps.len();
    deps.retain(|d| d.as_str().is_none_or(|s| !packages.iter().any(|p| p == s)));
    before - deps.len()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn removes_only_named_dependencies() {
        let mut doc = json!({"name": "x", "dependencies": ["a/b", "c/d", "e/f"]});
        let removed = remove_dependencies(&mut doc, &["a/b".to_string(), "e/f".to_string()]);
        assert_eq!(removed, 2);
        assert_eq!(doc["dependencies"], json!(["c/d"]));
    }

    #[test]
    fn tolerates_missing_dependency_array() {
        let mut doc = json!({"name": "x"});
        assert_eq!(remove_dependencies(&mut doc, &["a/b".to_string()]), 0);
    }
}
