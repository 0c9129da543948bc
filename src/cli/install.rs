//! `dpm install` - fetch packages into the module cache.
//!
//! Named packages are also recorded in the manifest's `dependencies` array;
//! with no arguments, everything already listed is (re)installed. The
//! manifest is edited as raw JSON so fields this tool does not interpret
//! survive the rewrite.

use std::path::Path;

use anyhow::{Context, Result};
use serde_json::Value;

use crate::constants::PROJECT_MANIFEST;
use crate::core::Reporter;
use crate::installer;
use crate::manifest::{PackageId, find_project_manifest};

pub async fn execute(packages: Vec<String>, reporter: &dyn Reporter) -> Result<()> {
    let cwd = std::env::current_dir()?;
    let manifest_path = match find_project_manifest(&cwd) {
        Some(path) => path,
        None => {
            reporter.warn(&format!("No {PROJECT_MANIFEST} found in {}", cwd.display()));
            super::init::create_template(&cwd, reporter)?;
            cwd.join(PROJECT_MANIFEST)
        }
    };
    let project_dir = manifest_path
        .parent()
        .expect("manifest path has a parent")
        .to_path_buf();

    let mut doc: Value = serde_json::from_str(&std::fs::read_to_string(&manifest_path)?)
        .with_context(|| format!("Failed to parse {}", manifest_path.display()))?;
    let targets = if packages.is_empty() {
        let listed = declared_dependencies(&doc);
        if listed.is_empty() {
            reporter.warn("No dependencies listed in dpm.json");
            return Ok(());
        }
        reporter.info(&format!("Installing {} package(s) from dpm.json...", listed.len()));
        listed
    } else {
        record_dependencies(&mut doc, &packages, reporter);
        std::fs::write(&manifest_path, serde_json::to_string_pretty(&doc)?)
            .with_context(|| format!("Failed to update {}", manifest_path.display()))?;
        reporter.success("Updated dependencies in dpm.json");
        packages
    };

    let mut failures = 0usize;
    for pkg in &targets {
        reporter.info(&format!("Installing {pkg}..."));
        if let Err(e) = install_one(pkg, &project_dir, reporter).await {
            reporter.error(&format!("Failed to install {pkg}: {e:#}"));
            failures += 1;
        }
    }

    if failures == 0 {
        reporter.success("All packages installed successfully.");
    } else {
        reporter.warn(&format!(
            "{} of {} package(s) failed to install.",
            failures,
            targets.len()
        ));
    }
    Ok(())
}

async fn install_one(pkg: &str, project_dir: &Path, reporter: &dyn Reporter) -> Result<()> {
    let id = PackageId::parse(pkg)?;
    installer::install_package(&id, project_dir, reporter).await?;
    Ok(())
}

fn declared_dependencies(doc: &Value) -> Vec<String> {
    doc.get("dependencies")
        .and_then(Value::as_array)
        .map(|deps| {
            deps.iter()
                .filter_map(Value::as_str)
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}

fn record_dependencies(doc: &mut Value, packages: &[String], reporter: &dyn Reporter) {
    let deps = doc
        .as_object_mut()
        .expect("manifest is an object")
        .entry("dependencies")
        .or_insert_with(|| Value::Array(Vec::new()));
    if !deps.is_array() {
        *deps = Value::Array(Vec::new());
    }
    let deps = deps.as_array_mut().expect("just ensured an array");

    for pkg in packages {
        if deps.iter().any(|d| d.as_str() == Some(pkg)) {
            reporter.warn(&format!("Already found package in dpm.json: {pkg}"));
        } else {
            deps.push(Value::String(pkg.clone()));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{Channel, MemoryReporter};
    use serde_json::json;

    #[test]
    fn record_dependencies_appends_and_warns_on_duplicates() {
        let mut doc = json!({"name": "x", "dependencies": ["a/b"], "custom": true});
        let reporter = MemoryReporter::new();

        record_dependencies(
            &mut doc,
            &["a/b".to_string(), "c/d".to_string()],
            &reporter,
        );

        assert_eq!(declared_dependencies(&doc), vec!["a/b", "c/d"]);
        assert_eq!(reporter.channel(Channel::Warn).len(), 1);
        // Unrelated fields survive.
        assert_eq!(doc["custom"], true);
    }

    #[test]
    fn record_dependencies_repairs_a_missing_array() {
        let mut doc = json!({"name": "x"});
        record_dependencies(&mut doc, &["a/b".to_string()], &MemoryReporter::new());
        assert_eq!(declared_dependencies(&doc), vec!["a/b"]);
    }
}
