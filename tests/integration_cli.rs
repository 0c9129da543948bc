//! CLI-level tests through the compiled binary.

mod common;

use anyhow::Result;
use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::json;

use common::{TestProject, project_manifest};

fn dpm() -> Command {
    Command::cargo_bin("dpm").expect("binary built")
}

#[test]
fn help_lists_the_commands() {
    dpm()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("build"))
        .stdout(predicate::str::contains("install"))
        .stdout(predicate::str::contains("dev"));
}

#[test]
fn init_creates_a_template_manifest() -> Result<()> {
    let project = TestProject::new()?;

    dpm().arg("init").current_dir(project.root()).assert().success();

    let manifest: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(project.root().join("dpm.json"))?)?;
    assert_eq!(manifest["datapackPath"], "./src");
    assert_eq!(manifest["dependencies"], json!([]));

    // Running again refuses to clobber the existing manifest.
    dpm()
        .arg("init")
        .current_dir(project.root())
        .assert()
        .success()
        .stdout(predicate::str::contains("already exists"));
    Ok(())
}

#[test]
fn build_produces_the_merged_tree() -> Result<()> {
    let project = TestProject::new()?;
    project.write_manifest(&project_manifest("demo", &[]))?;
    project.write_descriptor(48)?;
    project.write_source_file("data/demo/function/init.mcfunction", "say init")?;

    dpm().arg("build").current_dir(project.root()).assert().success();

    assert!(project.build_dir().join("pack.mcmeta").exists());
    assert!(
        project
            .build_dir()
            .join("data/minecraft/tags/function/load.json")
            .exists()
    );
    Ok(())
}

#[test]
fn build_without_a_manifest_fails_with_a_hint() -> Result<()> {
    let project = TestProject::new()?;

    dpm()
        .arg("build")
        .current_dir(project.root())
        .assert()
        .failure()
        .stderr(predicate::str::contains("dpm init"));
    Ok(())
}

#[test]
fn package_scaffolds_a_publishable_layout() -> Result<()> {
    let project = TestProject::new()?;

    dpm().arg("package").current_dir(project.root()).assert().success();

    assert!(project.root().join("dpm-package.json").exists());
    assert!(project.root().join("datapack/pack.mcmeta").exists());
    assert!(project.root().join("overlays/example").is_dir());
    Ok(())
}

#[test]
fn uninstall_removes_dependency_and_cache() -> Result<()> {
    let project = TestProject::new()?;
    project.write_manifest(&json!({
        "name": "demo",
        "dependencies": ["alice/alpha", "bob/beta"]
    }))?;
    let pkg_dir = project.install_package("alice/alpha", &json!({"name": "Alpha"}), &[])?;

    dpm()
        .args(["uninstall", "alice/alpha"])
        .current_dir(project.root())
        .assert()
        .success();

    let manifest: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(project.root().join("dpm.json"))?)?;
    assert_eq!(manifest["dependencies"], json!(["bob/beta"]));
    assert!(!pkg_dir.exists());
    Ok(())
}
