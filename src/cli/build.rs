//! `dpm build` - run the merge pipeline once.

use std::sync::Arc;
use std::time::Instant;

use anyhow::Result;

use crate::builder::DpmBuilder;
use crate::core::{DpmError, Reporter};
use crate::manifest::find_project_manifest;

pub async fn execute(reporter: Arc<dyn Reporter>) -> Result<()> {
    let cwd = std::env::current_dir()?;
    let manifest_path = find_project_manifest(&cwd).ok_or(DpmError::ManifestNotFound)?;
    let project_dir = manifest_path
        .parent()
        .expect("manifest path has a parent")
        .to_path_buf();

    reporter.info(&format!("Building datapack in {}", project_dir.display()));
    let started = Instant::now();

    DpmBuilder::new(&project_dir)
        .with_reporter(Arc::clone(&reporter))
        .build()
        .await?;

    reporter.success(&format!(
        "Build complete in {:.2}s",
        started.elapsed().as_secs_f64()
    ));
    Ok(())
}
