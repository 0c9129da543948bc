//! `dpm dev` - watch the project and rebuild incrementally.

use std::sync::Arc;

use anyhow::Result;

use crate::builder::DpmBuilder;
use crate::core::{DpmError, Reporter};
use crate::manifest::{ProjectManifest, find_project_manifest};
use crate::watcher::WatchReconciler;

pub async fn execute(reporter: Arc<dyn Reporter>) -> Result<()> {
    let cwd = std::env::current_dir()?;
    let manifest_path = find_project_manifest(&cwd).ok_or(DpmError::ManifestNotFound)?;
    let project_dir = manifest_path
        .parent()
        .expect("manifest path has a parent")
        .to_path_buf();
    let manifest = ProjectManifest::load(&manifest_path)?;

    // Stage chatter off: in the dev loop only warnings and the per-change
    // outcome are interesting.
    let builder = DpmBuilder::new(&project_dir)
        .with_reporter(Arc::clone(&reporter))
        .with_stage_logging(false);

    // Bring the output up to date before watching.
    match builder.build().await {
        Ok(()) => reporter.success("Initial build complete"),
        Err(e) => reporter.error(&format!("Initial build failed: {e:#}")),
    }

    let reconciler = WatchReconciler::new(&project_dir, &manifest);
    reconciler.run(&builder).await
}
