//! Incremental watch/rebuild reconciliation.
//!
//! During `dpm dev` the project directory is watched recursively. Every
//! change event is classified before anything runs:
//!
//! - events under the build output, the package cache, or any staging
//!   directory are dropped (the build writes there itself - reacting would
//!   loop forever);
//! - a change to the pack descriptor or the project manifest invalidates
//!   the whole output and triggers a full rebuild;
//! - a change to a regular content file under the data root only needs that
//!   one file copied into the output - a full merge would be correct but
//!   wasteful;
//! - anything else (deleted files, files outside the data root) falls back
//!   to a full rebuild.
//!
//! A failed rebuild is reported and the loop keeps watching.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use notify::{Event, EventKind, RecursiveMode, Watcher};
use tracing::debug;

use crate::builder::DpmBuilder;
use crate::constants::{BASE_OVERLAY_DIR, DATA_DIR, MODULES_DIR, PACK_DESCRIPTOR, PROJECT_MANIFEST};
use crate::core::Reporter;
use crate::manifest::ProjectManifest;
use crate::utils::fs as fsutil;

/// What the reconciler decided to do about one change event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WatchAction {
    /// Self-generated or irrelevant; do nothing.
    Ignore,
    /// Structural change; run the full pipeline.
    Rebuild,
    /// Content-only change; copy one file into the output tree.
    CopyFile {
        source: PathBuf,
        dest: PathBuf,
    },
}

/// Classifies file-system change events and drives the matching response.
pub struct WatchReconciler {
    project_dir: PathBuf,
    manifest_path: PathBuf,
    descriptor_path: PathBuf,
    datapack_src: PathBuf,
    build_dir: PathBuf,
    modules_dir: PathBuf,
}

impl WatchReconciler {
    pub fn new(project_dir: &Path, manifest: &ProjectManifest) -> Self {
        let project_dir = project_dir
            .canonicalize()
            .unwrap_or_else(|_| project_dir.to_path_buf());
        let datapack_src = manifest.datapack_src(&project_dir);
        Self {
            manifest_path: project_dir.join(PROJECT_MANIFEST),
            descriptor_path: datapack_src.join(PACK_DESCRIPTOR),
            build_dir: manifest.build_dir(&project_dir),
            modules_dir: project_dir.join(MODULES_DIR),
            datapack_src,
            project_dir,
        }
    }

    /// Decide how to react to a change at `changed`.
    ///
    /// Pure with respect to everything except an existence check on the
    /// changed path: a path that no longer exists (or is a directory) can't
    /// be single-file copied and falls back to a rebuild or is dropped.
    pub fn classify(&self, changed: &Path) -> WatchAction {
        let abs = if changed.is_absolute() {
            changed.to_path_buf()
        } else {
            self.project_dir.join(changed)
        };

        // Never react to our own outputs.
        if abs.starts_with(&self.build_dir) || abs.starts_with(&self.modules_dir) {
            return WatchAction::Ignore;
        }

        if abs == self.manifest_path || abs == self.descriptor_path {
            return WatchAction::Rebuild;
        }

        if abs.is_dir() {
            // Directory events precede the file events we care about.
            return WatchAction::Ignore;
        }

        if abs.starts_with(&self.datapack_src) && abs.is_file() {
            let rel = abs
                .strip_prefix(&self.datapack_src)
                .expect("checked with starts_with")
                .to_path_buf();
            // Staging moves the source data/ tree under base/, so the
            // single-file copy has to land where a full rebuild would
            // have put it.
            let mapped = match rel.strip_prefix(DATA_DIR) {
                Ok(in_data) => Path::new(BASE_OVERLAY_DIR).join(DATA_DIR).join(in_data),
                Err(_) => rel.clone(),
            };
            return WatchAction::CopyFile {
                source: abs,
                dest: self.build_dir.join(mapped),
            };
        }

        WatchAction::Rebuild
    }

    /// Watch the project directory and reconcile until the watcher closes.
    pub async fn run(&self, builder: &DpmBuilder) -> Result<()> {
        let reporter = builder.reporter();
        let (tx, mut rx) = tokio::sync::mpsc::channel::<Event>(256);

        let mut watcher = notify::recommended_watcher(move |res: Result<Event, notify::Error>| {
            if let Ok(event) = res {
                let _ = tx.blocking_send(event);
            }
        })
        .context("Failed to create file watcher")?;
        watcher
            .watch(&self.project_dir, RecursiveMode::Recursive)
            .with_context(|| format!("Failed to watch {}", self.project_dir.display()))?;

        reporter.info(&format!(
            "Watching for changes in {}...",
            self.project_dir.display()
        ));

        while let Some(event) = rx.recv().await {
            if !matches!(
                event.kind,
                EventKind::Create(_) | EventKind::Modify(_) | EventKind::Remove(_)
            ) {
                continue;
            }
            for path in &event.paths {
                self.reconcile(path, builder, reporter.as_ref()).await;
            }
        }
        Ok(())
    }

    /// Apply the classified action for one changed path. Failures are
    /// reported, never propagated - the watch loop must outlive them.
    async fn reconcile(&self, changed: &Path, builder: &DpmBuilder, reporter: &dyn Reporter) {
        let rel = changed
            .strip_prefix(&self.project_dir)
            .unwrap_or(changed)
            .display()
            .to_string();

        match self.classify(changed) {
            WatchAction::Ignore => {
                debug!(path = %rel, "ignored change");
            }
            WatchAction::Rebuild => match builder.build().await {
                Ok(()) => reporter.success(&format!("[hotreload] rebuilt ({rel})")),
                Err(e) => reporter.error(&format!("[hotreload] rebuild failed: {e:#}")),
            },
            WatchAction::CopyFile { source, dest } => {
                match fsutil::copy_file(&source, &dest) {
                    Ok(()) => reporter.success(&format!("[hotreload] updated {rel}")),
                    Err(e) => reporter.error(&format!("[hotreload] copy failed: {e:#}")),
                }
            }
        }
    }
}
