//! The build engine: stages the project, merges installed dependencies,
//! assembles overlays and hook tags, and exports the finished tree.
//!
//! A build is a strict sequence of stages over an ephemeral [`Workspace`]:
//!
//! 1. load the project manifest (fresh - the config cache is cleared first)
//! 2. stage the project's own datapack, moving `data/` under `base/data/`
//! 3. merge every declared dependency (concurrently; results folded back in
//!    declaration order)
//! 4. resolve overlay contributions into the pack descriptor
//! 5. write the merged load/tick function tags
//! 6. generate placeholder files under the root `data/` tree
//! 7. finalize the descriptor and aggregated licenses, then export
//!
//! The real output directory is only touched in step 7. On any failure the
//! workspace is dropped (removing the staging directory) and the output is
//! either untouched or fully removed - never left half-written. A bad
//! dependency never fails the build; it is skipped with a warning.

mod dependency;
mod overlays;
mod placeholder;
mod tags;

pub use dependency::DependencyContribution;
pub use placeholder::PlaceholderPolicy;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use futures::future;
use tracing::debug;

use crate::cache::ConfigCache;
use crate::constants::{
    BASE_OVERLAY_DIR, DATA_DIR, DEFAULT_SUPPORTED_VERSIONS, LICENSES_FILE, MODULES_DIR,
    PACK_DESCRIPTOR, PROJECT_MANIFEST,
};
use crate::core::{ConsoleReporter, DpmError, Reporter};
use crate::manifest::ProjectManifest;
use crate::pack::PackDescriptor;
use crate::storage::{TreeStorage, Workspace};
use crate::utils::fs as fsutil;

/// One overlay contribution: a range expression and the workspace directory
/// holding the content it scopes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OverlayContribution {
    /// Unresolved range expression from the contributing manifest.
    pub range_expr: String,
    /// Directory name at the pack root. Unique within one build.
    pub directory: String,
}

/// Mutable state accumulated over one build, reset per invocation.
#[derive(Default)]
struct BuildState {
    /// Workspace-relative `data` trees collected from the project and every
    /// dependency, in contribution order.
    data_subtrees: Vec<PathBuf>,
    load_entries: Vec<String>,
    tick_entries: Vec<String>,
    /// First entry is always the project base.
    contributions: Vec<OverlayContribution>,
    license_fragments: Vec<String>,
    descriptor: Option<PackDescriptor>,
}

/// Drives the full build pipeline for one project.
pub struct DpmBuilder {
    project_dir: PathBuf,
    modules_dir: PathBuf,
    cache: Arc<ConfigCache>,
    reporter: Arc<dyn Reporter>,
    placeholder_policy: PlaceholderPolicy,
    memory_staging: bool,
    stage_logging: bool,
}

impl DpmBuilder {
    pub fn new(project_dir: impl Into<PathBuf>) -> Self {
        let project_dir = project_dir.into();
        let modules_dir = project_dir.join(MODULES_DIR);
        Self {
            project_dir,
            modules_dir,
            cache: Arc::new(ConfigCache::new()),
            reporter: Arc::new(ConsoleReporter::new(false, false)),
            placeholder_policy: PlaceholderPolicy::Overwrite,
            memory_staging: false,
            stage_logging: true,
        }
    }

    /// Replace the output channel (the watch loop and tests use this).
    #[must_use]
    pub fn with_reporter(mut self, reporter: Arc<dyn Reporter>) -> Self {
        self.reporter = reporter;
        self
    }

    /// Choose how placeholder generation treats files that already exist.
    #[must_use]
    pub fn with_placeholder_policy(mut self, policy: PlaceholderPolicy) -> Self {
        self.placeholder_policy = policy;
        self
    }

    /// Stage in memory instead of a temporary directory.
    #[must_use]
    pub fn with_memory_staging(mut self, memory_staging: bool) -> Self {
        self.memory_staging = memory_staging;
        self
    }

    /// Suppress per-stage progress messages (warnings still go through).
    #[must_use]
    pub fn with_stage_logging(mut self, stage_logging: bool) -> Self {
        self.stage_logging = stage_logging;
        self
    }

    pub fn reporter(&self) -> Arc<dyn Reporter> {
        Arc::clone(&self.reporter)
    }

    fn stage_info(&self, msg: &str) {
        if self.stage_logging {
            self.reporter.info(msg);
        }
    }

    /// Run the full pipeline once.
    ///
    /// Idempotent in its observable inputs: unchanged sources produce an
    /// equivalent output tree. The previous output directory is replaced
    /// wholesale during export.
    pub async fn build(&self) -> Result<()> {
        self.cache.clear();

        let manifest = self.load_manifest()?;
        let datapack_src = manifest.datapack_src(&self.project_dir);
        let build_dir = manifest.build_dir(&self.project_dir);

        let workspace = if self.memory_staging {
            Workspace::memory()
        } else {
            Workspace::disk()?
        };
        let storage = workspace.storage();
        let mut state = BuildState::default();

        self.stage_project(storage.as_ref(), &manifest, &datapack_src, &mut state)?;
        self.merge_dependencies(&storage, &manifest, &mut state).await?;

        let mut descriptor = state
            .descriptor
            .take()
            .expect("descriptor is set during staging");
        overlays::assemble(&mut descriptor, &state.contributions)?;
        state.descriptor = Some(descriptor);

        tags::write_hook_tags(
            storage.as_ref(),
            &state.data_subtrees,
            &state.load_entries,
            &state.tick_entries,
        )?;

        placeholder::generate(storage.as_ref(), &state.data_subtrees, self.placeholder_policy)?;

        self.finalize(storage.as_ref(), &manifest, &state)?;
        self.export(storage.as_ref(), &build_dir)?;

        // Workspace dropped here; staging is gone on success and failure alike.
        Ok(())
    }

    fn load_manifest(&self) -> Result<ProjectManifest> {
        let manifest_path = self.project_dir.join(PROJECT_MANIFEST);
        let manifest = ProjectManifest::load(&manifest_path)?;
        debug!(project = %manifest.name, "loaded project manifest");
        Ok(manifest)
    }

    /// Stage the project's own datapack into the workspace.
    ///
    /// The source's `data/` tree is staged under `base/data/` so the
    /// project's unconditional content becomes the `base` overlay; every
    /// other source entry keeps its place. The pack descriptor must exist
    /// in the source tree - without it there is nothing to merge overlays
    /// into.
    fn stage_project(
        &self,
        storage: &dyn TreeStorage,
        manifest: &ProjectManifest,
        datapack_src: &Path,
        state: &mut BuildState,
    ) -> Result<()> {
        self.stage_info("Copying project datapack...");

        if !datapack_src.is_dir() {
            anyhow::bail!(
                "Datapack source directory not found: {}",
                datapack_src.display()
            );
        }

        for entry in std::fs::read_dir(datapack_src)
            .with_context(|| format!("Failed to read {}", datapack_src.display()))?
        {
            let entry = entry?;
            let name = entry.file_name();
            if entry.file_type()?.is_dir() {
                if name == DATA_DIR {
                    let dest = Path::new(BASE_OVERLAY_DIR).join(DATA_DIR);
                    storage.import_tree(&entry.path(), &dest)?;
                    state.data_subtrees.push(dest);
                    self.reporter.debug("Staged data/ as base/data");
                } else {
                    storage.import_tree(&entry.path(), Path::new(&name))?;
                }
            } else {
                let contents = std::fs::read(entry.path())?;
                storage.write_file(Path::new(&name), &contents)?;
            }
        }

        state.contributions.push(OverlayContribution {
            range_expr: DEFAULT_SUPPORTED_VERSIONS.to_string(),
            directory: BASE_OVERLAY_DIR.to_string(),
        });

        let descriptor_bytes = storage.read_file(Path::new(PACK_DESCRIPTOR)).map_err(|_| {
            DpmError::PackDescriptorMissing {
                file: PACK_DESCRIPTOR.to_string(),
                path: datapack_src.display().to_string(),
            }
        })?;
        let origin = datapack_src.join(PACK_DESCRIPTOR);
        state.descriptor = Some(PackDescriptor::parse(
            &descriptor_bytes,
            &origin.display().to_string(),
        )?);

        state.load_entries.extend(manifest.load.iter().cloned());
        state.tick_entries.extend(manifest.tick.iter().cloned());
        Ok(())
    }

    /// Merge all declared dependencies.
    ///
    /// Each dependency is staged by its own blocking task; tasks only write
    /// to their own workspace sub-trees, so they can run concurrently. The
    /// per-task contribution records are folded into the build state in
    /// declaration order afterwards, which keeps overlay precedence and
    /// license order deterministic no matter which task finishes first.
    async fn merge_dependencies(
        &self,
        storage: &Arc<dyn TreeStorage>,
        manifest: &ProjectManifest,
        state: &mut BuildState,
    ) -> Result<()> {
        if manifest.dependencies.is_empty() {
            if self.stage_logging {
                self.reporter.warn("No dependencies found in dpm.json.");
            }
            return Ok(());
        }
        self.stage_info(&format!(
            "Merging {} dependencies...",
            manifest.dependencies.len()
        ));

        let tasks: Vec<_> = manifest
            .dependencies
            .iter()
            .map(|spec| {
                let spec = spec.clone();
                let storage = Arc::clone(storage);
                let cache = Arc::clone(&self.cache);
                let reporter = Arc::clone(&self.reporter);
                let modules_dir = self.modules_dir.clone();
                tokio::task::spawn_blocking(move || {
                    dependency::stage_dependency(
                        &spec,
                        &modules_dir,
                        storage.as_ref(),
                        cache.as_ref(),
                        reporter.as_ref(),
                    )
                })
            })
            .collect();

        // join_all preserves input order regardless of completion order.
        for joined in future::join_all(tasks).await {
            let contribution = joined.context("dependency task panicked")?;
            let Some(contribution) = contribution else {
                continue;
            };
            state.load_entries.extend(contribution.load);
            state.tick_entries.extend(contribution.tick);
            state.data_subtrees.extend(contribution.data_subtrees);
            state.contributions.extend(contribution.overlays);
            if let Some(fragment) = contribution.license_fragment {
                state.license_fragments.push(fragment);
            }
        }
        Ok(())
    }

    /// Write the merged descriptor and the aggregated license file into the
    /// workspace, completing the staged tree.
    fn finalize(
        &self,
        storage: &dyn TreeStorage,
        manifest: &ProjectManifest,
        state: &BuildState,
    ) -> Result<()> {
        let descriptor = state
            .descriptor
            .as_ref()
            .expect("descriptor is set during staging");
        storage.write_file(Path::new(PACK_DESCRIPTOR), &descriptor.to_pretty_bytes()?)?;

        let mut fragments = vec![format!(
            "Aggregated licenses for '{}', generated by dpm.",
            manifest.name
        )];
        let project_license = manifest.license_file(&self.project_dir);
        if project_license.is_file() {
            let text = std::fs::read_to_string(&project_license)
                .with_context(|| format!("Failed to read {}", project_license.display()))?;
            fragments.push(format!("----- [{}] -----\n{}", manifest.name, text));
        }
        fragments.extend(state.license_fragments.iter().cloned());
        storage.write_file(Path::new(LICENSES_FILE), fragments.join("\n\n").as_bytes())?;
        Ok(())
    }

    /// Replace the output directory with the staged tree.
    ///
    /// The previous output is removed first; if writing the new tree fails
    /// midway the output directory is removed again so an observer never
    /// sees a half-merged tree.
    fn export(&self, storage: &dyn TreeStorage, build_dir: &Path) -> Result<()> {
        self.stage_info("Writing final build...");
        fsutil::remove_dir_all(build_dir)?;
        if let Err(e) = storage.export_to(build_dir) {
            let _ = fsutil::remove_dir_all(build_dir);
            return Err(DpmError::ExportFailed {
                path: build_dir.display().to_string(),
                reason: e.to_string(),
            }
            .into());
        }
        debug!(path = %build_dir.display(), "exported build");
        Ok(())
    }
}
