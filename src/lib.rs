//! DPM - a package manager and build tool for Minecraft datapacks.
//!
//! A datapack project declares dependencies on GitHub-hosted packages in a
//! `dpm.json` manifest. DPM fetches them into a local cache
//! (`dpm_modules/`) and builds a single output datapack by merging the
//! project's own content with every dependency's content, partitioned into
//! version-scoped overlays by the pack-format ranges each package declares.
//!
//! # Architecture
//!
//! The build is a staged pipeline over an ephemeral workspace:
//!
//! - [`manifest`] - `dpm.json` / `dpm-package.json` models, package
//!   identifiers, and walk-up project discovery
//! - [`cache`] - build-scoped memoization of parsed config files
//! - [`version`] - pack-format range expressions (`"*"`, `"10-20"`, `">=48"`)
//! - [`pack`] - the `pack.mcmeta` descriptor and overlay entries
//! - [`storage`] - staging backends (disk or memory) behind one interface
//! - [`builder`] - the merge pipeline itself
//! - [`watcher`] - incremental rebuilds for `dpm dev`
//! - [`installer`] - remote package download and extraction
//! - [`cli`] - the command front door
//!
//! Dependencies are merged concurrently but their contributions are folded
//! back in declaration order: overlay precedence in the game follows entry
//! order, so order is part of the output contract, not a cosmetic detail.

pub mod builder;
pub mod cache;
pub mod cli;
pub mod constants;
pub mod core;
pub mod installer;
pub mod manifest;
pub mod pack;
pub mod storage;
pub mod utils;
pub mod version;
pub mod watcher;
