//! Command-line interface for DPM.
//!
//! Each command lives in its own module and stays thin: argument handling,
//! project discovery, and user feedback. The actual work happens in
//! [`crate::builder`], [`crate::installer`], and [`crate::watcher`].
//!
//! # Commands
//!
//! - `init` - create a template `dpm.json` project manifest
//! - `install` - install packages (and record them as dependencies)
//! - `uninstall` - remove packages and their cached files
//! - `build` - run the full merge pipeline once
//! - `dev` - watch the project and rebuild incrementally
//! - `package` - scaffold a publishable package

mod build;
mod dev;
mod init;
mod install;
mod package;
mod uninstall;

use std::sync::Arc;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use crate::core::{ConsoleReporter, Reporter};

/// Top-level CLI for the datapack package manager.
#[derive(Parser)]
#[command(
    name = "dpm",
    about = "DPM - package manager and build tool for Minecraft datapacks",
    version
)]
pub struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable debug output.
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Suppress all output except warnings and errors.
    #[arg(short, long, global = true)]
    quiet: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Create a template dpm.json in the current directory.
    Init,

    /// Install datapack packages.
    ///
    /// With no arguments, installs everything listed in dpm.json.
    #[command(alias = "i")]
    Install {
        /// Packages to install, as owner/repo[/branch].
        packages: Vec<String>,
    },

    /// Uninstall datapack packages.
    #[command(alias = "u")]
    Uninstall {
        /// Packages to remove, as owner/repo[/branch].
        packages: Vec<String>,
    },

    /// Build the datapack with all installed packages merged in.
    #[command(alias = "b")]
    Build,

    /// Watch the datapack and rebuild on change.
    #[command(alias = "d")]
    Dev,

    /// Create a publishable package template.
    #[command(alias = "pkg")]
    Package,
}

impl Cli {
    /// Execute the selected command.
    pub async fn execute(self) -> Result<()> {
        init_tracing(self.verbose);
        let reporter: Arc<dyn Reporter> =
            Arc::new(ConsoleReporter::new(self.verbose, self.quiet));

        match self.command {
            Commands::Init => init::execute(reporter.as_ref()),
            Commands::Install { packages } => install::execute(packages, reporter.as_ref()).await,
            Commands::Uninstall { packages } => uninstall::execute(packages, reporter.as_ref()),
            Commands::Build => build::execute(Arc::clone(&reporter)).await,
            Commands::Dev => dev::execute(Arc::clone(&reporter)).await,
            Commands::Package => package::execute(reporter.as_ref()),
        }
    }
}

fn init_tracing(verbose: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(if verbose { "dpm_cli=debug" } else { "warn" })
    });
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init()
        .ok();
}
