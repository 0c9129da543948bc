//! DPM CLI entry point.
//!
//! Parses arguments, runs the selected command, and turns failures into a
//! user-friendly error with a non-zero exit code.

use anyhow::Result;
use clap::Parser;
use dpm_cli::cli::Cli;
use dpm_cli::core::user_friendly_error;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    #[cfg(windows)]
    colored::control::set_virtual_terminal(true).ok();

    match cli.execute().await {
        Ok(()) => Ok(()),
        Err(e) => {
            user_friendly_error(e).display();
            std::process::exit(1);
        }
    }
}
