//! Error handling for DPM.
//!
//! Two layers, following the same split the rest of the codebase uses for
//! results in general:
//! 1. [`DpmError`] - strongly-typed failure cases for precise handling
//! 2. [`ErrorContext`] - a display wrapper that adds an actionable suggestion
//!    for CLI users
//!
//! Dependency-level problems (missing cache directory, invalid package
//! manifest, malformed identifier) are deliberately *not* errors at the build
//! level: the build engine degrades them to warnings and omits the offending
//! dependency. `DpmError` covers the failures that abort an operation.

use colored::Colorize;
use std::fmt;
use thiserror::Error;

/// The main error type for DPM operations.
#[derive(Error, Debug)]
pub enum DpmError {
    /// No `dpm.json` was found in the working directory or any parent.
    #[error("No dpm.json found in the current directory or any parent directory")]
    ManifestNotFound,

    /// A manifest file exists but could not be parsed.
    #[error("Invalid manifest file {file}")]
    ManifestParseError {
        /// Path to the manifest that failed to parse
        file: String,
        /// Specific reason for the parsing failure
        reason: String,
    },

    /// A package identifier string is not of the form `owner/repo[/branch]`.
    #[error("Invalid package identifier: {spec}")]
    InvalidPackageId {
        /// The identifier string as given
        spec: String,
    },

    /// The project content has no pack descriptor to merge overlays into.
    #[error("No {file} found in project content at {path}")]
    PackDescriptorMissing {
        /// Descriptor file name
        file: String,
        /// Directory that was expected to contain it
        path: String,
    },

    /// The pack descriptor exists but is not a JSON object.
    #[error("Invalid pack descriptor {path}: {reason}")]
    PackDescriptorInvalid {
        /// Path to the offending descriptor
        path: String,
        /// Why it was rejected
        reason: String,
    },

    /// A version range expression did not match the supported grammar.
    ///
    /// Rejected eagerly when a manifest is validated, so an unparseable
    /// range never reaches the overlay assembly stage.
    #[error("Invalid version range expression: {expr}")]
    InvalidFormatRange {
        /// The offending range expression
        expr: String,
    },

    /// A remote package could not be fetched or extracted.
    #[error("Failed to fetch package {package}: {reason}")]
    PackageFetchFailed {
        /// Display name of the package
        package: String,
        /// Why the fetch failed
        reason: String,
    },

    /// Exporting the finished tree to the output directory failed.
    #[error("Failed to export build to {path}")]
    ExportFailed {
        /// Output directory path
        path: String,
        /// Underlying failure
        reason: String,
    },

    /// I/O error from [`std::io::Error`].
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// JSON error from [`serde_json::Error`].
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),
}

/// An error paired with an optional suggestion and details for CLI display.
///
/// Produced by [`user_friendly_error`]; `display()` prints the chain in the
/// same red/yellow scheme the rest of the CLI output uses.
pub struct ErrorContext {
    /// The underlying error
    pub error: anyhow::Error,
    /// A short, actionable hint shown below the error
    pub suggestion: Option<String>,
}

impl ErrorContext {
    /// Wrap an error with no suggestion.
    pub fn new(error: anyhow::Error) -> Self {
        Self {
            error,
            suggestion: None,
        }
    }

    /// Attach a suggestion line.
    #[must_use]
    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestion = Some(suggestion.into());
        self
    }

    /// Print the error (and suggestion, if any) to stderr with color.
    pub fn display(&self) {
        eprintln!("{} {}", "error:".red().bold(), self.error);
        for cause in self.error.chain().skip(1) {
            eprintln!("  {} {}", "caused by:".red(), cause);
        }
        if let Some(suggestion) = &self.suggestion {
            eprintln!("{} {}", "hint:".yellow().bold(), suggestion);
        }
    }
}

impl fmt::Display for ErrorContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.error)?;
        if let Some(suggestion) = &self.suggestion {
            write!(f, "\nhint: {suggestion}")?;
        }
        Ok(())
    }
}

/// Convert any error into an [`ErrorContext`] with a contextual suggestion.
pub fn user_friendly_error(error: anyhow::Error) -> ErrorContext {
    let suggestion = match error.downcast_ref::<DpmError>() {
        Some(DpmError::ManifestNotFound) => {
            Some("Run 'dpm init' to create a dpm.json in this directory".to_string())
        }
        Some(DpmError::InvalidPackageId { .. }) => {
            Some("Package identifiers look like 'owner/repo' or 'owner/repo/branch'".to_string())
        }
        Some(DpmError::PackDescriptorMissing { file, .. }) => Some(format!(
            "Every datapack needs a {file} at the root of its source tree"
        )),
        Some(DpmError::InvalidFormatRange { .. }) => Some(
            "Supported range forms: '*', 'N', 'A-B', '<N', '<=N', '>N', '>=N'".to_string(),
        ),
        _ => None,
    };
    ErrorContext { error, suggestion }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn manifest_not_found_suggests_init() {
        let ctx = user_friendly_error(DpmError::ManifestNotFound.into());
        assert!(ctx.suggestion.unwrap().contains("dpm init"));
    }

    #[test]
    fn io_errors_have_no_suggestion() {
        let err = DpmError::IoError(std::io::Error::other("boom"));
        let ctx = user_friendly_error(err.into());
        assert!(ctx.suggestion.is_none());
    }

    #[test]
    fn display_includes_suggestion() {
        let ctx = ErrorContext::new(anyhow::anyhow!("something broke"))
            .with_suggestion("try turning it off and on again");
        let rendered = format!("{ctx}");
        assert!(rendered.contains("something broke"));
        assert!(rendered.contains("hint: try turning it off and on again"));
    }
}
