//! Package identifier parsing.

use std::fmt;
use std::sync::LazyLock;

use regex::Regex;

use crate::constants::DEFAULT_BRANCH;
use crate::core::DpmError;

/// Characters that cannot appear in a cache directory name.
static UNSAFE_CHARS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^\w.-]+").expect("valid regex"));

/// A parsed package identifier: `["@"]owner/repo[/branch]`.
///
/// The branch defaults to `main` when absent or empty. The identifier
/// determines both where a package is cached locally and where it is fetched
/// from remotely.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageId {
    /// Repository owner (user or organization).
    pub owner: String,
    /// Repository name.
    pub repo: String,
    /// Branch the package is taken from.
    pub branch: String,
}

impl PackageId {
    /// Parse an identifier string.
    ///
    /// # Errors
    ///
    /// Returns [`DpmError::InvalidPackageId`] when the owner or repository
    /// segment is missing or empty, or when there are more than three
    /// segments.
    pub fn parse(spec: &str) -> Result<Self, DpmError> {
        let invalid = || DpmError::InvalidPackageId {
            spec: spec.to_string(),
        };

        let trimmed = spec.trim().trim_start_matches('@');
        let parts: Vec<&str> = trimmed.split('/').collect();
        if parts.len() < 2 || parts.len() > 3 {
            return Err(invalid());
        }

        let owner = parts[0];
        let repo = parts[1];
        if owner.is_empty() || repo.is_empty() {
            return Err(invalid());
        }

        let branch = match parts.get(2) {
            Some(branch) if !branch.is_empty() => branch,
            _ => DEFAULT_BRANCH,
        };

        Ok(Self {
            owner: owner.to_string(),
            repo: repo.to_string(),
            branch: branch.to_string(),
        })
    }

    /// Filesystem-safe cache directory name under `dpm_modules/`.
    pub fn cache_dir_name(&self) -> String {
        [&self.owner, &self.repo, &self.branch]
            .map(|segment| UNSAFE_CHARS.replace_all(segment, "_").into_owned())
            .join("_")
    }

    /// URL of the package source tree, used in license attributions.
    pub fn source_url(&self) -> String {
        format!(
            "https://github.com/{}/{}/tree/{}/",
            self.owner, self.repo, self.branch
        )
    }

    /// URL of the branch zip archive.
    pub fn archive_url(&self) -> String {
        format!(
            "https://github.com/{}/{}/archive/refs/heads/{}.zip",
            self.owner, self.repo, self.branch
        )
    }

    /// URL of the raw package manifest at the branch root.
    pub fn manifest_url(&self) -> String {
        format!(
            "https://raw.githubusercontent.com/{}/{}/{}/{}",
            self.owner,
            self.repo,
            self.branch,
            crate::constants::PACKAGE_MANIFEST
        )
    }

    /// Directory prefix GitHub uses inside the branch archive.
    pub fn archive_prefix(&self) -> String {
        format!("{}-{}/", self.repo, self.branch)
    }
}

impl fmt::Display for PackageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/{}", self.owner, self.repo, self.branch)
    }
}
