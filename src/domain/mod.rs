//! Core data model shared across the crate.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// One file in a branch's remote tree, as returned by the repository source.
///
/// `index` is the position of the blob in the source's listing and is the
/// basis for first-appearance child ordering when the selection tree is
/// built.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlobDescriptor {
    pub path: String,
    pub name: String,
    pub index: usize,
    pub size: Option<u64>,
}

impl BlobDescriptor {
    pub fn new(path: impl Into<String>, index: usize) -> Self {
        let path = path.into();
        let name = path.rsplit('/').next().unwrap_or_default().to_string();
        Self { path, name, index, size: None }
    }

    pub fn with_size(mut self, size: Option<u64>) -> Self {
        self.size = size;
        self
    }
}

/// Identifies a repository as `owner/name`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RepoId {
    pub owner: String,
    pub name: String,
}

static REPO_URL_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)github\.com/([^/\s]+)/([^/\s?#]+)").expect("valid pattern"));

#[derive(Debug, Error, PartialEq, Eq)]
#[error("not a repository URL or owner/name spec: {spec:?}")]
pub struct ParseRepoError {
    pub spec: String,
}

impl FromStr for RepoId {
    type Err = ParseRepoError;

    /// Accepts `owner/name` or any URL containing `github.com/owner/name`.
    fn from_str(spec: &str) -> Result<Self, Self::Err> {
        let spec = spec.trim();
        if let Some(caps) = REPO_URL_PATTERN.captures(spec) {
            let name = caps[2].trim_end_matches(".git");
            return Ok(Self { owner: caps[1].to_string(), name: name.to_string() });
        }
        // Owner names never contain dots; requiring that here rejects
        // host/path fragments from non-GitHub URLs.
        let valid_owner = |part: &str| !part.is_empty() && !part.contains(['/', ':', '@', '.']);
        let valid_name = |part: &str| !part.is_empty() && !part.contains(['/', ':', '@']);
        match spec.split_once('/') {
            Some((owner, name)) if valid_owner(owner) && valid_name(name) => {
                Ok(Self { owner: owner.to_string(), name: name.to_string() })
            }
            _ => Err(ParseRepoError { spec: spec.to_string() }),
        }
    }
}

impl fmt::Display for RepoId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.owner, self.name)
    }
}

/// A branch together with its most recent commit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BranchInfo {
    pub name: String,
    pub last_commit: CommitInfo,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitInfo {
    pub hash: String,
    pub message: String,
    pub timestamp: String,
}

/// Outcome of retrieving one blob's content during an export run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchResult {
    pub path: String,
    pub outcome: FetchOutcome,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchOutcome {
    Success { content: String, size: u64 },
    Failure { reason: String },
}

impl FetchResult {
    pub fn success(path: impl Into<String>, content: impl Into<String>, size: u64) -> Self {
        Self { path: path.into(), outcome: FetchOutcome::Success { content: content.into(), size } }
    }

    pub fn failure(path: impl Into<String>, reason: impl Into<String>) -> Self {
        Self { path: path.into(), outcome: FetchOutcome::Failure { reason: reason.into() } }
    }
}

/// Why a selected file is absent from the assembled sections.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind", content = "detail")]
pub enum SkipReason {
    FetchFailed(String),
    SizeBudgetExceeded,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::FetchFailed(reason) => write!(f, "fetch failed: {reason}"),
            SkipReason::SizeBudgetExceeded => write!(f, "size budget exceeded"),
        }
    }
}

/// The consolidated artifact produced by one export run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExportDocument {
    pub tree_map: String,
    pub sections: Vec<Section>,
    pub skipped: Vec<SkippedFile>,
    pub total_bytes: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Section {
    pub path: String,
    pub content: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkippedFile {
    pub path: String,
    pub reason: SkipReason,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blob_descriptor_derives_basename() {
        let blob = BlobDescriptor::new("src/cli/mod.rs", 3);
        assert_eq!(blob.name, "mod.rs");
        assert_eq!(blob.index, 3);

        let root_level = BlobDescriptor::new("README.md", 0);
        assert_eq!(root_level.name, "README.md");
    }

    #[test]
    fn repo_id_parses_owner_name_spec() {
        let repo: RepoId = "rust-lang/cargo".parse().unwrap();
        assert_eq!(repo.owner, "rust-lang");
        assert_eq!(repo.name, "cargo");
        assert_eq!(repo.to_string(), "rust-lang/cargo");
    }

    #[test]
    fn repo_id_parses_full_urls() {
        for spec in [
            "https://github.com/rust-lang/cargo",
            "https://github.com/rust-lang/cargo/",
            "https://github.com/rust-lang/cargo.git",
            "http://www.github.com/rust-lang/cargo?tab=readme",
        ] {
            let repo: RepoId = spec.parse().unwrap_or_else(|e| panic!("{spec}: {e}"));
            assert_eq!(repo.owner, "rust-lang");
            assert_eq!(repo.name, "cargo");
        }
    }

    #[test]
    fn repo_id_rejects_bad_specs() {
        assert!("".parse::<RepoId>().is_err());
        assert!("just-a-name".parse::<RepoId>().is_err());
        assert!("owner/name/extra".parse::<RepoId>().is_err());
        assert!("https://example.com/owner/repo".parse::<RepoId>().is_err());
        assert!("git@github.com:owner/repo".parse::<RepoId>().is_err());
    }

    #[test]
    fn repo_names_may_contain_dots() {
        let repo: RepoId = "vercel/next.js".parse().unwrap();
        assert_eq!(repo.name, "next.js");
    }
}
