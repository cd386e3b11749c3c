//! Abstract repository access.
//!
//! The core only ever talks to a remote repository through this trait; the
//! concrete GitHub implementation lives in [`crate::fetch::github`].

use crate::domain::{BlobDescriptor, BranchInfo, RepoId};
use async_trait::async_trait;
use thiserror::Error;

/// Errors a repository source can produce.
///
/// `NotFound`/`AccessDenied` are fatal to the operation that issued them.
/// `TooLarge`/`Decode`/`Transport` on a single content fetch are recorded
/// per-file by the orchestrator and never abort sibling retrievals.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SourceError {
    #[error("not found: {0}")]
    NotFound(String),

    #[error("access denied: {0}")]
    AccessDenied(String),

    #[error("{path} is too large ({size} bytes)")]
    TooLarge { path: String, size: u64 },

    #[error("cannot decode {path} as UTF-8 text")]
    Decode { path: String },

    #[error("transport error: {0}")]
    Transport(String),
}

#[async_trait]
pub trait RepositorySource: Send + Sync {
    /// List every file in `branch` as a flat sequence, in the source's own
    /// traversal order.
    async fn list_blobs(
        &self,
        repo: &RepoId,
        branch: &str,
    ) -> Result<Vec<BlobDescriptor>, SourceError>;

    /// Fetch one blob's decoded content and its size in bytes.
    async fn fetch_content(
        &self,
        repo: &RepoId,
        branch: &str,
        path: &str,
    ) -> Result<(String, u64), SourceError>;

    /// List branches together with their latest commit.
    async fn list_branches(&self, repo: &RepoId) -> Result<Vec<BranchInfo>, SourceError>;
}
