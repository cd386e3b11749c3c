//! GitHub REST implementation of [`RepositorySource`].

use crate::domain::{BlobDescriptor, BranchInfo, CommitInfo, RepoId};
use crate::fetch::source::{RepositorySource, SourceError};
use async_trait::async_trait;
use futures::future::try_join_all;
use reqwest::header::ACCEPT;
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::Deserialize;
use std::time::Duration;

const API_ROOT: &str = "https://api.github.com";
const JSON_MEDIA_TYPE: &str = "application/vnd.github+json";
/// Raw media type makes the contents endpoint return the blob bytes
/// directly instead of a base64-wrapped JSON envelope.
const RAW_MEDIA_TYPE: &str = "application/vnd.github.raw+json";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);
const DEFAULT_MAX_CONTENT_BYTES: u64 = 8 * 1024 * 1024;

pub struct GithubSource {
    client: Client,
    token: Option<String>,
    max_content_bytes: u64,
}

impl GithubSource {
    pub fn new(token: Option<String>) -> Self {
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .user_agent(concat!("repo-picker/", env!("CARGO_PKG_VERSION")))
            .build()
            .unwrap_or_else(|_| Client::new());
        Self { client, token, max_content_bytes: DEFAULT_MAX_CONTENT_BYTES }
    }

    /// Reject blobs above this size instead of downloading them.
    pub fn max_content_bytes(mut self, max_bytes: u64) -> Self {
        self.max_content_bytes = max_bytes;
        self
    }

    fn get(&self, url: String) -> RequestBuilder {
        let mut request = self.client.get(url).header(ACCEPT, JSON_MEDIA_TYPE);
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }
        request
    }

    /// The branch used when the caller does not name one.
    pub async fn default_branch(&self, repo: &RepoId) -> Result<String, SourceError> {
        let url = format!("{API_ROOT}/repos/{}/{}", repo.owner, repo.name);
        let response = self.get(url).send().await?;
        let response = check_status(response, &repo.to_string())?;
        let detail: RepoDetail = response.json().await?;
        Ok(detail.default_branch)
    }

    /// Check a candidate token against the authenticated-user endpoint.
    pub async fn validate_token(&self, token: &str) -> Result<bool, SourceError> {
        let url = format!("{API_ROOT}/user");
        let response = self
            .client
            .get(url)
            .header(ACCEPT, JSON_MEDIA_TYPE)
            .bearer_auth(token)
            .send()
            .await?;
        match response.status() {
            status if status.is_success() => Ok(true),
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Ok(false),
            status => Err(SourceError::Transport(format!("token check: HTTP {status}"))),
        }
    }

    async fn commit_info(&self, repo: &RepoId, sha: &str) -> Result<CommitInfo, SourceError> {
        let url = format!("{API_ROOT}/repos/{}/{}/commits/{sha}", repo.owner, repo.name);
        let response = self.get(url).send().await?;
        let response = check_status(response, &format!("{repo}@{sha}"))?;
        let detail: CommitDetail = response.json().await?;
        Ok(commit_info_from(detail))
    }
}

#[async_trait]
impl RepositorySource for GithubSource {
    async fn list_blobs(
        &self,
        repo: &RepoId,
        branch: &str,
    ) -> Result<Vec<BlobDescriptor>, SourceError> {
        let url = format!("{API_ROOT}/repos/{}/{}/git/trees/{branch}", repo.owner, repo.name);
        let response = self.get(url).query(&[("recursive", "1")]).send().await?;
        let response = check_status(response, &format!("{repo}@{branch}"))?;
        let listing: TreeResponse = response.json().await?;

        if listing.truncated {
            tracing::warn!("listing for {repo}@{branch} was truncated by the remote");
        }
        Ok(blobs_from(listing))
    }

    async fn fetch_content(
        &self,
        repo: &RepoId,
        branch: &str,
        path: &str,
    ) -> Result<(String, u64), SourceError> {
        let url = format!("{API_ROOT}/repos/{}/{}/contents/{path}", repo.owner, repo.name);
        let response = self
            .get(url)
            .header(ACCEPT, RAW_MEDIA_TYPE)
            .query(&[("ref", branch)])
            .send()
            .await?;
        let response = check_status(response, path)?;

        if let Some(length) = response.content_length() {
            if length > self.max_content_bytes {
                return Err(SourceError::TooLarge { path: path.to_string(), size: length });
            }
        }
        let bytes = response.bytes().await?;
        let size = bytes.len() as u64;
        if size > self.max_content_bytes {
            return Err(SourceError::TooLarge { path: path.to_string(), size });
        }
        let content = String::from_utf8(bytes.to_vec())
            .map_err(|_| SourceError::Decode { path: path.to_string() })?;
        Ok((content, size))
    }

    async fn list_branches(&self, repo: &RepoId) -> Result<Vec<BranchInfo>, SourceError> {
        let url = format!("{API_ROOT}/repos/{}/{}/branches", repo.owner, repo.name);
        let response = self.get(url).query(&[("per_page", "100")]).send().await?;
        let response = check_status(response, &repo.to_string())?;
        let entries: Vec<BranchEntry> = response.json().await?;

        // One commit lookup per branch for message and date; a single
        // failure fails the listing, matching the all-or-nothing contract.
        let commits =
            try_join_all(entries.iter().map(|entry| self.commit_info(repo, &entry.commit.sha)))
                .await?;

        Ok(entries
            .into_iter()
            .zip(commits)
            .map(|(entry, last_commit)| BranchInfo { name: entry.name, last_commit })
            .collect())
    }
}

impl From<reqwest::Error> for SourceError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            SourceError::Transport("request timed out".to_string())
        } else {
            SourceError::Transport(err.to_string())
        }
    }
}

/// Map a non-success status to the source error taxonomy.
fn check_status(response: Response, what: &str) -> Result<Response, SourceError> {
    match response.status() {
        status if status.is_success() => Ok(response),
        StatusCode::NOT_FOUND => Err(SourceError::NotFound(what.to_string())),
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
            Err(SourceError::AccessDenied(what.to_string()))
        }
        status => Err(SourceError::Transport(format!("{what}: HTTP {status}"))),
    }
}

fn blobs_from(listing: TreeResponse) -> Vec<BlobDescriptor> {
    listing
        .tree
        .into_iter()
        .filter(|entry| entry.kind == "blob")
        .enumerate()
        .map(|(index, entry)| BlobDescriptor::new(entry.path, index).with_size(entry.size))
        .collect()
}

fn commit_info_from(detail: CommitDetail) -> CommitInfo {
    let timestamp = detail.commit.author.and_then(|a| a.date).unwrap_or_default();
    CommitInfo { hash: detail.sha, message: detail.commit.message, timestamp }
}

#[derive(Deserialize)]
struct RepoDetail {
    default_branch: String,
}

#[derive(Deserialize)]
struct TreeResponse {
    tree: Vec<TreeEntry>,
    #[serde(default)]
    truncated: bool,
}

#[derive(Deserialize)]
struct TreeEntry {
    path: String,
    #[serde(rename = "type")]
    kind: String,
    size: Option<u64>,
}

#[derive(Deserialize)]
struct BranchEntry {
    name: String,
    commit: CommitRef,
}

#[derive(Deserialize)]
struct CommitRef {
    sha: String,
}

#[derive(Deserialize)]
struct CommitDetail {
    sha: String,
    commit: CommitMeta,
}

#[derive(Deserialize)]
struct CommitMeta {
    message: String,
    author: Option<CommitAuthor>,
}

#[derive(Deserialize)]
struct CommitAuthor {
    date: Option<String>,
}
