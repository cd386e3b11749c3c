//! Branch listing command

use anyhow::{Context, Result};
use chrono::DateTime;
use clap::Args;
use console::style;

use crate::domain::RepoId;
use crate::fetch::github::GithubSource;
use crate::fetch::source::RepositorySource;

#[derive(Args)]
pub struct BranchesArgs {
    /// Repository to inspect (owner/name or GitHub URL)
    #[arg(value_name = "REPO")]
    pub repo: String,

    /// GitHub token for private repositories
    #[arg(long, env = "GITHUB_TOKEN", value_name = "TOKEN", hide_env_values = true)]
    pub token: Option<String>,
}

pub async fn run(args: BranchesArgs) -> Result<()> {
    let repo: RepoId = args.repo.parse()?;
    let source = GithubSource::new(args.token);

    let branches = source
        .list_branches(&repo)
        .await
        .with_context(|| format!("Failed listing branches of {repo}"))?;

    if branches.is_empty() {
        println!("No branches found for {repo}");
        return Ok(());
    }

    for branch in branches {
        let short_hash: String = branch.last_commit.hash.chars().take(8).collect();
        let subject = branch.last_commit.message.lines().next().unwrap_or("").to_string();
        println!(
            "{:<24} {} {:<10} {}",
            style(branch.name).bold(),
            style(short_hash).dim(),
            format_date(&branch.last_commit.timestamp),
            subject
        );
    }
    Ok(())
}

/// Shorten an RFC 3339 commit date to its day; pass anything unparseable
/// through untouched.
fn format_date(timestamp: &str) -> String {
    DateTime::parse_from_rfc3339(timestamp)
        .map(|date| date.format("%Y-%m-%d").to_string())
        .unwrap_or_else(|_| timestamp.to_string())
}
