//! Recent repositories command

use anyhow::{bail, Context, Result};
use clap::Args;
use console::style;

use crate::config::load_config;
use crate::store::RecentRepoStore;

#[derive(Args)]
pub struct RecentArgs {
    /// Remove every stored entry
    #[arg(long)]
    pub clear: bool,

    /// Remove one stored entry
    #[arg(long, value_name = "REPO", conflicts_with = "clear")]
    pub remove: Option<String>,
}

pub fn run(args: RecentArgs) -> Result<()> {
    let cwd = std::env::current_dir().context("Failed resolving working directory")?;
    let config = load_config(&cwd, None)?;
    let Some(store) = RecentRepoStore::at_default_location(config.recent_limit) else {
        bail!("Could not resolve a config directory for the recent-repository store");
    };

    if args.clear {
        store.clear()?;
        println!("Recent repositories cleared");
        return Ok(());
    }

    if let Some(repo) = &args.remove {
        store.remove(repo)?;
    }

    let repos = store.load();
    if repos.is_empty() {
        println!("No recent repositories");
        return Ok(());
    }
    for (idx, repo) in repos.iter().enumerate() {
        println!("{:>2}. {}", style(idx + 1).dim(), repo);
    }
    Ok(())
}
