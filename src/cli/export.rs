//! Export command implementation

use anyhow::{anyhow, bail, Context, Result};
use clap::Args;
use console::style;
use dialoguer::{theme::ColorfulTheme, MultiSelect};
use indicatif::ProgressBar;
use std::collections::HashSet;
use std::fs;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use super::utils::parse_csv;
use crate::assemble::render_document;
use crate::config::{load_config, merge_cli_with_config, CliOverrides, Config};
use crate::domain::{ExportDocument, RepoId};
use crate::fetch::github::GithubSource;
use crate::fetch::source::RepositorySource;
use crate::session::{ExportOptions, ExportOutcome, Session};
use crate::store::{CredentialStore, RecentRepoStore};
use crate::tree::{filter, FilterPredicate};
use crate::utils::estimate_tokens;

#[derive(Args)]
pub struct ExportArgs {
    /// Repository to export from (owner/name or GitHub URL)
    #[arg(value_name = "REPO")]
    pub repo: String,

    /// Branch to read (defaults to the repository's default branch)
    #[arg(short, long, value_name = "BRANCH")]
    pub branch: Option<String>,

    /// Select files matching these patterns (comma-separated substrings or globs)
    #[arg(short = 's', long, value_name = "PATTERNS")]
    pub select: Option<String>,

    /// Select every file in the branch
    #[arg(long, conflicts_with_all = ["select", "interactive"])]
    pub all: bool,

    /// Pick files interactively
    #[arg(short = 'i', long, conflicts_with = "select")]
    pub interactive: bool,

    /// Narrow the interactive listing (substring or glob)
    #[arg(short = 'f', long, value_name = "PATTERN", requires = "interactive")]
    pub filter: Option<String>,

    /// Maximum fetches in flight
    #[arg(long, value_name = "N")]
    pub concurrency: Option<usize>,

    /// Stop appending file sections after this many bytes
    #[arg(long, value_name = "BYTES")]
    pub max_total_bytes: Option<u64>,

    /// Skip files larger than this (bytes)
    #[arg(long, value_name = "BYTES")]
    pub max_file_bytes: Option<u64>,

    /// GitHub token for private repositories
    #[arg(long, env = "GITHUB_TOKEN", value_name = "TOKEN", hide_env_values = true)]
    pub token: Option<String>,

    /// Path to config file (repo-picker.toml or .repo-picker.yml)
    #[arg(short = 'c', long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Write the document here instead of stdout
    #[arg(short = 'o', long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Omit the generation timestamp for reproducible diffs
    #[arg(long)]
    pub no_timestamp: bool,
}

pub async fn run(args: ExportArgs) -> Result<()> {
    let repo: RepoId = args.repo.parse()?;
    let mode = selection_mode(&args)?;

    let cwd = std::env::current_dir().context("Failed resolving working directory")?;
    let config = load_config(&cwd, args.config.as_deref())?;
    let merged = merge_cli_with_config(
        config,
        CliOverrides {
            concurrency: args.concurrency,
            max_total_bytes: args.max_total_bytes,
            max_file_bytes: args.max_file_bytes,
            recent_limit: None,
            token: args.token.clone(),
        },
    );

    let credentials = CredentialStore::resolve(merged.token.clone(), None);
    let github = GithubSource::new(credentials.current().map(str::to_string))
        .max_content_bytes(merged.max_file_bytes);

    if credentials.current().is_some() {
        match credentials.validate(&github).await {
            Ok(true) => {}
            Ok(false) => bail!("GitHub token was rejected; check --token or GITHUB_TOKEN"),
            // Validation is a convenience check; a transport hiccup here
            // should not block an export that may still succeed.
            Err(err) => tracing::warn!("could not validate token: {err}"),
        }
    }

    let branch = match &args.branch {
        Some(branch) => branch.clone(),
        None => github
            .default_branch(&repo)
            .await
            .with_context(|| format!("Failed resolving default branch of {repo}"))?,
    };

    let source: Arc<dyn RepositorySource> = Arc::new(github);
    let mut session = Session::new(source);

    let progress = spinner(format!("Loading {repo}@{branch}"));
    let loaded = session.load(repo.clone(), branch.clone()).await;
    progress.finish_and_clear();
    loaded.with_context(|| format!("Failed loading {repo}@{branch}"))?;

    apply_selection(&mut session, &mode)?;
    let selected = session.selected_paths();
    if selected.is_empty() {
        bail!("No files selected; nothing to export");
    }

    // Ctrl-C aborts the export instead of killing the process mid-write.
    let cancel = session.cancellation_handle();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            cancel.cancel();
        }
    });

    let progress = spinner(format!("Fetching {} files", selected.len()));
    let outcome = session
        .export(ExportOptions {
            concurrency: merged.concurrency,
            max_bytes: merged.max_total_bytes,
        })
        .await?;
    progress.finish_and_clear();

    let document = match outcome {
        ExportOutcome::Completed(document) => document,
        ExportOutcome::Cancelled => {
            eprintln!("{}", style("Export cancelled").yellow());
            return Ok(());
        }
    };

    let title = format!("{repo}@{branch}");
    let text = render_document(&document, &title, !args.no_timestamp);

    match &args.output {
        Some(path) => {
            fs::write(path, &text)
                .with_context(|| format!("Failed writing {}", path.display()))?;
            eprintln!("Wrote {}", path.display());
        }
        None => print!("{text}"),
    }

    record_recent(&merged, &repo);
    print_summary(&document, &text);
    Ok(())
}

enum SelectionMode {
    All,
    Patterns(Vec<String>),
    Interactive { narrow: Option<String> },
}

fn selection_mode(args: &ExportArgs) -> Result<SelectionMode> {
    if args.all {
        return Ok(SelectionMode::All);
    }
    if let Some(patterns) = parse_csv(&args.select) {
        return Ok(SelectionMode::Patterns(patterns));
    }
    if args.interactive {
        return Ok(SelectionMode::Interactive { narrow: args.filter.clone() });
    }
    bail!("Specify --select, --interactive, or --all")
}

fn apply_selection(session: &mut Session, mode: &SelectionMode) -> Result<()> {
    match mode {
        SelectionMode::All => {
            // The root toggle selects every file at once.
            session.toggle("")?;
            Ok(())
        }
        SelectionMode::Patterns(patterns) => {
            let tree = session.tree().ok_or_else(|| anyhow!("no tree loaded"))?;
            let mut wanted: HashSet<String> = HashSet::new();
            for pattern in patterns {
                wanted.extend(filter(tree, &FilterPredicate::parse(pattern)));
            }
            // Toggle each matching file exactly once, in canonical order, so
            // overlapping patterns cannot re-toggle a file back off.
            let matching: Vec<String> =
                tree.file_paths().into_iter().filter(|path| wanted.contains(path)).collect();
            if matching.is_empty() {
                bail!("No files match {patterns:?}");
            }
            for path in matching {
                session.toggle(&path)?;
            }
            Ok(())
        }
        SelectionMode::Interactive { narrow } => {
            interactive_selection(session, narrow.as_deref())
        }
    }
}

fn interactive_selection(session: &mut Session, narrow: Option<&str>) -> Result<()> {
    let tree = session.tree().ok_or_else(|| anyhow!("no tree loaded"))?;
    let mut paths = tree.file_paths();
    if let Some(pattern) = narrow {
        let visible = filter(tree, &FilterPredicate::parse(pattern));
        paths.retain(|path| visible.contains(path));
    }
    if paths.is_empty() {
        bail!("No files match the filter");
    }

    let chosen = MultiSelect::with_theme(&ColorfulTheme::default())
        .with_prompt("Select files to export (space toggles, enter confirms)")
        .items(&paths)
        .interact()?;

    for idx in chosen {
        session.toggle(&paths[idx])?;
    }
    Ok(())
}

fn spinner(message: String) -> ProgressBar {
    let bar = ProgressBar::new_spinner().with_message(message);
    bar.enable_steady_tick(Duration::from_millis(100));
    bar
}

fn record_recent(config: &Config, repo: &RepoId) {
    let Some(store) = RecentRepoStore::at_default_location(config.recent_limit) else {
        return;
    };
    if let Err(err) = store.record(&repo.to_string()) {
        tracing::warn!("could not update recent repositories: {err}");
    }
}

fn print_summary(document: &ExportDocument, text: &str) {
    eprintln!(
        "{} {} files, {} bytes, ~{} tokens",
        style("Exported").green().bold(),
        document.sections.len(),
        document.total_bytes,
        estimate_tokens(text),
    );
    if !document.skipped.is_empty() {
        let warning = style("Warning:").yellow().bold();
        eprintln!("{warning} {} files skipped:", document.skipped.len());
        for skip in &document.skipped {
            eprintln!("  {}: {}", skip.path, skip.reason);
        }
    }
}
