//! Bounded-concurrency, cancellable retrieval of selected blob contents.

use crate::domain::{FetchResult, RepoId};
use crate::fetch::source::RepositorySource;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;

/// Terminal outcome of one fetch run.
///
/// Cancellation is a normal outcome, not an error: callers must treat it as
/// distinct from a completed run whose individual fetches failed.
#[derive(Debug, PartialEq, Eq)]
pub enum FetchRun {
    /// One result per requested path, in input order.
    Completed(Vec<FetchResult>),
    /// The run was superseded mid-flight; carries only the results that
    /// finished before cancellation.
    Cancelled(Vec<FetchResult>),
}

impl FetchRun {
    pub fn results(&self) -> &[FetchResult] {
        match self {
            FetchRun::Completed(results) | FetchRun::Cancelled(results) => results,
        }
    }
}

/// Retrieve the content of every path, at most `concurrency` fetches in
/// flight at any instant.
///
/// The semaphore is fair, so queued paths are dispatched in input order as
/// slots free up. A single path's failure is recorded in its result and
/// never aborts sibling retrievals. When `cancel` fires, in-flight fetches
/// are dropped at the next await point and nothing further is dispatched.
pub async fn fetch_contents(
    source: Arc<dyn RepositorySource>,
    repo: &RepoId,
    branch: &str,
    paths: &[String],
    concurrency: usize,
    cancel: &CancellationToken,
) -> FetchRun {
    let concurrency = concurrency.max(1);
    let semaphore = Arc::new(Semaphore::new(concurrency));
    let mut tasks: JoinSet<Option<(usize, FetchResult)>> = JoinSet::new();
    let mut task_index = HashMap::new();

    for (idx, path) in paths.iter().enumerate() {
        let source = Arc::clone(&source);
        let semaphore = Arc::clone(&semaphore);
        let cancel = cancel.clone();
        let repo = repo.clone();
        let branch = branch.to_string();
        let path = path.clone();

        let handle = tasks.spawn(async move {
            let _permit = tokio::select! {
                biased;
                _ = cancel.cancelled() => return None,
                permit = semaphore.acquire_owned() => match permit {
                    Ok(permit) => permit,
                    Err(_) => return None,
                },
            };
            let result = tokio::select! {
                biased;
                _ = cancel.cancelled() => return None,
                fetched = source.fetch_content(&repo, &branch, &path) => match fetched {
                    Ok((content, size)) => FetchResult::success(&path, content, size),
                    Err(err) => {
                        tracing::debug!("fetch of {path} failed: {err}");
                        FetchResult::failure(&path, err.to_string())
                    }
                },
            };
            Some((idx, result))
        });
        task_index.insert(handle.id(), idx);
    }

    let mut slots: Vec<Option<FetchResult>> = paths.iter().map(|_| None).collect();
    while let Some(joined) = tasks.join_next_with_id().await {
        match joined {
            Ok((_, Some((idx, result)))) => slots[idx] = Some(result),
            Ok((_, None)) => {}
            Err(err) => {
                tracing::error!("fetch task failed: {err}");
                if let Some(&idx) = task_index.get(&err.id()) {
                    slots[idx] = Some(FetchResult::failure(&paths[idx], err.to_string()));
                }
            }
        }
    }

    let results: Vec<FetchResult> = slots.into_iter().flatten().collect();
    if cancel.is_cancelled() {
        FetchRun::Cancelled(results)
    } else {
        FetchRun::Completed(results)
    }
}
