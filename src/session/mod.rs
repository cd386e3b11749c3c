//! Session coordination across repository and branch changes.
//!
//! The session owns the tree and the cancellation token for everything in
//! flight. A repository or branch change cancels outstanding fetches and
//! rebuilds the tree from a fresh listing. No other component holds
//! mutable state.

use crate::assemble::assemble;
use crate::domain::{ExportDocument, RepoId};
use crate::fetch::orchestrator::{fetch_contents, FetchRun};
use crate::fetch::source::{RepositorySource, SourceError};
use crate::tree::{MalformedPathError, TreeNode};
use std::sync::Arc;
use thiserror::Error;
use tokio_util::sync::CancellationToken;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Idle,
    TreeLoading,
    TreeReady,
    Exporting,
}

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("operation not allowed while the session is {0:?}")]
    InvalidState(SessionState),

    #[error("no node at path {0:?}")]
    UnknownPath(String),

    #[error(transparent)]
    Source(#[from] SourceError),

    #[error(transparent)]
    MalformedPath(#[from] MalformedPathError),
}

#[derive(Debug, Clone, Copy)]
pub struct ExportOptions {
    pub concurrency: usize,
    pub max_bytes: u64,
}

/// What an export request ended as. Cancellation is a normal outcome; the
/// superseded run's output is discarded, never surfaced.
#[derive(Debug)]
pub enum ExportOutcome {
    Completed(ExportDocument),
    Cancelled,
}

pub struct Session {
    source: Arc<dyn RepositorySource>,
    state: SessionState,
    repo: Option<RepoId>,
    branch: Option<String>,
    tree: Option<TreeNode>,
    cancel: CancellationToken,
}

impl Session {
    pub fn new(source: Arc<dyn RepositorySource>) -> Self {
        Self {
            source,
            state: SessionState::Idle,
            repo: None,
            branch: None,
            tree: None,
            cancel: CancellationToken::new(),
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn tree(&self) -> Option<&TreeNode> {
        self.tree.as_ref()
    }

    pub fn repo(&self) -> Option<&RepoId> {
        self.repo.as_ref()
    }

    pub fn branch(&self) -> Option<&str> {
        self.branch.as_deref()
    }

    /// Token external events (signal handlers, a new repository choice made
    /// elsewhere) can use to cancel whatever this session has in flight.
    /// Superseded once `load` runs again.
    pub fn cancellation_handle(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Switch to `repo`@`branch`: cancel outstanding work, drop the old
    /// tree, list the branch and build a fresh tree. On any failure the
    /// session ends up `Idle` with no tree; a half-built one is never kept.
    pub async fn load(&mut self, repo: RepoId, branch: String) -> Result<(), SessionError> {
        self.cancel.cancel();
        self.cancel = CancellationToken::new();
        self.state = SessionState::TreeLoading;
        self.tree = None;

        let loaded = async {
            let blobs = self.source.list_blobs(&repo, &branch).await?;
            Ok::<TreeNode, SessionError>(TreeNode::build(&blobs)?)
        }
        .await;

        match loaded {
            Ok(tree) => {
                tracing::debug!("loaded {} files for {repo}@{branch}", tree.file_paths().len());
                self.tree = Some(tree);
                self.repo = Some(repo);
                self.branch = Some(branch);
                self.state = SessionState::TreeReady;
                Ok(())
            }
            Err(err) => {
                self.repo = None;
                self.branch = None;
                self.state = SessionState::Idle;
                Err(err)
            }
        }
    }

    /// Drop everything and return to `Idle`.
    pub fn reset(&mut self) {
        self.cancel.cancel();
        self.cancel = CancellationToken::new();
        self.repo = None;
        self.branch = None;
        self.tree = None;
        self.state = SessionState::Idle;
    }

    pub fn toggle(&mut self, path: &str) -> Result<(), SessionError> {
        let tree = self.mutable_tree()?;
        if tree.toggle(path) {
            Ok(())
        } else {
            Err(SessionError::UnknownPath(path.to_string()))
        }
    }

    pub fn set_collapsed(&mut self, path: &str, collapsed: bool) -> Result<(), SessionError> {
        let tree = self.mutable_tree()?;
        if tree.set_collapsed(path, collapsed) {
            Ok(())
        } else {
            Err(SessionError::UnknownPath(path.to_string()))
        }
    }

    pub fn selected_paths(&self) -> Vec<String> {
        self.tree.as_ref().map(TreeNode::selected_paths).unwrap_or_default()
    }

    // Selection may only mutate in TreeReady/Exporting, never while a tree
    // is being (re)built.
    fn mutable_tree(&mut self) -> Result<&mut TreeNode, SessionError> {
        match (self.state, self.tree.as_mut()) {
            (SessionState::TreeReady | SessionState::Exporting, Some(tree)) => Ok(tree),
            (state, _) => Err(SessionError::InvalidState(state)),
        }
    }

    /// Fetch every selected file and assemble the export document.
    ///
    /// Individual fetch failures surface in the document's `skipped` list;
    /// cancellation (a superseding load, an external abort) yields
    /// [`ExportOutcome::Cancelled`] and discards any partial output. Either
    /// way the session returns to `TreeReady`.
    pub async fn export(&mut self, options: ExportOptions) -> Result<ExportOutcome, SessionError> {
        if self.state != SessionState::TreeReady {
            return Err(SessionError::InvalidState(self.state));
        }
        let (repo, branch) = match (&self.repo, &self.branch) {
            (Some(repo), Some(branch)) => (repo.clone(), branch.clone()),
            _ => return Err(SessionError::InvalidState(self.state)),
        };

        self.state = SessionState::Exporting;
        let cancel = self.cancel.child_token();
        let paths = self.selected_paths();
        let concurrency = options.concurrency.max(1);

        let run = fetch_contents(
            Arc::clone(&self.source),
            &repo,
            &branch,
            &paths,
            concurrency,
            &cancel,
        )
        .await;

        self.state = SessionState::TreeReady;
        match (run, self.tree.as_ref()) {
            (FetchRun::Completed(results), Some(tree)) => {
                Ok(ExportOutcome::Completed(assemble(tree, &results, options.max_bytes)))
            }
            _ => Ok(ExportOutcome::Cancelled),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetch::source::mock::MockSource;
    use std::time::Duration;

    fn repo() -> RepoId {
        RepoId { owner: "octo".into(), name: "demo".into() }
    }

    fn options() -> ExportOptions {
        ExportOptions { concurrency: 2, max_bytes: u64::MAX }
    }

    #[tokio::test]
    async fn load_builds_tree_and_reaches_ready() {
        let source = Arc::new(MockSource::new().with_blobs(&["a/1.txt", "b.txt"]));
        let mut session = Session::new(source);

        session.load(repo(), "main".into()).await.unwrap();
        assert_eq!(session.state(), SessionState::TreeReady);
        assert_eq!(session.tree().unwrap().file_paths(), ["a/1.txt", "b.txt"]);

        // collapsing is a presentation hint, valid only on directories
        session.set_collapsed("a", true).unwrap();
        assert!(session.tree().unwrap().find("a").unwrap().collapsed);
        assert!(matches!(
            session.set_collapsed("b.txt", true),
            Err(SessionError::UnknownPath(_))
        ));
    }

    #[tokio::test]
    async fn listing_failure_returns_to_idle_without_a_tree() {
        let source = Arc::new(
            MockSource::new().with_list_error(SourceError::NotFound("octo/demo".into())),
        );
        let mut session = Session::new(source);

        let err = session.load(repo(), "main".into()).await.unwrap_err();
        assert!(matches!(err, SessionError::Source(SourceError::NotFound(_))));
        assert_eq!(session.state(), SessionState::Idle);
        assert!(session.tree().is_none());
    }

    #[tokio::test]
    async fn malformed_listing_never_exposes_a_partial_tree() {
        let source = Arc::new(MockSource::new().with_blobs(&["ok.txt", "bad//path.txt"]));
        let mut session = Session::new(source);

        let err = session.load(repo(), "main".into()).await.unwrap_err();
        assert!(matches!(err, SessionError::MalformedPath(_)));
        assert_eq!(session.state(), SessionState::Idle);
        assert!(session.tree().is_none());
    }

    #[tokio::test]
    async fn selection_is_gated_on_a_ready_tree() {
        let source = Arc::new(MockSource::new().with_blobs(&["a.txt"]));
        let mut session = Session::new(Arc::clone(&source) as Arc<dyn RepositorySource>);

        assert!(matches!(
            session.toggle("a.txt"),
            Err(SessionError::InvalidState(SessionState::Idle))
        ));

        session.load(repo(), "main".into()).await.unwrap();
        session.toggle("a.txt").unwrap();
        assert_eq!(session.selected_paths(), ["a.txt"]);

        assert!(matches!(
            session.toggle("missing.txt"),
            Err(SessionError::UnknownPath(_))
        ));
    }

    #[tokio::test]
    async fn export_produces_document_in_canonical_order() {
        let source = Arc::new(
            MockSource::new()
                .with_blobs(&["a/1.txt", "a/2.txt", "b.txt"])
                .with_content("a/1.txt", "1")
                .with_content("a/2.txt", "2")
                .with_content("b.txt", "3"),
        );
        let mut session = Session::new(source);
        session.load(repo(), "main".into()).await.unwrap();
        session.toggle("").unwrap(); // select everything

        let outcome = session.export(options()).await.unwrap();
        let ExportOutcome::Completed(document) = outcome else {
            panic!("export should complete");
        };
        let order: Vec<&str> = document.sections.iter().map(|s| s.path.as_str()).collect();
        assert_eq!(order, ["a/1.txt", "a/2.txt", "b.txt"]);
        assert_eq!(session.state(), SessionState::TreeReady);
    }

    #[tokio::test]
    async fn export_with_one_failure_still_completes() {
        let source = Arc::new(
            MockSource::new().with_blobs(&["a/1.txt", "a/2.txt", "b.txt"]).with_fetch_error(
                "a/2.txt",
                SourceError::Transport("connection reset".into()),
            ),
        );
        let mut session = Session::new(source);
        session.load(repo(), "main".into()).await.unwrap();
        session.toggle("").unwrap();

        let ExportOutcome::Completed(document) = session.export(options()).await.unwrap() else {
            panic!("partial failure is not cancellation");
        };
        assert_eq!(document.sections.len(), 2);
        assert_eq!(document.skipped.len(), 1);
        assert_eq!(document.skipped[0].path, "a/2.txt");
    }

    #[tokio::test]
    async fn cancelled_export_surfaces_no_document() {
        let source = Arc::new(
            MockSource::new()
                .with_blobs(&["a.txt", "b.txt"])
                .with_delay(Duration::from_millis(200)),
        );
        let mut session = Session::new(source);
        session.load(repo(), "main".into()).await.unwrap();
        session.toggle("").unwrap();

        let handle = session.cancellation_handle();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(20)).await;
            handle.cancel();
        });

        let outcome = session.export(options()).await.unwrap();
        assert!(matches!(outcome, ExportOutcome::Cancelled));
        assert_eq!(session.state(), SessionState::TreeReady);
        // the tree survives for a retry
        assert_eq!(session.selected_paths(), ["a.txt", "b.txt"]);
    }

    #[tokio::test]
    async fn reloading_discards_previous_selection() {
        let source = Arc::new(MockSource::new().with_blobs(&["a.txt", "b.txt"]));
        let mut session = Session::new(source);

        session.load(repo(), "main".into()).await.unwrap();
        session.toggle("a.txt").unwrap();
        let stale_handle = session.cancellation_handle();

        session.load(repo(), "dev".into()).await.unwrap();
        assert!(stale_handle.is_cancelled(), "branch change cancels prior work");
        assert!(session.selected_paths().is_empty());
        assert_eq!(session.branch(), Some("dev"));
    }

    #[tokio::test]
    async fn export_requires_ready_state() {
        let source = Arc::new(MockSource::new());
        let mut session = Session::new(source);
        let err = session.export(options()).await.unwrap_err();
        assert!(matches!(err, SessionError::InvalidState(SessionState::Idle)));
    }

    #[tokio::test]
    async fn reset_returns_to_idle() {
        let source = Arc::new(MockSource::new().with_blobs(&["a.txt"]));
        let mut session = Session::new(source);
        session.load(repo(), "main".into()).await.unwrap();

        session.reset();
        assert_eq!(session.state(), SessionState::Idle);
        assert!(session.tree().is_none());
        assert!(session.repo().is_none());
    }
}
