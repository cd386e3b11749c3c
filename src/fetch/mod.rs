//! Remote repository access and the concurrent fetch pipeline.

pub mod github;
pub mod orchestrator;
pub mod source;

pub use github::GithubSource;
pub use orchestrator::{fetch_contents, FetchRun};
pub use source::{RepositorySource, SourceError};
