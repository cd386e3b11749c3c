//! Active credential resolution and validation.

use crate::fetch::github::GithubSource;
use crate::fetch::source::SourceError;

/// Holds the token the session authenticates with, if any.
///
/// Precedence: an explicitly passed token (flag or `GITHUB_TOKEN`
/// environment, resolved by the CLI) wins over one from the config file.
pub struct CredentialStore {
    token: Option<String>,
}

impl CredentialStore {
    pub fn resolve(explicit: Option<String>, from_config: Option<String>) -> Self {
        let clean = |token: Option<String>| token.filter(|t| !t.trim().is_empty());
        Self { token: clean(explicit).or_else(|| clean(from_config)) }
    }

    pub fn current(&self) -> Option<&str> {
        self.token.as_deref()
    }

    /// Check the active token against the source. Absent token is simply
    /// unauthenticated access, reported as not-validated rather than an
    /// error.
    pub async fn validate(&self, source: &GithubSource) -> Result<bool, SourceError> {
        match &self.token {
            Some(token) => source.validate_token(token).await,
            None => Ok(false),
        }
    }
}
