//! Persisted list of recently used repository identifiers.

use anyhow::{Context, Result};
use std::fs;
use std::path::PathBuf;

pub const DEFAULT_RECENT_LIMIT: usize = 10;

/// Ordered most-recent-first list of repository specs, stored as a JSON
/// array under the user config directory.
pub struct RecentRepoStore {
    path: PathBuf,
    limit: usize,
}

impl RecentRepoStore {
    pub fn new(path: PathBuf, limit: usize) -> Self {
        Self { path, limit: limit.max(1) }
    }

    /// Store at `$XDG_CONFIG_HOME/repo-picker/recent.json` (or the platform
    /// equivalent). None when no home directory can be resolved.
    pub fn at_default_location(limit: usize) -> Option<Self> {
        let root = config_root_dir()?;
        Some(Self::new(root.join("repo-picker").join("recent.json"), limit))
    }

    /// A missing or unreadable store is an empty list, not an error.
    pub fn load(&self) -> Vec<String> {
        let Ok(content) = fs::read_to_string(&self.path) else {
            return Vec::new();
        };
        match serde_json::from_str(&content) {
            Ok(repos) => repos,
            Err(err) => {
                tracing::warn!("ignoring corrupt recent-repo store {}: {err}", self.path.display());
                Vec::new()
            }
        }
    }

    pub fn save(&self, repos: &[String]) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed creating {}", parent.display()))?;
        }
        let truncated: Vec<&String> = repos.iter().take(self.limit).collect();
        fs::write(&self.path, serde_json::to_string_pretty(&truncated)?)
            .with_context(|| format!("Failed writing {}", self.path.display()))?;
        Ok(())
    }

    /// Move-or-insert `repo` at the front and persist. Returns the new list.
    pub fn record(&self, repo: &str) -> Result<Vec<String>> {
        let mut repos = self.load();
        repos.retain(|existing| existing != repo);
        repos.insert(0, repo.to_string());
        repos.truncate(self.limit);
        self.save(&repos)?;
        Ok(repos)
    }

    pub fn remove(&self, repo: &str) -> Result<Vec<String>> {
        let mut repos = self.load();
        repos.retain(|existing| existing != repo);
        self.save(&repos)?;
        Ok(repos)
    }

    pub fn clear(&self) -> Result<()> {
        self.save(&[])
    }
}

pub fn config_root_dir() -> Option<PathBuf> {
    #[cfg(target_os = "windows")]
    {
        std::env::var_os("APPDATA").map(PathBuf::from)
    }
    #[cfg(not(target_os = "windows"))]
    {
        if let Some(xdg) = std::env::var_os("XDG_CONFIG_HOME") {
            return Some(PathBuf::from(xdg));
        }
        std::env::var_os("HOME").map(|home| PathBuf::from(home).join(".config"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn store(tmp: &TempDir, limit: usize) -> RecentRepoStore {
        RecentRepoStore::new(tmp.path().join("recent.json"), limit)
    }

    #[test]
    fn missing_store_loads_as_empty() {
        let tmp = TempDir::new().unwrap();
        assert!(store(&tmp, 5).load().is_empty());
    }

    #[test]
    fn record_is_move_to_front_and_deduplicating() {
        let tmp = TempDir::new().unwrap();
        let store = store(&tmp, 5);

        store.record("octo/alpha").unwrap();
        store.record("octo/beta").unwrap();
        let repos = store.record("octo/alpha").unwrap();

        assert_eq!(repos, ["octo/alpha", "octo/beta"]);
        assert_eq!(store.load(), repos);
    }

    #[test]
    fn record_caps_list_length() {
        let tmp = TempDir::new().unwrap();
        let store = store(&tmp, 2);

        store.record("octo/a").unwrap();
        store.record("octo/b").unwrap();
        let repos = store.record("octo/c").unwrap();

        assert_eq!(repos, ["octo/c", "octo/b"]);
    }

    #[test]
    fn remove_and_clear() {
        let tmp = TempDir::new().unwrap();
        let store = store(&tmp, 5);
        store.record("octo/a").unwrap();
        store.record("octo/b").unwrap();

        assert_eq!(store.remove("octo/b").unwrap(), ["octo/a"]);

        store.clear().unwrap();
        assert!(store.load().is_empty());
    }

    #[test]
    fn corrupt_store_is_treated_as_empty() {
        let tmp = TempDir::new().unwrap();
        let store = store(&tmp, 5);
        fs::write(tmp.path().join("recent.json"), "not json").unwrap();
        assert!(store.load().is_empty());
    }
}
