//! Configuration loading and merging
//!
//! Handles loading from config files and CLI arguments with proper
//! precedence (CLI > File > Defaults).

pub mod loader;
pub mod merge;

pub use loader::load_config;
pub use merge::{merge_cli_with_config, CliOverrides};

use serde::Deserialize;

pub const DEFAULT_CONCURRENCY: usize = 8;
pub const DEFAULT_MAX_TOTAL_BYTES: u64 = 10 * 1024 * 1024;
pub const DEFAULT_MAX_FILE_BYTES: u64 = 1_048_576;

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Maximum fetches in flight during an export.
    pub concurrency: usize,
    /// Budget for the sum of section content bytes in one document.
    pub max_total_bytes: u64,
    /// Per-file size above which the source rejects a blob.
    pub max_file_bytes: u64,
    /// Cap on the persisted recent-repository list.
    pub recent_limit: usize,
    pub token: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            concurrency: DEFAULT_CONCURRENCY,
            max_total_bytes: DEFAULT_MAX_TOTAL_BYTES,
            max_file_bytes: DEFAULT_MAX_FILE_BYTES,
            recent_limit: crate::store::recent::DEFAULT_RECENT_LIMIT,
            token: None,
        }
    }
}
