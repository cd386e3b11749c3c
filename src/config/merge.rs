//! CLI-over-config merging.

use crate::config::Config;

/// Values the CLI may override; `None` leaves the config value in place.
#[derive(Debug, Default, Clone)]
pub struct CliOverrides {
    pub concurrency: Option<usize>,
    pub max_total_bytes: Option<u64>,
    pub max_file_bytes: Option<u64>,
    pub recent_limit: Option<usize>,
    pub token: Option<String>,
}

pub fn merge_cli_with_config(config: Config, overrides: CliOverrides) -> Config {
    Config {
        concurrency: overrides.concurrency.unwrap_or(config.concurrency),
        max_total_bytes: overrides.max_total_bytes.unwrap_or(config.max_total_bytes),
        max_file_bytes: overrides.max_file_bytes.unwrap_or(config.max_file_bytes),
        recent_limit: overrides.recent_limit.unwrap_or(config.recent_limit),
        token: overrides.token.or(config.token),
    }
}
