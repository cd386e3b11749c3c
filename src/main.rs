//! repo-picker: Browse a remote repository, pick files, and bundle them into
//! one prompt-ready context document.

use anyhow::Result;

fn main() -> Result<()> {
    repo_picker::cli::run()
}
