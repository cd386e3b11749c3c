//! Deterministic assembly of fetched contents into one export document.

use crate::domain::{
    ExportDocument, FetchOutcome, FetchResult, Section, SkipReason, SkippedFile,
};
use crate::tree::{render_tree_map, TreeNode};
use chrono::Utc;
use std::collections::HashMap;

/// Merge fetch results into an [`ExportDocument`].
///
/// Sections follow the tree's canonical pre-order, never the order fetches
/// completed in. Failed fetches land in `skipped` with their reason. Once
/// appending a section would push the running content total past
/// `max_bytes`, that section and every one after it is skipped as
/// `SizeBudgetExceeded`; assembly itself never fails on budget overflow.
pub fn assemble(tree: &TreeNode, results: &[FetchResult], max_bytes: u64) -> ExportDocument {
    let by_path: HashMap<&str, &FetchResult> =
        results.iter().map(|r| (r.path.as_str(), r)).collect();

    let mut sections = Vec::new();
    let mut skipped = Vec::new();
    let mut total_bytes = 0u64;
    let mut budget_exhausted = false;

    for path in tree.selected_paths() {
        let outcome = by_path.get(path.as_str()).map(|r| &r.outcome);
        match outcome {
            Some(FetchOutcome::Success { content, .. }) => {
                let content_bytes = content.len() as u64;
                if budget_exhausted || total_bytes + content_bytes > max_bytes {
                    budget_exhausted = true;
                    skipped.push(SkippedFile { path, reason: SkipReason::SizeBudgetExceeded });
                } else {
                    total_bytes += content_bytes;
                    sections.push(Section { path, content: content.clone() });
                }
            }
            Some(FetchOutcome::Failure { reason }) => {
                skipped.push(SkippedFile { path, reason: SkipReason::FetchFailed(reason.clone()) });
            }
            // Total over its inputs: a selected path without a result is
            // recorded, not panicked over.
            None => {
                skipped.push(SkippedFile {
                    path,
                    reason: SkipReason::FetchFailed("no content retrieved".to_string()),
                });
            }
        }
    }

    ExportDocument { tree_map: render_tree_map(tree, "."), sections, skipped, total_bytes }
}

/// Render the document as Markdown.
///
/// The generation timestamp is added here, not in [`assemble`], so document
/// assembly stays byte-identical for identical inputs; pass
/// `include_timestamp = false` for reproducible output files.
pub fn render_document(document: &ExportDocument, title: &str, include_timestamp: bool) -> String {
    let mut out = String::new();

    out.push_str(&format!("# Repository: {title}\n\n"));
    if include_timestamp {
        out.push_str(&format!(
            "Generated at: {}\n\n",
            Utc::now().format("%Y-%m-%dT%H:%M:%S+00:00")
        ));
    }

    out.push_str("## Directory map\n\n");
    out.push_str("```\n");
    out.push_str(&document.tree_map);
    out.push_str("\n```\n");

    for section in &document.sections {
        out.push_str(&format!("\n## {}\n\n", section.path));
        out.push_str("```\n");
        out.push_str(&section.content);
        if !section.content.ends_with('\n') {
            out.push('\n');
        }
        out.push_str("```\n");
    }

    if !document.skipped.is_empty() {
        out.push_str(&format!("\n## Skipped files ({})\n\n", document.skipped.len()));
        for skip in &document.skipped {
            out.push_str(&format!("- {}: {}\n", skip.path, skip.reason));
        }
    }

    out
}
