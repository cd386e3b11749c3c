//! Visibility filtering over the selection tree.
//!
//! Filtering narrows what the presentation layer shows; it never touches
//! selection state, so a file hidden by a new filter keeps its selection.

use crate::tree::node::{NodeKind, TreeNode};
use globset::{GlobBuilder, GlobMatcher};
use std::collections::HashSet;

/// Name/path predicate. Case-insensitive substring by default; inputs
/// containing `*` or `?` are compiled as globs.
#[derive(Debug, Clone)]
pub enum FilterPredicate {
    Substring(String),
    Glob(GlobMatcher),
    /// A glob that failed to compile. Matches nothing instead of erroring.
    Never,
}

impl FilterPredicate {
    pub fn parse(input: &str) -> Self {
        if input.contains('*') || input.contains('?') {
            match GlobBuilder::new(input).case_insensitive(true).build() {
                Ok(glob) => Self::Glob(glob.compile_matcher()),
                Err(err) => {
                    tracing::debug!("invalid filter glob {input:?}: {err}");
                    Self::Never
                }
            }
        } else {
            Self::Substring(input.to_lowercase())
        }
    }

    pub fn matches(&self, candidate: &str) -> bool {
        match self {
            Self::Substring(needle) => candidate.to_lowercase().contains(needle),
            Self::Glob(matcher) => matcher.is_match(candidate),
            Self::Never => false,
        }
    }
}

/// Compute the set of visible paths under `predicate`.
///
/// A file is visible iff its path or its basename matches. A directory is
/// visible iff any descendant file is.
pub fn filter(root: &TreeNode, predicate: &FilterPredicate) -> HashSet<String> {
    let mut visible = HashSet::new();
    collect_visible(root, predicate, &mut visible);
    visible
}

fn collect_visible(
    node: &TreeNode,
    predicate: &FilterPredicate,
    visible: &mut HashSet<String>,
) -> bool {
    match node.kind {
        NodeKind::File => {
            let matched = predicate.matches(&node.path) || predicate.matches(&node.name);
            if matched {
                visible.insert(node.path.clone());
            }
            matched
        }
        NodeKind::Directory => {
            let mut any = false;
            for child in &node.children {
                any |= collect_visible(child, predicate, visible);
            }
            if any && !node.path.is_empty() {
                visible.insert(node.path.clone());
            }
            any
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::BlobDescriptor;

    fn tree() -> TreeNode {
        let blobs: Vec<BlobDescriptor> = ["src/main.rs", "src/cli/mod.rs", "docs/guide.md"]
            .iter()
            .enumerate()
            .map(|(i, p)| BlobDescriptor::new(*p, i))
            .collect();
        TreeNode::build(&blobs).unwrap()
    }

    #[test]
    fn substring_match_is_case_insensitive_and_lifts_ancestors() {
        let visible = filter(&tree(), &FilterPredicate::parse("MAIN"));
        assert!(visible.contains("src/main.rs"));
        assert!(visible.contains("src"));
        assert!(!visible.contains("docs/guide.md"));
        assert!(!visible.contains("docs"));
    }

    #[test]
    fn basename_alone_can_match() {
        let visible = filter(&tree(), &FilterPredicate::parse("mod.rs"));
        assert!(visible.contains("src/cli/mod.rs"));
        assert!(visible.contains("src/cli"));
    }

    #[test]
    fn glob_patterns_are_supported() {
        let visible = filter(&tree(), &FilterPredicate::parse("*.md"));
        let expected: HashSet<String> =
            ["docs/guide.md", "docs"].iter().map(|s| s.to_string()).collect();
        assert_eq!(visible, expected);

        let visible = filter(&tree(), &FilterPredicate::parse("src/*.rs"));
        assert!(visible.contains("src/main.rs"));
        assert!(visible.contains("src/cli/mod.rs"), "* spans separators");
    }

    #[test]
    fn malformed_glob_matches_nothing() {
        let predicate = FilterPredicate::parse("src/[*.rs");
        assert!(matches!(predicate, FilterPredicate::Never));
        assert!(filter(&tree(), &predicate).is_empty());
    }

    #[test]
    fn filtering_never_mutates_selection() {
        let mut t = tree();
        t.toggle("docs/guide.md");
        let before = t.selected_paths();

        let _ = filter(&t, &FilterPredicate::parse("*.rs"));
        assert_eq!(t.selected_paths(), before);
        assert!(t.find("docs/guide.md").unwrap().selected);
    }
}
