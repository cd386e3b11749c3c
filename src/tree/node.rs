//! Hierarchical selection tree built from a branch's flat blob listing.

use crate::domain::BlobDescriptor;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    Directory,
    File,
}

/// Derived selection state of a node.
///
/// Directories never store a selection flag; their state is always computed
/// from descendant file nodes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectionState {
    None,
    Partial,
    Full,
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("malformed blob path {path:?}: {reason}")]
pub struct MalformedPathError {
    pub path: String,
    pub reason: &'static str,
}

/// One node of the selection tree.
///
/// Structure is fixed after [`TreeNode::build`]; only `selected` (files),
/// `collapsed` (directories) and nothing else mutate afterwards. Directory
/// nodes are synthesized from path segments, never supplied by the listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TreeNode {
    pub path: String,
    pub name: String,
    pub kind: NodeKind,
    pub children: Vec<TreeNode>,
    pub selected: bool,
    pub collapsed: bool,
    pub size: Option<u64>,
}

impl TreeNode {
    fn directory(path: String, name: &str) -> Self {
        Self {
            path,
            name: name.to_string(),
            kind: NodeKind::Directory,
            children: Vec::new(),
            selected: false,
            collapsed: false,
            size: None,
        }
    }

    fn file(path: String, name: &str) -> Self {
        Self {
            path,
            name: name.to_string(),
            kind: NodeKind::File,
            children: Vec::new(),
            selected: false,
            collapsed: false,
            size: None,
        }
    }

    pub fn is_dir(&self) -> bool {
        self.kind == NodeKind::Directory
    }

    /// Build the tree for one branch snapshot.
    ///
    /// Children of a directory appear in first-appearance order of the input
    /// sequence, matching the order the remote listing returned them. Fails
    /// on the first malformed path; callers must not present a partially
    /// built tree.
    pub fn build(blobs: &[BlobDescriptor]) -> Result<TreeNode, MalformedPathError> {
        let mut root = TreeNode::directory(String::new(), "");
        for blob in blobs {
            insert_blob(&mut root, &blob.path, blob.size)?;
        }
        Ok(root)
    }

    /// Look a node up by its slash-separated path. The empty path is the root.
    pub fn find(&self, path: &str) -> Option<&TreeNode> {
        if path.is_empty() {
            return Some(self);
        }
        let mut node = self;
        for segment in path.split('/') {
            node = node.children.iter().find(|c| c.name == segment)?;
        }
        Some(node)
    }

    fn find_mut(&mut self, path: &str) -> Option<&mut TreeNode> {
        if path.is_empty() {
            return Some(self);
        }
        let mut node = self;
        for segment in path.split('/') {
            node = node.children.iter_mut().find(|c| c.name == segment)?;
        }
        Some(node)
    }

    /// Derived selection state. For files this mirrors the stored flag; for
    /// directories it aggregates over all descendant files.
    pub fn selection_state(&self) -> SelectionState {
        let (selected, total) = self.count_selected_files();
        if total == 0 || selected == 0 {
            SelectionState::None
        } else if selected == total {
            SelectionState::Full
        } else {
            SelectionState::Partial
        }
    }

    fn count_selected_files(&self) -> (usize, usize) {
        match self.kind {
            NodeKind::File => (usize::from(self.selected), 1),
            NodeKind::Directory => self.children.iter().fold((0, 0), |(sel, tot), child| {
                let (s, t) = child.count_selected_files();
                (sel + s, tot + t)
            }),
        }
    }

    /// Flip selection at `path`.
    ///
    /// A file flips its own flag. A directory sets every descendant file to
    /// the opposite of its current derived fully-selected state, so toggling
    /// a partially selected directory selects everything under it and
    /// toggling a fully selected one clears it. Returns false when no node
    /// exists at `path`.
    pub fn toggle(&mut self, path: &str) -> bool {
        let Some(node) = self.find_mut(path) else {
            return false;
        };
        match node.kind {
            NodeKind::File => node.selected = !node.selected,
            NodeKind::Directory => {
                let target = node.selection_state() != SelectionState::Full;
                node.set_all_files(target);
            }
        }
        true
    }

    fn set_all_files(&mut self, selected: bool) {
        match self.kind {
            NodeKind::File => self.selected = selected,
            NodeKind::Directory => {
                for child in &mut self.children {
                    child.set_all_files(selected);
                }
            }
        }
    }

    /// Presentation hint only; has no effect on selection. Returns false for
    /// unknown paths and for file nodes.
    pub fn set_collapsed(&mut self, path: &str, collapsed: bool) -> bool {
        match self.find_mut(path) {
            Some(node) if node.is_dir() => {
                node.collapsed = collapsed;
                true
            }
            _ => false,
        }
    }

    /// Selected file paths in depth-first pre-order. This is the canonical
    /// order every downstream consumer reproduces.
    pub fn selected_paths(&self) -> Vec<String> {
        let mut out = Vec::new();
        self.visit_files(&mut |node| {
            if node.selected {
                out.push(node.path.clone());
            }
        });
        out
    }

    /// All file paths in depth-first pre-order.
    pub fn file_paths(&self) -> Vec<String> {
        let mut out = Vec::new();
        self.visit_files(&mut |node| out.push(node.path.clone()));
        out
    }

    fn visit_files(&self, visit: &mut impl FnMut(&TreeNode)) {
        match self.kind {
            NodeKind::File => visit(self),
            NodeKind::Directory => {
                for child in &self.children {
                    child.visit_files(visit);
                }
            }
        }
    }
}

fn insert_blob(
    root: &mut TreeNode,
    path: &str,
    size: Option<u64>,
) -> Result<(), MalformedPathError> {
    let malformed = |reason| MalformedPathError { path: path.to_string(), reason };

    if path.is_empty() {
        return Err(malformed("empty path"));
    }
    let segments: Vec<&str> = path.split('/').collect();
    if segments.iter().any(|s| s.is_empty()) {
        return Err(malformed("empty path segment"));
    }

    let mut node = root;
    let last = segments.len() - 1;
    for (depth, segment) in segments.iter().enumerate() {
        let child_path = segments[..=depth].join("/");
        if depth == last {
            if node.children.iter().any(|c| c.name == *segment) {
                return Err(malformed("duplicate path"));
            }
            let mut file = TreeNode::file(child_path, segment);
            file.size = size;
            node.children.push(file);
        } else {
            let idx = match node.children.iter().position(|c| c.name == *segment) {
                Some(i) if node.children[i].is_dir() => i,
                Some(_) => return Err(malformed("path passes through a file")),
                None => {
                    node.children.push(TreeNode::directory(child_path, segment));
                    node.children.len() - 1
                }
            };
            node = &mut node.children[idx];
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn blobs(paths: &[&str]) -> Vec<BlobDescriptor> {
        paths.iter().enumerate().map(|(i, p)| BlobDescriptor::new(*p, i)).collect()
    }

    fn sample_tree() -> TreeNode {
        TreeNode::build(&blobs(&["a/1.txt", "a/2.txt", "b.txt"])).unwrap()
    }

    #[test]
    fn build_reconstructs_exact_path_set() {
        let input = ["src/main.rs", "src/cli/mod.rs", "README.md", "src/cli/export.rs"];
        let tree = TreeNode::build(&blobs(&input)).unwrap();

        let mut found = tree.file_paths();
        let mut expected: Vec<String> = input.iter().map(|s| s.to_string()).collect();
        found.sort();
        expected.sort();
        assert_eq!(found, expected);
    }

    #[test]
    fn children_follow_first_appearance_order() {
        let tree = TreeNode::build(&blobs(&["zeta/x.rs", "alpha/y.rs", "zeta/a.rs"])).unwrap();
        let top: Vec<&str> = tree.children.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(top, ["zeta", "alpha"]);

        let zeta = tree.find("zeta").unwrap();
        let inner: Vec<&str> = zeta.children.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(inner, ["x.rs", "a.rs"]);
    }

    #[test]
    fn build_rejects_malformed_paths() {
        for bad in ["", "a//b", "/a", "a/"] {
            let err = TreeNode::build(&blobs(&[bad])).unwrap_err();
            assert_eq!(err.path, bad);
        }
    }

    #[test]
    fn build_rejects_duplicates_and_conflicts() {
        assert!(TreeNode::build(&blobs(&["a/b.txt", "a/b.txt"])).is_err());
        // "a" as a file, then "a/b.txt" walking through it
        assert!(TreeNode::build(&blobs(&["a", "a/b.txt"])).is_err());
        // directory "a" synthesized first, then blob "a" itself
        assert!(TreeNode::build(&blobs(&["a/b.txt", "a"])).is_err());
    }

    #[test]
    fn toggle_file_flips_selection() {
        let mut tree = sample_tree();
        assert!(tree.toggle("b.txt"));
        assert!(tree.find("b.txt").unwrap().selected);
        assert!(tree.toggle("b.txt"));
        assert!(!tree.find("b.txt").unwrap().selected);
    }

    #[test]
    fn toggle_unknown_path_is_rejected() {
        let mut tree = sample_tree();
        assert!(!tree.toggle("missing.txt"));
    }

    #[test]
    fn directory_selection_is_derived() {
        let mut tree = sample_tree();
        assert_eq!(tree.find("a").unwrap().selection_state(), SelectionState::None);

        tree.toggle("a/1.txt");
        assert_eq!(tree.find("a").unwrap().selection_state(), SelectionState::Partial);

        tree.toggle("a/2.txt");
        assert_eq!(tree.find("a").unwrap().selection_state(), SelectionState::Full);
        // root sees b.txt still unselected
        assert_eq!(tree.selection_state(), SelectionState::Partial);
    }

    #[test]
    fn toggling_partial_directory_selects_everything_under_it() {
        let mut tree = sample_tree();
        tree.toggle("a/1.txt");
        tree.toggle("a");
        assert_eq!(tree.find("a").unwrap().selection_state(), SelectionState::Full);

        // and toggling a fully selected directory clears it
        tree.toggle("a");
        assert_eq!(tree.find("a").unwrap().selection_state(), SelectionState::None);
    }

    #[test]
    fn toggling_directory_twice_restores_leaf_state() {
        let mut tree = sample_tree();
        tree.toggle("a/2.txt");
        let before: Vec<String> = tree.selected_paths();

        tree.toggle("a");
        tree.toggle("a");
        assert_eq!(tree.selected_paths(), before);
    }

    #[test]
    fn selected_paths_are_preorder() {
        let mut tree =
            TreeNode::build(&blobs(&["a/1.txt", "a/2.txt", "b.txt", "a/sub/3.txt"])).unwrap();
        tree.toggle(""); // select everything from the root
        assert_eq!(tree.selected_paths(), ["a/1.txt", "a/2.txt", "a/sub/3.txt", "b.txt"]);
    }

    #[test]
    fn collapse_is_presentation_only() {
        let mut tree = sample_tree();
        tree.toggle("a");
        let before = tree.selected_paths();

        assert!(tree.set_collapsed("a", true));
        assert_eq!(tree.selected_paths(), before);
        assert!(tree.find("a").unwrap().collapsed);

        // collapsing a file is rejected
        assert!(!tree.set_collapsed("b.txt", true));
    }
}
