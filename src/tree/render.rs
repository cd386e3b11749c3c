//! Textual map rendering of a selection tree.

use crate::tree::node::TreeNode;

/// Render the full tree as indented text, one entry per line, with selected
/// files marked. Children keep their tree order, so repeated calls over the
/// same tree produce identical output.
pub fn render_tree_map(root: &TreeNode, label: &str) -> String {
    let mut lines = vec![format!("{label}/")];
    walk(root, "", &mut lines);
    lines.join("\n")
}

fn walk(node: &TreeNode, prefix: &str, lines: &mut Vec<String>) {
    let total = node.children.len();
    for (idx, child) in node.children.iter().enumerate() {
        let is_last = idx == total - 1;
        let connector = if is_last { "└── " } else { "├── " };
        let marker = if !child.is_dir() && child.selected { " ⭐" } else { "" };

        if child.is_dir() {
            lines.push(format!("{prefix}{connector}{}/", child.name));
            let extension = if is_last { "    " } else { "│   " };
            walk(child, &format!("{prefix}{extension}"), lines);
        } else {
            lines.push(format!("{prefix}{connector}{}{marker}", child.name));
        }
    }
}
