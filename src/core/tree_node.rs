/*
 * The intermediate structure produced by the folder walk and consumed by every
 * tree renderer. Children are kept in presentation order (directories first,
 * then files, each group case-insensitively by name).
 */
use std::cmp::Ordering;

pub const ACCESS_DENIED_LABEL: &str = "[access denied]";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeKind {
    Directory { children: Vec<TreeNode> },
    File,
    /* Placeholder for a directory whose listing could not be read. */
    AccessDenied,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TreeNode {
    pub name: String,
    /* Forward-slash path relative to the walk root; empty for the root itself. */
    pub relative_path: String,
    pub kind: NodeKind,
}

impl TreeNode {
    pub fn directory(name: &str, relative_path: &str, children: Vec<TreeNode>) -> Self {
        TreeNode {
            name: name.to_string(),
            relative_path: relative_path.to_string(),
            kind: NodeKind::Directory { children },
        }
    }

    pub fn file(name: &str, relative_path: &str) -> Self {
        TreeNode {
            name: name.to_string(),
            relative_path: relative_path.to_string(),
            kind: NodeKind::File,
        }
    }

    pub fn access_denied(parent_relative_path: &str) -> Self {
        TreeNode {
            name: ACCESS_DENIED_LABEL.to_string(),
            relative_path: parent_relative_path.to_string(),
            kind: NodeKind::AccessDenied,
        }
    }

    pub fn is_dir(&self) -> bool {
        matches!(self.kind, NodeKind::Directory { .. })
    }

    pub fn children(&self) -> &[TreeNode] {
        match &self.kind {
            NodeKind::Directory { children } => children,
            _ => &[],
        }
    }

    /*
     * Number of nodes in this subtree, including this one.
     */
    pub fn count(&self) -> usize {
        1 + self.children().iter().map(TreeNode::count).sum::<usize>()
    }

    /*
     * Relative paths of every file and directory below this node, directories
     * suffixed with `/`. Placeholders are omitted.
     */
    pub fn descendant_paths(&self) -> Vec<String> {
        let mut paths = Vec::new();
        collect_paths(self.children(), &mut paths);
        paths
    }
}

fn collect_paths(nodes: &[TreeNode], out: &mut Vec<String>) {
    for node in nodes {
        match &node.kind {
            NodeKind::Directory { children } => {
                out.push(format!("{}/", node.relative_path));
                collect_paths(children, out);
            }
            NodeKind::File => out.push(node.relative_path.clone()),
            NodeKind::AccessDenied => {}
        }
    }
}

/*
 * Directories before files, then case-insensitive name, then exact name so the
 * order is total.
 */
pub fn presentation_order(a: &TreeNode, b: &TreeNode) -> Ordering {
    b.is_dir()
        .cmp(&a.is_dir())
        .then_with(|| a.name.to_lowercase().cmp(&b.name.to_lowercase()))
        .then_with(|| a.name.cmp(&b.name))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_presentation_order_puts_directories_first() {
        let mut nodes = vec![
            TreeNode::file("b.txt", "b.txt"),
            TreeNode::directory("Zed", "Zed", vec![]),
            TreeNode::file("A.txt", "A.txt"),
            TreeNode::directory("alpha", "alpha", vec![]),
        ];

        nodes.sort_by(presentation_order);

        let names: Vec<&str> = nodes.iter().map(|n| n.name.as_str()).collect();
        assert_eq!(names, vec!["alpha", "Zed", "A.txt", "b.txt"]);
    }

    #[test]
    fn test_descendant_paths_and_count() {
        let root = TreeNode::directory(
            "project",
            "",
            vec![
                TreeNode::directory(
                    "src",
                    "src",
                    vec![TreeNode::file("main.py", "src/main.py")],
                ),
                TreeNode::directory("locked", "locked", vec![TreeNode::access_denied("locked")]),
                TreeNode::file("README.md", "README.md"),
            ],
        );

        assert_eq!(
            root.descendant_paths(),
            vec!["src/", "src/main.py", "locked/", "README.md"]
        );
        assert_eq!(root.count(), 6);
    }
}
