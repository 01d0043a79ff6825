/*
 * Renderers over a scanned `TreeNode`. All three formats read the same node
 * structure, so they always agree on ordering and on which entries exist.
 *
 * The text format is the connector style that `tree_parse` reads back:
 *
 *   project/
 *   ├── src/
 *   │   └── main.py
 *   └── README.md
 */
use super::tree_node::{NodeKind, TreeNode};
use serde::Serialize;
use std::str::FromStr;

pub const BRANCH_MIDDLE: &str = "├── ";
pub const BRANCH_LAST: &str = "└── ";
pub const CONTINUE_MIDDLE: &str = "│   ";
pub const CONTINUE_LAST: &str = "    ";

const MARKDOWN_DIR_ICON: &str = "📁";
const MARKDOWN_FILE_ICON: &str = "📄";
const MARKDOWN_DENIED_ICON: &str = "⛔";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TreeFormat {
    #[default]
    Text,
    Markdown,
    Json,
}

impl FromStr for TreeFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "text" | "txt" => Ok(TreeFormat::Text),
            "markdown" | "md" => Ok(TreeFormat::Markdown),
            "json" => Ok(TreeFormat::Json),
            other => Err(format!("Unknown tree format '{other}'")),
        }
    }
}

pub fn render(root: &TreeNode, format: TreeFormat) -> String {
    match format {
        TreeFormat::Text => render_text(root),
        TreeFormat::Markdown => render_markdown(root),
        TreeFormat::Json => render_json(root),
    }
}

fn display_name(node: &TreeNode) -> String {
    if node.is_dir() {
        format!("{}/", node.name)
    } else {
        node.name.clone()
    }
}

pub fn render_text(root: &TreeNode) -> String {
    let mut lines = vec![display_name(root)];
    push_text_children(root.children(), "", &mut lines);
    lines.join("\n")
}

fn push_text_children(children: &[TreeNode], prefix: &str, lines: &mut Vec<String>) {
    for (index, child) in children.iter().enumerate() {
        let is_last = index + 1 == children.len();
        let connector = if is_last { BRANCH_LAST } else { BRANCH_MIDDLE };
        lines.push(format!("{prefix}{connector}{}", display_name(child)));
        if child.is_dir() {
            let continuation = if is_last { CONTINUE_LAST } else { CONTINUE_MIDDLE };
            push_text_children(child.children(), &format!("{prefix}{continuation}"), lines);
        }
    }
}

pub fn render_markdown(root: &TreeNode) -> String {
    let mut lines = Vec::with_capacity(root.count());
    push_markdown(root, 0, &mut lines);
    lines.join("\n")
}

fn push_markdown(node: &TreeNode, depth: usize, lines: &mut Vec<String>) {
    let icon = match node.kind {
        NodeKind::Directory { .. } => MARKDOWN_DIR_ICON,
        NodeKind::File => MARKDOWN_FILE_ICON,
        NodeKind::AccessDenied => MARKDOWN_DENIED_ICON,
    };
    lines.push(format!("{}- {icon} {}", "  ".repeat(depth), node.name));
    for child in node.children() {
        push_markdown(child, depth + 1, lines);
    }
}

#[derive(Debug, Serialize)]
struct JsonNode {
    name: String,
    #[serde(rename = "type")]
    kind: &'static str,
    path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    children: Option<Vec<JsonNode>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

impl From<&TreeNode> for JsonNode {
    fn from(node: &TreeNode) -> Self {
        match &node.kind {
            NodeKind::Directory { children } => JsonNode {
                name: node.name.clone(),
                kind: "directory",
                path: node.relative_path.clone(),
                children: Some(children.iter().map(JsonNode::from).collect()),
                error: None,
            },
            NodeKind::File => JsonNode {
                name: node.name.clone(),
                kind: "file",
                path: node.relative_path.clone(),
                children: None,
                error: None,
            },
            NodeKind::AccessDenied => JsonNode {
                name: node.name.clone(),
                kind: "error",
                path: node.relative_path.clone(),
                children: None,
                error: Some("permission denied".to_string()),
            },
        }
    }
}

pub fn render_json(root: &TreeNode) -> String {
    let json_root = JsonNode::from(root);
    match serde_json::to_string_pretty(&json_root) {
        Ok(text) => text,
        Err(err) => {
            // Only string keys and values are serialized, so this is not expected.
            log::error!("TreeRender: Failed to serialize tree as JSON: {err}");
            String::from("{}")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::tree_scan::{ScanOptions, scan_tree};
    use serde_json::Value;
    use std::fs::{self, File};
    use tempfile::tempdir;

    fn sample_tree() -> TreeNode {
        TreeNode::directory(
            "project",
            "",
            vec![
                TreeNode::directory(
                    "locked",
                    "locked",
                    vec![TreeNode::access_denied("locked")],
                ),
                TreeNode::directory(
                    "src",
                    "src",
                    vec![
                        TreeNode::file("lib.py", "src/lib.py"),
                        TreeNode::file("main.py", "src/main.py"),
                    ],
                ),
                TreeNode::file("README.md", "README.md"),
            ],
        )
    }

    #[test]
    fn test_render_text_connectors_are_exact() {
        let text = render_text(&sample_tree());

        let expected = [
            "project/",
            "├── locked/",
            "│   └── [access denied]",
            "├── src/",
            "│   ├── lib.py",
            "│   └── main.py",
            "└── README.md",
        ]
        .join("\n");
        assert_eq!(text, expected);
    }

    #[test]
    fn test_render_text_last_directory_uses_blank_continuation() {
        let root = TreeNode::directory(
            "r",
            "",
            vec![TreeNode::directory(
                "a",
                "a",
                vec![TreeNode::directory("b", "a/b", vec![TreeNode::file("c", "a/b/c")])],
            )],
        );

        assert_eq!(
            render_text(&root),
            "r/\n└── a/\n    └── b/\n        └── c"
        );
    }

    #[test]
    fn test_render_markdown_indents_by_depth() {
        let markdown = render_markdown(&sample_tree());

        let expected = [
            "- 📁 project",
            "  - 📁 locked",
            "    - ⛔ [access denied]",
            "  - 📁 src",
            "    - 📄 lib.py",
            "    - 📄 main.py",
            "  - 📄 README.md",
        ]
        .join("\n");
        assert_eq!(markdown, expected);
    }

    #[test]
    fn test_render_json_shape() {
        let json: Value =
            serde_json::from_str(&render_json(&sample_tree())).expect("output should be JSON");

        assert_eq!(json["name"], "project");
        assert_eq!(json["type"], "directory");
        assert_eq!(json["children"][0]["children"][0]["type"], "error");
        assert!(json["children"][0]["children"][0]["error"].is_string());
        assert_eq!(json["children"][1]["children"][1]["path"], "src/main.py");
        assert_eq!(json["children"][2]["type"], "file");
        assert!(json["children"][2].get("children").is_none());
    }

    fn json_paths(node: &Value, out: &mut Vec<String>) {
        if let Some(children) = node["children"].as_array() {
            for child in children {
                let path = child["path"].as_str().unwrap_or_default().to_string();
                match child["type"].as_str() {
                    Some("directory") => {
                        out.push(format!("{path}/"));
                        json_paths(child, out);
                    }
                    Some("file") => out.push(path),
                    _ => {}
                }
            }
        }
    }

    #[test]
    fn test_text_and_json_agree_on_scanned_tree() -> std::io::Result<()> {
        // Arrange
        let dir = tempdir()?;
        fs::create_dir_all(dir.path().join("pkg").join("__pycache__"))?;
        File::create(dir.path().join("pkg").join("__pycache__").join("x.pyc"))?;
        fs::create_dir(dir.path().join("empty"))?;
        File::create(dir.path().join("pkg").join("Mod.py"))?;
        File::create(dir.path().join("pkg").join("a.py"))?;
        File::create(dir.path().join("notes.txt"))?;
        let tree = scan_tree(dir.path(), &ScanOptions::default()).expect("scan should succeed");

        // Act
        let text = render_text(&tree);
        let json: Value = serde_json::from_str(&render_json(&tree)).expect("valid JSON");

        // Assert
        let mut from_json = Vec::new();
        json_paths(&json, &mut from_json);
        assert_eq!(from_json, tree.descendant_paths());
        assert_eq!(from_json, vec!["pkg/", "pkg/a.py", "pkg/Mod.py", "notes.txt"]);
        assert_eq!(text.lines().count(), from_json.len() + 1);
        Ok(())
    }

    #[test]
    fn test_tree_format_from_str() {
        assert_eq!("md".parse::<TreeFormat>(), Ok(TreeFormat::Markdown));
        assert_eq!("JSON".parse::<TreeFormat>(), Ok(TreeFormat::Json));
        assert_eq!("text".parse::<TreeFormat>(), Ok(TreeFormat::Text));
        assert!("yaml".parse::<TreeFormat>().is_err());
    }
}
