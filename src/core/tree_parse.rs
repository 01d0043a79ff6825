use super::path_utils::is_safe_relative;
use std::collections::BTreeSet;

/*
 * Reads connector-style tree text (as written by `tree_render::render_text`,
 * or typed by hand) back into a list of relative paths.
 *
 * Rules:
 * - Blank lines are dropped; trailing whitespace is ignored.
 * - The indentation level of a line is the number of leading connector or
 *   whitespace characters divided by four.
 * - The first line is the project root at level 0 and is itself an entry.
 *   A later line at level 0 is its sibling, not its child.
 * - A line is a directory when its name ends with `/` or the following line is
 *   indented deeper. Directory entries are returned with a trailing `/`.
 * - Decorative icons are stripped from names.
 * - Entries that would escape the output root (`..`, absolute paths) are
 *   rejected with a warning, together with everything nested beneath them.
 */

pub const INDENT_WIDTH: usize = 4;

const CONNECTOR_CHARS: &[char] = &['│', '├', '└', '─'];

const DECORATIVE_ICONS: &[&str] = &[
    "📁", "📄", "📝", "⚙️", "📦", "🔧", "⚡", "📚", "🔍", "📌", "✅", "📂", "🗂️", "⛔",
];

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedTree {
    /* Sorted and de-duplicated; directories end with `/`. */
    pub entries: Vec<String>,
    pub warnings: Vec<String>,
}

impl ParsedTree {
    pub fn directories(&self) -> impl Iterator<Item = &str> {
        self.entries
            .iter()
            .map(String::as_str)
            .filter(|e| e.ends_with('/'))
    }

    pub fn files(&self) -> impl Iterator<Item = &str> {
        self.entries
            .iter()
            .map(String::as_str)
            .filter(|e| !e.ends_with('/'))
    }
}

struct TreeLine {
    line_number: usize,
    prefix_width: usize,
    name: String,
}

fn is_prefix_char(c: char) -> bool {
    c.is_whitespace() || CONNECTOR_CHARS.contains(&c)
}

fn strip_icons(text: &str) -> String {
    let mut cleaned = text.to_string();
    for icon in DECORATIVE_ICONS {
        cleaned = cleaned.replace(icon, "");
    }
    cleaned.trim().to_string()
}

fn split_line(line_number: usize, raw: &str) -> TreeLine {
    let prefix_width = raw.chars().take_while(|c| is_prefix_char(*c)).count();
    let content: String = raw.chars().skip(prefix_width).collect();
    TreeLine {
        line_number,
        prefix_width,
        name: strip_icons(&content),
    }
}

pub fn parse_tree_text(text: &str) -> ParsedTree {
    let lines: Vec<TreeLine> = text
        .lines()
        .enumerate()
        .map(|(index, raw)| (index + 1, raw.trim_end()))
        .filter(|(_, raw)| !raw.trim().is_empty())
        .map(|(line_number, raw)| split_line(line_number, raw))
        .collect();

    let mut parsed = ParsedTree::default();
    let Some((root_line, rest)) = lines.split_first() else {
        return parsed;
    };

    let root_name = root_line.name.trim_end_matches('/').to_string();
    if root_name.is_empty() || !is_safe_relative(&root_name) {
        parsed
            .warnings
            .push(format!("Line {}: invalid root entry '{}'", root_line.line_number, root_line.name));
        return parsed;
    }
    if root_line.prefix_width > 0 {
        parsed.warnings.push(format!(
            "Line {}: root entry is indented; treating it as level 0",
            root_line.line_number
        ));
    }

    let mut entries: BTreeSet<String> = BTreeSet::new();
    entries.insert(format!("{root_name}/"));
    let mut stack: Vec<String> = vec![root_name];

    for (index, line) in rest.iter().enumerate() {
        if line.prefix_width % INDENT_WIDTH != 0 {
            parsed.warnings.push(format!(
                "Line {}: indentation of {} is not a multiple of {INDENT_WIDTH}",
                line.line_number, line.prefix_width
            ));
        }
        let level = line.prefix_width / INDENT_WIDTH;
        if line.name.is_empty() {
            parsed
                .warnings
                .push(format!("Line {}: no entry name, skipped", line.line_number));
            continue;
        }

        if level > stack.len() {
            parsed.warnings.push(format!(
                "Line {}: indentation skips a level; attaching '{}' to the nearest directory",
                line.line_number, line.name
            ));
        }
        stack.truncate(level);

        let next_is_deeper = rest
            .get(index + 1)
            .is_some_and(|next| next.prefix_width / INDENT_WIDTH > level);
        let is_dir = line.name.ends_with('/') || next_is_deeper;
        let bare_name = line.name.trim_end_matches('/');
        let relative = if stack.is_empty() {
            bare_name.to_string()
        } else {
            format!("{}/{}", stack.join("/"), bare_name)
        };

        if !is_safe_relative(bare_name) || !is_safe_relative(&relative) {
            parsed.warnings.push(format!(
                "Line {}: rejected unsafe entry '{}'",
                line.line_number, line.name
            ));
        } else if is_dir {
            entries.insert(format!("{relative}/"));
        } else {
            entries.insert(relative);
        }

        if is_dir {
            stack.push(bare_name.to_string());
        }
    }

    parsed.entries = entries.into_iter().collect();
    for warning in &parsed.warnings {
        log::warn!("TreeParser: {warning}");
    }
    parsed
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_basic_project_tree() {
        let text = "project/\n├── src/\n│   └── main.py\n└── README.md\n";

        let parsed = parse_tree_text(text);

        assert_eq!(
            parsed.entries,
            vec![
                "project/",
                "project/README.md",
                "project/src/",
                "project/src/main.py",
            ]
        );
        assert!(parsed.warnings.is_empty());
        assert_eq!(parsed.directories().collect::<Vec<_>>(), vec!["project/", "project/src/"]);
        assert_eq!(
            parsed.files().collect::<Vec<_>>(),
            vec!["project/README.md", "project/src/main.py"]
        );
    }

    #[test]
    fn test_directory_detected_by_deeper_next_line() {
        let text = "app\n├── pkg\n│   └── mod.rs\n└── notes";

        let parsed = parse_tree_text(text);

        assert_eq!(
            parsed.entries,
            vec!["app/", "app/notes", "app/pkg/", "app/pkg/mod.rs"]
        );
    }

    #[test]
    fn test_returns_to_shallower_levels() {
        let text = [
            "root/",
            "├── a/",
            "│   ├── b/",
            "│   │   └── deep.txt",
            "│   └── mid.txt",
            "├── c/",
            "│   └── other.txt",
            "└── top.txt",
        ]
        .join("\n");

        let parsed = parse_tree_text(&text);

        assert_eq!(
            parsed.entries,
            vec![
                "root/",
                "root/a/",
                "root/a/b/",
                "root/a/b/deep.txt",
                "root/a/mid.txt",
                "root/c/",
                "root/c/other.txt",
                "root/top.txt",
            ]
        );
    }

    #[test]
    fn test_level_zero_line_after_root_is_a_sibling() {
        let text = "src/\n    main.py\nREADME.md\ndocs\n    guide.md";

        let parsed = parse_tree_text(text);

        assert_eq!(
            parsed.entries,
            vec!["README.md", "docs/", "docs/guide.md", "src/", "src/main.py"]
        );
        assert!(parsed.warnings.is_empty());
    }

    #[test]
    fn test_icons_are_stripped_and_blank_lines_ignored() {
        let text = "📁 site/\n\n├── 📂 assets/\n│   └── 📄 logo.svg\n└── ⚙️ config.toml   \n";

        let parsed = parse_tree_text(text);

        assert_eq!(
            parsed.entries,
            vec!["site/", "site/assets/", "site/assets/logo.svg", "site/config.toml"]
        );
    }

    #[test]
    fn test_misaligned_indentation_warns_and_is_coerced() {
        let text = "root/\n    even.txt\n     odd.txt";

        let parsed = parse_tree_text(text);

        assert_eq!(parsed.entries, vec!["root/", "root/even.txt", "root/odd.txt"]);
        assert_eq!(parsed.warnings.len(), 1);
        assert!(parsed.warnings[0].contains("Line 3"));
    }

    #[test]
    fn test_duplicates_are_collapsed() {
        let text = "root/\n├── a.txt\n├── a.txt\n└── b/";

        let parsed = parse_tree_text(text);

        assert_eq!(parsed.entries, vec!["root/", "root/a.txt", "root/b/"]);
    }

    #[test]
    fn test_traversal_entries_are_rejected_with_their_children() {
        let text = "root/\n├── ../\n│   └── escape.txt\n├── /etc/passwd\n└── ok.txt";

        let parsed = parse_tree_text(text);

        assert_eq!(parsed.entries, vec!["root/", "root/ok.txt"]);
        assert_eq!(parsed.warnings.len(), 3);
    }

    #[test]
    fn test_empty_input_yields_nothing() {
        let parsed = parse_tree_text("   \n\n");

        assert!(parsed.entries.is_empty());
        assert!(parsed.warnings.is_empty());
    }
}
