use super::path_utils::to_slash_relative;
use super::tree_node::{TreeNode, presentation_order};
use ignore::gitignore::{Gitignore, GitignoreBuilder};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/*
 * Walks a folder once and produces the `TreeNode` structure that every tree
 * renderer works from. Filtering (glob ignore patterns, hidden entries, an
 * optional root `.gitignore`) and empty-directory suppression happen during the
 * walk, so a directory only appears when at least one descendant survives.
 * Unreadable directories become a single access-denied leaf and the walk goes
 * on. Symbolic links are never followed; they are listed as files.
 */

pub const DEFAULT_IGNORE_PATTERNS: &[&str] = &[
    "__pycache__",
    "*.pyc",
    ".git",
    ".DS_Store",
    "*.log",
    ".venv",
    "venv",
    ".idea",
    ".vscode",
    "dist",
    "node_modules",
];

#[derive(Debug)]
pub enum TreeScanError {
    InvalidPath(PathBuf),
    Io(io::Error),
}

impl From<io::Error> for TreeScanError {
    fn from(err: io::Error) -> Self {
        TreeScanError::Io(err)
    }
}

impl std::fmt::Display for TreeScanError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TreeScanError::InvalidPath(p) => write!(f, "Not a directory: {p:?}"),
            TreeScanError::Io(e) => write!(f, "I/O error: {e}"),
        }
    }
}

impl std::error::Error for TreeScanError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            TreeScanError::Io(e) => Some(e),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, TreeScanError>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanOptions {
    pub ignore_patterns: Vec<String>,
    pub ignore_hidden: bool,
    pub exclude_empty_dirs: bool,
    pub respect_gitignore: bool,
}

impl Default for ScanOptions {
    fn default() -> Self {
        ScanOptions {
            ignore_patterns: DEFAULT_IGNORE_PATTERNS
                .iter()
                .map(|p| p.to_string())
                .collect(),
            ignore_hidden: true,
            exclude_empty_dirs: true,
            respect_gitignore: false,
        }
    }
}

impl ScanOptions {
    /* No filtering at all: every entry is listed, empty directories included. */
    pub fn unfiltered() -> Self {
        ScanOptions {
            ignore_patterns: Vec::new(),
            ignore_hidden: false,
            exclude_empty_dirs: false,
            respect_gitignore: false,
        }
    }
}

/*
 * Compiled form of the ignore settings for one walk. A pattern without `/`
 * is matched against the entry name only. A pattern with `/` is matched
 * against the relative path, and its wildcards never cross a separator.
 */
pub struct IgnoreMatcher {
    name_patterns: Vec<glob::Pattern>,
    path_patterns: Vec<glob::Pattern>,
    ignore_hidden: bool,
    gitignore: Option<Gitignore>,
}

const PATH_MATCH_OPTIONS: glob::MatchOptions = glob::MatchOptions {
    case_sensitive: true,
    require_literal_separator: true,
    require_literal_leading_dot: false,
};

impl IgnoreMatcher {
    pub fn new(root: &Path, options: &ScanOptions) -> Self {
        let mut name_patterns = Vec::new();
        let mut path_patterns = Vec::new();
        for raw in &options.ignore_patterns {
            let trimmed = raw.trim().trim_matches('/');
            if trimmed.is_empty() {
                continue;
            }
            match glob::Pattern::new(trimmed) {
                Ok(pattern) if trimmed.contains('/') => path_patterns.push(pattern),
                Ok(pattern) => name_patterns.push(pattern),
                Err(err) => log::warn!("TreeScanner: Invalid ignore pattern '{trimmed}': {err}"),
            }
        }

        let gitignore = if options.respect_gitignore {
            Self::load_gitignore(root)
        } else {
            None
        };

        IgnoreMatcher {
            name_patterns,
            path_patterns,
            ignore_hidden: options.ignore_hidden,
            gitignore,
        }
    }

    fn load_gitignore(root: &Path) -> Option<Gitignore> {
        let gitignore_path = root.join(".gitignore");
        if !gitignore_path.is_file() {
            log::debug!("TreeScanner: No .gitignore at {gitignore_path:?}.");
            return None;
        }
        let mut builder = GitignoreBuilder::new(root);
        if let Some(err) = builder.add(&gitignore_path) {
            log::warn!("TreeScanner: Problem reading {gitignore_path:?}: {err}");
        }
        match builder.build() {
            Ok(gitignore) => Some(gitignore),
            Err(err) => {
                log::warn!("TreeScanner: Could not compile {gitignore_path:?}: {err}");
                None
            }
        }
    }

    /*
     * `relative_path` uses forward slashes and is relative to the walk root.
     */
    pub fn is_ignored(&self, name: &str, relative_path: &str, full_path: &Path, is_dir: bool) -> bool {
        if self.ignore_hidden && name.starts_with('.') {
            return true;
        }
        if self.name_patterns.iter().any(|p| p.matches(name)) {
            return true;
        }
        if self
            .path_patterns
            .iter()
            .any(|p| p.matches_with(relative_path, PATH_MATCH_OPTIONS))
        {
            return true;
        }
        match &self.gitignore {
            Some(gitignore) => gitignore.matched(full_path, is_dir).is_ignore(),
            None => false,
        }
    }
}

pub trait TreeScannerOperations: Send + Sync {
    fn scan_tree(&self, root: &Path, options: &ScanOptions) -> Result<TreeNode>;
}

#[derive(Default)]
pub struct CoreTreeScanner {}

impl CoreTreeScanner {
    pub fn new() -> Self {
        CoreTreeScanner {}
    }
}

impl TreeScannerOperations for CoreTreeScanner {
    fn scan_tree(&self, root: &Path, options: &ScanOptions) -> Result<TreeNode> {
        scan_tree(root, options)
    }
}

/*
 * Walks `root` and returns it as a directory node. The root itself is always
 * present, even when every child was filtered away.
 */
pub fn scan_tree(root: &Path, options: &ScanOptions) -> Result<TreeNode> {
    if !root.is_dir() {
        return Err(TreeScanError::InvalidPath(root.to_path_buf()));
    }
    log::debug!("TreeScanner: Scanning {root:?} with {options:?}.");

    let matcher = IgnoreMatcher::new(root, options);
    let children = scan_children(root, root, &matcher, options.exclude_empty_dirs);
    let name = root
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| root.to_string_lossy().into_owned());

    Ok(TreeNode::directory(&name, "", children))
}

fn scan_children(
    root: &Path,
    dir: &Path,
    matcher: &IgnoreMatcher,
    exclude_empty_dirs: bool,
) -> Vec<TreeNode> {
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(err) => {
            log::warn!("TreeScanner: Cannot read {dir:?}: {err}");
            return vec![TreeNode::access_denied(&to_slash_relative(root, dir))];
        }
    };

    let mut children = Vec::new();
    for entry_result in entries {
        let entry = match entry_result {
            Ok(entry) => entry,
            Err(err) => {
                log::warn!("TreeScanner: Skipping unreadable entry in {dir:?}: {err}");
                continue;
            }
        };
        let name = entry.file_name().to_string_lossy().into_owned();
        let full_path = entry.path();
        let relative_path = to_slash_relative(root, &full_path);
        // file_type() does not follow symlinks, so linked directories count as files.
        let is_dir = entry.file_type().map(|t| t.is_dir()).unwrap_or(false);

        if matcher.is_ignored(&name, &relative_path, &full_path, is_dir) {
            log::trace!("TreeScanner: Ignoring {relative_path}.");
            continue;
        }

        if is_dir {
            let grandchildren = scan_children(root, &full_path, matcher, exclude_empty_dirs);
            if exclude_empty_dirs && grandchildren.is_empty() {
                continue;
            }
            children.push(TreeNode::directory(&name, &relative_path, grandchildren));
        } else {
            children.push(TreeNode::file(&name, &relative_path));
        }
    }

    children.sort_by(presentation_order);
    children
}
