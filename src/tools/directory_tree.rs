/*
 * Directory tree tool: renders a folder as tree text (or Markdown/JSON) and
 * builds a folder structure from tree text. Both directions run on a
 * background task and report exactly once.
 */
use crate::app_logic::background::{TaskOutcome, spawn_task, wait_for};
use crate::app_logic::ui_constants::GROUP_FILE_TOOLS;
use crate::core::tree_scan::DEFAULT_IGNORE_PATTERNS;
use crate::core::{
    BuildOptions, CoreTreeScanner, IconRef, Plugin, ScanOptions, ToolContext, ToolError,
    ToolWidget, TreeFormat, TreeScannerOperations, build_structure, parse_tree_text, render,
};
use clap::{Parser, Subcommand};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

pub const PLUGIN_NAME: &str = "Directory Tree";

pub const EXAMPLE_TREE: &str = "\
my_project/
├── src/
│   ├── __init__.py
│   └── main.py
├── tests/
│   └── test_main.py
├── requirements.txt
└── README.md";

#[derive(Parser, Debug)]
#[command(name = "directory-tree", no_binary_name = true)]
#[command(about = "Convert between folders and tree text")]
struct DirectoryTreeArgs {
    #[command(subcommand)]
    command: DirectoryTreeCommand,
}

#[derive(Subcommand, Debug)]
enum DirectoryTreeCommand {
    /// Render a folder as tree text
    Generate {
        folder: PathBuf,
        #[arg(short, long, default_value = "text")]
        format: TreeFormat,
        /// Extra glob pattern to leave out (repeatable)
        #[arg(short, long)]
        ignore: Vec<String>,
        /// Start from an empty ignore list instead of the defaults
        #[arg(long)]
        no_default_ignores: bool,
        #[arg(long)]
        show_hidden: bool,
        #[arg(long)]
        keep_empty: bool,
        /// Also honour the folder's .gitignore
        #[arg(long)]
        gitignore: bool,
    },
    /// Create the folders and files described by a tree text file
    Build {
        tree_file: PathBuf,
        out_dir: PathBuf,
        #[arg(long)]
        no_package_markers: bool,
        #[arg(long)]
        no_readme: bool,
        #[arg(long)]
        notebook: bool,
    },
    /// Print a sample tree
    Example,
    /// Write the last generated tree of this tab to a file
    Save { file: PathBuf },
}

pub struct DirectoryTreePlugin;

impl Plugin for DirectoryTreePlugin {
    fn name(&self) -> &str {
        PLUGIN_NAME
    }

    fn icon(&self) -> IconRef {
        IconRef::Builtin("directory_tree".to_string())
    }

    fn group(&self) -> &str {
        GROUP_FILE_TOOLS
    }

    fn description(&self) -> &str {
        "Two-way conversion between folder structures and tree text"
    }

    fn theme_color(&self) -> &str {
        "#0097A7"
    }

    fn keywords(&self) -> Vec<String> {
        ["DirectoryTreeWidget", "generate_tree", "build_structure", "markdown", "json"]
            .iter()
            .map(|k| k.to_string())
            .collect()
    }

    fn create_widget(&self) -> Box<dyn ToolWidget> {
        Box::new(DirectoryTreeWidget::default())
    }
}

pub struct DirectoryTreeWidget {
    scanner: Arc<dyn TreeScannerOperations>,
    last_output: Option<String>,
}

impl Default for DirectoryTreeWidget {
    fn default() -> Self {
        Self::with_scanner(Arc::new(CoreTreeScanner::new()))
    }
}

impl DirectoryTreeWidget {
    pub fn with_scanner(scanner: Arc<dyn TreeScannerOperations>) -> Self {
        DirectoryTreeWidget {
            scanner,
            last_output: None,
        }
    }

    pub fn last_output(&self) -> Option<&str> {
        self.last_output.as_deref()
    }

    /* Saving does not replace the remembered output. */
    fn save_last_output(&self, file: &Path) -> Result<String, ToolError> {
        let text = self.last_output().ok_or_else(|| {
            ToolError::InvalidInput("nothing generated yet in this tab".to_string())
        })?;
        fs::write(file, text).map_err(|e| {
            ToolError::Failed(format!("cannot write {}: {e}", file.display()))
        })?;
        log::info!("DirectoryTree: Saved tree text to {file:?}.");
        Ok(format!("Saved to {}", file.display()))
    }

    fn generate(
        &self,
        folder: PathBuf,
        format: TreeFormat,
        options: ScanOptions,
    ) -> Result<String, ToolError> {
        let scanner = Arc::clone(&self.scanner);
        let receiver = spawn_task("tree-generate", move || {
            scanner
                .scan_tree(&folder, &options)
                .map(|tree| render(&tree, format))
        });
        match wait_for(&receiver) {
            TaskOutcome::Succeeded(text) => Ok(text),
            TaskOutcome::Failed(message) => Err(ToolError::Failed(message)),
        }
    }

    fn build(tree_file: PathBuf, out_dir: PathBuf, options: BuildOptions) -> Result<String, ToolError> {
        let text = fs::read_to_string(&tree_file).map_err(|e| {
            ToolError::InvalidInput(format!("cannot read {}: {e}", tree_file.display()))
        })?;
        let parsed = parse_tree_text(&text);
        if parsed.entries.is_empty() {
            return Err(ToolError::InvalidInput(
                "the tree text contains no entries".to_string(),
            ));
        }

        let entries = parsed.entries.clone();
        let receiver = spawn_task("tree-build", move || {
            Ok::<_, String>(build_structure(&entries, &out_dir, &options))
        });
        let report = match wait_for(&receiver) {
            TaskOutcome::Succeeded(report) => report,
            TaskOutcome::Failed(message) => return Err(ToolError::Failed(message)),
        };

        let mut lines: Vec<String> = parsed
            .warnings
            .iter()
            .map(|w| format!("warning: {w}"))
            .collect();
        lines.extend(report.log.iter().cloned());
        lines.push(format!(
            "Created {} entries, {} failed.",
            report.created.len(),
            report.failures.len()
        ));
        Ok(lines.join("\n"))
    }
}

impl ToolWidget for DirectoryTreeWidget {
    fn title(&self) -> String {
        PLUGIN_NAME.to_string()
    }

    fn run(&mut self, args: &[String], _ctx: &mut ToolContext<'_>) -> Result<String, ToolError> {
        let parsed =
            DirectoryTreeArgs::try_parse_from(args).map_err(|e| ToolError::Usage(e.to_string()))?;

        let output = match parsed.command {
            DirectoryTreeCommand::Generate {
                folder,
                format,
                ignore,
                no_default_ignores,
                show_hidden,
                keep_empty,
                gitignore,
            } => {
                let mut ignore_patterns: Vec<String> = if no_default_ignores {
                    Vec::new()
                } else {
                    DEFAULT_IGNORE_PATTERNS.iter().map(|p| p.to_string()).collect()
                };
                ignore_patterns.extend(ignore);
                let options = ScanOptions {
                    ignore_patterns,
                    ignore_hidden: !show_hidden,
                    exclude_empty_dirs: !keep_empty,
                    respect_gitignore: gitignore,
                };
                self.generate(folder, format, options)?
            }
            DirectoryTreeCommand::Build {
                tree_file,
                out_dir,
                no_package_markers,
                no_readme,
                notebook,
            } => {
                let options = BuildOptions {
                    create_package_markers: !no_package_markers,
                    create_readme: !no_readme,
                    create_notebook: notebook,
                    ..BuildOptions::default()
                };
                Self::build(tree_file, out_dir, options)?
            }
            DirectoryTreeCommand::Example => EXAMPLE_TREE.to_string(),
            DirectoryTreeCommand::Save { file } => return self.save_last_output(&file),
        };

        self.last_output = Some(output.clone());
        Ok(output)
    }
}
