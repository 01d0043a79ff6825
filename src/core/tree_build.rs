use super::path_utils::is_safe_relative;
use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

/*
 * Creates a folder structure from parsed tree entries (see `tree_parse`).
 * Every entry is handled on its own: a failure is recorded and the remaining
 * entries are still processed, so a build can be partial. Existing files are
 * never overwritten.
 */

pub const PACKAGE_MARKER: &str = "__init__.py";
pub const README_FILE: &str = "README.md";
pub const NOTEBOOK_FILE: &str = "notebook.ipynb";
pub const REQUIREMENTS_FILE: &str = "requirements.txt";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildOptions {
    pub create_package_markers: bool,
    /* A directory whose path contains one of these names gets a package marker. */
    pub package_dir_hints: Vec<String>,
    pub create_readme: bool,
    pub create_notebook: bool,
}

impl Default for BuildOptions {
    fn default() -> Self {
        BuildOptions {
            create_package_markers: true,
            package_dir_hints: vec!["src".to_string(), "lib".to_string()],
            create_readme: true,
            create_notebook: false,
        }
    }
}

impl BuildOptions {
    /* Creates exactly the listed entries and nothing else. */
    pub fn structure_only() -> Self {
        BuildOptions {
            create_package_markers: false,
            package_dir_hints: Vec::new(),
            create_readme: false,
            create_notebook: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildFailure {
    pub entry: String,
    pub message: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BuildReport {
    /* Entries that did not exist before, relative to the output root. */
    pub created: Vec<String>,
    /* Human-readable progress, one line per action. */
    pub log: Vec<String>,
    pub failures: Vec<BuildFailure>,
}

impl BuildReport {
    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }

    fn fail(&mut self, entry: &str, err: &io::Error) {
        log::warn!("TreeBuilder: Failed to create '{entry}': {err}");
        self.log.push(format!("Failed {entry}: {err}"));
        self.failures.push(BuildFailure {
            entry: entry.to_string(),
            message: err.to_string(),
        });
    }
}

fn file_name_of(relative: &str) -> &str {
    relative.rsplit('/').next().unwrap_or(relative)
}

/*
 * Starter body for a new file, chosen by its name and extension.
 */
pub fn template_for(relative: &str, project_name: &str) -> String {
    let file_name = file_name_of(relative);
    if file_name == PACKAGE_MARKER {
        return String::new();
    }
    if file_name == README_FILE {
        return format!("# {project_name}\n\nGenerated by MyToolbox\n");
    }
    if file_name == REQUIREMENTS_FILE {
        return "# Project dependencies, one per line\n".to_string();
    }
    match Path::new(file_name).extension().and_then(|e| e.to_str()) {
        Some("py") => {
            let stem = file_name.trim_end_matches(".py");
            format!("\"\"\"{stem} module.\"\"\"\n")
        }
        Some("ipynb") => {
            let notebook = serde_json::json!({
                "cells": [],
                "metadata": {},
                "nbformat": 4,
                "nbformat_minor": 5
            });
            serde_json::to_string_pretty(&notebook).unwrap_or_default() + "\n"
        }
        _ => String::new(),
    }
}

/*
 * The single top-level directory all entries live under, if there is one.
 */
fn project_root(entries: &[String]) -> Option<&str> {
    let first = entries.first()?;
    let (top, _) = first.split_once('/')?;
    let shared = entries
        .iter()
        .all(|e| e.split_once('/').is_some_and(|(head, _)| head == top));
    shared.then_some(top)
}

fn wants_package_marker(relative_dir: &str, hints: &[String]) -> bool {
    relative_dir
        .trim_end_matches('/')
        .split('/')
        .any(|segment| hints.iter().any(|hint| hint == segment))
}

fn create_dir_entry(out_root: &Path, relative: &str, report: &mut BuildReport) -> bool {
    let target = out_root.join(relative.trim_end_matches('/'));
    let existed = target.is_dir();
    match fs::create_dir_all(&target) {
        Ok(()) => {
            if existed {
                report.log.push(format!("Exists {relative}"));
            } else {
                report.log.push(format!("Created directory {relative}"));
                report.created.push(relative.to_string());
            }
            true
        }
        Err(err) => {
            report.fail(relative, &err);
            false
        }
    }
}

fn create_file_entry(out_root: &Path, relative: &str, body: &str, report: &mut BuildReport) {
    let target: PathBuf = out_root.join(relative);
    if let Some(parent) = target.parent() {
        if let Err(err) = fs::create_dir_all(parent) {
            report.fail(relative, &err);
            return;
        }
    }
    let opened = OpenOptions::new().write(true).create_new(true).open(&target);
    match opened {
        Ok(mut file) => match file.write_all(body.as_bytes()) {
            Ok(()) => {
                report.log.push(format!("Created file {relative}"));
                report.created.push(relative.to_string());
            }
            Err(err) => report.fail(relative, &err),
        },
        Err(err) if err.kind() == io::ErrorKind::AlreadyExists => {
            report.log.push(format!("Exists {relative}, left unchanged"));
        }
        Err(err) => report.fail(relative, &err),
    }
}

pub fn build_structure(entries: &[String], out_root: &Path, options: &BuildOptions) -> BuildReport {
    let mut report = BuildReport::default();
    log::debug!(
        "TreeBuilder: Building {} entries under {out_root:?}.",
        entries.len()
    );

    let project_dir = project_root(entries);
    let project_name = project_dir.map(str::to_string).unwrap_or_else(|| {
        out_root
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default()
    });
    let in_project = |name: &str| match project_dir {
        Some(dir) => format!("{dir}/{name}"),
        None => name.to_string(),
    };

    let mut file_entries: Vec<String> = Vec::new();
    for entry in entries {
        if !is_safe_relative(entry) {
            report.fail(
                entry,
                &io::Error::new(io::ErrorKind::InvalidInput, "path escapes the output root"),
            );
            continue;
        }
        if entry.ends_with('/') {
            let created = create_dir_entry(out_root, entry, &mut report);
            if created
                && options.create_package_markers
                && wants_package_marker(entry, &options.package_dir_hints)
            {
                file_entries.push(format!("{entry}{PACKAGE_MARKER}"));
            }
        } else {
            file_entries.push(entry.clone());
        }
    }

    if options.create_readme {
        file_entries.push(in_project(README_FILE));
    }
    if options.create_notebook {
        file_entries.push(in_project(NOTEBOOK_FILE));
    }
    file_entries.sort();
    file_entries.dedup();

    for relative in &file_entries {
        let body = template_for(relative, &project_name);
        create_file_entry(out_root, relative, &body, &mut report);
    }

    log::info!(
        "TreeBuilder: Created {} entries under {out_root:?} with {} failures.",
        report.created.len(),
        report.failures.len()
    );
    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::tree_parse::parse_tree_text;
    use crate::core::tree_render::render_text;
    use crate::core::tree_scan::{ScanOptions, scan_tree};
    use std::fs::File;
    use tempfile::tempdir;
    use walkdir::WalkDir;

    fn entries(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    fn snapshot(root: &Path) -> Vec<(String, bool)> {
        WalkDir::new(root)
            .min_depth(1)
            .sort_by_file_name()
            .into_iter()
            .filter_map(|e| e.ok())
            .map(|e| {
                let relative = crate::core::path_utils::to_slash_relative(root, e.path());
                (relative, e.file_type().is_dir())
            })
            .collect()
    }

    #[test]
    fn test_build_creates_entries_with_templates() {
        // Arrange
        let out = tempdir().unwrap();
        let list = entries(&[
            "demo/",
            "demo/requirements.txt",
            "demo/src/",
            "demo/src/app.py",
            "demo/data/",
            "demo/data/raw.csv",
        ]);

        // Act
        let report = build_structure(&list, out.path(), &BuildOptions::default());

        // Assert
        assert!(report.is_success(), "unexpected failures: {:?}", report.failures);
        let base = out.path().join("demo");
        assert!(base.join("src").join("__init__.py").is_file());
        assert!(!base.join("data").join("__init__.py").exists());
        assert_eq!(
            fs::read_to_string(base.join("src").join("app.py")).unwrap(),
            "\"\"\"app module.\"\"\"\n"
        );
        assert!(
            fs::read_to_string(base.join("README.md"))
                .unwrap()
                .starts_with("# demo\n")
        );
        assert!(
            fs::read_to_string(base.join("requirements.txt"))
                .unwrap()
                .starts_with('#')
        );
        assert_eq!(fs::read_to_string(base.join("data").join("raw.csv")).unwrap(), "");
        assert!(report.created.contains(&"demo/src/__init__.py".to_string()));
        assert!(!report.log.is_empty());
    }

    #[test]
    fn test_notebook_option_writes_valid_notebook_json() {
        let out = tempdir().unwrap();
        let options = BuildOptions {
            create_notebook: true,
            ..BuildOptions::structure_only()
        };

        let report = build_structure(&entries(&["nb/"]), out.path(), &options);

        assert!(report.is_success());
        let text = fs::read_to_string(out.path().join("nb").join(NOTEBOOK_FILE)).unwrap();
        let value: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert_eq!(value["nbformat"], 4);
        assert!(value["cells"].as_array().unwrap().is_empty());
    }

    #[test]
    fn test_existing_files_are_not_overwritten() {
        // Arrange
        let out = tempdir().unwrap();
        fs::create_dir_all(out.path().join("proj")).unwrap();
        fs::write(out.path().join("proj").join("README.md"), "keep me").unwrap();

        // Act
        let report = build_structure(
            &entries(&["proj/", "proj/README.md"]),
            out.path(),
            &BuildOptions::default(),
        );

        // Assert
        assert!(report.is_success());
        assert_eq!(
            fs::read_to_string(out.path().join("proj").join("README.md")).unwrap(),
            "keep me"
        );
        assert!(report.created.is_empty());
    }

    #[test]
    fn test_failures_are_per_entry() {
        // Arrange: a file sits where a directory is wanted.
        let out = tempdir().unwrap();
        fs::create_dir_all(out.path().join("p")).unwrap();
        fs::write(out.path().join("p").join("blocked"), "").unwrap();
        let list = entries(&["p/", "p/blocked/", "p/blocked/inner.txt", "p/fine.txt", "../evil.txt"]);

        // Act
        let report = build_structure(&list, out.path(), &BuildOptions::structure_only());

        // Assert
        assert!(out.path().join("p").join("fine.txt").is_file());
        let failed: Vec<&str> = report.failures.iter().map(|f| f.entry.as_str()).collect();
        assert!(failed.contains(&"p/blocked/"));
        assert!(failed.contains(&"p/blocked/inner.txt"));
        assert!(failed.contains(&"../evil.txt"));
        assert!(!out.path().parent().unwrap().join("evil.txt").exists());
    }

    #[test]
    fn test_folder_text_folder_round_trip() -> std::io::Result<()> {
        // Arrange
        let source = tempdir()?;
        let project = source.path().join("project");
        fs::create_dir_all(project.join("src").join("util"))?;
        fs::create_dir_all(project.join("docs"))?;
        fs::create_dir_all(project.join("empty"))?;
        File::create(project.join("src").join("main.py"))?;
        File::create(project.join("src").join("util").join("Helpers.rs"))?;
        File::create(project.join("docs").join("guide.md"))?;
        File::create(project.join("README.md"))?;
        File::create(project.join(".env"))?;
        let out = tempdir()?;

        // Act
        let tree = scan_tree(&project, &ScanOptions::unfiltered()).expect("scan should succeed");
        let text = render_text(&tree);
        let parsed = parse_tree_text(&text);
        let report = build_structure(&parsed.entries, out.path(), &BuildOptions::structure_only());

        // Assert
        assert!(parsed.warnings.is_empty(), "warnings: {:?}", parsed.warnings);
        assert!(report.is_success(), "failures: {:?}", report.failures);
        assert_eq!(snapshot(&out.path().join("project")), snapshot(&project));
        Ok(())
    }
}
