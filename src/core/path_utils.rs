/*
 * This module provides utility functions for path manipulation, focusing on
 * locating the toolbox's application-data directory (settings file, log file,
 * plugins root) and on converting paths to the forward-slash relative form used
 * by the tree-text and JSON tree formats.
 */
use directories::ProjectDirs;
use std::fs;
use std::io;
use std::path::{Component, Path, PathBuf};

pub const SETTINGS_FILENAME: &str = "settings.json";
pub const PLUGINS_DIR_NAME: &str = "plugins";
pub const LOG_FILENAME: &str = "toolbox.log";

/*
 * Retrieves the application's configuration directory, creating it if needed.
 * The path is derived without an organization qualifier, so it lands directly
 * under the user's configuration root (e.g. `~/.config/<app_name>` on Linux).
 *
 * Returns `None` if `ProjectDirs` cannot identify a home directory or the
 * directory cannot be created.
 */
pub fn get_app_config_dir(app_name: &str) -> Option<PathBuf> {
    log::trace!("PathUtils: Resolving app config dir for '{app_name}'");
    let proj_dirs = ProjectDirs::from("", "", app_name)?;
    let config_path = proj_dirs.config_dir();
    match ensure_dir(config_path) {
        Ok(path) => Some(path),
        Err(e) => {
            log::error!("PathUtils: Failed to create app config directory {config_path:?}: {e}");
            None
        }
    }
}

/*
 * Location of the JSON settings document for `app_name`.
 */
pub fn default_settings_path(app_name: &str) -> Option<PathBuf> {
    get_app_config_dir(app_name).map(|dir| dir.join(SETTINGS_FILENAME))
}

/*
 * Location of the plugins root for `app_name`. The directory itself is not
 * created here; plugin discovery bootstraps it on first run.
 */
pub fn default_plugins_dir(app_name: &str) -> Option<PathBuf> {
    get_app_config_dir(app_name).map(|dir| dir.join(PLUGINS_DIR_NAME))
}

pub fn ensure_dir(path: &Path) -> io::Result<PathBuf> {
    if !path.is_dir() {
        fs::create_dir_all(path)?;
        log::debug!("PathUtils: Created directory {path:?}");
    }
    Ok(path.to_path_buf())
}

/*
 * Renders `path` relative to `root` with `/` separators, regardless of platform.
 * Falls back to the full path if `path` is not under `root`. The root itself
 * maps to an empty string.
 */
pub fn to_slash_relative(root: &Path, path: &Path) -> String {
    let relative = path.strip_prefix(root).unwrap_or(path);
    relative
        .components()
        .filter_map(|component| match component {
            Component::Normal(part) => Some(part.to_string_lossy().into_owned()),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join("/")
}

/*
 * True if a '/'-separated relative path stays inside its root: no empty
 * segments from absolute prefixes, no `..`, no drive or root components.
 */
pub fn is_safe_relative(relative: &str) -> bool {
    let trimmed = relative.trim_end_matches('/');
    if trimmed.is_empty() || trimmed.starts_with('/') || trimmed.starts_with('\\') {
        return false;
    }
    if trimmed.split('/').any(str::is_empty) {
        return false;
    }
    Path::new(trimmed)
        .components()
        .all(|component| matches!(component, Component::Normal(_)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_get_app_config_dir_contains_app_name() {
        // Arrange
        let unique_app_name = format!("TestToolbox_PathUtils_{}", rand::random::<u64>());

        // Act
        let path_opt = get_app_config_dir(&unique_app_name);

        // Assert
        // ProjectDirs can legitimately fail in a sandbox without a home directory.
        if let Some(path) = path_opt {
            assert!(path.is_dir(), "Directory should have been created at {path:?}");
            assert!(
                path.to_string_lossy()
                    .to_lowercase()
                    .contains(&unique_app_name.to_lowercase())
            );
            assert_eq!(
                default_settings_path(&unique_app_name),
                Some(path.join(SETTINGS_FILENAME))
            );
            if let Err(e) = fs::remove_dir_all(&path) {
                eprintln!("Test cleanup failed for {path:?}: {e}");
            }
        }
    }

    #[test]
    fn test_ensure_dir_creates_nested_directories() {
        let dir = tempdir().unwrap();
        let nested = dir.path().join("a").join("b");

        let result = ensure_dir(&nested).unwrap();

        assert_eq!(result, nested);
        assert!(nested.is_dir());
        // Second call is a no-op.
        assert!(ensure_dir(&nested).is_ok());
    }

    #[test]
    fn test_to_slash_relative() {
        let root = Path::new("/tmp/project");
        assert_eq!(
            to_slash_relative(root, &root.join("src").join("main.py")),
            "src/main.py"
        );
        assert_eq!(to_slash_relative(root, root), "");
    }

    #[test]
    fn test_is_safe_relative_rejects_escapes() {
        assert!(is_safe_relative("project/src/"));
        assert!(is_safe_relative("README.md"));
        assert!(!is_safe_relative("../etc/passwd"));
        assert!(!is_safe_relative("project/../../x"));
        assert!(!is_safe_relative("/abs/path"));
        assert!(!is_safe_relative(""));
        assert!(!is_safe_relative("./"));
        assert!(!is_safe_relative("a//b"));
    }
}
