/*
 * Discovers manifest-described plugins under a plugins root. Each first-level
 * subdirectory is a plugin package; every `*.json` file directly inside it
 * (other than the package marker) is a manifest that may describe several
 * plugins. A manifest names a registered tool key for its widget factory, so
 * discovery binds metadata to compiled tools without loading code.
 *
 * Failures are isolated per manifest file: an unreadable file, invalid JSON or
 * a contract violation in any one of its plugins discards that file's plugins,
 * is logged with the file path, and discovery carries on with the next file.
 * Only an unusable plugins root aborts discovery.
 */
use super::color_math;
use super::path_utils;
use super::plugin::{
    DEFAULT_DESCRIPTION, DEFAULT_THEME_COLOR, IconRef, Plugin, PluginDescriptor, PluginSource,
    ToolWidget,
};
use super::plugin_registry::{PluginRegistry, WidgetFactory};
use super::search_tags::derive_search_tags;
use serde::Deserialize;
use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use walkdir::WalkDir;

pub const MANIFEST_EXTENSION: &str = "json";
pub const PACKAGE_MARKER_FILE: &str = "package.json";

#[derive(Debug)]
pub enum DiscoveryError {
    RootUnavailable { path: PathBuf, source: io::Error },
    Io(io::Error),
    Json(serde_json::Error),
    Contract(String),
}

impl From<io::Error> for DiscoveryError {
    fn from(err: io::Error) -> Self {
        DiscoveryError::Io(err)
    }
}

impl From<serde_json::Error> for DiscoveryError {
    fn from(err: serde_json::Error) -> Self {
        DiscoveryError::Json(err)
    }
}

impl fmt::Display for DiscoveryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DiscoveryError::RootUnavailable { path, source } => {
                write!(f, "Plugins directory {path:?} is unavailable: {source}")
            }
            DiscoveryError::Io(e) => write!(f, "I/O error: {e}"),
            DiscoveryError::Json(e) => write!(f, "Invalid manifest JSON: {e}"),
            DiscoveryError::Contract(msg) => write!(f, "Plugin contract violation: {msg}"),
        }
    }
}

impl std::error::Error for DiscoveryError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            DiscoveryError::RootUnavailable { source, .. } => Some(source),
            DiscoveryError::Io(e) => Some(e),
            DiscoveryError::Json(e) => Some(e),
            DiscoveryError::Contract(_) => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, DiscoveryError>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscoveryFailure {
    pub path: PathBuf,
    pub message: String,
}

#[derive(Debug, Default)]
pub struct DiscoveryReport {
    pub plugins: Vec<PluginDescriptor>,
    pub failures: Vec<DiscoveryFailure>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct ManifestFile {
    #[serde(default)]
    plugins: Vec<ManifestEntry>,
    #[serde(default)]
    components: Vec<String>,
    #[serde(default)]
    operations: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
struct ManifestEntry {
    #[serde(default)]
    name: String,
    #[serde(default)]
    icon: String,
    #[serde(default)]
    group: String,
    #[serde(default)]
    tool: String,
    description: Option<String>,
    theme_color: Option<String>,
    #[serde(default)]
    keywords: Vec<String>,
}

/*
 * A plugin whose metadata comes from a manifest and whose widgets come from a
 * registered tool factory.
 */
struct ManifestPlugin {
    name: String,
    icon: IconRef,
    group: String,
    description: String,
    theme_color: String,
    keywords: Vec<String>,
    factory: WidgetFactory,
}

impl Plugin for ManifestPlugin {
    fn name(&self) -> &str {
        &self.name
    }

    fn icon(&self) -> IconRef {
        self.icon.clone()
    }

    fn group(&self) -> &str {
        &self.group
    }

    fn description(&self) -> &str {
        &self.description
    }

    fn theme_color(&self) -> &str {
        &self.theme_color
    }

    fn keywords(&self) -> Vec<String> {
        self.keywords.clone()
    }

    fn create_widget(&self) -> Box<dyn ToolWidget> {
        (self.factory)()
    }
}

pub trait PluginDiscoveryOperations: Send + Sync {
    fn discover(&self, plugins_root: &Path, registry: &PluginRegistry) -> Result<DiscoveryReport>;
}

pub struct CorePluginDiscovery {}

impl CorePluginDiscovery {
    pub fn new() -> Self {
        CorePluginDiscovery {}
    }

    fn is_manifest_candidate(path: &Path) -> bool {
        let Some(file_name) = path.file_name().and_then(|n| n.to_str()) else {
            return false;
        };
        file_name != PACKAGE_MARKER_FILE
            && path
                .extension()
                .and_then(|ext| ext.to_str())
                .is_some_and(|ext| ext.eq_ignore_ascii_case(MANIFEST_EXTENSION))
    }

    /*
     * Loads every plugin described by one manifest file. All-or-nothing: the
     * first violation discards the whole file.
     */
    fn load_manifest(path: &Path, registry: &PluginRegistry) -> Result<Vec<PluginDescriptor>> {
        let contents = fs::read_to_string(path)?;
        let manifest: ManifestFile = serde_json::from_str(&contents)?;

        let mut descriptors = Vec::with_capacity(manifest.plugins.len());
        for (index, entry) in manifest.plugins.iter().enumerate() {
            let plugin = Self::build_plugin(entry, index, registry)?;
            let tags = derive_search_tags(
                &plugin.description,
                &manifest.components,
                &manifest.operations,
                &plugin.keywords,
            );
            descriptors.push(PluginDescriptor::new(
                Arc::new(plugin),
                tags,
                PluginSource::Manifest(path.to_path_buf()),
            ));
        }
        Ok(descriptors)
    }

    fn build_plugin(
        entry: &ManifestEntry,
        index: usize,
        registry: &PluginRegistry,
    ) -> Result<ManifestPlugin> {
        let name = entry.name.trim();
        if name.is_empty() {
            return Err(DiscoveryError::Contract(format!(
                "plugin #{index} has no 'name'"
            )));
        }
        let group = entry.group.trim();
        if group.is_empty() {
            return Err(DiscoveryError::Contract(format!(
                "plugin '{name}' has no 'group'"
            )));
        }
        let icon = IconRef::parse(&entry.icon).ok_or_else(|| {
            DiscoveryError::Contract(format!("plugin '{name}' has no 'icon'"))
        })?;
        let factory = registry.factory(entry.tool.trim()).ok_or_else(|| {
            DiscoveryError::Contract(format!(
                "plugin '{name}' refers to unknown tool '{}'",
                entry.tool
            ))
        })?;
        let theme_color = match entry.theme_color.as_deref().map(str::trim) {
            None | Some("") => DEFAULT_THEME_COLOR.to_string(),
            Some(hex) => color_math::parse_hex(hex)
                .map(|rgb| rgb.to_hex())
                .map_err(|e| {
                    DiscoveryError::Contract(format!("plugin '{name}' theme_color: {e}"))
                })?,
        };
        let description = entry
            .description
            .as_deref()
            .map(str::trim)
            .filter(|d| !d.is_empty())
            .unwrap_or(DEFAULT_DESCRIPTION)
            .to_string();

        Ok(ManifestPlugin {
            name: name.to_string(),
            icon,
            group: group.to_string(),
            description,
            theme_color,
            keywords: entry.keywords.clone(),
            factory,
        })
    }
}

impl Default for CorePluginDiscovery {
    fn default() -> Self {
        Self::new()
    }
}

impl PluginDiscoveryOperations for CorePluginDiscovery {
    /*
     * Scans `plugins_root` (creating it on first run) and returns every plugin
     * from every well-formed manifest, in package-then-file name order,
     * together with the per-file failures.
     */
    fn discover(&self, plugins_root: &Path, registry: &PluginRegistry) -> Result<DiscoveryReport> {
        path_utils::ensure_dir(plugins_root).map_err(|source| DiscoveryError::RootUnavailable {
            path: plugins_root.to_path_buf(),
            source,
        })?;
        log::debug!("PluginDiscovery: Scanning {plugins_root:?}");

        let mut report = DiscoveryReport::default();
        let walker = WalkDir::new(plugins_root)
            .min_depth(2)
            .max_depth(2)
            .follow_links(false)
            .sort_by_file_name();

        for entry_result in walker {
            let entry = match entry_result {
                Ok(entry) => entry,
                Err(e) => {
                    let path = e.path().map(Path::to_path_buf).unwrap_or_default();
                    log::warn!("PluginDiscovery: Cannot read {path:?}: {e}");
                    report.failures.push(DiscoveryFailure {
                        path,
                        message: e.to_string(),
                    });
                    continue;
                }
            };
            if !entry.file_type().is_file() || !Self::is_manifest_candidate(entry.path()) {
                continue;
            }

            let path = entry.path();
            match Self::load_manifest(path, registry) {
                Ok(descriptors) => {
                    log::debug!(
                        "PluginDiscovery: Loaded {} plugin(s) from {path:?}",
                        descriptors.len()
                    );
                    report.plugins.extend(descriptors);
                }
                Err(e) => {
                    log::error!("PluginDiscovery: Failed to load plugin manifest {path:?}: {e}");
                    report.failures.push(DiscoveryFailure {
                        path: path.to_path_buf(),
                        message: e.to_string(),
                    });
                }
            }
        }

        log::info!(
            "PluginDiscovery: Found {} plugin(s), {} failure(s) under {plugins_root:?}",
            report.plugins.len(),
            report.failures.len()
        );
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::plugin::test_support::EchoWidget;
    use tempfile::tempdir;

    fn registry_with_echo() -> PluginRegistry {
        let mut registry = PluginRegistry::new();
        registry.register_factory(
            "echo",
            Arc::new(|| {
                Box::new(EchoWidget {
                    title: "Echo".to_string(),
                }) as Box<dyn ToolWidget>
            }),
        );
        registry
    }

    fn write_manifest(root: &Path, package: &str, file: &str, body: &str) -> PathBuf {
        let dir = root.join(package);
        fs::create_dir_all(&dir).unwrap();
        let path = dir.join(file);
        fs::write(&path, body).unwrap();
        path
    }

    const GOOD_MANIFEST: &str = r##"{
        "plugins": [{
            "name": "Json Converter",
            "icon": "document",
            "group": "Converters",
            "tool": "echo",
            "description": "Convert JSON files",
            "theme_color": "#1890ff"
        }],
        "components": ["JsonPage", "ExcelPage"],
        "operations": ["convert_file", "_internal"]
    }"##;

    #[test]
    fn test_discover_creates_missing_root() {
        // Arrange
        let dir = tempdir().unwrap();
        let root = dir.path().join("plugins");
        let discovery = CorePluginDiscovery::new();

        // Act
        let report = discovery.discover(&root, &registry_with_echo()).unwrap();

        // Assert
        assert!(root.is_dir());
        assert!(report.plugins.is_empty());
        assert!(report.failures.is_empty());
    }

    #[test]
    fn test_discover_isolates_broken_manifest() {
        // Arrange
        let dir = tempdir().unwrap();
        let root = dir.path();
        write_manifest(root, "converter", "tool.json", GOOD_MANIFEST);
        let broken = write_manifest(root, "broken", "tool.json", "{ \"plugins\": [ oops");
        let discovery = CorePluginDiscovery::new();

        // Act
        let report = discovery.discover(root, &registry_with_echo()).unwrap();

        // Assert
        assert_eq!(report.plugins.len(), 1);
        let plugin = &report.plugins[0];
        assert_eq!(plugin.name(), "Json Converter");
        assert_eq!(plugin.theme_color(), "#1890FF");
        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.failures[0].path, broken);
    }

    #[test]
    fn test_contract_violation_discards_whole_file() {
        // Arrange: the second plugin names an unknown tool, so the first is dropped too.
        let dir = tempdir().unwrap();
        let root = dir.path();
        write_manifest(
            root,
            "mixed",
            "tools.json",
            r#"{"plugins": [
                {"name": "Fine", "icon": "a", "group": "G", "tool": "echo"},
                {"name": "Bad", "icon": "a", "group": "G", "tool": "does_not_exist"}
            ]}"#,
        );
        let discovery = CorePluginDiscovery::new();

        // Act
        let report = discovery.discover(root, &registry_with_echo()).unwrap();

        // Assert
        assert!(report.plugins.is_empty());
        assert_eq!(report.failures.len(), 1);
        assert!(report.failures[0].message.contains("does_not_exist"));
    }

    #[test]
    fn test_missing_required_fields_are_rejected() {
        let dir = tempdir().unwrap();
        let root = dir.path();
        write_manifest(root, "a", "no_group.json", r#"{"plugins": [{"name": "X", "icon": "i", "tool": "echo"}]}"#);
        write_manifest(root, "b", "no_icon.json", r#"{"plugins": [{"name": "Y", "group": "G", "tool": "echo"}]}"#);
        write_manifest(root, "c", "bad_color.json", r#"{"plugins": [{"name": "Z", "icon": "i", "group": "G", "tool": "echo", "theme_color": "teal"}]}"#);

        let report = CorePluginDiscovery::new()
            .discover(root, &registry_with_echo())
            .unwrap();

        assert!(report.plugins.is_empty());
        assert_eq!(report.failures.len(), 3);
    }

    #[test]
    fn test_marker_files_and_top_level_files_are_skipped() {
        let dir = tempdir().unwrap();
        let root = dir.path();
        write_manifest(root, "pkg", PACKAGE_MARKER_FILE, "not json at all");
        write_manifest(root, "pkg", "notes.txt", "ignored");
        fs::write(root.join("stray.json"), GOOD_MANIFEST).unwrap();

        let report = CorePluginDiscovery::new()
            .discover(root, &registry_with_echo())
            .unwrap();

        assert!(report.plugins.is_empty());
        assert!(report.failures.is_empty());
    }

    #[test]
    fn test_search_tags_are_derived_once_from_manifest() {
        let dir = tempdir().unwrap();
        write_manifest(dir.path(), "converter", "tool.json", GOOD_MANIFEST);

        let report = CorePluginDiscovery::new()
            .discover(dir.path(), &registry_with_echo())
            .unwrap();

        let tags = report.plugins[0].search_tags();
        for expected in ["convert", "json", "files", "page", "excel", "file"] {
            assert!(tags.contains(&expected.to_string()), "missing tag {expected} in {tags:?}");
        }
        assert!(!tags.iter().any(|t| t == "internal"));
        assert!(report.plugins[0].matches_query("excel"));
    }

    #[test]
    fn test_discovered_plugin_widget_comes_from_registry() {
        let dir = tempdir().unwrap();
        write_manifest(dir.path(), "converter", "tool.json", GOOD_MANIFEST);

        let report = CorePluginDiscovery::new()
            .discover(dir.path(), &registry_with_echo())
            .unwrap();

        let first = report.plugins[0].create_widget();
        let second = report.plugins[0].create_widget();
        assert_eq!(first.title(), "Echo");
        assert_eq!(second.title(), "Echo");
        assert_eq!(report.plugins[0].description(), "Convert JSON files");
    }

    #[test]
    fn test_root_that_is_a_file_is_fatal() {
        let dir = tempdir().unwrap();
        let root = dir.path().join("plugins");
        fs::write(&root, "not a directory").unwrap();

        let result = CorePluginDiscovery::new().discover(&root, &registry_with_echo());

        assert!(matches!(result, Err(DiscoveryError::RootUnavailable { .. })));
    }
}
