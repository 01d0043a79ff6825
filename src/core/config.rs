/*
 * Manages the toolbox's single JSON settings document: theme, window size,
 * per-plugin colour overrides, plugin order, disabled plugins, and free-form
 * per-tool sections (API settings, favourites, bookmarks).
 *
 * Loading never fails: a missing, unreadable or corrupt file degrades to the
 * default document, and whatever is on disk is merged over the defaults one
 * top-level key at a time (a shallow merge, nested blocks are not recursed).
 *
 * It uses a trait-based approach (`ConfigManagerOperations`) so the host and
 * tools can be tested against mock implementations. `CoreConfigManager` reads
 * the file on every `load()`, rewrites it wholesale on every `save()`, and
 * serialises `update()` (load-modify-save) through an internal mutex so that
 * components sharing one manager cannot lose each other's writes. A bare
 * `save()` of a stale snapshot remains last-writer-wins.
 */
use crate::core::path_utils;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::Mutex;

pub const KEY_THEME: &str = "theme";
pub const KEY_WINDOW_SIZE: &str = "window_size";
pub const KEY_CUSTOM_COLORS: &str = "custom_colors";
pub const KEY_PLUGIN_ORDER: &str = "plugin_order";
pub const KEY_DISABLED_PLUGINS: &str = "disabled_plugins";

pub const DEFAULT_WINDOW_SIZE: (u32, u32) = (1000, 700);

#[derive(Debug)]
pub enum ConfigError {
    Io(io::Error),
    Serde(serde_json::Error),
    NoProjectDirectory,
    LockPoisoned,
}

impl From<io::Error> for ConfigError {
    fn from(err: io::Error) -> Self {
        ConfigError::Io(err)
    }
}

impl From<serde_json::Error> for ConfigError {
    fn from(err: serde_json::Error) -> Self {
        ConfigError::Serde(err)
    }
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Io(e) => write!(f, "Configuration I/O error: {e}"),
            ConfigError::Serde(e) => write!(f, "Configuration serialization error: {e}"),
            ConfigError::NoProjectDirectory => {
                write!(f, "Could not determine application directory for configuration")
            }
            ConfigError::LockPoisoned => write!(f, "Configuration lock was poisoned"),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::Io(e) => Some(e),
            ConfigError::Serde(e) => Some(e),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, ConfigError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Theme {
    #[default]
    Light,
    Dark,
    Auto,
}

impl Theme {
    pub fn as_str(&self) -> &'static str {
        match self {
            Theme::Light => "Light",
            Theme::Dark => "Dark",
            Theme::Auto => "Auto",
        }
    }
}

impl fmt::Display for Theme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Theme {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "light" => Ok(Theme::Light),
            "dark" => Ok(Theme::Dark),
            "auto" => Ok(Theme::Auto),
            other => Err(format!("unknown theme '{other}' (expected Light, Dark or Auto)")),
        }
    }
}

/*
 * The settings document. Internally a JSON object so that unknown keys and
 * per-tool sections survive a load/save cycle untouched. Typed accessors fall
 * back to the default value when a key has an unexpected shape.
 */
#[derive(Debug, Clone, PartialEq)]
pub struct ConfigDocument {
    values: Map<String, Value>,
}

impl ConfigDocument {
    pub fn defaults() -> Self {
        let mut values = Map::new();
        values.insert(KEY_THEME.to_string(), json!(Theme::Light.as_str()));
        values.insert(
            KEY_WINDOW_SIZE.to_string(),
            json!([DEFAULT_WINDOW_SIZE.0, DEFAULT_WINDOW_SIZE.1]),
        );
        values.insert(KEY_CUSTOM_COLORS.to_string(), json!({}));
        values.insert(KEY_PLUGIN_ORDER.to_string(), json!([]));
        values.insert(KEY_DISABLED_PLUGINS.to_string(), json!([]));
        ConfigDocument { values }
    }

    /*
     * Overwrites the defaults with every top-level key of `saved`. Nested
     * blocks are replaced as a whole, never merged. A saved document that is
     * not a JSON object is ignored.
     */
    pub fn merge_with_defaults(saved: Value) -> Self {
        let mut document = Self::defaults();
        match saved {
            Value::Object(saved_values) => {
                for (key, value) in saved_values {
                    document.values.insert(key, value);
                }
            }
            other => {
                log::warn!(
                    "ConfigDocument: Saved settings are not a JSON object ({}); using defaults.",
                    json_type_name(&other)
                );
            }
        }
        document
    }

    pub fn as_value(&self) -> Value {
        Value::Object(self.values.clone())
    }

    pub fn theme(&self) -> Theme {
        self.values
            .get(KEY_THEME)
            .and_then(Value::as_str)
            .and_then(|s| s.parse().ok())
            .unwrap_or_default()
    }

    pub fn set_theme(&mut self, theme: Theme) {
        self.values
            .insert(KEY_THEME.to_string(), json!(theme.as_str()));
    }

    pub fn window_size(&self) -> (u32, u32) {
        let Some(Value::Array(items)) = self.values.get(KEY_WINDOW_SIZE) else {
            return DEFAULT_WINDOW_SIZE;
        };
        match items.as_slice() {
            [w, h] => match (w.as_u64(), h.as_u64()) {
                (Some(w), Some(h)) => (
                    u32::try_from(w).unwrap_or(DEFAULT_WINDOW_SIZE.0),
                    u32::try_from(h).unwrap_or(DEFAULT_WINDOW_SIZE.1),
                ),
                _ => DEFAULT_WINDOW_SIZE,
            },
            _ => DEFAULT_WINDOW_SIZE,
        }
    }

    pub fn set_window_size(&mut self, width: u32, height: u32) {
        self.values
            .insert(KEY_WINDOW_SIZE.to_string(), json!([width, height]));
    }

    pub fn custom_colors(&self) -> BTreeMap<String, String> {
        let Some(Value::Object(colors)) = self.values.get(KEY_CUSTOM_COLORS) else {
            return BTreeMap::new();
        };
        colors
            .iter()
            .filter_map(|(name, hex)| hex.as_str().map(|h| (name.clone(), h.to_string())))
            .collect()
    }

    pub fn set_custom_color(&mut self, plugin_name: &str, hex: &str) {
        let entry = self
            .values
            .entry(KEY_CUSTOM_COLORS.to_string())
            .or_insert_with(|| json!({}));
        if !entry.is_object() {
            *entry = json!({});
        }
        if let Value::Object(colors) = entry {
            colors.insert(plugin_name.to_string(), json!(hex));
        }
    }

    pub fn plugin_order(&self) -> Vec<String> {
        string_list(self.values.get(KEY_PLUGIN_ORDER))
    }

    pub fn set_plugin_order(&mut self, order: &[String]) {
        self.values
            .insert(KEY_PLUGIN_ORDER.to_string(), json!(order));
    }

    pub fn disabled_plugins(&self) -> BTreeSet<String> {
        string_list(self.values.get(KEY_DISABLED_PLUGINS))
            .into_iter()
            .collect()
    }

    pub fn set_disabled_plugins(&mut self, disabled: &BTreeSet<String>) {
        self.values
            .insert(KEY_DISABLED_PLUGINS.to_string(), json!(disabled));
    }

    pub fn section(&self, key: &str) -> Option<&Value> {
        self.values.get(key)
    }

    pub fn set_section(&mut self, key: &str, value: Value) {
        self.values.insert(key.to_string(), value);
    }
}

impl Default for ConfigDocument {
    fn default() -> Self {
        Self::defaults()
    }
}

fn string_list(value: Option<&Value>) -> Vec<String> {
    match value {
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(|item| item.as_str().map(str::to_string))
            .collect(),
        _ => Vec::new(),
    }
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

pub trait ConfigManagerOperations: Send + Sync {
    /*
     * Reads the document from storage, merged over the defaults. Never fails;
     * problems are logged and the defaults are returned instead.
     */
    fn load(&self) -> ConfigDocument;

    /*
     * Writes the whole document back to storage.
     */
    fn save(&self, document: &ConfigDocument) -> Result<()>;

    /*
     * Applies `mutate` to a freshly loaded document and saves it, with no other
     * `update` on the same manager interleaving. Returns the saved document.
     */
    fn update(&self, mutate: &mut dyn FnMut(&mut ConfigDocument)) -> Result<ConfigDocument>;

    /*
     * The colour to show for a plugin: the user's override if any, else the
     * plugin's own default.
     */
    fn plugin_color(&self, plugin_name: &str, default_color: &str) -> String {
        self.load()
            .custom_colors()
            .remove(plugin_name)
            .unwrap_or_else(|| default_color.to_string())
    }
}

pub struct CoreConfigManager {
    config_file: PathBuf,
    update_lock: Mutex<()>,
}

impl CoreConfigManager {
    pub fn with_path(config_file: PathBuf) -> Self {
        CoreConfigManager {
            config_file,
            update_lock: Mutex::new(()),
        }
    }

    pub fn config_file(&self) -> &Path {
        &self.config_file
    }

    fn read_document(&self) -> Result<Option<ConfigDocument>> {
        if !self.config_file.exists() {
            return Ok(None);
        }
        let contents = fs::read_to_string(&self.config_file)?;
        let saved: Value = serde_json::from_str(&contents)?;
        Ok(Some(ConfigDocument::merge_with_defaults(saved)))
    }

    fn write_document(&self, document: &ConfigDocument) -> Result<()> {
        if let Some(parent) = self.config_file.parent() {
            if !parent.as_os_str().is_empty() {
                path_utils::ensure_dir(parent)?;
            }
        }
        let file = File::create(&self.config_file)?;
        let mut writer = BufWriter::new(file);
        serde_json::to_writer_pretty(&mut writer, &document.as_value())?;
        writer.write_all(b"\n")?;
        writer.flush()?;
        Ok(())
    }
}

impl ConfigManagerOperations for CoreConfigManager {
    fn load(&self) -> ConfigDocument {
        log::trace!("CoreConfigManager: Loading settings from {:?}", self.config_file);
        match self.read_document() {
            Ok(Some(document)) => document,
            Ok(None) => {
                log::debug!(
                    "CoreConfigManager: Settings file {:?} does not exist; using defaults.",
                    self.config_file
                );
                ConfigDocument::defaults()
            }
            Err(e) => {
                log::warn!(
                    "CoreConfigManager: Failed to read settings {:?}: {e}. Using defaults.",
                    self.config_file
                );
                ConfigDocument::defaults()
            }
        }
    }

    fn save(&self, document: &ConfigDocument) -> Result<()> {
        log::trace!("CoreConfigManager: Saving settings to {:?}", self.config_file);
        self.write_document(document)?;
        log::debug!("CoreConfigManager: Saved settings to {:?}.", self.config_file);
        Ok(())
    }

    fn update(&self, mutate: &mut dyn FnMut(&mut ConfigDocument)) -> Result<ConfigDocument> {
        let _guard = self
            .update_lock
            .lock()
            .map_err(|_| ConfigError::LockPoisoned)?;
        let mut document = self.load();
        mutate(&mut document);
        self.save(&document)?;
        Ok(document)
    }
}
