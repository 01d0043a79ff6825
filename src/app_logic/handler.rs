use super::workspace_state::{TabId, TabSummary, WorkspaceState};
use crate::core::color_math;
use crate::core::plugin_discovery::DiscoveryFailure;
use crate::core::{
    ConfigDocument, ConfigManagerOperations, DiscoveryError, PluginDescriptor,
    PluginDiscoveryOperations, PluginRegistry, Theme, ToolContext, ToolError, apply_plugin_order,
};
use std::collections::BTreeSet;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

#[derive(Debug)]
pub enum HostError {
    Discovery(DiscoveryError),
    UnknownPlugin(String),
    PluginDisabled(String),
    UnknownTab(TabId),
    Tool(ToolError),
}

impl From<DiscoveryError> for HostError {
    fn from(err: DiscoveryError) -> Self {
        HostError::Discovery(err)
    }
}

impl From<ToolError> for HostError {
    fn from(err: ToolError) -> Self {
        HostError::Tool(err)
    }
}

impl fmt::Display for HostError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HostError::Discovery(e) => write!(f, "Plugin discovery failed: {e}"),
            HostError::UnknownPlugin(name) => write!(f, "No plugin named '{name}'"),
            HostError::PluginDisabled(name) => write!(f, "Plugin '{name}' is disabled"),
            HostError::UnknownTab(id) => write!(f, "No open tab {id}"),
            HostError::Tool(e) => write!(f, "{e}"),
        }
    }
}

impl std::error::Error for HostError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            HostError::Discovery(e) => Some(e),
            HostError::Tool(e) => Some(e),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, HostError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OpenMode {
    /* Switch to an existing tab of the plugin if there is one. */
    #[default]
    Reuse,
    /* Always create a fresh widget instance in a new tab. */
    NewTab,
}

/*
 * The platform-independent toolbox shell. It owns the discovered plugin list,
 * applies the user's ordering and disabled set from the configuration, and
 * manages the open tool tabs. It depends on `ConfigManagerOperations` and
 * `PluginDiscoveryOperations` so both can be replaced in tests.
 *
 * Settings changes never abort anything: a failed save is logged and reported
 * as `false`, and the in-memory state stays usable.
 */
pub struct ToolboxHost {
    pub(crate) config_manager: Arc<dyn ConfigManagerOperations>,
    pub(crate) discovery: Arc<dyn PluginDiscoveryOperations>,
    pub(crate) registry: PluginRegistry,
    pub(crate) plugins_dir: PathBuf,
    pub(crate) discovered: Vec<PluginDescriptor>,
    pub(crate) discovery_failures: Vec<DiscoveryFailure>,
    pub(crate) workspace: WorkspaceState,
}

impl ToolboxHost {
    pub fn new(
        config_manager: Arc<dyn ConfigManagerOperations>,
        discovery: Arc<dyn PluginDiscoveryOperations>,
        registry: PluginRegistry,
        plugins_dir: PathBuf,
    ) -> Self {
        ToolboxHost {
            config_manager,
            discovery,
            registry,
            plugins_dir,
            discovered: Vec::new(),
            discovery_failures: Vec::new(),
            workspace: WorkspaceState::new(),
        }
    }

    /*
     * Loads the built-in plugins followed by every plugin found in the plugins
     * directory. Broken manifests are logged and skipped; only an unusable
     * plugins directory is an error. Returns the number of plugins found.
     */
    pub fn startup(&mut self) -> Result<usize> {
        let mut plugins = self.registry.builtin_descriptors();
        let report = self.discovery.discover(&self.plugins_dir, &self.registry)?;
        for failure in &report.failures {
            log::warn!(
                "ToolboxHost: Plugin file {:?} unavailable: {}",
                failure.path,
                failure.message
            );
        }
        plugins.extend(report.plugins);
        log::info!(
            "ToolboxHost: {} plugins available ({} manifest files failed).",
            plugins.len(),
            report.failures.len()
        );
        self.discovered = plugins;
        self.discovery_failures = report.failures;
        Ok(self.discovered.len())
    }

    /*
     * Rediscovers plugins. Open tabs keep their widget instances.
     */
    pub fn rescan(&mut self) -> Result<usize> {
        log::debug!("ToolboxHost: Rescanning {:?}.", self.plugins_dir);
        self.startup()
    }

    pub fn plugins_dir(&self) -> &Path {
        &self.plugins_dir
    }

    pub fn discovery_failures(&self) -> &[DiscoveryFailure] {
        &self.discovery_failures
    }

    pub fn config(&self) -> ConfigDocument {
        self.config_manager.load()
    }

    /*
     * Plugins in the user's saved order. Disabled plugins are left out unless
     * `include_disabled` is set.
     */
    pub fn plugins(&self, include_disabled: bool) -> Vec<PluginDescriptor> {
        let config = self.config_manager.load();
        let disabled = config.disabled_plugins();
        apply_plugin_order(
            self.discovered.clone(),
            &config.plugin_order(),
            (!include_disabled).then_some(&disabled),
        )
    }

    /* Visible plugins matching every token of `query`; an empty query matches all. */
    pub fn search(&self, query: &str) -> Vec<PluginDescriptor> {
        self.plugins(false)
            .into_iter()
            .filter(|p| p.matches_query(query))
            .collect()
    }

    pub fn plugin_color(&self, plugin_name: &str) -> Option<String> {
        let plugin = self.discovered.iter().find(|p| p.name() == plugin_name)?;
        Some(
            self.config_manager
                .plugin_color(plugin_name, plugin.theme_color()),
        )
    }

    /*
     * Disabled plugins cannot be opened, not even by switching to a tab that
     * was opened before the plugin was disabled.
     */
    pub fn open_tool(&mut self, plugin_name: &str, mode: OpenMode) -> Result<TabId> {
        let plugin = self
            .discovered
            .iter()
            .find(|p| p.name() == plugin_name)
            .ok_or_else(|| HostError::UnknownPlugin(plugin_name.to_string()))?;
        if self
            .config_manager
            .load()
            .disabled_plugins()
            .contains(plugin_name)
        {
            return Err(HostError::PluginDisabled(plugin_name.to_string()));
        }

        if mode == OpenMode::Reuse {
            if let Some(existing) = self.workspace.find_by_plugin(plugin_name) {
                self.workspace.activate(existing);
                return Ok(existing);
            }
        }

        let widget = plugin.create_widget();
        Ok(self.workspace.open(plugin_name, widget))
    }

    pub fn run_tab(&mut self, tab: TabId, args: &[String]) -> Result<String> {
        let config = self.config_manager.as_ref();
        let open_tab = self.workspace.tab_mut(tab).ok_or(HostError::UnknownTab(tab))?;
        let mut ctx = ToolContext { config };
        log::debug!(
            "ToolboxHost: Running tab {tab} ({}) with {args:?}.",
            open_tab.plugin_name
        );
        Ok(open_tab.widget.run(args, &mut ctx)?)
    }

    pub fn close_tab(&mut self, tab: TabId) -> bool {
        self.workspace.close(tab)
    }

    pub fn tabs(&self) -> Vec<TabSummary> {
        self.workspace.summaries()
    }

    pub fn active_tab(&self) -> Option<TabId> {
        self.workspace.active()
    }

    pub fn switch_tab(&mut self, tab: TabId) -> Result<()> {
        if self.workspace.activate(tab) {
            Ok(())
        } else {
            Err(HostError::UnknownTab(tab))
        }
    }

    fn update_config(&self, what: &str, mutate: &mut dyn FnMut(&mut ConfigDocument)) -> bool {
        match self.config_manager.update(mutate) {
            Ok(_) => {
                log::debug!("ToolboxHost: Saved {what}.");
                true
            }
            Err(err) => {
                log::error!("ToolboxHost: Failed to save {what}: {err}");
                false
            }
        }
    }

    pub fn save_plugin_settings(&self, order: &[String], disabled: &BTreeSet<String>) -> bool {
        self.update_config("plugin settings", &mut |doc| {
            doc.set_plugin_order(order);
            doc.set_disabled_plugins(disabled);
        })
    }

    pub fn set_theme(&self, theme: Theme) -> bool {
        self.update_config("theme", &mut |doc| doc.set_theme(theme))
    }

    /* Zero-sized windows are rejected without touching the file. */
    pub fn set_window_size(&self, width: u32, height: u32) -> bool {
        if width == 0 || height == 0 {
            log::warn!("ToolboxHost: Rejected window size {width}x{height}.");
            return false;
        }
        self.update_config("window size", &mut |doc| doc.set_window_size(width, height))
    }

    /*
     * Stores a colour override for a plugin. The value is normalised to
     * `#RRGGBB`; an unparseable value is rejected without touching the file.
     */
    pub fn set_custom_color(&self, plugin_name: &str, hex: &str) -> bool {
        let normalized = match color_math::parse_hex(hex) {
            Ok(rgb) => rgb.to_hex(),
            Err(err) => {
                log::warn!("ToolboxHost: Rejected colour for '{plugin_name}': {err}");
                return false;
            }
        };
        self.update_config("custom colour", &mut |doc| {
            doc.set_custom_color(plugin_name, &normalized)
        })
    }
}
