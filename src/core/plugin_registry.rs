/*
 * Compile-time registry of tool implementations. Built-in plugins are listed
 * here directly, and manifest-described plugins refer to a registered tool key
 * to obtain their widget factory. No code is ever loaded dynamically.
 */
use super::plugin::{Plugin, PluginDescriptor, PluginSource, ToolWidget};
use super::search_tags::derive_search_tags;
use std::collections::BTreeMap;
use std::sync::Arc;

pub type WidgetFactory = Arc<dyn Fn() -> Box<dyn ToolWidget> + Send + Sync>;

#[derive(Default, Clone)]
pub struct PluginRegistry {
    factories: BTreeMap<String, WidgetFactory>,
    builtin_plugins: Vec<Arc<dyn Plugin>>,
}

impl PluginRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /*
     * Makes a tool available to manifests under `key`.
     */
    pub fn register_factory(&mut self, key: &str, factory: WidgetFactory) {
        if self.factories.insert(key.to_string(), factory).is_some() {
            log::warn!("PluginRegistry: Tool key '{key}' registered twice; keeping the latest.");
        }
    }

    /*
     * Registers a plugin that is always present, independent of the plugins
     * directory.
     */
    pub fn register_builtin(&mut self, plugin: Arc<dyn Plugin>) {
        self.builtin_plugins.push(plugin);
    }

    pub fn factory(&self, key: &str) -> Option<WidgetFactory> {
        self.factories.get(key).cloned()
    }

    pub fn tool_keys(&self) -> Vec<&str> {
        self.factories.keys().map(String::as_str).collect()
    }

    /*
     * Descriptors for the built-in plugins in registration order, with tags
     * derived from each plugin's description and declared keywords.
     */
    pub fn builtin_descriptors(&self) -> Vec<PluginDescriptor> {
        self.builtin_plugins
            .iter()
            .map(|plugin| {
                let tags = derive_search_tags(plugin.description(), &[], &[], &plugin.keywords());
                PluginDescriptor::new(Arc::clone(plugin), tags, PluginSource::Builtin)
            })
            .collect()
    }
}
