/*
 * This module consolidates the UI-independent logic of the toolbox: the
 * persisted configuration document, the plugin contract with discovery and
 * ordering, the directory-tree text codec, colour math, the calculator's
 * expression engine and the batch rename engine. Key abstractions
 * (`ConfigManagerOperations`, `PluginDiscoveryOperations`,
 * `TreeScannerOperations`) are re-exported here so the application logic can
 * depend on them without reaching into submodules.
 */
pub mod calc_engine;
pub mod color_math;
pub mod config;
pub mod path_utils;
pub mod plugin;
pub mod plugin_discovery;
pub mod plugin_ordering;
pub mod plugin_registry;
pub mod rename_engine;
pub mod search_tags;
pub mod tree_build;
pub mod tree_node;
pub mod tree_parse;
pub mod tree_render;
pub mod tree_scan;

// Configuration
pub use config::{ConfigDocument, ConfigError, ConfigManagerOperations, CoreConfigManager, Theme};

// Plugin contract, discovery and ordering
pub use plugin::{IconRef, Plugin, PluginDescriptor, PluginSource, ToolContext, ToolError, ToolWidget};
pub use plugin_discovery::{CorePluginDiscovery, DiscoveryError, PluginDiscoveryOperations};
pub use plugin_ordering::apply_plugin_order;
pub use plugin_registry::PluginRegistry;

// Directory tree codec
pub use tree_build::{BuildOptions, build_structure};
pub use tree_parse::parse_tree_text;
pub use tree_render::{TreeFormat, render};
pub use tree_scan::{CoreTreeScanner, ScanOptions, TreeScannerOperations};
