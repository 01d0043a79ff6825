/*
 * Built-in tools shipped with the toolbox. Each is registered both as an
 * always-present plugin and as a widget factory under its tool key, so plugin
 * manifests can list extra entries backed by the same implementation.
 */
pub mod batch_rename;
pub mod calculator;
pub mod color_assistant;
pub mod data_converter;
pub mod directory_tree;

use crate::app_logic::ui_constants::{
    TOOL_KEY_BATCH_RENAME, TOOL_KEY_CALCULATOR, TOOL_KEY_COLOR_ASSISTANT,
    TOOL_KEY_DATA_CONVERTER, TOOL_KEY_DIRECTORY_TREE,
};
use crate::core::{PluginRegistry, ToolWidget};
use std::sync::Arc;

pub fn register_builtins(registry: &mut PluginRegistry) {
    registry.register_builtin(Arc::new(directory_tree::DirectoryTreePlugin));
    registry.register_builtin(Arc::new(color_assistant::ColorAssistantPlugin));
    registry.register_builtin(Arc::new(batch_rename::BatchRenamePlugin));
    registry.register_builtin(Arc::new(calculator::CalculatorPlugin));
    registry.register_builtin(Arc::new(data_converter::DataConverterPlugin));

    registry.register_factory(
        TOOL_KEY_DIRECTORY_TREE,
        Arc::new(|| Box::new(directory_tree::DirectoryTreeWidget::default()) as Box<dyn ToolWidget>),
    );
    registry.register_factory(
        TOOL_KEY_COLOR_ASSISTANT,
        Arc::new(|| Box::new(color_assistant::ColorAssistantWidget) as Box<dyn ToolWidget>),
    );
    registry.register_factory(
        TOOL_KEY_BATCH_RENAME,
        Arc::new(|| Box::new(batch_rename::BatchRenameWidget::default()) as Box<dyn ToolWidget>),
    );
    registry.register_factory(
        TOOL_KEY_CALCULATOR,
        Arc::new(|| Box::new(calculator::CalculatorWidget::default()) as Box<dyn ToolWidget>),
    );
    registry.register_factory(
        TOOL_KEY_DATA_CONVERTER,
        Arc::new(|| Box::new(data_converter::DataConverterWidget) as Box<dyn ToolWidget>),
    );
    log::debug!(
        "Tools: Registered built-in tools {:?}.",
        registry.tool_keys()
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{CorePluginDiscovery, PluginDiscoveryOperations};
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_builtins_are_registered_with_tags() {
        let mut registry = PluginRegistry::new();

        register_builtins(&mut registry);

        let descriptors = registry.builtin_descriptors();
        let names: Vec<&str> = descriptors.iter().map(|d| d.name()).collect();
        assert_eq!(
            names,
            vec![
                "Directory Tree",
                "Color Assistant",
                "Batch Rename",
                "Calculator",
                "Data Converter"
            ]
        );
        assert!(descriptors[0].matches_query("tree json"));
        assert!(descriptors[2].matches_query("preview"));
        assert!(descriptors[3].matches_query("history"));
        assert!(descriptors[4].matches_query("minify"));
        assert_eq!(
            registry.tool_keys(),
            vec![
                "batch_rename",
                "calculator",
                "color_assistant",
                "data_converter",
                "directory_tree"
            ]
        );
    }

    #[test]
    fn test_manifest_can_reuse_builtin_tool() {
        // Arrange
        let root = tempdir().unwrap();
        fs::create_dir(root.path().join("palette")).unwrap();
        fs::write(
            root.path().join("palette").join("palette.json"),
            r#"{
                "plugins": [{
                    "name": "Quick Palette",
                    "icon": "palette",
                    "group": "Design Tools",
                    "tool": "color_assistant"
                }]
            }"#,
        )
        .unwrap();
        let mut registry = PluginRegistry::new();
        register_builtins(&mut registry);

        // Act
        let report = CorePluginDiscovery::new()
            .discover(root.path(), &registry)
            .unwrap();

        // Assert
        assert!(report.failures.is_empty());
        assert_eq!(report.plugins.len(), 1);
        assert_eq!(report.plugins[0].create_widget().title(), "Color Assistant");
    }
}
