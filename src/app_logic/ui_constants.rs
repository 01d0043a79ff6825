/*
 * Shared names used by the host shell and the built-in tools.
 */

// Application name; selects the per-user config directory.
pub const APP_NAME: &str = "MyToolbox";

// Groups the built-in tools are listed under.
pub const GROUP_FILE_TOOLS: &str = "File Tools";
pub const GROUP_DESIGN_TOOLS: &str = "Design Tools";
pub const GROUP_OFFICE_TOOLS: &str = "Office Tools";
pub const GROUP_DEVELOPER_TOOLS: &str = "Developer Tools";

// Tool keys under which the built-ins register their widget factories, so
// manifests can expose additional entries backed by the same tools.
pub const TOOL_KEY_DIRECTORY_TREE: &str = "directory_tree";
pub const TOOL_KEY_COLOR_ASSISTANT: &str = "color_assistant";
pub const TOOL_KEY_BATCH_RENAME: &str = "batch_rename";
pub const TOOL_KEY_CALCULATOR: &str = "calculator";
pub const TOOL_KEY_DATA_CONVERTER: &str = "data_converter";

// Config section holding the colour assistant's favourites.
pub const COLOR_FAVORITES_SECTION: &str = "color_favorites";
