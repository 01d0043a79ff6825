/*
 * Defines the capability contract every toolbox plugin satisfies, the headless
 * "widget" a plugin produces when opened, and the descriptor the host keeps for
 * each discovered plugin (the plugin itself plus its search tags).
 */
use crate::core::config::ConfigManagerOperations;
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

pub const DEFAULT_DESCRIPTION: &str = "No description";
pub const DEFAULT_THEME_COLOR: &str = "#009faa";

/*
 * Opaque icon handle. The host never interprets it beyond display.
 */
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IconRef {
    Builtin(String),
    Path(PathBuf),
    Themed { light: String, dark: String },
}

impl IconRef {
    /*
     * Parses the manifest form: `path:<file>`, `themed:<light>|<dark>`, or a
     * bare built-in symbol id.
     */
    pub fn parse(raw: &str) -> Option<IconRef> {
        let raw = raw.trim();
        if raw.is_empty() {
            return None;
        }
        if let Some(path) = raw.strip_prefix("path:") {
            return Some(IconRef::Path(PathBuf::from(path.trim())));
        }
        if let Some(pair) = raw.strip_prefix("themed:") {
            let (light, dark) = pair.split_once('|')?;
            return Some(IconRef::Themed {
                light: light.trim().to_string(),
                dark: dark.trim().to_string(),
            });
        }
        Some(IconRef::Builtin(raw.to_string()))
    }
}

impl fmt::Display for IconRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IconRef::Builtin(id) => write!(f, "{id}"),
            IconRef::Path(path) => write!(f, "path:{}", path.display()),
            IconRef::Themed { light, dark } => write!(f, "themed:{light}|{dark}"),
        }
    }
}

#[derive(Debug)]
pub enum ToolError {
    Usage(String),
    InvalidInput(String),
    Failed(String),
}

impl fmt::Display for ToolError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ToolError::Usage(msg) => write!(f, "{msg}"),
            ToolError::InvalidInput(msg) => write!(f, "Invalid input: {msg}"),
            ToolError::Failed(msg) => write!(f, "Tool failed: {msg}"),
        }
    }
}

impl std::error::Error for ToolError {}

/*
 * What a running tool can reach in the host. Tools read and write their own
 * configuration sections through it, independently of the host.
 */
pub struct ToolContext<'a> {
    pub config: &'a dyn ConfigManagerOperations,
}

/*
 * A self-contained tool instance, the headless equivalent of a widget subtree.
 * Each call to `Plugin::create_widget` yields a fresh instance, so several can
 * be open at once.
 */
pub trait ToolWidget: Send {
    fn title(&self) -> String;

    /*
     * Runs one command against this instance. `args` excludes the tool name.
     * Returns the text the shell should display.
     */
    fn run(&mut self, args: &[String], ctx: &mut ToolContext<'_>) -> Result<String, ToolError>;
}

pub trait Plugin: Send + Sync {
    fn name(&self) -> &str;
    fn icon(&self) -> IconRef;
    fn group(&self) -> &str;

    fn description(&self) -> &str {
        DEFAULT_DESCRIPTION
    }

    fn theme_color(&self) -> &str {
        DEFAULT_THEME_COLOR
    }

    /*
     * Declared search keywords. Component and operation names may be given in
     * their code form (`JsonPage`, `convert_file`); tag derivation splits them.
     */
    fn keywords(&self) -> Vec<String> {
        Vec::new()
    }

    fn create_widget(&self) -> Box<dyn ToolWidget>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PluginSource {
    Builtin,
    Manifest(PathBuf),
}

/*
 * The host's record of one plugin. `search_tags` is computed once at
 * discovery and never invalidated.
 */
#[derive(Clone)]
pub struct PluginDescriptor {
    plugin: Arc<dyn Plugin>,
    search_tags: Vec<String>,
    source: PluginSource,
}

impl PluginDescriptor {
    pub fn new(plugin: Arc<dyn Plugin>, search_tags: Vec<String>, source: PluginSource) -> Self {
        PluginDescriptor {
            plugin,
            search_tags,
            source,
        }
    }

    pub fn name(&self) -> &str {
        self.plugin.name()
    }

    pub fn group(&self) -> &str {
        self.plugin.group()
    }

    pub fn description(&self) -> &str {
        self.plugin.description()
    }

    pub fn theme_color(&self) -> &str {
        self.plugin.theme_color()
    }

    pub fn icon(&self) -> IconRef {
        self.plugin.icon()
    }

    pub fn search_tags(&self) -> &[String] {
        &self.search_tags
    }

    pub fn source(&self) -> &PluginSource {
        &self.source
    }

    pub fn create_widget(&self) -> Box<dyn ToolWidget> {
        self.plugin.create_widget()
    }

    /*
     * Case-insensitive filter: every whitespace-separated token of `query` must
     * occur in the name, group, description or one of the tags.
     */
    pub fn matches_query(&self, query: &str) -> bool {
        let name = self.name().to_lowercase();
        let group = self.group().to_lowercase();
        let description = self.description().to_lowercase();
        query
            .split_whitespace()
            .map(str::to_lowercase)
            .all(|token| {
                name.contains(&token)
                    || group.contains(&token)
                    || description.contains(&token)
                    || self.search_tags.iter().any(|tag| tag.contains(&token))
            })
    }
}

impl fmt::Debug for PluginDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PluginDescriptor")
            .field("name", &self.name())
            .field("group", &self.group())
            .field("search_tags", &self.search_tags)
            .field("source", &self.source)
            .finish()
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;

    pub struct EchoWidget {
        pub title: String,
    }

    impl ToolWidget for EchoWidget {
        fn title(&self) -> String {
            self.title.clone()
        }

        fn run(
            &mut self,
            args: &[String],
            _ctx: &mut ToolContext<'_>,
        ) -> Result<String, ToolError> {
            Ok(args.join(" "))
        }
    }

    pub struct StubPlugin {
        pub name: String,
        pub group: String,
        pub description: String,
    }

    impl StubPlugin {
        pub fn named(name: &str) -> Self {
            StubPlugin {
                name: name.to_string(),
                group: "Test".to_string(),
                description: DEFAULT_DESCRIPTION.to_string(),
            }
        }
    }

    impl Plugin for StubPlugin {
        fn name(&self) -> &str {
            &self.name
        }
        fn icon(&self) -> IconRef {
            IconRef::Builtin("stub".to_string())
        }
        fn group(&self) -> &str {
            &self.group
        }
        fn description(&self) -> &str {
            &self.description
        }
        fn create_widget(&self) -> Box<dyn ToolWidget> {
            Box::new(EchoWidget {
                title: self.name.clone(),
            })
        }
    }

    pub fn descriptor(name: &str) -> PluginDescriptor {
        PluginDescriptor::new(
            Arc::new(StubPlugin::named(name)),
            Vec::new(),
            PluginSource::Builtin,
        )
    }
}
