// src/main.rs

mod app_logic;
mod core;
mod tools;

use crate::app_logic::shell_session::PROMPT;
use crate::app_logic::ui_constants::APP_NAME;
use crate::app_logic::{OpenMode, ShellReply, ToolboxHost, execute_line};
use crate::core::path_utils::{self, LOG_FILENAME, PLUGINS_DIR_NAME};
use crate::core::{
    ConfigError, CoreConfigManager, CorePluginDiscovery, PluginDescriptor, PluginRegistry,
    PluginSource, Theme,
};
use clap::{ArgAction, Parser, Subcommand};
use log::LevelFilter;
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;
use simplelog::{
    ColorChoice, CombinedLogger, Config, ConfigBuilder, SharedLogger, TermLogger, TerminalMode,
    WriteLogger,
};
use std::collections::BTreeSet;
use std::error::Error;
use std::fs::File;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;

/// MyToolbox: a plugin-hosting toolbox shell
#[derive(Parser)]
#[command(name = "my_toolbox", version)]
#[command(about = "Plugin-hosting toolbox with directory tree, colour and rename tools")]
struct Cli {
    /// Settings file to use instead of the per-user default
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    /// Plugins directory to scan instead of <config dir>/plugins
    #[arg(long, global = true)]
    plugins_dir: Option<PathBuf>,
    /// More log output on stderr (repeatable)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,
    /// Only log errors on stderr
    #[arg(short, long, global = true)]
    quiet: bool,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List plugins in the saved order
    List {
        /// Include disabled plugins
        #[arg(long)]
        all: bool,
        /// Only plugins matching every word of the query
        #[arg(short, long)]
        search: Option<String>,
        /// Also show icon, origin and search tags
        #[arg(short, long)]
        long: bool,
    },
    /// Open a tool and run one command in it
    Open {
        plugin: String,
        /// Always create a fresh tool instance
        #[arg(long)]
        new_tab: bool,
        /// Arguments passed to the tool
        #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
        args: Vec<String>,
    },
    /// Scan the plugins directory again and report what was found
    Rescan,
    /// Interactive session with tabs: open, switch, run and close tools
    Shell,
    /// Show or change settings
    Settings {
        #[command(subcommand)]
        action: SettingsAction,
    },
}

#[derive(Subcommand)]
enum SettingsAction {
    /// Print the current settings
    Show {
        /// Print the raw settings document instead
        #[arg(long)]
        json: bool,
    },
    /// Set the theme (Light, Dark or Auto)
    Theme { theme: Theme },
    /// Save the window size
    Window { width: u32, height: u32 },
    /// Save the plugin order
    Order { names: Vec<String> },
    Disable { name: String },
    Enable { name: String },
    /// Override a plugin's colour
    Color { plugin: String, hex: String },
}

fn log_level(verbose: u8, quiet: bool) -> LevelFilter {
    if quiet {
        return LevelFilter::Error;
    }
    match verbose {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        2 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    }
}

/*
 * Terminal logging at the requested level, plus a debug-level log file next to
 * the settings when it can be created.
 */
fn initialize_logging(level: LevelFilter, log_file: &Path) {
    let mut loggers: Vec<Box<dyn SharedLogger>> = vec![TermLogger::new(
        level,
        Config::default(),
        TerminalMode::Stderr,
        ColorChoice::Auto,
    )];
    match File::create(log_file) {
        Ok(file) => loggers.push(WriteLogger::new(
            LevelFilter::Debug,
            ConfigBuilder::new().set_time_format_rfc3339().build(),
            file,
        )),
        Err(err) => eprintln!("Could not open log file {log_file:?}: {err}"),
    }
    if let Err(err) = CombinedLogger::init(loggers) {
        eprintln!("Logging could not be initialised: {err}");
    }
}

fn resolve_settings_path(cli: &Cli) -> Result<PathBuf, Box<dyn Error>> {
    match &cli.config {
        Some(path) => Ok(path.clone()),
        None => Ok(path_utils::default_settings_path(APP_NAME)
            .ok_or(ConfigError::NoProjectDirectory)?),
    }
}

fn saved(ok: bool) -> Result<(), Box<dyn Error>> {
    if ok {
        Ok(())
    } else {
        Err("settings could not be saved; see the log for details".into())
    }
}

fn run_settings(host: &ToolboxHost, action: SettingsAction) -> Result<(), Box<dyn Error>> {
    let config = host.config();
    match action {
        SettingsAction::Show { json: true } => {
            println!("{}", serde_json::to_string_pretty(&config.as_value())?);
            Ok(())
        }
        SettingsAction::Show { json: false } => {
            let (width, height) = config.window_size();
            println!("Theme           {}", config.theme());
            println!("Window size     {width} x {height}");
            println!("Plugin order    {}", config.plugin_order().join(", "));
            let disabled: Vec<String> = config.disabled_plugins().into_iter().collect();
            println!("Disabled        {}", disabled.join(", "));
            for (plugin, color) in config.custom_colors() {
                println!("Colour          {plugin}: {color}");
            }
            Ok(())
        }
        SettingsAction::Theme { theme } => saved(host.set_theme(theme)),
        SettingsAction::Window { width, height } => {
            if host.set_window_size(width, height) {
                Ok(())
            } else {
                Err(format!("could not set window size {width} x {height}").into())
            }
        }
        SettingsAction::Order { names } => {
            saved(host.save_plugin_settings(&names, &config.disabled_plugins()))
        }
        SettingsAction::Disable { name } => {
            let mut disabled: BTreeSet<String> = config.disabled_plugins();
            disabled.insert(name);
            saved(host.save_plugin_settings(&config.plugin_order(), &disabled))
        }
        SettingsAction::Enable { name } => {
            let mut disabled = config.disabled_plugins();
            disabled.remove(&name);
            saved(host.save_plugin_settings(&config.plugin_order(), &disabled))
        }
        SettingsAction::Color { plugin, hex } => {
            if host.set_custom_color(&plugin, &hex) {
                Ok(())
            } else {
                Err(format!("could not set colour '{hex}' for '{plugin}'").into())
            }
        }
    }
}

fn print_plugin(host: &ToolboxHost, plugin: &PluginDescriptor, disabled: bool, long: bool) {
    let color = host
        .plugin_color(plugin.name())
        .unwrap_or_else(|| plugin.theme_color().to_string());
    let marker = if disabled { " (disabled)" } else { "" };
    println!(
        "{:<20} {:<14} {:<8} {}{marker}",
        plugin.name(),
        plugin.group(),
        color,
        plugin.description()
    );
    if long {
        let origin = match plugin.source() {
            PluginSource::Builtin => "built-in".to_string(),
            PluginSource::Manifest(path) => path.display().to_string(),
        };
        println!("    icon:   {}", plugin.icon());
        println!("    source: {origin}");
        println!("    tags:   {}", plugin.search_tags().join(", "));
    }
}

/*
 * Reads commands until `exit`, end of input or Ctrl-C. Tabs stay open for the
 * whole session.
 */
fn run_shell(host: &mut ToolboxHost) -> Result<(), Box<dyn Error>> {
    let mut editor = DefaultEditor::new()?;
    println!("{APP_NAME} shell. Type 'help' for commands, 'exit' to quit.");
    loop {
        match editor.readline(PROMPT) {
            Ok(line) => {
                if !line.trim().is_empty() {
                    let _ = editor.add_history_entry(line.as_str());
                }
                match execute_line(host, &line) {
                    ShellReply::Output(text) if text.is_empty() => {}
                    ShellReply::Output(text) => println!("{text}"),
                    ShellReply::Quit => break,
                }
            }
            Err(ReadlineError::Interrupted | ReadlineError::Eof) => break,
            Err(err) => return Err(err.into()),
        }
    }
    log::debug!("Main: Shell closed with {} open tabs.", host.tabs().len());
    Ok(())
}

fn run(cli: Cli) -> Result<(), Box<dyn Error>> {
    let settings_path = resolve_settings_path(&cli)?;
    let config_dir = settings_path
        .parent()
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from("."));
    path_utils::ensure_dir(&config_dir)?;
    initialize_logging(log_level(cli.verbose, cli.quiet), &config_dir.join(LOG_FILENAME));

    let plugins_dir = match (&cli.plugins_dir, &cli.config) {
        (Some(dir), _) => dir.clone(),
        (None, Some(_)) => config_dir.join(PLUGINS_DIR_NAME),
        (None, None) => path_utils::default_plugins_dir(APP_NAME)
            .unwrap_or_else(|| config_dir.join(PLUGINS_DIR_NAME)),
    };

    let config_manager = Arc::new(CoreConfigManager::with_path(settings_path));
    log::debug!(
        "Main: Settings at {:?}, plugins in {plugins_dir:?}.",
        config_manager.config_file()
    );

    let mut registry = PluginRegistry::new();
    tools::register_builtins(&mut registry);
    let mut host = ToolboxHost::new(
        config_manager,
        Arc::new(CorePluginDiscovery::new()),
        registry,
        plugins_dir,
    );
    host.startup()?;

    match cli.command {
        Commands::List { all, search, long } => {
            let disabled = host.config().disabled_plugins();
            let plugins = match search {
                Some(query) => host.search(&query),
                None => host.plugins(all),
            };
            for plugin in &plugins {
                print_plugin(&host, plugin, disabled.contains(plugin.name()), long);
            }
            Ok(())
        }
        Commands::Open {
            plugin,
            new_tab,
            args,
        } => {
            let mode = if new_tab { OpenMode::NewTab } else { OpenMode::Reuse };
            let tab = host.open_tool(&plugin, mode)?;
            let output = host.run_tab(tab, &args)?;
            println!("{output}");
            host.close_tab(tab);
            Ok(())
        }
        Commands::Rescan => {
            let found = host.rescan()?;
            println!(
                "{found} plugins available from {}; {} manifest files failed.",
                host.plugins_dir().display(),
                host.discovery_failures().len()
            );
            Ok(())
        }
        Commands::Shell => run_shell(&mut host),
        Commands::Settings { action } => run_settings(&host, action),
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            log::error!("Main: {err}");
            eprintln!("error: {err}");
            ExitCode::FAILURE
        }
    }
}
