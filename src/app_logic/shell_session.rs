/*
 * Line-oriented front end for `ToolboxHost`: the interactive counterpart of the
 * tab bar. Each input line is one command (open, switch, run, close, tabs,
 * list); tool output and errors come back as text for the caller to print.
 * Errors never end the session, only `exit`/`quit` do.
 */
use super::handler::{OpenMode, ToolboxHost};
use super::workspace_state::TabId;

pub const PROMPT: &str = "toolbox> ";

pub const HELP_TEXT: &str = "\
Commands:
  list                     Plugins in the saved order
  open <plugin> [--new]    Open a plugin (or switch to its tab)
  tabs                     Open tabs; * marks the active one
  switch <n>               Make tab #n active
  run <args...>            Run a command in the active tab
  close [n]                Close tab #n (default: the active tab)
  help                     This text
  exit | quit              Leave the shell";

#[derive(Debug, PartialEq, Eq)]
pub enum ShellReply {
    Output(String),
    Quit,
}

/*
 * Splits a command line on whitespace. Single or double quotes group words;
 * a backslash outside single quotes escapes the next character.
 */
pub fn split_command_line(line: &str) -> Result<Vec<String>, String> {
    let mut words = Vec::new();
    let mut current = String::new();
    let mut in_word = false;
    let mut quote: Option<char> = None;
    let mut chars = line.chars();

    while let Some(c) = chars.next() {
        match (quote, c) {
            (Some(q), c) if c == q => quote = None,
            (Some('\''), c) => current.push(c),
            (_, '\\') => match chars.next() {
                Some(escaped) => {
                    current.push(escaped);
                    in_word = true;
                }
                None => return Err("trailing backslash".to_string()),
            },
            (Some(_), c) => current.push(c),
            (None, '"' | '\'') => {
                quote = Some(c);
                in_word = true;
            }
            (None, c) if c.is_whitespace() => {
                if in_word {
                    words.push(std::mem::take(&mut current));
                    in_word = false;
                }
            }
            (None, c) => {
                current.push(c);
                in_word = true;
            }
        }
    }

    if let Some(q) = quote {
        return Err(format!("unterminated {q} quote"));
    }
    if in_word {
        words.push(current);
    }
    Ok(words)
}

fn parse_tab_id(raw: &str) -> Result<TabId, String> {
    raw.trim_start_matches('#')
        .parse::<u64>()
        .map(TabId)
        .map_err(|_| format!("'{raw}' is not a tab number"))
}

fn list_plugins(host: &ToolboxHost) -> String {
    let plugins = host.plugins(false);
    if plugins.is_empty() {
        return "No plugins available.".to_string();
    }
    plugins
        .iter()
        .map(|p| format!("{:<20} {}", p.name(), p.group()))
        .collect::<Vec<_>>()
        .join("\n")
}

fn list_tabs(host: &ToolboxHost) -> String {
    let tabs = host.tabs();
    if tabs.is_empty() {
        return "No open tabs.".to_string();
    }
    tabs.iter()
        .map(|tab| {
            let marker = if tab.active { '*' } else { ' ' };
            if tab.title == tab.plugin_name {
                format!("{marker} {}  {}", tab.id, tab.title)
            } else {
                format!("{marker} {}  {} ({})", tab.id, tab.title, tab.plugin_name)
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn dispatch(host: &mut ToolboxHost, words: &[String]) -> Result<ShellReply, String> {
    let Some((command, rest)) = words.split_first() else {
        return Ok(ShellReply::Output(String::new()));
    };
    let output = match command.as_str() {
        "exit" | "quit" => return Ok(ShellReply::Quit),
        "help" => HELP_TEXT.to_string(),
        "list" => list_plugins(host),
        "tabs" => list_tabs(host),
        "open" => {
            let new_tab = rest.iter().any(|w| w == "--new");
            let name = rest
                .iter()
                .filter(|w| *w != "--new")
                .cloned()
                .collect::<Vec<_>>()
                .join(" ");
            if name.is_empty() {
                return Err("usage: open <plugin> [--new]".to_string());
            }
            let mode = if new_tab { OpenMode::NewTab } else { OpenMode::Reuse };
            let tab = host.open_tool(&name, mode).map_err(|e| e.to_string())?;
            format!("Active tab {tab}: {name}")
        }
        "switch" => {
            let [raw] = rest else {
                return Err("usage: switch <n>".to_string());
            };
            let tab = parse_tab_id(raw)?;
            host.switch_tab(tab).map_err(|e| e.to_string())?;
            format!("Active tab {tab}")
        }
        "run" => {
            let tab = host
                .active_tab()
                .ok_or_else(|| "no active tab; open a plugin first".to_string())?;
            host.run_tab(tab, rest).map_err(|e| e.to_string())?
        }
        "close" => {
            let tab = match rest {
                [] => host
                    .active_tab()
                    .ok_or_else(|| "no open tabs".to_string())?,
                [raw] => parse_tab_id(raw)?,
                _ => return Err("usage: close [n]".to_string()),
            };
            if !host.close_tab(tab) {
                return Err(format!("no open tab {tab}"));
            }
            match host.active_tab() {
                Some(active) => format!("Closed tab {tab}; active tab {active}"),
                None => format!("Closed tab {tab}"),
            }
        }
        other => return Err(format!("unknown command '{other}'; try 'help'")),
    };
    Ok(ShellReply::Output(output))
}

/*
 * Runs one input line against the host. Failures are reported as
 * `error: ...` output so the session continues.
 */
pub fn execute_line(host: &mut ToolboxHost, line: &str) -> ShellReply {
    let result = split_command_line(line).and_then(|words| dispatch(host, &words));
    match result {
        Ok(reply) => reply,
        Err(message) => {
            log::debug!("ShellSession: '{line}' failed: {message}");
            ShellReply::Output(format!("error: {message}"))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::plugin::test_support::StubPlugin;
    use crate::core::{CoreConfigManager, CorePluginDiscovery, PluginRegistry};
    use std::sync::Arc;
    use tempfile::{TempDir, tempdir};

    fn setup_host() -> (ToolboxHost, TempDir) {
        let dir = tempdir().unwrap();
        let mut registry = PluginRegistry::new();
        registry.register_builtin(Arc::new(StubPlugin::named("Echo Tool")));
        registry.register_builtin(Arc::new(StubPlugin::named("Other")));
        let mut host = ToolboxHost::new(
            Arc::new(CoreConfigManager::with_path(dir.path().join("settings.json"))),
            Arc::new(CorePluginDiscovery::new()),
            registry,
            dir.path().join("plugins"),
        );
        host.startup().unwrap();
        (host, dir)
    }

    fn output(reply: ShellReply) -> String {
        match reply {
            ShellReply::Output(text) => text,
            ShellReply::Quit => panic!("unexpected quit"),
        }
    }

    #[test]
    fn test_split_command_line_handles_quotes_and_escapes() {
        assert_eq!(
            split_command_line(r#"run generate "My Folder" -i '*.tmp' a\ b"#).unwrap(),
            vec!["run", "generate", "My Folder", "-i", "*.tmp", "a b"]
        );
        assert_eq!(split_command_line("  ").unwrap(), Vec::<String>::new());
        assert_eq!(split_command_line(r#"open """#).unwrap(), vec!["open", ""]);
        assert!(split_command_line("open \"Echo").is_err());
    }

    #[test]
    fn test_open_run_and_list_tabs() {
        // Arrange
        let (mut host, _dir) = setup_host();

        // Act
        let opened = output(execute_line(&mut host, "open Echo Tool"));
        let ran = output(execute_line(&mut host, "run hello \"big world\""));
        output(execute_line(&mut host, "open Other"));
        let tabs = output(execute_line(&mut host, "tabs"));

        // Assert
        assert_eq!(opened, "Active tab #1: Echo Tool");
        assert_eq!(ran, "hello big world");
        assert_eq!(tabs, "  #1  Echo Tool\n* #2  Other");
    }

    #[test]
    fn test_switch_and_close_follow_active_tab() {
        // Arrange
        let (mut host, _dir) = setup_host();
        execute_line(&mut host, "open Echo Tool");
        execute_line(&mut host, "open Echo Tool --new");
        execute_line(&mut host, "open Other");

        // Act
        let switched = output(execute_line(&mut host, "switch #1"));
        let closed = output(execute_line(&mut host, "close"));
        let closed_again = output(execute_line(&mut host, "close 3"));

        // Assert
        assert_eq!(switched, "Active tab #1");
        assert_eq!(closed, "Closed tab #1; active tab #2");
        assert_eq!(closed_again, "Closed tab #3; active tab #2");
        assert_eq!(host.tabs().len(), 1);
        assert_eq!(output(execute_line(&mut host, "run x")), "x");
    }

    #[test]
    fn test_errors_are_reported_and_session_continues() {
        let (mut host, _dir) = setup_host();

        assert_eq!(
            output(execute_line(&mut host, "run anything")),
            "error: no active tab; open a plugin first"
        );
        assert_eq!(
            output(execute_line(&mut host, "open Missing")),
            "error: No plugin named 'Missing'"
        );
        assert_eq!(
            output(execute_line(&mut host, "switch abc")),
            "error: 'abc' is not a tab number"
        );
        assert_eq!(output(execute_line(&mut host, "close")), "error: no open tabs");
        assert!(output(execute_line(&mut host, "frobnicate")).starts_with("error: unknown command"));
        assert_eq!(output(execute_line(&mut host, "tabs")), "No open tabs.");
        assert_eq!(execute_line(&mut host, "quit"), ShellReply::Quit);
    }

    #[test]
    fn test_list_shows_visible_plugins() {
        let (mut host, _dir) = setup_host();

        let listed = output(execute_line(&mut host, "list"));

        assert!(listed.starts_with("Echo Tool"));
        assert!(listed.contains("\nOther"));
    }
}
