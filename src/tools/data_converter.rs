/*
 * Data converter: pretty-prints or minifies JSON read from a file or given
 * inline. Object keys keep their original order and non-ASCII text is written
 * as is.
 */
use crate::app_logic::ui_constants::GROUP_DEVELOPER_TOOLS;
use crate::core::{IconRef, Plugin, ToolContext, ToolError, ToolWidget};
use clap::{Args, Parser, Subcommand};
use serde::Serialize;
use serde_json::Value;
use serde_json::ser::PrettyFormatter;
use std::fs;
use std::path::PathBuf;

pub const PLUGIN_NAME: &str = "Data Converter";

pub const DEFAULT_INDENT: usize = 4;

#[derive(Parser, Debug)]
#[command(name = "data-converter", no_binary_name = true)]
#[command(about = "Format or minify JSON")]
struct ConverterArgs {
    #[command(subcommand)]
    command: ConverterCommand,
}

#[derive(Subcommand, Debug)]
enum ConverterCommand {
    /// Pretty-print JSON
    Format {
        #[command(flatten)]
        io: JsonIo,
        /// Spaces per indentation level
        #[arg(long, default_value_t = DEFAULT_INDENT)]
        indent: usize,
    },
    /// Remove all insignificant whitespace
    Minify {
        #[command(flatten)]
        io: JsonIo,
    },
}

#[derive(Args, Debug)]
struct JsonIo {
    /// JSON file to read
    #[arg(required_unless_present = "text", conflicts_with = "text")]
    file: Option<PathBuf>,
    /// JSON given inline instead of a file
    #[arg(long)]
    text: Option<String>,
    /// Write the result to this file instead of printing it
    #[arg(short, long)]
    output: Option<PathBuf>,
}

impl JsonIo {
    fn read(&self) -> Result<Value, ToolError> {
        let text = match (&self.text, &self.file) {
            (Some(text), _) => text.clone(),
            (None, Some(file)) => fs::read_to_string(file).map_err(|e| {
                ToolError::InvalidInput(format!("cannot read {}: {e}", file.display()))
            })?,
            (None, None) => String::new(),
        };
        if text.trim().is_empty() {
            return Err(ToolError::InvalidInput("no JSON input".to_string()));
        }
        serde_json::from_str(&text).map_err(|e| ToolError::InvalidInput(format!("JSON error: {e}")))
    }

    fn deliver(&self, result: String) -> Result<String, ToolError> {
        let Some(output) = &self.output else {
            return Ok(result);
        };
        fs::write(output, &result).map_err(|e| {
            ToolError::Failed(format!("cannot write {}: {e}", output.display()))
        })?;
        log::info!("DataConverter: Wrote {} bytes to {output:?}.", result.len());
        Ok(format!("Saved {} bytes to {}", result.len(), output.display()))
    }
}

pub fn format_json(value: &Value, indent: usize) -> Result<String, ToolError> {
    let indent = vec![b' '; indent];
    let mut buffer = Vec::new();
    let mut serializer =
        serde_json::Serializer::with_formatter(&mut buffer, PrettyFormatter::with_indent(&indent));
    value
        .serialize(&mut serializer)
        .map_err(|e| ToolError::Failed(e.to_string()))?;
    String::from_utf8(buffer).map_err(|e| ToolError::Failed(e.to_string()))
}

pub fn minify_json(value: &Value) -> Result<String, ToolError> {
    serde_json::to_string(value).map_err(|e| ToolError::Failed(e.to_string()))
}

pub struct DataConverterPlugin;

impl Plugin for DataConverterPlugin {
    fn name(&self) -> &str {
        PLUGIN_NAME
    }

    fn icon(&self) -> IconRef {
        IconRef::Builtin("code".to_string())
    }

    fn group(&self) -> &str {
        GROUP_DEVELOPER_TOOLS
    }

    fn description(&self) -> &str {
        "Format and minify JSON documents"
    }

    fn theme_color(&self) -> &str {
        "#673AB7"
    }

    fn keywords(&self) -> Vec<String> {
        ["JsonPage", "process_json", "format", "minify", "compress", "json"]
            .iter()
            .map(|k| k.to_string())
            .collect()
    }

    fn create_widget(&self) -> Box<dyn ToolWidget> {
        Box::new(DataConverterWidget)
    }
}

pub struct DataConverterWidget;

impl ToolWidget for DataConverterWidget {
    fn title(&self) -> String {
        PLUGIN_NAME.to_string()
    }

    fn run(&mut self, args: &[String], _ctx: &mut ToolContext<'_>) -> Result<String, ToolError> {
        let parsed =
            ConverterArgs::try_parse_from(args).map_err(|e| ToolError::Usage(e.to_string()))?;
        match parsed.command {
            ConverterCommand::Format { io, indent } => {
                let result = format_json(&io.read()?, indent)?;
                io.deliver(result)
            }
            ConverterCommand::Minify { io } => {
                let result = minify_json(&io.read()?)?;
                io.deliver(result)
            }
        }
    }
}
