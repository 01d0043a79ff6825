/*
 * Calculator: evaluates arithmetic expressions and keeps a history per open
 * tab, newest first. A history entry's result can be recalled without its
 * thousands separators to continue from it.
 */
use crate::app_logic::ui_constants::GROUP_OFFICE_TOOLS;
use crate::core::calc_engine::{self, format_number, group_thousands};
use crate::core::{IconRef, Plugin, ToolContext, ToolError, ToolWidget};
use clap::{Parser, Subcommand};

pub const PLUGIN_NAME: &str = "Calculator";

#[derive(Parser, Debug)]
#[command(name = "calculator", no_binary_name = true)]
#[command(about = "Evaluate expressions with + - * / ^ % ², sqrt, sqr, neg, recip, abs, pi and e")]
struct CalculatorArgs {
    #[command(subcommand)]
    command: CalculatorCommand,
}

#[derive(Subcommand, Debug)]
enum CalculatorCommand {
    /// Evaluate an expression; the words are joined with spaces
    Eval {
        #[arg(required = true, trailing_var_arg = true, allow_hyphen_values = true)]
        expression: Vec<String>,
    },
    /// Show this tab's history, newest first
    History,
    /// Print the plain result of history entry <n> (1 is the newest)
    Recall { n: usize },
    /// Forget this tab's history
    Clear,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryEntry {
    pub expression: String,
    /* Unseparated result text, as `format_number` produced it. */
    pub result: String,
}

pub struct CalculatorPlugin;

impl Plugin for CalculatorPlugin {
    fn name(&self) -> &str {
        PLUGIN_NAME
    }

    fn icon(&self) -> IconRef {
        IconRef::Builtin("calculator".to_string())
    }

    fn group(&self) -> &str {
        GROUP_OFFICE_TOOLS
    }

    fn description(&self) -> &str {
        "Scientific calculator with a per-tab history"
    }

    fn theme_color(&self) -> &str {
        "#E81123"
    }

    fn keywords(&self) -> Vec<String> {
        ["CalculatorWidget", "HistoryItem", "calculate_result", "sqrt", "percent", "math"]
            .iter()
            .map(|k| k.to_string())
            .collect()
    }

    fn create_widget(&self) -> Box<dyn ToolWidget> {
        Box::new(CalculatorWidget::default())
    }
}

#[derive(Default)]
pub struct CalculatorWidget {
    history: Vec<HistoryEntry>,
}

impl CalculatorWidget {
    fn evaluate(&mut self, expression: &str) -> Result<String, ToolError> {
        let value = calc_engine::evaluate(expression)
            .map_err(|e| ToolError::InvalidInput(e.to_string()))?;
        let result = format_number(value);
        log::debug!("Calculator: {expression} = {result}");
        self.history.insert(
            0,
            HistoryEntry {
                expression: expression.to_string(),
                result: result.clone(),
            },
        );
        Ok(group_thousands(&result))
    }

    fn render_history(&self) -> String {
        if self.history.is_empty() {
            return "No history yet.".to_string();
        }
        self.history
            .iter()
            .enumerate()
            .map(|(index, entry)| {
                format!(
                    "{:>3}  {} = {}",
                    index + 1,
                    entry.expression,
                    group_thousands(&entry.result)
                )
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}

impl ToolWidget for CalculatorWidget {
    fn title(&self) -> String {
        PLUGIN_NAME.to_string()
    }

    fn run(&mut self, args: &[String], _ctx: &mut ToolContext<'_>) -> Result<String, ToolError> {
        let parsed =
            CalculatorArgs::try_parse_from(args).map_err(|e| ToolError::Usage(e.to_string()))?;
        match parsed.command {
            CalculatorCommand::Eval { expression } => self.evaluate(&expression.join(" ")),
            CalculatorCommand::History => Ok(self.render_history()),
            CalculatorCommand::Recall { n } => n
                .checked_sub(1)
                .and_then(|index| self.history.get(index))
                .map(|entry| entry.result.clone())
                .ok_or_else(|| ToolError::InvalidInput(format!("no history entry {n}"))),
            CalculatorCommand::Clear => {
                let count = self.history.len();
                self.history.clear();
                Ok(format!("Cleared {count} history entries."))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::CoreConfigManager;
    use tempfile::tempdir;

    fn run(widget: &mut CalculatorWidget, args: &[&str]) -> Result<String, ToolError> {
        let dir = tempdir().unwrap();
        let config = CoreConfigManager::with_path(dir.path().join("settings.json"));
        let mut ctx = ToolContext { config: &config };
        let args: Vec<String> = args.iter().map(|a| a.to_string()).collect();
        widget.run(&args, &mut ctx)
    }

    #[test]
    fn test_eval_groups_thousands_and_records_history() {
        // Arrange
        let mut widget = CalculatorWidget::default();

        // Act
        let big = run(&mut widget, &["eval", "1234", "*", "1000"]).unwrap();
        let small = run(&mut widget, &["eval", "-1/4"]).unwrap();
        let history = run(&mut widget, &["history"]).unwrap();

        // Assert
        assert_eq!(big, "1,234,000");
        assert_eq!(small, "-0.25");
        assert_eq!(history, "  1  -1/4 = -0.25\n  2  1234 * 1000 = 1,234,000");
        assert_eq!(widget.history[1].result, "1234000");
    }

    #[test]
    fn test_recall_returns_plain_result_for_reuse() {
        let mut widget = CalculatorWidget::default();
        run(&mut widget, &["eval", "999 + 1"]).unwrap();

        let recalled = run(&mut widget, &["recall", "1"]).unwrap();
        let reused = run(&mut widget, &["eval", &format!("{recalled} / 8")]).unwrap();

        assert_eq!(recalled, "1000");
        assert_eq!(reused, "125");
        assert!(matches!(run(&mut widget, &["recall", "0"]), Err(ToolError::InvalidInput(_))));
        assert!(matches!(run(&mut widget, &["recall", "3"]), Err(ToolError::InvalidInput(_))));
    }

    #[test]
    fn test_errors_are_not_recorded() {
        let mut widget = CalculatorWidget::default();

        let result = run(&mut widget, &["eval", "1/0"]);

        assert!(matches!(result, Err(ToolError::InvalidInput(ref m)) if m == "Division by zero"));
        assert!(widget.history.is_empty());
        assert_eq!(run(&mut widget, &["history"]).unwrap(), "No history yet.");
    }

    #[test]
    fn test_clear_and_separate_instances() {
        let mut first = CalculatorWidget::default();
        let second = CalculatorWidget::default();
        run(&mut first, &["eval", "2^10"]).unwrap();

        let cleared = run(&mut first, &["clear"]).unwrap();

        assert_eq!(cleared, "Cleared 1 history entries.");
        assert!(first.history.is_empty());
        assert!(second.history.is_empty());
        assert!(matches!(run(&mut first, &["eval"]), Err(ToolError::Usage(_))));
    }
}
