/*
 * Batch rename tool: previews and applies rename rules to a list of files.
 */
use crate::app_logic::ui_constants::GROUP_FILE_TOOLS;
use crate::core::rename_engine::{
    self, CaseMode, ExtCase, RenameEngine, RenameMode, RenamePlan, RenameRules, RenameStatus,
};
use crate::core::{IconRef, Plugin, ToolContext, ToolError, ToolWidget};
use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

pub const PLUGIN_NAME: &str = "Batch Rename";

#[derive(Parser, Debug)]
#[command(name = "batch-rename", no_binary_name = true)]
#[command(about = "Rename many files with find/replace or a template")]
struct RenameArgs {
    #[command(subcommand)]
    command: RenameCommand,
}

#[derive(Subcommand, Debug)]
enum RenameCommand {
    /// Show what would be renamed
    Preview(RuleArgs),
    /// Rename the files, unless the preview has conflicts
    Apply(RuleArgs),
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum CaseArg {
    Keep,
    Lower,
    Upper,
    Title,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum ExtCaseArg {
    Keep,
    Lower,
    Upper,
}

#[derive(Args, Debug)]
struct RuleArgs {
    #[arg(required = true)]
    files: Vec<PathBuf>,
    /// Template using {old}, {seq} and {date}; switches to template mode
    #[arg(short, long, conflicts_with_all = ["find", "prefix", "suffix"])]
    template: Option<String>,
    #[arg(long, default_value_t = 1)]
    seq_start: u32,
    #[arg(long, default_value_t = 3)]
    seq_padding: usize,
    #[arg(short, long)]
    find: Option<String>,
    #[arg(short, long, default_value = "")]
    replace: String,
    /// Treat --find as a regular expression
    #[arg(long)]
    regex: bool,
    #[arg(long, default_value = "")]
    prefix: String,
    #[arg(long, default_value = "")]
    suffix: String,
    #[arg(long, value_enum, default_value_t = CaseArg::Keep)]
    case: CaseArg,
    #[arg(long, value_enum, default_value_t = ExtCaseArg::Keep)]
    ext_case: ExtCaseArg,
}

impl RuleArgs {
    fn rules(&self) -> RenameRules {
        let mode = match &self.template {
            Some(template) => RenameMode::Template {
                template: template.clone(),
                seq_start: self.seq_start,
                seq_padding: self.seq_padding,
            },
            None => RenameMode::Replace {
                find: self.find.clone().unwrap_or_default(),
                replace: self.replace.clone(),
                use_regex: self.regex,
                prefix: self.prefix.clone(),
                suffix: self.suffix.clone(),
            },
        };
        RenameRules {
            mode,
            case: match self.case {
                CaseArg::Keep => CaseMode::Keep,
                CaseArg::Lower => CaseMode::Lower,
                CaseArg::Upper => CaseMode::Upper,
                CaseArg::Title => CaseMode::Title,
            },
            ext_case: match self.ext_case {
                ExtCaseArg::Keep => ExtCase::Keep,
                ExtCaseArg::Lower => ExtCase::Lower,
                ExtCaseArg::Upper => ExtCase::Upper,
            },
        }
    }
}

fn status_label(status: &RenameStatus) -> String {
    match status {
        RenameStatus::Pending => "ok".to_string(),
        RenameStatus::Unchanged => "unchanged".to_string(),
        RenameStatus::Conflict => "CONFLICT".to_string(),
        RenameStatus::Invalid(reason) => format!("INVALID ({reason})"),
        RenameStatus::Done => "done".to_string(),
        RenameStatus::Failed(message) => format!("FAILED ({message})"),
    }
}

fn format_plans(plans: &[RenamePlan]) -> String {
    plans
        .iter()
        .map(|plan| {
            let old_name = plan
                .from
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default();
            format!("{old_name} -> {} [{}]", plan.new_name(), status_label(&plan.status))
        })
        .collect::<Vec<_>>()
        .join("\n")
}

pub struct BatchRenamePlugin;

impl Plugin for BatchRenamePlugin {
    fn name(&self) -> &str {
        PLUGIN_NAME
    }

    fn icon(&self) -> IconRef {
        IconRef::Builtin("rename".to_string())
    }

    fn group(&self) -> &str {
        GROUP_FILE_TOOLS
    }

    fn description(&self) -> &str {
        "Rename files with regex, sequence numbers and templates"
    }

    fn theme_color(&self) -> &str {
        "#009688"
    }

    fn keywords(&self) -> Vec<String> {
        ["RenameEngine", "apply_rename", "update_preview", "regex", "template"]
            .iter()
            .map(|k| k.to_string())
            .collect()
    }

    fn create_widget(&self) -> Box<dyn ToolWidget> {
        Box::new(BatchRenameWidget::default())
    }
}

/*
 * Keeps the most recent plan so the shell can show per-file results.
 */
#[derive(Default)]
pub struct BatchRenameWidget {
    last_plans: Vec<RenamePlan>,
}

impl BatchRenameWidget {
    pub fn last_plans(&self) -> &[RenamePlan] {
        &self.last_plans
    }
}

impl ToolWidget for BatchRenameWidget {
    fn title(&self) -> String {
        PLUGIN_NAME.to_string()
    }

    fn run(&mut self, args: &[String], _ctx: &mut ToolContext<'_>) -> Result<String, ToolError> {
        let parsed = RenameArgs::try_parse_from(args).map_err(|e| ToolError::Usage(e.to_string()))?;
        let (rule_args, apply) = match parsed.command {
            RenameCommand::Preview(rule_args) => (rule_args, false),
            RenameCommand::Apply(rule_args) => (rule_args, true),
        };

        let engine = RenameEngine::compile(rule_args.rules())
            .map_err(|e| ToolError::InvalidInput(e.to_string()))?;
        let mut plans = engine.preview(&rule_args.files);

        let summary = if apply {
            match rename_engine::apply(&mut plans) {
                Ok(renamed) => format!("Renamed {renamed} of {} files.", plans.len()),
                Err(err) => {
                    self.last_plans = plans;
                    return Err(ToolError::Failed(err.to_string()));
                }
            }
        } else {
            let conflicts = plans
                .iter()
                .filter(|p| matches!(p.status, RenameStatus::Conflict | RenameStatus::Invalid(_)))
                .count();
            format!("{} files, {conflicts} blocked.", plans.len())
        };

        let output = format!("{}\n{summary}", format_plans(&plans));
        self.last_plans = plans;
        Ok(output)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::CoreConfigManager;
    use std::fs::File;
    use tempfile::tempdir;

    fn run(widget: &mut BatchRenameWidget, args: &[String]) -> Result<String, ToolError> {
        let dir = tempdir().unwrap();
        let config = CoreConfigManager::with_path(dir.path().join("settings.json"));
        let mut ctx = ToolContext { config: &config };
        widget.run(args, &mut ctx)
    }

    fn args(parts: &[&str], files: &[PathBuf]) -> Vec<String> {
        let mut all: Vec<String> = parts.iter().map(|p| p.to_string()).collect();
        all.extend(files.iter().map(|f| f.to_string_lossy().into_owned()));
        all
    }

    #[test]
    fn test_preview_does_not_touch_files() {
        // Arrange
        let dir = tempdir().unwrap();
        let file = dir.path().join("IMG_1.JPG");
        File::create(&file).unwrap();
        let mut widget = BatchRenameWidget::default();

        // Act
        let output = run(
            &mut widget,
            &args(&["preview", "--find", "IMG_", "--replace", "photo-", "--ext-case", "lower"], &[file.clone()]),
        )
        .unwrap();

        // Assert
        assert!(output.starts_with("IMG_1.JPG -> photo-1.jpg [ok]"));
        assert!(file.exists());
        assert_eq!(widget.last_plans().len(), 1);
    }

    #[test]
    fn test_apply_template_renames_files() {
        let dir = tempdir().unwrap();
        let files: Vec<PathBuf> = ["b.txt", "a.txt"].iter().map(|n| dir.path().join(n)).collect();
        for f in &files {
            File::create(f).unwrap();
        }
        let mut widget = BatchRenameWidget::default();

        let output = run(
            &mut widget,
            &args(&["apply", "--template", "doc_{seq}", "--seq-padding", "2"], &files),
        )
        .unwrap();

        assert!(output.ends_with("Renamed 2 of 2 files."));
        assert!(dir.path().join("doc_01.txt").is_file());
        assert!(dir.path().join("doc_02.txt").is_file());
    }

    #[test]
    fn test_bad_regex_leaves_files_untouched() {
        let dir = tempdir().unwrap();
        let file = dir.path().join("keep.txt");
        File::create(&file).unwrap();
        let mut widget = BatchRenameWidget::default();

        let result = run(
            &mut widget,
            &args(&["apply", "--find", "(", "--regex"], &[file.clone()]),
        );

        assert!(matches!(result, Err(ToolError::InvalidInput(_))));
        assert!(file.exists());
    }

    #[test]
    fn test_apply_with_conflict_is_refused() {
        let dir = tempdir().unwrap();
        let files: Vec<PathBuf> = ["a1.txt", "a2.txt"].iter().map(|n| dir.path().join(n)).collect();
        for f in &files {
            File::create(f).unwrap();
        }
        let mut widget = BatchRenameWidget::default();

        let result = run(
            &mut widget,
            &args(&["apply", "--find", "[0-9]", "--regex"], &files),
        );

        assert!(matches!(result, Err(ToolError::Failed(_))));
        assert!(files.iter().all(|f| f.exists()));
        assert_eq!(widget.last_plans()[1].status, RenameStatus::Conflict);
    }

    #[test]
    fn test_template_conflicts_with_find() {
        let mut widget = BatchRenameWidget::default();

        let result = run(
            &mut widget,
            &args(&["preview", "--template", "{old}", "--find", "x", "f.txt"], &[]),
        );

        assert!(matches!(result, Err(ToolError::Usage(_))));
    }
}
