use regex::Regex;
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use time::Date;

/*
 * Batch renaming: compute new file names from a set of rules, preview them
 * together with conflict detection, then apply the preview.
 *
 * The rules are validated once by `RenameEngine::compile`; a malformed regex
 * is reported there, before any file is looked at. Applying a preview that
 * contains conflicts is refused as a whole. Otherwise files are renamed one at
 * a time and each records its own outcome, so one failure does not stop the
 * rest of the batch.
 */

#[derive(Debug)]
pub enum RenameError {
    InvalidPattern(regex::Error),
    Conflicts(usize),
}

impl std::fmt::Display for RenameError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RenameError::InvalidPattern(e) => write!(f, "Invalid find pattern: {e}"),
            RenameError::Conflicts(n) => write!(f, "{n} naming conflict(s); nothing was renamed"),
        }
    }
}

impl std::error::Error for RenameError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            RenameError::InvalidPattern(e) => Some(e),
            _ => None,
        }
    }
}

impl From<regex::Error> for RenameError {
    fn from(err: regex::Error) -> Self {
        RenameError::InvalidPattern(err)
    }
}

pub type Result<T> = std::result::Result<T, RenameError>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RenameMode {
    /*
     * Find/replace inside the stem, then wrap it with prefix and suffix. With
     * `use_regex`, `replace` may refer to groups as `$1` or `${name}`.
     */
    Replace {
        find: String,
        replace: String,
        use_regex: bool,
        prefix: String,
        suffix: String,
    },
    /*
     * Rebuild the stem from a template with `{old}`, `{seq}` and `{date}`.
     */
    Template {
        template: String,
        seq_start: u32,
        seq_padding: usize,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CaseMode {
    #[default]
    Keep,
    Lower,
    Upper,
    Title,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExtCase {
    #[default]
    Keep,
    Lower,
    Upper,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenameRules {
    pub mode: RenameMode,
    pub case: CaseMode,
    pub ext_case: ExtCase,
}

impl Default for RenameRules {
    fn default() -> Self {
        RenameRules {
            mode: RenameMode::Template {
                template: "{old}_{seq}".to_string(),
                seq_start: 1,
                seq_padding: 3,
            },
            case: CaseMode::Keep,
            ext_case: ExtCase::Keep,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RenameStatus {
    Pending,
    Unchanged,
    Conflict,
    Invalid(String),
    Done,
    Failed(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenamePlan {
    pub from: PathBuf,
    pub to: PathBuf,
    pub status: RenameStatus,
}

impl RenamePlan {
    pub fn new_name(&self) -> String {
        self.to
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default()
    }
}

/*
 * Splits a file name like Python's `os.path.splitext`: leading dots belong to
 * the stem, the extension keeps its dot.
 */
pub fn split_extension(file_name: &str) -> (&str, &str) {
    let leading_dots = file_name.len() - file_name.trim_start_matches('.').len();
    match file_name[leading_dots..].rfind('.') {
        Some(index) => file_name.split_at(leading_dots + index),
        None => (file_name, ""),
    }
}

/*
 * Capitalises the first letter of every run of letters and lowercases the
 * rest, so `hello_world-2x` becomes `Hello_World-2X`.
 */
pub fn title_case(text: &str) -> String {
    let mut result = String::with_capacity(text.len());
    let mut previous_is_letter = false;
    for c in text.chars() {
        if c.is_alphabetic() {
            if previous_is_letter {
                result.extend(c.to_lowercase());
            } else {
                result.extend(c.to_uppercase());
            }
            previous_is_letter = true;
        } else {
            result.push(c);
            previous_is_letter = false;
        }
    }
    result
}

fn today() -> Date {
    time::OffsetDateTime::now_local()
        .unwrap_or_else(|_| time::OffsetDateTime::now_utc())
        .date()
}

fn date_stamp(date: Date) -> String {
    let format = time::macros::format_description!("[year][month][day]");
    date.format(&format).unwrap_or_else(|err| {
        log::warn!("RenameEngine: Could not format date {date}: {err}");
        String::new()
    })
}

#[derive(Debug)]
pub struct RenameEngine {
    rules: RenameRules,
    pattern: Option<Regex>,
    date_stamp: String,
}

impl RenameEngine {
    pub fn compile(rules: RenameRules) -> Result<Self> {
        let pattern = match &rules.mode {
            RenameMode::Replace {
                find,
                use_regex: true,
                ..
            } if !find.is_empty() => Some(Regex::new(find)?),
            _ => None,
        };
        Ok(RenameEngine {
            rules,
            pattern,
            date_stamp: date_stamp(today()),
        })
    }

    /* Pins the `{date}` value, mainly for reproducible previews. */
    pub fn with_date(mut self, date: Date) -> Self {
        self.date_stamp = date_stamp(date);
        self
    }

    pub fn rules(&self) -> &RenameRules {
        &self.rules
    }

    /*
     * The new name for `file_name` when it is the `index`-th file of the batch.
     */
    pub fn rename_one(&self, file_name: &str, index: usize) -> String {
        let (stem, extension) = split_extension(file_name);

        let new_stem = match &self.rules.mode {
            RenameMode::Template {
                template,
                seq_start,
                seq_padding,
            } => {
                let seq = u64::from(*seq_start) + index as u64;
                template
                    .replace("{seq}", &format!("{seq:0width$}", width = *seq_padding))
                    .replace("{old}", stem)
                    .replace("{date}", &self.date_stamp)
            }
            RenameMode::Replace {
                find,
                replace,
                prefix,
                suffix,
                ..
            } => {
                let replaced = match &self.pattern {
                    Some(pattern) => pattern.replace_all(stem, replace.as_str()).into_owned(),
                    None if !find.is_empty() => stem.replace(find.as_str(), replace),
                    None => stem.to_string(),
                };
                format!("{prefix}{replaced}{suffix}")
            }
        };

        let new_stem = match self.rules.case {
            CaseMode::Keep => new_stem,
            CaseMode::Lower => new_stem.to_lowercase(),
            CaseMode::Upper => new_stem.to_uppercase(),
            CaseMode::Title => title_case(&new_stem),
        };
        let new_extension = match self.rules.ext_case {
            ExtCase::Keep => extension.to_string(),
            ExtCase::Lower => extension.to_lowercase(),
            ExtCase::Upper => extension.to_uppercase(),
        };
        format!("{new_stem}{new_extension}")
    }

    /*
     * Plans the batch. The second and later files mapping to the same target
     * are conflicts, as is a target that already exists on disk and is not the
     * file itself.
     */
    pub fn preview(&self, files: &[PathBuf]) -> Vec<RenamePlan> {
        let mut claimed: HashSet<PathBuf> = HashSet::new();
        files
            .iter()
            .enumerate()
            .map(|(index, from)| {
                let old_name = from
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_default();
                let new_name = self.rename_one(&old_name, index);
                let parent = from.parent().unwrap_or_else(|| Path::new(""));
                let to = parent.join(&new_name);

                let status = if let Some(reason) = invalid_name_reason(&new_name) {
                    RenameStatus::Invalid(reason.to_string())
                } else if !claimed.insert(to.clone()) {
                    RenameStatus::Conflict
                } else if new_name == old_name {
                    RenameStatus::Unchanged
                } else if to.exists() && !same_file(from, &to) {
                    RenameStatus::Conflict
                } else {
                    RenameStatus::Pending
                };
                RenamePlan {
                    from: from.clone(),
                    to,
                    status,
                }
            })
            .collect()
    }
}

fn invalid_name_reason(name: &str) -> Option<&'static str> {
    if name.is_empty() {
        Some("empty name")
    } else if name == "." || name == ".." {
        Some("reserved name")
    } else if name.contains('/') || name.contains('\\') {
        Some("name contains a path separator")
    } else {
        None
    }
}

/* Case-only renames on case-insensitive filesystems report the target as existing. */
fn same_file(a: &Path, b: &Path) -> bool {
    match (fs::canonicalize(a), fs::canonicalize(b)) {
        (Ok(x), Ok(y)) => x == y,
        _ => false,
    }
}

/*
 * Executes a preview. Returns the number of files renamed; refuses to touch
 * anything if the preview contains conflicts or invalid names.
 */
pub fn apply(plans: &mut [RenamePlan]) -> Result<usize> {
    let blocking = plans
        .iter()
        .filter(|p| matches!(p.status, RenameStatus::Conflict | RenameStatus::Invalid(_)))
        .count();
    if blocking > 0 {
        log::warn!("RenameEngine: Refusing to apply, {blocking} plan(s) are blocked.");
        return Err(RenameError::Conflicts(blocking));
    }

    let mut renamed = 0;
    for plan in plans.iter_mut() {
        if plan.status != RenameStatus::Pending {
            continue;
        }
        match fs::rename(&plan.from, &plan.to) {
            Ok(()) => {
                log::debug!("RenameEngine: {:?} -> {:?}", plan.from, plan.to);
                plan.status = RenameStatus::Done;
                renamed += 1;
            }
            Err(err) => {
                log::warn!("RenameEngine: Failed to rename {:?}: {err}", plan.from);
                plan.status = RenameStatus::Failed(err.to_string());
            }
        }
    }
    log::info!("RenameEngine: Renamed {renamed} of {} files.", plans.len());
    Ok(renamed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::File;
    use tempfile::tempdir;
    use time::macros::date;

    fn replace_rules(find: &str, replace: &str, use_regex: bool) -> RenameRules {
        RenameRules {
            mode: RenameMode::Replace {
                find: find.to_string(),
                replace: replace.to_string(),
                use_regex,
                prefix: String::new(),
                suffix: String::new(),
            },
            case: CaseMode::Keep,
            ext_case: ExtCase::Keep,
        }
    }

    #[test]
    fn test_split_extension_matches_splitext() {
        assert_eq!(split_extension("photo.JPG"), ("photo", ".JPG"));
        assert_eq!(split_extension("archive.tar.gz"), ("archive.tar", ".gz"));
        assert_eq!(split_extension(".bashrc"), (".bashrc", ""));
        assert_eq!(split_extension("README"), ("README", ""));
        assert_eq!(split_extension(".config.toml"), (".config", ".toml"));
    }

    #[test]
    fn test_title_case() {
        assert_eq!(title_case("hello_world-2x"), "Hello_World-2X");
        assert_eq!(title_case("ALL CAPS"), "All Caps");
    }

    #[test]
    fn test_template_mode_with_seq_old_and_date() {
        let rules = RenameRules {
            mode: RenameMode::Template {
                template: "{date}_{old}_{seq}".to_string(),
                seq_start: 7,
                seq_padding: 3,
            },
            case: CaseMode::Keep,
            ext_case: ExtCase::Lower,
        };
        let engine = RenameEngine::compile(rules)
            .unwrap()
            .with_date(date!(2024 - 03 - 09));

        assert_eq!(engine.rename_one("Trip.JPG", 0), "20240309_Trip_007.jpg");
        assert_eq!(engine.rename_one("Trip.JPG", 5), "20240309_Trip_012.jpg");
    }

    #[test]
    fn test_replace_mode_plain_and_regex() {
        let plain = RenameEngine::compile(replace_rules("draft", "final", false)).unwrap();
        assert_eq!(plain.rename_one("draft_draft.txt", 0), "final_final.txt");

        let regex = RenameEngine::compile(replace_rules(r"(\d+)", "n$1", true)).unwrap();
        assert_eq!(regex.rename_one("img12_v3.png", 0), "imgn12_vn3.png");
    }

    #[test]
    fn test_prefix_suffix_and_case_modes() {
        let rules = RenameRules {
            mode: RenameMode::Replace {
                find: String::new(),
                replace: String::new(),
                use_regex: false,
                prefix: "new ".to_string(),
                suffix: " copy".to_string(),
            },
            case: CaseMode::Title,
            ext_case: ExtCase::Upper,
        };
        let engine = RenameEngine::compile(rules).unwrap();

        assert_eq!(engine.rename_one("my file.md", 0), "New My File Copy.MD");
    }

    #[test]
    fn test_bad_regex_is_rejected_before_any_work() {
        let result = RenameEngine::compile(replace_rules("([unclosed", "x", true));

        assert!(matches!(result, Err(RenameError::InvalidPattern(_))));
    }

    #[test]
    fn test_preview_marks_later_duplicates_as_conflicts() {
        // Arrange
        let dir = tempdir().unwrap();
        let files: Vec<PathBuf> = ["a1.txt", "a2.txt", "b.txt"]
            .iter()
            .map(|n| dir.path().join(n))
            .collect();
        for f in &files {
            File::create(f).unwrap();
        }
        let engine = RenameEngine::compile(replace_rules(r"\d", "", true)).unwrap();

        // Act
        let plans = engine.preview(&files);

        // Assert
        assert_eq!(plans[0].status, RenameStatus::Pending);
        assert_eq!(plans[0].new_name(), "a.txt");
        assert_eq!(plans[1].status, RenameStatus::Conflict);
        assert_eq!(plans[2].status, RenameStatus::Unchanged);
    }

    #[test]
    fn test_apply_refuses_conflicting_batch_without_touching_files() {
        let dir = tempdir().unwrap();
        let files: Vec<PathBuf> = ["x1.txt", "x2.txt"].iter().map(|n| dir.path().join(n)).collect();
        for f in &files {
            File::create(f).unwrap();
        }
        let engine = RenameEngine::compile(replace_rules(r"\d", "", true)).unwrap();
        let mut plans = engine.preview(&files);

        let result = apply(&mut plans);

        assert!(matches!(result, Err(RenameError::Conflicts(1))));
        assert!(files.iter().all(|f| f.exists()));
        assert!(!dir.path().join("x.txt").exists());
    }

    #[test]
    fn test_existing_target_outside_batch_is_a_conflict() {
        let dir = tempdir().unwrap();
        File::create(dir.path().join("old.txt")).unwrap();
        File::create(dir.path().join("new.txt")).unwrap();
        let engine = RenameEngine::compile(replace_rules("old", "new", false)).unwrap();

        let plans = engine.preview(&[dir.path().join("old.txt")]);

        assert_eq!(plans[0].status, RenameStatus::Conflict);
    }

    #[test]
    fn test_apply_renames_and_records_per_file_status() {
        // Arrange
        let dir = tempdir().unwrap();
        let present = dir.path().join("one.txt");
        let missing = dir.path().join("two.txt");
        File::create(&present).unwrap();
        let engine = RenameEngine::compile(RenameRules::default()).unwrap();
        let mut plans = engine.preview(&[present.clone(), missing.clone()]);

        // Act
        let renamed = apply(&mut plans).unwrap();

        // Assert
        assert_eq!(renamed, 1);
        assert_eq!(plans[0].status, RenameStatus::Done);
        assert!(dir.path().join("one_001.txt").is_file());
        assert!(!present.exists());
        assert!(matches!(plans[1].status, RenameStatus::Failed(_)));
    }

    #[test]
    fn test_empty_result_is_invalid() {
        let dir = tempdir().unwrap();
        let file = dir.path().join("abc");
        File::create(&file).unwrap();
        let engine = RenameEngine::compile(replace_rules("abc", "", false)).unwrap();

        let mut plans = engine.preview(&[file.clone()]);

        assert!(matches!(plans[0].status, RenameStatus::Invalid(_)));
        assert!(apply(&mut plans).is_err());
        assert!(file.exists());
    }
}
