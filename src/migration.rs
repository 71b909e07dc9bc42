//! Rewrites legacy Hyprland rules into the `match:` syntax of 0.53+.
//!
//! Handled forms:
//! - `windowrulev2 = effect, class:foo, title:bar` and `windowrule` without
//!   `match:` become `windowrule = effect on, match:class foo, match:title bar`
//! - `layerrule = effect, namespace` becomes
//!   `layerrule = effect on, match:namespace namespace`
//! - `misc:new_window_takes_over_fullscreen` and `master:inherit_fullscreen`
//!   become `misc:on_focus_under_fullscreen`
//!
//! ```
//! use hyprconf::{parse_str, ConfigMigrator};
//!
//! let mut doc = parse_str("windowrulev2 = float, class:^(pavucontrol)$\n");
//! let result = ConfigMigrator::migrate(&mut doc);
//! assert_eq!(result.migrated_rules, 1);
//! assert_eq!(
//!     doc.lines[0].value.raw,
//!     "float on, match:class ^(pavucontrol)$"
//! );
//! ```

use std::fs;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use tracing::debug;

use crate::config::{Config, ConfigOptions};
use crate::document::{Document, Line};
use crate::error::{ConfigError, ParseResult};
use crate::expressions::format_number;
use crate::variables::Value;
use crate::version::Version;

/// Rule properties that turn into `match:` clauses
pub const MATCH_KEYS: &[&str] = &[
    "class",
    "title",
    "initialclass",
    "initialtitle",
    "floating",
    "xwayland",
    "pinned",
    "workspace",
    "fullscreen",
    "monitor",
    "address",
    "pid",
    "uid",
    "group",
];

const WINDOW_RULE: &str = "windowrule";
const WINDOW_RULE_V2: &str = "windowrulev2";
const LAYER_RULE: &str = "layerrule";
const FOCUS_UNDER_FULLSCREEN: &str = "on_focus_under_fullscreen";
const TAKES_OVER_FULLSCREEN: &str = "new_window_takes_over_fullscreen";
const INHERIT_FULLSCREEN: &str = "inherit_fullscreen";

/// Counts from one migration run
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct MigrationResult {
    pub migrated_rules: usize,
    pub renamed_options: usize,
    /// Backup written by [`ConfigMigrator::migrate_file`]
    pub backup_path: Option<PathBuf>,
}

impl MigrationResult {
    pub fn is_empty(&self) -> bool {
        self.migrated_rules == 0 && self.renamed_options == 0
    }
}

/// Which rule syntax to emit
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuleSyntax {
    /// `windowrulev2 = effect,matcher`
    Legacy,
    /// `windowrule = effect, match:...`
    Current,
}

impl RuleSyntax {
    /// Pick the syntax for a compositor version; unknown means legacy
    pub fn for_version(version: Option<Version>) -> Self {
        match version {
            Some(v) if v.supports_new_rule_syntax() => RuleSyntax::Current,
            _ => RuleSyntax::Legacy,
        }
    }
}

/// Split `s` on `delimiter` outside `()`, `[]` and `{}`.
///
/// Parts are trimmed. `max_splits == 0` means no limit.
pub fn split_respecting_grouping(s: &str, delimiter: char, max_splits: usize) -> Vec<String> {
    let mut parts = Vec::new();
    let mut current = String::new();
    let (mut parens, mut brackets, mut braces) = (0usize, 0usize, 0usize);
    let mut splits = 0;

    for c in s.chars() {
        if max_splits > 0 && splits >= max_splits {
            current.push(c);
            continue;
        }
        match c {
            '(' => parens += 1,
            ')' => parens = parens.saturating_sub(1),
            '[' => brackets += 1,
            ']' => brackets = brackets.saturating_sub(1),
            '{' => braces += 1,
            '}' => braces = braces.saturating_sub(1),
            _ => {}
        }
        if c == delimiter && parens == 0 && brackets == 0 && braces == 0 {
            parts.push(current.trim().to_string());
            current.clear();
            splits += 1;
        } else {
            current.push(c);
        }
    }
    parts.push(current.trim().to_string());
    parts
}

fn is_legacy_window_rule(line: &Line) -> bool {
    let key = line.key.to_lowercase();
    key == WINDOW_RULE_V2
        || (key == WINDOW_RULE && !line.value.raw.contains("match:") && !line.value.raw.is_empty())
}

fn is_legacy_layer_rule(line: &Line) -> bool {
    line.key.eq_ignore_ascii_case(LAYER_RULE)
        && !line.value.raw.contains("match:")
        && split_respecting_grouping(&line.value.raw, ',', 1).len() >= 2
}

fn is_takes_over_fullscreen(line: &Line) -> bool {
    line.key.to_lowercase().contains(TAKES_OVER_FULLSCREEN)
}

fn is_inherit_fullscreen(line: &Line) -> bool {
    line.key.eq_ignore_ascii_case("master:inherit_fullscreen")
}

/// Deprecated option lines living inside `misc { }` and `master { }`
fn category_deprecations(document: &Document) -> (usize, usize) {
    let count = |category: &str, key: &str| {
        document
            .categories
            .iter()
            .filter(|cat| cat.name.eq_ignore_ascii_case(category))
            .flat_map(|cat| &cat.lines)
            .filter(|line| line.key.eq_ignore_ascii_case(key))
            .count()
    };
    (
        count("misc", TAKES_OVER_FULLSCREEN),
        count("master", INHERIT_FULLSCREEN),
    )
}

/// `50%` becomes `+window_w*0.5`, a plain offset just gains a sign.
fn transform_cursor_offset(arg: &str, dimension: &str) -> String {
    if let Some(percent) = arg.strip_suffix('%') {
        if let Ok(value) = percent.parse::<f64>() {
            let fraction = value / 100.0;
            let sign = if fraction < 0.0 { '-' } else { '+' };
            return format!("{sign}{dimension}*{}", format_number(fraction.abs()));
        }
    }
    if arg.starts_with('-') || arg.starts_with('+') {
        arg.replace("+-", "-")
    } else {
        format!("+{arg}")
    }
}

fn transform_window_part(part: &str) -> String {
    if let Some((key, value)) = part.split_once(':') {
        let key = key.trim();
        let lower = key.to_lowercase();
        if MATCH_KEYS.contains(&lower.as_str()) {
            let key = if lower == "floating" { "float" } else { key };
            return format!("match:{key} {}", value.trim());
        }
    }

    let part = match part.strip_prefix("ignorealpha") {
        Some(rest) => format!("ignore_alpha{rest}"),
        None => part.to_string(),
    };

    if part.starts_with("move onscreen cursor") {
        let words: Vec<&str> = part.split_whitespace().collect();
        if words.len() >= 5 {
            let x = transform_cursor_offset(words[3], "window_w");
            let y = transform_cursor_offset(words[4], "window_h");
            return format!("move cursor_x{x} cursor_y{y}");
        }
    }

    match part.split_once(char::is_whitespace) {
        Some((head, rest)) => format!("{head} {}", rest.trim_start()),
        None => format!("{part} on"),
    }
}

fn migrate_window_rule(line: &mut Line) {
    let raw = &line.value.raw;
    let mut parts = split_respecting_grouping(raw, ',', 1);
    if parts.len() >= 2 {
        let remainder = parts.pop().unwrap_or_default();
        parts.extend(split_respecting_grouping(&remainder, ',', 0));
    }

    let mut rewritten: Vec<String> = parts
        .iter()
        .filter(|part| !part.is_empty())
        .map(|part| transform_window_part(part))
        .collect();

    if !rewritten.iter().any(|part| part.starts_with("match:")) {
        if let Some(last) = rewritten.pop() {
            let class = last.strip_suffix(" on").unwrap_or(&last);
            rewritten.push(format!("match:class {class}"));
        }
    }

    line.key = WINDOW_RULE.to_string();
    line.value = Value::parse(rewritten.join(", "));
}

fn migrate_layer_rule(line: &mut Line) {
    let parts = split_respecting_grouping(&line.value.raw, ',', 1);
    let (Some(effect), Some(namespace)) = (parts.first(), parts.get(1)) else {
        return;
    };

    let effect = match effect.as_str() {
        "stayfocused" => "stay_focused".to_string(),
        "ignorezero" => "ignore_alpha 0".to_string(),
        other => match other.strip_prefix("ignorealpha") {
            Some(rest) => format!("ignore_alpha{rest}"),
            None => other.to_string(),
        },
    };
    let effect = if effect.contains(' ') {
        effect
    } else {
        format!("{effect} on")
    };

    line.value = Value::parse(format!("{effect}, match:namespace {namespace}"));
}

/// Detects and rewrites legacy rule syntax
pub struct ConfigMigrator;

impl ConfigMigrator {
    /// Whether anything in the document uses legacy syntax
    pub fn needs_migration(document: &Document) -> bool {
        let legacy_line = document.lines.iter().any(|line| {
            is_legacy_window_rule(line)
                || is_legacy_layer_rule(line)
                || is_takes_over_fullscreen(line)
                || is_inherit_fullscreen(line)
        });
        let (misc, master) = category_deprecations(document);
        legacy_line || misc > 0 || master > 0
    }

    /// Rewrite every legacy rule and deprecated option in place.
    pub fn migrate(document: &mut Document) -> MigrationResult {
        let mut result = MigrationResult::default();

        for line in &mut document.lines {
            if is_legacy_window_rule(line) {
                migrate_window_rule(line);
                result.migrated_rules += 1;
            } else if is_legacy_layer_rule(line) {
                migrate_layer_rule(line);
                result.migrated_rules += 1;
            }

            if is_takes_over_fullscreen(line) || is_inherit_fullscreen(line) {
                line.key = format!("misc:{FOCUS_UNDER_FULLSCREEN}");
                result.renamed_options += 1;
            }
        }

        for category in &mut document.categories {
            if !category.name.eq_ignore_ascii_case("misc") {
                continue;
            }
            for line in &mut category.lines {
                if line.key.eq_ignore_ascii_case(TAKES_OVER_FULLSCREEN) {
                    line.key = FOCUS_UNDER_FULLSCREEN.to_string();
                    result.renamed_options += 1;
                }
            }
        }

        let mut inherited = Vec::new();
        for category in &mut document.categories {
            if !category.name.eq_ignore_ascii_case("master") {
                continue;
            }
            category.lines.retain(|line| {
                let deprecated = line.key.eq_ignore_ascii_case(INHERIT_FULLSCREEN);
                if deprecated {
                    inherited.push(line.value.raw.clone());
                }
                !deprecated
            });
        }
        for raw in inherited {
            document.set(&format!("misc:{FOCUS_UNDER_FULLSCREEN}"), &raw);
            result.renamed_options += 1;
        }

        debug!(
            migrated_rules = result.migrated_rules,
            renamed_options = result.renamed_options,
            "migrated document"
        );
        result
    }

    /// Human-readable list of pending changes, one bullet per kind
    pub fn summary(document: &Document) -> String {
        let window_rules = document
            .lines
            .iter()
            .filter(|l| is_legacy_window_rule(l))
            .count();
        let layer_rules = document
            .lines
            .iter()
            .filter(|l| is_legacy_layer_rule(l))
            .count();
        let (misc, master) = category_deprecations(document);
        let takes_over = misc > 0 || document.lines.iter().any(is_takes_over_fullscreen);
        let inherit = master > 0 || document.lines.iter().any(is_inherit_fullscreen);

        let mut bullets = Vec::new();
        if window_rules > 0 {
            bullets.push(format!(
                "• {window_rules} legacy window rules → windowrule (new syntax)"
            ));
        }
        if layer_rules > 0 {
            bullets.push(format!(
                "• {layer_rules} legacy layer rules → layerrule (new syntax)"
            ));
        }
        if takes_over {
            bullets.push(
                "• misc:new_window_takes_over_fullscreen → misc:on_focus_under_fullscreen"
                    .to_string(),
            );
        }
        if inherit {
            bullets.push(
                "• master:inherit_fullscreen → misc:on_focus_under_fullscreen".to_string(),
            );
        }
        bullets.join("\n")
    }

    /// Copy `path` to `<name>.bak.<unix seconds>` next to it
    pub fn backup(path: &Path) -> ParseResult<PathBuf> {
        let timestamp = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map_err(|e| ConfigError::custom(e.to_string()))?
            .as_secs();
        let name = path
            .file_name()
            .ok_or_else(|| ConfigError::io(path.display().to_string(), "path has no file name"))?;
        let backup = path.with_file_name(format!("{}.bak.{timestamp}", name.to_string_lossy()));

        fs::copy(path, &backup)
            .map_err(|e| ConfigError::io(path.display().to_string(), e.to_string()))?;
        debug!(path = %path.display(), backup = %backup.display(), "backed up config");
        Ok(backup)
    }

    /// Load, back up, migrate and save a config file.
    ///
    /// Nothing is written when the file needs no migration.
    pub fn migrate_file(
        path: impl AsRef<Path>,
        options: &ConfigOptions,
    ) -> ParseResult<MigrationResult> {
        let path = path.as_ref();
        let mut config = Config::with_options(options.clone());
        config.parse_file(path)?;

        if !Self::needs_migration(config.document()) {
            debug!(path = %path.display(), "config already uses current syntax");
            return Ok(MigrationResult::default());
        }

        let backup = Self::backup(path)?;
        let mut result = Self::migrate(config.document_mut());
        config.save_as(path)?;
        result.backup_path = Some(backup);
        Ok(result)
    }
}

/// Build a window rule line in the requested syntax
pub fn window_rule(effect: &str, matcher: &str, syntax: RuleSyntax) -> Line {
    let mut line = Line::new(WINDOW_RULE_V2, format!("{effect},{matcher}"));
    if syntax == RuleSyntax::Current {
        migrate_window_rule(&mut line);
    }
    line
}

/// Build a layer rule line in the requested syntax
pub fn layer_rule(effect: &str, namespace: &str, syntax: RuleSyntax) -> Line {
    let mut line = Line::new(LAYER_RULE, format!("{effect}, {namespace}"));
    if syntax == RuleSyntax::Current {
        migrate_layer_rule(&mut line);
    }
    line
}
