//! `source = pattern` resolution.
//!
//! Patterns may start with `~`, may be relative to the including file and
//! may contain glob wildcards. Every matched file is parsed by its own
//! sub-parser which shares the caller's [`VisitedFiles`], so a file is
//! never parsed twice during one top-level load and include cycles end
//! naturally.

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use glob::MatchOptions;
use tracing::{debug, warn};

use crate::document::Document;
use crate::lexer::tokenize;
use crate::parser::{ParseOutcome, ParsePolicy, ParseReport, Parser};

/// Canonical paths already parsed during one load
#[derive(Debug, Clone, Default)]
pub struct VisitedFiles {
    paths: HashSet<PathBuf>,
}

impl VisitedFiles {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a path; returns `false` if it was already present
    pub fn insert(&mut self, path: impl Into<PathBuf>) -> bool {
        self.paths.insert(path.into())
    }

    pub fn contains(&self, path: &Path) -> bool {
        self.paths.contains(path)
    }

    pub fn len(&self) -> usize {
        self.paths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Path> {
        self.paths.iter().map(PathBuf::as_path)
    }
}

const GLOB_OPTIONS: MatchOptions = MatchOptions {
    case_sensitive: true,
    require_literal_separator: true,
    require_literal_leading_dot: true,
};

fn expand_tilde(pattern: &str) -> PathBuf {
    if pattern == "~" || pattern.starts_with("~/") {
        if let Some(home) = dirs_next::home_dir() {
            return match pattern.strip_prefix("~/") {
                Some(rest) => home.join(rest),
                None => home,
            };
        }
    }
    PathBuf::from(pattern)
}

/// Expand a `source` pattern into a sorted list of matching paths.
///
/// A pattern matching nothing (or an invalid pattern) yields an empty list.
pub fn resolve_pattern(pattern: &str, base_dir: &Path) -> Vec<PathBuf> {
    let expanded = expand_tilde(pattern.trim());
    let full = if expanded.is_absolute() {
        expanded
    } else {
        base_dir.join(expanded)
    };

    let full = full.to_string_lossy();
    let entries = match glob::glob_with(&full, GLOB_OPTIONS) {
        Ok(entries) => entries,
        Err(err) => {
            warn!(pattern = %full, error = %err, "invalid source pattern");
            return Vec::new();
        }
    };

    let mut paths: Vec<PathBuf> = entries
        .filter_map(|entry| match entry {
            Ok(path) => Some(path),
            Err(err) => {
                debug!(error = %err, "unreadable path while expanding source pattern");
                None
            }
        })
        .collect();
    // plain string order, so `a-b/` sorts before `a/`
    paths.sort_by(|a, b| a.as_os_str().cmp(b.as_os_str()));
    paths
}

/// Parses the files behind a `source` statement.
pub struct IncludeResolver<'a> {
    base_dir: &'a Path,
    visited: &'a mut VisitedFiles,
    policy: ParsePolicy,
}

impl<'a> IncludeResolver<'a> {
    pub fn new(base_dir: &'a Path, visited: &'a mut VisitedFiles, policy: ParsePolicy) -> Self {
        Self {
            base_dir,
            visited,
            policy,
        }
    }

    /// Parse every file matched by `pattern` and merge them in order.
    ///
    /// Directories, vanished files, already visited files and unreadable
    /// files are skipped.
    pub fn include(&mut self, pattern: &str) -> ParseOutcome {
        let mut document = Document::new();
        let mut report = ParseReport::default();

        for path in resolve_pattern(pattern, self.base_dir) {
            if path.is_dir() {
                continue;
            }
            let canonical = match path.canonicalize() {
                Ok(canonical) => canonical,
                Err(err) => {
                    debug!(path = %path.display(), error = %err, "skipping vanished include");
                    continue;
                }
            };
            if !self.visited.insert(canonical.clone()) {
                debug!(path = %canonical.display(), "skipping already visited include");
                continue;
            }

            let text = match fs::read_to_string(&canonical) {
                Ok(text) => text,
                Err(err) => {
                    debug!(path = %canonical.display(), error = %err, "skipping unreadable include");
                    continue;
                }
            };

            debug!(path = %canonical.display(), "parsing included file");
            let base_dir = canonical
                .parent()
                .map(Path::to_path_buf)
                .unwrap_or_else(|| self.base_dir.to_path_buf());
            let outcome = Parser::new(tokenize(&text), &text, base_dir, self.visited)
                .with_policy(self.policy)
                .parse();

            document.merge(outcome.document);
            report.absorb(outcome.report);
        }

        ParseOutcome { document, report }
    }
}
