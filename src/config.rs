use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::document::Document;
use crate::error::{ConfigError, ParseResult};
use crate::include::VisitedFiles;
use crate::lexer::tokenize;
use crate::parser::{ParseOutcome, ParsePolicy, ParseReport, Parser};

/// Default limit on input and output size, in characters
pub const DEFAULT_MAX_SIZE: usize = 100_000;

/// Configuration options
#[derive(Debug, Clone)]
pub struct ConfigOptions {
    /// Collect diagnostics and fail when any are found
    pub strict: bool,

    /// Largest accepted input or produced output, in characters
    pub max_size: usize,

    /// Base directory for `source` statements in parsed strings
    pub base_dir: Option<PathBuf>,
}

impl Default for ConfigOptions {
    fn default() -> Self {
        Self {
            strict: false,
            max_size: DEFAULT_MAX_SIZE,
            base_dir: None,
        }
    }
}

impl ConfigOptions {
    fn policy(&self) -> ParsePolicy {
        if self.strict {
            ParsePolicy::Strict
        } else {
            ParsePolicy::Lenient
        }
    }
}

/// A parsed configuration together with where it came from
#[derive(Debug, Clone, Default)]
pub struct Config {
    document: Document,
    report: ParseReport,
    options: ConfigOptions,
    source_path: Option<PathBuf>,
}

impl Config {
    /// Create an empty configuration with default options
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty configuration with custom options
    pub fn with_options(options: ConfigOptions) -> Self {
        Self {
            options,
            ..Self::default()
        }
    }

    /// Parse a configuration string, replacing the current document
    pub fn parse(&mut self, input: &str) -> ParseResult<()> {
        check_size("<string>", input, self.options.max_size)?;
        let base_dir = match &self.options.base_dir {
            Some(dir) => dir.clone(),
            None => std::env::current_dir()?,
        };
        let mut visited = VisitedFiles::new();
        let outcome = Parser::new(tokenize(input), input, base_dir, &mut visited)
            .with_policy(self.options.policy())
            .parse();
        self.source_path = None;
        self.accept(outcome)
    }

    /// Parse a configuration file, replacing the current document.
    ///
    /// Relative `source` statements resolve against the file's directory.
    pub fn parse_file(&mut self, path: impl AsRef<Path>) -> ParseResult<()> {
        let path = path.as_ref();
        let input = fs::read_to_string(path)
            .map_err(|e| ConfigError::io(path.display().to_string(), e.to_string()))?;
        check_size(&path.display().to_string(), &input, self.options.max_size)?;
        let canonical = path
            .canonicalize()
            .map_err(|e| ConfigError::io(path.display().to_string(), e.to_string()))?;
        debug!(path = %canonical.display(), "loading config");

        let base_dir = canonical
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_default();
        let mut visited = VisitedFiles::new();
        visited.insert(canonical);

        let outcome = Parser::new(tokenize(&input), &input, base_dir, &mut visited)
            .with_policy(self.options.policy())
            .parse();
        self.source_path = Some(path.to_path_buf());
        self.accept(outcome)
    }

    fn accept(&mut self, outcome: ParseOutcome) -> ParseResult<()> {
        self.document = outcome.document;
        self.report = outcome.report;
        if self.options.strict && !self.report.diagnostics.is_empty() {
            return Err(ConfigError::multiple(self.report.diagnostics.clone()));
        }
        Ok(())
    }

    /// Resolved value at a colon path
    pub fn get(&self, path: &str) -> Option<String> {
        self.document.get(path)
    }

    /// Assign a value at a colon path
    pub fn set(&mut self, path: &str, value: &str) -> bool {
        self.document.set(path, value)
    }

    pub fn serialize(&self) -> String {
        self.document.serialize()
    }

    /// Write back to the file this configuration was parsed from
    pub fn save(&self) -> ParseResult<()> {
        let path = self
            .source_path
            .as_deref()
            .ok_or_else(|| ConfigError::custom("no source file to save to; use save_as"))?;
        self.save_as(path)
    }

    /// Write to `path`, refusing output larger than the size limit
    pub fn save_as(&self, path: impl AsRef<Path>) -> ParseResult<()> {
        write_document(&self.document, path.as_ref(), self.options.max_size)
    }

    pub fn document(&self) -> &Document {
        &self.document
    }

    pub fn document_mut(&mut self) -> &mut Document {
        &mut self.document
    }

    /// Report from the last parse
    pub fn report(&self) -> &ParseReport {
        &self.report
    }

    pub fn options(&self) -> &ConfigOptions {
        &self.options
    }

    /// File the configuration was parsed from, if any
    pub fn source_path(&self) -> Option<&Path> {
        self.source_path.as_deref()
    }

    /// Consume the configuration, keeping only the document
    pub fn into_document(self) -> Document {
        self.document
    }
}

fn check_size(path: &str, text: &str, limit: usize) -> ParseResult<()> {
    let actual = text.chars().count();
    if actual > limit {
        return Err(ConfigError::size_limit(path, limit, actual));
    }
    Ok(())
}

pub(crate) fn write_document(document: &Document, path: &Path, max_size: usize) -> ParseResult<()> {
    let output = document.serialize();
    check_size(&path.display().to_string(), &output, max_size)?;
    fs::write(path, output).map_err(|e| ConfigError::io(path.display().to_string(), e.to_string()))?;
    debug!(path = %path.display(), "saved config");
    Ok(())
}

/// Load and parse a file with default options
pub fn load(path: impl AsRef<Path>) -> ParseResult<Document> {
    let mut config = Config::new();
    config.parse_file(path)?;
    Ok(config.into_document())
}

/// Serialize a document to a file with default options
pub fn save(document: &Document, path: impl AsRef<Path>) -> ParseResult<()> {
    write_document(document, path.as_ref(), DEFAULT_MAX_SIZE)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_and_get() {
        let mut config = Config::new();
        config.parse("general {\n    border_size = 2\n}\n").unwrap();
        assert_eq!(config.get("general:border_size").as_deref(), Some("2"));
        assert!(config.report().is_clean());
        assert!(config.source_path().is_none());
    }

    #[test]
    fn test_strict_parse_fails_with_diagnostics() {
        let mut config = Config::with_options(ConfigOptions {
            strict: true,
            ..ConfigOptions::default()
        });
        let err = config.parse("key value\nok = 1\n").unwrap_err();
        assert!(matches!(err, ConfigError::Multiple { ref errors } if errors.len() == 1));
        // the document is still available
        assert_eq!(config.get("ok").as_deref(), Some("1"));
    }

    #[test]
    fn test_input_size_limit() {
        let mut config = Config::with_options(ConfigOptions {
            max_size: 8,
            ..ConfigOptions::default()
        });
        let err = config.parse("key = a long value\n").unwrap_err();
        assert!(matches!(err, ConfigError::SizeLimitExceeded { limit: 8, .. }));
    }

    #[test]
    fn test_save_without_source_path() {
        let config = Config::new();
        assert!(config.save().is_err());
    }

    #[test]
    fn test_parse_file_and_save() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("hyprland.conf");
        fs::write(&path, "# comment\ninput {\n  kb_layout = us\n}\n").unwrap();

        let mut config = Config::new();
        config.parse_file(&path).unwrap();
        assert!(config.set("input:kb_layout", "de"));
        config.save().unwrap();

        let written = fs::read_to_string(&path).unwrap();
        assert_eq!(written, "input {\n    kb_layout = de\n}\n");
    }

    #[test]
    fn test_load_missing_file() {
        let err = load("/definitely/not/here.conf").unwrap_err();
        assert!(matches!(err, ConfigError::IoError { .. }));
    }
}
