/// Result type alias for configuration operations
pub type ParseResult<T> = Result<T, ConfigError>;

/// Errors that can occur while loading, parsing and saving configuration files.
///
/// Only resource-level failures are fatal. Malformed content is skipped by the
/// parser and only shows up here as [`ConfigError::ParseError`] diagnostics
/// when strict parsing is enabled.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConfigError {
    /// Input or output exceeded the configured character limit
    #[error("config '{path}' is too large: {actual} chars (limit: {limit})")]
    SizeLimitExceeded {
        path: String,
        limit: usize,
        actual: usize,
    },

    /// Statement-level diagnostic collected in strict mode
    #[error("Parse error at line {line}, column {column}: {message}")]
    ParseError {
        line: usize,
        column: usize,
        message: String,
    },

    /// File I/O error
    #[error("I/O error for '{path}': {message}")]
    IoError { path: String, message: String },

    /// Custom error with message
    #[error("{message}")]
    Custom { message: String },

    /// Multiple errors collected together
    #[error("Multiple errors occurred:\n{}", format_multiple(.errors))]
    Multiple { errors: Vec<ConfigError> },
}

fn format_multiple(errors: &[ConfigError]) -> String {
    errors
        .iter()
        .enumerate()
        .map(|(i, err)| format!("  {}. {}", i + 1, err))
        .collect::<Vec<_>>()
        .join("\n")
}

impl ConfigError {
    /// Create a size limit error
    pub fn size_limit(path: impl Into<String>, limit: usize, actual: usize) -> Self {
        ConfigError::SizeLimitExceeded {
            path: path.into(),
            limit,
            actual,
        }
    }

    /// Create a parse error
    pub fn parse(line: usize, column: usize, message: impl Into<String>) -> Self {
        ConfigError::ParseError {
            line,
            column,
            message: message.into(),
        }
    }

    /// Create an I/O error
    pub fn io(path: impl Into<String>, message: impl Into<String>) -> Self {
        ConfigError::IoError {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Create a custom error
    pub fn custom(message: impl Into<String>) -> Self {
        ConfigError::Custom {
            message: message.into(),
        }
    }

    /// Combine multiple errors
    pub fn multiple(errors: Vec<ConfigError>) -> Self {
        ConfigError::Multiple { errors }
    }
}

impl From<std::io::Error> for ConfigError {
    fn from(err: std::io::Error) -> Self {
        ConfigError::Custom {
            message: err.to_string(),
        }
    }
}
