//! # hyprconf
//!
//! Parser, document model and rule migrator for Hyprland configuration files.
//!
//! The configuration language has key/value assignments, `$variables`,
//! `{{a op b}}` arithmetic, nested and keyed (`device[name]`) categories,
//! `# hyprlang if` conditionals and recursive `source = glob` inclusion.
//! Parsing produces a [`Document`] that can be queried and edited with
//! colon paths and written back with [`Document::serialize`].
//!
//! ## Features
//!
//! - **Lossless values**: each value keeps its exact source text and resolves
//!   variables and arithmetic lazily
//! - **Path addressing**: `get`/`set` with `category[key]:sub:name` paths
//! - **Includes**: `~`, relative and glob patterns, parsed once per load
//! - **Lenient by default**: malformed statements are skipped and counted;
//!   [`ConfigOptions::strict`] turns them into errors
//! - **Size limits** on load and save
//!
//! ## `hyprland` Feature
//!
//! On by default. Adds [`Version`] detection through `hyprctl version` and
//! the [`ConfigMigrator`], which rewrites `windowrulev2`, legacy `windowrule`
//! and `layerrule` lines into the `match:` syntax used since Hyprland 0.53.
//!
//! ## Example
//!
//! ```rust
//! use hyprconf::Config;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let mut config = Config::new();
//! config.parse(r#"
//! $SCALE = 2
//! $WIDTH = 800
//!
//! total_width = {{$WIDTH * $SCALE}}
//!
//! device[mouse] {
//!     sensitivity = -0.5
//! }
//! "#)?;
//!
//! assert_eq!(config.get("total_width").as_deref(), Some("1600"));
//! assert_eq!(config.get("device[mouse]:sensitivity").as_deref(), Some("-0.5"));
//!
//! config.set("general:gaps_in", "5");
//! assert!(config.serialize().contains("general {\n    gaps_in = 5\n}"));
//! # Ok(())
//! # }
//! ```

// Module declarations
mod config;
mod directives;
mod document;
mod error;
mod expressions;
mod grammar;
mod include;
mod lexer;
mod parser;
mod variables;

// Feature-gated modules
#[cfg(feature = "hyprland")]
mod migration;

#[cfg(feature = "hyprland")]
mod version;

// Public API exports
pub use config::{Config, ConfigOptions, DEFAULT_MAX_SIZE, load, save};
pub use document::{Category, Document, Line, PathSegment};
pub use error::{ConfigError, ParseResult};
pub use parser::{MAX_NESTING, ParseOutcome, ParsePolicy, ParseReport, Parser, parse_str};

// Re-export building blocks for advanced usage
pub use directives::{ConditionalStack, Directive};
pub use expressions::ArithmeticExpression;
pub use grammar::{Operator, parse_path};
pub use include::{IncludeResolver, VisitedFiles, resolve_pattern};
pub use lexer::{Lexer, Token, TokenKind, tokenize};
pub use variables::{Bindings, Value, ValuePart, VariableReference};

// Feature-gated exports
#[cfg(feature = "hyprland")]
pub use migration::{
    ConfigMigrator, MATCH_KEYS, MigrationResult, RuleSyntax, layer_rule, split_respecting_grouping,
    window_rule,
};

#[cfg(feature = "hyprland")]
pub use version::Version;

// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
