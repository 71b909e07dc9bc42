//! Recursive descent parser for hypr configuration files.
//!
//! The parser never aborts on malformed content. Statements it cannot make
//! sense of are skipped up to the end of their line and counted in the
//! [`ParseReport`]; with [`ParsePolicy::Strict`] each problem also becomes a
//! [`ConfigError::ParseError`] diagnostic.
//!
//! ```
//! use hyprconf::parse_str;
//!
//! let doc = parse_str("$gap = 4\ngeneral {\n    gaps_in = {{$gap * 2}}\n}\n");
//! assert_eq!(doc.get("general:gaps_in").as_deref(), Some("8"));
//! ```

use std::path::{Path, PathBuf};

use tracing::trace;

use crate::directives::{ConditionalStack, Directive, condition_holds};
use crate::document::{Category, Document, Line, PathSegment, find_or_create};
use crate::error::ConfigError;
use crate::include::{IncludeResolver, VisitedFiles};
use crate::lexer::{Token, TokenKind, tokenize};
use crate::variables::Value;

/// Deepest category nesting the parser descends into
pub const MAX_NESTING: usize = 256;

/// How the parser treats problems in the input
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ParsePolicy {
    /// Skip and count
    #[default]
    Lenient,
    /// Skip, count, and record a diagnostic for each problem
    Strict,
}

/// What the parser skipped or complained about
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ParseReport {
    pub skipped_statements: usize,
    /// Only filled under [`ParsePolicy::Strict`]
    pub diagnostics: Vec<ConfigError>,
}

impl ParseReport {
    pub fn is_clean(&self) -> bool {
        self.skipped_statements == 0 && self.diagnostics.is_empty()
    }

    /// Fold a sub-parser's report into this one
    pub fn absorb(&mut self, other: ParseReport) {
        self.skipped_statements += other.skipped_statements;
        self.diagnostics.extend(other.diagnostics);
    }
}

/// Document plus report from one parse
#[derive(Debug, Clone)]
pub struct ParseOutcome {
    pub document: Document,
    pub report: ParseReport,
}

/// Where the statements being parsed end up
enum Scope<'c> {
    Root,
    Category(&'c mut Category),
}

fn containers<'s>(
    document: &'s mut Document,
    scope: &'s mut Scope<'_>,
) -> (&'s mut Vec<Line>, &'s mut Vec<Category>) {
    match scope {
        Scope::Root => (&mut document.lines, &mut document.categories),
        Scope::Category(category) => (&mut category.lines, &mut category.subcategories),
    }
}

pub struct Parser<'a> {
    tokens: Vec<Token>,
    source: &'a str,
    pos: usize,
    base_dir: PathBuf,
    visited: &'a mut VisitedFiles,
    policy: ParsePolicy,
    document: Document,
    conditionals: ConditionalStack,
    report: ParseReport,
    depth: usize,
}

impl<'a> Parser<'a> {
    /// Create a parser over `tokens`.
    ///
    /// `source` is the text the tokens came from; pass `""` when it is not
    /// available and values are rebuilt from tokens instead. Relative
    /// `source =` patterns resolve against `base_dir`.
    pub fn new(
        mut tokens: Vec<Token>,
        source: &'a str,
        base_dir: impl Into<PathBuf>,
        visited: &'a mut VisitedFiles,
    ) -> Self {
        if tokens.last().is_none_or(|t| t.kind != TokenKind::Eof) {
            let end = source.len();
            tokens.push(Token {
                kind: TokenKind::Eof,
                text: String::new(),
                line: tokens.last().map_or(1, |t| t.line),
                column: 1,
                start: end,
                end,
            });
        }
        Self {
            tokens,
            source,
            pos: 0,
            base_dir: base_dir.into(),
            visited,
            policy: ParsePolicy::default(),
            document: Document::new(),
            conditionals: ConditionalStack::new(),
            report: ParseReport::default(),
            depth: 0,
        }
    }

    pub fn with_policy(mut self, policy: ParsePolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    /// Parse all tokens into a document.
    pub fn parse(mut self) -> ParseOutcome {
        self.parse_statements(&mut Scope::Root, false);

        if !self.conditionals.is_empty() {
            let token = self.current().clone();
            self.diagnose(
                &token,
                format!("{} unclosed 'if' directive(s)", self.conditionals.depth()),
            );
        }

        ParseOutcome {
            document: self.document,
            report: self.report,
        }
    }

    // Token management

    fn current(&self) -> &Token {
        // `new` guarantees a trailing Eof
        &self.tokens[self.pos.min(self.tokens.len() - 1)]
    }

    fn kind(&self) -> TokenKind {
        self.current().kind
    }

    fn advance(&mut self) -> Token {
        let token = self.current().clone();
        if token.kind != TokenKind::Eof {
            self.pos += 1;
        }
        token
    }

    fn skip_newlines(&mut self) {
        while self.kind() == TokenKind::Newline {
            self.advance();
        }
    }

    fn skip_to_newline(&mut self) {
        while !self.current().is_terminator() {
            self.advance();
        }
    }

    /// Kind of the first non-newline token at or after the cursor, with its index
    fn next_significant(&self) -> (usize, TokenKind) {
        let mut index = self.pos;
        while let Some(token) = self.tokens.get(index) {
            if token.kind != TokenKind::Newline {
                return (index, token.kind);
            }
            index += 1;
        }
        (self.tokens.len() - 1, TokenKind::Eof)
    }

    // Reporting

    fn diagnose(&mut self, token: &Token, message: impl Into<String>) {
        if self.policy == ParsePolicy::Strict {
            self.report
                .diagnostics
                .push(ConfigError::parse(token.line, token.column, message));
        }
    }

    /// Drop the rest of the current line and count it as skipped
    fn skip_statement(&mut self, token: &Token, reason: &str) {
        trace!(line = token.line, column = token.column, reason, "skipping statement");
        self.report.skipped_statements += 1;
        self.diagnose(token, reason);
        self.skip_to_newline();
    }

    // Statements

    fn parse_statements(&mut self, scope: &mut Scope<'_>, in_block: bool) {
        loop {
            self.skip_newlines();
            match self.kind() {
                TokenKind::Eof => return,
                _ if self.conditionals.is_skipping() => self.skip_conditional_block(),
                TokenKind::RBrace if in_block => return,
                _ => self.parse_statement(scope),
            }
        }
    }

    fn parse_statement(&mut self, scope: &mut Scope<'_>) {
        let token = self.current().clone();
        match token.kind {
            TokenKind::Comment => {
                self.advance();
            }
            TokenKind::Directive => {
                self.advance();
                self.handle_directive(&token);
            }
            TokenKind::Variable => self.parse_variable(),
            TokenKind::Ident => self.parse_assignment_or_category(scope),
            _ => self.skip_statement(&token, "unexpected token at start of statement"),
        }
    }

    fn handle_directive(&mut self, token: &Token) {
        match Directive::parse(&token.text) {
            Directive::If { variable, negated } => {
                let value = self.document.variable(&variable);
                self.conditionals
                    .push(condition_holds(value.as_deref(), negated));
            }
            Directive::EndIf => {
                if self.conditionals.pop().is_none() {
                    self.diagnose(token, "'endif' without matching 'if'");
                }
            }
            Directive::NoError => {}
            Directive::Unknown(text) => {
                self.diagnose(token, format!("unknown directive '{text}'"));
            }
        }
    }

    /// Skip tokens up to the `endif` matching the innermost false `if`.
    fn skip_conditional_block(&mut self) {
        let mut depth = 1usize;
        while self.kind() != TokenKind::Eof {
            let token = self.advance();
            if token.kind != TokenKind::Directive {
                continue;
            }
            match Directive::parse(&token.text) {
                directive if directive.opens_block() => depth += 1,
                Directive::EndIf => {
                    depth -= 1;
                    if depth == 0 {
                        self.conditionals.pop();
                        return;
                    }
                }
                _ => {}
            }
        }
    }

    fn parse_variable(&mut self) {
        let token = self.advance();
        if self.kind() != TokenKind::Equals {
            self.skip_statement(&token, "expected '=' after variable name");
            return;
        }
        self.advance();
        let value = self.parse_value();
        self.document.set_variable(token.text, value);
    }

    fn parse_path(&mut self) -> Vec<PathSegment> {
        let mut path = Vec::new();
        while self.kind() == TokenKind::Ident {
            let name = self.advance().text;
            let key = if self.kind() == TokenKind::LBracket {
                self.advance();
                self.parse_bracket_key()
            } else {
                None
            };
            path.push(PathSegment::new(name, key));

            if self.kind() != TokenKind::Colon {
                break;
            }
            self.advance();
        }
        path
    }

    /// Read the text between `[` and `]`; the `]` is consumed when present.
    fn parse_bracket_key(&mut self) -> Option<String> {
        let start = self.pos;
        while !matches!(self.kind(), TokenKind::RBracket) && !self.current().is_terminator() {
            self.advance();
        }
        let inner = &self.tokens[start..self.pos];
        let key = match inner {
            [] => None,
            [single] => Some(single.text.clone()),
            [first, .., last] => match self.source.get(first.start..last.end) {
                Some(text) if !self.source.is_empty() => Some(text.trim().to_string()),
                _ => Some(inner.iter().map(|t| t.text.as_str()).collect()),
            },
        };
        if self.kind() == TokenKind::RBracket {
            self.advance();
        }
        key
    }

    fn parse_assignment_or_category(&mut self, scope: &mut Scope<'_>) {
        let token = self.current().clone();
        let path = self.parse_path();
        let Some((last, intermediate)) = path.split_last() else {
            self.skip_statement(&token, "expected a key");
            return;
        };

        let (brace_index, next) = self.next_significant();
        if next == TokenKind::LBrace {
            self.pos = brace_index;
            self.parse_category_block(scope, intermediate, last);
            return;
        }

        if self.kind() != TokenKind::Equals {
            self.skip_statement(&token, "expected '=' or '{' after key");
            return;
        }
        self.advance();
        let value = self.parse_value();

        if path.len() == 1 && last.name == "source" {
            self.include(&value.raw);
            return;
        }

        let (lines, categories) = containers(&mut self.document, scope);
        let lines = match intermediate.split_first() {
            None => lines,
            Some((first, rest)) => {
                let mut category = find_or_create(categories, &first.name, first.key.as_deref());
                for segment in rest {
                    category = find_or_create(
                        &mut category.subcategories,
                        &segment.name,
                        segment.key.as_deref(),
                    );
                }
                &mut category.lines
            }
        };
        lines.push(Line::new(last.name.clone(), value));
    }

    fn parse_category_block(
        &mut self,
        scope: &mut Scope<'_>,
        intermediate: &[PathSegment],
        last: &PathSegment,
    ) {
        let open = self.advance();
        if self.depth >= MAX_NESTING {
            self.skip_block();
            self.report.skipped_statements += 1;
            self.diagnose(&open, format!("categories nested deeper than {MAX_NESTING}"));
            return;
        }

        let mut category = Category::new(last.name.clone(), last.key.clone());
        self.depth += 1;
        self.parse_statements(&mut Scope::Category(&mut category), true);
        self.depth -= 1;

        if self.kind() == TokenKind::RBrace {
            self.advance();
        } else {
            self.diagnose(&open, format!("unclosed category '{}'", last.name));
        }

        let (_, mut categories) = containers(&mut self.document, scope);
        for segment in intermediate {
            categories =
                &mut find_or_create(categories, &segment.name, segment.key.as_deref()).subcategories;
        }
        categories.push(category);
    }

    /// Skip past the `}` matching an already consumed `{`.
    fn skip_block(&mut self) {
        let mut depth = 1usize;
        while self.kind() != TokenKind::Eof {
            match self.advance().kind {
                TokenKind::LBrace => depth += 1,
                TokenKind::RBrace => {
                    depth -= 1;
                    if depth == 0 {
                        return;
                    }
                }
                _ => {}
            }
        }
    }

    /// Consume a value up to the end of the statement.
    ///
    /// With source text available the raw value is the exact source slice,
    /// so inner spacing survives; otherwise tokens are joined with spaces.
    fn parse_value(&mut self) -> Value {
        let start = self.pos;
        while !matches!(
            self.kind(),
            TokenKind::Newline
                | TokenKind::Eof
                | TokenKind::RBrace
                | TokenKind::Comment
                | TokenKind::Directive
        ) {
            self.advance();
        }

        let consumed = &self.tokens[start..self.pos];
        let sliced = match (consumed.first(), consumed.last()) {
            (Some(first), Some(last)) if !self.source.is_empty() => {
                self.source.get(first.start..last.end)
            }
            _ => None,
        };
        match sliced {
            Some(raw) => Value::parse(raw.trim()),
            None => Value::from_tokens(consumed),
        }
    }

    fn include(&mut self, pattern: &str) {
        let outcome =
            IncludeResolver::new(&self.base_dir, self.visited, self.policy).include(pattern);
        self.document.merge(outcome.document);
        self.report.absorb(outcome.report);
    }
}

/// Parse configuration text with a fresh visited set, resolving `source`
/// statements against the current directory.
pub fn parse_str(text: &str) -> Document {
    let base_dir = std::env::current_dir().unwrap_or_default();
    let mut visited = VisitedFiles::new();
    Parser::new(tokenize(text), text, base_dir, &mut visited)
        .parse()
        .document
}
