//! Lexical analysis for hypr configuration text.
//!
//! The lexer turns source text into a flat list of [`Token`]s. It never fails:
//! characters it does not recognise are folded into identifier-like words.
//! Every token records its byte span so the parser can slice the original
//! source and keep the exact spacing of values.
//!
//! ```
//! use hyprconf::{tokenize, TokenKind};
//!
//! let tokens = tokenize("gaps_in = 5");
//! let kinds: Vec<_> = tokens.iter().map(|t| t.kind).collect();
//! assert_eq!(
//!     kinds,
//!     vec![TokenKind::Ident, TokenKind::Equals, TokenKind::Number, TokenKind::Eof]
//! );
//! ```

use std::iter::Peekable;
use std::str::CharIndices;

/// Prefix that turns a comment into a directive.
const DIRECTIVE_PREFIX: &str = "hyprlang ";

/// Characters that end a bare word or a `$name`.
fn is_delimiter(ch: char) -> bool {
    matches!(
        ch,
        ' ' | '\t' | '\r' | '\n' | '=' | ':' | '{' | '}' | '[' | ']' | '#' | ','
    )
}

/// Token categories produced by the lexer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    /// Identifier or plain value text
    Ident,
    /// `$name` (text holds the name without `$`)
    Variable,
    /// Integer or decimal literal
    Number,
    /// Quoted string (text holds the unescaped content)
    String,
    Equals,
    Colon,
    LBrace,
    RBrace,
    LBracket,
    RBracket,
    Comma,
    Newline,
    /// `# text` (text holds the comment body)
    Comment,
    /// `# hyprlang ...` (text holds everything after the prefix)
    Directive,
    /// `{{...}}` (text holds the inner expression)
    Arithmetic,
    Eof,
}

/// A single token with its position in the source
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub text: String,
    /// 1-based line of the first character
    pub line: usize,
    /// 1-based column of the first character
    pub column: usize,
    /// Byte offset of the first character
    pub start: usize,
    /// Byte offset one past the last character
    pub end: usize,
}

impl Token {
    /// Whether this token ends a statement
    pub fn is_terminator(&self) -> bool {
        matches!(self.kind, TokenKind::Newline | TokenKind::Eof)
    }
}

/// Hand-written lexer over a source string.
pub struct Lexer<'src> {
    source: &'src str,
    chars: Peekable<CharIndices<'src>>,
    position: usize,
    line: usize,
    column: usize,
    tokens: Vec<Token>,
}

impl<'src> Lexer<'src> {
    pub fn new(source: &'src str) -> Self {
        Self {
            source,
            chars: source.char_indices().peekable(),
            position: 0,
            line: 1,
            column: 1,
            tokens: Vec::new(),
        }
    }

    fn peek(&mut self) -> Option<char> {
        self.chars.peek().map(|&(_, c)| c)
    }

    fn peek_nth(&self, n: usize) -> Option<char> {
        self.chars.clone().nth(n).map(|(_, c)| c)
    }

    fn advance(&mut self) -> Option<char> {
        let (pos, ch) = self.chars.next()?;
        self.position = pos + ch.len_utf8();
        if ch == '\n' {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }
        Some(ch)
    }

    fn skip_blanks(&mut self) {
        while matches!(self.peek(), Some(' ' | '\t' | '\r')) {
            self.advance();
        }
    }

    /// Consume characters up to (not including) a delimiter.
    fn read_word(&mut self) -> String {
        let mut word = String::new();
        while let Some(ch) = self.peek() {
            if is_delimiter(ch) {
                break;
            }
            word.push(ch);
            self.advance();
        }
        word
    }

    /// Consume characters up to (not including) the next newline.
    fn read_line_rest(&mut self) -> String {
        let mut rest = String::new();
        while let Some(ch) = self.peek() {
            if ch == '\n' {
                break;
            }
            rest.push(ch);
            self.advance();
        }
        rest
    }

    fn read_quoted(&mut self) -> String {
        let quote = self.advance().unwrap_or('"');
        let mut content = String::new();
        while let Some(ch) = self.peek() {
            if ch == quote || ch == '\n' {
                break;
            }
            if ch == '\\' && matches!(self.peek_nth(1), Some(next) if next == quote || next == '\\')
            {
                self.advance();
            }
            if let Some(ch) = self.advance() {
                content.push(ch);
            }
        }
        if self.peek() == Some(quote) {
            self.advance();
        }
        content
    }

    /// Read `{{ ... }}` with depth tracking; returns the inner expression.
    ///
    /// An unterminated block ends at the line end.
    fn read_arithmetic(&mut self) -> String {
        self.advance();
        self.advance();
        let mut expr = String::new();
        let mut depth = 1usize;
        while let Some(ch) = self.peek() {
            if ch == '\n' {
                break;
            }
            let next = self.peek_nth(1);
            if ch == '{' && next == Some('{') {
                depth += 1;
                expr.push_str("{{");
                self.advance();
                self.advance();
            } else if ch == '}' && next == Some('}') {
                depth -= 1;
                self.advance();
                self.advance();
                if depth == 0 {
                    break;
                }
                expr.push_str("}}");
            } else {
                expr.push(ch);
                self.advance();
            }
        }
        expr
    }

    fn push(&mut self, kind: TokenKind, text: String, start: usize, line: usize, column: usize) {
        self.tokens.push(Token {
            kind,
            text,
            line,
            column,
            start,
            end: self.position,
        });
    }

    /// Consume the whole source and return its tokens, terminated by `Eof`.
    pub fn tokenize(mut self) -> Vec<Token> {
        loop {
            self.skip_blanks();
            let Some(ch) = self.peek() else {
                break;
            };
            let (start, line, column) = (self.position_of_next(), self.line, self.column);

            match ch {
                '\n' => {
                    self.advance();
                    self.push(TokenKind::Newline, "\n".to_string(), start, line, column);
                }
                '#' => {
                    self.advance();
                    if self.peek() == Some('#') {
                        self.advance();
                        self.push(TokenKind::Ident, "#".to_string(), start, line, column);
                        continue;
                    }
                    self.skip_blanks();
                    let rest = self.read_line_rest();
                    match rest.strip_prefix(DIRECTIVE_PREFIX) {
                        Some(directive) => self.push(
                            TokenKind::Directive,
                            directive.trim().to_string(),
                            start,
                            line,
                            column,
                        ),
                        None => self.push(
                            TokenKind::Comment,
                            rest.trim_end().to_string(),
                            start,
                            line,
                            column,
                        ),
                    }
                }
                '$' => {
                    self.advance();
                    let name = self.read_word();
                    self.push(TokenKind::Variable, name, start, line, column);
                }
                '{' if self.peek_nth(1) == Some('{') => {
                    let expr = self.read_arithmetic();
                    self.push(TokenKind::Arithmetic, expr, start, line, column);
                }
                '=' | ':' | '{' | '}' | '[' | ']' | ',' => {
                    self.advance();
                    let kind = match ch {
                        '=' => TokenKind::Equals,
                        ':' => TokenKind::Colon,
                        '{' => TokenKind::LBrace,
                        '}' => TokenKind::RBrace,
                        '[' => TokenKind::LBracket,
                        ']' => TokenKind::RBracket,
                        _ => TokenKind::Comma,
                    };
                    self.push(kind, ch.to_string(), start, line, column);
                }
                '"' | '\'' => {
                    let content = self.read_quoted();
                    self.push(TokenKind::String, content, start, line, column);
                }
                _ => {
                    let word = self.read_word();
                    let kind = if is_number(&word) {
                        TokenKind::Number
                    } else {
                        TokenKind::Ident
                    };
                    self.push(kind, word, start, line, column);
                }
            }
        }

        let end = self.source.len();
        self.tokens.push(Token {
            kind: TokenKind::Eof,
            text: String::new(),
            line: self.line,
            column: self.column,
            start: end,
            end,
        });
        self.tokens
    }

    fn position_of_next(&mut self) -> usize {
        self.chars
            .peek()
            .map(|&(pos, _)| pos)
            .unwrap_or(self.source.len())
    }
}

/// Matches `-?\d+(\.\d+)?`.
fn is_number(word: &str) -> bool {
    let digits = word.strip_prefix('-').unwrap_or(word);
    let (int_part, frac_part) = match digits.split_once('.') {
        Some((int_part, frac_part)) => (int_part, Some(frac_part)),
        None => (digits, None),
    };
    let all_digits = |s: &str| !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit());
    all_digits(int_part) && frac_part.is_none_or(all_digits)
}

/// Tokenize a source string.
pub fn tokenize(source: &str) -> Vec<Token> {
    Lexer::new(source).tokenize()
}
