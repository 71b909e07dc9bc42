use std::collections::HashMap;

use crate::expressions::ArithmeticExpression;
use crate::lexer::{Token, TokenKind};

/// Variable name to raw value, as used for resolution
pub type Bindings = HashMap<String, String>;

/// Reference to a `$name` variable
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VariableReference {
    pub name: String,
}

impl VariableReference {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }

    /// Bound value, or `$name` when unbound
    pub fn resolve(&self, bindings: &Bindings) -> String {
        match bindings.get(&self.name) {
            Some(value) => value.clone(),
            None => format!("${}", self.name),
        }
    }
}

/// One piece of a decomposed value
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValuePart {
    Literal(String),
    Variable(VariableReference),
    Arithmetic(ArithmeticExpression),
}

/// A configuration value: the exact source text plus its decomposition.
///
/// `parts` is empty when the text has no `$name`, `{{...}}` or `##`
/// markers, in which case resolution returns `raw` untouched. `##` resolves
/// to a literal `#`.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Value {
    pub raw: String,
    pub parts: Vec<ValuePart>,
}

impl Value {
    /// Build a value by scanning `raw` for `$name`, `{{...}}` and `##` markers.
    pub fn parse(raw: impl Into<String>) -> Self {
        let raw = raw.into();
        let parts = decompose(&raw);
        Self { raw, parts }
    }

    /// Build a value from tokens alone, joining their text with single spaces.
    ///
    /// Used when the original source is not available, so inter-token
    /// spacing is not preserved.
    pub fn from_tokens(tokens: &[Token]) -> Self {
        let mut raw = String::new();
        let mut parts = Vec::new();
        let mut literal = String::new();
        let mut has_markers = false;

        for (index, token) in tokens.iter().enumerate() {
            if index > 0 {
                raw.push(' ');
                literal.push(' ');
            }
            match token.kind {
                TokenKind::Variable => {
                    has_markers = true;
                    raw.push('$');
                    raw.push_str(&token.text);
                    flush_literal(&mut literal, &mut parts);
                    parts.push(ValuePart::Variable(VariableReference::new(&token.text)));
                }
                TokenKind::Arithmetic => {
                    has_markers = true;
                    raw.push_str("{{");
                    raw.push_str(&token.text);
                    raw.push_str("}}");
                    flush_literal(&mut literal, &mut parts);
                    parts.push(ValuePart::Arithmetic(ArithmeticExpression::new(&token.text)));
                }
                // `##` lexes to a `#` ident spanning both characters
                TokenKind::Ident if token.text == "#" && token.end - token.start == 2 => {
                    has_markers = true;
                    raw.push_str("##");
                    literal.push('#');
                }
                _ => {
                    raw.push_str(&token.text);
                    literal.push_str(&token.text);
                }
            }
        }
        flush_literal(&mut literal, &mut parts);

        Self {
            raw,
            parts: if has_markers { parts } else { Vec::new() },
        }
    }

    /// Whether the value references variables or contains arithmetic
    pub fn is_dynamic(&self) -> bool {
        self.parts
            .iter()
            .any(|part| !matches!(part, ValuePart::Literal(_)))
    }

    /// Substitute variables and evaluate arithmetic.
    pub fn resolve(&self, bindings: &Bindings) -> String {
        if self.parts.is_empty() {
            return self.raw.clone();
        }
        self.parts
            .iter()
            .map(|part| match part {
                ValuePart::Literal(text) => text.clone(),
                ValuePart::Variable(reference) => reference.resolve(bindings),
                ValuePart::Arithmetic(expr) => expr.evaluate(bindings),
            })
            .collect()
    }
}

impl From<&str> for Value {
    fn from(raw: &str) -> Self {
        Value::parse(raw)
    }
}

impl From<String> for Value {
    fn from(raw: String) -> Self {
        Value::parse(raw)
    }
}

impl std::fmt::Display for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.raw)
    }
}

fn flush_literal(literal: &mut String, parts: &mut Vec<ValuePart>) {
    if !literal.is_empty() {
        parts.push(ValuePart::Literal(std::mem::take(literal)));
    }
}

fn is_word_char(ch: char) -> bool {
    ch.is_alphanumeric() || ch == '_'
}

/// Byte length of a `{{...}}` block starting at the head of `text`,
/// honouring nested `{{ }}` pairs.
fn arithmetic_len(text: &str) -> Option<usize> {
    let bytes = text.as_bytes();
    let mut depth = 0usize;
    let mut i = 0;
    while i + 1 < bytes.len() {
        match (bytes[i], bytes[i + 1]) {
            (b'{', b'{') => {
                depth += 1;
                i += 2;
            }
            (b'}', b'}') => {
                depth = depth.saturating_sub(1);
                i += 2;
                if depth == 0 {
                    return Some(i);
                }
            }
            _ => i += 1,
        }
    }
    None
}

fn decompose(raw: &str) -> Vec<ValuePart> {
    if !raw.contains('$') && !raw.contains("{{") && !raw.contains("##") {
        return Vec::new();
    }

    let mut parts = Vec::new();
    let mut literal = String::new();
    let mut has_markers = false;
    let mut rest = raw;

    while let Some(ch) = rest.chars().next() {
        if ch == '$' {
            let name_len: usize = rest[1..]
                .chars()
                .take_while(|&c| is_word_char(c))
                .map(char::len_utf8)
                .sum();
            if name_len > 0 {
                flush_literal(&mut literal, &mut parts);
                parts.push(ValuePart::Variable(VariableReference::new(
                    &rest[1..1 + name_len],
                )));
                has_markers = true;
                rest = &rest[1 + name_len..];
                continue;
            }
        } else if rest.starts_with("##") {
            literal.push('#');
            has_markers = true;
            rest = &rest[2..];
            continue;
        } else if rest.starts_with("{{") {
            if let Some(len) = arithmetic_len(rest) {
                flush_literal(&mut literal, &mut parts);
                parts.push(ValuePart::Arithmetic(ArithmeticExpression::new(
                    &rest[2..len - 2],
                )));
                has_markers = true;
                rest = &rest[len..];
                continue;
            }
        }
        literal.push(ch);
        rest = &rest[ch.len_utf8()..];
    }
    flush_literal(&mut literal, &mut parts);

    if has_markers { parts } else { Vec::new() }
}
