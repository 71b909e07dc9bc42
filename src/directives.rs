use std::fmt;

/// A `# hyprlang ...` comment directive
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Directive {
    /// `if [!]name`
    If { variable: String, negated: bool },
    /// `endif`
    EndIf,
    /// `noerror ...` (accepted, has no effect)
    NoError,
    /// Anything else, holding the full directive text
    Unknown(String),
}

impl Directive {
    /// Parse the text that follows `# hyprlang `.
    pub fn parse(text: &str) -> Self {
        let mut words = text.split_whitespace();
        match words.next() {
            Some("if") => {
                let target = words.next().unwrap_or("");
                let (variable, negated) = match target.strip_prefix('!') {
                    Some(name) => (name, true),
                    None => (target, false),
                };
                Directive::If {
                    variable: variable.to_string(),
                    negated,
                }
            }
            Some("endif") => Directive::EndIf,
            Some("noerror") => Directive::NoError,
            _ => Directive::Unknown(text.trim().to_string()),
        }
    }

    /// Whether this directive opens a conditional block
    pub fn opens_block(&self) -> bool {
        matches!(self, Directive::If { .. })
    }
}

impl fmt::Display for Directive {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Directive::If { variable, negated } => {
                write!(f, "if {}{}", if *negated { "!" } else { "" }, variable)
            }
            Directive::EndIf => f.write_str("endif"),
            Directive::NoError => f.write_str("noerror"),
            Directive::Unknown(text) => f.write_str(text),
        }
    }
}

/// Stack of active `if` conditions
#[derive(Debug, Clone, Default)]
pub struct ConditionalStack {
    conditions: Vec<bool>,
}

impl ConditionalStack {
    pub fn new() -> Self {
        Self::default()
    }

    /// Push the outcome of an `if` test
    pub fn push(&mut self, condition: bool) {
        self.conditions.push(condition);
    }

    /// Pop on `endif`; `None` when there was no open `if`
    pub fn pop(&mut self) -> Option<bool> {
        self.conditions.pop()
    }

    /// True when the innermost condition is false
    pub fn is_skipping(&self) -> bool {
        self.conditions.last() == Some(&false)
    }

    /// Number of unclosed `if` blocks
    pub fn depth(&self) -> usize {
        self.conditions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.conditions.is_empty()
    }
}

/// Evaluate an `if` test: a value is truthy when present and non-empty.
pub fn condition_holds(value: Option<&str>, negated: bool) -> bool {
    let truthy = value.is_some_and(|v| !v.is_empty());
    truthy != negated
}
