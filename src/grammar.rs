use pest::Parser;
use pest::error::LineColLocation;
use pest::iterators::Pair;
use pest_derive::Parser;

use crate::document::PathSegment;
use crate::error::{ConfigError, ParseResult};

#[derive(Parser)]
#[grammar = "hyprconf.pest"]
pub struct GrammarParser;

/// Binary arithmetic operator
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operator {
    Add,
    Sub,
    Mul,
    Div,
}

impl Operator {
    fn from_symbol(symbol: &str) -> Option<Self> {
        match symbol {
            "+" => Some(Operator::Add),
            "-" => Some(Operator::Sub),
            "*" => Some(Operator::Mul),
            "/" => Some(Operator::Div),
            _ => None,
        }
    }

    /// Apply the operator; division by zero yields zero
    pub fn apply(self, left: f64, right: f64) -> f64 {
        match self {
            Operator::Add => left + right,
            Operator::Sub => left - right,
            Operator::Mul => left * right,
            Operator::Div if right == 0.0 => 0.0,
            Operator::Div => left / right,
        }
    }
}

/// The operands and operator of a `left op right` expression
#[derive(Debug, Clone, PartialEq)]
pub struct BinaryOperation<'a> {
    pub left: &'a str,
    pub operator: Operator,
    pub right: &'a str,
}

impl From<pest::error::Error<Rule>> for ConfigError {
    fn from(err: pest::error::Error<Rule>) -> Self {
        let (line, column) = match err.line_col {
            LineColLocation::Pos(pos) => pos,
            LineColLocation::Span(start, _) => start,
        };
        ConfigError::parse(line, column, err.variant.message().into_owned())
    }
}

/// Parse a colon path such as `device[mouse]:sensitivity`.
///
/// Empty segments are dropped, so `a::b` and `:a:b` both yield two segments.
pub fn parse_path(path: &str) -> ParseResult<Vec<PathSegment>> {
    let pairs = GrammarParser::parse(Rule::path, path)?;

    let mut segments = Vec::new();
    for pair in pairs.flat_map(|p| p.into_inner()) {
        if pair.as_rule() == Rule::segment {
            segments.push(segment_from_pair(pair));
        }
    }
    Ok(segments)
}

fn segment_from_pair(pair: Pair<'_, Rule>) -> PathSegment {
    let mut name = String::new();
    let mut key = None;
    for inner in pair.into_inner() {
        match inner.as_rule() {
            Rule::name => name = inner.as_str().trim().to_string(),
            Rule::key => key = Some(inner.as_str().trim().to_string()),
            _ => {}
        }
    }
    PathSegment { name, key }
}

/// Split an arithmetic body into `left op right`.
///
/// Returns `None` when the text does not start with that shape.
pub fn parse_arithmetic(expr: &str) -> Option<BinaryOperation<'_>> {
    let pair = GrammarParser::parse(Rule::arithmetic, expr).ok()?.next()?;

    let mut inner = pair.into_inner();
    let left = inner.next()?.as_str();
    let operator = Operator::from_symbol(inner.next()?.as_str())?;
    let right = inner.next()?.as_str();
    Some(BinaryOperation {
        left,
        operator,
        right,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_simple_path() {
        let segments = parse_path("general:gaps_in").unwrap();
        assert_eq!(segments.len(), 2);
        assert_eq!(segments[0].name, "general");
        assert_eq!(segments[0].key, None);
        assert_eq!(segments[1].name, "gaps_in");
    }

    #[test]
    fn test_keyed_path() {
        let segments = parse_path("device[my-mouse]:sensitivity").unwrap();
        assert_eq!(segments[0].name, "device");
        assert_eq!(segments[0].key.as_deref(), Some("my-mouse"));
        assert_eq!(segments[1].name, "sensitivity");
    }

    #[test]
    fn test_empty_segments_dropped() {
        let segments = parse_path(":a::b:").unwrap();
        let names: Vec<_> = segments.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["a", "b"]);
        assert!(parse_path("").unwrap().is_empty());
    }

    #[test]
    fn test_unclosed_key_is_an_error() {
        assert!(parse_path("device[mouse:x").is_err());
    }

    #[test]
    fn test_arithmetic_split() {
        let op = parse_arithmetic(" $gap * 2 ").unwrap();
        assert_eq!(op.left, "$gap");
        assert_eq!(op.operator, Operator::Mul);
        assert_eq!(op.right, "2");

        let op = parse_arithmetic("10-3").unwrap();
        assert_eq!((op.left, op.right), ("10", "3"));
        assert_eq!(op.operator, Operator::Sub);

        let op = parse_arithmetic("-4 + -2").unwrap();
        assert_eq!((op.left, op.right), ("-4", "-2"));
    }

    #[test]
    fn test_arithmetic_no_match() {
        assert!(parse_arithmetic("hello").is_none());
        assert!(parse_arithmetic("").is_none());
    }

    #[test]
    fn test_division_by_zero() {
        assert_eq!(Operator::Div.apply(4.0, 0.0), 0.0);
        assert_eq!(Operator::Div.apply(9.0, 3.0), 3.0);
    }
}
