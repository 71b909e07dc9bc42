use crate::grammar::parse_arithmetic;
use crate::variables::Bindings;

/// Arithmetic expression from a `{{left op right}}` block
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArithmeticExpression {
    /// Inner text without the braces
    pub expr: String,
}

impl ArithmeticExpression {
    pub fn new(expr: impl Into<String>) -> Self {
        Self { expr: expr.into() }
    }

    /// Evaluate against a binding table.
    ///
    /// Operands are numbers, `$name` references or bare names present in
    /// `bindings`. Anything that does not evaluate to a finite number
    /// comes back as the trimmed expression text.
    pub fn evaluate(&self, bindings: &Bindings) -> String {
        let expr = self.expr.trim();
        let Some(operation) = parse_arithmetic(expr) else {
            return expr.to_string();
        };

        let left = resolve_operand(operation.left, bindings);
        let right = resolve_operand(operation.right, bindings);
        let (Some(left), Some(right)) = (parse_number(left), parse_number(right)) else {
            return expr.to_string();
        };

        let result = operation.operator.apply(left, right);
        if !result.is_finite() {
            return expr.to_string();
        }
        format_number(result)
    }
}

fn resolve_operand<'a>(operand: &'a str, bindings: &'a Bindings) -> &'a str {
    match operand.strip_prefix('$') {
        Some(name) => bindings.get(name).map(String::as_str).unwrap_or(operand),
        None => bindings.get(operand).map(String::as_str).unwrap_or(operand),
    }
}

fn parse_number(text: &str) -> Option<f64> {
    text.trim().parse::<f64>().ok()
}

/// Whole numbers print without a fractional part.
pub(crate) fn format_number(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < i64::MAX as f64 {
        (value as i64).to_string()
    } else {
        value.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn eval(expr: &str, bindings: &[(&str, &str)]) -> String {
        let bindings: Bindings = bindings
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        ArithmeticExpression::new(expr).evaluate(&bindings)
    }

    #[test]
    fn test_basic_operations() {
        assert_eq!(eval("5 + 1", &[]), "6");
        assert_eq!(eval("10 - 4", &[]), "6");
        assert_eq!(eval("3 * 4", &[]), "12");
        assert_eq!(eval("7 / 2", &[]), "3.5");
    }

    #[test]
    fn test_division_by_zero_is_zero() {
        assert_eq!(eval("4 / 0", &[]), "0");
    }

    #[test]
    fn test_whole_float_prints_as_integer() {
        assert_eq!(eval("2.5 * 2", &[]), "5");
        assert_eq!(eval("1.5 + 1", &[]), "2.5");
    }

    #[test]
    fn test_variable_operands() {
        assert_eq!(eval("$gap * 2", &[("gap", "5")]), "10");
        assert_eq!(eval("gap + 1", &[("gap", "5")]), "6");
    }

    #[test]
    fn test_unresolvable_returns_text() {
        assert_eq!(eval(" $missing + 1 ", &[]), "$missing + 1");
        assert_eq!(eval("rgba + 1", &[]), "rgba + 1");
        assert_eq!(eval("just text", &[]), "just text");
    }
}
