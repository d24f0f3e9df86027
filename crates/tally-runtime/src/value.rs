//! Runtime values

use std::fmt;

/// A tally script value
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Number(f64),
    String(String),
    Bool(bool),
    Null,
}

impl Value {
    /// Type name for error messages
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Number(_) => "number",
            Value::String(_) => "string",
            Value::Bool(_) => "bool",
            Value::Null => "null",
        }
    }

    /// `false` and `null` are falsy; everything else is truthy
    pub fn is_truthy(&self) -> bool {
        !matches!(self, Value::Bool(false) | Value::Null)
    }

    /// Render the value the way it would appear in source, quoting strings
    pub fn inspect(&self) -> String {
        match self {
            Value::String(s) => format!("{:?}", s),
            other => other.to_string(),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Number(n) if n.fract() == 0.0 && n.is_finite() => write!(f, "{}", *n as i64),
            Value::Number(n) => write!(f, "{}", n),
            Value::String(s) => write!(f, "{}", s),
            Value::Bool(b) => write!(f, "{}", b),
            Value::Null => write!(f, "null"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(Value::Number(4.0), "4")]
    #[case(Value::Number(2.5), "2.5")]
    #[case(Value::Bool(true), "true")]
    #[case(Value::Null, "null")]
    #[case(Value::String("hi".to_string()), "hi")]
    fn test_display(#[case] value: Value, #[case] expected: &str) {
        assert_eq!(value.to_string(), expected);
    }

    #[test]
    fn test_inspect_quotes_strings() {
        assert_eq!(Value::String("a b".to_string()).inspect(), "\"a b\"");
        assert_eq!(Value::Number(1.0).inspect(), "1");
    }

    #[test]
    fn test_truthiness() {
        assert!(!Value::Bool(false).is_truthy());
        assert!(!Value::Null.is_truthy());
        assert!(Value::Number(0.0).is_truthy());
        assert!(Value::String(String::new()).is_truthy());
    }
}
