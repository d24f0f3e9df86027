//! Error types for parsing and executing test scripts

use crate::span::Span;
use thiserror::Error;

/// A lexing or parsing error
#[derive(Error, Debug, Clone, PartialEq)]
#[error("line {}: {message}", span.line)]
pub struct SyntaxError {
    /// What went wrong
    pub message: String,
    /// Where it went wrong
    pub span: Span,
}

impl SyntaxError {
    pub fn new(message: impl Into<String>, span: Span) -> Self {
        Self {
            message: message.into(),
            span,
        }
    }
}

/// An error raised while executing a test function
///
/// `Assertion` is the only variant that represents a test *failure*; every
/// other variant is an unhandled error.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RuntimeError {
    /// An assertion builtin did not hold
    #[error("{message}")]
    Assertion { message: String, span: Span },
    /// Explicit `raise(msg)`
    #[error("{message}")]
    Raised { message: String, span: Span },
    /// Undefined variable
    #[error("undefined variable '{name}'")]
    UndefinedVariable { name: String, span: Span },
    /// Unknown function
    #[error("undefined function '{name}'")]
    UnknownFunction { name: String, span: Span },
    /// Type error
    #[error("{msg}")]
    TypeError { msg: String, span: Span },
    /// Division by zero
    #[error("division by zero")]
    DivideByZero { span: Span },
    /// Wrong number of arguments
    #[error("{name} expects {expected} argument(s), got {got}")]
    Arity {
        name: String,
        expected: String,
        got: usize,
        span: Span,
    },
    /// Call depth exceeded
    #[error("call depth exceeded")]
    StackOverflow { span: Span },
}

impl RuntimeError {
    /// Source location of the failing assertion or raise
    pub fn span(&self) -> Span {
        match self {
            RuntimeError::Assertion { span, .. }
            | RuntimeError::Raised { span, .. }
            | RuntimeError::UndefinedVariable { span, .. }
            | RuntimeError::UnknownFunction { span, .. }
            | RuntimeError::TypeError { span, .. }
            | RuntimeError::DivideByZero { span }
            | RuntimeError::Arity { span, .. }
            | RuntimeError::StackOverflow { span } => *span,
        }
    }

    /// Check if this error is an assertion failure (as opposed to an unhandled error)
    pub fn is_assertion(&self) -> bool {
        matches!(self, RuntimeError::Assertion { .. })
    }

    /// Short name of the error class, used when reporting errored tests
    pub fn kind_name(&self) -> &'static str {
        match self {
            RuntimeError::Assertion { .. } => "AssertionFailed",
            RuntimeError::Raised { .. } => "Raised",
            RuntimeError::UndefinedVariable { .. } => "UndefinedVariable",
            RuntimeError::UnknownFunction { .. } => "UnknownFunction",
            RuntimeError::TypeError { .. } => "TypeError",
            RuntimeError::DivideByZero { .. } => "DivideByZero",
            RuntimeError::Arity { .. } => "ArityError",
            RuntimeError::StackOverflow { .. } => "StackOverflow",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_assertion_is_failure() {
        let err = RuntimeError::Assertion {
            message: "wups!".to_string(),
            span: Span::new(6, 5),
        };
        assert!(err.is_assertion());
        assert_eq!(err.span().line, 6);
        assert_eq!(err.to_string(), "wups!");
    }

    #[test]
    fn test_raise_is_error() {
        let err = RuntimeError::Raised {
            message: "boom".to_string(),
            span: Span::new(2, 1),
        };
        assert!(!err.is_assertion());
        assert_eq!(err.kind_name(), "Raised");
    }

    #[test]
    fn test_syntax_error_display() {
        let err = SyntaxError::new("expected ';'", Span::new(3, 9));
        assert_eq!(err.to_string(), "line 3: expected ';'");
    }
}
