//! Tally Runtime - test script implementation
//!
//! This library provides everything needed to load and execute tally test scripts:
//! - Lexical analysis and parsing into a small AST
//! - A tree-walking interpreter with assertion builtins
//! - The [`Script`] entry point that exposes test functions with their line spans
//!
//! # Example
//!
//! ```
//! use tally_runtime::Script;
//!
//! let script = Script::parse("fn test_math() {\n    assert_equal(4, 2 + 2);\n}\n").unwrap();
//! let test = script.tests().next().unwrap();
//! assert_eq!((test.span.line, test.end_line), (1, 3));
//!
//! let mut out = Vec::new();
//! let execution = script.run(&test.name, &mut out);
//! assert!(execution.result.is_ok());
//! assert_eq!(execution.assertions, 1);
//! ```

pub mod ast;
pub mod error;
pub mod interpreter;
pub mod lexer;
pub mod parser;
pub mod script;
pub mod span;
pub mod token;
pub mod value;

pub use error::{RuntimeError, SyntaxError};
pub use interpreter::Interpreter;
pub use lexer::Lexer;
pub use parser::Parser;
pub use script::{Execution, Script};
pub use span::Span;
pub use token::{Token, TokenKind};
pub use value::Value;
