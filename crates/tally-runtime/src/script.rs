//! Script loading and test execution entry point

use crate::ast::{FunctionDecl, Program};
use crate::error::{RuntimeError, SyntaxError};
use crate::interpreter::Interpreter;
use crate::lexer::Lexer;
use crate::parser::Parser;
use std::io::Write;
use std::sync::Arc;

/// A parsed test script
///
/// Cloning is cheap: the program is shared.
#[derive(Debug, Clone)]
pub struct Script {
    program: Arc<Program>,
}

/// Result of executing one test function
#[derive(Debug, Clone, PartialEq)]
pub struct Execution {
    /// Assertions made, including the one that failed
    pub assertions: usize,
    /// `Ok` when the function completed without an assertion failure or error
    pub result: Result<(), RuntimeError>,
}

impl Script {
    /// Parse a script, failing with the first syntax error in source order
    pub fn parse(source: &str) -> Result<Self, SyntaxError> {
        let (tokens, lex_errors) = Lexer::new(source).tokenize();
        let (program, parse_errors) = Parser::new(tokens).parse();

        let mut errors: Vec<SyntaxError> = lex_errors.into_iter().chain(parse_errors).collect();
        errors.sort_by_key(|e| (e.span.line, e.span.column));
        if let Some(first) = errors.into_iter().next() {
            return Err(first);
        }

        tracing::trace!(functions = program.functions.len(), "parsed script");
        Ok(Self {
            program: Arc::new(program),
        })
    }

    /// All declared functions in source order
    pub fn functions(&self) -> &[FunctionDecl] {
        &self.program.functions
    }

    /// Test functions (`test_` prefix, no parameters) in source order
    pub fn tests(&self) -> impl Iterator<Item = &FunctionDecl> {
        self.program.functions.iter().filter(|f| f.is_test())
    }

    /// Execute the named function in a fresh interpreter
    pub fn run(&self, name: &str, out: &mut dyn Write) -> Execution {
        let Some(func) = self.program.function(name) else {
            return Execution {
                assertions: 0,
                result: Err(RuntimeError::UnknownFunction {
                    name: name.to_string(),
                    span: Default::default(),
                }),
            };
        };

        let mut interpreter = Interpreter::new(&self.program, out);
        let result = interpreter
            .call_function(func, Vec::new(), func.span)
            .map(|_| ());

        Execution {
            assertions: interpreter.assertions(),
            result,
        }
    }
}
