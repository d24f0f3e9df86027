//! Tree-walking interpreter
//!
//! Executes one function of a [`Program`] at a time. Builtins cover output
//! (`print`) and the assertion family; any other call resolves to a function
//! declared in the same program.
//!
//! ## Assertion counting
//!
//! Every assertion builtin bumps the counter as soon as it is called, before
//! its condition is checked, so the assertion that fails a test is counted.

use crate::ast::*;
use crate::error::RuntimeError;
use crate::span::Span;
use crate::value::Value;
use std::collections::HashMap;
use std::io::Write;

/// Maximum nesting of helper calls before reporting an overflow
const MAX_CALL_DEPTH: usize = 128;

/// Outcome of executing a statement
enum Flow {
    Normal,
    Return(Value),
}

/// Interpreter state for a single test execution
pub struct Interpreter<'a> {
    program: &'a Program,
    out: &'a mut dyn Write,
    /// One variable scope per active call
    frames: Vec<HashMap<String, Value>>,
    assertions: usize,
}

impl<'a> Interpreter<'a> {
    /// Create an interpreter over `program`, writing `print` output to `out`
    pub fn new(program: &'a Program, out: &'a mut dyn Write) -> Self {
        Self {
            program,
            out,
            frames: Vec::new(),
            assertions: 0,
        }
    }

    /// Number of assertions made so far
    pub fn assertions(&self) -> usize {
        self.assertions
    }

    /// Call a function with arguments and return its result
    pub fn call_function(
        &mut self,
        func: &FunctionDecl,
        args: Vec<Value>,
        span: Span,
    ) -> Result<Value, RuntimeError> {
        if args.len() != func.params.len() {
            return Err(RuntimeError::Arity {
                name: func.name.clone(),
                expected: func.params.len().to_string(),
                got: args.len(),
                span,
            });
        }
        if self.frames.len() >= MAX_CALL_DEPTH {
            return Err(RuntimeError::StackOverflow { span });
        }

        let frame = func.params.iter().cloned().zip(args).collect();
        self.frames.push(frame);
        let result = self.execute_block(&func.body);
        self.frames.pop();

        match result? {
            Flow::Return(value) => Ok(value),
            Flow::Normal => Ok(Value::Null),
        }
    }

    // === Statements ===

    fn execute_block(&mut self, block: &Block) -> Result<Flow, RuntimeError> {
        for stmt in &block.statements {
            if let Flow::Return(value) = self.execute(stmt)? {
                return Ok(Flow::Return(value));
            }
        }
        Ok(Flow::Normal)
    }

    fn execute(&mut self, stmt: &Stmt) -> Result<Flow, RuntimeError> {
        match stmt {
            Stmt::Let { name, value, .. } => {
                let value = self.evaluate(value)?;
                self.current_frame().insert(name.clone(), value);
                Ok(Flow::Normal)
            }
            Stmt::Expr(expr) => {
                self.evaluate(expr)?;
                Ok(Flow::Normal)
            }
            Stmt::If {
                cond,
                then_block,
                else_block,
                ..
            } => {
                if self.evaluate(cond)?.is_truthy() {
                    self.execute_block(then_block)
                } else if let Some(else_block) = else_block {
                    self.execute_block(else_block)
                } else {
                    Ok(Flow::Normal)
                }
            }
            Stmt::Return { value, .. } => {
                let value = match value {
                    Some(expr) => self.evaluate(expr)?,
                    None => Value::Null,
                };
                Ok(Flow::Return(value))
            }
        }
    }

    fn current_frame(&mut self) -> &mut HashMap<String, Value> {
        if self.frames.is_empty() {
            self.frames.push(HashMap::new());
        }
        let last = self.frames.len() - 1;
        &mut self.frames[last]
    }

    // === Expressions ===

    fn evaluate(&mut self, expr: &Expr) -> Result<Value, RuntimeError> {
        match expr {
            Expr::Literal(value, _) => Ok(value.clone()),
            Expr::Identifier(name, span) => self
                .frames
                .last()
                .and_then(|frame| frame.get(name))
                .cloned()
                .ok_or_else(|| RuntimeError::UndefinedVariable {
                    name: name.clone(),
                    span: *span,
                }),
            Expr::Unary { op, operand, span } => {
                let value = self.evaluate(operand)?;
                match (op, value) {
                    (UnaryOp::Not, v) => Ok(Value::Bool(!v.is_truthy())),
                    (UnaryOp::Negate, Value::Number(n)) => Ok(Value::Number(-n)),
                    (UnaryOp::Negate, other) => Err(RuntimeError::TypeError {
                        msg: format!("cannot negate {}", other.type_name()),
                        span: *span,
                    }),
                }
            }
            Expr::Binary {
                op: BinaryOp::And,
                left,
                right,
                ..
            } => {
                let left = self.evaluate(left)?;
                if !left.is_truthy() {
                    return Ok(left);
                }
                self.evaluate(right)
            }
            Expr::Binary {
                op: BinaryOp::Or,
                left,
                right,
                ..
            } => {
                let left = self.evaluate(left)?;
                if left.is_truthy() {
                    return Ok(left);
                }
                self.evaluate(right)
            }
            Expr::Binary {
                op,
                left,
                right,
                span,
            } => {
                let left = self.evaluate(left)?;
                let right = self.evaluate(right)?;
                binary(*op, left, right, *span)
            }
            Expr::Call { callee, args, span } => {
                let mut values = Vec::with_capacity(args.len());
                for arg in args {
                    values.push(self.evaluate(arg)?);
                }
                self.call(callee, values, *span)
            }
        }
    }

    fn call(&mut self, callee: &str, args: Vec<Value>, span: Span) -> Result<Value, RuntimeError> {
        match callee {
            "print" => {
                let line: Vec<String> = args.iter().map(|v| v.to_string()).collect();
                let _ = writeln!(self.out, "{}", line.join(" "));
                let _ = self.out.flush();
                Ok(Value::Null)
            }
            "assert" => {
                self.assertions += 1;
                check_arity(callee, &args, 1, 2, span)?;
                if args[0].is_truthy() {
                    return Ok(Value::Null);
                }
                let default = format!("Expected {} to be truthy.", args[0].inspect());
                Err(assertion(message_or(args.get(1), default), span))
            }
            "refute" => {
                self.assertions += 1;
                check_arity(callee, &args, 1, 2, span)?;
                if !args[0].is_truthy() {
                    return Ok(Value::Null);
                }
                let default = format!("Expected {} to not be truthy.", args[0].inspect());
                Err(assertion(message_or(args.get(1), default), span))
            }
            "assert_equal" => {
                self.assertions += 1;
                check_arity(callee, &args, 2, 3, span)?;
                if args[0] == args[1] {
                    return Ok(Value::Null);
                }
                let diff = format!(
                    "Expected: {}\n  Actual: {}",
                    args[0].inspect(),
                    args[1].inspect()
                );
                let message = match args.get(2) {
                    Some(msg) => format!("{}.\n{}", msg, diff),
                    None => diff,
                };
                Err(assertion(message, span))
            }
            "assert_not_equal" => {
                self.assertions += 1;
                check_arity(callee, &args, 2, 3, span)?;
                if args[0] != args[1] {
                    return Ok(Value::Null);
                }
                let default = format!(
                    "Expected {} to not be equal to {}.",
                    args[1].inspect(),
                    args[0].inspect()
                );
                Err(assertion(message_or(args.get(2), default), span))
            }
            "flunk" => {
                self.assertions += 1;
                check_arity(callee, &args, 0, 1, span)?;
                Err(assertion(message_or(args.first(), "Flunked.".to_string()), span))
            }
            "raise" => {
                check_arity(callee, &args, 1, 1, span)?;
                Err(RuntimeError::Raised {
                    message: args[0].to_string(),
                    span,
                })
            }
            name => {
                let program = self.program;
                let func = program
                    .function(name)
                    .ok_or_else(|| RuntimeError::UnknownFunction {
                        name: name.to_string(),
                        span,
                    })?;
                self.call_function(func, args, span)
            }
        }
    }
}

fn binary(op: BinaryOp, left: Value, right: Value, span: Span) -> Result<Value, RuntimeError> {
    use Value::*;

    match (op, left, right) {
        (BinaryOp::Eq, l, r) => Ok(Bool(l == r)),
        (BinaryOp::Ne, l, r) => Ok(Bool(l != r)),
        (BinaryOp::Add, Number(a), Number(b)) => Ok(Number(a + b)),
        (BinaryOp::Add, String(a), b) => Ok(String(format!("{}{}", a, b))),
        (BinaryOp::Sub, Number(a), Number(b)) => Ok(Number(a - b)),
        (BinaryOp::Mul, Number(a), Number(b)) => Ok(Number(a * b)),
        (BinaryOp::Div | BinaryOp::Mod, Number(_), Number(b)) if b == 0.0 => {
            Err(RuntimeError::DivideByZero { span })
        }
        (BinaryOp::Div, Number(a), Number(b)) => Ok(Number(a / b)),
        (BinaryOp::Mod, Number(a), Number(b)) => Ok(Number(a % b)),
        (BinaryOp::Lt, Number(a), Number(b)) => Ok(Bool(a < b)),
        (BinaryOp::Le, Number(a), Number(b)) => Ok(Bool(a <= b)),
        (BinaryOp::Gt, Number(a), Number(b)) => Ok(Bool(a > b)),
        (BinaryOp::Ge, Number(a), Number(b)) => Ok(Bool(a >= b)),
        (BinaryOp::Lt, String(a), String(b)) => Ok(Bool(a < b)),
        (BinaryOp::Gt, String(a), String(b)) => Ok(Bool(a > b)),
        (op, l, r) => Err(RuntimeError::TypeError {
            msg: format!(
                "unsupported operand types for {:?}: {} and {}",
                op,
                l.type_name(),
                r.type_name()
            ),
            span,
        }),
    }
}

fn assertion(message: String, span: Span) -> RuntimeError {
    RuntimeError::Assertion { message, span }
}

fn message_or(message: Option<&Value>, default: String) -> String {
    message.map(|m| m.to_string()).unwrap_or(default)
}

/// Verify arity is within `min..=max`
fn check_arity(
    name: &str,
    args: &[Value],
    min: usize,
    max: usize,
    span: Span,
) -> Result<(), RuntimeError> {
    if (min..=max).contains(&args.len()) {
        return Ok(());
    }
    let expected = if min == max {
        min.to_string()
    } else {
        format!("{}..{}", min, max)
    };
    Err(RuntimeError::Arity {
        name: name.to_string(),
        expected,
        got: args.len(),
        span,
    })
}
