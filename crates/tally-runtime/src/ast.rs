//! Abstract Syntax Tree for tally scripts

use crate::span::Span;
use crate::value::Value;

/// A parsed test script: a flat list of function declarations
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Program {
    pub functions: Vec<FunctionDecl>,
}

impl Program {
    /// Find a function by name
    pub fn function(&self, name: &str) -> Option<&FunctionDecl> {
        self.functions.iter().find(|f| f.name == name)
    }
}

/// Function declaration
#[derive(Debug, Clone, PartialEq)]
pub struct FunctionDecl {
    pub name: String,
    pub params: Vec<String>,
    pub body: Block,
    /// Location of the `fn` keyword
    pub span: Span,
    /// Line of the closing brace
    pub end_line: u32,
}

impl FunctionDecl {
    /// Whether this function is a test case (`test_` prefix, no parameters)
    pub fn is_test(&self) -> bool {
        self.name.starts_with("test_") && self.params.is_empty()
    }
}

/// Braced statement list
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Block {
    pub statements: Vec<Stmt>,
}

/// Statement
#[derive(Debug, Clone, PartialEq)]
pub enum Stmt {
    /// `let name = value;`
    Let {
        name: String,
        value: Expr,
        span: Span,
    },
    /// `expr;`
    Expr(Expr),
    /// `if cond { ... } else { ... }`
    If {
        cond: Expr,
        then_block: Block,
        else_block: Option<Block>,
        span: Span,
    },
    /// `return;` or `return value;`
    Return { value: Option<Expr>, span: Span },
}

/// Expression
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Literal(Value, Span),
    Identifier(String, Span),
    Unary {
        op: UnaryOp,
        operand: Box<Expr>,
        span: Span,
    },
    Binary {
        op: BinaryOp,
        left: Box<Expr>,
        right: Box<Expr>,
        span: Span,
    },
    Call {
        callee: String,
        args: Vec<Expr>,
        span: Span,
    },
}

impl Expr {
    pub fn span(&self) -> Span {
        match self {
            Expr::Literal(_, span) | Expr::Identifier(_, span) => *span,
            Expr::Unary { span, .. } | Expr::Binary { span, .. } | Expr::Call { span, .. } => {
                *span
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    Not,
    Negate,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    And,
    Or,
}
