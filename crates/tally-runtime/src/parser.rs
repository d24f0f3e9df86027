//! Parsing (tokens to AST)
//!
//! Uses Pratt parsing for expressions and recursive descent for statements.
//! Errors are recorded and the parser resynchronizes at the next top-level
//! `fn`, so every broken function in a file is reported at once.

use crate::ast::*;
use crate::error::SyntaxError;
use crate::token::{Token, TokenKind};
use crate::value::Value;
use std::collections::HashMap;

/// Deepest expression or block nesting accepted before bailing out
const MAX_NESTING: usize = 256;

/// Parser state for building AST from tokens
pub struct Parser {
    tokens: Vec<Token>,
    current: usize,
    errors: Vec<SyntaxError>,
    depth: usize,
}

/// Operator precedence levels for Pratt parsing
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum Precedence {
    Lowest,
    Or,         // ||
    And,        // &&
    Equality,   // == !=
    Comparison, // < <= > >=
    Term,       // + -
    Factor,     // * / %
    Unary,      // ! -
}

impl Precedence {
    fn of(kind: TokenKind) -> Self {
        match kind {
            TokenKind::PipePipe => Precedence::Or,
            TokenKind::AmpAmp => Precedence::And,
            TokenKind::EqualEqual | TokenKind::BangEqual => Precedence::Equality,
            TokenKind::Less
            | TokenKind::LessEqual
            | TokenKind::Greater
            | TokenKind::GreaterEqual => Precedence::Comparison,
            TokenKind::Plus | TokenKind::Minus => Precedence::Term,
            TokenKind::Star | TokenKind::Slash | TokenKind::Percent => Precedence::Factor,
            _ => Precedence::Lowest,
        }
    }
}

type ParseResult<T> = Result<T, ()>;

impl Parser {
    /// Create a new parser for the given tokens
    pub fn new(tokens: Vec<Token>) -> Self {
        Self {
            tokens,
            current: 0,
            errors: Vec::new(),
            depth: 0,
        }
    }

    /// Parse tokens into a program
    pub fn parse(&mut self) -> (Program, Vec<SyntaxError>) {
        let mut functions = Vec::new();
        let mut declared: HashMap<String, u32> = HashMap::new();

        while !self.is_at_end() {
            match self.parse_function() {
                Ok(func) => {
                    // Calls resolve by name, so names must be unique
                    if let Some(first) = declared.get(&func.name) {
                        self.errors.push(SyntaxError::new(
                            format!("function '{}' already defined at line {}", func.name, first),
                            func.span,
                        ));
                        continue;
                    }
                    declared.insert(func.name.clone(), func.span.line);
                    functions.push(func);
                }
                Err(()) => self.synchronize(),
            }
        }

        (Program { functions }, std::mem::take(&mut self.errors))
    }

    // === Top-level parsing ===

    /// Parse a function declaration
    fn parse_function(&mut self) -> ParseResult<FunctionDecl> {
        let span = self
            .consume(TokenKind::Fn, "expected 'fn' at top level")?
            .span;
        let name = self
            .consume(TokenKind::Identifier, "expected a function name")?
            .lexeme
            .clone();

        self.consume(TokenKind::LeftParen, "expected '(' after function name")?;
        let mut params = Vec::new();
        if !self.check(TokenKind::RightParen) {
            loop {
                let param = self.consume(TokenKind::Identifier, "expected a parameter name")?;
                params.push(param.lexeme.clone());
                if !self.match_token(TokenKind::Comma) {
                    break;
                }
            }
        }
        self.consume(TokenKind::RightParen, "expected ')' after parameters")?;

        let (body, end_line) = self.parse_block()?;

        Ok(FunctionDecl {
            name,
            params,
            body,
            span,
            end_line,
        })
    }

    /// Parse `{ stmt* }`, returning the block and the line of its closing brace
    fn parse_block(&mut self) -> ParseResult<(Block, u32)> {
        self.enter_nesting()?;
        let block = self.parse_block_inner();
        self.depth -= 1;
        block
    }

    fn parse_block_inner(&mut self) -> ParseResult<(Block, u32)> {
        self.consume(TokenKind::LeftBrace, "expected '{'")?;

        let mut statements = Vec::new();
        while !self.check(TokenKind::RightBrace) && !self.is_at_end() {
            statements.push(self.parse_statement()?);
        }

        let end_line = self
            .consume(TokenKind::RightBrace, "expected '}' to close block")?
            .span
            .line;
        Ok((Block { statements }, end_line))
    }

    // === Statements ===

    fn parse_statement(&mut self) -> ParseResult<Stmt> {
        if self.check(TokenKind::Let) {
            self.parse_let()
        } else if self.check(TokenKind::If) {
            self.parse_if()
        } else if self.check(TokenKind::Return) {
            self.parse_return()
        } else {
            let expr = self.parse_expression(Precedence::Lowest)?;
            self.consume(TokenKind::Semicolon, "expected ';' after expression")?;
            Ok(Stmt::Expr(expr))
        }
    }

    fn parse_let(&mut self) -> ParseResult<Stmt> {
        let span = self.advance().span;
        let name = self
            .consume(TokenKind::Identifier, "expected a variable name after 'let'")?
            .lexeme
            .clone();
        self.consume(TokenKind::Equal, "expected '=' after variable name")?;
        let value = self.parse_expression(Precedence::Lowest)?;
        self.consume(TokenKind::Semicolon, "expected ';' after let statement")?;
        Ok(Stmt::Let { name, value, span })
    }

    fn parse_if(&mut self) -> ParseResult<Stmt> {
        let span = self.advance().span;
        let cond = self.parse_expression(Precedence::Lowest)?;
        let (then_block, _) = self.parse_block()?;

        let else_block = if self.match_token(TokenKind::Else) {
            if self.check(TokenKind::If) {
                // `else if` desugars to an else block holding a nested if
                let nested = self.parse_if()?;
                Some(Block {
                    statements: vec![nested],
                })
            } else {
                Some(self.parse_block()?.0)
            }
        } else {
            None
        };

        Ok(Stmt::If {
            cond,
            then_block,
            else_block,
            span,
        })
    }

    fn parse_return(&mut self) -> ParseResult<Stmt> {
        let span = self.advance().span;
        let value = if self.check(TokenKind::Semicolon) {
            None
        } else {
            Some(self.parse_expression(Precedence::Lowest)?)
        };
        self.consume(TokenKind::Semicolon, "expected ';' after return")?;
        Ok(Stmt::Return { value, span })
    }

    // === Expressions ===

    fn parse_expression(&mut self, min: Precedence) -> ParseResult<Expr> {
        self.enter_nesting()?;
        let expr = self.parse_binary(min);
        self.depth -= 1;
        expr
    }

    fn parse_binary(&mut self, min: Precedence) -> ParseResult<Expr> {
        let mut left = self.parse_prefix()?;

        loop {
            let precedence = Precedence::of(self.peek().kind);
            if precedence == Precedence::Lowest || precedence <= min {
                break;
            }
            let op_token = self.advance().clone();
            let op = binary_op(op_token.kind);
            let right = self.parse_expression(precedence)?;
            left = Expr::Binary {
                op,
                left: Box::new(left),
                right: Box::new(right),
                span: op_token.span,
            };
        }

        Ok(left)
    }

    fn parse_prefix(&mut self) -> ParseResult<Expr> {
        let token = self.advance().clone();
        match token.kind {
            TokenKind::Number => match token.lexeme.parse::<f64>() {
                Ok(n) => Ok(Expr::Literal(Value::Number(n), token.span)),
                Err(_) => self.error_at(&token, &format!("invalid number '{}'", token.lexeme)),
            },
            TokenKind::String => Ok(Expr::Literal(Value::String(token.lexeme), token.span)),
            TokenKind::True => Ok(Expr::Literal(Value::Bool(true), token.span)),
            TokenKind::False => Ok(Expr::Literal(Value::Bool(false), token.span)),
            TokenKind::Null => Ok(Expr::Literal(Value::Null, token.span)),
            TokenKind::Identifier => {
                if self.match_token(TokenKind::LeftParen) {
                    let args = self.parse_arguments()?;
                    Ok(Expr::Call {
                        callee: token.lexeme,
                        args,
                        span: token.span,
                    })
                } else {
                    Ok(Expr::Identifier(token.lexeme, token.span))
                }
            }
            TokenKind::LeftParen => {
                let inner = self.parse_expression(Precedence::Lowest)?;
                self.consume(TokenKind::RightParen, "expected ')' after expression")?;
                Ok(inner)
            }
            TokenKind::Bang | TokenKind::Minus => {
                let operand = self.parse_expression(Precedence::Unary)?;
                let op = if token.kind == TokenKind::Bang {
                    UnaryOp::Not
                } else {
                    UnaryOp::Negate
                };
                Ok(Expr::Unary {
                    op,
                    operand: Box::new(operand),
                    span: token.span,
                })
            }
            _ => {
                let found = describe(&token);
                self.error_at(&token, &format!("expected an expression, found {}", found))
            }
        }
    }

    /// Parse call arguments; the opening paren is already consumed
    fn parse_arguments(&mut self) -> ParseResult<Vec<Expr>> {
        let mut args = Vec::new();
        if !self.check(TokenKind::RightParen) {
            loop {
                args.push(self.parse_expression(Precedence::Lowest)?);
                if !self.match_token(TokenKind::Comma) {
                    break;
                }
            }
        }
        self.consume(TokenKind::RightParen, "expected ')' after arguments")?;
        Ok(args)
    }

    // === Helpers ===

    fn peek(&self) -> &Token {
        &self.tokens[self.current.min(self.tokens.len() - 1)]
    }

    fn is_at_end(&self) -> bool {
        self.peek().kind == TokenKind::Eof
    }

    fn check(&self, kind: TokenKind) -> bool {
        self.peek().kind == kind
    }

    fn advance(&mut self) -> &Token {
        if !self.is_at_end() {
            self.current += 1;
        }
        &self.tokens[self.current - 1]
    }

    fn match_token(&mut self, kind: TokenKind) -> bool {
        if self.check(kind) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn consume(&mut self, kind: TokenKind, message: &str) -> ParseResult<&Token> {
        if self.check(kind) {
            return Ok(self.advance());
        }
        let token = self.peek().clone();
        self.error_at(&token, &format!("{}, found {}", message, describe(&token)))
    }

    /// Count one level of nesting; callers decrement once the level is parsed
    fn enter_nesting(&mut self) -> ParseResult<()> {
        if self.depth >= MAX_NESTING {
            let token = self.peek().clone();
            return self.error_at(&token, "expression nested too deeply");
        }
        self.depth += 1;
        Ok(())
    }

    fn error_at<T>(&mut self, token: &Token, message: &str) -> ParseResult<T> {
        self.errors.push(SyntaxError::new(message, token.span));
        Err(())
    }

    /// Skip tokens until the next top-level `fn`
    fn synchronize(&mut self) {
        while !self.is_at_end() {
            if self.check(TokenKind::Fn) {
                return;
            }
            self.current += 1;
        }
    }
}

fn binary_op(kind: TokenKind) -> BinaryOp {
    match kind {
        TokenKind::Plus => BinaryOp::Add,
        TokenKind::Minus => BinaryOp::Sub,
        TokenKind::Star => BinaryOp::Mul,
        TokenKind::Slash => BinaryOp::Div,
        TokenKind::Percent => BinaryOp::Mod,
        TokenKind::EqualEqual => BinaryOp::Eq,
        TokenKind::BangEqual => BinaryOp::Ne,
        TokenKind::Less => BinaryOp::Lt,
        TokenKind::LessEqual => BinaryOp::Le,
        TokenKind::Greater => BinaryOp::Gt,
        TokenKind::GreaterEqual => BinaryOp::Ge,
        TokenKind::AmpAmp => BinaryOp::And,
        TokenKind::PipePipe => BinaryOp::Or,
        other => unreachable!("{:?} has no binary precedence", other),
    }
}

fn describe(token: &Token) -> String {
    if token.kind == TokenKind::Eof {
        "end of file".to_string()
    } else {
        format!("'{}'", token.lexeme)
    }
}
