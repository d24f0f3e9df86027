//! Token types for lexical analysis
//!
//! Defines all token types recognized by the tally lexer.

use crate::span::Span;

/// Token type produced by the lexer
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    /// The kind of token
    pub kind: TokenKind,
    /// The source text of this token (unescaped contents for strings)
    pub lexeme: String,
    /// Source location
    pub span: Span,
}

impl Token {
    /// Create a new token
    pub fn new(kind: TokenKind, lexeme: impl Into<String>, span: Span) -> Self {
        Self {
            kind,
            lexeme: lexeme.into(),
            span,
        }
    }
}

/// Classification of token types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    // Literals
    /// Number literal (42, 3.5)
    Number,
    /// String literal ("hello")
    String,
    /// `true` keyword
    True,
    /// `false` keyword
    False,
    /// `null` keyword
    Null,
    /// Identifier
    Identifier,

    // Keywords
    /// `fn` keyword
    Fn,
    /// `let` keyword
    Let,
    /// `if` keyword
    If,
    /// `else` keyword
    Else,
    /// `return` keyword
    Return,

    // Punctuation
    LeftParen,
    RightParen,
    LeftBrace,
    RightBrace,
    Semicolon,
    Comma,

    // Operators
    Plus,
    Minus,
    Star,
    Slash,
    Percent,
    Equal,
    EqualEqual,
    Bang,
    BangEqual,
    Less,
    LessEqual,
    Greater,
    GreaterEqual,
    AmpAmp,
    PipePipe,

    /// End of input
    Eof,
}

impl TokenKind {
    /// Look up the keyword kind for an identifier, if it is one
    pub fn keyword(ident: &str) -> Option<TokenKind> {
        match ident {
            "fn" => Some(TokenKind::Fn),
            "let" => Some(TokenKind::Let),
            "if" => Some(TokenKind::If),
            "else" => Some(TokenKind::Else),
            "return" => Some(TokenKind::Return),
            "true" => Some(TokenKind::True),
            "false" => Some(TokenKind::False),
            "null" => Some(TokenKind::Null),
            _ => None,
        }
    }
}
