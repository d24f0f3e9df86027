//! Lexical analysis (tokenization)
//!
//! The lexer converts tally script source into a stream of tokens with line
//! and column information. Errors are collected rather than aborting, so a
//! single pass reports every bad character in a file.

use crate::error::SyntaxError;
use crate::span::Span;
use crate::token::{Token, TokenKind};

/// Lexer state for tokenizing source code
pub struct Lexer {
    /// Characters of source code
    chars: Vec<char>,
    /// Current position in chars
    current: usize,
    /// Current line number (1-indexed)
    line: u32,
    /// Current column number (1-indexed)
    column: u32,
    /// Start line of current token
    start_line: u32,
    /// Start column of current token
    start_column: u32,
    /// Collected errors
    errors: Vec<SyntaxError>,
}

impl Lexer {
    /// Create a new lexer for the given source code
    pub fn new(source: &str) -> Self {
        Self {
            chars: source.chars().collect(),
            current: 0,
            line: 1,
            column: 1,
            start_line: 1,
            start_column: 1,
            errors: Vec::new(),
        }
    }

    /// Tokenize the source code, returning tokens and any errors
    ///
    /// The token stream always ends with an `Eof` token.
    pub fn tokenize(&mut self) -> (Vec<Token>, Vec<SyntaxError>) {
        let mut tokens = Vec::new();

        loop {
            if let Some(token) = self.next_token() {
                let is_eof = token.kind == TokenKind::Eof;
                tokens.push(token);
                if is_eof {
                    break;
                }
            }
        }

        (tokens, std::mem::take(&mut self.errors))
    }

    /// Scan the next token, or `None` if the characters were rejected
    fn next_token(&mut self) -> Option<Token> {
        self.skip_whitespace_and_comments();

        self.start_line = self.line;
        self.start_column = self.column;

        if self.is_at_end() {
            return Some(self.make_token(TokenKind::Eof, ""));
        }

        let c = self.advance();

        let token = match c {
            '(' => self.make_token(TokenKind::LeftParen, "("),
            ')' => self.make_token(TokenKind::RightParen, ")"),
            '{' => self.make_token(TokenKind::LeftBrace, "{"),
            '}' => self.make_token(TokenKind::RightBrace, "}"),
            ';' => self.make_token(TokenKind::Semicolon, ";"),
            ',' => self.make_token(TokenKind::Comma, ","),
            '+' => self.make_token(TokenKind::Plus, "+"),
            '-' => self.make_token(TokenKind::Minus, "-"),
            '*' => self.make_token(TokenKind::Star, "*"),
            '/' => self.make_token(TokenKind::Slash, "/"),
            '%' => self.make_token(TokenKind::Percent, "%"),
            '=' => {
                if self.match_char('=') {
                    self.make_token(TokenKind::EqualEqual, "==")
                } else {
                    self.make_token(TokenKind::Equal, "=")
                }
            }
            '!' => {
                if self.match_char('=') {
                    self.make_token(TokenKind::BangEqual, "!=")
                } else {
                    self.make_token(TokenKind::Bang, "!")
                }
            }
            '<' => {
                if self.match_char('=') {
                    self.make_token(TokenKind::LessEqual, "<=")
                } else {
                    self.make_token(TokenKind::Less, "<")
                }
            }
            '>' => {
                if self.match_char('=') {
                    self.make_token(TokenKind::GreaterEqual, ">=")
                } else {
                    self.make_token(TokenKind::Greater, ">")
                }
            }
            '&' => {
                if self.match_char('&') {
                    self.make_token(TokenKind::AmpAmp, "&&")
                } else {
                    return self.error("unexpected character '&' (did you mean '&&'?)");
                }
            }
            '|' => {
                if self.match_char('|') {
                    self.make_token(TokenKind::PipePipe, "||")
                } else {
                    return self.error("unexpected character '|' (did you mean '||'?)");
                }
            }
            '"' => return self.string(),
            c if c.is_ascii_digit() => self.number(),
            c if c.is_alphabetic() || c == '_' => self.identifier(),
            other => return self.error(&format!("unexpected character '{}'", other)),
        };

        Some(token)
    }

    /// Skip whitespace and `//` comments
    fn skip_whitespace_and_comments(&mut self) {
        while !self.is_at_end() {
            match self.peek() {
                ' ' | '\r' | '\t' | '\n' => {
                    self.advance();
                }
                '/' if self.peek_next() == Some('/') => {
                    while !self.is_at_end() && self.peek() != '\n' {
                        self.advance();
                    }
                }
                _ => return,
            }
        }
    }

    /// Scan a string literal; the opening quote is already consumed
    fn string(&mut self) -> Option<Token> {
        let mut value = String::new();

        while !self.is_at_end() && self.peek() != '"' {
            let c = self.advance();
            if c != '\\' {
                value.push(c);
                continue;
            }
            if self.is_at_end() {
                break;
            }
            match self.advance() {
                'n' => value.push('\n'),
                't' => value.push('\t'),
                'r' => value.push('\r'),
                '\\' => value.push('\\'),
                '"' => value.push('"'),
                other => {
                    self.errors.push(SyntaxError::new(
                        format!("invalid escape sequence '\\{}'", other),
                        self.start_span(),
                    ));
                }
            }
        }

        if self.is_at_end() {
            return self.error("unterminated string");
        }

        self.advance(); // closing "
        Some(self.make_token(TokenKind::String, value))
    }

    /// Scan a number literal (integer or decimal)
    fn number(&mut self) -> Token {
        let start = self.current - 1;

        while !self.is_at_end() && self.peek().is_ascii_digit() {
            self.advance();
        }

        if !self.is_at_end()
            && self.peek() == '.'
            && self.peek_next().is_some_and(|c| c.is_ascii_digit())
        {
            self.advance(); // .
            while !self.is_at_end() && self.peek().is_ascii_digit() {
                self.advance();
            }
        }

        let text: String = self.chars[start..self.current].iter().collect();
        self.make_token(TokenKind::Number, text)
    }

    /// Scan an identifier or keyword
    fn identifier(&mut self) -> Token {
        let start = self.current - 1;

        while !self.is_at_end() && (self.peek().is_alphanumeric() || self.peek() == '_') {
            self.advance();
        }

        let text: String = self.chars[start..self.current].iter().collect();
        let kind = TokenKind::keyword(&text).unwrap_or(TokenKind::Identifier);
        self.make_token(kind, text)
    }

    // === Helpers ===

    fn is_at_end(&self) -> bool {
        self.current >= self.chars.len()
    }

    fn peek(&self) -> char {
        self.chars[self.current]
    }

    fn peek_next(&self) -> Option<char> {
        self.chars.get(self.current + 1).copied()
    }

    fn advance(&mut self) -> char {
        let c = self.chars[self.current];
        self.current += 1;
        if c == '\n' {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }
        c
    }

    fn match_char(&mut self, expected: char) -> bool {
        if self.is_at_end() || self.peek() != expected {
            return false;
        }
        self.advance();
        true
    }

    fn start_span(&self) -> Span {
        Span::new(self.start_line, self.start_column)
    }

    fn make_token(&self, kind: TokenKind, lexeme: impl Into<String>) -> Token {
        Token::new(kind, lexeme, self.start_span())
    }

    fn error(&mut self, message: &str) -> Option<Token> {
        self.errors.push(SyntaxError::new(message, self.start_span()));
        None
    }
}
