//! Lexer (tokenizer) for declaration literals
//!
//! Converts one declaration line into a flat [`Token`] stream. Commas and
//! whitespace separate literals; anything else outside a literal is an error.
//!
//! Literals are recognised in priority order float, int, char, string, byte:
//!
//! ```text
//! float   -?[0-9]+\.[0-9]*f?
//! int     0 | -?[1-9][0-9]*
//! char    '.'
//! string  "[^"]*"
//! byte    \x[0-9a-fA-F]+
//! ```

use crate::memory::Value;
use std::fmt;

/// Line and column of a token, both 1-based
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SourceLocation {
    pub line: usize,
    pub column: usize,
}

impl SourceLocation {
    pub fn new(line: usize, column: usize) -> Self {
        SourceLocation { line, column }
    }
}

/// All token variants produced by the lexer.
#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    FloatLiteral(f32, SourceLocation),
    IntLiteral(i32, SourceLocation),
    CharLiteral(char, SourceLocation),
    StringLiteral(String, SourceLocation),
    ByteLiteral(u8, SourceLocation),
}

impl Token {
    /// Returns the source location where this token appears.
    pub fn location(&self) -> SourceLocation {
        match self {
            Token::FloatLiteral(_, loc)
            | Token::IntLiteral(_, loc)
            | Token::CharLiteral(_, loc)
            | Token::StringLiteral(_, loc)
            | Token::ByteLiteral(_, loc) => *loc,
        }
    }

    /// Convert the literal into an owned value
    pub fn into_value(self) -> Value {
        match self {
            Token::FloatLiteral(v, _) => Value::Float(v),
            Token::IntLiteral(v, _) => Value::Int(v),
            Token::CharLiteral(c, _) => Value::Char(c),
            Token::StringLiteral(s, _) => Value::Str(s),
            Token::ByteLiteral(b, _) => Value::Byte(b),
        }
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::FloatLiteral(v, _) => write!(f, "float literal {}", v),
            Token::IntLiteral(n, _) => write!(f, "int literal {}", n),
            Token::CharLiteral(c, _) => write!(f, "char literal '{}'", c),
            Token::StringLiteral(s, _) => write!(f, "string literal \"{}\"", s),
            Token::ByteLiteral(b, _) => write!(f, "byte literal \\x{:02x}", b),
        }
    }
}

/// Lexer error type
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LexError {
    pub message: String,
    pub location: SourceLocation,
}

impl fmt::Display for LexError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Lexer error at line {}, column {}: {}",
            self.location.line, self.location.column, self.message
        )
    }
}

impl std::error::Error for LexError {}

/// Lexer for one declaration line
pub struct Lexer {
    input: Vec<char>,
    position: usize,
    line: usize,
    column: usize,
}

impl Lexer {
    /// Create a lexer for `input`, reporting locations on line `line`.
    pub fn new(input: &str, line: usize) -> Self {
        Self {
            input: input.chars().collect(),
            position: 0,
            line,
            column: 1,
        }
    }

    /// Tokenize the entire input
    pub fn tokenize(&mut self) -> Result<Vec<Token>, LexError> {
        let mut tokens = Vec::new();

        loop {
            self.skip_separators();
            if self.is_at_end() {
                break;
            }
            tokens.push(self.next_token()?);
        }

        Ok(tokens)
    }

    /// Get next token
    fn next_token(&mut self) -> Result<Token, LexError> {
        let loc = self.current_location();
        let ch = self.advance().ok_or_else(|| self.error("Unexpected end of line", loc))?;

        match ch {
            '-' | '0'..='9' => self.number_literal(ch, loc),
            '\'' => self.char_literal(loc),
            '"' => self.string_literal(loc),
            '\\' => self.byte_literal(loc),
            _ => Err(self.error(format!("Unexpected character: '{}'", ch), loc)),
        }
    }

    /// Parse a float or integer literal
    fn number_literal(&mut self, first: char, loc: SourceLocation) -> Result<Token, LexError> {
        let mut text = String::new();
        text.push(first);
        let negative = first == '-';

        self.take_digits(&mut text);
        let int_digits = if negative { &text[1..] } else { &text[..] };
        if int_digits.is_empty() {
            return Err(self.error("Expected digits after '-'", loc));
        }
        let leading_zero = int_digits.len() > 1 && int_digits.starts_with('0');

        if self.peek() == Some('.') {
            self.advance();
            text.push('.');
            if !self.take_digits(&mut text) {
                text.push('0');
            }
            if self.peek() == Some('f') {
                self.advance();
            }
            let value = text
                .parse::<f32>()
                .map_err(|_| self.error(format!("Invalid float literal: {}", text), loc))?;
            return Ok(Token::FloatLiteral(value, loc));
        }

        if leading_zero {
            return Err(self.error(
                format!("Leading zero in integer literal: {}", text),
                loc,
            ));
        }
        let value = text
            .parse::<i32>()
            .map_err(|_| self.error(format!("Invalid integer literal: {}", text), loc))?;
        Ok(Token::IntLiteral(value, loc))
    }

    /// Parse character literal: exactly one character between quotes
    fn char_literal(&mut self, loc: SourceLocation) -> Result<Token, LexError> {
        let ch = self
            .advance()
            .filter(|&c| c != '\'')
            .ok_or_else(|| self.error("Empty character literal", loc))?;

        if self.advance() != Some('\'') {
            return Err(self.error("Expected closing quote in character literal", loc));
        }
        Ok(Token::CharLiteral(ch, loc))
    }

    /// Parse string literal; no escape sequences
    fn string_literal(&mut self, loc: SourceLocation) -> Result<Token, LexError> {
        let mut string = String::new();
        while let Some(ch) = self.advance() {
            if ch == '"' {
                return Ok(Token::StringLiteral(string, loc));
            }
            string.push(ch);
        }
        Err(self.error("Unterminated string literal", loc))
    }

    /// Parse byte literal: `\x` followed by hex digits
    fn byte_literal(&mut self, loc: SourceLocation) -> Result<Token, LexError> {
        if self.advance() != Some('x') {
            return Err(self.error("Expected 'x' after '\\' in byte literal", loc));
        }
        let mut hex = String::new();
        while let Some(ch) = self.peek().filter(char::is_ascii_hexdigit) {
            hex.push(ch);
            self.advance();
        }
        if hex.is_empty() {
            return Err(self.error("Byte literal has no hex digits", loc));
        }
        let value = u8::from_str_radix(&hex, 16)
            .map_err(|_| self.error(format!("Byte literal out of range: \\x{}", hex), loc))?;
        Ok(Token::ByteLiteral(value, loc))
    }

    /// Append consecutive ASCII digits to `text`; returns whether any were read
    fn take_digits(&mut self, text: &mut String) -> bool {
        let start = text.len();
        while let Some(ch) = self.peek().filter(char::is_ascii_digit) {
            text.push(ch);
            self.advance();
        }
        text.len() > start
    }

    /// Skip commas and whitespace
    fn skip_separators(&mut self) {
        while matches!(self.peek(), Some(c) if c == ',' || c.is_whitespace()) {
            self.advance();
        }
    }

    fn error(&self, message: impl Into<String>, location: SourceLocation) -> LexError {
        LexError {
            message: message.into(),
            location,
        }
    }

    /// Peek at current character without consuming
    fn peek(&self) -> Option<char> {
        self.input.get(self.position).copied()
    }

    /// Advance to next character
    fn advance(&mut self) -> Option<char> {
        let ch = self.peek()?;
        self.position += 1;
        self.column += 1;
        Some(ch)
    }

    fn is_at_end(&self) -> bool {
        self.position >= self.input.len()
    }

    fn current_location(&self) -> SourceLocation {
        SourceLocation::new(self.line, self.column)
    }
}
