//! Five-line program declarations
//!
//! ```text
//! line 1  stack initial contents    30, -5, 'a', 3.6, "ciao"
//! line 2  dynamic allocation sizes  900, 50, 10
//! line 3  BSS initial contents
//! line 4  DATA initial contents
//! line 5  text bytes                \x10, \xA4
//! ```
//!
//! Missing trailing lines read as empty.

use super::lexer::{LexError, Lexer, Token};
use crate::memory::Value;

pub const STACK_LINE: usize = 1;
pub const DYNAMIC_LINE: usize = 2;
pub const BSS_LINE: usize = 3;
pub const DATA_LINE: usize = 4;
pub const TEXT_LINE: usize = 5;

/// Lex a line of mixed literals into a `None`-terminated value array
pub fn parse_values(line: &str, line_no: usize) -> Result<Vec<Value>, LexError> {
    let mut values: Vec<Value> = Lexer::new(line, line_no)
        .tokenize()?
        .into_iter()
        .map(Token::into_value)
        .collect();
    values.push(Value::None);
    Ok(values)
}

/// Lex a line of integer sizes. Sign is kept so the allocator can reject
/// non-positive requests itself.
pub fn parse_sizes(line: &str, line_no: usize) -> Result<Vec<i64>, LexError> {
    Lexer::new(line, line_no)
        .tokenize()?
        .into_iter()
        .map(|token| match token {
            Token::IntLiteral(n, _) => Ok(i64::from(n)),
            other => Err(unexpected(&other, "integer")),
        })
        .collect()
}

/// Lex a line of `\xHH` byte literals
pub fn parse_bytes(line: &str, line_no: usize) -> Result<Vec<u8>, LexError> {
    Lexer::new(line, line_no)
        .tokenize()?
        .into_iter()
        .map(|token| match token {
            Token::ByteLiteral(b, _) => Ok(b),
            other => Err(unexpected(&other, "byte")),
        })
        .collect()
}

fn unexpected(token: &Token, expected: &str) -> LexError {
    LexError {
        message: format!("Expected {} literal, found {}", expected, token),
        location: token.location(),
    }
}

/// The raw lines of one declaration, split but not yet lexed
#[derive(Debug, Clone, Copy, Default)]
pub struct Lines<'a> {
    lines: [&'a str; TEXT_LINE],
}

impl<'a> Lines<'a> {
    pub fn split(text: &'a str) -> Self {
        let mut lines = [""; TEXT_LINE];
        for (slot, line) in lines.iter_mut().zip(text.lines()) {
            *slot = line;
        }
        Lines { lines }
    }

    /// Line by 1-based number
    pub fn get(&self, line_no: usize) -> &'a str {
        self.lines[line_no - 1]
    }
}

/// Lexed stack and dynamic lines, which every load parses afresh
#[derive(Debug, Clone, PartialEq)]
pub struct PrivateImage {
    pub stack: Vec<Value>,
    pub dynamic: Vec<i64>,
}

impl PrivateImage {
    pub fn parse(lines: &Lines<'_>) -> Result<Self, LexError> {
        Ok(PrivateImage {
            stack: parse_values(lines.get(STACK_LINE), STACK_LINE)?,
            dynamic: parse_sizes(lines.get(DYNAMIC_LINE), DYNAMIC_LINE)?,
        })
    }
}

/// Lexed BSS, DATA and text lines, parsed once per live segment
#[derive(Debug, Clone, PartialEq)]
pub struct SharedImage {
    pub bss: Vec<Value>,
    pub data: Vec<Value>,
    pub text: Vec<u8>,
}

impl SharedImage {
    pub fn parse(lines: &Lines<'_>) -> Result<Self, LexError> {
        Ok(SharedImage {
            bss: parse_values(lines.get(BSS_LINE), BSS_LINE)?,
            data: parse_values(lines.get(DATA_LINE), DATA_LINE)?,
            text: parse_bytes(lines.get(TEXT_LINE), TEXT_LINE)?,
        })
    }
}
