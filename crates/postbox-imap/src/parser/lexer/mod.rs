//! IMAP lexer for tokenizing one response line.
//!
//! The lexer never sees literal payloads: the connection reads those
//! separately once a line ends in a literal prefix.

#![allow(clippy::missing_errors_doc)]

mod token;

pub use token::Token;

use crate::{Error, Result};

/// IMAP lexer state.
pub struct Lexer<'a> {
    input: &'a [u8],
    pos: usize,
    offset: usize,
}

impl<'a> Lexer<'a> {
    /// Creates a new lexer for the given input.
    #[must_use]
    pub const fn new(input: &'a [u8]) -> Self {
        Self {
            input,
            pos: 0,
            offset: 0,
        }
    }

    /// Creates a lexer whose error positions are shifted by `offset`.
    ///
    /// Used when tokenizing a slice of a larger line.
    #[must_use]
    pub const fn with_offset(input: &'a [u8], offset: usize) -> Self {
        Self {
            input,
            pos: 0,
            offset,
        }
    }

    /// Returns the current position in the input.
    #[must_use]
    pub const fn position(&self) -> usize {
        self.offset + self.pos
    }

    /// Returns true if at end of input.
    #[must_use]
    pub const fn is_eof(&self) -> bool {
        self.pos >= self.input.len()
    }

    /// Peeks at the current byte without consuming it.
    #[must_use]
    pub fn peek(&self) -> Option<u8> {
        self.input.get(self.pos).copied()
    }

    fn peek_at(&self, offset: usize) -> Option<u8> {
        self.input.get(self.pos + offset).copied()
    }

    fn advance(&mut self) -> Option<u8> {
        let byte = self.peek()?;
        self.pos += 1;
        Some(byte)
    }

    /// Reads the next token.
    pub fn next_token(&mut self) -> Result<Token<'a>> {
        let Some(byte) = self.peek() else {
            return Ok(Token::Eof);
        };

        match byte {
            b' ' => {
                self.advance();
                Ok(Token::Space)
            }
            b'(' => {
                self.advance();
                Ok(Token::LParen)
            }
            b')' => {
                self.advance();
                Ok(Token::RParen)
            }
            b'"' => self.read_quoted_string(),
            b'{' => self.read_literal_prefix(false),
            b'~' if self.peek_at(1) == Some(b'{') => {
                self.advance();
                self.read_literal_prefix(true)
            }
            _ if is_atom_char(byte) || byte == b'[' => self.read_atom(),
            _ => Err(self.error(&format!("Unexpected character: {byte:#04x}"))),
        }
    }

    /// Reads a quoted string token.
    fn read_quoted_string(&mut self) -> Result<Token<'a>> {
        self.advance();

        let mut result = Vec::new();
        loop {
            match self.advance() {
                Some(b'"') => break,
                // Only " and \ are quoted-specials; anything else after a
                // backslash is kept as is.
                Some(b'\\') => match self.advance() {
                    Some(c) => result.push(c),
                    None => return Err(self.error("Unexpected end of line in quoted string")),
                },
                Some(b'\r' | b'\n') | None => {
                    return Err(self.error("Unexpected end of line in quoted string"));
                }
                Some(c) => result.push(c),
            }
        }
        Ok(Token::Quoted(result))
    }

    /// Reads a literal size prefix, which must end the line.
    fn read_literal_prefix(&mut self, literal8: bool) -> Result<Token<'a>> {
        self.advance();

        let start = self.pos;
        while self.peek().is_some_and(|b| b.is_ascii_digit()) {
            self.advance();
        }
        let digits = &self.input[start..self.pos];
        if digits.is_empty() {
            return Err(self.error("Missing literal size"));
        }
        if self.peek() == Some(b'+') {
            self.advance();
        }
        if self.advance() != Some(b'}') {
            return Err(self.error("Expected } after literal size"));
        }
        if !self.is_eof() {
            return Err(self.error("Literal prefix must end the line"));
        }

        let size = std::str::from_utf8(digits)
            .ok()
            .and_then(|s| s.parse::<usize>().ok())
            .ok_or_else(|| self.error("Invalid literal size"))?;

        Ok(Token::LiteralPrefix { size, literal8 })
    }

    /// Reads an atom; bracketed sections may contain spaces and parentheses.
    fn read_atom(&mut self) -> Result<Token<'a>> {
        let start = self.pos;

        while let Some(b) = self.peek() {
            if b == b'[' {
                self.skip_section()?;
            } else if is_atom_char(b) {
                self.advance();
            } else {
                break;
            }
        }

        let atom = &self.input[start..self.pos];
        if atom.eq_ignore_ascii_case(b"NIL") {
            Ok(Token::Nil)
        } else {
            Ok(Token::Atom(atom))
        }
    }

    fn skip_section(&mut self) -> Result<()> {
        let mut depth = 0usize;
        while let Some(b) = self.advance() {
            match b {
                b'[' => depth += 1,
                b']' => {
                    depth -= 1;
                    if depth == 0 {
                        return Ok(());
                    }
                }
                b'\r' | b'\n' => break,
                _ => {}
            }
        }
        Err(self.error("Unterminated '[' in atom"))
    }

    /// Creates a parse error at the current position.
    fn error(&self, message: &str) -> Error {
        Error::MalformedResponse {
            position: self.position(),
            message: message.to_string(),
        }
    }
}

/// Returns true if the byte may appear in an atom outside a section.
///
/// This is looser than ATOM-CHAR: `\`, `%`, `*` and `]` are accepted so
/// flags such as `\Seen`, `\*` and LIST wildcards read as single atoms.
#[must_use]
pub const fn is_atom_char(b: u8) -> bool {
    matches!(b, 0x21..=0x7e) && !matches!(b, b'(' | b')' | b'{' | b'"' | b'[')
}

/// Finds the `]` closing the bracket that starts `input`.
///
/// Quoted strings and nested brackets are skipped.
#[must_use]
pub fn find_closing_bracket(input: &[u8]) -> Option<usize> {
    let mut depth = 0usize;
    let mut in_quotes = false;
    let mut escaped = false;
    for (i, &b) in input.iter().enumerate() {
        if in_quotes {
            if escaped {
                escaped = false;
            } else if b == b'\\' {
                escaped = true;
            } else if b == b'"' {
                in_quotes = false;
            }
            continue;
        }
        match b {
            b'"' => in_quotes = true,
            b'[' => depth += 1,
            b']' => {
                depth = depth.checked_sub(1)?;
                if depth == 0 {
                    return Some(i);
                }
            }
            _ => {}
        }
    }
    None
}
