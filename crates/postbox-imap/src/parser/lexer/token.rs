//! IMAP token types.

/// Token types produced by the lexer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token<'a> {
    /// Atom, including bracketed sections such as `BODY[HEADER]<0>`.
    Atom(&'a [u8]),
    /// Quoted string with escapes removed.
    Quoted(Vec<u8>),
    /// Literal size prefix `{n}`, `{n+}` or `~{n}` at the end of the line.
    LiteralPrefix {
        /// Number of bytes that follow the line.
        size: usize,
        /// Announced as literal8.
        literal8: bool,
    },
    /// NIL.
    Nil,
    /// Opening parenthesis.
    LParen,
    /// Closing parenthesis.
    RParen,
    /// Space character.
    Space,
    /// End of input.
    Eof,
}
