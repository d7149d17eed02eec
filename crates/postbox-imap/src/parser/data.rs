//! Generic response data items.

use std::fmt;
use std::str::FromStr;

use crate::{Error, Result};

/// One parsed response datum.
///
/// Atoms, quoted strings and literals all become [`ImapData::Text`]; the
/// converters decide what the bytes mean.
#[derive(Clone, PartialEq, Eq)]
pub enum ImapData {
    /// Atom, quoted string or literal content.
    Text(Vec<u8>),
    /// Parenthesized list.
    List(Vec<Self>),
    /// NIL.
    Nil,
}

impl ImapData {
    /// Creates a text item.
    pub fn text(bytes: impl Into<Vec<u8>>) -> Self {
        Self::Text(bytes.into())
    }

    const fn kind(&self) -> &'static str {
        match self {
            Self::Text(_) => "text",
            Self::List(_) => "list",
            Self::Nil => "NIL",
        }
    }

    fn mismatch(&self, expected: &str) -> Error {
        Error::MalformedData(format!("expected {expected} but was {}", self.kind()))
    }

    /// Returns the raw bytes of a text item.
    pub fn as_bytes(&self) -> Result<&[u8]> {
        match self {
            Self::Text(bytes) => Ok(bytes),
            _ => Err(self.mismatch("text")),
        }
    }

    /// Returns a text item as UTF-8.
    pub fn as_str(&self) -> Result<&str> {
        std::str::from_utf8(self.as_bytes()?)
            .map_err(|_| Error::MalformedData("text is not valid UTF-8".to_string()))
    }

    /// Returns a text item as a string, replacing invalid UTF-8.
    pub fn to_string_lossy(&self) -> Result<String> {
        Ok(String::from_utf8_lossy(self.as_bytes()?).into_owned())
    }

    /// Returns `None` for NIL and the bytes for text.
    pub fn as_nstring(&self) -> Result<Option<&[u8]>> {
        match self {
            Self::Nil => Ok(None),
            Self::Text(bytes) => Ok(Some(bytes)),
            Self::List(_) => Err(self.mismatch("nstring")),
        }
    }

    /// Like [`ImapData::as_nstring`] with lossy UTF-8 decoding.
    pub fn to_nstring_lossy(&self) -> Result<Option<String>> {
        Ok(self
            .as_nstring()?
            .map(|b| String::from_utf8_lossy(b).into_owned()))
    }

    /// Returns the items of a list.
    pub fn as_list(&self) -> Result<&[Self]> {
        match self {
            Self::List(items) => Ok(items),
            _ => Err(self.mismatch("list")),
        }
    }

    /// Returns the items of a list, treating NIL as empty.
    pub fn as_list_or_nil(&self) -> Result<&[Self]> {
        match self {
            Self::List(items) => Ok(items),
            Self::Nil => Ok(&[]),
            Self::Text(_) => Err(self.mismatch("list or NIL")),
        }
    }

    /// Parses a text item as a number.
    pub fn as_number<T: FromStr>(&self) -> Result<T> {
        let text = self.as_str()?;
        text.parse()
            .map_err(|_| Error::MalformedData(format!("'{text}' is not a number")))
    }

    /// Returns true for NIL.
    #[must_use]
    pub const fn is_nil(&self) -> bool {
        matches!(self, Self::Nil)
    }

    /// Returns true for a list.
    #[must_use]
    pub const fn is_list(&self) -> bool {
        matches!(self, Self::List(_))
    }

    /// Returns true if this is text equal to `word`, ignoring ASCII case.
    #[must_use]
    pub fn is_word(&self, word: &str) -> bool {
        matches!(self, Self::Text(bytes) if bytes.eq_ignore_ascii_case(word.as_bytes()))
    }

    /// Returns the upper-cased text, or `None` for lists and NIL.
    #[must_use]
    pub fn keyword(&self) -> Option<String> {
        match self {
            Self::Text(bytes) => Some(String::from_utf8_lossy(bytes).to_ascii_uppercase()),
            _ => None,
        }
    }
}

impl fmt::Display for ImapData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text(bytes) => f.write_str(&String::from_utf8_lossy(bytes)),
            Self::List(items) => {
                f.write_str("(")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(" ")?;
                    }
                    write!(f, "{item}")?;
                }
                f.write_str(")")
            }
            Self::Nil => f.write_str("NIL"),
        }
    }
}

impl fmt::Debug for ImapData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}
