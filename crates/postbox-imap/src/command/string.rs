//! Command argument strings.

use crate::types::Mailbox;

/// How a literal is announced to the server.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LiteralMode {
    /// `{n}`: wait for a `+` continuation before sending the data.
    Synchronizing,
    /// `{n+}`: send the data immediately (LITERAL+).
    NonSynchronizing,
    /// `{n+}` when the server advertises LITERAL+, `{n}` otherwise.
    NonSynchronizingIfCapable,
}

/// One command argument.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImapString {
    /// Written as is.
    Atom(String),
    /// Written in double quotes with `"` and `\` escaped.
    Quoted(String),
    /// Length-prefixed raw bytes.
    Literal {
        /// Payload.
        data: Vec<u8>,
        /// Synchronization mode.
        mode: LiteralMode,
        /// Written as `~{n}` (BINARY literal8).
        literal8: bool,
    },
    /// Parenthesized list.
    List(Vec<Self>),
    /// `NIL`.
    Nil,
}

impl ImapString {
    /// Creates an atom.
    pub fn atom(s: impl Into<String>) -> Self {
        Self::Atom(s.into())
    }

    /// Creates a numeric atom.
    #[must_use]
    pub fn number(n: impl Into<u64>) -> Self {
        Self::Atom(n.into().to_string())
    }

    /// Creates a quoted string.
    pub fn quoted(s: impl Into<String>) -> Self {
        Self::Quoted(s.into())
    }

    /// Creates a synchronizing literal.
    pub fn literal(data: impl Into<Vec<u8>>) -> Self {
        Self::Literal {
            data: data.into(),
            mode: LiteralMode::Synchronizing,
            literal8: false,
        }
    }

    /// Creates a literal with the given mode.
    pub fn literal_with(data: impl Into<Vec<u8>>, mode: LiteralMode, literal8: bool) -> Self {
        Self::Literal {
            data: data.into(),
            mode,
            literal8,
        }
    }

    /// Creates a list.
    #[must_use]
    pub const fn list(items: Vec<Self>) -> Self {
        Self::List(items)
    }

    /// Chooses the lightest form that can carry `s`.
    ///
    /// Atom when every byte is an ASTRING-CHAR, quoted when the string is
    /// printable 7-bit, a synchronizing literal otherwise.
    #[must_use]
    pub fn astring(s: &str) -> Self {
        Self::string_with(s, is_astring_char)
    }

    /// Like [`ImapString::astring`] but keeps the `%` and `*` wildcards
    /// unquoted, for LIST patterns.
    #[must_use]
    pub fn list_mailbox(s: &str) -> Self {
        Self::string_with(s, |b| is_astring_char(b) || b == b'%' || b == b'*')
    }

    /// Encodes a mailbox name with modified UTF-7.
    #[must_use]
    pub fn mailbox(mailbox: &Mailbox) -> Self {
        Self::astring(&mailbox.to_wire())
    }

    /// Writes `NIL` for `None`.
    #[must_use]
    pub fn nstring(s: Option<&str>) -> Self {
        s.map_or(Self::Nil, |s| Self::string_with(s, |_| false))
    }

    fn string_with(s: &str, atom_char: impl Fn(u8) -> bool) -> Self {
        if !s.is_empty() && s.bytes().all(atom_char) {
            Self::Atom(s.to_string())
        } else if s.bytes().all(is_quoted_char) {
            Self::Quoted(s.to_string())
        } else {
            Self::literal(s.as_bytes())
        }
    }

    /// Returns true if this argument or any nested one is a literal that
    /// requires LITERAL+.
    #[must_use]
    pub fn requires_literal_plus(&self) -> bool {
        match self {
            Self::Literal { mode, .. } => *mode == LiteralMode::NonSynchronizing,
            Self::List(items) => items.iter().any(Self::requires_literal_plus),
            _ => false,
        }
    }

    /// Returns true if this argument or any nested one is a literal8.
    #[must_use]
    pub fn has_literal8(&self) -> bool {
        match self {
            Self::Literal { literal8, .. } => *literal8,
            Self::List(items) => items.iter().any(Self::has_literal8),
            _ => false,
        }
    }
}

/// ATOM-CHAR plus `]`.
const fn is_astring_char(b: u8) -> bool {
    matches!(b, 0x21..=0x7e) && !matches!(b, b'(' | b')' | b'{' | b'%' | b'*' | b'"' | b'\\')
}

const fn is_quoted_char(b: u8) -> bool {
    matches!(b, 0x20..=0x7e)
}

/// Splits an encoded command at each synchronizing literal.
///
/// Every fragment but the last ends with a `{n}\r\n` prefix after which the
/// server must answer with a continuation request.
#[derive(Debug)]
pub(crate) struct FragmentWriter {
    fragments: Vec<Vec<u8>>,
    current: Vec<u8>,
    literal_plus: bool,
}

impl FragmentWriter {
    pub(crate) const fn new(literal_plus: bool) -> Self {
        Self {
            fragments: Vec::new(),
            current: Vec::new(),
            literal_plus,
        }
    }

    pub(crate) fn raw(&mut self, bytes: &[u8]) {
        self.current.extend_from_slice(bytes);
    }

    pub(crate) fn write(&mut self, arg: &ImapString) {
        match arg {
            ImapString::Atom(s) => self.raw(s.as_bytes()),
            ImapString::Quoted(s) => {
                self.current.push(b'"');
                for b in s.bytes() {
                    if b == b'"' || b == b'\\' {
                        self.current.push(b'\\');
                    }
                    self.current.push(b);
                }
                self.current.push(b'"');
            }
            ImapString::Literal {
                data,
                mode,
                literal8,
            } => {
                let non_sync = match mode {
                    LiteralMode::Synchronizing => false,
                    LiteralMode::NonSynchronizing => true,
                    LiteralMode::NonSynchronizingIfCapable => self.literal_plus,
                };
                if *literal8 {
                    self.current.push(b'~');
                }
                let plus = if non_sync { "+" } else { "" };
                self.raw(format!("{{{}{plus}}}\r\n", data.len()).as_bytes());
                if !non_sync {
                    self.fragments.push(std::mem::take(&mut self.current));
                }
                self.current.extend_from_slice(data);
            }
            ImapString::List(items) => {
                self.current.push(b'(');
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        self.current.push(b' ');
                    }
                    self.write(item);
                }
                self.current.push(b')');
            }
            ImapString::Nil => self.raw(b"NIL"),
        }
    }

    pub(crate) fn finish(mut self) -> Vec<Vec<u8>> {
        self.current.extend_from_slice(b"\r\n");
        self.fragments.push(self.current);
        self.fragments
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn encode(arg: &ImapString, literal_plus: bool) -> Vec<Vec<u8>> {
        let mut writer = FragmentWriter::new(literal_plus);
        writer.write(arg);
        writer.finish()
    }

    #[test]
    fn test_astring_choice() {
        assert_eq!(ImapString::astring("INBOX"), ImapString::atom("INBOX"));
        assert_eq!(ImapString::astring("a]b"), ImapString::atom("a]b"));
        assert_eq!(ImapString::astring("My Folder"), ImapString::quoted("My Folder"));
        assert_eq!(ImapString::astring(""), ImapString::quoted(""));
        assert_eq!(ImapString::astring("100%"), ImapString::quoted("100%"));
        assert!(matches!(
            ImapString::astring("line\r\nbreak"),
            ImapString::Literal {
                mode: LiteralMode::Synchronizing,
                ..
            }
        ));
        assert!(matches!(ImapString::astring("ünïcode"), ImapString::Literal { .. }));
    }

    #[test]
    fn test_list_mailbox_keeps_wildcards() {
        assert_eq!(ImapString::list_mailbox("*"), ImapString::atom("*"));
        assert_eq!(ImapString::list_mailbox("INBOX/%"), ImapString::atom("INBOX/%"));
        assert_eq!(ImapString::list_mailbox(""), ImapString::quoted(""));
    }

    #[test]
    fn test_mailbox_encodes_utf7() {
        let mb = Mailbox::new("Entwürfe");
        assert_eq!(ImapString::mailbox(&mb), ImapString::atom("Entw&APw-rfe"));
    }

    #[test]
    fn test_quoted_escapes() {
        let out = encode(&ImapString::quoted(r#"say "hi" \o/"#), false);
        let mut expected = br#""say \"hi\" \\o/""#.to_vec();
        expected.extend_from_slice(b"\r\n");
        assert_eq!(out, vec![expected]);
    }

    #[test]
    fn test_sync_literal_splits() {
        let out = encode(&ImapString::literal(b"hello".to_vec()), false);
        assert_eq!(out, vec![b"{5}\r\n".to_vec(), b"hello\r\n".to_vec()]);
    }

    #[test]
    fn test_non_sync_literal_if_capable() {
        let arg = ImapString::literal_with(b"hi".to_vec(), LiteralMode::NonSynchronizingIfCapable, false);
        assert_eq!(encode(&arg, true), vec![b"{2+}\r\nhi\r\n".to_vec()]);
        assert_eq!(encode(&arg, false), vec![b"{2}\r\n".to_vec(), b"hi\r\n".to_vec()]);
        assert!(!arg.requires_literal_plus());
    }

    #[test]
    fn test_literal8() {
        let arg = ImapString::literal_with(vec![0, 1], LiteralMode::NonSynchronizing, true);
        assert_eq!(encode(&arg, false), vec![b"~{2+}\r\n\x00\x01\r\n".to_vec()]);
        assert!(arg.requires_literal_plus());
        assert!(arg.has_literal8());
    }

    #[test]
    fn test_list_and_nil() {
        let arg = ImapString::list(vec![ImapString::atom("a"), ImapString::Nil, ImapString::list(vec![])]);
        assert_eq!(encode(&arg, false), vec![b"(a NIL ())\r\n".to_vec()]);
    }

    #[test]
    fn test_nstring() {
        assert_eq!(ImapString::nstring(None), ImapString::Nil);
        assert_eq!(ImapString::nstring(Some("x")), ImapString::quoted("x"));
    }
}
