//! IMAP command builder.
//!
//! A [`Command`] is a tag, a verb and a list of [`ImapString`] arguments.
//! It is encoded into fragments that end at each synchronizing literal; the
//! connection sends one fragment, waits for a continuation request and sends
//! the next.

pub mod serialize;
mod string;
mod tag_generator;
mod types;

use crate::types::Tag;

pub use string::{ImapString, LiteralMode};
pub(crate) use string::FragmentWriter;
pub use tag_generator::{TAG_WRAP, TagGenerator};
pub use types::{
    FetchAttribute, FetchItems, SearchCriteria, SearchReturn, Section, SortCriterion, SortKey,
    StatusItem, StoreAction,
};

/// An IMAP command ready to send.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Command {
    tag: Option<Tag>,
    verb: Option<String>,
    args: Vec<ImapString>,
    redacted: bool,
}

impl Command {
    /// Creates a tagged command.
    pub fn new(tag: Tag, verb: impl Into<String>, args: Vec<ImapString>) -> Self {
        Self {
            tag: Some(tag),
            verb: Some(verb.into()),
            args,
            redacted: false,
        }
    }

    /// Creates an untagged continuation line carrying only arguments.
    #[must_use]
    pub const fn continuation(args: Vec<ImapString>) -> Self {
        Self {
            tag: None,
            verb: None,
            args,
            redacted: false,
        }
    }

    /// Hides the arguments from log output.
    #[must_use]
    pub fn redacted(mut self) -> Self {
        self.redacted = true;
        self
    }

    /// Returns the tag.
    #[must_use]
    pub const fn tag(&self) -> Option<&Tag> {
        self.tag.as_ref()
    }

    /// Returns the verb.
    #[must_use]
    pub fn verb(&self) -> Option<&str> {
        self.verb.as_deref()
    }

    /// Returns the arguments.
    #[must_use]
    pub fn args(&self) -> &[ImapString] {
        &self.args
    }

    /// Returns true if any argument needs LITERAL+.
    #[must_use]
    pub fn requires_literal_plus(&self) -> bool {
        self.args.iter().any(ImapString::requires_literal_plus)
    }

    /// Encodes the command.
    ///
    /// Every fragment except the last ends with a synchronizing literal
    /// prefix; the last ends with CRLF. `literal_plus` resolves
    /// [`LiteralMode::NonSynchronizingIfCapable`].
    #[must_use]
    pub fn fragments(&self, literal_plus: bool) -> Vec<Vec<u8>> {
        let mut writer = FragmentWriter::new(literal_plus);
        let mut first = true;
        let mut separate = |writer: &mut FragmentWriter| {
            if !first {
                writer.raw(b" ");
            }
            first = false;
        };

        if let Some(tag) = &self.tag {
            separate(&mut writer);
            writer.raw(tag.as_str().as_bytes());
        }
        if let Some(verb) = &self.verb {
            separate(&mut writer);
            writer.raw(verb.as_bytes());
        }
        for arg in &self.args {
            separate(&mut writer);
            writer.write(arg);
        }
        writer.finish()
    }

    /// Returns a printable form with literal payloads elided.
    #[must_use]
    pub fn describe(&self) -> String {
        let mut out = String::new();
        if let Some(tag) = &self.tag {
            out.push_str(tag.as_str());
            out.push(' ');
        }
        if let Some(verb) = &self.verb {
            out.push_str(verb);
        }
        if self.redacted {
            out.push_str(" <redacted>");
            return out;
        }
        for arg in &self.args {
            if !out.is_empty() {
                out.push(' ');
            }
            describe_arg(&mut out, arg);
        }
        out
    }
}

fn describe_arg(out: &mut String, arg: &ImapString) {
    match arg {
        ImapString::Atom(s) => out.push_str(s),
        ImapString::Quoted(s) => {
            out.push('"');
            out.push_str(s);
            out.push('"');
        }
        ImapString::Literal { data, .. } => out.push_str(&format!("{{{}}}", data.len())),
        ImapString::List(items) => {
            out.push('(');
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.push(' ');
                }
                describe_arg(out, item);
            }
            out.push(')');
        }
        ImapString::Nil => out.push_str("NIL"),
    }
}
