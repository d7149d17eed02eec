//! Arguments that commands take: STATUS items, FETCH items, STORE
//! actions, SEARCH keys and SORT criteria.
//!
//! These are data only; [`serialize`](super::serialize) turns them into
//! wire tokens.

use chrono::NaiveDate;

use crate::types::{Flag, Flags, SequenceSet};

/// Item requested by STATUS.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusItem {
    /// `MESSAGES`
    Messages,
    /// `RECENT`
    Recent,
    /// `UIDNEXT`
    UidNext,
    /// `UIDVALIDITY`
    UidValidity,
    /// `UNSEEN`
    Unseen,
    /// `HIGHESTMODSEQ`, needs CONDSTORE.
    HighestModSeq,
}

impl StatusItem {
    /// The RFC 3501 items, i.e. everything except `HIGHESTMODSEQ`.
    pub const BASE: [Self; 5] = [
        Self::Messages,
        Self::Recent,
        Self::UidNext,
        Self::UidValidity,
        Self::Unseen,
    ];

    pub(crate) const fn as_str(self) -> &'static str {
        match self {
            Self::Messages => "MESSAGES",
            Self::Recent => "RECENT",
            Self::UidNext => "UIDNEXT",
            Self::UidValidity => "UIDVALIDITY",
            Self::Unseen => "UNSEEN",
            Self::HighestModSeq => "HIGHESTMODSEQ",
        }
    }
}

/// What FETCH should return: a macro or an explicit list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchItems {
    /// `ALL`: flags, internal date, size and envelope.
    All,
    /// `FULL`: `ALL` plus `BODY`.
    Full,
    /// `FAST`: flags, internal date and size.
    Fast,
    /// Explicit attributes.
    Items(Vec<FetchAttribute>),
}

/// Which part of a message a `BODY[...]` or `BINARY[...]` item addresses.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Section {
    /// Section text such as `HEADER.FIELDS (From Subject)` or `1.2`;
    /// `None` for the whole message.
    pub spec: Option<String>,
    /// Leave `\Seen` untouched.
    pub peek: bool,
    /// Byte window as `(offset, length)`.
    pub partial: Option<(u32, u32)>,
}

impl Section {
    /// `spec` without setting `\Seen`.
    #[must_use]
    pub fn peek(spec: impl Into<String>) -> Self {
        Self {
            spec: Some(spec.into()),
            peek: true,
            partial: None,
        }
    }

    /// Whole message without setting `\Seen`.
    #[must_use]
    pub const fn peek_all() -> Self {
        Self {
            spec: None,
            peek: true,
            partial: None,
        }
    }

    /// Restricts the fetch to `length` octets from `offset`.
    #[must_use]
    pub const fn window(mut self, offset: u32, length: u32) -> Self {
        self.partial = Some((offset, length));
        self
    }
}

/// One FETCH data item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchAttribute {
    /// `FLAGS`
    Flags,
    /// `INTERNALDATE`
    InternalDate,
    /// `RFC822.SIZE`
    Rfc822Size,
    /// `ENVELOPE`
    Envelope,
    /// `BODY` without extension data.
    Body,
    /// `BODYSTRUCTURE`
    BodyStructure,
    /// `UID`
    Uid,
    /// `BODY[...]` or `BODY.PEEK[...]`.
    BodySection(Section),
    /// `BINARY[...]` or `BINARY.PEEK[...]`: content with transfer encoding
    /// removed.
    Binary(Section),
    /// `BINARY.SIZE[...]` for the given part.
    BinarySize(Option<String>),
    /// `RFC822`
    Rfc822,
    /// `RFC822.HEADER`
    Rfc822Header,
    /// `RFC822.TEXT`
    Rfc822Text,
    /// `MODSEQ`, needs CONDSTORE.
    ModSeq,
}

impl FetchAttribute {
    /// Whether the BINARY capability is needed.
    #[must_use]
    pub const fn is_binary(&self) -> bool {
        matches!(self, Self::Binary(_) | Self::BinarySize(_))
    }
}

/// How STORE changes the flags of the addressed messages.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreAction {
    /// `FLAGS`: replace.
    SetFlags(Vec<Flag>),
    /// `+FLAGS`: add.
    AddFlags(Vec<Flag>),
    /// `-FLAGS`: remove.
    RemoveFlags(Vec<Flag>),
}

impl StoreAction {
    /// Flags named by the action.
    #[must_use]
    pub fn flags(&self) -> &[Flag] {
        match self {
            Self::SetFlags(flags) | Self::AddFlags(flags) | Self::RemoveFlags(flags) => flags,
        }
    }

    /// Applies the action to a locally cached flag set, as the server will
    /// when STORE succeeds.
    pub fn apply(&self, current: &mut Flags) {
        match self {
            Self::SetFlags(flags) => *current = flags.iter().cloned().collect(),
            Self::AddFlags(flags) => current.extend(flags.iter().cloned()),
            Self::RemoveFlags(flags) => {
                for flag in flags {
                    current.remove(flag);
                }
            }
        }
    }
}

/// A SEARCH key. Several keys side by side mean AND, as on the wire.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchCriteria {
    /// `ALL`
    All,
    /// `ANSWERED`
    Answered,
    /// `DELETED`
    Deleted,
    /// `DRAFT`
    Draft,
    /// `FLAGGED`
    Flagged,
    /// `NEW`: recent and not yet seen.
    New,
    /// `RECENT`
    Recent,
    /// `OLD`
    Old,
    /// `SEEN`
    Seen,
    /// `UNANSWERED`
    Unanswered,
    /// `UNDELETED`
    Undeleted,
    /// `UNDRAFT`
    Undraft,
    /// `UNFLAGGED`
    Unflagged,
    /// `UNSEEN`
    Unseen,
    /// `KEYWORD flag`
    Keyword(String),
    /// `UNKEYWORD flag`
    Unkeyword(String),
    /// A bare sequence set.
    Sequence(SequenceSet),
    /// `UID set`
    Uid(SequenceSet),
    /// `SUBJECT text`
    Subject(String),
    /// `FROM text`
    From(String),
    /// `TO text`
    To(String),
    /// `CC text`
    Cc(String),
    /// `BCC text`
    Bcc(String),
    /// `BODY text`
    Body(String),
    /// `TEXT text`, header or body.
    Text(String),
    /// `SINCE date`, by internal date.
    Since(NaiveDate),
    /// `BEFORE date`, by internal date.
    Before(NaiveDate),
    /// `ON date`, by internal date.
    On(NaiveDate),
    /// `SENTSINCE date`, by the Date header.
    SentSince(NaiveDate),
    /// `SENTBEFORE date`, by the Date header.
    SentBefore(NaiveDate),
    /// `SENTON date`, by the Date header.
    SentOn(NaiveDate),
    /// `LARGER n`
    Larger(u32),
    /// `SMALLER n`
    Smaller(u32),
    /// `HEADER field value`
    Header(String, String),
    /// `MODSEQ n`, needs CONDSTORE.
    ModSeq(u64),
    /// Parenthesised group; all must match.
    And(Vec<Self>),
    /// `OR a b`
    Or(Box<Self>, Box<Self>),
    /// `NOT key`
    Not(Box<Self>),
}

impl SearchCriteria {
    /// True if `test` holds for this key or any key nested in it.
    pub fn any_key(&self, test: &impl Fn(&Self) -> bool) -> bool {
        test(self)
            || match self {
                Self::And(keys) => keys.iter().any(|key| key.any_key(test)),
                Self::Or(left, right) => left.any_key(test) || right.any_key(test),
                Self::Not(inner) => inner.any_key(test),
                _ => false,
            }
    }

    /// Non-ASCII text anywhere means the command must name a CHARSET.
    #[must_use]
    pub fn requires_charset(&self) -> bool {
        self.any_key(&|key| match key {
            Self::Keyword(text)
            | Self::Unkeyword(text)
            | Self::Subject(text)
            | Self::From(text)
            | Self::To(text)
            | Self::Cc(text)
            | Self::Bcc(text)
            | Self::Body(text)
            | Self::Text(text) => !text.is_ascii(),
            Self::Header(field, value) => !field.is_ascii() || !value.is_ascii(),
            _ => false,
        })
    }

    /// Whether a `MODSEQ` key appears, which needs CONDSTORE.
    #[must_use]
    pub fn uses_modseq(&self) -> bool {
        self.any_key(&|key| matches!(key, Self::ModSeq(_)))
    }
}

/// SORT key (RFC 5256).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortKey {
    /// Internal date and time.
    Arrival,
    /// First Cc mailbox.
    Cc,
    /// Sent date.
    Date,
    /// First From mailbox.
    From,
    /// RFC822.SIZE.
    Size,
    /// Base subject.
    Subject,
    /// First To mailbox.
    To,
}

/// One SORT criterion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SortCriterion {
    /// Sort key.
    pub key: SortKey,
    /// Reverse order.
    pub reverse: bool,
}

impl SortCriterion {
    /// Ascending order by `key`.
    #[must_use]
    pub const fn ascending(key: SortKey) -> Self {
        Self {
            key,
            reverse: false,
        }
    }

    /// Descending order by `key`.
    #[must_use]
    pub const fn descending(key: SortKey) -> Self {
        Self { key, reverse: true }
    }
}

/// ESEARCH result options (RFC 4731).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchReturn {
    /// Lowest matching number.
    Min,
    /// Highest matching number.
    Max,
    /// All matching numbers as a sequence set.
    All,
    /// Number of matches.
    Count,
}

impl SearchReturn {
    pub(crate) const fn as_str(self) -> &'static str {
        match self {
            Self::Min => "MIN",
            Self::Max => "MAX",
            Self::All => "ALL",
            Self::Count => "COUNT",
        }
    }
}
