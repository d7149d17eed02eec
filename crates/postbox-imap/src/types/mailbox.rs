//! Mailbox names, LIST entries and the state SELECT and STATUS report.

use super::{Flags, utf7};

/// Mailbox name in decoded form. [`Mailbox::to_wire`] produces the modified
/// UTF-7 the server expects.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Mailbox(pub String);

impl Mailbox {
    /// Creates a new mailbox name.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// The INBOX mailbox.
    #[must_use]
    pub fn inbox() -> Self {
        Self("INBOX".to_string())
    }

    /// Decodes a mailbox name received from the server.
    #[must_use]
    pub fn from_wire(raw: &[u8]) -> Self {
        Self(utf7::decode_lossy(raw))
    }

    /// Returns the modified UTF-7 form sent to the server.
    #[must_use]
    pub fn to_wire(&self) -> String {
        utf7::encode(&self.0)
    }

    /// Returns the mailbox name as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns true for INBOX, which is case-insensitive.
    #[must_use]
    pub fn is_inbox(&self) -> bool {
        self.0.eq_ignore_ascii_case("INBOX")
    }
}

impl std::fmt::Display for Mailbox {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Mailbox {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

/// Name attribute from a LIST, LSUB or XLIST line.
///
/// Covers the base protocol, LIST-EXTENDED, SPECIAL-USE and the XLIST
/// spellings Gmail still sends.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum MailboxAttribute {
    /// `\Noselect`
    NoSelect,
    /// `\Noinferiors`
    NoInferiors,
    /// `\HasNoChildren`
    HasNoChildren,
    /// `\HasChildren`
    HasChildren,
    /// `\Marked`
    Marked,
    /// `\Unmarked`
    Unmarked,
    /// `\NonExistent`
    NonExistent,
    /// `\Subscribed`
    Subscribed,
    /// `\Remote`
    Remote,
    /// `\All`, or XLIST `\AllMail`.
    All,
    /// `\Archive`
    Archive,
    /// `\Drafts`
    Drafts,
    /// `\Flagged`, or XLIST `\Starred`.
    Flagged,
    /// `\Junk`, or XLIST `\Spam`.
    Junk,
    /// `\Sent`
    Sent,
    /// `\Trash`
    Trash,
    /// XLIST `\Inbox`.
    Inbox,
    /// Anything else, verbatim.
    Unknown(String),
}

/// Spellings accepted for each attribute; the first is canonical.
const ATTRIBUTE_NAMES: [(MailboxAttribute, &[&str]); 17] = [
    (MailboxAttribute::NoSelect, &["\\Noselect"]),
    (MailboxAttribute::NoInferiors, &["\\Noinferiors"]),
    (MailboxAttribute::HasNoChildren, &["\\HasNoChildren"]),
    (MailboxAttribute::HasChildren, &["\\HasChildren"]),
    (MailboxAttribute::Marked, &["\\Marked"]),
    (MailboxAttribute::Unmarked, &["\\Unmarked"]),
    (MailboxAttribute::NonExistent, &["\\NonExistent"]),
    (MailboxAttribute::Subscribed, &["\\Subscribed"]),
    (MailboxAttribute::Remote, &["\\Remote"]),
    (MailboxAttribute::All, &["\\All", "\\AllMail"]),
    (MailboxAttribute::Archive, &["\\Archive"]),
    (MailboxAttribute::Drafts, &["\\Drafts"]),
    (MailboxAttribute::Flagged, &["\\Flagged", "\\Starred"]),
    (MailboxAttribute::Junk, &["\\Junk", "\\Spam"]),
    (MailboxAttribute::Sent, &["\\Sent"]),
    (MailboxAttribute::Trash, &["\\Trash"]),
    (MailboxAttribute::Inbox, &["\\Inbox"]),
];

impl MailboxAttribute {
    /// Interprets one attribute token, ignoring case.
    #[must_use]
    pub fn parse(s: &str) -> Self {
        ATTRIBUTE_NAMES
            .iter()
            .find(|(_, names)| names.iter().any(|name| name.eq_ignore_ascii_case(s)))
            .map_or_else(|| Self::Unknown(s.to_string()), |(attr, _)| attr.clone())
    }

    /// Canonical spelling. Special-use roles go out this way in
    /// [`MailboxOp::create_special_use`](crate::transaction::catalog::MailboxOp::create_special_use).
    #[must_use]
    pub fn as_str(&self) -> &str {
        if let Self::Unknown(raw) = self {
            return raw;
        }
        ATTRIBUTE_NAMES
            .iter()
            .find(|(attr, _)| attr == self)
            .map_or("", |(_, names)| names[0])
    }

    /// True for the SPECIAL-USE roles (RFC 6154).
    #[must_use]
    pub const fn is_special_use(&self) -> bool {
        matches!(
            self,
            Self::All
                | Self::Archive
                | Self::Drafts
                | Self::Flagged
                | Self::Junk
                | Self::Sent
                | Self::Trash
        )
    }
}

/// One LIST, LSUB or XLIST entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListEntry {
    /// Name attributes in server order.
    pub attributes: Vec<MailboxAttribute>,
    /// Hierarchy delimiter, `None` for a flat namespace.
    pub delimiter: Option<char>,
    /// Decoded name.
    pub mailbox: Mailbox,
    /// LIST-EXTENDED data items such as `CHILDINFO`.
    pub extended: Vec<(String, Vec<String>)>,
}

impl ListEntry {
    /// Whether `attribute` was listed.
    #[must_use]
    pub fn has_attribute(&self, attribute: &MailboxAttribute) -> bool {
        self.attributes.contains(attribute)
    }

    /// False for `\Noselect` and `\NonExistent` entries.
    #[must_use]
    pub fn is_selectable(&self) -> bool {
        !self.has_attribute(&MailboxAttribute::NoSelect)
            && !self.has_attribute(&MailboxAttribute::NonExistent)
    }

    /// The SPECIAL-USE role, if any.
    #[must_use]
    pub fn special_use(&self) -> Option<&MailboxAttribute> {
        self.attributes.iter().find(|attr| attr.is_special_use())
    }

    /// Last hierarchy component of the name.
    #[must_use]
    pub fn leaf_name(&self) -> &str {
        let name = self.mailbox.as_str();
        self.delimiter
            .and_then(|delimiter| name.rsplit_once(delimiter))
            .map_or(name, |(_, leaf)| leaf)
    }

    /// Name of the parent mailbox, `None` at the top level.
    #[must_use]
    pub fn parent(&self) -> Option<Mailbox> {
        let delimiter = self.delimiter?;
        self.mailbox
            .as_str()
            .rsplit_once(delimiter)
            .map(|(parent, _)| Mailbox::new(parent))
    }
}

/// Mailbox state collected while a SELECT or EXAMINE is in flight.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SelectedMailbox {
    /// Selected mailbox name.
    pub mailbox: Option<Mailbox>,
    /// Number of messages in the mailbox.
    pub exists: u32,
    /// Number of recent messages.
    pub recent: u32,
    /// First unseen message sequence number.
    pub unseen: Option<u32>,
    /// Next UID to be assigned.
    pub uid_next: Option<u32>,
    /// UIDVALIDITY value.
    pub uid_validity: Option<u32>,
    /// Flags defined for this mailbox.
    pub flags: Flags,
    /// Flags that can be permanently stored.
    pub permanent_flags: Option<Flags>,
    /// Whether the mailbox was opened read-only.
    pub read_only: bool,
    /// Highest mod-sequence, when CONDSTORE is in use.
    pub highest_modseq: Option<u64>,
    /// The server reported `NOMODSEQ`.
    pub no_modseq: bool,
}

/// Attributes returned by STATUS.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StatusAttributes {
    /// Number of messages.
    pub messages: Option<u32>,
    /// Number of recent messages.
    pub recent: Option<u32>,
    /// Next UID.
    pub uid_next: Option<u32>,
    /// UIDVALIDITY.
    pub uid_validity: Option<u32>,
    /// Number of unseen messages.
    pub unseen: Option<u32>,
    /// Highest mod-sequence.
    pub highest_modseq: Option<u64>,
}
