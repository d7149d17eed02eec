//! Parsed response types.

use crate::types::{Condition, Tag};

use super::ImapData;

/// A response code as received: upper-cased name and generic arguments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawCode {
    /// Code name, e.g. `UIDNEXT`.
    pub name: String,
    /// Code arguments.
    pub args: Vec<ImapData>,
}

/// Text attached to a status response.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ResponseText {
    /// Optional bracketed response code.
    pub code: Option<RawCode>,
    /// Human-readable text.
    pub text: String,
}

impl ResponseText {
    /// Returns true if the response code has the given name.
    #[must_use]
    pub fn has_code(&self, name: &str) -> bool {
        self.code.as_ref().is_some_and(|c| c.name == name)
    }
}

/// Tagged status response; completes the command with the same tag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaggedStatus {
    /// Command tag.
    pub tag: Tag,
    /// OK, NO or BAD.
    pub condition: Condition,
    /// Response text.
    pub text: ResponseText,
}

/// Untagged status response (`* OK`, `* BYE`, ...).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UntaggedStatus {
    /// Condition.
    pub condition: Condition,
    /// Response text.
    pub text: ResponseText,
}

/// Continuation request (`+ text`).
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ContinuationRequest {
    /// Text after the `+`.
    pub text: String,
}

/// Kind of untagged data response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DataResponseType {
    /// CAPABILITY
    Capability,
    /// LIST
    List,
    /// LSUB
    Lsub,
    /// XLIST
    XList,
    /// STATUS
    Status,
    /// SEARCH
    Search,
    /// ESEARCH
    ESearch,
    /// SORT
    Sort,
    /// THREAD
    Thread,
    /// FLAGS
    Flags,
    /// EXISTS
    Exists,
    /// RECENT
    Recent,
    /// EXPUNGE
    Expunge,
    /// FETCH
    Fetch,
    /// QUOTA
    Quota,
    /// QUOTAROOT
    QuotaRoot,
    /// NAMESPACE
    Namespace,
    /// ID
    Id,
    /// ENABLED
    Enabled,
    /// LANGUAGE
    Language,
    /// COMPARATOR
    Comparator,
    /// METADATA
    Metadata,
    /// Anything else.
    InvalidOrUnknown,
}

impl DataResponseType {
    /// Classifies a data response keyword, ignoring ASCII case.
    #[must_use]
    pub fn parse(word: &[u8]) -> Self {
        match word.to_ascii_uppercase().as_slice() {
            b"CAPABILITY" => Self::Capability,
            b"LIST" => Self::List,
            b"LSUB" => Self::Lsub,
            b"XLIST" => Self::XList,
            b"STATUS" => Self::Status,
            b"SEARCH" => Self::Search,
            b"ESEARCH" => Self::ESearch,
            b"SORT" => Self::Sort,
            b"THREAD" => Self::Thread,
            b"FLAGS" => Self::Flags,
            b"EXISTS" => Self::Exists,
            b"RECENT" => Self::Recent,
            b"EXPUNGE" => Self::Expunge,
            b"FETCH" => Self::Fetch,
            b"QUOTA" => Self::Quota,
            b"QUOTAROOT" => Self::QuotaRoot,
            b"NAMESPACE" => Self::Namespace,
            b"ID" => Self::Id,
            b"ENABLED" => Self::Enabled,
            b"LANGUAGE" => Self::Language,
            b"COMPARATOR" => Self::Comparator,
            b"METADATA" => Self::Metadata,
            _ => Self::InvalidOrUnknown,
        }
    }

    /// Returns the keyword.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Capability => "CAPABILITY",
            Self::List => "LIST",
            Self::Lsub => "LSUB",
            Self::XList => "XLIST",
            Self::Status => "STATUS",
            Self::Search => "SEARCH",
            Self::ESearch => "ESEARCH",
            Self::Sort => "SORT",
            Self::Thread => "THREAD",
            Self::Flags => "FLAGS",
            Self::Exists => "EXISTS",
            Self::Recent => "RECENT",
            Self::Expunge => "EXPUNGE",
            Self::Fetch => "FETCH",
            Self::Quota => "QUOTA",
            Self::QuotaRoot => "QUOTAROOT",
            Self::Namespace => "NAMESPACE",
            Self::Id => "ID",
            Self::Enabled => "ENABLED",
            Self::Language => "LANGUAGE",
            Self::Comparator => "COMPARATOR",
            Self::Metadata => "METADATA",
            Self::InvalidOrUnknown => "(unknown)",
        }
    }

    /// Returns true for the kinds written after a leading number
    /// (`* 23 EXISTS`).
    #[must_use]
    pub const fn is_numeric_first(self) -> bool {
        matches!(self, Self::Exists | Self::Recent | Self::Expunge | Self::Fetch)
    }
}

impl std::fmt::Display for DataResponseType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Untagged data response.
///
/// `data` excludes the type keyword. For numeric-first kinds the number is
/// the first item: `* 5 FETCH (UID 9)` has kind FETCH and data `[5, (UID 9)]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataResponse {
    /// Kind.
    pub kind: DataResponseType,
    /// Data items following the keyword.
    pub data: Vec<ImapData>,
    /// Keyword as received, kept for unknown kinds.
    pub keyword: String,
}

/// Any server response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Response {
    /// Tagged status.
    Tagged(TaggedStatus),
    /// Untagged status.
    Untagged(UntaggedStatus),
    /// Untagged data.
    Data(DataResponse),
    /// Continuation request.
    Continuation(ContinuationRequest),
}

impl Response {
    /// Returns true for an untagged BYE.
    #[must_use]
    pub const fn is_bye(&self) -> bool {
        matches!(
            self,
            Self::Untagged(UntaggedStatus {
                condition: Condition::Bye,
                ..
            })
        )
    }

    /// Returns the response text of a status response.
    #[must_use]
    pub const fn status_text(&self) -> Option<&ResponseText> {
        match self {
            Self::Tagged(t) => Some(&t.text),
            Self::Untagged(u) => Some(&u.text),
            _ => None,
        }
    }
}
