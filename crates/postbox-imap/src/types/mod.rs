//! Core IMAP types.
//!
//! Domain values produced by the converters and consumed by the command
//! catalog, following RFC 3501 (`IMAP4rev1`) and the extensions the engine
//! speaks.

#![allow(clippy::missing_const_for_fn)]

mod capability;
mod extension;
mod flags;
mod identifiers;
mod mailbox;
mod message;
mod response_code;
mod sequence;
pub mod utf7;

pub use capability::{Capability, CapabilitySet, Condition};
pub use extension::{
    ComparatorOutcome, ESearchResult, IdParams, MetadataEntry, NamespaceDesc, Namespaces, Quota,
    QuotaResource, QuotaRoots, SearchOutcome, SearchResult, ThreadNode,
};
pub use flags::{Flag, Flags};
pub use identifiers::Tag;
pub use mailbox::{ListEntry, Mailbox, MailboxAttribute, SelectedMailbox, StatusAttributes};
pub use message::{Address, BodyFields, BodyStructure, Envelope, FetchAttributes, PartKind};
pub use response_code::{AppendUid, CopyUid, ResponseCode};
pub use sequence::{MAX_EXPANDED, SequenceSet};
