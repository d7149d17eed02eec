//! Response codes.

use super::{CapabilitySet, Flags, SequenceSet};
use crate::error::{Error, Result};

/// Response code attached to a status response.
///
/// These provide additional information about command completion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResponseCode {
    /// ALERT: Human-readable message that MUST be shown to user.
    Alert,
    /// BADCHARSET: supported charsets, possibly empty.
    BadCharset(Vec<String>),
    /// CAPABILITY: capabilities sent inside a status response.
    Capability(CapabilitySet),
    /// PARSE: Error parsing message.
    Parse,
    /// PERMANENTFLAGS: Flags that can be changed permanently.
    PermanentFlags(Flags),
    /// READ-ONLY: Mailbox selected as read-only.
    ReadOnly,
    /// READ-WRITE: Mailbox selected as read-write.
    ReadWrite,
    /// TRYCREATE: Mailbox doesn't exist, but can be created.
    TryCreate,
    /// UIDNEXT: Next UID to be assigned.
    UidNext(u32),
    /// UIDVALIDITY: Unique identifier validity value.
    UidValidity(u32),
    /// UNSEEN: First unseen message sequence number.
    Unseen(u32),
    /// REFERRAL: URL of another server (RFC 2221).
    Referral(String),
    /// APPENDUID (UIDPLUS).
    AppendUid(AppendUid),
    /// COPYUID (UIDPLUS).
    CopyUid(CopyUid),
    /// UIDNOTSTICKY (UIDPLUS).
    UidNotSticky,
    /// HIGHESTMODSEQ (CONDSTORE).
    HighestModSeq(u64),
    /// NOMODSEQ (CONDSTORE).
    NoModSeq,
    /// MODIFIED: messages that failed the UNCHANGEDSINCE test (CONDSTORE).
    Modified(SequenceSet),
    /// COMPRESSIONACTIVE (COMPRESS).
    CompressionActive,
    /// CLIENTBUG (RFC 5530).
    ClientBug,
    /// METADATA LONGENTRIES.
    MetadataLongEntries(u32),
    /// METADATA MAXSIZE.
    MetadataMaxSize(u32),
    /// METADATA TOOMANY.
    MetadataTooMany,
    /// METADATA NOPRIVATE.
    MetadataNoPrivate,
    /// UNDEFINED-FILTER (RFC 5466).
    UndefinedFilter(String),
    /// Argument-less response code from RFC 5530, such as `AUTHENTICATIONFAILED`.
    Condition(String),
    /// Unknown response code.
    Unknown(String),
}

impl ResponseCode {
    /// Returns true for codes whose text should be shown to the user.
    #[must_use]
    pub const fn is_alert(&self) -> bool {
        matches!(self, Self::Alert | Self::ClientBug)
    }
}

/// APPENDUID response code data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppendUid {
    /// UIDVALIDITY of the destination mailbox.
    pub uid_validity: u32,
    /// UIDs of the appended messages (a set when MULTIAPPEND was used).
    pub uids: SequenceSet,
}

/// COPYUID response code data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CopyUid {
    /// UIDVALIDITY of the destination mailbox.
    pub uid_validity: u32,
    /// Source UIDs.
    pub source: SequenceSet,
    /// Destination UIDs.
    pub destination: SequenceSet,
}

impl CopyUid {
    /// Pairs each source UID with its destination UID.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MalformedData`] if either set contains `*`, names
    /// too many UIDs to expand, or the two sets differ in size.
    pub fn pairs(&self) -> Result<Vec<(u32, u32)>> {
        if self.source.count() != self.destination.count() {
            return Err(Error::malformed(format!(
                "COPYUID maps {} onto {}",
                self.source, self.destination
            )));
        }
        let source = self.source.to_vec()?;
        let destination = self.destination.to_vec()?;
        Ok(source.into_iter().zip(destination).collect())
    }
}
