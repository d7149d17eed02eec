//! Command kinds.

use crate::types::{Capability, CapabilitySet};

/// Every command the engine can issue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[allow(missing_docs)]
pub enum CommandKind {
    Capability,
    Noop,
    Logout,
    Id,
    Compress,
    Language,
    StartTls,
    Login,
    Authenticate,
    Enable,
    Select,
    Examine,
    Create,
    Delete,
    Rename,
    Subscribe,
    Unsubscribe,
    List,
    Lsub,
    XList,
    RList,
    RLsub,
    Status,
    Namespace,
    Append,
    Check,
    Close,
    Unselect,
    Expunge,
    UidExpunge,
    Search,
    UidSearch,
    Sort,
    UidSort,
    Thread,
    UidThread,
    Fetch,
    UidFetch,
    Store,
    UidStore,
    Copy,
    UidCopy,
    GetQuota,
    SetQuota,
    GetQuotaRoot,
    GetMetadata,
    SetMetadata,
    Comparator,
    Idle,
}

impl CommandKind {
    /// Returns the command verb as written on the wire.
    #[must_use]
    pub const fn verb(self) -> &'static str {
        match self {
            Self::Capability => "CAPABILITY",
            Self::Noop => "NOOP",
            Self::Logout => "LOGOUT",
            Self::Id => "ID",
            Self::Compress => "COMPRESS",
            Self::Language => "LANGUAGE",
            Self::StartTls => "STARTTLS",
            Self::Login => "LOGIN",
            Self::Authenticate => "AUTHENTICATE",
            Self::Enable => "ENABLE",
            Self::Select => "SELECT",
            Self::Examine => "EXAMINE",
            Self::Create => "CREATE",
            Self::Delete => "DELETE",
            Self::Rename => "RENAME",
            Self::Subscribe => "SUBSCRIBE",
            Self::Unsubscribe => "UNSUBSCRIBE",
            Self::List => "LIST",
            Self::Lsub => "LSUB",
            Self::XList => "XLIST",
            Self::RList => "RLIST",
            Self::RLsub => "RLSUB",
            Self::Status => "STATUS",
            Self::Namespace => "NAMESPACE",
            Self::Append => "APPEND",
            Self::Check => "CHECK",
            Self::Close => "CLOSE",
            Self::Unselect => "UNSELECT",
            Self::Expunge => "EXPUNGE",
            Self::UidExpunge => "UID EXPUNGE",
            Self::Search => "SEARCH",
            Self::UidSearch => "UID SEARCH",
            Self::Sort => "SORT",
            Self::UidSort => "UID SORT",
            Self::Thread => "THREAD",
            Self::UidThread => "UID THREAD",
            Self::Fetch => "FETCH",
            Self::UidFetch => "UID FETCH",
            Self::Store => "STORE",
            Self::UidStore => "UID STORE",
            Self::Copy => "COPY",
            Self::UidCopy => "UID COPY",
            Self::GetQuota => "GETQUOTA",
            Self::SetQuota => "SETQUOTA",
            Self::GetQuotaRoot => "GETQUOTAROOT",
            Self::GetMetadata => "GETMETADATA",
            Self::SetMetadata => "SETMETADATA",
            Self::Comparator => "COMPARATOR",
            Self::Idle => "IDLE",
        }
    }

    /// Returns the capabilities the command needs regardless of its
    /// arguments.
    #[must_use]
    pub fn capabilities(self) -> CapabilitySet {
        let required = match self {
            Self::Id => vec![Capability::Id],
            Self::Compress => vec![Capability::Compress("DEFLATE".to_string())],
            Self::Language => vec![Capability::Language],
            Self::StartTls => vec![Capability::StartTls],
            Self::Enable => vec![Capability::Enable],
            Self::XList => vec![Capability::XList],
            Self::Namespace => vec![Capability::Namespace],
            Self::Unselect => vec![Capability::Unselect],
            Self::UidExpunge => vec![Capability::UidPlus],
            Self::Sort | Self::UidSort => vec![Capability::Sort],
            Self::GetQuota | Self::SetQuota | Self::GetQuotaRoot => vec![Capability::Quota],
            Self::GetMetadata | Self::SetMetadata => vec![Capability::Metadata],
            Self::Comparator => vec![Capability::I18nLevel(2)],
            Self::Idle => vec![Capability::Idle],
            _ => Vec::new(),
        };
        required.into_iter().collect()
    }

    /// Returns true for the `UID` prefixed variants.
    #[must_use]
    pub const fn is_uid(self) -> bool {
        matches!(
            self,
            Self::UidExpunge
                | Self::UidSearch
                | Self::UidSort
                | Self::UidThread
                | Self::UidFetch
                | Self::UidStore
                | Self::UidCopy
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_enable_requires_enable() {
        let caps = CommandKind::Enable.capabilities();
        assert_eq!(caps.len(), 1);
        assert!(caps.contains(&Capability::Enable));
    }

    #[test]
    fn test_core_commands_require_nothing() {
        for kind in [
            CommandKind::Noop,
            CommandKind::Capability,
            CommandKind::Login,
            CommandKind::Select,
            CommandKind::Fetch,
            CommandKind::Logout,
        ] {
            assert!(kind.capabilities().is_empty(), "{kind:?}");
        }
    }

    #[test]
    fn test_uid_verbs() {
        assert_eq!(CommandKind::UidFetch.verb(), "UID FETCH");
        assert!(CommandKind::UidStore.is_uid());
        assert!(!CommandKind::Store.is_uid());
    }
}
