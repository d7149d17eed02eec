//! Data types for extension responses.

use super::{Mailbox, SequenceSet};

/// One resource limit within a quota root (RFC 2087).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuotaResource {
    /// Resource name such as `STORAGE` or `MESSAGE`.
    pub name: String,
    /// Current usage.
    pub usage: u64,
    /// Limit.
    pub limit: u64,
}

/// QUOTA response.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Quota {
    /// Quota root name.
    pub root: String,
    /// Resource limits.
    pub resources: Vec<QuotaResource>,
}

impl Quota {
    /// Finds a resource by name, ignoring ASCII case.
    #[must_use]
    pub fn resource(&self, name: &str) -> Option<&QuotaResource> {
        self.resources.iter().find(|r| r.name.eq_ignore_ascii_case(name))
    }
}

/// GETQUOTAROOT result.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct QuotaRoots {
    /// Mailbox the roots apply to.
    pub mailbox: Option<Mailbox>,
    /// Quota root names.
    pub roots: Vec<String>,
    /// QUOTA responses received alongside.
    pub quotas: Vec<Quota>,
}

/// One namespace description (RFC 2342).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NamespaceDesc {
    /// Namespace prefix.
    pub prefix: String,
    /// Hierarchy delimiter.
    pub delimiter: Option<char>,
    /// Namespace response extensions.
    pub extensions: Vec<(String, Vec<String>)>,
}

/// NAMESPACE response.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Namespaces {
    /// Personal namespaces.
    pub personal: Vec<NamespaceDesc>,
    /// Other users' namespaces.
    pub other: Vec<NamespaceDesc>,
    /// Shared namespaces.
    pub shared: Vec<NamespaceDesc>,
}

/// Node of a THREAD response tree (RFC 5256).
///
/// `number` is `None` for a placeholder parent whose children are siblings
/// with no common root message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ThreadNode {
    /// Message number or UID.
    pub number: Option<u32>,
    /// Replies.
    pub children: Vec<Self>,
}

impl ThreadNode {
    /// Returns every message number in the subtree, depth first.
    #[must_use]
    pub fn flatten(&self) -> Vec<u32> {
        let mut out = Vec::new();
        self.collect(&mut out);
        out
    }

    fn collect(&self, out: &mut Vec<u32>) {
        out.extend(self.number);
        for child in &self.children {
            child.collect(out);
        }
    }
}

/// SEARCH or SORT result.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SearchResult {
    /// Matching message numbers or UIDs, in server order.
    pub numbers: Vec<u32>,
    /// Trailing `(MODSEQ n)` when CONDSTORE criteria were used.
    pub highest_modseq: Option<u64>,
}

/// ESEARCH response (RFC 4731).
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ESearchResult {
    /// Tag of the command this result correlates to.
    pub tag: Option<String>,
    /// Numbers are UIDs.
    pub uid: bool,
    /// MIN.
    pub min: Option<u32>,
    /// MAX.
    pub max: Option<u32>,
    /// ALL.
    pub all: Option<SequenceSet>,
    /// COUNT.
    pub count: Option<u32>,
    /// MODSEQ.
    pub modseq: Option<u64>,
}

/// Result of a SEARCH family command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchOutcome {
    /// Plain SEARCH or SORT response.
    Numbers(SearchResult),
    /// ESEARCH response.
    Extended(ESearchResult),
}

impl SearchOutcome {
    /// Returns matching numbers when they are listed explicitly.
    #[must_use]
    pub fn numbers(&self) -> Option<Vec<u32>> {
        match self {
            Self::Numbers(result) => Some(result.numbers.clone()),
            Self::Extended(result) => result.all.as_ref().and_then(|set| set.to_vec().ok()),
        }
    }
}

/// METADATA entry (RFC 5464).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetadataEntry {
    /// Mailbox, empty for server annotations.
    pub mailbox: Mailbox,
    /// Entry name such as `/private/comment`.
    pub entry: String,
    /// Value, `None` when absent (NIL).
    pub value: Option<Vec<u8>>,
}

/// COMPARATOR result (RFC 5255).
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ComparatorOutcome {
    /// Active comparator.
    pub active: Option<String>,
    /// Comparators matching the requested patterns.
    pub matching: Vec<String>,
}

/// ID parameters (RFC 2971); `None` when the server sent NIL.
pub type IdParams = Option<Vec<(String, Option<String>)>>;

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_thread_flatten() {
        let node = ThreadNode {
            number: Some(3),
            children: vec![
                ThreadNode {
                    number: Some(6),
                    children: vec![],
                },
                ThreadNode {
                    number: None,
                    children: vec![ThreadNode {
                        number: Some(4),
                        children: vec![],
                    }],
                },
            ],
        };
        assert_eq!(node.flatten(), vec![3, 6, 4]);
    }

    #[test]
    fn test_quota_resource_lookup() {
        let quota = Quota {
            root: String::new(),
            resources: vec![QuotaResource {
                name: "STORAGE".to_string(),
                usage: 10,
                limit: 512,
            }],
        };
        assert_eq!(quota.resource("storage").unwrap().limit, 512);
        assert!(quota.resource("MESSAGE").is_none());
    }

    #[test]
    fn test_search_outcome_numbers() {
        let extended = SearchOutcome::Extended(ESearchResult {
            all: Some(SequenceSet::parse("2,10:11").unwrap()),
            ..ESearchResult::default()
        });
        assert_eq!(extended.numbers().unwrap(), vec![2, 10, 11]);

        let empty = SearchOutcome::Extended(ESearchResult::default());
        assert!(empty.numbers().is_none());
    }
}
