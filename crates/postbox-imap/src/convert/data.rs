//! Data response converters, one per [`DataResponseType`].

use crate::parser::{DataResponse, DataResponseType, ImapData};
use crate::types::{
    Capability, CapabilitySet, ComparatorOutcome, ESearchResult, Flag, Flags, IdParams, ListEntry,
    Mailbox, MailboxAttribute, MetadataEntry, NamespaceDesc, Namespaces, Quota, QuotaResource,
    SearchResult, SequenceSet, StatusAttributes, ThreadNode,
};
use crate::{Error, Result};

use super::{fetch, item, pairs, reject_malformed};

/// Interprets capability atoms; anything that is not text is skipped.
#[must_use]
pub fn capabilities(items: &[ImapData]) -> CapabilitySet {
    items
        .iter()
        .filter_map(|item| item.as_str().ok())
        .map(Capability::parse)
        .collect()
}

/// Interprets a parenthesized flag list.
///
/// # Errors
///
/// Returns [`Error::MalformedData`] if `item` is not a list of text.
pub fn flag_list(item: &ImapData) -> Result<Flags> {
    item.as_list()?
        .iter()
        .map(|flag| flag.as_str().map(Flag::parse))
        .collect()
}

/// `* CAPABILITY ...`
pub fn capability(resp: &DataResponse) -> Result<CapabilitySet> {
    reject_malformed(resp, DataResponseType::Capability, 0)?;
    Ok(capabilities(&resp.data))
}

/// `* ENABLED ...`
pub fn enabled(resp: &DataResponse) -> Result<CapabilitySet> {
    reject_malformed(resp, DataResponseType::Enabled, 0)?;
    Ok(capabilities(&resp.data))
}

/// `* LIST`, `* LSUB` or `* XLIST`: `(attributes) delimiter name [extended]`.
pub fn list(resp: &DataResponse) -> Result<ListEntry> {
    let expected = match resp.kind {
        DataResponseType::Lsub | DataResponseType::XList => resp.kind,
        _ => DataResponseType::List,
    };
    reject_malformed(resp, expected, 3)?;

    let attributes = resp.data[0]
        .as_list()?
        .iter()
        .map(|attr| attr.as_str().map(MailboxAttribute::parse))
        .collect::<Result<Vec<_>>>()?;
    let delimiter = resp.data[1]
        .to_nstring_lossy()?
        .and_then(|d| d.chars().next());
    let mailbox = Mailbox::from_wire(resp.data[2].as_bytes()?);

    let mut extended = Vec::new();
    if let Some(ext) = resp.data.get(3) {
        for (name, value) in pairs(ext.as_list()?)? {
            let name = name.as_str()?.to_ascii_uppercase();
            let values = match value {
                ImapData::List(values) => values
                    .iter()
                    .map(ImapData::to_string_lossy)
                    .collect::<Result<Vec<_>>>()?,
                other => vec![other.to_string()],
            };
            extended.push((name, values));
        }
    }

    Ok(ListEntry {
        attributes,
        delimiter,
        mailbox,
        extended,
    })
}

/// `* STATUS mailbox (name value ...)`
pub fn status(resp: &DataResponse) -> Result<(Mailbox, StatusAttributes)> {
    reject_malformed(resp, DataResponseType::Status, 2)?;

    let mailbox = Mailbox::from_wire(resp.data[0].as_bytes()?);
    let mut attrs = StatusAttributes::default();
    for (name, value) in pairs(resp.data[1].as_list()?)? {
        match name.as_str()?.to_ascii_uppercase().as_str() {
            "MESSAGES" => attrs.messages = Some(value.as_number()?),
            "RECENT" => attrs.recent = Some(value.as_number()?),
            "UIDNEXT" => attrs.uid_next = Some(value.as_number()?),
            "UIDVALIDITY" => attrs.uid_validity = Some(value.as_number()?),
            "UNSEEN" => attrs.unseen = Some(value.as_number()?),
            "HIGHESTMODSEQ" => attrs.highest_modseq = Some(value.as_number()?),
            _ => {}
        }
    }
    Ok((mailbox, attrs))
}

/// Numbers optionally followed by `(MODSEQ n)`.
fn numbers_with_modseq(items: &[ImapData]) -> Result<SearchResult> {
    let mut result = SearchResult::default();
    for item in items {
        match item {
            ImapData::List(modseq) => {
                if modseq.len() != 2 || !modseq[0].is_word("MODSEQ") {
                    return Err(Error::malformed("expected (MODSEQ n) after search results"));
                }
                result.highest_modseq = Some(modseq[1].as_number()?);
            }
            other => result.numbers.push(other.as_number()?),
        }
    }
    Ok(result)
}

/// `* SEARCH 2 3 6 [(MODSEQ 917162500)]`
pub fn search(resp: &DataResponse) -> Result<SearchResult> {
    reject_malformed(resp, DataResponseType::Search, 0)?;
    numbers_with_modseq(&resp.data)
}

/// `* SORT 5 3 4 1 2`
pub fn sort(resp: &DataResponse) -> Result<SearchResult> {
    reject_malformed(resp, DataResponseType::Sort, 0)?;
    numbers_with_modseq(&resp.data)
}

/// `* ESEARCH [(TAG "A282")] [UID] MIN 2 COUNT 3 ...`
pub fn esearch(resp: &DataResponse) -> Result<ESearchResult> {
    reject_malformed(resp, DataResponseType::ESearch, 0)?;

    let mut rest = resp.data.as_slice();
    let mut result = ESearchResult::default();

    if let Some(ImapData::List(correlator)) = rest.first() {
        if correlator.len() == 2 && correlator[0].is_word("TAG") {
            result.tag = Some(correlator[1].to_string_lossy()?);
        }
        rest = &rest[1..];
    }
    if rest.first().is_some_and(|i| i.is_word("UID")) {
        result.uid = true;
        rest = &rest[1..];
    }

    for (name, value) in pairs(rest)? {
        match name.as_str()?.to_ascii_uppercase().as_str() {
            "MIN" => result.min = Some(value.as_number()?),
            "MAX" => result.max = Some(value.as_number()?),
            "COUNT" => result.count = Some(value.as_number()?),
            "MODSEQ" => result.modseq = Some(value.as_number()?),
            "ALL" => result.all = Some(SequenceSet::parse(value.as_str()?)?),
            _ => {}
        }
    }
    Ok(result)
}

/// `* FLAGS (\Answered \Flagged ...)`
pub fn flags(resp: &DataResponse) -> Result<Flags> {
    reject_malformed(resp, DataResponseType::Flags, 1)?;
    flag_list(&resp.data[0])
}

fn leading_number(resp: &DataResponse, kind: DataResponseType) -> Result<u32> {
    reject_malformed(resp, kind, 1)?;
    resp.data[0].as_number()
}

/// `* 23 EXISTS`
pub fn exists(resp: &DataResponse) -> Result<u32> {
    leading_number(resp, DataResponseType::Exists)
}

/// `* 5 RECENT`
pub fn recent(resp: &DataResponse) -> Result<u32> {
    leading_number(resp, DataResponseType::Recent)
}

/// `* 3 EXPUNGE`
pub fn expunge(resp: &DataResponse) -> Result<u32> {
    leading_number(resp, DataResponseType::Expunge)
}

/// `* 12 FETCH (...)`, returning the sequence number and attributes.
pub fn fetch(resp: &DataResponse) -> Result<(u32, crate::types::FetchAttributes)> {
    reject_malformed(resp, DataResponseType::Fetch, 2)?;
    let seq = resp.data[0].as_number()?;
    Ok((seq, fetch::attributes(&resp.data[1])?))
}

/// `* QUOTA root (STORAGE 10 512 ...)`
pub fn quota(resp: &DataResponse) -> Result<Quota> {
    reject_malformed(resp, DataResponseType::Quota, 2)?;

    let root = resp.data[0].to_string_lossy()?;
    let list = resp.data[1].as_list()?;
    if list.len() % 3 != 0 {
        return Err(Error::MalformedData(format!(
            "expected quota resource triples but got {} items",
            list.len()
        )));
    }
    let resources = list
        .chunks_exact(3)
        .map(|triple| {
            Ok(QuotaResource {
                name: triple[0].as_str()?.to_ascii_uppercase(),
                usage: triple[1].as_number()?,
                limit: triple[2].as_number()?,
            })
        })
        .collect::<Result<Vec<_>>>()?;
    Ok(Quota { root, resources })
}

/// `* QUOTAROOT mailbox root...`
pub fn quota_root(resp: &DataResponse) -> Result<(Mailbox, Vec<String>)> {
    reject_malformed(resp, DataResponseType::QuotaRoot, 1)?;
    let mailbox = Mailbox::from_wire(resp.data[0].as_bytes()?);
    let roots = resp.data[1..]
        .iter()
        .map(ImapData::to_string_lossy)
        .collect::<Result<Vec<_>>>()?;
    Ok((mailbox, roots))
}

fn namespace_list(descs: &ImapData) -> Result<Vec<NamespaceDesc>> {
    descs.as_list_or_nil()?
        .iter()
        .map(|desc| {
            let desc = desc.as_list()?;
            let prefix = Mailbox::from_wire(item(desc, 0)?.as_bytes()?).0;
            let delimiter = item(desc, 1)?
                .to_nstring_lossy()?
                .and_then(|d| d.chars().next());
            let mut extensions = Vec::new();
            for (name, values) in pairs(&desc[2..])? {
                let values = values
                    .as_list()?
                    .iter()
                    .map(ImapData::to_string_lossy)
                    .collect::<Result<Vec<_>>>()?;
                extensions.push((name.to_string_lossy()?, values));
            }
            Ok(NamespaceDesc {
                prefix,
                delimiter,
                extensions,
            })
        })
        .collect()
}

/// `* NAMESPACE personal other shared`, each NIL or a list of descriptors.
pub fn namespace(resp: &DataResponse) -> Result<Namespaces> {
    reject_malformed(resp, DataResponseType::Namespace, 3)?;
    Ok(Namespaces {
        personal: namespace_list(&resp.data[0])?,
        other: namespace_list(&resp.data[1])?,
        shared: namespace_list(&resp.data[2])?,
    })
}

/// `* ID NIL` or `* ID ("name" "value" ...)`
pub fn id(resp: &DataResponse) -> Result<IdParams> {
    reject_malformed(resp, DataResponseType::Id, 1)?;
    if resp.data[0].is_nil() {
        return Ok(None);
    }
    let params = pairs(resp.data[0].as_list()?)?
        .map(|(name, value)| Ok((name.to_string_lossy()?, value.to_nstring_lossy()?)))
        .collect::<Result<Vec<_>>>()?;
    Ok(Some(params))
}

fn thread_node(items: &[ImapData]) -> Result<ThreadNode> {
    let split = items
        .iter()
        .position(ImapData::is_list)
        .unwrap_or(items.len());
    let (numbers, nested) = items.split_at(split);
    let children = nested
        .iter()
        .map(|child| thread_node(child.as_list()?))
        .collect::<Result<Vec<_>>>()?;

    let Some((last, parents)) = numbers.split_last() else {
        return Ok(ThreadNode {
            number: None,
            children,
        });
    };
    let mut node = ThreadNode {
        number: Some(last.as_number()?),
        children,
    };
    for parent in parents.iter().rev() {
        node = ThreadNode {
            number: Some(parent.as_number()?),
            children: vec![node],
        };
    }
    Ok(node)
}

/// `* THREAD (2)(3 6 (4 23)(44 7 96))`
pub fn thread(resp: &DataResponse) -> Result<Vec<ThreadNode>> {
    reject_malformed(resp, DataResponseType::Thread, 0)?;
    resp.data
        .iter()
        .map(|thread| thread_node(thread.as_list()?))
        .collect()
}

/// `* LANGUAGE (EN DE IT i-default)`
pub fn language(resp: &DataResponse) -> Result<Vec<String>> {
    reject_malformed(resp, DataResponseType::Language, 1)?;
    let tags = match &resp.data[0] {
        ImapData::List(tags) => tags.as_slice(),
        _ => resp.data.as_slice(),
    };
    tags.iter().map(ImapData::to_string_lossy).collect()
}

/// `* COMPARATOR i;unicode-casemap [(i;octet i;ascii-casemap)]`
pub fn comparator(resp: &DataResponse) -> Result<ComparatorOutcome> {
    reject_malformed(resp, DataResponseType::Comparator, 1)?;
    let active = Some(resp.data[0].to_string_lossy()?);
    let matching = match resp.data.get(1) {
        Some(list) => list
            .as_list()?
            .iter()
            .map(ImapData::to_string_lossy)
            .collect::<Result<Vec<_>>>()?,
        None => Vec::new(),
    };
    Ok(ComparatorOutcome { active, matching })
}

/// `* METADATA mailbox (entry value ...)` or the unsolicited
/// `* METADATA mailbox entry...` form, whose entries carry no value.
pub fn metadata(resp: &DataResponse) -> Result<Vec<MetadataEntry>> {
    reject_malformed(resp, DataResponseType::Metadata, 2)?;
    let mailbox = Mailbox::from_wire(resp.data[0].as_bytes()?);

    if let ImapData::List(values) = &resp.data[1] {
        return pairs(values)?
            .map(|(entry, value)| {
                Ok(MetadataEntry {
                    mailbox: mailbox.clone(),
                    entry: entry.to_string_lossy()?,
                    value: value.as_nstring()?.map(<[u8]>::to_vec),
                })
            })
            .collect();
    }

    resp.data[1..]
        .iter()
        .map(|entry| {
            Ok(MetadataEntry {
                mailbox: mailbox.clone(),
                entry: entry.to_string_lossy()?,
                value: None,
            })
        })
        .collect()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::parser::{Response, ResponseReceiver};

    fn parse(line: &[u8]) -> DataResponse {
        match ResponseReceiver::new().receive_line(line).unwrap() {
            Some(Response::Data(data)) => data,
            other => panic!("expected data, got {other:?}"),
        }
    }

    #[test]
    fn test_status() {
        let (mailbox, attrs) =
            status(&parse(b"* STATUS INBOX (MESSAGES 231 UIDNEXT 44292)\r\n")).unwrap();
        assert!(mailbox.is_inbox());
        assert_eq!(attrs.messages, Some(231));
        assert_eq!(attrs.uid_next, Some(44_292));
        assert_eq!(attrs.unseen, None);
    }

    #[test]
    fn test_status_requires_list() {
        let err = status(&parse(b"* STATUS INBOX MESSAGES\r\n")).unwrap_err();
        assert!(matches!(err, Error::MalformedData(_)));
    }

    #[test]
    fn test_status_wrong_type() {
        let err = status(&parse(b"* SEARCH 1\r\n")).unwrap_err();
        assert!(err.to_string().contains("expected data type is STATUS"));
    }

    #[test]
    fn test_capability() {
        let caps = capability(&parse(b"* CAPABILITY IMAP4rev1 IDLE AUTH=PLAIN\r\n")).unwrap();
        assert!(caps.contains(&Capability::Idle));
        assert!(caps.supports_auth("plain"));
    }

    #[test]
    fn test_list_decodes_utf7() {
        let entry = list(&parse(b"* LIST (\\HasNoChildren \\Sent) \"/\" \"Sent &AMk-l&AOk-ments\"\r\n"))
            .unwrap();
        assert_eq!(entry.delimiter, Some('/'));
        assert_eq!(entry.mailbox.as_str(), "Sent \u{c9}l\u{e9}ments");
        assert!(entry.has_attribute(&MailboxAttribute::Sent));
    }

    #[test]
    fn test_list_extended_childinfo() {
        let entry = list(&parse(
            b"* LIST (\\Subscribed) \"/\" Foo (\"CHILDINFO\" (\"SUBSCRIBED\"))\r\n",
        ))
        .unwrap();
        assert_eq!(
            entry.extended,
            vec![("CHILDINFO".to_string(), vec!["SUBSCRIBED".to_string()])]
        );
    }

    #[test]
    fn test_lsub_nil_delimiter() {
        let entry = list(&parse(b"* LSUB () NIL Drafts\r\n")).unwrap();
        assert_eq!(entry.delimiter, None);
    }

    #[test]
    fn test_search_with_modseq() {
        let result = search(&parse(b"* SEARCH 2 5 6 (MODSEQ 917162500)\r\n")).unwrap();
        assert_eq!(result.numbers, vec![2, 5, 6]);
        assert_eq!(result.highest_modseq, Some(917_162_500));
    }

    #[test]
    fn test_esearch() {
        let result = esearch(&parse(
            b"* ESEARCH (TAG \"0012\") UID MIN 4 MAX 29 ALL 4:18,21,28:29 COUNT 17\r\n",
        ))
        .unwrap();
        assert_eq!(result.tag.as_deref(), Some("0012"));
        assert!(result.uid);
        assert_eq!(result.min, Some(4));
        assert_eq!(result.max, Some(29));
        assert_eq!(result.count, Some(17));
        assert_eq!(result.all.unwrap().to_vec().unwrap().len(), 18);
    }

    #[test]
    fn test_numeric_first_converters() {
        assert_eq!(exists(&parse(b"* 23 EXISTS\r\n")).unwrap(), 23);
        assert_eq!(recent(&parse(b"* 5 RECENT\r\n")).unwrap(), 5);
        assert_eq!(expunge(&parse(b"* 3 EXPUNGE\r\n")).unwrap(), 3);
    }

    #[test]
    fn test_fetch() {
        let (seq, attrs) = fetch(&parse(b"* 5 FETCH (FLAGS (\\Seen) UID 42)\r\n")).unwrap();
        assert_eq!(seq, 5);
        assert_eq!(attrs.uid, Some(42));
        assert!(attrs.flags.unwrap().is_seen());
    }

    #[test]
    fn test_quota() {
        let quota = quota(&parse(b"* QUOTA \"\" (STORAGE 10 512 MESSAGE 3 100)\r\n")).unwrap();
        assert_eq!(quota.root, "");
        assert_eq!(quota.resource("storage").map(|r| r.limit), Some(512));
        assert_eq!(quota.resource("MESSAGE").map(|r| r.usage), Some(3));
        assert_eq!(quota.resources.len(), 2);
    }

    #[test]
    fn test_quota_root() {
        let (mailbox, roots) = quota_root(&parse(b"* QUOTAROOT INBOX \"\"\r\n")).unwrap();
        assert!(mailbox.is_inbox());
        assert_eq!(roots, vec![String::new()]);
    }

    #[test]
    fn test_namespace() {
        let ns = namespace(&parse(
            b"* NAMESPACE ((\"\" \"/\")) ((\"~\" \"/\")) ((\"#shared/\" \"/\" \"X-PARAM\" (\"FLAG1\")))\r\n",
        ))
        .unwrap();
        assert_eq!(ns.personal[0].prefix, "");
        assert_eq!(ns.personal[0].delimiter, Some('/'));
        assert_eq!(ns.other[0].prefix, "~");
        assert_eq!(
            ns.shared[0].extensions,
            vec![("X-PARAM".to_string(), vec!["FLAG1".to_string()])]
        );

        let none = namespace(&parse(b"* NAMESPACE ((\"\" \".\")) NIL NIL\r\n")).unwrap();
        assert!(none.other.is_empty());
        assert!(none.shared.is_empty());
    }

    #[test]
    fn test_id() {
        let params = id(&parse(b"* ID (\"name\" \"Cyrus\" \"os\" NIL)\r\n"))
            .unwrap()
            .unwrap();
        assert_eq!(params[0], ("name".to_string(), Some("Cyrus".to_string())));
        assert_eq!(params[1], ("os".to_string(), None));
        assert_eq!(id(&parse(b"* ID NIL\r\n")).unwrap(), None);
    }

    #[test]
    fn test_thread() {
        let threads = thread(&parse(b"* THREAD (2)(3 6 (4 23)(44 7 96))((3)(5))\r\n")).unwrap();
        assert_eq!(threads.len(), 3);

        assert_eq!(threads[0].number, Some(2));
        assert!(threads[0].children.is_empty());

        let second = &threads[1];
        assert_eq!(second.number, Some(3));
        assert_eq!(second.children[0].number, Some(6));
        assert_eq!(second.children[0].children.len(), 2);
        assert_eq!(second.flatten(), vec![3, 6, 4, 23, 44, 7, 96]);

        assert_eq!(threads[2].number, None);
        assert_eq!(threads[2].flatten(), vec![3, 5]);
    }

    #[test]
    fn test_language_and_comparator() {
        let tags = language(&parse(b"* LANGUAGE (EN DE IT i-default)\r\n")).unwrap();
        assert_eq!(tags, vec!["EN", "DE", "IT", "i-default"]);

        let outcome =
            comparator(&parse(b"* COMPARATOR i;basic (i;octet i;ascii-casemap)\r\n")).unwrap();
        assert_eq!(outcome.active.as_deref(), Some("i;basic"));
        assert_eq!(outcome.matching, vec!["i;octet", "i;ascii-casemap"]);
    }

    #[test]
    fn test_metadata_values_and_entries() {
        let entries = metadata(&parse(
            b"* METADATA \"INBOX\" (/private/comment \"My comment\" /shared/comment NIL)\r\n",
        ))
        .unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].value.as_deref(), Some(&b"My comment"[..]));
        assert_eq!(entries[1].value, None);

        let changed = metadata(&parse(b"* METADATA \"\" /shared/comment\r\n")).unwrap();
        assert_eq!(changed[0].entry, "/shared/comment");
        assert!(changed[0].value.is_none());
    }

    #[test]
    fn test_flags() {
        let flags = flags(&parse(b"* FLAGS (\\Answered \\Flagged $Forwarded)\r\n")).unwrap();
        assert_eq!(flags.len(), 3);
        assert!(flags.contains(&Flag::Keyword("$Forwarded".to_string())));
    }
}
