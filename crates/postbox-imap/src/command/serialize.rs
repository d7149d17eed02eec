//! Conversions from typed command pieces to arguments.

use chrono::{DateTime, FixedOffset, NaiveDate};

use crate::types::Flag;

use super::ImapString;
use super::types::{
    FetchAttribute, FetchItems, SearchCriteria, Section, SortCriterion, SortKey, StoreAction,
};

/// Writes a flag list such as `(\Seen $Label)`.
#[must_use]
pub fn flag_list(flags: &[Flag]) -> ImapString {
    ImapString::List(flags.iter().map(|f| ImapString::atom(f.as_str())).collect())
}

/// Writes a search date (`date` grammar, e.g. `1-Feb-1994`).
#[must_use]
pub fn search_date(date: NaiveDate) -> ImapString {
    ImapString::atom(date.format("%-d-%b-%Y").to_string())
}

/// Writes an APPEND `date-time`, e.g. `" 1-Feb-1994 21:52:25 -0800"`.
#[must_use]
pub fn date_time(date: &DateTime<FixedOffset>) -> ImapString {
    ImapString::quoted(date.format("%e-%b-%Y %H:%M:%S %z").to_string())
}

/// Writes FETCH items.
#[must_use]
pub fn fetch_items(items: &FetchItems) -> ImapString {
    match items {
        FetchItems::All => ImapString::atom("ALL"),
        FetchItems::Full => ImapString::atom("FULL"),
        FetchItems::Fast => ImapString::atom("FAST"),
        FetchItems::Items(attrs) => {
            if let [attr] = attrs.as_slice() {
                ImapString::Atom(fetch_attribute(attr))
            } else {
                ImapString::List(
                    attrs
                        .iter()
                        .map(|a| ImapString::Atom(fetch_attribute(a)))
                        .collect(),
                )
            }
        }
    }
}

/// Writes a single FETCH attribute.
#[must_use]
pub fn fetch_attribute(attr: &FetchAttribute) -> String {
    match attr {
        FetchAttribute::Flags => "FLAGS".to_string(),
        FetchAttribute::InternalDate => "INTERNALDATE".to_string(),
        FetchAttribute::Rfc822Size => "RFC822.SIZE".to_string(),
        FetchAttribute::Envelope => "ENVELOPE".to_string(),
        FetchAttribute::Body => "BODY".to_string(),
        FetchAttribute::BodyStructure => "BODYSTRUCTURE".to_string(),
        FetchAttribute::Uid => "UID".to_string(),
        FetchAttribute::Rfc822 => "RFC822".to_string(),
        FetchAttribute::Rfc822Header => "RFC822.HEADER".to_string(),
        FetchAttribute::Rfc822Text => "RFC822.TEXT".to_string(),
        FetchAttribute::ModSeq => "MODSEQ".to_string(),
        FetchAttribute::BodySection(section) => {
            section_item(if section.peek { "BODY.PEEK" } else { "BODY" }, section)
        }
        FetchAttribute::Binary(section) => {
            section_item(if section.peek { "BINARY.PEEK" } else { "BINARY" }, section)
        }
        FetchAttribute::BinarySize(part) => {
            format!("BINARY.SIZE[{}]", part.as_deref().unwrap_or_default())
        }
    }
}

fn section_item(name: &str, section: &Section) -> String {
    let spec = section.spec.as_deref().unwrap_or_default();
    match section.partial {
        Some((offset, length)) => format!("{name}[{spec}]<{offset}.{length}>"),
        None => format!("{name}[{spec}]"),
    }
}

/// Writes the STORE item name and its flag list.
#[must_use]
pub fn store_action(action: &StoreAction, silent: bool) -> [ImapString; 2] {
    let prefix = match action {
        StoreAction::SetFlags(_) => "FLAGS",
        StoreAction::AddFlags(_) => "+FLAGS",
        StoreAction::RemoveFlags(_) => "-FLAGS",
    };
    let item = if silent {
        format!("{prefix}.SILENT")
    } else {
        prefix.to_string()
    };
    [ImapString::Atom(item), flag_list(action.flags())]
}

/// Writes a SORT criteria list such as `(REVERSE DATE SUBJECT)`.
#[must_use]
pub fn sort_criteria(criteria: &[SortCriterion]) -> ImapString {
    let mut items = Vec::with_capacity(criteria.len());
    for criterion in criteria {
        if criterion.reverse {
            items.push(ImapString::atom("REVERSE"));
        }
        let key = match criterion.key {
            SortKey::Arrival => "ARRIVAL",
            SortKey::Cc => "CC",
            SortKey::Date => "DATE",
            SortKey::From => "FROM",
            SortKey::Size => "SIZE",
            SortKey::Subject => "SUBJECT",
            SortKey::To => "TO",
        };
        items.push(ImapString::atom(key));
    }
    ImapString::List(items)
}

/// Appends SEARCH criteria to `out`.
pub fn search_criteria(out: &mut Vec<ImapString>, criteria: &SearchCriteria) {
    let keyword = |out: &mut Vec<ImapString>, key: &str| out.push(ImapString::atom(key));
    let text = |out: &mut Vec<ImapString>, key: &str, value: &str| {
        out.push(ImapString::atom(key));
        out.push(ImapString::astring(value));
    };
    let date = |out: &mut Vec<ImapString>, key: &str, value: NaiveDate| {
        out.push(ImapString::atom(key));
        out.push(search_date(value));
    };

    match criteria {
        SearchCriteria::All => keyword(out, "ALL"),
        SearchCriteria::Answered => keyword(out, "ANSWERED"),
        SearchCriteria::Deleted => keyword(out, "DELETED"),
        SearchCriteria::Draft => keyword(out, "DRAFT"),
        SearchCriteria::Flagged => keyword(out, "FLAGGED"),
        SearchCriteria::New => keyword(out, "NEW"),
        SearchCriteria::Recent => keyword(out, "RECENT"),
        SearchCriteria::Old => keyword(out, "OLD"),
        SearchCriteria::Seen => keyword(out, "SEEN"),
        SearchCriteria::Unanswered => keyword(out, "UNANSWERED"),
        SearchCriteria::Undeleted => keyword(out, "UNDELETED"),
        SearchCriteria::Undraft => keyword(out, "UNDRAFT"),
        SearchCriteria::Unflagged => keyword(out, "UNFLAGGED"),
        SearchCriteria::Unseen => keyword(out, "UNSEEN"),
        SearchCriteria::Keyword(k) => {
            keyword(out, "KEYWORD");
            out.push(ImapString::atom(k.as_str()));
        }
        SearchCriteria::Unkeyword(k) => {
            keyword(out, "UNKEYWORD");
            out.push(ImapString::atom(k.as_str()));
        }
        SearchCriteria::Sequence(set) => out.push(ImapString::Atom(set.to_string())),
        SearchCriteria::Uid(set) => {
            keyword(out, "UID");
            out.push(ImapString::Atom(set.to_string()));
        }
        SearchCriteria::Subject(s) => text(out, "SUBJECT", s),
        SearchCriteria::From(s) => text(out, "FROM", s),
        SearchCriteria::To(s) => text(out, "TO", s),
        SearchCriteria::Cc(s) => text(out, "CC", s),
        SearchCriteria::Bcc(s) => text(out, "BCC", s),
        SearchCriteria::Body(s) => text(out, "BODY", s),
        SearchCriteria::Text(s) => text(out, "TEXT", s),
        SearchCriteria::Since(d) => date(out, "SINCE", *d),
        SearchCriteria::Before(d) => date(out, "BEFORE", *d),
        SearchCriteria::On(d) => date(out, "ON", *d),
        SearchCriteria::SentSince(d) => date(out, "SENTSINCE", *d),
        SearchCriteria::SentBefore(d) => date(out, "SENTBEFORE", *d),
        SearchCriteria::SentOn(d) => date(out, "SENTON", *d),
        SearchCriteria::Larger(size) => {
            keyword(out, "LARGER");
            out.push(ImapString::number(*size));
        }
        SearchCriteria::Smaller(size) => {
            keyword(out, "SMALLER");
            out.push(ImapString::number(*size));
        }
        SearchCriteria::Header(name, value) => {
            keyword(out, "HEADER");
            out.push(ImapString::astring(name));
            out.push(ImapString::astring(value));
        }
        SearchCriteria::ModSeq(modseq) => {
            keyword(out, "MODSEQ");
            out.push(ImapString::number(*modseq));
        }
        SearchCriteria::And(criteria) => {
            if criteria.is_empty() {
                keyword(out, "ALL");
            }
            for c in criteria {
                search_criteria(out, c);
            }
        }
        SearchCriteria::Or(a, b) => {
            keyword(out, "OR");
            out.extend(search_key(a));
            out.extend(search_key(b));
        }
        SearchCriteria::Not(c) => {
            keyword(out, "NOT");
            out.extend(search_key(c));
        }
    }
}

/// OR and NOT take a single search-key; a conjunction is parenthesized.
fn search_key(criteria: &SearchCriteria) -> Vec<ImapString> {
    let mut keys = Vec::new();
    search_criteria(&mut keys, criteria);
    match criteria {
        SearchCriteria::And(items) if items.len() > 1 => vec![ImapString::List(keys)],
        _ => keys,
    }
}
