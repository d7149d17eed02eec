//! SEARCH, SORT and THREAD.

use crate::command::serialize::{search_criteria, sort_criteria};
use crate::command::{ImapString, SearchCriteria, SearchReturn, SortCriterion};
use crate::convert;
use crate::parser::{DataResponse, DataResponseType, TaggedStatus};
use crate::transaction::{CommandKind, Exchange};
use crate::types::{
    Capability, CapabilitySet, ESearchResult, SearchOutcome, SearchResult, ThreadNode,
};
use crate::{Error, Result};

/// Charset for criteria: the caller's choice, or UTF-8 when a key is not
/// ASCII.
fn effective_charset(charset: Option<&str>, criteria: &SearchCriteria) -> Option<String> {
    charset
        .map(str::to_string)
        .or_else(|| criteria.requires_charset().then(|| "UTF-8".to_string()))
}

/// `RETURN (...)` prefix shared by ESEARCH and ESORT.
fn return_options(args: &mut Vec<ImapString>, options: &[SearchReturn]) {
    if options.is_empty() {
        return;
    }
    args.push(ImapString::atom("RETURN"));
    args.push(ImapString::List(
        options
            .iter()
            .map(|option| ImapString::atom(option.as_str()))
            .collect(),
    ));
}

/// Collects SEARCH, SORT and ESEARCH responses.
#[derive(Debug, Default)]
struct Matches {
    numbers: SearchResult,
    extended: Option<ESearchResult>,
}

impl Matches {
    fn on_data(&mut self, data: &DataResponse) -> Result<()> {
        let partial = match data.kind {
            DataResponseType::Search => convert::data::search(data)?,
            DataResponseType::Sort => convert::data::sort(data)?,
            DataResponseType::ESearch => {
                self.extended = Some(convert::data::esearch(data)?);
                return Ok(());
            }
            _ => return Ok(()),
        };
        self.numbers.numbers.extend(partial.numbers);
        if partial.highest_modseq.is_some() {
            self.numbers.highest_modseq = partial.highest_modseq;
        }
        Ok(())
    }

    fn take(&mut self) -> SearchOutcome {
        let matches = std::mem::take(self);
        matches.extended.map_or(
            SearchOutcome::Numbers(matches.numbers),
            SearchOutcome::Extended,
        )
    }
}

/// SEARCH or UID SEARCH, with ESEARCH result options (RFC 4731).
#[derive(Debug)]
pub struct Search {
    uid: bool,
    charset: Option<String>,
    criteria: SearchCriteria,
    return_opts: Vec<SearchReturn>,
    matches: Matches,
}

impl Search {
    /// Searches for messages matching `criteria`.
    #[must_use]
    pub fn new(criteria: SearchCriteria) -> Self {
        Self {
            uid: false,
            charset: None,
            criteria,
            return_opts: Vec::new(),
            matches: Matches::default(),
        }
    }

    /// Returns UIDs instead of sequence numbers.
    #[must_use]
    pub const fn uid(mut self) -> Self {
        self.uid = true;
        self
    }

    /// Sets the charset of the string keys.
    #[must_use]
    pub fn charset(mut self, charset: impl Into<String>) -> Self {
        self.charset = Some(charset.into());
        self
    }

    /// Requests ESEARCH results.
    #[must_use]
    pub fn returning(mut self, options: Vec<SearchReturn>) -> Self {
        self.return_opts = options;
        self
    }
}

impl Exchange for Search {
    type Output = SearchOutcome;

    fn kind(&self) -> CommandKind {
        if self.uid {
            CommandKind::UidSearch
        } else {
            CommandKind::Search
        }
    }

    fn required_capabilities(&self) -> CapabilitySet {
        let mut caps = CapabilitySet::new();
        if !self.return_opts.is_empty() {
            caps.insert(Capability::ESearch);
        }
        if self.criteria.uses_modseq() {
            caps.insert(Capability::CondStore);
        }
        caps
    }

    fn prepare(&mut self) -> Result<Vec<ImapString>> {
        let mut args = Vec::new();
        return_options(&mut args, &self.return_opts);
        if let Some(charset) = effective_charset(self.charset.as_deref(), &self.criteria) {
            args.push(ImapString::atom("CHARSET"));
            args.push(ImapString::astring(&charset));
        }
        search_criteria(&mut args, &self.criteria);
        Ok(args)
    }

    fn on_data(&mut self, data: &DataResponse) -> Result<()> {
        self.matches.on_data(data)
    }

    fn finish_ok(&mut self, _tagged: &TaggedStatus) -> Result<SearchOutcome> {
        Ok(self.matches.take())
    }
}

/// SORT or UID SORT (RFC 5256), with ESORT result options (RFC 5267).
#[derive(Debug)]
pub struct Sort {
    uid: bool,
    sort_criteria: Vec<SortCriterion>,
    charset: Option<String>,
    criteria: SearchCriteria,
    return_opts: Vec<SearchReturn>,
    matches: Matches,
}

impl Sort {
    /// Sorts the messages matching `criteria` by `sort_criteria`.
    #[must_use]
    pub fn new(sort_criteria: Vec<SortCriterion>, criteria: SearchCriteria) -> Self {
        Self {
            uid: false,
            sort_criteria,
            charset: None,
            criteria,
            return_opts: Vec::new(),
            matches: Matches::default(),
        }
    }

    /// Returns UIDs instead of sequence numbers.
    #[must_use]
    pub const fn uid(mut self) -> Self {
        self.uid = true;
        self
    }

    /// Sets the charset; defaults to UTF-8.
    #[must_use]
    pub fn charset(mut self, charset: impl Into<String>) -> Self {
        self.charset = Some(charset.into());
        self
    }

    /// Requests ESEARCH results in sort order. `MIN` and `MAX` then name
    /// the first and last message of the sorted list.
    #[must_use]
    pub fn returning(mut self, options: Vec<SearchReturn>) -> Self {
        self.return_opts = options;
        self
    }
}

impl Exchange for Sort {
    type Output = SearchOutcome;

    fn kind(&self) -> CommandKind {
        if self.uid {
            CommandKind::UidSort
        } else {
            CommandKind::Sort
        }
    }

    fn required_capabilities(&self) -> CapabilitySet {
        let caps = self.kind().capabilities();
        if self.return_opts.is_empty() {
            caps
        } else {
            caps.with(Capability::ESort)
        }
    }

    fn prepare(&mut self) -> Result<Vec<ImapString>> {
        if self.sort_criteria.is_empty() {
            return Err(Error::request("SORT needs at least one sort key"));
        }
        let charset = self.charset.as_deref().unwrap_or("UTF-8");
        let mut args = Vec::new();
        return_options(&mut args, &self.return_opts);
        args.push(sort_criteria(&self.sort_criteria));
        args.push(ImapString::astring(charset));
        search_criteria(&mut args, &self.criteria);
        Ok(args)
    }

    fn on_data(&mut self, data: &DataResponse) -> Result<()> {
        self.matches.on_data(data)
    }

    fn finish_ok(&mut self, _tagged: &TaggedStatus) -> Result<SearchOutcome> {
        Ok(self.matches.take())
    }
}

/// THREAD or UID THREAD (RFC 5256).
#[derive(Debug)]
pub struct Thread {
    uid: bool,
    algorithm: String,
    charset: Option<String>,
    criteria: SearchCriteria,
    threads: Vec<ThreadNode>,
}

impl Thread {
    /// Threads the messages matching `criteria` with `algorithm`, e.g.
    /// `REFERENCES` or `ORDEREDSUBJECT`.
    pub fn new(algorithm: impl Into<String>, criteria: SearchCriteria) -> Self {
        Self {
            uid: false,
            algorithm: algorithm.into(),
            charset: None,
            criteria,
            threads: Vec::new(),
        }
    }

    /// Returns UIDs instead of sequence numbers.
    #[must_use]
    pub const fn uid(mut self) -> Self {
        self.uid = true;
        self
    }

    /// Sets the charset; defaults to UTF-8.
    #[must_use]
    pub fn charset(mut self, charset: impl Into<String>) -> Self {
        self.charset = Some(charset.into());
        self
    }
}

impl Exchange for Thread {
    type Output = Vec<ThreadNode>;

    fn kind(&self) -> CommandKind {
        if self.uid {
            CommandKind::UidThread
        } else {
            CommandKind::Thread
        }
    }

    fn required_capabilities(&self) -> CapabilitySet {
        CapabilitySet::new().with(Capability::Thread(self.algorithm.to_ascii_uppercase()))
    }

    fn prepare(&mut self) -> Result<Vec<ImapString>> {
        if self.algorithm.is_empty() {
            return Err(Error::request("THREAD needs an algorithm"));
        }
        let charset = self.charset.as_deref().unwrap_or("UTF-8");
        let mut args = vec![
            ImapString::atom(self.algorithm.to_ascii_uppercase()),
            ImapString::astring(charset),
        ];
        search_criteria(&mut args, &self.criteria);
        Ok(args)
    }

    fn on_data(&mut self, data: &DataResponse) -> Result<()> {
        if data.kind == DataResponseType::Thread {
            self.threads.extend(convert::data::thread(data)?);
        }
        Ok(())
    }

    fn finish_ok(&mut self, _tagged: &TaggedStatus) -> Result<Vec<ThreadNode>> {
        Ok(std::mem::take(&mut self.threads))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::command::SortKey;

    #[test]
    fn test_search_adds_utf8_charset() {
        let mut search = Search::new(SearchCriteria::Subject("Grüße".to_string()));
        let args = search.prepare().unwrap();
        assert_eq!(args[0], ImapString::atom("CHARSET"));
        assert_eq!(args[1], ImapString::atom("UTF-8"));
        assert_eq!(args[2], ImapString::atom("SUBJECT"));
        assert!(matches!(args[3], ImapString::Literal { .. }));
    }

    #[test]
    fn test_search_ascii_has_no_charset() {
        let mut search = Search::new(SearchCriteria::Unseen).uid();
        assert_eq!(search.kind(), CommandKind::UidSearch);
        assert_eq!(search.prepare().unwrap(), vec![ImapString::atom("UNSEEN")]);
        assert!(search.required_capabilities().is_empty());
    }

    #[test]
    fn test_search_return_options() {
        let mut search = Search::new(SearchCriteria::All)
            .returning(vec![SearchReturn::Min, SearchReturn::Count]);
        assert!(search.required_capabilities().contains(&Capability::ESearch));
        assert_eq!(
            search.prepare().unwrap(),
            vec![
                ImapString::atom("RETURN"),
                ImapString::List(vec![ImapString::atom("MIN"), ImapString::atom("COUNT")]),
                ImapString::atom("ALL"),
            ]
        );
    }

    #[test]
    fn test_sort_arguments() {
        let mut sort = Sort::new(
            vec![
                SortCriterion::descending(SortKey::Date),
                SortCriterion::ascending(SortKey::Subject),
            ],
            SearchCriteria::All,
        );
        assert!(sort.required_capabilities().contains(&Capability::Sort));
        assert_eq!(
            sort.prepare().unwrap(),
            vec![
                ImapString::List(vec![
                    ImapString::atom("REVERSE"),
                    ImapString::atom("DATE"),
                    ImapString::atom("SUBJECT"),
                ]),
                ImapString::atom("UTF-8"),
                ImapString::atom("ALL"),
            ]
        );

        let mut empty = Sort::new(Vec::new(), SearchCriteria::All);
        assert!(matches!(empty.prepare(), Err(Error::Request(_))));
    }

    #[test]
    fn test_sort_return_options() {
        let mut sort = Sort::new(
            vec![SortCriterion::ascending(SortKey::Arrival)],
            SearchCriteria::Unseen,
        )
        .uid()
        .returning(vec![SearchReturn::Min, SearchReturn::Count]);
        let caps = sort.required_capabilities();
        assert!(caps.contains(&Capability::ESort));
        assert!(caps.contains(&Capability::Sort));
        assert_eq!(
            sort.prepare().unwrap(),
            vec![
                ImapString::atom("RETURN"),
                ImapString::List(vec![ImapString::atom("MIN"), ImapString::atom("COUNT")]),
                ImapString::List(vec![ImapString::atom("ARRIVAL")]),
                ImapString::atom("UTF-8"),
                ImapString::atom("UNSEEN"),
            ]
        );
        assert!(
            !Sort::new(vec![SortCriterion::ascending(SortKey::Date)], SearchCriteria::All)
                .required_capabilities()
                .contains(&Capability::ESort)
        );
    }

    #[test]
    fn test_thread_capability() {
        let thread = Thread::new("references", SearchCriteria::All).uid();
        assert_eq!(thread.kind(), CommandKind::UidThread);
        assert!(
            thread
                .required_capabilities()
                .contains(&Capability::Thread("REFERENCES".to_string()))
        );
    }
}
