//! Message commands: APPEND, FETCH, STORE and COPY.

use std::collections::BTreeMap;

use chrono::{DateTime, FixedOffset};

use crate::command::serialize::{date_time, fetch_items, flag_list, store_action};
use crate::command::{FetchItems, ImapString, LiteralMode, StoreAction};
use crate::convert;
use crate::parser::{DataResponse, DataResponseType, TaggedStatus};
use crate::transaction::{CommandKind, Exchange};
use crate::types::{
    AppendUid, Capability, CapabilitySet, CopyUid, FetchAttributes, Flag, Mailbox, ResponseCode,
    SequenceSet,
};
use crate::{Error, Result};

/// One message to append.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppendMessage {
    content: Vec<u8>,
    flags: Vec<Flag>,
    internal_date: Option<DateTime<FixedOffset>>,
    binary: bool,
}

impl AppendMessage {
    /// Wraps a complete RFC 5322 message.
    pub fn new(content: impl Into<Vec<u8>>) -> Self {
        Self {
            content: content.into(),
            flags: Vec::new(),
            internal_date: None,
            binary: false,
        }
    }

    /// Sets the initial flags.
    #[must_use]
    pub fn flags(mut self, flags: Vec<Flag>) -> Self {
        self.flags = flags;
        self
    }

    /// Sets the internal date.
    #[must_use]
    pub const fn internal_date(mut self, date: DateTime<FixedOffset>) -> Self {
        self.internal_date = Some(date);
        self
    }

    /// Sends the content as a `~{n}` literal8 (RFC 3516).
    #[must_use]
    pub const fn binary(mut self) -> Self {
        self.binary = true;
        self
    }

    fn write(&self, args: &mut Vec<ImapString>) {
        if !self.flags.is_empty() {
            args.push(flag_list(&self.flags));
        }
        if let Some(date) = &self.internal_date {
            args.push(date_time(date));
        }
        args.push(ImapString::literal_with(
            self.content.as_slice(),
            LiteralMode::NonSynchronizingIfCapable,
            self.binary,
        ));
    }
}

/// APPEND command, with MULTIAPPEND (RFC 3502) for several messages.
///
/// The output is the APPENDUID code (RFC 4315) if the server sent one.
#[derive(Debug)]
pub struct Append {
    mailbox: Mailbox,
    messages: Vec<AppendMessage>,
}

impl Append {
    /// Appends `messages` to `mailbox`.
    #[must_use]
    pub const fn new(mailbox: Mailbox, messages: Vec<AppendMessage>) -> Self {
        Self { mailbox, messages }
    }
}

impl Exchange for Append {
    type Output = Option<AppendUid>;

    fn kind(&self) -> CommandKind {
        CommandKind::Append
    }

    fn required_capabilities(&self) -> CapabilitySet {
        let mut caps = CapabilitySet::new();
        if self.messages.len() > 1 {
            caps.insert(Capability::MultiAppend);
        }
        if self.messages.iter().any(|message| message.binary) {
            caps.insert(Capability::Binary);
        }
        caps
    }

    fn prepare(&mut self) -> Result<Vec<ImapString>> {
        if self.mailbox.as_str().is_empty() {
            return Err(Error::request("APPEND needs a mailbox name"));
        }
        if self.messages.is_empty() {
            return Err(Error::request("APPEND needs at least one message"));
        }
        let mut args = vec![ImapString::mailbox(&self.mailbox)];
        for message in &self.messages {
            message.write(&mut args);
        }
        Ok(args)
    }

    fn finish_ok(&mut self, tagged: &TaggedStatus) -> Result<Self::Output> {
        Ok(match convert::code::response_code(&tagged.text)? {
            Some(ResponseCode::AppendUid(uid)) => Some(uid),
            _ => None,
        })
    }
}

/// Folds FETCH responses by sequence number.
fn collect_fetch(
    messages: &mut BTreeMap<u32, FetchAttributes>,
    data: &DataResponse,
) -> Result<()> {
    if data.kind != DataResponseType::Fetch {
        return Ok(());
    }
    let (seq, attributes) = convert::data::fetch(data)?;
    messages.entry(seq).or_default().merge(attributes);
    Ok(())
}

/// FETCH or UID FETCH.
///
/// Several FETCH responses for the same sequence number are merged, later
/// attributes replacing earlier ones.
#[derive(Debug)]
pub struct Fetch {
    uid: bool,
    set: SequenceSet,
    items: FetchItems,
    changed_since: Option<u64>,
    messages: BTreeMap<u32, FetchAttributes>,
}

impl Fetch {
    /// Fetches `items` for the messages in `set`.
    #[must_use]
    pub const fn new(set: SequenceSet, items: FetchItems) -> Self {
        Self {
            uid: false,
            set,
            items,
            changed_since: None,
            messages: BTreeMap::new(),
        }
    }

    /// Interprets `set` as UIDs.
    #[must_use]
    pub const fn uid(mut self) -> Self {
        self.uid = true;
        self
    }

    /// Only returns messages whose mod-sequence is above `modseq`.
    #[must_use]
    pub const fn changed_since(mut self, modseq: u64) -> Self {
        self.changed_since = Some(modseq);
        self
    }
}

impl Exchange for Fetch {
    type Output = BTreeMap<u32, FetchAttributes>;

    fn kind(&self) -> CommandKind {
        if self.uid {
            CommandKind::UidFetch
        } else {
            CommandKind::Fetch
        }
    }

    fn required_capabilities(&self) -> CapabilitySet {
        let mut caps = CapabilitySet::new();
        if self.changed_since.is_some() {
            caps.insert(Capability::CondStore);
        }
        if let FetchItems::Items(attrs) = &self.items
            && attrs.iter().any(|attr| attr.is_binary())
        {
            caps.insert(Capability::Binary);
        }
        caps
    }

    fn prepare(&mut self) -> Result<Vec<ImapString>> {
        if matches!(&self.items, FetchItems::Items(attrs) if attrs.is_empty()) {
            return Err(Error::request("FETCH needs at least one item"));
        }
        let mut args = vec![
            ImapString::Atom(self.set.to_string()),
            fetch_items(&self.items),
        ];
        if let Some(modseq) = self.changed_since {
            args.push(ImapString::List(vec![
                ImapString::atom("CHANGEDSINCE"),
                ImapString::number(modseq),
            ]));
        }
        Ok(args)
    }

    fn on_data(&mut self, data: &DataResponse) -> Result<()> {
        collect_fetch(&mut self.messages, data)
    }

    fn finish_ok(&mut self, _tagged: &TaggedStatus) -> Result<Self::Output> {
        Ok(std::mem::take(&mut self.messages))
    }
}

/// What a STORE produced.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StoreOutcome {
    /// Updated attributes by sequence number, unless `.SILENT` was used.
    pub messages: BTreeMap<u32, FetchAttributes>,
    /// Messages that failed the UNCHANGEDSINCE test (`MODIFIED` code).
    pub failed: Option<SequenceSet>,
}

/// STORE or UID STORE.
///
/// A tagged NO still yields a [`StoreOutcome`]: some messages may have been
/// updated before the failure.
#[derive(Debug)]
pub struct Store {
    uid: bool,
    set: SequenceSet,
    action: StoreAction,
    silent: bool,
    unchanged_since: Option<u64>,
    outcome: StoreOutcome,
}

impl Store {
    /// Applies `action` to the messages in `set`.
    #[must_use]
    pub fn new(set: SequenceSet, action: StoreAction) -> Self {
        Self {
            uid: false,
            set,
            action,
            silent: false,
            unchanged_since: None,
            outcome: StoreOutcome::default(),
        }
    }

    /// Interprets `set` as UIDs.
    #[must_use]
    pub const fn uid(mut self) -> Self {
        self.uid = true;
        self
    }

    /// Suppresses the untagged FETCH responses.
    #[must_use]
    pub const fn silent(mut self) -> Self {
        self.silent = true;
        self
    }

    /// Only updates messages whose mod-sequence is at most `modseq`.
    #[must_use]
    pub const fn unchanged_since(mut self, modseq: u64) -> Self {
        self.unchanged_since = Some(modseq);
        self
    }

    fn take_outcome(&mut self, tagged: &TaggedStatus) -> StoreOutcome {
        let mut outcome = std::mem::take(&mut self.outcome);
        match convert::code::response_code(&tagged.text) {
            Ok(Some(ResponseCode::Modified(set))) => outcome.failed = Some(set),
            Ok(_) => {}
            Err(err) => tracing::warn!(error = %err, "ignoring malformed STORE response code"),
        }
        outcome
    }
}

impl Exchange for Store {
    type Output = StoreOutcome;

    fn kind(&self) -> CommandKind {
        if self.uid {
            CommandKind::UidStore
        } else {
            CommandKind::Store
        }
    }

    fn required_capabilities(&self) -> CapabilitySet {
        if self.unchanged_since.is_some() {
            CapabilitySet::new().with(Capability::CondStore)
        } else {
            CapabilitySet::new()
        }
    }

    fn prepare(&mut self) -> Result<Vec<ImapString>> {
        let mut args = vec![ImapString::Atom(self.set.to_string())];
        if let Some(modseq) = self.unchanged_since {
            args.push(ImapString::List(vec![
                ImapString::atom("UNCHANGEDSINCE"),
                ImapString::number(modseq),
            ]));
        }
        args.extend(store_action(&self.action, self.silent));
        Ok(args)
    }

    fn on_data(&mut self, data: &DataResponse) -> Result<()> {
        collect_fetch(&mut self.outcome.messages, data)
    }

    fn finish_ok(&mut self, tagged: &TaggedStatus) -> Result<StoreOutcome> {
        Ok(self.take_outcome(tagged))
    }

    fn finish_no(&mut self, tagged: &TaggedStatus) -> Option<StoreOutcome> {
        Some(self.take_outcome(tagged))
    }
}

/// COPY or UID COPY.
///
/// The output is the COPYUID code (RFC 4315) if the server sent one.
#[derive(Debug)]
pub struct Copy {
    uid: bool,
    set: SequenceSet,
    mailbox: Mailbox,
}

impl Copy {
    /// Copies the messages in `set` to `mailbox`.
    #[must_use]
    pub const fn new(set: SequenceSet, mailbox: Mailbox) -> Self {
        Self {
            uid: false,
            set,
            mailbox,
        }
    }

    /// Interprets `set` as UIDs.
    #[must_use]
    pub const fn uid(mut self) -> Self {
        self.uid = true;
        self
    }
}

impl Exchange for Copy {
    type Output = Option<CopyUid>;

    fn kind(&self) -> CommandKind {
        if self.uid {
            CommandKind::UidCopy
        } else {
            CommandKind::Copy
        }
    }

    fn prepare(&mut self) -> Result<Vec<ImapString>> {
        if self.mailbox.as_str().is_empty() {
            return Err(Error::request("COPY needs a destination mailbox"));
        }
        Ok(vec![
            ImapString::Atom(self.set.to_string()),
            ImapString::mailbox(&self.mailbox),
        ])
    }

    fn finish_ok(&mut self, tagged: &TaggedStatus) -> Result<Self::Output> {
        Ok(match convert::code::response_code(&tagged.text)? {
            Some(ResponseCode::CopyUid(uid)) => Some(uid),
            _ => None,
        })
    }
}
