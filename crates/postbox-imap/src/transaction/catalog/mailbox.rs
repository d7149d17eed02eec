//! Mailbox commands: selection, management, listing and expunge.

use crate::command::{ImapString, StatusItem};
use crate::convert;
use crate::parser::{DataResponse, DataResponseType, TaggedStatus, UntaggedStatus};
use crate::transaction::{CommandKind, Exchange};
use crate::types::{
    Capability, CapabilitySet, ListEntry, Mailbox, MailboxAttribute, Namespaces, ResponseCode,
    SelectedMailbox, SequenceSet, StatusAttributes,
};
use crate::{Error, Result};

fn require_mailbox(mailbox: &Mailbox, verb: &str) -> Result<()> {
    if mailbox.as_str().is_empty() {
        return Err(Error::request(format!("{verb} needs a mailbox name")));
    }
    Ok(())
}

/// SELECT or EXAMINE.
///
/// Untagged EXISTS, RECENT, FLAGS and the status codes sent while the
/// command runs are folded into a [`SelectedMailbox`].
#[derive(Debug)]
pub struct Select {
    mailbox: Mailbox,
    read_only: bool,
    condstore: bool,
    selected: SelectedMailbox,
}

impl Select {
    /// Selects `mailbox` read-write.
    #[must_use]
    pub fn new(mailbox: Mailbox) -> Self {
        Self {
            mailbox,
            read_only: false,
            condstore: false,
            selected: SelectedMailbox::default(),
        }
    }

    /// Opens `mailbox` read-only with EXAMINE.
    #[must_use]
    pub fn examine(mailbox: Mailbox) -> Self {
        Self {
            read_only: true,
            ..Self::new(mailbox)
        }
    }

    /// Adds the `(CONDSTORE)` select parameter (RFC 7162).
    #[must_use]
    pub const fn condstore(mut self) -> Self {
        self.condstore = true;
        self
    }
}

impl Exchange for Select {
    type Output = SelectedMailbox;

    fn kind(&self) -> CommandKind {
        if self.read_only {
            CommandKind::Examine
        } else {
            CommandKind::Select
        }
    }

    fn required_capabilities(&self) -> CapabilitySet {
        if self.condstore {
            CapabilitySet::new().with(Capability::CondStore)
        } else {
            CapabilitySet::new()
        }
    }

    fn prepare(&mut self) -> Result<Vec<ImapString>> {
        require_mailbox(&self.mailbox, self.kind().verb())?;
        self.selected = SelectedMailbox {
            mailbox: Some(self.mailbox.clone()),
            read_only: self.read_only,
            ..SelectedMailbox::default()
        };
        let mut args = vec![ImapString::mailbox(&self.mailbox)];
        if self.condstore {
            args.push(ImapString::List(vec![ImapString::atom("CONDSTORE")]));
        }
        Ok(args)
    }

    fn on_data(&mut self, data: &DataResponse) -> Result<()> {
        match data.kind {
            DataResponseType::Exists => self.selected.exists = convert::data::exists(data)?,
            DataResponseType::Recent => self.selected.recent = convert::data::recent(data)?,
            DataResponseType::Flags => self.selected.flags = convert::data::flags(data)?,
            _ => {}
        }
        Ok(())
    }

    fn on_status(&mut self, status: &UntaggedStatus) -> Result<()> {
        let selected = &mut self.selected;
        match convert::code::response_code(&status.text)? {
            Some(ResponseCode::Unseen(n)) => selected.unseen = Some(n),
            Some(ResponseCode::UidNext(n)) => selected.uid_next = Some(n),
            Some(ResponseCode::UidValidity(n)) => selected.uid_validity = Some(n),
            Some(ResponseCode::PermanentFlags(flags)) => selected.permanent_flags = Some(flags),
            Some(ResponseCode::HighestModSeq(n)) => selected.highest_modseq = Some(n),
            Some(ResponseCode::NoModSeq) => selected.no_modseq = true,
            _ => {}
        }
        Ok(())
    }

    fn finish_ok(&mut self, tagged: &TaggedStatus) -> Result<SelectedMailbox> {
        match convert::code::response_code(&tagged.text)? {
            Some(ResponseCode::ReadOnly) => self.selected.read_only = true,
            Some(ResponseCode::ReadWrite) => self.selected.read_only = false,
            _ => {}
        }
        Ok(std::mem::take(&mut self.selected))
    }
}

/// Single-mailbox management verbs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MailboxOperation {
    /// CREATE
    Create,
    /// DELETE
    Delete,
    /// SUBSCRIBE
    Subscribe,
    /// UNSUBSCRIBE
    Unsubscribe,
}

/// CREATE, DELETE, SUBSCRIBE or UNSUBSCRIBE.
#[derive(Debug)]
pub struct MailboxOp {
    op: MailboxOperation,
    mailbox: Mailbox,
    special_use: Vec<MailboxAttribute>,
}

impl MailboxOp {
    /// Applies `op` to `mailbox`.
    #[must_use]
    pub const fn new(op: MailboxOperation, mailbox: Mailbox) -> Self {
        Self {
            op,
            mailbox,
            special_use: Vec::new(),
        }
    }

    /// CREATE carrying `(USE (...))` roles (RFC 6154), for example
    /// `\Drafts` or `\Archive`.
    #[must_use]
    pub fn create_special_use(
        mailbox: Mailbox,
        roles: impl IntoIterator<Item = MailboxAttribute>,
    ) -> Self {
        Self {
            special_use: roles.into_iter().collect(),
            ..Self::new(MailboxOperation::Create, mailbox)
        }
    }
}

impl Exchange for MailboxOp {
    type Output = ();

    fn kind(&self) -> CommandKind {
        match self.op {
            MailboxOperation::Create => CommandKind::Create,
            MailboxOperation::Delete => CommandKind::Delete,
            MailboxOperation::Subscribe => CommandKind::Subscribe,
            MailboxOperation::Unsubscribe => CommandKind::Unsubscribe,
        }
    }

    fn required_capabilities(&self) -> CapabilitySet {
        if self.special_use.is_empty() {
            CapabilitySet::new()
        } else {
            CapabilitySet::new().with(Capability::CreateSpecialUse)
        }
    }

    fn prepare(&mut self) -> Result<Vec<ImapString>> {
        require_mailbox(&self.mailbox, self.kind().verb())?;
        let mut args = vec![ImapString::mailbox(&self.mailbox)];
        if self.special_use.is_empty() {
            return Ok(args);
        }
        if self.op != MailboxOperation::Create {
            return Err(Error::request(format!(
                "{} takes no special-use roles",
                self.kind().verb()
            )));
        }
        if let Some(role) = self.special_use.iter().find(|role| !role.is_special_use()) {
            return Err(Error::request(format!(
                "{} is not a special-use role",
                role.as_str()
            )));
        }
        let roles = self
            .special_use
            .iter()
            .map(|role| ImapString::atom(role.as_str()))
            .collect();
        args.push(ImapString::List(vec![
            ImapString::atom("USE"),
            ImapString::List(roles),
        ]));
        Ok(args)
    }

    fn finish_ok(&mut self, _tagged: &TaggedStatus) -> Result<()> {
        Ok(())
    }
}

/// RENAME command.
#[derive(Debug)]
pub struct Rename {
    from: Mailbox,
    to: Mailbox,
}

impl Rename {
    /// Renames `from` to `to`.
    #[must_use]
    pub const fn new(from: Mailbox, to: Mailbox) -> Self {
        Self { from, to }
    }
}

impl Exchange for Rename {
    type Output = ();

    fn kind(&self) -> CommandKind {
        CommandKind::Rename
    }

    fn prepare(&mut self) -> Result<Vec<ImapString>> {
        require_mailbox(&self.from, "RENAME")?;
        require_mailbox(&self.to, "RENAME")?;
        Ok(vec![
            ImapString::mailbox(&self.from),
            ImapString::mailbox(&self.to),
        ])
    }

    fn finish_ok(&mut self, _tagged: &TaggedStatus) -> Result<()> {
        Ok(())
    }
}

/// Which listing verb to send.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ListVariant {
    /// LIST
    #[default]
    List,
    /// LSUB
    Lsub,
    /// XLIST (Gmail special-use listing)
    XList,
    /// RLIST (RFC 2193 remote listing)
    RList,
    /// RLSUB (RFC 2193 remote subscriptions)
    RLsub,
}

/// LIST and its relatives.
///
/// Selection and return options (RFC 5258) are only valid with
/// [`ListVariant::List`].
#[derive(Debug, Default)]
pub struct List {
    variant: ListVariant,
    reference: String,
    pattern: String,
    selection: Vec<String>,
    return_opts: Vec<String>,
    entries: Vec<ListEntry>,
}

impl List {
    /// Lists mailboxes matching `pattern` under `reference`.
    pub fn new(reference: impl Into<String>, pattern: impl Into<String>) -> Self {
        Self {
            reference: reference.into(),
            pattern: pattern.into(),
            ..Self::default()
        }
    }

    /// Uses another listing verb.
    #[must_use]
    pub const fn variant(mut self, variant: ListVariant) -> Self {
        self.variant = variant;
        self
    }

    /// Adds a selection option such as `SUBSCRIBED`.
    #[must_use]
    pub fn select(mut self, option: impl Into<String>) -> Self {
        self.selection.push(option.into());
        self
    }

    /// Adds a return option such as `CHILDREN`.
    #[must_use]
    pub fn returning(mut self, option: impl Into<String>) -> Self {
        self.return_opts.push(option.into());
        self
    }

    fn is_extended(&self) -> bool {
        !self.selection.is_empty() || !self.return_opts.is_empty()
    }

    fn options(options: &[String]) -> ImapString {
        ImapString::List(
            options
                .iter()
                .map(|option| ImapString::atom(option.to_ascii_uppercase()))
                .collect(),
        )
    }
}

impl Exchange for List {
    type Output = Vec<ListEntry>;

    fn kind(&self) -> CommandKind {
        match self.variant {
            ListVariant::List => CommandKind::List,
            ListVariant::Lsub => CommandKind::Lsub,
            ListVariant::XList => CommandKind::XList,
            ListVariant::RList => CommandKind::RList,
            ListVariant::RLsub => CommandKind::RLsub,
        }
    }

    fn required_capabilities(&self) -> CapabilitySet {
        let caps = self.kind().capabilities();
        if self.is_extended() {
            caps.with(Capability::ListExtended)
        } else {
            caps
        }
    }

    fn prepare(&mut self) -> Result<Vec<ImapString>> {
        if self.is_extended() && self.variant != ListVariant::List {
            return Err(Error::request(format!(
                "{} takes no selection or return options",
                self.kind().verb()
            )));
        }
        let mut args = Vec::with_capacity(5);
        if !self.selection.is_empty() {
            args.push(Self::options(&self.selection));
        }
        args.push(ImapString::mailbox(&Mailbox::new(self.reference.as_str())));
        args.push(ImapString::list_mailbox(
            &Mailbox::new(self.pattern.as_str()).to_wire(),
        ));
        if !self.return_opts.is_empty() {
            args.push(ImapString::atom("RETURN"));
            args.push(Self::options(&self.return_opts));
        }
        Ok(args)
    }

    fn on_data(&mut self, data: &DataResponse) -> Result<()> {
        if matches!(
            data.kind,
            DataResponseType::List | DataResponseType::Lsub | DataResponseType::XList
        ) {
            self.entries.push(convert::data::list(data)?);
        }
        Ok(())
    }

    fn finish_ok(&mut self, _tagged: &TaggedStatus) -> Result<Vec<ListEntry>> {
        Ok(std::mem::take(&mut self.entries))
    }
}

/// STATUS command.
#[derive(Debug)]
pub struct Status {
    mailbox: Mailbox,
    items: Vec<StatusItem>,
    attributes: StatusAttributes,
}

impl Status {
    /// Queries `items` of `mailbox`.
    #[must_use]
    pub fn new(mailbox: Mailbox, items: Vec<StatusItem>) -> Self {
        Self {
            mailbox,
            items,
            attributes: StatusAttributes::default(),
        }
    }

    /// Queries every base-protocol item of `mailbox`.
    #[must_use]
    pub fn all(mailbox: Mailbox) -> Self {
        Self::new(mailbox, StatusItem::BASE.to_vec())
    }
}

impl Exchange for Status {
    type Output = StatusAttributes;

    fn kind(&self) -> CommandKind {
        CommandKind::Status
    }

    fn required_capabilities(&self) -> CapabilitySet {
        if self.items.contains(&StatusItem::HighestModSeq) {
            CapabilitySet::new().with(Capability::CondStore)
        } else {
            CapabilitySet::new()
        }
    }

    fn prepare(&mut self) -> Result<Vec<ImapString>> {
        require_mailbox(&self.mailbox, "STATUS")?;
        if self.items.is_empty() {
            return Err(Error::request("STATUS needs at least one item"));
        }
        let items = self
            .items
            .iter()
            .map(|item| ImapString::atom(item.as_str()))
            .collect();
        Ok(vec![
            ImapString::mailbox(&self.mailbox),
            ImapString::List(items),
        ])
    }

    fn on_data(&mut self, data: &DataResponse) -> Result<()> {
        if data.kind != DataResponseType::Status {
            return Ok(());
        }
        let (mailbox, attributes) = convert::data::status(data)?;
        if mailbox == self.mailbox || (mailbox.is_inbox() && self.mailbox.is_inbox()) {
            self.attributes = attributes;
        } else {
            tracing::debug!(%mailbox, "ignoring STATUS for another mailbox");
        }
        Ok(())
    }

    fn finish_ok(&mut self, _tagged: &TaggedStatus) -> Result<StatusAttributes> {
        Ok(std::mem::take(&mut self.attributes))
    }
}

/// NAMESPACE command (RFC 2342).
#[derive(Debug, Default)]
pub struct Namespace {
    namespaces: Option<Namespaces>,
}

impl Exchange for Namespace {
    type Output = Namespaces;

    fn kind(&self) -> CommandKind {
        CommandKind::Namespace
    }

    fn prepare(&mut self) -> Result<Vec<ImapString>> {
        Ok(Vec::new())
    }

    fn on_data(&mut self, data: &DataResponse) -> Result<()> {
        if data.kind == DataResponseType::Namespace {
            self.namespaces = Some(convert::data::namespace(data)?);
        }
        Ok(())
    }

    fn finish_ok(&mut self, _tagged: &TaggedStatus) -> Result<Namespaces> {
        self.namespaces
            .take()
            .ok_or_else(|| Error::Protocol("NAMESPACE completed without data".to_string()))
    }
}

/// CHECK command.
#[derive(Debug, Default)]
pub struct Check;

impl Exchange for Check {
    type Output = ();

    fn kind(&self) -> CommandKind {
        CommandKind::Check
    }

    fn prepare(&mut self) -> Result<Vec<ImapString>> {
        Ok(Vec::new())
    }

    fn finish_ok(&mut self, _tagged: &TaggedStatus) -> Result<()> {
        Ok(())
    }
}

/// CLOSE command: expunges silently and deselects.
#[derive(Debug, Default)]
pub struct Close;

impl Exchange for Close {
    type Output = ();

    fn kind(&self) -> CommandKind {
        CommandKind::Close
    }

    fn prepare(&mut self) -> Result<Vec<ImapString>> {
        Ok(Vec::new())
    }

    fn finish_ok(&mut self, _tagged: &TaggedStatus) -> Result<()> {
        Ok(())
    }
}

/// UNSELECT command (RFC 3691): deselects without expunging.
#[derive(Debug, Default)]
pub struct Unselect;

impl Exchange for Unselect {
    type Output = ();

    fn kind(&self) -> CommandKind {
        CommandKind::Unselect
    }

    fn prepare(&mut self) -> Result<Vec<ImapString>> {
        Ok(Vec::new())
    }

    fn finish_ok(&mut self, _tagged: &TaggedStatus) -> Result<()> {
        Ok(())
    }
}

/// EXPUNGE, or UID EXPUNGE (RFC 4315) when a UID set is given.
///
/// The output lists expunged sequence numbers in arrival order. Each number
/// is relative to the mailbox after the previous removal, so repeats are
/// expected.
#[derive(Debug, Default)]
pub struct Expunge {
    uid_set: Option<SequenceSet>,
    expunged: Vec<u32>,
}

impl Expunge {
    /// Expunges every `\Deleted` message.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Expunges only the `\Deleted` messages in `uids`.
    #[must_use]
    pub fn uids(uids: SequenceSet) -> Self {
        Self {
            uid_set: Some(uids),
            expunged: Vec::new(),
        }
    }
}

impl Exchange for Expunge {
    type Output = Vec<u32>;

    fn kind(&self) -> CommandKind {
        if self.uid_set.is_some() {
            CommandKind::UidExpunge
        } else {
            CommandKind::Expunge
        }
    }

    fn prepare(&mut self) -> Result<Vec<ImapString>> {
        Ok(self
            .uid_set
            .iter()
            .map(|set| ImapString::Atom(set.to_string()))
            .collect())
    }

    fn on_data(&mut self, data: &DataResponse) -> Result<()> {
        if data.kind == DataResponseType::Expunge {
            self.expunged.push(convert::data::expunge(data)?);
        }
        Ok(())
    }

    fn finish_ok(&mut self, _tagged: &TaggedStatus) -> Result<Vec<u32>> {
        Ok(std::mem::take(&mut self.expunged))
    }
}
