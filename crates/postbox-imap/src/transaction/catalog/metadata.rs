//! METADATA extension (RFC 5464).

use crate::command::{ImapString, LiteralMode};
use crate::convert;
use crate::parser::{DataResponse, DataResponseType, TaggedStatus};
use crate::transaction::{CommandKind, Exchange};
use crate::types::{Capability, CapabilitySet, Mailbox, MetadataEntry, ResponseCode};
use crate::{Error, Result};

/// How far below each requested entry to look.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Depth {
    /// Only the entry itself.
    #[default]
    Zero,
    /// The entry and its immediate children.
    One,
    /// The whole subtree.
    Infinity,
}

impl Depth {
    const fn as_str(self) -> &'static str {
        match self {
            Self::Zero => "0",
            Self::One => "1",
            Self::Infinity => "infinity",
        }
    }
}

/// Server annotations use the empty mailbox name.
fn capability_for(mailbox: &Mailbox) -> CapabilitySet {
    if mailbox.as_str().is_empty() {
        CapabilitySet::new().with(Capability::MetadataServer)
    } else {
        CapabilitySet::new().with(Capability::Metadata)
    }
}

fn check_entry(entry: &str) -> Result<()> {
    if !entry.starts_with("/private/") && !entry.starts_with("/shared/") {
        return Err(Error::request(format!(
            "metadata entry must start with /private/ or /shared/: {entry}"
        )));
    }
    Ok(())
}

/// GETMETADATA command.
#[derive(Debug)]
pub struct GetMetadata {
    mailbox: Mailbox,
    entries: Vec<String>,
    max_size: Option<u64>,
    depth: Depth,
    values: Vec<MetadataEntry>,
}

impl GetMetadata {
    /// Reads `entries` of `mailbox`; the empty mailbox reads server
    /// annotations.
    #[must_use]
    pub const fn new(mailbox: Mailbox, entries: Vec<String>) -> Self {
        Self {
            mailbox,
            entries,
            max_size: None,
            depth: Depth::Zero,
            values: Vec::new(),
        }
    }

    /// Skips values larger than `bytes`; the server reports the largest
    /// skipped size with `[METADATA LONGENTRIES n]`.
    #[must_use]
    pub const fn max_size(mut self, bytes: u64) -> Self {
        self.max_size = Some(bytes);
        self
    }

    /// Sets the depth.
    #[must_use]
    pub const fn depth(mut self, depth: Depth) -> Self {
        self.depth = depth;
        self
    }
}

impl Exchange for GetMetadata {
    type Output = Vec<MetadataEntry>;

    fn kind(&self) -> CommandKind {
        CommandKind::GetMetadata
    }

    fn required_capabilities(&self) -> CapabilitySet {
        capability_for(&self.mailbox)
    }

    fn prepare(&mut self) -> Result<Vec<ImapString>> {
        if self.entries.is_empty() {
            return Err(Error::request("GETMETADATA needs at least one entry"));
        }
        for entry in &self.entries {
            check_entry(entry)?;
        }

        let mut options = Vec::new();
        if let Some(size) = self.max_size {
            options.push(ImapString::atom("MAXSIZE"));
            options.push(ImapString::number(size));
        }
        if self.depth != Depth::Zero {
            options.push(ImapString::atom("DEPTH"));
            options.push(ImapString::atom(self.depth.as_str()));
        }

        let mut args = Vec::with_capacity(3);
        if !options.is_empty() {
            args.push(ImapString::List(options));
        }
        args.push(ImapString::mailbox(&self.mailbox));
        let entries: Vec<_> = self
            .entries
            .iter()
            .map(|entry| ImapString::astring(entry))
            .collect();
        args.push(match <[ImapString; 1]>::try_from(entries) {
            Ok([single]) => single,
            Err(entries) => ImapString::List(entries),
        });
        Ok(args)
    }

    fn on_data(&mut self, data: &DataResponse) -> Result<()> {
        if data.kind == DataResponseType::Metadata {
            self.values.extend(convert::data::metadata(data)?);
        }
        Ok(())
    }

    fn finish_ok(&mut self, tagged: &TaggedStatus) -> Result<Self::Output> {
        if let Some(ResponseCode::MetadataLongEntries(size)) =
            convert::code::response_code(&tagged.text)?
        {
            tracing::debug!(size, "metadata values above MAXSIZE were skipped");
        }
        Ok(std::mem::take(&mut self.values))
    }
}

/// SETMETADATA command. A `None` value removes the entry.
#[derive(Debug)]
pub struct SetMetadata {
    mailbox: Mailbox,
    entries: Vec<(String, Option<Vec<u8>>)>,
}

impl SetMetadata {
    /// Sets `entries` on `mailbox`.
    #[must_use]
    pub const fn new(mailbox: Mailbox, entries: Vec<(String, Option<Vec<u8>>)>) -> Self {
        Self { mailbox, entries }
    }

    fn value(value: Option<&[u8]>) -> ImapString {
        match value {
            None => ImapString::Nil,
            Some(bytes) if bytes.contains(&0) => {
                ImapString::literal_with(bytes, LiteralMode::Synchronizing, true)
            }
            Some(bytes) => match std::str::from_utf8(bytes) {
                Ok(text) => ImapString::nstring(Some(text)),
                Err(_) => ImapString::literal(bytes),
            },
        }
    }
}

impl Exchange for SetMetadata {
    type Output = ();

    fn kind(&self) -> CommandKind {
        CommandKind::SetMetadata
    }

    fn required_capabilities(&self) -> CapabilitySet {
        capability_for(&self.mailbox)
    }

    fn prepare(&mut self) -> Result<Vec<ImapString>> {
        if self.entries.is_empty() {
            return Err(Error::request("SETMETADATA needs at least one entry"));
        }
        let mut list = Vec::with_capacity(self.entries.len() * 2);
        for (entry, value) in &self.entries {
            check_entry(entry)?;
            list.push(ImapString::astring(entry));
            list.push(Self::value(value.as_deref()));
        }
        Ok(vec![
            ImapString::mailbox(&self.mailbox),
            ImapString::List(list),
        ])
    }

    fn finish_ok(&mut self, _tagged: &TaggedStatus) -> Result<()> {
        Ok(())
    }
}
