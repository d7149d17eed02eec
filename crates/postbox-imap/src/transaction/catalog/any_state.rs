//! Commands valid in any state.

use crate::command::ImapString;
use crate::connection::UpgradeKind;
use crate::convert;
use crate::parser::{DataResponse, DataResponseType, TaggedStatus};
use crate::transaction::{CommandKind, Exchange};
use crate::types::{Capability as Cap, CapabilitySet, IdParams, ResponseCode};
use crate::{Error, Result};

/// Capabilities carried by a tagged status's response code, if any.
pub(super) fn code_capabilities(tagged: &TaggedStatus) -> Result<Option<CapabilitySet>> {
    Ok(match convert::code::response_code(&tagged.text)? {
        Some(ResponseCode::Capability(caps)) => Some(caps),
        _ => None,
    })
}

/// CAPABILITY command.
#[derive(Debug, Default)]
pub struct Capability {
    capabilities: Option<CapabilitySet>,
}

impl Exchange for Capability {
    type Output = CapabilitySet;

    fn kind(&self) -> CommandKind {
        CommandKind::Capability
    }

    fn prepare(&mut self) -> Result<Vec<ImapString>> {
        Ok(Vec::new())
    }

    fn on_data(&mut self, data: &DataResponse) -> Result<()> {
        if data.kind == DataResponseType::Capability {
            self.capabilities = Some(convert::data::capability(data)?);
        }
        Ok(())
    }

    fn finish_ok(&mut self, tagged: &TaggedStatus) -> Result<CapabilitySet> {
        match self.capabilities.take() {
            Some(caps) => Ok(caps),
            None => Ok(code_capabilities(tagged)?.unwrap_or_default()),
        }
    }
}

/// NOOP command. Pending updates arrive in the result's response log.
#[derive(Debug, Default)]
pub struct Noop;

impl Exchange for Noop {
    type Output = ();

    fn kind(&self) -> CommandKind {
        CommandKind::Noop
    }

    fn prepare(&mut self) -> Result<Vec<ImapString>> {
        Ok(Vec::new())
    }

    fn finish_ok(&mut self, _tagged: &TaggedStatus) -> Result<()> {
        Ok(())
    }
}

/// LOGOUT command. The server's BYE is expected.
#[derive(Debug, Default)]
pub struct Logout;

impl Exchange for Logout {
    type Output = ();

    fn kind(&self) -> CommandKind {
        CommandKind::Logout
    }

    fn prepare(&mut self) -> Result<Vec<ImapString>> {
        Ok(Vec::new())
    }

    fn finish_ok(&mut self, _tagged: &TaggedStatus) -> Result<()> {
        Ok(())
    }
}

/// ID command (RFC 2971).
#[derive(Debug, Default)]
pub struct Id {
    params: IdParams,
    server: IdParams,
}

impl Id {
    /// Sends the given client parameters; `None` sends NIL.
    #[must_use]
    pub const fn new(params: IdParams) -> Self {
        Self {
            params,
            server: None,
        }
    }
}

impl Exchange for Id {
    type Output = IdParams;

    fn kind(&self) -> CommandKind {
        CommandKind::Id
    }

    fn prepare(&mut self) -> Result<Vec<ImapString>> {
        let Some(params) = &self.params else {
            return Ok(vec![ImapString::Nil]);
        };
        if params.len() > 30 {
            return Err(Error::request("ID allows at most 30 field/value pairs"));
        }
        let mut items = Vec::with_capacity(params.len() * 2);
        for (field, value) in params {
            if field.len() > 30 {
                return Err(Error::request(format!("ID field too long: {field}")));
            }
            items.push(ImapString::quoted(field.as_str()));
            items.push(ImapString::nstring(value.as_deref()));
        }
        Ok(vec![ImapString::List(items)])
    }

    fn on_data(&mut self, data: &DataResponse) -> Result<()> {
        if data.kind == DataResponseType::Id {
            self.server = convert::data::id(data)?;
        }
        Ok(())
    }

    fn finish_ok(&mut self, _tagged: &TaggedStatus) -> Result<IdParams> {
        Ok(self.server.take())
    }
}

/// COMPRESS command (RFC 4978). On success the stream is wrapped in
/// DEFLATE.
#[derive(Debug)]
pub struct Compress {
    mechanism: String,
}

impl Default for Compress {
    fn default() -> Self {
        Self {
            mechanism: "DEFLATE".to_string(),
        }
    }
}

impl Compress {
    /// Requests the named mechanism; only DEFLATE is implemented.
    pub fn new(mechanism: impl Into<String>) -> Self {
        Self {
            mechanism: mechanism.into(),
        }
    }
}

impl Exchange for Compress {
    type Output = ();

    fn kind(&self) -> CommandKind {
        CommandKind::Compress
    }

    fn required_capabilities(&self) -> CapabilitySet {
        CapabilitySet::new().with(Cap::Compress(self.mechanism.to_ascii_uppercase()))
    }

    fn prepare(&mut self) -> Result<Vec<ImapString>> {
        if !self.mechanism.eq_ignore_ascii_case("DEFLATE") {
            return Err(Error::request(format!(
                "unsupported compression mechanism: {}",
                self.mechanism
            )));
        }
        Ok(vec![ImapString::atom("DEFLATE")])
    }

    fn on_upgrade(&self) -> Option<UpgradeKind> {
        Some(UpgradeKind::Deflate)
    }

    fn finish_ok(&mut self, _tagged: &TaggedStatus) -> Result<()> {
        Ok(())
    }
}

/// STARTTLS command. On success the stream is wrapped in TLS and the known
/// capabilities are discarded.
#[derive(Debug, Default)]
pub struct StartTls;

impl Exchange for StartTls {
    type Output = ();

    fn kind(&self) -> CommandKind {
        CommandKind::StartTls
    }

    fn prepare(&mut self) -> Result<Vec<ImapString>> {
        Ok(Vec::new())
    }

    fn on_upgrade(&self) -> Option<UpgradeKind> {
        Some(UpgradeKind::Tls)
    }

    fn finish_ok(&mut self, _tagged: &TaggedStatus) -> Result<()> {
        Ok(())
    }
}

/// ENABLE command (RFC 5161).
#[derive(Debug)]
pub struct Enable {
    capabilities: Vec<String>,
    enabled: CapabilitySet,
}

impl Enable {
    /// Asks the server to enable the named extensions.
    pub fn new<I, S>(capabilities: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            capabilities: capabilities.into_iter().map(Into::into).collect(),
            enabled: CapabilitySet::new(),
        }
    }
}

impl Exchange for Enable {
    type Output = CapabilitySet;

    fn kind(&self) -> CommandKind {
        CommandKind::Enable
    }

    fn prepare(&mut self) -> Result<Vec<ImapString>> {
        if self.capabilities.is_empty() {
            return Err(Error::request("ENABLE needs at least one capability"));
        }
        Ok(self
            .capabilities
            .iter()
            .map(|cap| ImapString::atom(cap.as_str()))
            .collect())
    }

    fn on_data(&mut self, data: &DataResponse) -> Result<()> {
        if data.kind == DataResponseType::Enabled {
            self.enabled.extend(&convert::data::enabled(data)?);
        }
        Ok(())
    }

    fn finish_ok(&mut self, _tagged: &TaggedStatus) -> Result<CapabilitySet> {
        Ok(std::mem::take(&mut self.enabled))
    }
}
