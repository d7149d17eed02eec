//! LOGIN and AUTHENTICATE.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;

use crate::command::ImapString;
use crate::parser::TaggedStatus;
use crate::sasl::SaslMechanism;
use crate::transaction::{CommandKind, ContinuationReply, Exchange};
use crate::types::{Capability, CapabilitySet};
use crate::{Error, Result};

use super::any_state::code_capabilities;

/// LOGIN command. Arguments never reach the log.
///
/// The output is the capability list the server attached to the tagged OK,
/// if it sent one.
pub struct Login {
    username: String,
    password: String,
}

impl Login {
    /// Creates a LOGIN command.
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }
}

impl std::fmt::Debug for Login {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Login")
            .field("username", &self.username)
            .finish_non_exhaustive()
    }
}

impl Exchange for Login {
    type Output = Option<CapabilitySet>;

    fn kind(&self) -> CommandKind {
        CommandKind::Login
    }

    fn prepare(&mut self) -> Result<Vec<ImapString>> {
        if self.username.is_empty() {
            return Err(Error::request("LOGIN needs a username"));
        }
        Ok(vec![
            ImapString::astring(&self.username),
            ImapString::astring(&self.password),
        ])
    }

    fn is_sensitive(&self) -> bool {
        true
    }

    fn finish_ok(&mut self, tagged: &TaggedStatus) -> Result<Self::Output> {
        code_capabilities(tagged)
    }
}

/// AUTHENTICATE command driven by a [`SaslMechanism`].
///
/// Challenges and responses are base64 on the wire. A mechanism failure
/// cancels the exchange with `*` and the server ends the command with BAD.
pub struct Authenticate {
    mechanism: Box<dyn SaslMechanism>,
    initial_response: bool,
    initial_pending: bool,
}

impl Authenticate {
    /// Authenticates with `mechanism`.
    ///
    /// With `initial_response`, a client-first mechanism sends its first
    /// message on the command line (SASL-IR, RFC 4959).
    pub fn new(mechanism: impl SaslMechanism + 'static, initial_response: bool) -> Self {
        Self {
            mechanism: Box::new(mechanism),
            initial_response,
            initial_pending: false,
        }
    }

    fn uses_sasl_ir(&self) -> bool {
        self.initial_response && self.mechanism.client_first()
    }

    fn encode(bytes: &[u8]) -> String {
        if bytes.is_empty() {
            "=".to_string()
        } else {
            STANDARD.encode(bytes)
        }
    }

    fn respond(&mut self, text: &str) -> Result<Vec<u8>> {
        if self.initial_pending {
            self.initial_pending = false;
            let initial = self.mechanism.initial_response()?.unwrap_or_default();
            return Ok(STANDARD.encode(initial).into_bytes());
        }
        let challenge = STANDARD
            .decode(text.trim())
            .map_err(|err| Error::Sasl(format!("invalid challenge: {err}")))?;
        let response = self.mechanism.exchange(&challenge)?;
        Ok(STANDARD.encode(response).into_bytes())
    }
}

impl std::fmt::Debug for Authenticate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Authenticate")
            .field("mechanism", &self.mechanism.name())
            .field("initial_response", &self.initial_response)
            .finish_non_exhaustive()
    }
}

impl Exchange for Authenticate {
    type Output = Option<CapabilitySet>;

    fn kind(&self) -> CommandKind {
        CommandKind::Authenticate
    }

    fn required_capabilities(&self) -> CapabilitySet {
        let caps =
            CapabilitySet::new().with(Capability::Auth(self.mechanism.name().to_ascii_uppercase()));
        if self.uses_sasl_ir() {
            caps.with(Capability::SaslIr)
        } else {
            caps
        }
    }

    fn prepare(&mut self) -> Result<Vec<ImapString>> {
        self.mechanism.initialize()?;
        let mut args = vec![ImapString::atom(self.mechanism.name())];
        if self.uses_sasl_ir() {
            let initial = self.mechanism.initial_response()?.unwrap_or_default();
            args.push(ImapString::Atom(Self::encode(&initial)));
        } else {
            self.initial_pending = self.mechanism.client_first();
        }
        Ok(args)
    }

    fn is_sensitive(&self) -> bool {
        true
    }

    fn on_continuation(&mut self, text: &str) -> Result<ContinuationReply> {
        match self.respond(text) {
            Ok(line) => Ok(ContinuationReply::Line(line)),
            Err(err) => {
                tracing::warn!(
                    mechanism = self.mechanism.name(),
                    error = %err,
                    "cancelling SASL exchange"
                );
                Ok(ContinuationReply::Line(b"*".to_vec()))
            }
        }
    }

    fn finish_ok(&mut self, tagged: &TaggedStatus) -> Result<Self::Output> {
        code_capabilities(tagged)
    }
}
