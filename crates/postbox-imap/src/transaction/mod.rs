//! Command state machine.
//!
//! Each command is described by an [`Exchange`]: its kind, how to build its
//! arguments, and how to fold the responses it receives into a typed value.
//! [`Transaction`] drives any exchange over a [`Connection`]:
//!
//! ```text
//! Prepare ──► Send ──► Receive ◄──┐
//!                        │ ▲      │ continuation request
//!                        │ └─ Continue
//!                        ▼
//!                     Finished
//! ```
//!
//! Argument errors finish the transaction before anything is written.
//! Socket, timeout and parse failures finish it with the matching
//! [`ResultCode`]; callers always receive a [`CommandResult`].
//!
//! # Example
//!
//! ```no_run
//! use postbox_imap::connection::{Config, Connection};
//! use postbox_imap::transaction::{self, catalog::Status};
//! use postbox_imap::command::StatusItem;
//! use postbox_imap::types::Mailbox;
//!
//! # async fn example() -> postbox_imap::Result<()> {
//! let mut conn = Connection::connect(&Config::new("imap.example.com")).await?;
//! conn.receive_greeting().await?;
//!
//! let status = Status::new(Mailbox::inbox(), vec![StatusItem::Messages]);
//! let result = transaction::run(&mut conn, status).await;
//! println!("{} messages", result.into_result()?.messages.unwrap_or(0));
//! # Ok(())
//! # }
//! ```

pub mod catalog;
mod kind;
mod result;

use std::sync::Arc;

use crate::command::{Command, ImapString};
use crate::connection::{Connection, PendingContinuation, SendProgress, UpgradeKind};
use crate::convert;
use crate::parser::{
    DataResponse, DataResponseType, Response, ResponseText, TaggedStatus, UntaggedStatus,
};
use crate::types::{CapabilitySet, Condition, ResponseCode, Tag};
use crate::{Error, Result};

pub use catalog::idle::IdleSignal;
pub use kind::CommandKind;
pub use result::{CommandResult, ResultCode};

/// What to do with a continuation request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContinuationReply {
    /// Send the next fragment of the command.
    SendPending,
    /// Send this line, e.g. a SASL response.
    Line(Vec<u8>),
    /// The server accepted IDLE.
    Idle,
    /// Nothing to send.
    Ignore,
}

/// Describes one command: its arguments and how its responses become a
/// value.
pub trait Exchange: Send {
    /// Value produced on success.
    type Output;

    /// Returns the command kind.
    fn kind(&self) -> CommandKind;

    /// Returns the capabilities the server must advertise for this command
    /// with these arguments.
    fn required_capabilities(&self) -> CapabilitySet {
        self.kind().capabilities()
    }

    /// Validates the arguments and builds them.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Request`] for missing or invalid arguments.
    fn prepare(&mut self) -> Result<Vec<ImapString>>;

    /// Returns true if the arguments must not appear in logs.
    fn is_sensitive(&self) -> bool {
        false
    }

    /// Handles an untagged response received while the command is active.
    ///
    /// # Errors
    ///
    /// A [`Error::MalformedData`] is logged and skipped by the driver; any
    /// other error ends the command.
    fn on_untagged(&mut self, response: &Response) -> Result<()> {
        match response {
            Response::Data(data) => self.on_data(data),
            Response::Untagged(status) => self.on_status(status),
            Response::Tagged(_) | Response::Continuation(_) => Ok(()),
        }
    }

    /// Handles a data response.
    ///
    /// # Errors
    ///
    /// See [`Exchange::on_untagged`].
    fn on_data(&mut self, data: &DataResponse) -> Result<()> {
        let _ = data;
        Ok(())
    }

    /// Handles an untagged status response.
    ///
    /// # Errors
    ///
    /// See [`Exchange::on_untagged`].
    fn on_status(&mut self, status: &UntaggedStatus) -> Result<()> {
        let _ = status;
        Ok(())
    }

    /// Answers a continuation request. The default sends the next literal.
    ///
    /// # Errors
    ///
    /// Any error ends the command.
    fn on_continuation(&mut self, text: &str) -> Result<ContinuationReply> {
        let _ = text;
        Ok(ContinuationReply::SendPending)
    }

    /// Returns the stream upgrade to perform after a tagged OK.
    fn on_upgrade(&self) -> Option<UpgradeKind> {
        None
    }

    /// Returns the signal that ends IDLE, for the IDLE command.
    fn idle_signal(&self) -> Option<Arc<IdleSignal>> {
        None
    }

    /// Builds the value after a tagged OK.
    ///
    /// # Errors
    ///
    /// A shape error in data carried by the tagged status.
    fn finish_ok(&mut self, tagged: &TaggedStatus) -> Result<Self::Output>;

    /// Builds a value after a tagged NO, for commands that report partial
    /// results.
    fn finish_no(&mut self, tagged: &TaggedStatus) -> Option<Self::Output> {
        let _ = tagged;
        None
    }

    /// Called once when the command ends, whatever the outcome.
    fn on_finish(&mut self, code: ResultCode) {
        let _ = code;
    }
}

enum Step {
    Prepare,
    Send(Command),
    Continue(PendingContinuation),
    Receive(Option<PendingContinuation>),
    Finished,
}

enum Wake {
    Done,
    Response(Result<Response>),
}

/// Drives one [`Exchange`] to completion.
pub struct Transaction<'c, E: Exchange> {
    conn: &'c mut Connection,
    exchange: E,
    step: Step,
    tag: Option<Tag>,
    done_sent: bool,
    responses: Vec<Response>,
    result: Option<CommandResult<E::Output>>,
}

impl<'c, E: Exchange> Transaction<'c, E> {
    /// Creates a transaction; nothing is sent until [`Transaction::process`].
    pub fn new(conn: &'c mut Connection, exchange: E) -> Self {
        Self {
            conn,
            exchange,
            step: Step::Prepare,
            tag: None,
            done_sent: false,
            responses: Vec::new(),
            result: None,
        }
    }

    /// Returns the command tag once the command has been built.
    #[must_use]
    pub const fn tag(&self) -> Option<&Tag> {
        self.tag.as_ref()
    }

    /// Runs every step until the transaction finishes.
    pub async fn process(mut self) -> CommandResult<E::Output> {
        loop {
            let next = match std::mem::replace(&mut self.step, Step::Finished) {
                Step::Prepare => self.prepare(),
                Step::Send(command) => self.send(command).await,
                Step::Continue(pending) => self.send_continuation(pending).await,
                Step::Receive(pending) => self.receive(pending).await,
                Step::Finished => break,
            };
            match next {
                Ok(step) => self.step = step,
                Err(err) => self.finish_error(err),
            }
        }

        self.result.take().unwrap_or_else(|| CommandResult {
            code: ResultCode::InternalError,
            value: None,
            tagged: None,
            description: "transaction ended without a result".to_string(),
            error: None,
            responses: std::mem::take(&mut self.responses),
        })
    }

    fn prepare(&mut self) -> Result<Step> {
        let args = self.exchange.prepare()?;
        let mut command = self.conn.create_command(self.exchange.kind().verb(), args);
        if self.exchange.is_sensitive() {
            command = command.redacted();
        }
        self.tag = command.tag().cloned();
        Ok(Step::Send(command))
    }

    async fn send(&mut self, command: Command) -> Result<Step> {
        match self.conn.send_command(&command).await? {
            SendProgress::Complete => Ok(Step::Receive(None)),
            SendProgress::Continuing(pending) => Ok(Step::Receive(Some(pending))),
        }
    }

    async fn send_continuation(&mut self, pending: PendingContinuation) -> Result<Step> {
        match self.conn.send_continuation(pending).await? {
            SendProgress::Complete => Ok(Step::Receive(None)),
            SendProgress::Continuing(pending) => Ok(Step::Receive(Some(pending))),
        }
    }

    async fn next_response(&mut self) -> Result<Response> {
        let signal = self
            .exchange
            .idle_signal()
            .filter(|_| self.conn.is_idling() && !self.done_sent);
        let Some(signal) = signal else {
            return self.conn.try_receive_response().await;
        };

        let wake = tokio::select! {
            biased;
            () = signal.notified() => Wake::Done,
            response = self.conn.try_receive_response() => Wake::Response(response),
        };
        match wake {
            Wake::Done => {
                self.conn.send_raw_line(b"DONE").await?;
                self.done_sent = true;
                self.conn.set_idling(false);
                self.conn.try_receive_response().await
            }
            Wake::Response(response) => response,
        }
    }

    async fn receive(&mut self, pending: Option<PendingContinuation>) -> Result<Step> {
        let response = self.next_response().await?;
        self.responses.push(response.clone());

        match response {
            Response::Continuation(request) => {
                match self.exchange.on_continuation(&request.text)? {
                    ContinuationReply::SendPending => pending.map(Step::Continue).ok_or_else(|| {
                        Error::Protocol("unexpected continuation request".to_string())
                    }),
                    ContinuationReply::Line(line) => {
                        self.conn.send_raw_line(&line).await?;
                        Ok(Step::Receive(pending))
                    }
                    ContinuationReply::Idle => {
                        self.conn.set_idling(true);
                        Ok(Step::Receive(pending))
                    }
                    ContinuationReply::Ignore => Ok(Step::Receive(pending)),
                }
            }
            Response::Tagged(tagged) => {
                if self.tag.as_ref() != Some(&tagged.tag) {
                    tracing::warn!(
                        expected = ?self.tag.as_ref().map(Tag::as_str),
                        received = %tagged.tag,
                        "ignoring tagged response for another command"
                    );
                    return Ok(Step::Receive(pending));
                }
                self.complete(tagged).await?;
                Ok(Step::Finished)
            }
            Response::Untagged(ref status) => {
                self.note_code(&status.text);
                if status.condition == Condition::Bye && self.exchange.kind() != CommandKind::Logout
                {
                    let description = status.text.text.clone();
                    self.finish(ResultCode::Bye, None, None, description, None);
                    return Ok(Step::Finished);
                }
                self.dispatch(&response)?;
                Ok(Step::Receive(pending))
            }
            Response::Data(ref data) => {
                if data.kind == DataResponseType::Capability {
                    match convert::data::capability(data) {
                        Ok(caps) => self.conn.set_capabilities(caps),
                        Err(err) => tracing::warn!(error = %err, "skipping malformed CAPABILITY"),
                    }
                }
                self.dispatch(&response)?;
                Ok(Step::Receive(pending))
            }
        }
    }

    /// Hands an untagged response to the exchange, skipping malformed data.
    fn dispatch(&mut self, response: &Response) -> Result<()> {
        match self.exchange.on_untagged(response) {
            Err(Error::MalformedData(message)) => {
                tracing::warn!(%message, kind = ?self.exchange.kind(), "skipping malformed data");
                Ok(())
            }
            other => other,
        }
    }

    /// Logs alerts and records capabilities carried in a response code.
    fn note_code(&mut self, text: &ResponseText) {
        match convert::code::response_code(text) {
            Ok(Some(ResponseCode::Capability(caps))) => self.conn.set_capabilities(caps),
            Ok(Some(code)) if code.is_alert() => {
                tracing::warn!(code = ?code, text = %text.text, "server alert");
            }
            Ok(_) => {}
            Err(err) => tracing::warn!(error = %err, "skipping malformed response code"),
        }
    }

    async fn complete(&mut self, tagged: TaggedStatus) -> Result<()> {
        self.note_code(&tagged.text);
        self.conn.set_idling(false);

        match tagged.condition {
            Condition::Ok => {
                if let Some(kind) = self.exchange.on_upgrade() {
                    self.conn.upgrade(kind).await?;
                    if kind == UpgradeKind::Tls {
                        self.conn.set_capabilities(CapabilitySet::default());
                    }
                }
                let value = self.exchange.finish_ok(&tagged)?;
                let description = tagged.text.text.clone();
                self.finish(ResultCode::Ok, Some(value), Some(tagged), description, None);
            }
            Condition::No => {
                let value = self.exchange.finish_no(&tagged);
                let description = tagged.text.text.clone();
                self.finish(ResultCode::No, value, Some(tagged), description, None);
            }
            _ => {
                let description = tagged.text.text.clone();
                self.finish(ResultCode::Bad, None, Some(tagged), description, None);
            }
        }
        Ok(())
    }

    fn finish_error(&mut self, err: Error) {
        let code = ResultCode::from_error(&err);
        tracing::debug!(kind = ?self.exchange.kind(), %code, error = %err, "command failed");
        self.conn.set_idling(false);
        self.finish(code, None, None, err.to_string(), Some(err));
        self.step = Step::Finished;
    }

    fn finish(
        &mut self,
        code: ResultCode,
        value: Option<E::Output>,
        tagged: Option<TaggedStatus>,
        description: String,
        error: Option<Error>,
    ) {
        if self.result.is_some() {
            tracing::error!(kind = ?self.exchange.kind(), %code, "transaction finished twice");
            return;
        }
        tracing::debug!(
            kind = ?self.exchange.kind(),
            tag = ?self.tag.as_ref().map(Tag::as_str),
            %code,
            "command finished"
        );
        self.exchange.on_finish(code);
        self.result = Some(CommandResult {
            code,
            value,
            tagged,
            description,
            error,
            responses: std::mem::take(&mut self.responses),
        });
    }
}

/// Runs an exchange on the connection and returns its result.
pub async fn run<E: Exchange>(conn: &mut Connection, exchange: E) -> CommandResult<E::Output> {
    Transaction::new(conn, exchange).process().await
}
