//! IMAP connection management.
//!
//! This module provides the single-session connection the transactions run
//! over:
//! - Configuration (host, port, security mode, timeouts, TLS roots)
//! - Upgradeable stream stack (plain, TLS, DEFLATE)
//! - Framed line and literal I/O
//! - Tagging, sending, and the ordered response queue

mod config;
mod deflate;
mod framed;
mod stream;

use std::collections::VecDeque;
use std::sync::Arc;
use std::time::{Duration, Instant};

pub use config::{Config, ConfigBuilder, Security, Timeouts, TlsConfig};
pub use deflate::DeflateStream;
pub use framed::{FramedStream, MAX_LINE_LENGTH, MAX_LITERAL_SIZE};
pub use stream::{ImapStream, Io, connect};

use crate::command::{Command, ImapString, TagGenerator};
use crate::convert;
use crate::parser::{Response, ResponseReceiver, UntaggedStatus};
use crate::time::{Clock, SystemClock};
use crate::types::{Capability, CapabilitySet, Condition, ResponseCode};
use crate::{Error, Result};

/// In-band stream replacement negotiated by a command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpgradeKind {
    /// TLS after STARTTLS.
    Tls,
    /// DEFLATE after COMPRESS.
    Deflate,
}

/// Fragments of a command still waiting for continuation requests.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingContinuation {
    fragments: VecDeque<Vec<u8>>,
}

impl PendingContinuation {
    /// Returns the number of fragments not yet sent.
    #[must_use]
    pub fn remaining(&self) -> usize {
        self.fragments.len()
    }
}

/// Outcome of writing a command or one of its continuation fragments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SendProgress {
    /// The whole command has been written.
    Complete,
    /// A synchronizing literal is waiting for `+`.
    Continuing(PendingContinuation),
}

enum Chunk {
    Line(Vec<u8>),
    Literal(Vec<u8>),
}

/// One IMAP session over an upgradeable byte stream.
///
/// A connection serves one command at a time: the transaction driver holds
/// it by `&mut` for the whole exchange.
pub struct Connection {
    framed: FramedStream<ImapStream>,
    tags: TagGenerator,
    receiver: ResponseReceiver,
    queue: VecDeque<Response>,
    host: String,
    tls: TlsConfig,
    clock: Arc<dyn Clock>,
    last_sent: Option<Instant>,
    idling: bool,
    receive_timeout: Duration,
    saved_receive_timeout: Option<Duration>,
    send_timeout: Duration,
    idle_poll_interval: Duration,
    capabilities: CapabilitySet,
}

impl std::fmt::Debug for Connection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Connection")
            .field("host", &self.host)
            .field("tags", &self.tags)
            .field("idling", &self.idling)
            .field("secure", &self.is_secure())
            .field("compressed", &self.is_compressed())
            .field("queued", &self.queue.len())
            .finish_non_exhaustive()
    }
}

impl Connection {
    /// Wraps an established stream.
    #[must_use]
    pub fn new(stream: ImapStream, config: &Config) -> Self {
        Self {
            framed: FramedStream::new(stream),
            tags: TagGenerator::new(),
            receiver: ResponseReceiver::new(),
            queue: VecDeque::new(),
            host: config.host.clone(),
            tls: config.tls.clone(),
            clock: Arc::new(SystemClock),
            last_sent: None,
            idling: false,
            receive_timeout: config.timeouts.receive,
            saved_receive_timeout: None,
            send_timeout: config.timeouts.send,
            idle_poll_interval: config.timeouts.idle_poll,
            capabilities: CapabilitySet::default(),
        }
    }

    /// Dials the configured server.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Timeout`] if the TCP connect exceeds the connect
    /// timeout, or the socket/TLS error otherwise.
    pub async fn connect(config: &Config) -> Result<Self> {
        let stream = connect(config).await?;
        Ok(Self::new(stream, config))
    }

    /// Replaces the clock used for `last_sent` bookkeeping.
    #[must_use]
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Reads the server greeting.
    ///
    /// A `CAPABILITY` response code in the greeting is remembered.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Bye`] if the server refuses the connection and
    /// [`Error::Protocol`] for anything but an untagged OK or PREAUTH.
    pub async fn receive_greeting(&mut self) -> Result<UntaggedStatus> {
        match self.try_receive_response().await? {
            Response::Untagged(status) => match status.condition {
                Condition::Ok | Condition::PreAuth => {
                    if let Some(ResponseCode::Capability(caps)) =
                        convert::code::response_code(&status.text)?
                    {
                        self.set_capabilities(caps);
                    }
                    Ok(status)
                }
                Condition::Bye => Err(Error::Bye(status.text.text)),
                other => Err(Error::Protocol(format!("unexpected greeting condition {other}"))),
            },
            other => Err(Error::Protocol(format!("unexpected greeting: {other:?}"))),
        }
    }

    /// Allocates the next tag and builds a command.
    pub fn create_command(&self, verb: impl Into<String>, args: Vec<ImapString>) -> Command {
        Command::new(self.tags.next(), verb, args)
    }

    /// Writes a command up to its first synchronizing literal.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Timeout`] if the write exceeds the send timeout, or
    /// the socket error.
    pub async fn send_command(&mut self, command: &Command) -> Result<SendProgress> {
        tracing::debug!(command = %command.describe(), "send");
        let fragments = command.fragments(self.literal_plus()).into();
        self.send_continuation(PendingContinuation { fragments }).await
    }

    /// Writes the next fragment of a command after a continuation request.
    ///
    /// # Errors
    ///
    /// See [`Connection::send_command`].
    pub async fn send_continuation(&mut self, mut pending: PendingContinuation) -> Result<SendProgress> {
        if let Some(fragment) = pending.fragments.pop_front() {
            self.write(&fragment).await?;
        }
        if pending.fragments.is_empty() {
            Ok(SendProgress::Complete)
        } else {
            Ok(SendProgress::Continuing(pending))
        }
    }

    /// Writes a bare line such as a SASL response or `DONE`, appending CRLF.
    ///
    /// The content is not logged.
    ///
    /// # Errors
    ///
    /// See [`Connection::send_command`].
    pub async fn send_raw_line(&mut self, line: &[u8]) -> Result<()> {
        tracing::debug!(len = line.len(), "send line");
        let mut bytes = Vec::with_capacity(line.len() + 2);
        bytes.extend_from_slice(line);
        bytes.extend_from_slice(b"\r\n");
        self.write(&bytes).await
    }

    async fn write(&mut self, bytes: &[u8]) -> Result<()> {
        tokio::time::timeout(self.send_timeout, self.framed.write_all(bytes))
            .await
            .map_err(|_| Error::Timeout("send timeout"))??;
        self.last_sent = Some(self.clock.now());
        Ok(())
    }

    /// Returns the next response in wire order.
    ///
    /// Responses already parsed are returned first; otherwise lines and
    /// literals are read until a complete response is available. Dropping
    /// the future loses no data.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Timeout`] when nothing arrives within the receive
    /// timeout (never while idling), [`Error::MalformedResponse`] for a line
    /// that cannot be parsed, or the socket error.
    pub async fn try_receive_response(&mut self) -> Result<Response> {
        loop {
            if !self.receiver.is_continuing()
                && let Some(response) = self.queue.pop_front()
            {
                return Ok(response);
            }
            self.receive_chunk().await?;
        }
    }

    async fn receive_chunk(&mut self) -> Result<()> {
        let timeout = self.receive_timeout;
        let read = match self.receiver.pending_literal() {
            Some(len) => tokio::time::timeout(timeout, self.framed.read_exact_bytes(len))
                .await
                .map(|r| r.map(Chunk::Literal)),
            None => tokio::time::timeout(timeout, self.framed.read_line())
                .await
                .map(|r| r.map(Chunk::Line)),
        };

        let chunk = match read {
            Ok(chunk) => chunk?,
            Err(_) if self.idling => {
                tracing::trace!("idle poll interval elapsed");
                return Ok(());
            }
            Err(_) => return Err(Error::Timeout("receive timeout")),
        };

        match chunk {
            Chunk::Literal(bytes) => self.receiver.receive_literal(bytes),
            Chunk::Line(line) => {
                if let Some(response) = self.receiver.receive_line(&line)? {
                    tracing::debug!(response = ?response, "receive");
                    self.queue.push_back(response);
                }
                Ok(())
            }
        }
    }

    /// Enters or leaves the idling state.
    ///
    /// While idling the receive timeout is the idle poll interval and
    /// timeouts are not reported; leaving restores the previous timeout.
    pub fn set_idling(&mut self, idling: bool) {
        if idling == self.idling {
            return;
        }
        self.idling = idling;
        if idling {
            self.saved_receive_timeout = Some(self.receive_timeout);
            self.receive_timeout = self.idle_poll_interval;
            tracing::info!(poll = ?self.idle_poll_interval, "idle started");
        } else {
            if let Some(timeout) = self.saved_receive_timeout.take() {
                self.receive_timeout = timeout;
            }
            tracing::info!("idle finished");
        }
    }

    /// Replaces the stream with a TLS or DEFLATE layer over it.
    ///
    /// Bytes read ahead of the upgrade are replayed into the new layer.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Upgrade`] if the layer is already active or the
    /// handshake fails. A failed handshake leaves the connection closed.
    pub async fn upgrade(&mut self, kind: UpgradeKind) -> Result<()> {
        let active = match kind {
            UpgradeKind::Tls => self.is_secure(),
            UpgradeKind::Deflate => self.is_compressed(),
        };
        if active {
            return Err(Error::Upgrade(format!("{kind:?} layer is already active")));
        }

        let framed = std::mem::replace(&mut self.framed, FramedStream::new(ImapStream::Closed));
        let (stream, leftover) = framed.into_parts();
        let buffered = leftover.len();
        let stream = stream.rewind(leftover);

        let upgraded = match kind {
            UpgradeKind::Tls => {
                tokio::time::timeout(
                    self.receive_timeout,
                    stream.upgrade_to_tls(&self.host, &self.tls),
                )
                .await
                .map_err(|_| Error::Upgrade("TLS handshake timed out".to_string()))?
                .map_err(|e| Error::Upgrade(e.to_string()))?
            }
            UpgradeKind::Deflate => stream.compress(),
        };
        self.framed = FramedStream::new(upgraded);
        tracing::info!(?kind, buffered, "stream upgraded");
        Ok(())
    }

    /// Checks that the server advertised every capability in `required`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Request`] naming the missing capabilities.
    pub fn check_capabilities(&self, required: &CapabilitySet) -> Result<()> {
        let missing = self.capabilities.missing(required);
        if missing.is_empty() {
            Ok(())
        } else {
            let names: Vec<String> = missing.iter().map(ToString::to_string).collect();
            Err(Error::Request(format!(
                "server lacks capabilities: {}",
                names.join(" ")
            )))
        }
    }

    fn literal_plus(&self) -> bool {
        self.capabilities.contains(&Capability::LiteralPlus)
    }

    /// Returns true once TLS is active.
    #[must_use]
    pub fn is_secure(&self) -> bool {
        self.framed.get_ref().is_tls()
    }

    /// Returns true once DEFLATE is active.
    #[must_use]
    pub fn is_compressed(&self) -> bool {
        self.framed.get_ref().is_compressed()
    }

    /// Returns true while IDLE is in progress.
    #[must_use]
    pub const fn is_idling(&self) -> bool {
        self.idling
    }

    /// Returns when bytes were last written.
    #[must_use]
    pub const fn last_sent(&self) -> Option<Instant> {
        self.last_sent
    }

    /// Returns the time since bytes were last written, if ever.
    #[must_use]
    pub fn idle_time(&self) -> Option<Duration> {
        self.last_sent.map(|sent| self.clock.since(sent))
    }

    /// Returns true when nothing has been written for `interval`, meaning a
    /// NOOP should be sent to keep the session alive. Never due while
    /// idling, since IDLE itself keeps the session open.
    #[must_use]
    pub fn keepalive_due(&self, interval: Duration) -> bool {
        !self.idling && self.idle_time().is_some_and(|quiet| quiet >= interval)
    }

    /// Returns the current receive timeout.
    #[must_use]
    pub const fn receive_timeout(&self) -> Duration {
        self.receive_timeout
    }

    /// Returns the last capabilities the server announced.
    #[must_use]
    pub const fn capabilities(&self) -> &CapabilitySet {
        &self.capabilities
    }

    /// Records the server's capabilities.
    pub fn set_capabilities(&mut self, capabilities: CapabilitySet) {
        tracing::debug!(count = capabilities.len(), "capabilities updated");
        self.capabilities = capabilities;
    }

    /// Shuts the stream down.
    ///
    /// # Errors
    ///
    /// Returns the socket error, if any.
    pub async fn close(&mut self) -> Result<()> {
        use tokio::io::AsyncWriteExt;

        let framed = std::mem::replace(&mut self.framed, FramedStream::new(ImapStream::Closed));
        let (mut stream, _) = framed.into_parts();
        stream.shutdown().await?;
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::parser::DataResponseType;
    use crate::time::ManualClock;
    use flate2::{Compress, Compression, FlushCompress};
    use tokio::io::AsyncWriteExt;
    use tokio_test::io::Builder;

    fn connection(stream: impl Io + 'static) -> Connection {
        Connection::new(ImapStream::plain(stream), &Config::new("localhost"))
    }

    fn deflate(data: &[u8]) -> Vec<u8> {
        let mut compress = Compress::new(Compression::default(), false);
        let mut out = Vec::with_capacity(data.len() + 64);
        compress.compress_vec(data, &mut out, FlushCompress::Sync).unwrap();
        out
    }

    #[test]
    fn test_tag_sequence() {
        let (client, _server) = tokio::io::duplex(64);
        let conn = connection(client);
        let first = conn.create_command("NOOP", vec![]);
        let second = conn.create_command("NOOP", vec![]);
        assert_eq!(first.tag().unwrap().as_str(), "0001");
        assert_eq!(second.tag().unwrap().as_str(), "0002");
    }

    #[tokio::test]
    async fn test_send_command_with_literal_continues() {
        let mock = Builder::new()
            .write(b"0001 LOGIN fred {5}\r\n")
            .write(b"p\"w\r\n\r\n")
            .build();
        let mut conn = connection(mock);
        let clock = ManualClock::shared();
        conn = conn.with_clock(clock.clone());

        let command = conn.create_command(
            "LOGIN",
            vec![ImapString::astring("fred"), ImapString::literal(b"p\"w\r\n".to_vec())],
        );
        let SendProgress::Continuing(pending) = conn.send_command(&command).await.unwrap() else {
            panic!("expected a pending literal");
        };
        assert_eq!(pending.remaining(), 1);
        let sent = conn.last_sent().unwrap();

        clock.advance(Duration::from_secs(3));
        assert_eq!(conn.idle_time(), Some(Duration::from_secs(3)));
        assert!(conn.keepalive_due(Duration::from_secs(3)));
        assert!(!conn.keepalive_due(Duration::from_secs(4)));

        assert_eq!(
            conn.send_continuation(pending).await.unwrap(),
            SendProgress::Complete
        );
        assert!(conn.last_sent().unwrap() > sent);
    }

    #[tokio::test]
    async fn test_receive_literal_with_embedded_crlf() {
        let mock = Builder::new()
            .read(b"* 1 FETCH (BODY[] {11}\r\nhel")
            .read(b"lo\r\nworl)\r\n0002 OK done\r\n")
            .build();
        let mut conn = connection(mock);

        let Response::Data(data) = conn.try_receive_response().await.unwrap() else {
            panic!("expected FETCH");
        };
        assert_eq!(data.kind, DataResponseType::Fetch);
        let (_, attrs) = convert::data::fetch(&data).unwrap();
        assert_eq!(attrs.section("BODY[]"), Some(&b"hello\r\nworl"[..]));

        assert!(matches!(
            conn.try_receive_response().await.unwrap(),
            Response::Tagged(_)
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn test_receive_timeout() {
        let (client, _server) = tokio::io::duplex(64);
        let mut conn = connection(client);
        let err = conn.try_receive_response().await.unwrap_err();
        assert!(matches!(err, Error::Timeout("receive timeout")));
    }

    #[tokio::test(start_paused = true)]
    async fn test_idling_swallows_timeouts() {
        let (client, mut server) = tokio::io::duplex(64);
        let mut conn = connection(client);
        let normal = conn.receive_timeout();

        conn.set_idling(true);
        assert_eq!(conn.receive_timeout(), Duration::from_secs(1));

        let writer = tokio::spawn(async move {
            tokio::time::sleep(Duration::from_secs(5)).await;
            server.write_all(b"* 4 EXISTS\r\n").await.unwrap();
            server
        });

        let response = conn.try_receive_response().await.unwrap();
        assert!(matches!(response, Response::Data(ref d) if d.kind == DataResponseType::Exists));
        let _server = writer.await.unwrap();

        conn.set_idling(false);
        assert_eq!(conn.receive_timeout(), normal);
        assert!(!conn.is_idling());
    }

    #[tokio::test]
    async fn test_malformed_line_is_reported() {
        let mock = Builder::new().read(b" OK no tag\r\n* 1 EXISTS\r\n").build();
        let mut conn = connection(mock);
        assert!(matches!(
            conn.try_receive_response().await,
            Err(Error::MalformedResponse { .. })
        ));
        assert!(matches!(
            conn.try_receive_response().await.unwrap(),
            Response::Data(_)
        ));
    }

    #[tokio::test]
    async fn test_eof_is_connection_error() {
        let mock = Builder::new().read(b"* OK").build();
        let mut conn = connection(mock);
        assert!(matches!(
            conn.try_receive_response().await,
            Err(Error::Connection(_))
        ));
    }

    #[tokio::test]
    async fn test_deflate_upgrade_keeps_read_ahead() {
        let (client, mut server) = tokio::io::duplex(4096);
        let mut conn = connection(client);

        let mut wire = b"0001 OK DEFLATE active\r\n".to_vec();
        wire.extend(deflate(b"* 3 EXISTS\r\n"));
        server.write_all(&wire).await.unwrap();

        assert!(matches!(
            conn.try_receive_response().await.unwrap(),
            Response::Tagged(_)
        ));
        conn.upgrade(UpgradeKind::Deflate).await.unwrap();
        assert!(conn.is_compressed());
        assert!(!conn.is_secure());

        let Response::Data(data) = conn.try_receive_response().await.unwrap() else {
            panic!("expected EXISTS");
        };
        assert_eq!(convert::data::exists(&data).unwrap(), 3);
    }

    #[tokio::test]
    async fn test_double_upgrade_rejected() {
        let (client, _server) = tokio::io::duplex(64);
        let mut conn = connection(client);
        conn.upgrade(UpgradeKind::Deflate).await.unwrap();
        assert!(matches!(
            conn.upgrade(UpgradeKind::Deflate).await,
            Err(Error::Upgrade(_))
        ));
    }

    #[tokio::test]
    async fn test_greeting_records_capabilities() {
        let mock = Builder::new()
            .read(b"* OK [CAPABILITY IMAP4rev1 LITERAL+ IDLE] ready\r\n")
            .write(b"0001 LOGIN fred {3+}\r\nabc\r\n")
            .build();
        let mut conn = connection(mock);

        let greeting = conn.receive_greeting().await.unwrap();
        assert_eq!(greeting.text.text, "ready");
        assert!(conn.capabilities().contains(&Capability::Idle));

        let command = conn.create_command(
            "LOGIN",
            vec![
                ImapString::astring("fred"),
                ImapString::literal_with(
                    b"abc".to_vec(),
                    crate::command::LiteralMode::NonSynchronizingIfCapable,
                    false,
                ),
            ],
        );
        assert_eq!(
            conn.send_command(&command).await.unwrap(),
            SendProgress::Complete
        );
    }

    #[tokio::test]
    async fn test_bye_greeting() {
        let mock = Builder::new().read(b"* BYE too busy\r\n").build();
        let mut conn = connection(mock);
        assert!(matches!(
            conn.receive_greeting().await,
            Err(Error::Bye(text)) if text == "too busy"
        ));
    }

    #[test]
    fn test_check_capabilities() {
        let (client, _server) = tokio::io::duplex(64);
        let mut conn = connection(client);
        conn.set_capabilities(CapabilitySet::default().with(Capability::Idle));

        let idle = CapabilitySet::default().with(Capability::Idle);
        assert!(conn.check_capabilities(&idle).is_ok());

        let enable = CapabilitySet::default().with(Capability::Enable);
        let err = conn.check_capabilities(&enable).unwrap_err();
        assert!(err.to_string().contains("ENABLE"));
    }
}
