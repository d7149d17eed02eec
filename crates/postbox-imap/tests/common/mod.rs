//! Shared test transports.
//!
//! [`MockStream`] replays a fixed server script and records what the client
//! wrote; [`Server`] is a live peer for exchanges whose timing matters.

#![allow(dead_code, clippy::unwrap_used)]

use std::io::{self, Cursor};
use std::pin::Pin;
use std::sync::{Arc, Mutex};
use std::task::{Context, Poll};

use tokio::io::{
    AsyncBufReadExt, AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt, BufReader, DuplexStream,
    ReadBuf, ReadHalf, WriteHalf,
};

use postbox_imap::{Config, Connection, ImapStream};

/// Stream that returns predefined responses and captures writes.
pub struct MockStream {
    responses: Cursor<Vec<u8>>,
    sent: Arc<Mutex<Vec<u8>>>,
}

impl MockStream {
    /// Creates a stream whose reads return `responses` then EOF.
    pub fn new(responses: &[u8]) -> (Self, Arc<Mutex<Vec<u8>>>) {
        let sent = Arc::new(Mutex::new(Vec::new()));
        (
            Self {
                responses: Cursor::new(responses.to_vec()),
                sent: Arc::clone(&sent),
            },
            sent,
        )
    }
}

impl AsyncRead for MockStream {
    fn poll_read(
        mut self: Pin<&mut Self>,
        _cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        let data = self.responses.get_ref();
        let pos = usize::try_from(self.responses.position()).unwrap_or(usize::MAX);

        if pos >= data.len() {
            return Poll::Ready(Ok(()));
        }

        let remaining = &data[pos..];
        let to_read = remaining.len().min(buf.remaining());
        buf.put_slice(&remaining[..to_read]);
        self.responses.set_position((pos + to_read) as u64);

        Poll::Ready(Ok(()))
    }
}

impl AsyncWrite for MockStream {
    fn poll_write(
        self: Pin<&mut Self>,
        _cx: &mut Context<'_>,
        buf: &[u8],
    ) -> Poll<io::Result<usize>> {
        self.sent
            .lock()
            .map_err(|_| io::Error::other("sent buffer poisoned"))?
            .extend_from_slice(buf);
        Poll::Ready(Ok(buf.len()))
    }

    fn poll_flush(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Poll::Ready(Ok(()))
    }

    fn poll_shutdown(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Poll::Ready(Ok(()))
    }
}

/// Builds a connection over a scripted server and returns the buffer of
/// bytes the client sends.
pub fn scripted(responses: &[u8]) -> (Connection, Arc<Mutex<Vec<u8>>>) {
    scripted_with(responses, &Config::new("localhost"))
}

/// Like [`scripted`] with an explicit configuration.
pub fn scripted_with(responses: &[u8], config: &Config) -> (Connection, Arc<Mutex<Vec<u8>>>) {
    let (stream, sent) = MockStream::new(responses);
    (Connection::new(ImapStream::plain(stream), config), sent)
}

/// Returns everything the client wrote as text.
pub fn sent_text(sent: &Arc<Mutex<Vec<u8>>>) -> String {
    String::from_utf8_lossy(&sent.lock().unwrap()).into_owned()
}

/// Server end of an in-memory connection.
pub struct Server {
    reader: BufReader<ReadHalf<DuplexStream>>,
    writer: WriteHalf<DuplexStream>,
}

impl Server {
    /// Reads one line from the client, without CRLF.
    pub async fn read_line(&mut self) -> String {
        let mut line = String::new();
        self.reader.read_line(&mut line).await.unwrap();
        line.trim_end_matches("\r\n").to_string()
    }

    /// Asserts the next client line.
    pub async fn expect(&mut self, expected: &str) {
        assert_eq!(self.read_line().await, expected);
    }

    /// Writes raw server output.
    pub async fn send(&mut self, data: &str) {
        self.writer.write_all(data.as_bytes()).await.unwrap();
    }

    /// Reads until the client closes and returns what it wrote meanwhile.
    pub async fn drain(&mut self) -> Vec<u8> {
        let mut rest = Vec::new();
        self.reader.read_to_end(&mut rest).await.unwrap();
        rest
    }
}

/// Builds a connection to an in-memory [`Server`].
pub fn live(config: &Config) -> (Connection, Server) {
    let (client, server) = tokio::io::duplex(4096);
    let (read, write) = tokio::io::split(server);
    (
        Connection::new(ImapStream::plain(client), config),
        Server {
            reader: BufReader::new(read),
            writer: write,
        },
    )
}
