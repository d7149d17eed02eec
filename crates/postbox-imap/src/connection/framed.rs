//! Framed I/O for IMAP protocol.
//!
//! IMAP uses CRLF-terminated lines with literals of announced length in
//! between. Reads keep their partial state in the frame buffer, so a read
//! future dropped by a timeout or `select!` loses nothing.

use bytes::BytesMut;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

use crate::{Error, Result};

/// Default buffer size for reading.
const DEFAULT_BUFFER_SIZE: usize = 8192;

/// Maximum line length to prevent memory exhaustion.
pub const MAX_LINE_LENGTH: usize = 1024 * 1024; // 1 MB

/// Maximum literal size to prevent memory exhaustion.
pub const MAX_LITERAL_SIZE: usize = 100 * 1024 * 1024; // 100 MB

/// Buffered line and literal reader plus writer over a byte stream.
pub struct FramedStream<S> {
    stream: S,
    read_buffer: BytesMut,
}

impl<S> FramedStream<S>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    /// Creates a new framed stream.
    pub fn new(stream: S) -> Self {
        Self {
            stream,
            read_buffer: BytesMut::with_capacity(DEFAULT_BUFFER_SIZE),
        }
    }

    /// Fills the buffer with whatever the stream has; cancel-safe.
    async fn fill(&mut self) -> Result<()> {
        let n = self.stream.read_buf(&mut self.read_buffer).await?;
        if n == 0 {
            return Err(Error::Connection("connection closed by server".to_string()));
        }
        Ok(())
    }

    /// Reads one CRLF-terminated line, including the CRLF.
    pub async fn read_line(&mut self) -> Result<Vec<u8>> {
        let mut searched = 0;
        loop {
            if let Some(pos) = find_crlf(&self.read_buffer[searched..]) {
                let line = self.read_buffer.split_to(searched + pos + 2);
                return Ok(line.to_vec());
            }
            searched = self.read_buffer.len().saturating_sub(1);
            if self.read_buffer.len() > MAX_LINE_LENGTH {
                return Err(Error::Protocol("line too long".to_string()));
            }
            self.fill().await?;
        }
    }

    /// Reads exactly `len` bytes, e.g. a literal payload.
    pub async fn read_exact_bytes(&mut self, len: usize) -> Result<Vec<u8>> {
        if len > MAX_LITERAL_SIZE {
            return Err(Error::Protocol(format!(
                "literal too large: {len} bytes (max {MAX_LITERAL_SIZE})"
            )));
        }
        while self.read_buffer.len() < len {
            self.read_buffer.reserve(len - self.read_buffer.len());
            self.fill().await?;
        }
        Ok(self.read_buffer.split_to(len).to_vec())
    }

    /// Writes and flushes `data`.
    pub async fn write_all(&mut self, data: &[u8]) -> Result<()> {
        self.stream.write_all(data).await?;
        self.stream.flush().await?;
        Ok(())
    }

    /// Returns true if unread bytes are buffered.
    #[must_use]
    pub fn has_buffered(&self) -> bool {
        !self.read_buffer.is_empty()
    }

    /// Gets a reference to the underlying stream.
    pub const fn get_ref(&self) -> &S {
        &self.stream
    }

    /// Consumes the frame, returning the stream and the unread bytes.
    pub fn into_parts(self) -> (S, Vec<u8>) {
        (self.stream, self.read_buffer.to_vec())
    }
}

/// Finds the position of CRLF in a buffer.
fn find_crlf(buf: &[u8]) -> Option<usize> {
    buf.windows(2).position(|w| w == b"\r\n")
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use std::time::Duration;
    use tokio_test::io::Builder;

    #[test]
    fn test_find_crlf() {
        assert_eq!(find_crlf(b"hello\r\n"), Some(5));
        assert_eq!(find_crlf(b"\r\n"), Some(0));
        assert_eq!(find_crlf(b"no newline"), None);
        assert_eq!(find_crlf(b"just\n"), None);
        assert_eq!(find_crlf(b"just\r"), None);
    }

    #[tokio::test]
    async fn test_read_lines_split_across_reads() {
        let mock = Builder::new()
            .read(b"* OK re")
            .read(b"ady\r")
            .read(b"\n* 1 EXISTS\r\n")
            .build();
        let mut framed = FramedStream::new(mock);

        assert_eq!(framed.read_line().await.unwrap(), b"* OK ready\r\n");
        assert_eq!(framed.read_line().await.unwrap(), b"* 1 EXISTS\r\n");
    }

    #[tokio::test]
    async fn test_literal_with_embedded_crlf() {
        let mock = Builder::new()
            .read(b"* 1 FETCH (BODY[] {11}\r\nhello")
            .read(b"\r\nworl)\r\n")
            .build();
        let mut framed = FramedStream::new(mock);

        assert_eq!(framed.read_line().await.unwrap(), b"* 1 FETCH (BODY[] {11}\r\n");
        assert_eq!(framed.read_exact_bytes(11).await.unwrap(), b"hello\r\nworl");
        assert_eq!(framed.read_line().await.unwrap(), b")\r\n");
    }

    #[tokio::test]
    async fn test_write_all() {
        let mock = Builder::new().write(b"0001 NOOP\r\n").build();
        let mut framed = FramedStream::new(mock);
        framed.write_all(b"0001 NOOP\r\n").await.unwrap();
    }

    #[tokio::test]
    async fn test_literal_size_validation() {
        let mock = Builder::new().build();
        let mut framed = FramedStream::new(mock);

        let err = framed.read_exact_bytes(MAX_LITERAL_SIZE + 1).await.unwrap_err();
        assert!(err.to_string().contains("literal too large"));
    }

    #[tokio::test]
    async fn test_line_length_limit() {
        let long_line = "A".repeat(MAX_LINE_LENGTH + 100);
        let mock = Builder::new().read(long_line.as_bytes()).build();
        let mut framed = FramedStream::new(mock);

        let err = framed.read_line().await.unwrap_err();
        assert!(err.to_string().contains("line too long"));
    }

    #[tokio::test]
    async fn test_eof_is_connection_error() {
        let mock = Builder::new().read(b"* OK").build();
        let mut framed = FramedStream::new(mock);
        assert!(matches!(
            framed.read_line().await,
            Err(Error::Connection(_))
        ));
    }

    #[tokio::test]
    async fn test_cancelled_read_keeps_partial_line() {
        let (client, mut server) = tokio::io::duplex(64);
        let mut framed = FramedStream::new(client);

        server.write_all(b"* 2 EXI").await.unwrap();
        let timed_out =
            tokio::time::timeout(Duration::from_millis(20), framed.read_line()).await;
        assert!(timed_out.is_err());

        server.write_all(b"STS\r\n").await.unwrap();
        assert_eq!(framed.read_line().await.unwrap(), b"* 2 EXISTS\r\n");
    }

    #[tokio::test]
    async fn test_into_parts_returns_unread_bytes() {
        let mock = Builder::new().read(b"0002 OK begin TLS\r\nextra").build();
        let mut framed = FramedStream::new(mock);
        framed.read_line().await.unwrap();
        assert!(framed.has_buffered());
        let (_stream, rest) = framed.into_parts();
        assert_eq!(rest, b"extra");
    }
}
