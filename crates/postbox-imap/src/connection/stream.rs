//! Stream types for IMAP connections.

use std::io;
use std::pin::Pin;
use std::task::{Context, Poll};

use rustls::pki_types::ServerName;
use tokio::io::{AsyncRead, AsyncWrite, ReadBuf};
use tokio::net::TcpStream;
use tokio_rustls::TlsConnector;
use tokio_rustls::client::TlsStream;
use tracing::debug;

use super::config::{Config, Security, TlsConfig};
use super::deflate::DeflateStream;
use crate::{Error, Result};

/// Any duplex byte stream the connection can run over.
pub trait Io: AsyncRead + AsyncWrite + Unpin + Send {}

impl<T: AsyncRead + AsyncWrite + Unpin + Send> Io for T {}

/// The connection's byte stream, possibly layered by STARTTLS and COMPRESS.
pub enum ImapStream {
    /// Unencrypted transport: a TCP socket or any other [`Io`].
    Plain(Box<dyn Io>),
    /// TLS over the previous stream.
    Tls(Box<TlsStream<Self>>),
    /// DEFLATE over the previous stream.
    Deflate(Box<DeflateStream<Self>>),
    /// Bytes read ahead before an upgrade, replayed ahead of `inner`.
    Rewind {
        /// Bytes not yet replayed.
        prefix: Vec<u8>,
        /// Stream to read once `prefix` is exhausted.
        inner: Box<Self>,
    },
    /// Placeholder while the stream is being replaced.
    Closed,
}

impl ImapStream {
    /// Wraps any duplex stream as a plaintext transport.
    pub fn plain(stream: impl Io + 'static) -> Self {
        Self::Plain(Box::new(stream))
    }

    /// Prepends `prefix` to the bytes read from `self`.
    #[must_use]
    pub fn rewind(self, prefix: Vec<u8>) -> Self {
        if prefix.is_empty() {
            self
        } else {
            Self::Rewind {
                prefix,
                inner: Box::new(self),
            }
        }
    }

    /// Performs a TLS handshake over this stream.
    pub async fn upgrade_to_tls(self, host: &str, tls: &TlsConfig) -> Result<Self> {
        if self.is_tls() {
            return Err(Error::InvalidState("Stream is already TLS".to_string()));
        }
        let connector = TlsConnector::from(tls.client_config());
        let server_name = ServerName::try_from(host.to_string())?;
        let stream = connector.connect(server_name, self).await?;
        Ok(Self::Tls(Box::new(stream)))
    }

    /// Wraps this stream in DEFLATE compression.
    #[must_use]
    pub fn compress(self) -> Self {
        Self::Deflate(Box::new(DeflateStream::new(self)))
    }

    /// Returns true if a TLS layer is present.
    #[must_use]
    pub fn is_tls(&self) -> bool {
        match self {
            Self::Tls(_) => true,
            Self::Deflate(stream) => stream.get_ref().is_tls(),
            Self::Rewind { inner, .. } => inner.is_tls(),
            Self::Plain(_) | Self::Closed => false,
        }
    }

    /// Returns true if a DEFLATE layer is present.
    #[must_use]
    pub fn is_compressed(&self) -> bool {
        match self {
            Self::Deflate(_) => true,
            Self::Tls(stream) => stream.get_ref().0.is_compressed(),
            Self::Rewind { inner, .. } => inner.is_compressed(),
            Self::Plain(_) | Self::Closed => false,
        }
    }
}

fn closed() -> io::Error {
    io::Error::new(io::ErrorKind::NotConnected, "stream is closed")
}

impl AsyncRead for ImapStream {
    fn poll_read(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        match self.get_mut() {
            Self::Plain(stream) => Pin::new(stream).poll_read(cx, buf),
            Self::Tls(stream) => Pin::new(stream).poll_read(cx, buf),
            Self::Deflate(stream) => Pin::new(stream).poll_read(cx, buf),
            Self::Rewind { prefix, inner } => {
                if prefix.is_empty() {
                    return Pin::new(inner).poll_read(cx, buf);
                }
                let n = prefix.len().min(buf.remaining());
                buf.put_slice(&prefix[..n]);
                prefix.drain(..n);
                Poll::Ready(Ok(()))
            }
            Self::Closed => Poll::Ready(Err(closed())),
        }
    }
}

impl AsyncWrite for ImapStream {
    fn poll_write(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &[u8],
    ) -> Poll<io::Result<usize>> {
        match self.get_mut() {
            Self::Plain(stream) => Pin::new(stream).poll_write(cx, buf),
            Self::Tls(stream) => Pin::new(stream).poll_write(cx, buf),
            Self::Deflate(stream) => Pin::new(stream).poll_write(cx, buf),
            Self::Rewind { inner, .. } => Pin::new(inner).poll_write(cx, buf),
            Self::Closed => Poll::Ready(Err(closed())),
        }
    }

    fn poll_flush(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        match self.get_mut() {
            Self::Plain(stream) => Pin::new(stream).poll_flush(cx),
            Self::Tls(stream) => Pin::new(stream).poll_flush(cx),
            Self::Deflate(stream) => Pin::new(stream).poll_flush(cx),
            Self::Rewind { inner, .. } => Pin::new(inner).poll_flush(cx),
            Self::Closed => Poll::Ready(Err(closed())),
        }
    }

    fn poll_shutdown(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        match self.get_mut() {
            Self::Plain(stream) => Pin::new(stream).poll_shutdown(cx),
            Self::Tls(stream) => Pin::new(stream).poll_shutdown(cx),
            Self::Deflate(stream) => Pin::new(stream).poll_shutdown(cx),
            Self::Rewind { inner, .. } => Pin::new(inner).poll_shutdown(cx),
            Self::Closed => Poll::Ready(Ok(())),
        }
    }
}

/// Dials the server, applying implicit TLS when configured.
pub async fn connect(config: &Config) -> Result<ImapStream> {
    let addr = config.address();
    let tcp = tokio::time::timeout(config.timeouts.connect, TcpStream::connect(&addr))
        .await
        .map_err(|_| Error::Timeout("connect timeout"))?
        .map_err(|e| Error::from_io(e, "connect timeout"))?;
    debug!(addr = %addr, security = ?config.security, "connected");

    let stream = ImapStream::plain(tcp);
    if config.security == Security::Implicit {
        stream.upgrade_to_tls(&config.host, &config.tls).await
    } else {
        Ok(stream)
    }
}
