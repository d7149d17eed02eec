//! Error types for the IMAP engine.

use std::io;

use thiserror::Error;

/// Errors that can occur during IMAP operations.
#[derive(Debug, Error)]
pub enum Error {
    /// I/O error that is not a recognised socket condition.
    #[error("I/O error: {0}")]
    Io(io::Error),

    /// TLS handshake or encryption error.
    #[error("TLS error: {0}")]
    Tls(#[from] rustls::Error),

    /// Invalid DNS name for TLS.
    #[error("Invalid DNS name: {0}")]
    InvalidDnsName(#[from] rustls::pki_types::InvalidDnsNameError),

    /// A response line could not be parsed.
    #[error("Malformed response at position {position}: {message}")]
    MalformedResponse {
        /// Byte position where the error occurred.
        position: usize,
        /// Description of what went wrong.
        message: String,
    },

    /// A parsed response did not have the shape its type requires.
    #[error("Malformed data: {0}")]
    MalformedData(String),

    /// Send or receive did not complete in time.
    #[error("Socket timeout: {0}")]
    Timeout(&'static str),

    /// The connection failed or was closed.
    #[error("Connection error: {0}")]
    Connection(String),

    /// STARTTLS or COMPRESS could not replace the stream.
    #[error("Stream upgrade failed: {0}")]
    Upgrade(String),

    /// Caller supplied missing or invalid arguments.
    #[error("Invalid request: {0}")]
    Request(String),

    /// SASL mechanism failure.
    #[error("SASL error: {0}")]
    Sasl(String),

    /// Server returned NO.
    #[error("Server returned NO: {0}")]
    No(String),

    /// Server returned BAD.
    #[error("Server returned BAD: {0}")]
    Bad(String),

    /// Server sent BYE.
    #[error("Server sent BYE: {0}")]
    Bye(String),

    /// Invalid state for the requested operation.
    #[error("Invalid state: {0}")]
    InvalidState(String),

    /// Protocol violation or unexpected data.
    #[error("Protocol error: {0}")]
    Protocol(String),
}

impl Error {
    /// Classifies an I/O error.
    ///
    /// `WouldBlock` and `TimedOut` become [`Error::Timeout`], socket failures
    /// become [`Error::Connection`], anything else is kept as [`Error::Io`].
    #[must_use]
    pub fn from_io(err: io::Error, timeout_context: &'static str) -> Self {
        match err.kind() {
            io::ErrorKind::WouldBlock | io::ErrorKind::TimedOut => Self::Timeout(timeout_context),
            io::ErrorKind::ConnectionRefused
            | io::ErrorKind::ConnectionReset
            | io::ErrorKind::ConnectionAborted
            | io::ErrorKind::NotConnected
            | io::ErrorKind::BrokenPipe
            | io::ErrorKind::UnexpectedEof
            | io::ErrorKind::AddrInUse
            | io::ErrorKind::AddrNotAvailable => Self::Connection(err.to_string()),
            _ => Self::Io(err),
        }
    }

    /// Creates a malformed-data error.
    pub fn malformed(message: impl Into<String>) -> Self {
        Self::MalformedData(message.into())
    }

    /// Creates a request error.
    pub fn request(message: impl Into<String>) -> Self {
        Self::Request(message.into())
    }

    /// Returns true for parse and shape errors.
    #[must_use]
    pub const fn is_malformed(&self) -> bool {
        matches!(self, Self::MalformedResponse { .. } | Self::MalformedData(_))
    }
}

impl From<io::Error> for Error {
    fn from(err: io::Error) -> Self {
        Self::from_io(err, "socket timeout")
    }
}

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_would_block_is_timeout() {
        let err = Error::from_io(io::Error::from(io::ErrorKind::WouldBlock), "receive timeout");
        assert!(matches!(err, Error::Timeout("receive timeout")));
    }

    #[test]
    fn test_timed_out_is_timeout() {
        let err = Error::from(io::Error::from(io::ErrorKind::TimedOut));
        assert!(matches!(err, Error::Timeout(_)));
    }

    #[test]
    fn test_reset_is_connection_error() {
        let err = Error::from(io::Error::from(io::ErrorKind::ConnectionReset));
        assert!(matches!(err, Error::Connection(_)));

        let err = Error::from(io::Error::from(io::ErrorKind::UnexpectedEof));
        assert!(matches!(err, Error::Connection(_)));
    }

    #[test]
    fn test_other_io_errors_propagate() {
        let err = Error::from(io::Error::other("disk on fire"));
        assert!(matches!(err, Error::Io(_)));
        assert!(err.to_string().contains("disk on fire"));
    }

    #[test]
    fn test_is_malformed() {
        assert!(Error::malformed("x").is_malformed());
        assert!(
            Error::MalformedResponse {
                position: 0,
                message: String::new()
            }
            .is_malformed()
        );
        assert!(!Error::request("x").is_malformed());
    }
}
