//! Command outcomes.

use std::fmt;

use crate::convert;
use crate::parser::{Response, TaggedStatus};
use crate::types::{Condition, ResponseCode};
use crate::{Error, Result};

/// Outcome class of a command.
///
/// Values below 300 are successes, 4xx are client-side failures and 5xx are
/// server-side failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResultCode {
    /// Tagged OK.
    Ok,
    /// Untagged PREAUTH greeting.
    PreAuth,
    /// Completed without a server round trip.
    RequestDone,
    /// Tagged NO.
    No,
    /// Unexpected local failure.
    InternalError,
    /// Missing or invalid arguments; nothing was sent.
    RequestError,
    /// Send or receive timed out.
    SocketTimeout,
    /// STARTTLS or COMPRESS could not replace the stream.
    UpgradeError,
    /// Socket failure or connection closed.
    ConnectionError,
    /// Tagged BAD.
    Bad,
    /// Unexpected untagged BYE.
    Bye,
    /// Malformed or out-of-sequence response.
    ResponseError,
}

impl ResultCode {
    /// Returns the numeric value.
    #[must_use]
    pub const fn value(self) -> u16 {
        match self {
            Self::Ok => 200,
            Self::PreAuth => 201,
            Self::RequestDone => 202,
            Self::No => 400,
            Self::InternalError => 401,
            Self::RequestError => 402,
            Self::SocketTimeout => 403,
            Self::UpgradeError => 404,
            Self::ConnectionError => 405,
            Self::Bad => 500,
            Self::Bye => 501,
            Self::ResponseError => 502,
        }
    }

    /// Returns true for success codes.
    #[must_use]
    pub const fn is_success(self) -> bool {
        self.value() < 300
    }

    /// Classifies an error raised while a command was in flight.
    #[must_use]
    pub const fn from_error(err: &Error) -> Self {
        match err {
            Error::Timeout(_) => Self::SocketTimeout,
            Error::Upgrade(_) => Self::UpgradeError,
            Error::Connection(_) => Self::ConnectionError,
            Error::MalformedResponse { .. } | Error::MalformedData(_) | Error::Protocol(_) => {
                Self::ResponseError
            }
            Error::Request(_) | Error::Sasl(_) => Self::RequestError,
            Error::No(_) => Self::No,
            Error::Bad(_) => Self::Bad,
            Error::Bye(_) => Self::Bye,
            Error::Io(_)
            | Error::Tls(_)
            | Error::InvalidDnsName(_)
            | Error::InvalidState(_) => Self::InternalError,
        }
    }

    /// Maps a status condition.
    #[must_use]
    pub const fn from_condition(condition: Condition) -> Self {
        match condition {
            Condition::Ok => Self::Ok,
            Condition::PreAuth => Self::PreAuth,
            Condition::No => Self::No,
            Condition::Bad => Self::Bad,
            Condition::Bye => Self::Bye,
        }
    }
}

impl fmt::Display for ResultCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{self:?} ({})", self.value())
    }
}

/// Everything a finished command produced.
#[derive(Debug)]
pub struct CommandResult<T> {
    /// Outcome class.
    pub code: ResultCode,
    /// Typed value, present on success and for commands that report data
    /// alongside NO.
    pub value: Option<T>,
    /// The tagged status, if one arrived.
    pub tagged: Option<TaggedStatus>,
    /// Server text or a local description of the failure.
    pub description: String,
    /// The error that ended the command, if any.
    pub error: Option<Error>,
    /// Every response received while the command was active, in order.
    pub responses: Vec<Response>,
}

impl<T> CommandResult<T> {
    /// Returns true if the command succeeded.
    #[must_use]
    pub const fn succeeded(&self) -> bool {
        self.code.is_success()
    }

    /// Returns the typed response code of the tagged status.
    #[must_use]
    pub fn response_code(&self) -> Option<ResponseCode> {
        self.tagged
            .as_ref()
            .and_then(|tagged| convert::code::response_code(&tagged.text).ok().flatten())
    }

    /// Converts into a plain result, dropping the response log.
    ///
    /// # Errors
    ///
    /// Returns [`Error::No`], [`Error::Bad`] or [`Error::Bye`] for the
    /// matching codes, and the recorded error otherwise.
    pub fn into_result(self) -> Result<T> {
        match self.code {
            code if code.is_success() => self
                .value
                .ok_or_else(|| Error::Protocol(format!("{code} without a value"))),
            ResultCode::No => Err(Error::No(self.description)),
            ResultCode::Bad => Err(Error::Bad(self.description)),
            ResultCode::Bye => Err(Error::Bye(self.description)),
            code => Err(self
                .error
                .unwrap_or_else(|| Error::Protocol(format!("{code}: {}", self.description)))),
        }
    }
}
