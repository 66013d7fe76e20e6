//! Error types for outbound calls.
//!
//! # Design
//! Every failure of `HttpClient::call` lands in exactly one `ErrorKind`:
//! configuration problems are caught before any I/O, timeouts and transport
//! faults come from the network, and status failures come from the active
//! `ErrorClassifier`. Nothing here is retried; the caller decides.

use std::time::Duration;

use thiserror::Error;

/// Result type for client operations.
pub type Result<T> = std::result::Result<T, CallError>;

/// Errors returned by `HttpClient::call`.
#[derive(Debug, Error)]
pub enum CallError {
    /// The target URL did not parse as an absolute http(s) URI.
    #[error("invalid URL {url:?}: {reason}")]
    InvalidUrl { url: String, reason: String },

    /// A request header name or value is not legal on the wire.
    #[error("invalid header {name:?}: {reason}")]
    InvalidHeader { name: String, reason: String },

    /// The method token is not one of the standard HTTP verbs.
    #[error("unsupported HTTP method: {0}")]
    UnsupportedMethod(String),

    /// The request body could not be serialized.
    #[error("serialization failed: {0}")]
    Serialization(String),

    /// Connecting or reading exceeded the configured timeout.
    #[error("request timed out after {after:?}")]
    Timeout { after: Duration },

    /// The error classifier rejected the response.
    #[error("HTTP {status}: {reason}")]
    Status {
        status: u16,
        reason: String,
        body: String,
    },

    /// Connection refused, DNS failure or an I/O fault mid-exchange.
    #[error("transport error: {0}")]
    Transport(String),

    /// The response body did not match the requested shape.
    #[error("decoding failed: {0}")]
    Decode(String),
}

/// Coarse failure category of a `CallError`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Configuration,
    Timeout,
    Status,
    Transport,
    Decode,
}

impl CallError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            CallError::InvalidUrl { .. }
            | CallError::InvalidHeader { .. }
            | CallError::UnsupportedMethod(_)
            | CallError::Serialization(_) => ErrorKind::Configuration,
            CallError::Timeout { .. } => ErrorKind::Timeout,
            CallError::Status { .. } => ErrorKind::Status,
            CallError::Transport(_) => ErrorKind::Transport,
            CallError::Decode(_) => ErrorKind::Decode,
        }
    }

    pub fn is_timeout(&self) -> bool {
        self.kind() == ErrorKind::Timeout
    }

    /// Status code of a classified response failure.
    pub fn status_code(&self) -> Option<u16> {
        match self {
            CallError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Map a ureq failure onto the taxonomy. `timeout` is the bound that was
    /// in force for the call.
    pub(crate) fn from_transport(err: ureq::Error, timeout: Duration) -> Self {
        match err {
            ureq::Error::Timeout(_) => CallError::Timeout { after: timeout },
            ureq::Error::Io(io)
                if matches!(
                    io.kind(),
                    std::io::ErrorKind::TimedOut | std::io::ErrorKind::WouldBlock
                ) =>
            {
                CallError::Timeout { after: timeout }
            }
            other => CallError::Transport(other.to_string()),
        }
    }
}
