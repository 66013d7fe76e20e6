//! Pluggable response classification.
//!
//! A classifier sees every completed response, whatever its status, and
//! decides whether `HttpClient::call` returns it or fails with
//! `CallError::Status`. With no classifier configured the client falls back
//! to `StatusClassifier`, which rejects 4xx and 5xx.

use http::HeaderMap;

/// Verdict of an `ErrorClassifier`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Classification {
    Accept,
    Reject { reason: String },
}

impl Classification {
    pub fn reject(reason: impl Into<String>) -> Self {
        Classification::Reject {
            reason: reason.into(),
        }
    }
}

/// Decides whether a completed response is a failure.
pub trait ErrorClassifier: Send + Sync {
    fn classify(&self, status: u16, headers: &HeaderMap, body: &[u8]) -> Classification;
}

impl<F> ErrorClassifier for F
where
    F: Fn(u16, &HeaderMap, &[u8]) -> Classification + Send + Sync,
{
    fn classify(&self, status: u16, headers: &HeaderMap, body: &[u8]) -> Classification {
        self(status, headers, body)
    }
}

/// Baseline policy: client and server errors are failures, everything else
/// (including 1xx and 3xx) is returned to the caller.
#[derive(Debug, Clone, Copy, Default)]
pub struct StatusClassifier;

impl ErrorClassifier for StatusClassifier {
    fn classify(&self, status: u16, _headers: &HeaderMap, _body: &[u8]) -> Classification {
        match status {
            400..=499 => Classification::reject("client error"),
            500..=599 => Classification::reject("server error"),
            _ => Classification::Accept,
        }
    }
}
