//! Defensive response headers.
//!
//! # Design
//! `build_header_set` is a pure function of the optional CORS fragment. The
//! enforcer builds the set on first use, keeps it in a `OnceLock` and then
//! only reads it, so any number of responses can be processed in parallel.
//! `enforce` adds a header only when the response does not carry that name
//! yet: the application or an earlier layer always wins.

use std::sync::OnceLock;

use http::header::{HeaderMap, HeaderName, HeaderValue};
use tracing::warn;

use crate::config::EnforcerConfig;

const CSP_HEAD: &str = "default-src 'none'; script-src 'self'; connect-src 'self'";
const CSP_TAIL: &str =
    "; img-src 'self'; style-src 'self'; font-src 'self'; frame-ancestors 'none';";
const CSP_WITHOUT_CORS: &str = concat!(
    "default-src 'none'; script-src 'self'; connect-src 'self'",
    "; img-src 'self'; style-src 'self'; font-src 'self'; frame-ancestors 'none';",
);

/// Immutable, insertion-ordered set of response headers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeaderSet {
    entries: Vec<(HeaderName, HeaderValue)>,
}

impl HeaderSet {
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Value for `name`, matched case-insensitively.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(key, _)| key.as_str().eq_ignore_ascii_case(name))
            .and_then(|(_, value)| value.to_str().ok())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&HeaderName, &HeaderValue)> {
        self.entries.iter().map(|(name, value)| (name, value))
    }
}

/// Build the fixed security header table, splicing `cors` into `connect-src`.
///
/// Never fails: a fragment that cannot appear in a header value is dropped.
pub fn build_header_set(cors: Option<&str>) -> HeaderSet {
    let fragment = normalize_cors(cors);
    let csp = match HeaderValue::from_str(&format!("{CSP_HEAD}{fragment}{CSP_TAIL}")) {
        Ok(value) => value,
        Err(_) => {
            warn!(
                fragment = %fragment.escape_debug(),
                "ignoring CORS fragment that is not a legal header value"
            );
            HeaderValue::from_static(CSP_WITHOUT_CORS)
        }
    };

    let entries = vec![
        (http::header::CONTENT_SECURITY_POLICY, csp),
        (http::header::X_CONTENT_TYPE_OPTIONS, HeaderValue::from_static("nosniff")),
        (http::header::X_FRAME_OPTIONS, HeaderValue::from_static("deny")),
        (
            HeaderName::from_static("x-permitted-cross-domain-policies"),
            HeaderValue::from_static("none"),
        ),
        (http::header::REFERRER_POLICY, HeaderValue::from_static("no-referrer")),
        (http::header::X_XSS_PROTECTION, HeaderValue::from_static("0")),
    ];
    HeaderSet { entries }
}

/// Trimmed fragment with a leading space, or empty.
fn normalize_cors(cors: Option<&str>) -> String {
    match cors.map(str::trim) {
        Some(fragment) if !fragment.is_empty() => format!(" {fragment}"),
        _ => String::new(),
    }
}

/// Adds the security headers to responses that lack them.
#[derive(Debug, Default)]
pub struct HeaderEnforcer {
    config: EnforcerConfig,
    headers: OnceLock<HeaderSet>,
}

impl HeaderEnforcer {
    pub fn new(config: EnforcerConfig) -> Self {
        Self {
            config,
            headers: OnceLock::new(),
        }
    }

    pub fn header_set(&self) -> &HeaderSet {
        self.headers
            .get_or_init(|| build_header_set(self.config.cors.as_deref()))
    }

    /// Add every missing security header to `response`.
    pub fn enforce(&self, response: &mut HeaderMap) {
        for (name, value) in self.header_set().iter() {
            response.entry(name).or_insert_with(|| value.clone());
        }
    }
}
