//! Web request plumbing for server-side applications.
//!
//! # Overview
//! Two independent pieces:
//! - `HeaderEnforcer` adds a fixed set of defensive headers to outgoing
//!   responses, never replacing a header the application already set.
//! - `HttpClient` performs single blocking HTTP calls over a pooled,
//!   timeout-bound transport that never follows redirects, decodes text as
//!   UTF-8 and delegates status policy to a pluggable `ErrorClassifier`.
//!
//! # Design
//! - Neither component keeps mutable state across calls. The enforcer's
//!   header set is built once and then only read; the client builds its
//!   transport per call and drops it when the call returns.
//! - Configuration is explicit (`EnforcerConfig`, `ClientConfig`) rather
//!   than discovered; the classifier is passed in at construction.

pub mod classifier;
pub mod client;
pub mod config;
pub mod error;
pub mod headers;
pub mod http;

pub use classifier::{Classification, ErrorClassifier, StatusClassifier};
pub use client::{HttpClient, HttpClientBuilder};
pub use config::{ClientConfig, EnforcerConfig};
pub use crate::http::{CallResult, HttpMethod, Json, RequestBody, ResponseBody};
pub use error::{CallError, ErrorKind};
pub use headers::{build_header_set, HeaderEnforcer, HeaderSet};
