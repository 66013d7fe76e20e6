//! Configuration for the client and the header enforcer.
//!
//! Both structs deserialize with serde so they can live in an application's
//! own config file; every field has a default.

use std::time::Duration;

use serde::{Deserialize, Deserializer};

/// Default bound for connect and read, in milliseconds.
pub const DEFAULT_TIMEOUT_MS: u64 = 30_000;

/// HTTP client configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Bound applied to connecting, to receiving the response head and to
    /// receiving the whole body.
    ///
    /// Each read phase has a deadline, not a per-read idle timer: a body that
    /// keeps streaming for longer than `timeout` fails with a timeout.
    #[serde(rename = "timeout_ms", deserialize_with = "millis")]
    pub timeout: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_millis(DEFAULT_TIMEOUT_MS),
        }
    }
}

impl ClientConfig {
    pub fn builder() -> ClientConfigBuilder {
        ClientConfigBuilder::default()
    }
}

/// Builder for `ClientConfig`.
#[derive(Debug, Default)]
pub struct ClientConfigBuilder {
    config: ClientConfig,
}

impl ClientConfigBuilder {
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.config.timeout = timeout;
        self
    }

    pub fn build(self) -> ClientConfig {
        self.config
    }
}

/// Header enforcer configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct EnforcerConfig {
    /// Extra sources appended to the `connect-src` directive.
    pub cors: Option<String>,
}

impl EnforcerConfig {
    pub fn with_cors(cors: impl Into<String>) -> Self {
        Self {
            cors: Some(cors.into()),
        }
    }
}

fn millis<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
    u64::deserialize(deserializer).map(Duration::from_millis)
}
