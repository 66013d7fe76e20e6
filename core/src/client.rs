//! Blocking HTTP client that performs exactly one exchange per call.
//!
//! # Design
//! `HttpClient` holds only configuration and an optional classifier; it
//! carries no connection state between calls. Every `call` validates its
//! inputs, builds a fresh pooled transport bound to the configured timeout,
//! sends once, buffers the body, classifies the status and decodes the
//! payload. The transport and response are owned by the call frame, so they
//! are released on every exit path.
//!
//! Redirects are never followed. A 3xx comes back as a normal result so the
//! caller decides whether the new origin is trusted.

use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};

use http::header::{HeaderName, HeaderValue, CONTENT_TYPE};
use http::HeaderMap;
use tracing::{debug, warn};
use ureq::typestate::{WithBody, WithoutBody};
use ureq::{Agent, RequestBuilder};
use url::Url;

use crate::classifier::{Classification, ErrorClassifier, StatusClassifier};
use crate::config::ClientConfig;
use crate::error::{CallError, Result};
use crate::http::{CallResult, HttpMethod, RequestBody, ResponseBody};

/// Synchronous client for single HTTP calls.
#[derive(Clone, Default)]
pub struct HttpClient {
    config: ClientConfig,
    classifier: Option<Arc<dyn ErrorClassifier>>,
}

impl fmt::Debug for HttpClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HttpClient")
            .field("config", &self.config)
            .field("custom_classifier", &self.classifier.is_some())
            .finish()
    }
}

impl HttpClient {
    pub fn new(config: ClientConfig) -> Self {
        Self {
            config,
            classifier: None,
        }
    }

    pub fn builder() -> HttpClientBuilder {
        HttpClientBuilder::default()
    }

    /// Replace the default status policy with `classifier`.
    pub fn with_classifier(mut self, classifier: impl ErrorClassifier + 'static) -> Self {
        self.classifier = Some(Arc::new(classifier));
        self
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Bound applied to connecting and to each phase of reading the response.
    pub fn timeout(&self) -> Duration {
        self.config.timeout
    }

    /// Perform one HTTP exchange and decode the body as `T`.
    ///
    /// Fails with a configuration error before any I/O when `url` or a
    /// header is malformed. Statuses are judged by the configured classifier,
    /// or by `StatusClassifier` when none is set.
    pub fn call<T: ResponseBody>(
        &self,
        method: HttpMethod,
        url: &str,
        headers: &[(String, String)],
        body: Option<&RequestBody>,
    ) -> Result<CallResult<T>> {
        let target = parse_url(url)?;
        let mut request_headers = build_headers(headers)?;
        if let Some(body) = body {
            if !request_headers.contains_key(CONTENT_TYPE) {
                request_headers.insert(CONTENT_TYPE, HeaderValue::from_static(body.content_type()));
            }
        }

        let transport = Transport::for_config(&self.config);
        let started = Instant::now();
        let (status, response_headers, bytes) =
            transport.exchange(method, &target, &request_headers, body)?;
        debug!(
            %method,
            url = %target,
            status,
            elapsed = ?started.elapsed(),
            "http call completed"
        );

        let verdict = match &self.classifier {
            Some(classifier) => classifier.classify(status, &response_headers, &bytes),
            None => StatusClassifier.classify(status, &response_headers, &bytes),
        };
        if let Classification::Reject { reason } = verdict {
            warn!(%method, url = %target, status, %reason, "http call rejected");
            return Err(CallError::Status {
                status,
                reason,
                body: String::from_utf8_lossy(&bytes).into_owned(),
            });
        }

        let content_type = response_headers
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_owned);
        let body = T::decode(bytes, content_type.as_deref())?;
        Ok(CallResult {
            status,
            headers: response_headers,
            body,
        })
    }
}

/// Builder for `HttpClient`.
#[derive(Default)]
pub struct HttpClientBuilder {
    config: ClientConfig,
    classifier: Option<Arc<dyn ErrorClassifier>>,
}

impl HttpClientBuilder {
    pub fn config(mut self, config: ClientConfig) -> Self {
        self.config = config;
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.config.timeout = timeout;
        self
    }

    pub fn classifier(mut self, classifier: impl ErrorClassifier + 'static) -> Self {
        self.classifier = Some(Arc::new(classifier));
        self
    }

    pub fn build(self) -> HttpClient {
        HttpClient {
            config: self.config,
            classifier: self.classifier,
        }
    }
}

fn parse_url(url: &str) -> Result<Url> {
    let invalid = |reason: String| CallError::InvalidUrl {
        url: url.to_string(),
        reason,
    };
    let parsed = Url::parse(url).map_err(|e| invalid(e.to_string()))?;
    if !matches!(parsed.scheme(), "http" | "https") {
        return Err(invalid(format!("unsupported scheme {:?}", parsed.scheme())));
    }
    if parsed.host_str().map_or(true, str::is_empty) {
        return Err(invalid("missing host".to_string()));
    }
    Ok(parsed)
}

fn build_headers(headers: &[(String, String)]) -> Result<HeaderMap> {
    let mut map = HeaderMap::with_capacity(headers.len());
    for (name, value) in headers {
        let invalid = |reason: String| CallError::InvalidHeader {
            name: name.clone(),
            reason,
        };
        let key = HeaderName::from_bytes(name.as_bytes()).map_err(|e| invalid(e.to_string()))?;
        let value = HeaderValue::from_str(value).map_err(|e| invalid(e.to_string()))?;
        map.append(key, value);
    }
    Ok(map)
}

/// Pooled transport scoped to one call.
struct Transport {
    agent: Agent,
    timeout: Duration,
}

impl Transport {
    fn for_config(config: &ClientConfig) -> Self {
        let agent = Agent::config_builder()
            .timeout_connect(Some(config.timeout))
            .timeout_recv_response(Some(config.timeout))
            .timeout_recv_body(Some(config.timeout))
            .max_redirects(0)
            .max_redirects_will_error(false)
            .http_status_as_error(false)
            .build()
            .new_agent();
        Self {
            agent,
            timeout: config.timeout,
        }
    }

    fn exchange(
        &self,
        method: HttpMethod,
        url: &Url,
        headers: &HeaderMap,
        body: Option<&RequestBody>,
    ) -> Result<(u16, HeaderMap, Vec<u8>)> {
        let uri = url.as_str();
        let sent = match method {
            HttpMethod::Get => self.send_without_body(self.agent.get(uri), headers, body),
            HttpMethod::Head => self.send_without_body(self.agent.head(uri), headers, body),
            HttpMethod::Delete => self.send_without_body(self.agent.delete(uri), headers, body),
            HttpMethod::Options => self.send_without_body(self.agent.options(uri), headers, body),
            HttpMethod::Trace => self.send_without_body(self.agent.trace(uri), headers, body),
            HttpMethod::Post => self.send_with_body(self.agent.post(uri), headers, body),
            HttpMethod::Put => self.send_with_body(self.agent.put(uri), headers, body),
            HttpMethod::Patch => self.send_with_body(self.agent.patch(uri), headers, body),
        };
        let mut response = sent.map_err(|e| CallError::from_transport(e, self.timeout))?;

        let status = response.status().as_u16();
        let response_headers = response.headers().clone();
        let bytes = if method == HttpMethod::Head {
            Vec::new()
        } else {
            response
                .body_mut()
                .with_config()
                .limit(u64::MAX)
                .read_to_vec()
                .map_err(|e| CallError::from_transport(e, self.timeout))?
        };
        Ok((status, response_headers, bytes))
    }

    fn send_without_body(
        &self,
        builder: RequestBuilder<WithoutBody>,
        headers: &HeaderMap,
        body: Option<&RequestBody>,
    ) -> std::result::Result<http::Response<ureq::Body>, ureq::Error> {
        let builder = with_headers(builder, headers);
        match body {
            Some(body) => builder.force_send_body().send(body.as_bytes()),
            None => builder.call(),
        }
    }

    fn send_with_body(
        &self,
        builder: RequestBuilder<WithBody>,
        headers: &HeaderMap,
        body: Option<&RequestBody>,
    ) -> std::result::Result<http::Response<ureq::Body>, ureq::Error> {
        let builder = with_headers(builder, headers);
        match body {
            Some(body) => builder.send(body.as_bytes()),
            None => builder.send_empty(),
        }
    }
}

fn with_headers<B>(mut builder: RequestBuilder<B>, headers: &HeaderMap) -> RequestBuilder<B> {
    for (name, value) in headers {
        builder = builder.header(name.clone(), value.clone());
    }
    builder
}
