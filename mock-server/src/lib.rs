//! Local HTTP fixture for exercising `web-commons` end to end.
//!
//! Every response passes through the `HeaderEnforcer` middleware, the way an
//! application would mount it. Routes cover what the client must handle:
//! arbitrary statuses, a redirect, UTF-8 bodies without a charset, a large
//! body, an echo for any method and a deliberately slow endpoint.

use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::{Path, Request, State},
    http::{header, HeaderMap, HeaderValue, Method, StatusCode},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::{any, get},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tokio::net::TcpListener;
use tracing::debug;
use web_commons::{EnforcerConfig, HeaderEnforcer};

/// Text served by `/utf8` and `/text`.
pub const GREETING: &str = "Grüße, wörld ✓ 日本語";

/// Size of the `/big` body, larger than ureq's default read limit.
pub const BIG_BODY_BYTES: usize = 11 * 1024 * 1024;

/// Body returned by `/echo`.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct Echo {
    pub method: String,
    pub tag: Option<String>,
    pub content_type: Option<String>,
    pub body: String,
}

pub fn app() -> Router {
    app_with(EnforcerConfig::default())
}

pub fn app_with(config: EnforcerConfig) -> Router {
    let enforcer = Arc::new(HeaderEnforcer::new(config));
    Router::new()
        .route("/status/{code}", any(status))
        .route("/redirect", get(redirect))
        .route("/utf8", get(utf8_json))
        .route("/text", get(utf8_text))
        .route("/big", get(big))
        .route("/echo", any(echo))
        .route("/slow/{millis}", get(slow))
        .route("/framed", get(framed))
        .layer(middleware::from_fn_with_state(enforcer, security_headers))
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    axum::serve(listener, app()).await
}

async fn security_headers(
    State(enforcer): State<Arc<HeaderEnforcer>>,
    request: Request,
    next: Next,
) -> Response {
    let mut response = next.run(request).await;
    enforcer.enforce(response.headers_mut());
    response
}

async fn status(Path(code): Path<u16>) -> Result<(StatusCode, String), StatusCode> {
    let status = StatusCode::from_u16(code).map_err(|_| StatusCode::BAD_REQUEST)?;
    Ok((status, format!("status {code}")))
}

async fn redirect() -> impl IntoResponse {
    (StatusCode::FOUND, [(header::LOCATION, "/status/200")])
}

async fn utf8_json() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "greeting": GREETING }))
}

async fn utf8_text() -> impl IntoResponse {
    ([(header::CONTENT_TYPE, "text/plain")], GREETING.as_bytes().to_vec())
}

async fn big() -> impl IntoResponse {
    (
        [(header::CONTENT_TYPE, "application/octet-stream")],
        vec![b'x'; BIG_BODY_BYTES],
    )
}

async fn echo(method: Method, headers: HeaderMap, body: String) -> Json<Echo> {
    let text = |name: &str| {
        headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
    };
    Json(Echo {
        method: method.to_string(),
        tag: text("x-request-tag"),
        content_type: text("content-type"),
        body,
    })
}

async fn slow(Path(millis): Path<u64>) -> &'static str {
    debug!(millis, "delaying response");
    tokio::time::sleep(Duration::from_millis(millis)).await;
    "done"
}

async fn framed() -> impl IntoResponse {
    (
        [(header::X_FRAME_OPTIONS, HeaderValue::from_static("SAMEORIGIN"))],
        "framed",
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn echo_serializes_to_json() {
        let echo = Echo {
            method: "PATCH".to_string(),
            tag: Some("t-1".to_string()),
            content_type: None,
            body: "{}".to_string(),
        };
        let json = serde_json::to_value(&echo).unwrap();
        assert_eq!(json["method"], "PATCH");
        assert_eq!(json["tag"], "t-1");
        assert!(json["content_type"].is_null());
    }

    #[test]
    fn greeting_is_multibyte() {
        assert!(GREETING.len() > GREETING.chars().count());
    }
}
