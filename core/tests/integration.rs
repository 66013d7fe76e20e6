//! End-to-end calls against the live mock server.
//!
//! # Design
//! Starts the mock server on a random port in a background thread with its
//! own tokio runtime, then drives the blocking client over real HTTP. Each
//! test gets its own server so they can run in parallel.

use std::net::SocketAddr;
use std::time::Duration;

use mock_server::{Echo, BIG_BODY_BYTES, GREETING};
use serde::Deserialize;
use web_commons::{
    CallError, Classification, ClientConfig, ErrorClassifier, ErrorKind, HttpClient, HttpMethod,
    Json, RequestBody, StatusClassifier,
};

#[derive(Debug, Deserialize)]
struct Greeting {
    greeting: String,
}

fn spawn_server() -> SocketAddr {
    let std_listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = std_listener.local_addr().unwrap();
    std_listener.set_nonblocking(true).unwrap();

    std::thread::spawn(move || {
        let rt = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap();
        rt.block_on(async {
            let listener = tokio::net::TcpListener::from_std(std_listener).unwrap();
            mock_server::run(listener).await
        })
        .unwrap();
    });
    addr
}

fn tagged(tag: &str) -> Vec<(String, String)> {
    vec![("X-Request-Tag".to_string(), tag.to_string())]
}

#[test]
fn json_without_charset_decodes_as_utf8() {
    let addr = spawn_server();
    let client = HttpClient::default();

    let result = client
        .call::<Json<Greeting>>(HttpMethod::Get, &format!("http://{addr}/utf8"), &[], None)
        .unwrap();

    assert_eq!(result.status, 200);
    assert_eq!(result.header("content-type"), Some("application/json"));
    assert_eq!(result.body.0.greeting, GREETING);
}

#[test]
fn plain_text_decodes_as_utf8() {
    let addr = spawn_server();

    let result = HttpClient::default()
        .call::<String>(HttpMethod::Get, &format!("http://{addr}/text"), &[], None)
        .unwrap();

    assert_eq!(result.body, GREETING);
}

#[test]
fn server_error_is_rejected_by_default() {
    let addr = spawn_server();

    let err = HttpClient::default()
        .call::<String>(HttpMethod::Get, &format!("http://{addr}/status/500"), &[], None)
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Status);
    match err {
        CallError::Status { status, body, .. } => {
            assert_eq!(status, 500);
            assert_eq!(body, "status 500");
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn client_error_is_rejected_by_default() {
    let addr = spawn_server();

    let err = HttpClient::default()
        .call::<()>(HttpMethod::Get, &format!("http://{addr}/status/404"), &[], None)
        .unwrap_err();

    assert_eq!(err.status_code(), Some(404));
}

#[test]
fn custom_classifier_can_accept_server_error() {
    let addr = spawn_server();
    let client = HttpClient::default().with_classifier(
        |status: u16, headers: &http::HeaderMap, body: &[u8]| {
            if status == 500 {
                Classification::Accept
            } else {
                StatusClassifier.classify(status, headers, body)
            }
        },
    );

    let result = client
        .call::<String>(HttpMethod::Get, &format!("http://{addr}/status/500"), &[], None)
        .unwrap();
    assert_eq!(result.status, 500);
    assert_eq!(result.body, "status 500");

    let err = client
        .call::<String>(HttpMethod::Get, &format!("http://{addr}/status/503"), &[], None)
        .unwrap_err();
    assert_eq!(err.status_code(), Some(503));
}

#[test]
fn redirects_are_returned_not_followed() {
    let addr = spawn_server();

    let result = HttpClient::default()
        .call::<()>(HttpMethod::Get, &format!("http://{addr}/redirect"), &[], None)
        .unwrap();

    assert_eq!(result.status, 302);
    assert!(result.is_redirect());
    assert_eq!(result.location(), Some("/status/200"));
}

#[test]
fn responses_carry_enforced_security_headers() {
    let addr = spawn_server();

    let result = HttpClient::default()
        .call::<()>(HttpMethod::Get, &format!("http://{addr}/status/204"), &[], None)
        .unwrap();

    assert_eq!(result.status, 204);
    assert_eq!(result.header("x-frame-options"), Some("deny"));
    assert_eq!(result.header("x-xss-protection"), Some("0"));
}

#[test]
fn patch_sends_json_body() {
    let addr = spawn_server();
    let body = RequestBody::json(&serde_json::json!({ "title": "über" })).unwrap();

    let result = HttpClient::default()
        .call::<Json<Echo>>(
            HttpMethod::Patch,
            &format!("http://{addr}/echo"),
            &tagged("patch-1"),
            Some(&body),
        )
        .unwrap();

    let echo = result.body.into_inner();
    assert_eq!(echo.method, "PATCH");
    assert_eq!(echo.tag.as_deref(), Some("patch-1"));
    assert_eq!(echo.content_type.as_deref(), Some("application/json"));
    let sent: serde_json::Value = serde_json::from_str(&echo.body).unwrap();
    assert_eq!(sent["title"], "über");
}

#[test]
fn caller_content_type_wins() {
    let addr = spawn_server();
    let headers = vec![("Content-Type".to_string(), "application/x-ndjson".to_string())];
    let body = RequestBody::from("{}\n{}\n");

    let result = HttpClient::default()
        .call::<Json<Echo>>(HttpMethod::Post, &format!("http://{addr}/echo"), &headers, Some(&body))
        .unwrap();

    assert_eq!(result.body.0.content_type.as_deref(), Some("application/x-ndjson"));
    assert_eq!(result.body.0.body, "{}\n{}\n");
}

#[test]
fn delete_without_body_sends_no_content_type() {
    let addr = spawn_server();

    let result = HttpClient::default()
        .call::<serde_json::Value>(HttpMethod::Delete, &format!("http://{addr}/echo"), &[], None)
        .unwrap();

    assert_eq!(result.body["method"], "DELETE");
    assert!(result.body["content_type"].is_null());
    assert_eq!(result.body["body"], "");
}

#[test]
fn malformed_url_fails_without_connecting() {
    let err = HttpClient::default()
        .call::<()>(HttpMethod::Get, "ht!tp://bad", &[], None)
        .unwrap_err();

    assert!(matches!(err, CallError::InvalidUrl { .. }));
    assert_eq!(err.kind(), ErrorKind::Configuration);
}

#[test]
fn slow_response_times_out() {
    let addr = spawn_server();
    let client = HttpClient::new(
        ClientConfig::builder()
            .timeout(Duration::from_millis(200))
            .build(),
    );

    let err = client
        .call::<String>(HttpMethod::Get, &format!("http://{addr}/slow/2000"), &[], None)
        .unwrap_err();

    assert!(err.is_timeout(), "expected timeout, got {err}");
    assert!(matches!(err, CallError::Timeout { after } if after == Duration::from_millis(200)));
}

#[test]
fn refused_connection_is_a_transport_error() {
    let addr = {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        listener.local_addr().unwrap()
    };

    let err = HttpClient::default()
        .call::<()>(HttpMethod::Get, &format!("http://{addr}/"), &[], None)
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Transport, "got {err}");
}

#[test]
fn concurrent_calls_do_not_interfere() {
    let addr = spawn_server();
    let client = HttpClient::new(
        ClientConfig::builder()
            .timeout(Duration::from_secs(5))
            .build(),
    );

    let handles: Vec<_> = (0..8)
        .map(|i| {
            let client = client.clone();
            std::thread::spawn(move || {
                let tag = format!("call-{i}");
                let body = RequestBody::from(format!("payload {i}"));
                // Odd calls queue behind a slow response on their own connection.
                if i % 2 == 1 {
                    let slow = format!("http://{addr}/slow/150");
                    client
                        .call::<String>(HttpMethod::Get, &slow, &[], None)
                        .unwrap();
                }
                let result = client
                    .call::<Json<Echo>>(
                        HttpMethod::Put,
                        &format!("http://{addr}/echo"),
                        &tagged(&tag),
                        Some(&body),
                    )
                    .unwrap();
                (tag, format!("payload {i}"), result.body.into_inner())
            })
        })
        .collect();

    for handle in handles {
        let (tag, payload, echo) = handle.join().unwrap();
        assert_eq!(echo.method, "PUT");
        assert_eq!(echo.tag.as_deref(), Some(tag.as_str()));
        assert_eq!(echo.body, payload);
    }
}

#[test]
fn timeouts_are_per_client_under_concurrency() {
    let addr = spawn_server();
    let impatient = HttpClient::builder()
        .timeout(Duration::from_millis(150))
        .build();
    let patient = HttpClient::builder()
        .timeout(Duration::from_secs(5))
        .build();

    let short = std::thread::spawn(move || {
        impatient.call::<String>(HttpMethod::Get, &format!("http://{addr}/slow/600"), &[], None)
    });
    let long = std::thread::spawn(move || {
        patient.call::<String>(HttpMethod::Get, &format!("http://{addr}/slow/600"), &[], None)
    });

    let short = short.join().unwrap();
    let long = long.join().unwrap();
    assert!(matches!(short, Err(ref e) if e.is_timeout()), "got {short:?}");
    assert_eq!(long.unwrap().body, "done");
}

#[test]
fn head_returns_status_and_headers_without_body() {
    let addr = spawn_server();

    let result = HttpClient::default()
        .call::<Vec<u8>>(HttpMethod::Head, &format!("http://{addr}/status/200"), &[], None)
        .unwrap();

    assert_eq!(result.status, 200);
    assert_eq!(result.header("x-frame-options"), Some("deny"));
    assert_eq!(result.header("x-content-type-options"), Some("nosniff"));
    assert_eq!(result.header("referrer-policy"), Some("no-referrer"));
    assert!(result.body.is_empty());
}

#[test]
fn options_forces_supplied_body_onto_the_wire() {
    let addr = spawn_server();
    let body = RequestBody::from("preflight payload");

    let result = HttpClient::default()
        .call::<Json<Echo>>(
            HttpMethod::Options,
            &format!("http://{addr}/echo"),
            &tagged("options-1"),
            Some(&body),
        )
        .unwrap();

    let echo = result.body.into_inner();
    assert_eq!(echo.method, "OPTIONS");
    assert_eq!(echo.tag.as_deref(), Some("options-1"));
    assert_eq!(echo.content_type.as_deref(), Some("text/plain;charset=UTF-8"));
    assert_eq!(echo.body, "preflight payload");
}

#[test]
fn get_with_body_sends_it() {
    let addr = spawn_server();
    let body = RequestBody::json(&serde_json::json!({ "q": "ünïcode" })).unwrap();

    let result = HttpClient::default()
        .call::<Json<Echo>>(HttpMethod::Get, &format!("http://{addr}/echo"), &[], Some(&body))
        .unwrap();

    let echo = result.body.into_inner();
    assert_eq!(echo.method, "GET");
    assert_eq!(echo.content_type.as_deref(), Some("application/json"));
    assert_eq!(echo.body, r#"{"q":"ünïcode"}"#);
}

#[test]
fn large_bodies_are_read_in_full() {
    let addr = spawn_server();

    let result = HttpClient::default()
        .call::<Vec<u8>>(HttpMethod::Get, &format!("http://{addr}/big"), &[], None)
        .unwrap();

    assert_eq!(result.status, 200);
    assert_eq!(result.body.len(), BIG_BODY_BYTES);
    assert!(result.body.iter().all(|b| *b == b'x'));
}
