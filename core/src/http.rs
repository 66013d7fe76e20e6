//! HTTP request and response types for a single outbound call.
//!
//! # Design
//! These types describe one exchange as plain data. `HttpMethod` and
//! `RequestBody` go in, `CallResult<T>` comes out, where `T` is the payload
//! shape the caller asked for. Decoding is driven by the `ResponseBody` trait
//! so adding a new shape never touches the client.
//!
//! Text-like shapes are always decoded as UTF-8. A charset parameter on the
//! response content type is ignored: JSON is UTF-8 by definition, and a
//! legacy ISO-8859-1 fallback would corrupt multi-byte text.

use std::fmt;
use std::str::FromStr;

use http::HeaderMap;
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::CallError;

/// HTTP method for a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HttpMethod {
    Get,
    Head,
    Post,
    Put,
    Patch,
    Delete,
    Options,
    Trace,
}

impl HttpMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Head => "HEAD",
            HttpMethod::Post => "POST",
            HttpMethod::Put => "PUT",
            HttpMethod::Patch => "PATCH",
            HttpMethod::Delete => "DELETE",
            HttpMethod::Options => "OPTIONS",
            HttpMethod::Trace => "TRACE",
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for HttpMethod {
    type Err = CallError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "GET" => Ok(HttpMethod::Get),
            "HEAD" => Ok(HttpMethod::Head),
            "POST" => Ok(HttpMethod::Post),
            "PUT" => Ok(HttpMethod::Put),
            "PATCH" => Ok(HttpMethod::Patch),
            "DELETE" => Ok(HttpMethod::Delete),
            "OPTIONS" => Ok(HttpMethod::Options),
            "TRACE" => Ok(HttpMethod::Trace),
            other => Err(CallError::UnsupportedMethod(other.to_string())),
        }
    }
}

/// Payload sent with a request.
///
/// Each variant carries its own default content type, applied only when the
/// caller's headers do not already name one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RequestBody {
    Text(String),
    Json(Vec<u8>),
    Bytes(Vec<u8>),
}

impl RequestBody {
    /// Serialize `value` as a JSON body.
    pub fn json<S: Serialize + ?Sized>(value: &S) -> Result<Self, CallError> {
        serde_json::to_vec(value)
            .map(RequestBody::Json)
            .map_err(|e| CallError::Serialization(e.to_string()))
    }

    pub fn content_type(&self) -> &'static str {
        match self {
            RequestBody::Text(_) => "text/plain;charset=UTF-8",
            RequestBody::Json(_) => "application/json",
            RequestBody::Bytes(_) => "application/octet-stream",
        }
    }

    pub fn as_bytes(&self) -> &[u8] {
        match self {
            RequestBody::Text(text) => text.as_bytes(),
            RequestBody::Json(bytes) | RequestBody::Bytes(bytes) => bytes,
        }
    }
}

impl From<String> for RequestBody {
    fn from(text: String) -> Self {
        RequestBody::Text(text)
    }
}

impl From<&str> for RequestBody {
    fn from(text: &str) -> Self {
        RequestBody::Text(text.to_string())
    }
}

/// The outcome of a completed call.
#[derive(Debug, Clone)]
pub struct CallResult<T> {
    pub status: u16,
    pub headers: HeaderMap,
    pub body: T,
}

impl<T> CallResult<T> {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    pub fn is_redirect(&self) -> bool {
        (300..400).contains(&self.status)
    }

    /// First value of header `name`, if present and visible ASCII.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    /// Redirect target of a 3xx response.
    pub fn location(&self) -> Option<&str> {
        self.header("location")
    }
}

/// A response payload shape that can be built from the raw body.
pub trait ResponseBody: Sized {
    fn decode(bytes: Vec<u8>, content_type: Option<&str>) -> Result<Self, CallError>;
}

/// Discards the body.
impl ResponseBody for () {
    fn decode(_bytes: Vec<u8>, _content_type: Option<&str>) -> Result<Self, CallError> {
        Ok(())
    }
}

impl ResponseBody for Vec<u8> {
    fn decode(bytes: Vec<u8>, _content_type: Option<&str>) -> Result<Self, CallError> {
        Ok(bytes)
    }
}

impl ResponseBody for String {
    fn decode(bytes: Vec<u8>, _content_type: Option<&str>) -> Result<Self, CallError> {
        decode_utf8(bytes)
    }
}

impl ResponseBody for serde_json::Value {
    fn decode(bytes: Vec<u8>, content_type: Option<&str>) -> Result<Self, CallError> {
        Json::<serde_json::Value>::decode(bytes, content_type).map(|json| json.0)
    }
}

/// Typed JSON payload, deserialized with serde.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Json<T>(pub T);

impl<T> Json<T> {
    pub fn into_inner(self) -> T {
        self.0
    }
}

impl<T: DeserializeOwned> ResponseBody for Json<T> {
    fn decode(bytes: Vec<u8>, _content_type: Option<&str>) -> Result<Self, CallError> {
        let text = decode_utf8(bytes)?;
        serde_json::from_str(&text)
            .map(Json)
            .map_err(|e| CallError::Decode(e.to_string()))
    }
}

fn decode_utf8(bytes: Vec<u8>) -> Result<String, CallError> {
    String::from_utf8(bytes).map_err(|e| CallError::Decode(format!("body is not valid UTF-8: {e}")))
}
