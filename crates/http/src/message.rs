//! Carrier records exchanged with the transport collaborator.
//!
//! The codec never touches sockets; it produces and consumes these records and
//! the transport moves them.

use http::header::{CONTENT_LENGTH, CONTENT_TYPE};
use http::{HeaderMap, HeaderValue, Method, StatusCode};

/// Anything carrying headers and a body that can be decoded into an event.
pub trait Message {
    fn headers(&self) -> &HeaderMap;

    fn body(&self) -> &[u8];

    /// Raw `content-type` header value, if present and valid text.
    fn content_type(&self) -> Option<&str> {
        self.headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
    }

    /// Declared `content-length`, falling back to the measured body length.
    fn content_length(&self) -> usize {
        self.headers()
            .get(CONTENT_LENGTH)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.parse().ok())
            .unwrap_or(self.body().len())
    }
}

/// Headers and body produced by one of the encoders.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Parts {
    pub headers: HeaderMap,
    pub body: Vec<u8>,
}

impl Parts {
    pub fn new(headers: HeaderMap, body: Vec<u8>) -> Self {
        let mut parts = Self { headers, body };
        parts.headers.insert(CONTENT_LENGTH, HeaderValue::from(parts.body.len()));
        parts
    }
}

impl Message for Parts {
    fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    fn body(&self) -> &[u8] {
        &self.body
    }
}

/// Outbound request handed to the transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
    pub method: Method,
    /// Request target (path and query), e.g. `/`.
    pub target: String,
    pub headers: HeaderMap,
    pub body: Vec<u8>,
}

impl Request {
    pub fn new(method: Method, target: impl Into<String>, parts: Parts) -> Self {
        Self {
            method,
            target: target.into(),
            headers: parts.headers,
            body: parts.body,
        }
    }
}

impl Message for Request {
    fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    fn body(&self) -> &[u8] {
        &self.body
    }
}

/// Reply returned by the transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Vec<u8>,
}

impl Response {
    pub fn new(status: StatusCode, parts: Parts) -> Self {
        Self {
            status,
            headers: parts.headers,
            body: parts.body,
        }
    }

    /// Bodiless response carrying only a status.
    pub fn empty(status: StatusCode) -> Self {
        Self::new(status, Parts::new(HeaderMap::new(), Vec::new()))
    }
}

impl Message for Response {
    fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    fn body(&self) -> &[u8] {
        &self.body
    }
}

/// Media type of a `content-type` value: parameters stripped, lower-cased.
pub fn media_type(content_type: &str) -> String {
    content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase()
}

/// Whether `content_type` declares a JSON payload (`application/json`,
/// `text/json` or any `+json` suffix).
pub fn is_json(content_type: &str) -> bool {
    let media_type = media_type(content_type);
    media_type == "application/json" || media_type == "text/json" || media_type.ends_with("+json")
}
