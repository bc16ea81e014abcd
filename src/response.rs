//! Outgoing HTTP response type.
//!
//! Unlike a returned value, the response here lives inside the
//! [`HttpContext`](crate::HttpContext) and every handler in a chain may
//! rewrite it. Whatever it holds when the chain stops is what goes on the
//! wire.

use std::collections::BTreeMap;

use bytes::Bytes;
use http_body_util::Full;
use tracing::error;

use crate::status::Status;

// ── ContentType ───────────────────────────────────────────────────────────────

/// Content-type values the functions produce.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ContentType {
    Json,        // application/json
    OctetStream, // application/octet-stream
    Text,        // text/plain; charset=utf-8
}

impl ContentType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Json        => "application/json",
            Self::OctetStream => "application/octet-stream",
            Self::Text        => "text/plain; charset=utf-8",
        }
    }

    /// Guesses the type of an opaque payload: UTF-8 is text, anything else binary.
    pub fn sniff(body: &[u8]) -> Self {
        if std::str::from_utf8(body).is_ok() { Self::Text } else { Self::OctetStream }
    }
}

// ── Response ─────────────────────────────────────────────────────────────────

/// An outgoing HTTP response. Starts as `200 OK` with an empty body.
///
/// Header names are stored lowercase; setting a header replaces any
/// previous value.
///
/// ```rust
/// use quill::{ContentType, Response, Status};
///
/// let mut res = Response::new();
/// res.set_text(Status::NotFound, "error retrieving document 42");
/// assert_eq!(res.status(), Status::NotFound);
/// assert_eq!(res.header("Content-Type"), Some(ContentType::Text.as_str()));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    status: Status,
    headers: BTreeMap<String, String>,
    body: Vec<u8>,
}

impl Response {
    pub fn new() -> Self {
        Self { status: Status::Ok, headers: BTreeMap::new(), body: Vec::new() }
    }

    /// A plain-text response with the given status.
    pub fn text(status: Status, body: impl Into<String>) -> Self {
        let mut res = Self::new();
        res.set_text(status, body);
        res
    }

    pub fn status(&self) -> Status { self.status }
    pub fn body(&self) -> &[u8] { &self.body }
    pub fn headers(&self) -> &BTreeMap<String, String> { &self.headers }

    pub fn body_text(&self) -> std::borrow::Cow<'_, str> {
        String::from_utf8_lossy(&self.body)
    }

    /// Case-insensitive header lookup.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(&name.to_ascii_lowercase()).map(String::as_str)
    }

    pub fn set_status(&mut self, status: Status) {
        self.status = status;
    }

    pub fn set_header(&mut self, name: &str, value: impl Into<String>) {
        self.headers.insert(name.to_ascii_lowercase(), value.into());
    }

    pub fn set_body(&mut self, content_type: ContentType, body: Vec<u8>) {
        self.set_header("content-type", content_type.as_str());
        self.body = body;
    }

    /// Status plus plain-text body, the shape of every error the functions emit.
    pub fn set_text(&mut self, status: Status, body: impl Into<String>) {
        self.status = status;
        self.set_body(ContentType::Text, body.into().into_bytes());
    }

    /// JSON body; the status is left untouched.
    pub fn set_json(&mut self, body: Vec<u8>) {
        self.set_body(ContentType::Json, body);
    }

    pub(crate) fn into_http(self) -> http::Response<Full<Bytes>> {
        let mut builder = http::Response::builder().status(self.status.code());
        for (name, value) in &self.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        builder.body(Full::new(Bytes::from(self.body))).unwrap_or_else(|e| {
            error!("invalid response head: {e}");
            let mut fallback = http::Response::new(Full::new(Bytes::new()));
            *fallback.status_mut() = http::StatusCode::INTERNAL_SERVER_ERROR;
            fallback
        })
    }
}

impl Default for Response {
    fn default() -> Self { Self::new() }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn headers_are_case_insensitive_and_replaced() {
        let mut res = Response::new();
        res.set_header("X-Request-Id", "a");
        res.set_header("x-request-id", "b");
        assert_eq!(res.header("X-REQUEST-ID"), Some("b"));
        assert_eq!(res.headers().len(), 1);
    }

    #[test]
    fn sniffs_binary_payloads() {
        assert_eq!(ContentType::sniff(b"hunter2"), ContentType::Text);
        assert_eq!(ContentType::sniff(&[0xff, 0xfe, 0x00]), ContentType::OctetStream);
    }

    #[test]
    fn converts_to_http() {
        let res = Response::text(Status::NoContent, "made").into_http();
        assert_eq!(res.status(), http::StatusCode::NO_CONTENT);
        assert_eq!(
            res.headers().get("content-type").and_then(|v| v.to_str().ok()),
            Some("text/plain; charset=utf-8")
        );
    }
}
