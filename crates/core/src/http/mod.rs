//! Request and response model shared by every lane.
//!
//! These are the HTTP-shaped values the page sees. Header names are stored
//! lower-cased so lookups are case-insensitive.

pub mod url;

use std::collections::BTreeMap;

use ::url::Url;
use bytes::Bytes;

pub use self::url::{UrlError, canonicalize, is_http};

/// Synthetic header stamped on API responses written by the
/// stale-while-revalidate lane. Holds an RFC 3339 timestamp.
pub const CACHE_TIME_HEADER: &str = "sw-cache-time";

/// Header map with lower-cased names.
pub type Headers = BTreeMap<String, String>;

/// Resource destination reported by the runtime for an intercepted request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Destination {
    Document,
    Image,
    Script,
    Style,
    Font,
    #[default]
    Empty,
}

impl Destination {
    /// Parse the runtime's destination string. Unknown values map to `Empty`.
    pub fn parse(value: &str) -> Self {
        match value.to_ascii_lowercase().as_str() {
            "document" => Destination::Document,
            "image" => Destination::Image,
            "script" => Destination::Script,
            "style" => Destination::Style,
            "font" => Destination::Font,
            _ => Destination::Empty,
        }
    }
}

/// An intercepted or outgoing request.
#[derive(Debug, Clone)]
pub struct Request {
    pub method: String,
    pub url: Url,
    pub headers: Headers,
    pub destination: Destination,
    pub body: Bytes,
}

impl Request {
    /// A bodiless GET for `url`.
    pub fn get(url: Url) -> Self {
        Self { method: "GET".to_string(), url, headers: Headers::new(), destination: Destination::Empty, body: Bytes::new() }
    }

    /// Set a header, lower-casing its name.
    pub fn with_header(mut self, name: &str, value: impl Into<String>) -> Self {
        self.headers.insert(name.to_ascii_lowercase(), value.into());
        self
    }

    pub fn with_destination(mut self, destination: Destination) -> Self {
        self.destination = destination;
        self
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        header_value(&self.headers, name)
    }

    pub fn is_get(&self) -> bool {
        self.method.eq_ignore_ascii_case("GET")
    }
}

/// A response returned to the page, either live, cached, or synthesized.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    pub status: u16,
    pub headers: Headers,
    pub body: Bytes,
}

impl Response {
    pub fn new(status: u16, headers: Headers, body: impl Into<Bytes>) -> Self {
        let headers = headers.into_iter().map(|(k, v)| (k.to_ascii_lowercase(), v)).collect();
        Self { status, headers, body: body.into() }
    }

    /// Empty 404 returned when a cache-first or OTHER request has nothing to serve.
    pub fn not_found() -> Self {
        Self { status: 404, headers: Headers::new(), body: Bytes::new() }
    }

    /// `503 {"error":"Network error"}` returned by the API lane when both
    /// network and cache are empty-handed.
    pub fn network_error() -> Self {
        Self::json(503, &serde_json::json!({ "error": "Network error" }))
    }

    /// A JSON response with the given status.
    pub fn json(status: u16, value: &serde_json::Value) -> Self {
        let mut headers = Headers::new();
        headers.insert("content-type".to_string(), "application/json".to_string());
        Self { status, headers, body: Bytes::from(value.to_string()) }
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        header_value(&self.headers, name)
    }

    /// 2xx status.
    pub fn is_ok(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Case-insensitive header lookup.
pub fn header_value<'a>(headers: &'a Headers, name: &str) -> Option<&'a str> {
    headers
        .get(&name.to_ascii_lowercase())
        .or_else(|| headers.iter().find(|(k, _)| k.eq_ignore_ascii_case(name)).map(|(_, v)| v))
        .map(String::as_str)
}
