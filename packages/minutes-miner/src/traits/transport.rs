//! Transport trait - one HTTP GET round-trip, no retry policy.
//!
//! The fetch engine owns retries, headers, and session cookies; a
//! transport only moves bytes. `ReqwestTransport` is the production
//! implementation and `testing::MockTransport` the scripted one.

use async_trait::async_trait;
use bytes::Bytes;
use std::time::Duration;

use crate::error::TransportResult;

/// What is being fetched. Drives timeouts, delays, and Accept headers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceKind {
    /// HTML listing page
    Listing,
    /// Binary document
    Document,
}

/// A fully-prepared GET request.
#[derive(Debug, Clone)]
pub struct FetchRequest {
    pub url: String,

    /// Header name/value pairs in send order
    pub headers: Vec<(String, String)>,

    /// Per-attempt timeout
    pub timeout: Duration,
}

impl FetchRequest {
    pub fn new(url: impl Into<String>, timeout: Duration) -> Self {
        Self {
            url: url.into(),
            headers: Vec::new(),
            timeout,
        }
    }

    /// Add a header.
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// Look up a header value (case-insensitive name).
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

/// Response status, cookies to remember, and the raw body.
#[derive(Debug, Clone)]
pub struct FetchResponse {
    pub status: u16,

    /// Raw `Set-Cookie` header values
    pub set_cookies: Vec<String>,

    /// `Location` header, present on redirects
    pub location: Option<String>,
    pub body: Bytes,
}

impl FetchResponse {
    pub fn new(status: u16, body: impl Into<Bytes>) -> Self {
        Self {
            status,
            set_cookies: Vec::new(),
            location: None,
            body: body.into(),
        }
    }

    /// Attach a `Location` header value.
    pub fn with_location(mut self, location: impl Into<String>) -> Self {
        self.location = Some(location.into());
        self
    }

    /// Absolute URL this response redirects to, resolved against `from`.
    pub fn redirect_target(&self, from: &str) -> Option<String> {
        if !matches!(self.status, 301 | 302 | 303 | 307 | 308) {
            return None;
        }
        let location = self.location.as_deref()?;
        url::Url::parse(from)
            .and_then(|base| base.join(location))
            .ok()
            .map(String::from)
    }

    /// Attach a `Set-Cookie` header value.
    pub fn with_cookie(mut self, cookie: impl Into<String>) -> Self {
        self.set_cookies.push(cookie.into());
        self
    }
}

/// A single-shot HTTP GET.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Send the request once without following redirects. Any status
    /// (including 3xx/403/5xx) is `Ok`; only transport-level failures
    /// are `Err`.
    async fn get(&self, request: &FetchRequest) -> TransportResult<FetchResponse>;

    /// Transport name for logging.
    fn name(&self) -> &str;
}
