//! Per-call session state: the current User-Agent and cookie jar.
//!
//! A fresh `Session` is created for every `FetchEngine::fetch` call and
//! lives only for that call's attempts. The 403 branch resets it.

use std::collections::BTreeMap;
use std::time::Duration;

use crate::traits::transport::{FetchRequest, ResourceKind};

const HTML_ACCEPT: &str = "text/html,application/xhtml+xml,application/xml;q=0.9,image/webp,*/*;q=0.8";
const DOCUMENT_ACCEPT: &str = "application/pdf,application/octet-stream;q=0.9,*/*;q=0.8";
const DEFAULT_REFERER: &str = "https://www.google.com/";

/// Browser identity used for one fetch call.
#[derive(Debug, Clone, Default)]
pub struct Session {
    user_agent: String,
    cookies: BTreeMap<String, String>,
    resets: u32,
}

impl Session {
    /// Start a session with a random agent from the pool.
    pub fn new(agents: &[String]) -> Self {
        let mut session = Self::default();
        session.rotate(agents);
        session
    }

    /// Pick a new User-Agent at random. An empty pool keeps the current one.
    pub fn rotate(&mut self, agents: &[String]) {
        if !agents.is_empty() {
            self.user_agent = agents[fastrand::usize(..agents.len())].clone();
        }
    }

    /// Remember cookies from `Set-Cookie` values (`name=value; attrs...`).
    pub fn absorb(&mut self, set_cookies: &[String]) {
        for raw in set_cookies {
            let pair = raw.split(';').next().unwrap_or_default();
            if let Some((name, value)) = pair.split_once('=') {
                let name = name.trim();
                if !name.is_empty() {
                    self.cookies.insert(name.to_string(), value.trim().to_string());
                }
            }
        }
    }

    /// Drop every cookie, shedding a possibly-flagged identity.
    pub fn reset(&mut self) {
        self.cookies.clear();
        self.resets += 1;
    }

    pub fn user_agent(&self) -> &str {
        &self.user_agent
    }

    pub fn has_cookies(&self) -> bool {
        !self.cookies.is_empty()
    }

    /// How many times this session has been reset.
    pub fn resets(&self) -> u32 {
        self.resets
    }

    fn cookie_header(&self) -> Option<String> {
        if self.cookies.is_empty() {
            return None;
        }
        Some(
            self.cookies
                .iter()
                .map(|(k, v)| format!("{k}={v}"))
                .collect::<Vec<_>>()
                .join("; "),
        )
    }

    /// Build a request carrying a realistic browser header set.
    pub fn request(
        &self,
        url: &str,
        kind: ResourceKind,
        referer: Option<&str>,
        timeout: Duration,
    ) -> FetchRequest {
        let (accept, fetch_site) = match (kind, referer) {
            (ResourceKind::Listing, _) => (HTML_ACCEPT, "cross-site"),
            (ResourceKind::Document, Some(_)) => (DOCUMENT_ACCEPT, "same-origin"),
            (ResourceKind::Document, None) => (DOCUMENT_ACCEPT, "none"),
        };

        let mut request = FetchRequest::new(url, timeout)
            .with_header("User-Agent", self.user_agent.as_str())
            .with_header("Accept", accept)
            .with_header("Accept-Language", "en-US,en;q=0.5")
            .with_header("DNT", "1")
            .with_header("Upgrade-Insecure-Requests", "1")
            .with_header("Sec-Fetch-Dest", "document")
            .with_header("Sec-Fetch-Mode", "navigate")
            .with_header("Sec-Fetch-Site", fetch_site)
            .with_header("Sec-Fetch-User", "?1")
            .with_header("Cache-Control", "max-age=0")
            .with_header("Referer", referer.unwrap_or(DEFAULT_REFERER));

        if let Some(cookie) = self.cookie_header() {
            request = request.with_header("Cookie", cookie);
        }
        request
    }
}
