//! Fetch engine - retry, backoff, header rotation, and per-host pacing.
//!
//! Policy for one `fetch` call:
//! 1. Before every attempt, wait a politeness delay (serialized per host).
//! 2. 200 returns the body immediately.
//! 3. 403 clears the session cookies and waits the long backoff.
//! 4. Anything else (other status or transport error) waits the short backoff.
//! 5. Exhausting attempts yields `FetchFailure` with the last status seen.
//!
//! Redirects are followed inside an attempt so cookies set on a hop are
//! carried to the next request.

use bytes::Bytes;
use dashmap::DashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};
use url::Url;

use super::session::Session;
use crate::error::{FetchFailure, FetchResult, TransportResult};
use crate::traits::delay::{Delay, DelayKind};
use crate::traits::transport::{FetchResponse, ResourceKind, Transport};
use crate::types::config::FetchSettings;

/// Redirect hops followed within one attempt.
const MAX_REDIRECTS: u32 = 10;

/// One URL to fetch and how.
#[derive(Debug, Clone)]
pub struct FetchTarget {
    pub url: String,
    pub kind: ResourceKind,

    /// Page the link was found on, sent as `Referer`
    pub referer: Option<String>,

    /// Overrides `FetchSettings::max_attempts`
    pub max_attempts: Option<u32>,
}

impl FetchTarget {
    /// A listing page.
    pub fn listing(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            kind: ResourceKind::Listing,
            referer: None,
            max_attempts: None,
        }
    }

    /// A binary document.
    pub fn document(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            kind: ResourceKind::Document,
            referer: None,
            max_attempts: None,
        }
    }

    /// Set the referer.
    pub fn with_referer(mut self, referer: impl Into<String>) -> Self {
        self.referer = Some(referer.into());
        self
    }

    /// Override the attempt budget.
    pub fn with_max_attempts(mut self, attempts: u32) -> Self {
        self.max_attempts = Some(attempts);
        self
    }
}

/// Retrieves listing pages and documents from hosts that resist automation.
pub struct FetchEngine<T: Transport, D: Delay> {
    transport: T,
    delay: D,
    settings: FetchSettings,

    /// One gate per host; politeness waits to the same host never overlap
    hosts: DashMap<String, Arc<Mutex<()>>>,
}

impl<T: Transport, D: Delay> FetchEngine<T, D> {
    pub fn new(transport: T, delay: D, settings: FetchSettings) -> Self {
        Self {
            transport,
            delay,
            settings,
            hosts: DashMap::new(),
        }
    }

    pub fn settings(&self) -> &FetchSettings {
        &self.settings
    }

    /// The delay strategy, shared with the coordinator for group pauses.
    pub fn delay(&self) -> &D {
        &self.delay
    }

    /// Fetch a listing page as text (lossy UTF-8).
    pub async fn fetch_text(&self, target: &FetchTarget) -> FetchResult<String> {
        let body = self.fetch(target).await?;
        Ok(String::from_utf8_lossy(&body).into_owned())
    }

    /// Fetch a URL with retries. Only HTTP 200 counts as success.
    pub async fn fetch(&self, target: &FetchTarget) -> FetchResult<Bytes> {
        let parsed = Url::parse(&target.url).map_err(|_| FetchFailure::invalid_url(&target.url))?;
        let attempts = target
            .max_attempts
            .unwrap_or(self.settings.max_attempts)
            .max(1);
        let timeout = match target.kind {
            ResourceKind::Listing => self.settings.listing_timeout(),
            ResourceKind::Document => self.settings.document_timeout(),
        };

        let mut session = Session::new(&self.settings.user_agents);
        let mut last_status: Option<u16> = None;

        for attempt in 1..=attempts {
            self.pace(&parsed, DelayKind::before(target.kind)).await;

            session.rotate(&self.settings.user_agents);
            let more = attempt < attempts;

            debug!(
                url = %target.url,
                attempt,
                max_attempts = attempts,
                transport = self.transport.name(),
                "Fetch attempt"
            );

            match self.send(&mut session, target, timeout).await {
                Ok(response) if response.status == 200 => {
                    debug!(url = %target.url, attempt, bytes = response.body.len(), "Fetch succeeded");
                    return Ok(response.body);
                }
                Ok(response) if response.status == 403 => {
                    last_status = Some(403);
                    warn!(url = %target.url, attempt, status = 403, "Forbidden");
                    session.absorb(&response.set_cookies);
                    if more {
                        session.reset();
                        self.delay.wait(DelayKind::Forbidden).await;
                    }
                }
                Ok(response) => {
                    last_status = Some(response.status);
                    warn!(url = %target.url, attempt, status = response.status, "Unexpected status");
                    session.absorb(&response.set_cookies);
                    if more {
                        self.delay.wait(DelayKind::Retry).await;
                    }
                }
                Err(error) => {
                    warn!(url = %target.url, attempt, error = %error, "Transport error");
                    if more {
                        self.delay.wait(DelayKind::Retry).await;
                    }
                }
            }
        }

        info!(
            url = %target.url,
            attempts,
            last_status = ?last_status,
            "Giving up after exhausting attempts"
        );
        Err(FetchFailure::exhausted(&target.url, last_status))
    }

    /// Send one attempt, following redirects within it.
    ///
    /// Cookies set on a redirect hop are kept for the next hop. The final
    /// non-redirect response (or the last hop once the limit is hit) is
    /// returned for the retry policy to judge.
    async fn send(
        &self,
        session: &mut Session,
        target: &FetchTarget,
        timeout: Duration,
    ) -> TransportResult<FetchResponse> {
        let mut url = target.url.clone();
        let mut hops = 0;
        loop {
            let request = session.request(&url, target.kind, target.referer.as_deref(), timeout);
            let response = self.transport.get(&request).await?;
            let next = match response.redirect_target(&url) {
                Some(next) if hops < MAX_REDIRECTS => next,
                _ => return Ok(response),
            };
            session.absorb(&response.set_cookies);
            debug!(from = %url, to = %next, status = response.status, "Following redirect");
            url = next;
            hops += 1;
        }
    }

    /// Wait the politeness delay while holding this host's gate.
    async fn pace(&self, url: &Url, kind: DelayKind) {
        let host = url.host_str().unwrap_or_default().to_string();
        let gate = Arc::clone(
            &*self
                .hosts
                .entry(host)
                .or_insert_with(|| Arc::new(Mutex::new(()))),
        );
        let _turn = gate.lock().await;
        self.delay.wait(kind).await;
    }
}
