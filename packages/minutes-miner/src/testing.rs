//! Testing utilities including mock implementations.
//!
//! These let applications and tests drive the fetch engine, the
//! extraction pipeline, and the coordinator without network access,
//! real sleeps, or PDF tooling.

use async_trait::async_trait;
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, RwLock};
use std::time::Duration;

use crate::error::{TransportError, TransportResult};
use crate::fetch::delay::JitterDelay;
use crate::traits::delay::{Delay, DelayKind};
use crate::traits::extractor::{ExtractionStrategy, StrategyOutcome};
use crate::traits::transport::{FetchRequest, FetchResponse, Transport};
use crate::types::config::DelayRanges;
use crate::types::document::ExtractedPage;

/// One scripted transport reply.
#[derive(Debug, Clone)]
pub enum MockReply {
    Response(FetchResponse),
    Error(TransportError),
}

impl MockReply {
    /// 200 with a body.
    pub fn ok(body: impl Into<bytes::Bytes>) -> Self {
        MockReply::Response(FetchResponse::new(200, body))
    }

    /// Any status with an empty body.
    pub fn status(code: u16) -> Self {
        MockReply::Response(FetchResponse::new(code, bytes::Bytes::new()))
    }

    /// Status plus a `Set-Cookie` header.
    pub fn status_with_cookie(code: u16, cookie: &str) -> Self {
        MockReply::Response(FetchResponse::new(code, bytes::Bytes::new()).with_cookie(cookie))
    }

    /// Redirect to `location`, optionally setting a cookie on the hop.
    pub fn redirect(code: u16, location: &str, cookie: Option<&str>) -> Self {
        let mut response = FetchResponse::new(code, bytes::Bytes::new()).with_location(location);
        if let Some(cookie) = cookie {
            response = response.with_cookie(cookie);
        }
        MockReply::Response(response)
    }

    /// Transport-level timeout.
    pub fn timeout(url: &str) -> Self {
        MockReply::Error(TransportError::Timeout {
            url: url.to_string(),
        })
    }
}

/// Scripted transport.
///
/// Each URL has a queue of replies consumed in order; the last reply
/// repeats forever. Unscripted URLs get a 404. Every request is recorded.
#[derive(Default, Clone)]
pub struct MockTransport {
    scripts: Arc<RwLock<HashMap<String, VecDeque<MockReply>>>>,
    requests: Arc<RwLock<Vec<FetchRequest>>>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Script a sequence of replies for a URL (builder pattern).
    pub fn with_script(self, url: impl Into<String>, replies: Vec<MockReply>) -> Self {
        self.scripts
            .write()
            .unwrap()
            .insert(url.into(), replies.into_iter().collect());
        self
    }

    /// Always answer 200 with this body.
    pub fn with_page(self, url: impl Into<String>, body: impl Into<bytes::Bytes>) -> Self {
        self.with_script(url, vec![MockReply::ok(body)])
    }

    /// Always answer with this status.
    pub fn with_status(self, url: impl Into<String>, status: u16) -> Self {
        self.with_script(url, vec![MockReply::status(status)])
    }

    /// Every request sent, in order.
    pub fn requests(&self) -> Vec<FetchRequest> {
        self.requests.read().unwrap().clone()
    }

    pub fn request_count(&self) -> usize {
        self.requests.read().unwrap().len()
    }

    /// Requests sent to one URL.
    pub fn requests_for(&self, url: &str) -> Vec<FetchRequest> {
        self.requests
            .read()
            .unwrap()
            .iter()
            .filter(|r| r.url == url)
            .cloned()
            .collect()
    }

    pub fn count_for(&self, url: &str) -> usize {
        self.requests_for(url).len()
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn get(&self, request: &FetchRequest) -> TransportResult<FetchResponse> {
        self.requests.write().unwrap().push(request.clone());

        let reply = {
            let mut scripts = self.scripts.write().unwrap();
            match scripts.get_mut(&request.url) {
                Some(queue) if queue.len() > 1 => queue.pop_front(),
                Some(queue) => queue.front().cloned(),
                None => None,
            }
        };

        match reply {
            Some(MockReply::Response(response)) => Ok(response),
            Some(MockReply::Error(error)) => Err(error),
            None => Ok(FetchResponse::new(404, bytes::Bytes::new())),
        }
    }

    fn name(&self) -> &str {
        "mock"
    }
}

/// Delay that records what it would have slept without sleeping.
///
/// Durations are sampled from the same ranges `JitterDelay` uses, so
/// tests can assert the documented backoff windows.
#[derive(Clone, Default)]
pub struct RecordingDelay {
    jitter: JitterDelay,
    waits: Arc<RwLock<Vec<(DelayKind, Duration)>>>,
}

impl RecordingDelay {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record against custom ranges.
    pub fn with_ranges(ranges: DelayRanges) -> Self {
        Self {
            jitter: JitterDelay::new(ranges),
            waits: Arc::default(),
        }
    }

    /// Every recorded wait in order.
    pub fn waits(&self) -> Vec<(DelayKind, Duration)> {
        self.waits.read().unwrap().clone()
    }

    /// Just the kinds, in order.
    pub fn kinds(&self) -> Vec<DelayKind> {
        self.waits().into_iter().map(|(k, _)| k).collect()
    }

    pub fn count(&self, kind: DelayKind) -> usize {
        self.waits().iter().filter(|(k, _)| *k == kind).count()
    }
}

#[async_trait]
impl Delay for RecordingDelay {
    async fn wait(&self, kind: DelayKind) {
        let duration = self.jitter.sample(kind).unwrap_or_default();
        self.waits.write().unwrap().push((kind, duration));
    }
}

/// Strategy that returns a fixed outcome and counts its calls.
#[derive(Clone)]
pub struct ScriptedStrategy {
    name: &'static str,
    outcome: StrategyOutcome,
    calls: Arc<AtomicUsize>,
}

impl ScriptedStrategy {
    /// Returns these pages (after applying the retention rule).
    pub fn pages(name: &'static str, pages: &[(u32, &str)]) -> Self {
        let pages = pages
            .iter()
            .filter_map(|(n, text)| ExtractedPage::retain(*n, *text))
            .collect();
        Self::with_outcome(name, StrategyOutcome::from_pages(pages))
    }

    pub fn empty(name: &'static str) -> Self {
        Self::with_outcome(name, StrategyOutcome::Empty)
    }

    pub fn failing(name: &'static str, reason: &str) -> Self {
        Self::with_outcome(name, StrategyOutcome::Failed(reason.to_string()))
    }

    pub fn with_outcome(name: &'static str, outcome: StrategyOutcome) -> Self {
        Self {
            name,
            outcome,
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl ExtractionStrategy for ScriptedStrategy {
    fn name(&self) -> &'static str {
        self.name
    }

    fn extract(&self, _document: &[u8]) -> StrategyOutcome {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.outcome.clone()
    }
}

/// Treats document bytes as UTF-8 text with form feeds between pages.
///
/// Lets end-to-end tests serve "documents" as plain strings.
#[derive(Debug, Clone, Copy, Default)]
pub struct PlainTextStrategy;

impl ExtractionStrategy for PlainTextStrategy {
    fn name(&self) -> &'static str {
        "plain_text"
    }

    fn extract(&self, document: &[u8]) -> StrategyOutcome {
        let Ok(text) = std::str::from_utf8(document) else {
            return StrategyOutcome::Failed("not UTF-8".to_string());
        };
        let pages = text
            .split('\u{c}')
            .enumerate()
            .filter_map(|(i, page)| ExtractedPage::retain(i as u32 + 1, page))
            .collect();
        StrategyOutcome::from_pages(pages)
    }
}

/// Build a PDF with one line of Courier text per page.
///
/// Pages carry a real text layer, so the text-layer strategies can be
/// exercised without fixture files.
pub fn text_pdf(pages: &[&str]) -> Vec<u8> {
    build_text_pdf(pages, None)
}

/// Like `text_pdf`, but page `broken` (1-based) points its `Resources`
/// at an object that is not in the file.
pub fn text_pdf_with_broken_page(pages: &[&str], broken: u32) -> Vec<u8> {
    build_text_pdf(pages, Some(broken))
}

fn build_text_pdf(pages: &[&str], broken: Option<u32>) -> Vec<u8> {
    use lopdf::content::{Content, Operation};
    use lopdf::{dictionary, Document, Object, Stream};

    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();
    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Courier",
        "Encoding" => "WinAnsiEncoding",
    });
    let resources_id = doc.add_object(dictionary! {
        "Font" => dictionary! { "F1" => font_id },
    });

    let mut kids: Vec<Object> = Vec::with_capacity(pages.len());
    for (index, text) in pages.iter().enumerate() {
        let resources: Object = if broken == Some(index as u32 + 1) {
            Object::Reference((9_999, 0))
        } else {
            resources_id.into()
        };
        let content = Content {
            operations: vec![
                Operation::new("BT", vec![]),
                Operation::new("Tf", vec!["F1".into(), 10.into()]),
                Operation::new("Td", vec![40.into(), 700.into()]),
                Operation::new("Tj", vec![Object::string_literal(*text)]),
                Operation::new("ET", vec![]),
            ],
        };
        let stream = Stream::new(dictionary! {}, content.encode().unwrap_or_default());
        let content_id = doc.add_object(stream);
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
            "Resources" => resources,
            "MediaBox" => vec![0.into(), 0.into(), 612.into(), 792.into()],
        });
        kids.push(page_id.into());
    }

    let count = kids.len() as i64;
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => count,
        }),
    );
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    let mut buffer = Vec::new();
    doc.save_to(&mut buffer).unwrap_or_default();
    buffer
}

/// Minimal listing page with one anchor per `(href, text)` pair.
pub fn listing_html(links: &[(&str, &str)]) -> String {
    let anchors: String = links
        .iter()
        .map(|(href, text)| format!("<li><a href=\"{href}\">{text}</a></li>\n"))
        .collect();
    format!("<html><head><title>Minutes</title></head><body><ul>\n{anchors}</ul></body></html>")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_mock_transport_last_reply_repeats() {
        let url = "https://example.com/x";
        let mock = MockTransport::new().with_script(
            url,
            vec![MockReply::status(500), MockReply::ok("done")],
        );
        let request = FetchRequest::new(url, Duration::from_secs(1));

        assert_eq!(mock.get(&request).await.unwrap().status, 500);
        assert_eq!(mock.get(&request).await.unwrap().status, 200);
        assert_eq!(mock.get(&request).await.unwrap().status, 200);
        assert_eq!(mock.count_for(url), 3);
    }

    #[tokio::test]
    async fn test_mock_transport_unscripted_is_404() {
        let mock = MockTransport::new();
        let request = FetchRequest::new("https://example.com/none", Duration::from_secs(1));
        assert_eq!(mock.get(&request).await.unwrap().status, 404);
    }

    #[test]
    fn test_plain_text_strategy_splits_pages() {
        let body = format!("{}\u{c}short\u{c}{}", "a".repeat(60), "b".repeat(60));
        match PlainTextStrategy.extract(body.as_bytes()) {
            StrategyOutcome::Pages(pages) => {
                let numbers: Vec<_> = pages.iter().map(|p| p.number).collect();
                assert_eq!(numbers, vec![1, 3]);
            }
            other => panic!("unexpected outcome {other:?}"),
        }
    }
}
