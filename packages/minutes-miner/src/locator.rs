//! Document locator - finds document links on a listing page.
//!
//! Never fails on malformed HTML: a page with no body or no matching
//! links yields an empty list and a logged warning.

use regex::Regex;
use scraper::{Html, Selector};
use std::collections::HashSet;
use std::sync::LazyLock;
use tracing::{debug, info, warn};
use url::Url;

use crate::error::FetchResult;
use crate::fetch::engine::{FetchEngine, FetchTarget};
use crate::traits::delay::Delay;
use crate::traits::transport::Transport;
use crate::types::document::{DocumentRef, UNKNOWN_DATE};

static ANCHOR: LazyLock<Selector> = LazyLock::new(|| Selector::parse("a[href]").unwrap());

/// `D{1,2}[-/]D{1,2}[-/]D{2,4}` or `Month D{1,2}, YYYY`, leftmost wins.
static DATE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)\d{1,2}[-/]\d{1,2}[-/]\d{2,4}|\b(?:jan(?:uary)?|feb(?:ruary)?|mar(?:ch)?|apr(?:il)?|may|june?|july?|aug(?:ust)?|sep(?:t(?:ember)?)?|oct(?:ober)?|nov(?:ember)?|dec(?:ember)?)\.?\s+\d{1,2},?\s+\d{4}",
    )
    .unwrap()
});

/// Best-effort meeting date from free text; `"Unknown"` when nothing matches.
pub fn infer_date(text: &str) -> String {
    DATE.find(text)
        .map(|m| m.as_str().to_string())
        .unwrap_or_else(|| UNKNOWN_DATE.to_string())
}

/// Last path segment of a URL, rejecting empty and dot segments.
pub fn filename_from_url(url: &Url) -> Option<String> {
    let name = url.path_segments()?.next_back()?;
    match name {
        "" | "." | ".." => None,
        name => Some(name.to_string()),
    }
}

/// Finds links whose href ends in the document extension.
#[derive(Debug, Clone)]
pub struct DocumentLocator {
    /// Lowercased, e.g. `.pdf`
    extension: String,
}

impl Default for DocumentLocator {
    fn default() -> Self {
        Self::new(".pdf")
    }
}

impl DocumentLocator {
    pub fn new(extension: impl Into<String>) -> Self {
        Self {
            extension: extension.into().to_lowercase(),
        }
    }

    pub fn extension(&self) -> &str {
        &self.extension
    }

    /// True if a name or href ends in the extension (case-insensitive).
    pub fn matches(&self, href: &str) -> bool {
        href.to_lowercase().ends_with(&self.extension)
    }

    /// Fetch a listing page and parse it.
    pub async fn locate<T, D>(
        &self,
        engine: &FetchEngine<T, D>,
        listing_url: &str,
    ) -> FetchResult<Vec<DocumentRef>>
    where
        T: Transport,
        D: Delay,
    {
        let html = engine.fetch_text(&FetchTarget::listing(listing_url)).await?;
        Ok(self.parse(listing_url, &html))
    }

    /// Extract document references from listing HTML.
    ///
    /// Hrefs resolve against `listing_url`. A filename already seen on
    /// this page is skipped, since it would map to the same cache path.
    pub fn parse(&self, listing_url: &str, html: &str) -> Vec<DocumentRef> {
        let Ok(base) = Url::parse(listing_url) else {
            warn!(url = %listing_url, "Listing URL is not absolute; no documents located");
            return Vec::new();
        };

        let document = Html::parse_document(html);
        let mut anchors = 0usize;
        let mut seen: HashSet<String> = HashSet::new();
        let mut refs = Vec::new();

        for element in document.select(&ANCHOR) {
            anchors += 1;
            let Some(href) = element.value().attr("href") else {
                continue;
            };
            let href = href.trim();
            if !self.matches(href) {
                continue;
            }

            let Ok(resolved) = base.join(href) else {
                debug!(href = %href, "Unresolvable href");
                continue;
            };
            let Some(filename) = filename_from_url(&resolved) else {
                debug!(url = %resolved, "No filename in document URL");
                continue;
            };
            if !seen.insert(filename.clone()) {
                debug!(filename = %filename, "Duplicate filename on listing page");
                continue;
            }

            let text = element
                .text()
                .flat_map(str::split_whitespace)
                .collect::<Vec<_>>()
                .join(" ");
            let date = infer_date(&format!("{text} {href}"));

            refs.push(DocumentRef::new(resolved.to_string(), text, date, filename));
        }

        if anchors == 0 {
            warn!(url = %listing_url, "Listing page has no links");
        } else if refs.is_empty() {
            warn!(url = %listing_url, links = anchors, "Listing page has no document links");
        } else {
            info!(url = %listing_url, documents = refs.len(), "Located documents");
        }

        refs
    }
}
