//! Document types - discovered references, cached files, extracted pages.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use super::config::Bucket;

/// Minimum trimmed character count for a page to be kept.
pub const MIN_PAGE_CHARS: usize = 50;

/// Date string used when none can be inferred.
pub const UNKNOWN_DATE: &str = "Unknown";

/// A document link discovered on a listing page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentRef {
    /// Absolute URL of the document
    pub url: String,

    /// Link display text
    pub text: String,

    /// Best-effort date, `"Unknown"` when nothing matched
    pub date: String,

    /// Last path segment of the URL
    pub filename: String,
}

impl DocumentRef {
    pub fn new(
        url: impl Into<String>,
        text: impl Into<String>,
        date: impl Into<String>,
        filename: impl Into<String>,
    ) -> Self {
        Self {
            url: url.into(),
            text: text.into(),
            date: date.into(),
            filename: filename.into(),
        }
    }

    pub fn has_known_date(&self) -> bool {
        self.date != UNKNOWN_DATE
    }
}

/// Where a document lives in the on-disk cache.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    pub group_key: String,
    pub bucket: Bucket,
    pub filename: String,
}

impl CacheKey {
    pub fn new(group_key: impl Into<String>, bucket: Bucket, filename: impl Into<String>) -> Self {
        Self {
            group_key: group_key.into(),
            bucket,
            filename: filename.into(),
        }
    }
}

/// A document present on disk.
#[derive(Debug, Clone)]
pub struct CachedDocument {
    pub key: CacheKey,
    pub path: PathBuf,

    /// True when this call performed the download, false on a cache hit
    pub downloaded: bool,
}

/// One page of recovered text. Only built through [`ExtractedPage::retain`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractedPage {
    /// 1-based page number
    pub number: u32,
    pub text: String,
}

impl ExtractedPage {
    /// Keep the page only if its trimmed text exceeds [`MIN_PAGE_CHARS`]
    /// characters. Page 0 is never valid.
    pub fn retain(number: u32, text: impl Into<String>) -> Option<Self> {
        let text = text.into();
        if number == 0 || text.trim().chars().count() <= MIN_PAGE_CHARS {
            return None;
        }
        Some(Self { number, text })
    }
}

/// Provenance carried from a document into each of its findings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentMeta {
    pub group_name: String,
    pub filename: String,
    pub date: String,
    pub url: String,
}

impl DocumentMeta {
    pub fn for_document(group_name: impl Into<String>, doc: &DocumentRef) -> Self {
        Self {
            group_name: group_name.into(),
            filename: doc.filename.clone(),
            date: doc.date.clone(),
            url: doc.url.clone(),
        }
    }
}
