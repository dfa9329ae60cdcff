//! Output records handed to reporting collaborators.

use serde::{Deserialize, Serialize};

use super::config::Bucket;
use crate::error::{FailureReason, FetchFailure};

/// One keyword match with context. Never merged or mutated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Finding {
    /// Source group display name
    pub group: String,
    pub filename: String,
    pub date: String,
    pub page: u32,

    /// Priority tier name, e.g. `priority_1`
    pub tier: String,

    /// Pattern source that produced the match
    pub pattern: String,

    /// Literal matched text
    pub matched_text: String,

    /// Up to 300 characters each side, whitespace collapsed
    pub context: String,
    pub url: String,
}

/// Why a URL was skipped.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    /// The listing page never returned 200
    ListingUnavailable,
    /// The document never returned 200
    FetchFailed,
    /// Bytes arrived but could not be cached
    CacheWrite,
    /// A cached file could not be read back
    CacheRead,
    /// Cancellation arrived before or during the fetch
    Cancelled,
    /// URL could not be parsed
    InvalidUrl,
}

/// A URL the run gave up on, with the last HTTP status seen.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkipRecord {
    pub url: String,
    pub last_status: Option<u16>,
    pub bucket: Bucket,
    pub reason: SkipReason,
}

impl SkipRecord {
    /// Skip entry for a document fetch failure.
    pub fn from_failure(failure: &FetchFailure, bucket: Bucket) -> Self {
        let reason = match failure.reason {
            FailureReason::AttemptsExhausted => SkipReason::FetchFailed,
            FailureReason::InvalidUrl => SkipReason::InvalidUrl,
            FailureReason::CacheWrite(_) => SkipReason::CacheWrite,
            FailureReason::CacheRead(_) => SkipReason::CacheRead,
            FailureReason::Cancelled => SkipReason::Cancelled,
        };
        Self {
            url: failure.url.clone(),
            last_status: failure.last_status,
            bucket,
            reason,
        }
    }

    /// Skip entry for a listing page that never loaded.
    pub fn listing(failure: &FetchFailure, bucket: Bucket) -> Self {
        Self {
            reason: SkipReason::ListingUnavailable,
            ..Self::from_failure(failure, bucket)
        }
    }
}
