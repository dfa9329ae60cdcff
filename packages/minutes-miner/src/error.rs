//! Typed errors for the mining library.
//!
//! Uses `thiserror` for library errors (not `anyhow`) to provide
//! strongly-typed, composable error handling. Only the binary reaches
//! for `anyhow`.

use thiserror::Error;

/// Top-level errors. None of these are raised mid-run for a single bad
/// document or host; they describe configuration and output defects.
#[derive(Debug, Error)]
pub enum MinerError {
    /// Pattern catalog failed to compile
    #[error("pattern catalog error: {0}")]
    Catalog(#[from] CatalogError),

    /// Configuration could not be loaded
    #[error("config error: {0}")]
    Config(#[from] ConfigError),

    /// Filesystem operation failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization failed
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// HTTP client could not be constructed
    #[error("HTTP client error: {0}")]
    Client(#[source] Box<dyn std::error::Error + Send + Sync>),
}

/// Errors from a single transport round-trip.
#[derive(Debug, Clone, Error)]
pub enum TransportError {
    /// Per-attempt timeout elapsed
    #[error("timeout fetching {url}")]
    Timeout { url: String },

    /// Connection refused, reset, or DNS failure
    #[error("connection error: {0}")]
    Connect(String),

    /// Body read or any other transport-level failure
    #[error("transport error: {0}")]
    Other(String),
}

/// Why a fetch gave up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureReason {
    /// Every attempt ended in a non-200 status or transport error
    AttemptsExhausted,
    /// URL could not be parsed
    InvalidUrl,
    /// Bytes were fetched but could not be written to the cache
    CacheWrite(String),
    /// A cached file exists but could not be read back
    CacheRead(String),
    /// Cancellation was requested before or during the fetch
    Cancelled,
}

/// A document (or listing page) that could not be retrieved.
///
/// Callers treat this as "unavailable", never as fatal.
#[derive(Debug, Clone, Error)]
#[error("fetch failed for {url} (last status: {})", last_status.map_or_else(|| "none".to_string(), |s| s.to_string()))]
pub struct FetchFailure {
    pub url: String,
    pub last_status: Option<u16>,
    pub reason: FailureReason,
}

impl FetchFailure {
    pub fn exhausted(url: impl Into<String>, last_status: Option<u16>) -> Self {
        Self {
            url: url.into(),
            last_status,
            reason: FailureReason::AttemptsExhausted,
        }
    }

    pub fn invalid_url(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            last_status: None,
            reason: FailureReason::InvalidUrl,
        }
    }

    pub fn cache_write(url: impl Into<String>, error: &std::io::Error) -> Self {
        Self {
            url: url.into(),
            last_status: None,
            reason: FailureReason::CacheWrite(error.to_string()),
        }
    }

    pub fn cache_read(url: impl Into<String>, error: &std::io::Error) -> Self {
        Self {
            url: url.into(),
            last_status: None,
            reason: FailureReason::CacheRead(error.to_string()),
        }
    }

    pub fn cancelled(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            last_status: None,
            reason: FailureReason::Cancelled,
        }
    }
}

/// Pattern catalog defects. Raised at load time, never mid-scan.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// A pattern is not a valid regular expression
    #[error("invalid pattern {pattern:?} in tier {tier}: {source}")]
    InvalidPattern {
        tier: String,
        pattern: String,
        #[source]
        source: regex::Error,
    },

    /// A tier carries no patterns
    #[error("tier {0} has no patterns")]
    EmptyTier(String),

    /// The catalog has no tiers at all
    #[error("catalog has no tiers")]
    Empty,
}

/// Failures of the optical recognition collaborators.
#[derive(Debug, Error)]
pub enum OcrError {
    /// The external tool is missing or could not be spawned
    #[error("{tool} unavailable: {source}")]
    ToolUnavailable {
        tool: &'static str,
        #[source]
        source: std::io::Error,
    },

    /// The external tool ran but exited unsuccessfully
    #[error("{tool} failed: {stderr}")]
    ToolFailed { tool: &'static str, stderr: String },

    /// Scratch files could not be written or read
    #[error("OCR scratch I/O: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration loading failures.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// An environment variable held an unparseable value
    #[error("invalid value for {var}: {value}")]
    InvalidVar { var: &'static str, value: String },

    /// Config file could not be read
    #[error("cannot read config file {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// Config file is not valid JSON for `MinerConfig`
    #[error("cannot parse config file {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Result type alias for library operations.
pub type Result<T> = std::result::Result<T, MinerError>;

/// Result type alias for fetch operations.
pub type FetchResult<T> = std::result::Result<T, FetchFailure>;

/// Result type alias for transport round-trips.
pub type TransportResult<T> = std::result::Result<T, TransportError>;

/// Result type alias for OCR collaborators.
pub type OcrResult<T> = std::result::Result<T, OcrError>;
