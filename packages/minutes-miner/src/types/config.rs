//! Configuration types for source groups, fetching, and pacing.
//!
//! A `MinerConfig` is built once at startup and passed into the
//! coordinator behind an `Arc`. Nothing here is mutated after load.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::classify::catalog::default_catalog_spec;
use crate::error::ConfigError;

/// Listing bucket a document was discovered under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Bucket {
    Current,
    Archive,
}

impl Bucket {
    /// Processing order within a group.
    pub const ALL: [Bucket; 2] = [Bucket::Current, Bucket::Archive];

    pub fn as_str(&self) -> &'static str {
        match self {
            Bucket::Current => "current",
            Bucket::Archive => "archive",
        }
    }

    /// Bucket whose cache directory has this name.
    pub fn from_dir_name(name: &str) -> Option<Bucket> {
        Bucket::ALL.into_iter().find(|b| b.as_str() == name)
    }
}

impl std::fmt::Display for Bucket {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One committee or body whose listing pages are mined.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceGroup {
    /// Stable key, also the on-disk directory name
    pub key: String,

    /// Display name carried into findings
    pub name: String,

    /// Listing page for current documents
    pub current_url: Option<String>,

    /// Listing page for archived documents
    pub archive_url: Option<String>,
}

impl SourceGroup {
    /// Create a group with no listing pages yet.
    pub fn new(key: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            name: name.into(),
            current_url: None,
            archive_url: None,
        }
    }

    /// Set the current listing URL.
    pub fn with_current(mut self, url: impl Into<String>) -> Self {
        self.current_url = Some(url.into());
        self
    }

    /// Set the archive listing URL.
    pub fn with_archive(mut self, url: impl Into<String>) -> Self {
        self.archive_url = Some(url.into());
        self
    }

    /// Listing URL for a bucket, if configured.
    pub fn listing_url(&self, bucket: Bucket) -> Option<&str> {
        match bucket {
            Bucket::Current => self.current_url.as_deref(),
            Bucket::Archive => self.archive_url.as_deref(),
        }
    }
}

/// One priority tier as written in configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TierSpec {
    /// Regular-expression sources, matched case-insensitively
    pub patterns: Vec<String>,

    /// Display colour for reporting; opaque to the core
    pub color: String,
}

impl TierSpec {
    pub fn new(color: impl Into<String>, patterns: &[&str]) -> Self {
        Self {
            patterns: patterns.iter().map(|p| p.to_string()).collect(),
            color: color.into(),
        }
    }
}

/// Ordered mapping of tier name to patterns, most severe first.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CatalogSpec {
    pub tiers: IndexMap<String, TierSpec>,
}

impl CatalogSpec {
    pub fn new() -> Self {
        Self {
            tiers: IndexMap::new(),
        }
    }

    /// Append a tier after every existing one.
    pub fn with_tier(mut self, name: impl Into<String>, tier: TierSpec) -> Self {
        self.tiers.insert(name.into(), tier);
        self
    }
}

impl Default for CatalogSpec {
    fn default() -> Self {
        default_catalog_spec()
    }
}

/// Retry and timeout settings for the fetch engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FetchSettings {
    /// Attempts per URL before giving up. Default: 3.
    pub max_attempts: u32,

    /// Per-attempt timeout for listing pages. Default: 30s.
    pub listing_timeout_secs: u64,

    /// Per-attempt timeout for documents. Default: 60s.
    pub document_timeout_secs: u64,

    /// User-Agent rotation pool. Each attempt picks one at random.
    pub user_agents: Vec<String>,
}

impl Default for FetchSettings {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            listing_timeout_secs: 30,
            document_timeout_secs: 60,
            user_agents: vec![
                "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36".to_string(),
                "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/119.0.0.0 Safari/537.36".to_string(),
                "Mozilla/5.0 (Windows NT 10.0; Win64; x64; rv:109.0) Gecko/20100101 Firefox/119.0".to_string(),
                "Mozilla/5.0 (Macintosh; Intel Mac OS X 14_0) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/119.0.0.0 Safari/537.36".to_string(),
            ],
        }
    }
}

impl FetchSettings {
    pub fn listing_timeout(&self) -> Duration {
        Duration::from_secs(self.listing_timeout_secs)
    }

    pub fn document_timeout(&self) -> Duration {
        Duration::from_secs(self.document_timeout_secs)
    }
}

/// Inclusive jitter range in milliseconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct JitterRange {
    pub min_ms: u64,
    pub max_ms: u64,
}

impl JitterRange {
    pub const fn secs(min: u64, max: u64) -> Self {
        Self {
            min_ms: min * 1000,
            max_ms: max * 1000,
        }
    }

    /// Draw a uniformly random duration inside the range.
    pub fn sample(&self) -> Duration {
        let (lo, hi) = if self.min_ms <= self.max_ms {
            (self.min_ms, self.max_ms)
        } else {
            (self.max_ms, self.min_ms)
        };
        Duration::from_millis(fastrand::u64(lo..=hi))
    }

    pub fn contains(&self, duration: Duration) -> bool {
        let ms = duration.as_millis() as u64;
        ms >= self.min_ms && ms <= self.max_ms
    }
}

/// Randomized pacing ranges, one per delay kind.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DelayRanges {
    /// Before each listing-page attempt. Default: 2–5s.
    pub listing: JitterRange,

    /// Before each document download attempt. Default: 1–3s.
    pub document: JitterRange,

    /// After a 403, before the next attempt. Default: 10–20s.
    pub forbidden: JitterRange,

    /// After any other failure, before the next attempt. Default: 5–10s.
    pub retry: JitterRange,

    /// Between source groups. Default: 5–10s.
    pub group_pause: JitterRange,

    /// When false, every wait is skipped.
    pub enabled: bool,
}

impl Default for DelayRanges {
    fn default() -> Self {
        Self {
            listing: JitterRange::secs(2, 5),
            document: JitterRange::secs(1, 3),
            forbidden: JitterRange::secs(10, 20),
            retry: JitterRange::secs(5, 10),
            group_pause: JitterRange::secs(5, 10),
            enabled: true,
        }
    }
}

/// Complete, immutable run configuration.
///
/// Fields missing from a config file take their default values.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MinerConfig {
    /// Root of the `<group>/<bucket>/<filename>` cache layout
    pub base_dir: PathBuf,

    /// Groups processed in order
    pub groups: Vec<SourceGroup>,

    /// Keyword catalog, compiled at startup
    #[serde(default)]
    pub catalog: CatalogSpec,

    #[serde(default)]
    pub fetch: FetchSettings,

    #[serde(default)]
    pub delays: DelayRanges,

    /// Documents processed concurrently within a group. 1 = sequential.
    pub workers: usize,

    /// Case-insensitive href suffix marking a document link
    pub document_extension: String,
}

impl Default for MinerConfig {
    fn default() -> Self {
        Self {
            base_dir: PathBuf::from("dekalb_pdfs"),
            groups: default_groups(),
            catalog: CatalogSpec::default(),
            fetch: FetchSettings::default(),
            delays: DelayRanges::default(),
            workers: 1,
            document_extension: ".pdf".to_string(),
        }
    }
}

impl MinerConfig {
    /// Create a config with default settings and the given groups.
    pub fn new(groups: Vec<SourceGroup>) -> Self {
        Self {
            groups,
            ..Default::default()
        }
    }

    /// Set the cache base directory.
    pub fn with_base_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.base_dir = dir.into();
        self
    }

    /// Set the worker count (clamped to at least 1).
    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers.max(1);
        self
    }

    /// Replace the keyword catalog.
    pub fn with_catalog(mut self, catalog: CatalogSpec) -> Self {
        self.catalog = catalog;
        self
    }

    /// Set max attempts per URL.
    pub fn with_max_attempts(mut self, attempts: u32) -> Self {
        self.fetch.max_attempts = attempts.max(1);
        self
    }

    /// Disable all jitter and backoff waits.
    pub fn without_delays(mut self) -> Self {
        self.delays.enabled = false;
        self
    }

    /// Load configuration from the environment.
    ///
    /// Reads `.env` if present, then `MINER_CONFIG` (a JSON file that
    /// replaces the defaults), then scalar overrides:
    /// `MINER_BASE_DIR`, `MINER_WORKERS`, `MINER_MAX_ATTEMPTS`, `MINER_NO_DELAY`.
    pub fn from_env() -> Result<Self, ConfigError> {
        let _ = dotenvy::dotenv();

        let mut config = match std::env::var("MINER_CONFIG") {
            Ok(path) => Self::from_file(Path::new(&path))?,
            Err(_) => Self::default(),
        };

        if let Ok(dir) = std::env::var("MINER_BASE_DIR") {
            config.base_dir = PathBuf::from(dir);
        }
        if let Ok(value) = std::env::var("MINER_WORKERS") {
            let workers: usize = value.parse().map_err(|_| ConfigError::InvalidVar {
                var: "MINER_WORKERS",
                value: value.clone(),
            })?;
            config = config.with_workers(workers);
        }
        if let Ok(value) = std::env::var("MINER_MAX_ATTEMPTS") {
            let attempts: u32 = value.parse().map_err(|_| ConfigError::InvalidVar {
                var: "MINER_MAX_ATTEMPTS",
                value: value.clone(),
            })?;
            config = config.with_max_attempts(attempts);
        }
        if let Ok(value) = std::env::var("MINER_NO_DELAY") {
            match value.as_str() {
                "1" | "true" | "yes" => config.delays.enabled = false,
                "0" | "false" | "no" => {}
                _ => {
                    return Err(ConfigError::InvalidVar {
                        var: "MINER_NO_DELAY",
                        value,
                    })
                }
            }
        }

        Ok(config)
    }

    /// Read a JSON config file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        serde_json::from_str(&raw).map_err(|source| ConfigError::Parse {
            path: path.display().to_string(),
            source,
        })
    }
}

const DEKALB_GOV: &str = "https://dekalbcounty.org/government/county-boards-commissions";

/// The seven DeKalb County committees mined by default.
pub fn default_groups() -> Vec<SourceGroup> {
    vec![
        SourceGroup::new("finance_administration", "Finance & Administration")
            .with_current(format!("{DEKALB_GOV}/finance/"))
            .with_archive(format!("{DEKALB_GOV}/finance/finance-committee-archive/")),
        SourceGroup::new("highway", "Highway")
            .with_current(format!("{DEKALB_GOV}/county-highway/"))
            .with_archive(format!("{DEKALB_GOV}/county-highway/highway-committee-archive/")),
        SourceGroup::new("law_justice", "Law & Justice")
            .with_current(format!("{DEKALB_GOV}/law-justice/"))
            .with_archive(format!("{DEKALB_GOV}/law-justice/law-justice-archive/")),
        SourceGroup::new("committee_whole", "Committee of the Whole")
            .with_current(format!("{DEKALB_GOV}/committee-of-the-whole/"))
            .with_archive(format!(
                "{DEKALB_GOV}/committee-of-the-whole/committee-of-the-whole-archive/"
            )),
        SourceGroup::new("executive", "Executive")
            .with_current(format!("{DEKALB_GOV}/executive/"))
            .with_archive(format!("{DEKALB_GOV}/executive/executive-committee-archive/")),
        SourceGroup::new("county_board", "County Board")
            .with_current(format!("{DEKALB_GOV}/county-board-meetings/"))
            .with_archive(format!("{DEKALB_GOV}/county-board-meetings/county-board-archives/")),
        SourceGroup::new("board_review", "Board of Review")
            .with_current("https://dekalbcounty.org/departments/assessment-office/board-of-review/board-of-review-meetings/")
            .with_archive("https://dekalbcounty.org/departments/assessment-office/board-of-review/board-of-review-meetings/board-of-review-archives/"),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_groups_have_both_buckets() {
        let groups = default_groups();
        assert_eq!(groups.len(), 7);
        for group in &groups {
            assert!(group.listing_url(Bucket::Current).is_some(), "{}", group.key);
            assert!(group.listing_url(Bucket::Archive).is_some(), "{}", group.key);
        }
    }

    #[test]
    fn test_jitter_range_sample_stays_in_bounds() {
        let range = JitterRange::secs(2, 5);
        for _ in 0..200 {
            let d = range.sample();
            assert!(range.contains(d), "{:?} outside {:?}", d, range);
        }
    }

    #[test]
    fn test_config_json_roundtrip_keeps_tier_order() {
        let config = MinerConfig::default();
        let json = serde_json::to_string(&config).unwrap();
        let parsed: MinerConfig = serde_json::from_str(&json).unwrap();

        let names: Vec<_> = parsed.catalog.tiers.keys().cloned().collect();
        assert_eq!(
            names,
            vec!["priority_1", "priority_2", "priority_3", "priority_4"]
        );
        assert_eq!(parsed.groups.len(), config.groups.len());
    }

    #[test]
    fn test_partial_config_file_fills_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("miner.json");
        std::fs::write(&path, r#"{"workers": 4, "base_dir": "pdfs"}"#).unwrap();

        let config = MinerConfig::from_file(&path).unwrap();
        assert_eq!(config.workers, 4);
        assert_eq!(config.base_dir, PathBuf::from("pdfs"));
        assert_eq!(config.groups.len(), 7);
        assert_eq!(config.fetch.max_attempts, 3);
    }

    #[test]
    fn test_bad_config_file_is_parse_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("miner.json");
        std::fs::write(&path, "{ not json").unwrap();

        assert!(matches!(
            MinerConfig::from_file(&path),
            Err(ConfigError::Parse { .. })
        ));
    }

    #[test]
    fn test_builders_clamp() {
        let config = MinerConfig::new(vec![]).with_workers(0).with_max_attempts(0);
        assert_eq!(config.workers, 1);
        assert_eq!(config.fetch.max_attempts, 1);
    }
}
