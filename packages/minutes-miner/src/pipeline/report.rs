//! Run output handed to reporting collaborators.
//!
//! A `MiningReport` is built once by the coordinator and only read
//! afterwards.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::info;

use crate::classify::PatternCatalog;
use crate::error::Result;
use crate::types::finding::{Finding, SkipRecord};

/// Where a group got to in `pending -> listing-fetched ->
/// documents-fetched -> classified -> done`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GroupStage {
    Pending,
    ListingFetched,
    DocumentsFetched,
    Classified,
    Done,
}

impl GroupStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            GroupStage::Pending => "pending",
            GroupStage::ListingFetched => "listing_fetched",
            GroupStage::DocumentsFetched => "documents_fetched",
            GroupStage::Classified => "classified",
            GroupStage::Done => "done",
        }
    }
}

/// Per-group counters.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupStats {
    /// Document links located across both buckets
    pub documents_found: usize,

    /// Documents fetched over the network this run
    pub downloaded: usize,

    /// Documents served from the on-disk cache
    pub cache_hits: usize,

    /// Documents that yielded at least one page
    pub extracted: usize,

    /// Documents no strategy could read
    pub no_text: usize,

    /// Listing pages and documents given up on
    pub skipped: usize,

    pub findings: usize,
}

/// Outcome of one source group.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GroupReport {
    pub key: String,
    pub name: String,
    pub stage: GroupStage,
    pub stats: GroupStats,

    /// URLs given up on, with the last status seen
    pub skips: Vec<SkipRecord>,

    /// URLs of documents with no recoverable text
    pub no_text: Vec<String>,
}

impl GroupReport {
    pub fn new(key: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            name: name.into(),
            stage: GroupStage::Pending,
            stats: GroupStats::default(),
            skips: Vec::new(),
            no_text: Vec::new(),
        }
    }
}

/// Tier metadata and its finding count.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TierSummary {
    pub name: String,
    pub color: String,
    pub findings: usize,
}

/// Everything a run produced.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MiningReport {
    pub generated_at: DateTime<Utc>,

    /// True if the run was cancelled before every group finished
    pub cancelled: bool,

    /// Tiers in priority order with their colours
    pub tiers: Vec<TierSummary>,

    pub groups: Vec<GroupReport>,

    /// All findings, in group then listing order
    pub findings: Vec<Finding>,
}

impl MiningReport {
    /// Assemble a report, counting findings per tier.
    pub fn new(catalog: &PatternCatalog, groups: Vec<GroupReport>, findings: Vec<Finding>, cancelled: bool) -> Self {
        let tiers = catalog
            .tiers()
            .iter()
            .map(|tier| TierSummary {
                name: tier.name.clone(),
                color: tier.color.clone(),
                findings: findings.iter().filter(|f| f.tier == tier.name).count(),
            })
            .collect();
        Self {
            generated_at: Utc::now(),
            cancelled,
            tiers,
            groups,
            findings,
        }
    }

    pub fn group(&self, key: &str) -> Option<&GroupReport> {
        self.groups.iter().find(|g| g.key == key)
    }

    /// Findings attributed to a group display name.
    pub fn findings_for<'a>(&'a self, group_name: &'a str) -> impl Iterator<Item = &'a Finding> + 'a {
        self.findings.iter().filter(move |f| f.group == group_name)
    }

    /// Every skip across all groups.
    pub fn skips(&self) -> impl Iterator<Item = &SkipRecord> {
        self.groups.iter().flat_map(|g| g.skips.iter())
    }

    pub fn tier_count(&self, tier: &str) -> usize {
        self.tiers
            .iter()
            .find(|t| t.name == tier)
            .map_or(0, |t| t.findings)
    }

    /// Distinct documents with at least one finding.
    pub fn documents_with_findings(&self) -> usize {
        let mut urls: Vec<&str> = self.findings.iter().map(|f| f.url.as_str()).collect();
        urls.sort_unstable();
        urls.dedup();
        urls.len()
    }

    /// Write `findings_<timestamp>.json` into `dir`, creating it if needed.
    pub async fn write_json(&self, dir: &Path) -> Result<PathBuf> {
        tokio::fs::create_dir_all(dir).await?;
        let path = dir.join(format!(
            "findings_{}.json",
            self.generated_at.format("%Y%m%d_%H%M%S")
        ));
        let json = serde_json::to_vec_pretty(self)?;
        tokio::fs::write(&path, json).await?;
        info!(path = %path.display(), findings = self.findings.len(), "Report written");
        Ok(path)
    }
}
