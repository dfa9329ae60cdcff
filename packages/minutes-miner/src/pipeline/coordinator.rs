//! Mining coordinator - drives locate, fetch, extract, and classify over
//! every source group.
//!
//! Failures never cross a boundary: a listing that never loads is a skip
//! for that bucket, a document that never downloads is a skip for that
//! document, and the run always returns whatever it accumulated.

use futures::stream::{self, StreamExt};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use url::Url;

use super::report::{GroupReport, GroupStage, MiningReport};
use crate::classify::{classify, PatternCatalog};
use crate::error::{FetchFailure, MinerError, Result};
use crate::extract::{Extraction, ExtractionPipeline};
use crate::fetch::cache::DocumentCache;
use crate::fetch::engine::{FetchEngine, FetchTarget};
use crate::locator::{infer_date, DocumentLocator};
use crate::traits::delay::{Delay, DelayKind};
use crate::traits::transport::Transport;
use crate::types::config::{Bucket, MinerConfig, SourceGroup};
use crate::types::document::{CacheKey, DocumentMeta, DocumentRef};
use crate::types::finding::{Finding, SkipRecord};

/// A located document waiting to be fetched.
#[derive(Debug, Clone)]
struct PendingDocument {
    bucket: Bucket,
    listing_url: String,
    document: DocumentRef,
}

/// What happened to one document before classification.
enum DocumentOutcome {
    Extracted {
        pending: PendingDocument,
        downloaded: bool,
        extraction: Extraction,
    },
    Skipped(SkipRecord),
}

/// Documents located for one group, without downloading.
#[derive(Debug, Clone)]
pub struct DiscoveredGroup {
    pub key: String,
    pub name: String,
    pub documents: Vec<(Bucket, DocumentRef)>,
    pub skips: Vec<SkipRecord>,
}

pub struct MiningCoordinator<T: Transport, D: Delay> {
    config: Arc<MinerConfig>,
    catalog: Arc<PatternCatalog>,
    engine: Arc<FetchEngine<T, D>>,
    cache: Arc<DocumentCache>,
    pipeline: Arc<ExtractionPipeline>,
    locator: DocumentLocator,
    cancel: CancellationToken,
}

impl<T: Transport, D: Delay> MiningCoordinator<T, D> {
    pub fn new(
        config: MinerConfig,
        catalog: PatternCatalog,
        transport: T,
        delay: D,
        pipeline: ExtractionPipeline,
    ) -> Self {
        let engine = FetchEngine::new(transport, delay, config.fetch.clone());
        let cache = DocumentCache::new(config.base_dir.clone());
        let locator = DocumentLocator::new(config.document_extension.clone());
        Self {
            config: Arc::new(config),
            catalog: Arc::new(catalog),
            engine: Arc::new(engine),
            cache: Arc::new(cache),
            pipeline: Arc::new(pipeline),
            locator,
            cancel: CancellationToken::new(),
        }
    }

    /// Use an externally owned cancellation token (builder pattern).
    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// Token that aborts the run cooperatively when cancelled.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    pub fn config(&self) -> &MinerConfig {
        &self.config
    }

    pub fn catalog(&self) -> &PatternCatalog {
        &self.catalog
    }

    /// Process every group in order and return everything accumulated.
    pub async fn run(&self) -> MiningReport {
        let groups = &self.config.groups;
        info!(
            groups = groups.len(),
            workers = self.config.workers,
            base_dir = %self.config.base_dir.display(),
            "Mining run started"
        );

        if let Err(error) = self.cache.prepare(groups).await {
            warn!(error = %error, "Could not prepare cache directories");
        }

        let mut reports = Vec::with_capacity(groups.len());
        let mut findings = Vec::new();

        for (index, group) in groups.iter().enumerate() {
            if self.cancel.is_cancelled() {
                info!(group = %group.key, "Cancelled before group started");
                reports.push(GroupReport::new(&group.key, &group.name));
                continue;
            }
            if index > 0 {
                self.pause(DelayKind::GroupPause).await;
            }

            let (report, group_findings) = self.process_group(group).await;
            findings.extend(group_findings);
            reports.push(report);
        }

        let report = MiningReport::new(&self.catalog, reports, findings, self.cancel.is_cancelled());
        info!(
            findings = report.findings.len(),
            documents = report.documents_with_findings(),
            skips = report.skips().count(),
            cancelled = report.cancelled,
            "Mining run finished"
        );
        report
    }

    /// Locate documents for every group without downloading them.
    pub async fn discover(&self) -> Vec<DiscoveredGroup> {
        let mut discovered = Vec::with_capacity(self.config.groups.len());

        for (index, group) in self.config.groups.iter().enumerate() {
            if self.cancel.is_cancelled() {
                break;
            }
            if index > 0 {
                self.pause(DelayKind::GroupPause).await;
            }
            let (pending, skips) = self.locate_group(group).await;
            discovered.push(DiscoveredGroup {
                key: group.key.clone(),
                name: group.name.clone(),
                documents: pending.into_iter().map(|p| (p.bucket, p.document)).collect(),
                skips,
            });
        }

        discovered
    }

    /// Extract and classify documents already on disk.
    ///
    /// Each top-level directory under `root` becomes a group named after
    /// it, so the cache layout `<group>/<bucket>/<file>` maps back to its
    /// groups. Files directly in `root` (or in its own bucket directories)
    /// belong to a group named after `root`. Dates come from file names
    /// and URLs are `file://` paths.
    pub async fn analyze_directory(&self, root: &Path) -> Result<MiningReport> {
        let root = tokio::fs::canonicalize(root).await?;
        let files = self.collect_local_documents(&root).await?;
        info!(root = %root.display(), documents = files.len(), "Analyzing local documents");

        let mut reports: Vec<GroupReport> = Vec::new();
        let mut findings = Vec::new();

        for path in files {
            if self.cancel.is_cancelled() {
                break;
            }
            let label = local_group_label(&root, &path);
            let bucket = local_bucket(&path);
            let index = match reports.iter().position(|r| r.key == label) {
                Some(index) => index,
                None => {
                    reports.push(GroupReport::new(&label, &label));
                    reports.len() - 1
                }
            };
            let report = &mut reports[index];

            let filename = path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default();
            let url = Url::from_file_path(&path)
                .map(|u| u.to_string())
                .unwrap_or_else(|_| path.display().to_string());
            let document = DocumentRef::new(url, filename.clone(), infer_date(&filename), filename);
            report.stats.documents_found += 1;

            let bytes = match tokio::fs::read(&path).await {
                Ok(bytes) => bytes,
                Err(error) => {
                    report.skips.push(unreadable(&path, &document.url, bucket, &error));
                    continue;
                }
            };
            let extraction = self.pipeline.extract_blocking(bytes).await;
            let meta = DocumentMeta::for_document(&report.name, &document);
            findings.extend(self.record_extraction(report, &meta, extraction));
        }

        for report in &mut reports {
            report.stats.skipped = report.skips.len();
            report.stage = GroupStage::Done;
        }
        Ok(MiningReport::new(&self.catalog, reports, findings, self.cancel.is_cancelled()))
    }

    /// Run one group through every stage.
    async fn process_group(&self, group: &SourceGroup) -> (GroupReport, Vec<Finding>) {
        let mut report = GroupReport::new(&group.key, &group.name);
        info!(group = %group.key, name = %group.name, "Group started");

        let (pending, listing_skips) = self.locate_group(group).await;
        report.stats.documents_found = pending.len();
        report.skips.extend(listing_skips);
        self.advance(&mut report, GroupStage::ListingFetched);

        let outcomes: Vec<DocumentOutcome> = stream::iter(pending)
            .map(|pending| self.fetch_and_extract(group, pending))
            .buffered(self.config.workers.max(1))
            .collect()
            .await;
        self.advance(&mut report, GroupStage::DocumentsFetched);

        let mut findings = Vec::new();
        for outcome in outcomes {
            match outcome {
                DocumentOutcome::Skipped(skip) => report.skips.push(skip),
                DocumentOutcome::Extracted {
                    pending,
                    downloaded,
                    extraction,
                } => {
                    if downloaded {
                        report.stats.downloaded += 1;
                    } else {
                        report.stats.cache_hits += 1;
                    }
                    let meta = DocumentMeta::for_document(&group.name, &pending.document);
                    findings.extend(self.record_extraction(&mut report, &meta, extraction));
                }
            }
        }
        report.stats.skipped = report.skips.len();
        self.advance(&mut report, GroupStage::Classified);

        self.advance(&mut report, GroupStage::Done);
        info!(
            group = %group.key,
            found = report.stats.documents_found,
            downloaded = report.stats.downloaded,
            cache_hits = report.stats.cache_hits,
            no_text = report.stats.no_text,
            skipped = report.stats.skipped,
            findings = report.stats.findings,
            "Group finished"
        );
        (report, findings)
    }

    /// Locate documents in the current and archive listings of a group.
    async fn locate_group(&self, group: &SourceGroup) -> (Vec<PendingDocument>, Vec<SkipRecord>) {
        let mut pending = Vec::new();
        let mut skips = Vec::new();

        for bucket in Bucket::ALL {
            let Some(listing_url) = group.listing_url(bucket) else {
                continue;
            };
            if self.cancel.is_cancelled() {
                skips.push(SkipRecord::listing(&FetchFailure::cancelled(listing_url), bucket));
                continue;
            }

            let located = tokio::select! {
                result = self.locator.locate(&self.engine, listing_url) => result,
                _ = self.cancel.cancelled() => Err(FetchFailure::cancelled(listing_url)),
            };

            match located {
                Ok(documents) => {
                    debug!(group = %group.key, bucket = %bucket, documents = documents.len(), "Listing parsed");
                    pending.extend(documents.into_iter().map(|document| PendingDocument {
                        bucket,
                        listing_url: listing_url.to_string(),
                        document,
                    }));
                }
                Err(failure) => {
                    warn!(
                        group = %group.key,
                        bucket = %bucket,
                        url = %failure.url,
                        status = ?failure.last_status,
                        "Listing unavailable"
                    );
                    skips.push(SkipRecord::listing(&failure, bucket));
                }
            }
        }

        (pending, skips)
    }

    /// Fetch (cache-aware) and extract one document.
    async fn fetch_and_extract(&self, group: &SourceGroup, pending: PendingDocument) -> DocumentOutcome {
        let url = pending.document.url.clone();
        if self.cancel.is_cancelled() {
            return DocumentOutcome::Skipped(SkipRecord::from_failure(
                &FetchFailure::cancelled(&url),
                pending.bucket,
            ));
        }

        let key = CacheKey::new(&group.key, pending.bucket, &pending.document.filename);
        let target = FetchTarget::document(&url).with_referer(&pending.listing_url);

        let fetched = tokio::select! {
            result = self.cache.get_or_fetch(&self.engine, key, &target) => result,
            _ = self.cancel.cancelled() => Err(FetchFailure::cancelled(&url)),
        };

        let cached = match fetched {
            Ok(cached) => cached,
            Err(failure) => {
                warn!(
                    group = %group.key,
                    url = %failure.url,
                    status = ?failure.last_status,
                    reason = ?failure.reason,
                    "Document fetch failed"
                );
                return DocumentOutcome::Skipped(SkipRecord::from_failure(&failure, pending.bucket));
            }
        };

        let bytes = match self.cache.read(&cached).await {
            Ok(bytes) => bytes,
            Err(error) => {
                return DocumentOutcome::Skipped(unreadable(&cached.path, &url, pending.bucket, &error));
            }
        };
        let extraction = self.pipeline.extract_blocking(bytes).await;

        DocumentOutcome::Extracted {
            pending,
            downloaded: cached.downloaded,
            extraction,
        }
    }

    /// Classify an extraction into the group report; returns its findings.
    fn record_extraction(&self, report: &mut GroupReport, meta: &DocumentMeta, extraction: Extraction) -> Vec<Finding> {
        if !extraction.has_text() {
            warn!(group = %report.key, url = %meta.url, "No text recoverable");
            report.stats.no_text += 1;
            report.no_text.push(meta.url.clone());
            return Vec::new();
        }

        report.stats.extracted += 1;
        let strategy = extraction.strategy().unwrap_or_default();
        let pages = extraction.into_pages();
        let findings = classify(&pages, meta, &self.catalog);
        report.stats.findings += findings.len();
        info!(
            group = %report.key,
            filename = %meta.filename,
            strategy,
            pages = pages.len(),
            findings = findings.len(),
            "Document classified"
        );
        findings
    }

    fn advance(&self, report: &mut GroupReport, stage: GroupStage) {
        debug!(group = %report.key, from = report.stage.as_str(), to = stage.as_str(), "Group stage");
        report.stage = stage;
    }

    /// Wait a pause unless cancelled first.
    async fn pause(&self, kind: DelayKind) {
        tokio::select! {
            _ = self.engine.delay().wait(kind) => {}
            _ = self.cancel.cancelled() => {}
        }
    }

    /// Every matching file under `root`, sorted by path.
    async fn collect_local_documents(&self, root: &Path) -> Result<Vec<PathBuf>> {
        let metadata = tokio::fs::metadata(root).await?;
        if !metadata.is_dir() {
            return Err(MinerError::Io(std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                format!("{} is not a directory", root.display()),
            )));
        }

        let mut files = Vec::new();
        let mut dirs = vec![root.to_path_buf()];
        while let Some(dir) = dirs.pop() {
            let mut entries = tokio::fs::read_dir(&dir).await?;
            while let Some(entry) = entries.next_entry().await? {
                let path = entry.path();
                let file_type = entry.file_type().await?;
                if file_type.is_dir() {
                    dirs.push(path);
                } else if file_type.is_file()
                    && path
                        .file_name()
                        .is_some_and(|n| self.locator.matches(&n.to_string_lossy()))
                {
                    files.push(path);
                }
            }
        }
        files.sort();
        Ok(files)
    }
}

/// A stored file that could not be read back is skipped like a failed fetch.
fn unreadable(path: &Path, url: &str, bucket: Bucket, error: &std::io::Error) -> SkipRecord {
    warn!(path = %path.display(), error = %error, "Cached document unreadable");
    SkipRecord::from_failure(&FetchFailure::cache_read(url, error), bucket)
}

/// Group label for a local file: its first directory under `root`,
/// or `root`'s own name when that directory is missing or is a bucket.
fn local_group_label(root: &Path, path: &Path) -> String {
    path.strip_prefix(root)
        .ok()
        .and_then(Path::parent)
        .and_then(|dir| dir.components().next())
        .map(|c| c.as_os_str().to_string_lossy().into_owned())
        .filter(|name| Bucket::from_dir_name(name).is_none())
        .or_else(|| root.file_name().map(|n| n.to_string_lossy().into_owned()))
        .unwrap_or_else(|| "local".to_string())
}

/// Bucket a local file sits in; files outside a bucket directory count as current.
fn local_bucket(path: &Path) -> Bucket {
    path.parent()
        .and_then(Path::file_name)
        .and_then(|n| Bucket::from_dir_name(&n.to_string_lossy()))
        .unwrap_or(Bucket::Current)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classify::default_catalog_spec;
    use crate::fetch::delay::NoDelay;
    use crate::testing::{listing_html, MockTransport, PlainTextStrategy, RecordingDelay};
    use crate::traits::extractor::{ExtractionStrategy, StrategyOutcome};
    use crate::types::finding::SkipReason;

    const CURRENT: &str = "https://county.example.gov/highway/";
    const ARCHIVE: &str = "https://county.example.gov/highway/archive/";

    fn config(dir: &Path) -> MinerConfig {
        MinerConfig::new(vec![SourceGroup::new("highway", "Highway Committee")
            .with_current(CURRENT)
            .with_archive(ARCHIVE)])
        .with_base_dir(dir)
        .without_delays()
    }

    fn catalog() -> PatternCatalog {
        PatternCatalog::compile(&default_catalog_spec()).unwrap()
    }

    fn plain_pipeline() -> ExtractionPipeline {
        ExtractionPipeline::new(vec![Arc::new(PlainTextStrategy)])
    }

    const MINUTES: &str =
        "Minutes: the Highway Department received a complaint about a trailer removal incident near the shop.";

    #[tokio::test]
    async fn test_group_walks_both_buckets() {
        let dir = tempfile::tempdir().unwrap();
        let mock = MockTransport::new()
            .with_page(CURRENT, listing_html(&[("/docs/minutes-01-05-2024.pdf", "Jan 5 Minutes")]))
            .with_page(ARCHIVE, listing_html(&[("/docs/old.pdf", "March 3, 2019")]))
            .with_page("https://county.example.gov/docs/minutes-01-05-2024.pdf", MINUTES)
            .with_status("https://county.example.gov/docs/old.pdf", 403);

        let coordinator = MiningCoordinator::new(config(dir.path()), catalog(), mock.clone(), NoDelay, plain_pipeline());
        let report = coordinator.run().await;

        let group = report.group("highway").unwrap();
        assert_eq!(group.stage, GroupStage::Done);
        assert_eq!(group.stats.documents_found, 2);
        assert_eq!(group.stats.downloaded, 1);
        assert_eq!(group.skips.len(), 1);
        assert_eq!(group.skips[0].last_status, Some(403));
        assert_eq!(group.skips[0].bucket, Bucket::Archive);
        assert_eq!(group.skips[0].reason, SkipReason::FetchFailed);

        assert!(report
            .findings
            .iter()
            .any(|f| f.pattern == r"\btrailer\s+removal\b" && f.date == "01-05-2024"));
        assert!(dir.path().join("highway/current/minutes-01-05-2024.pdf").is_file());
        assert!(dir.path().join("highway/archive").is_dir());

        let doc_request = &mock.requests_for("https://county.example.gov/docs/minutes-01-05-2024.pdf")[0];
        assert_eq!(doc_request.header("Referer"), Some(CURRENT));
    }

    #[tokio::test]
    async fn test_no_text_is_not_a_skip() {
        let dir = tempfile::tempdir().unwrap();
        let mock = MockTransport::new()
            .with_page(CURRENT, listing_html(&[("/docs/scan.pdf", "Scan")]))
            .with_page("https://county.example.gov/docs/scan.pdf", "tiny");

        let coordinator = MiningCoordinator::new(config(dir.path()), catalog(), mock, NoDelay, plain_pipeline());
        let report = coordinator.run().await;

        let group = report.group("highway").unwrap();
        assert_eq!(group.stats.no_text, 1);
        assert_eq!(group.no_text, vec!["https://county.example.gov/docs/scan.pdf".to_string()]);
        // Only the archive listing (unscripted, 404) is skipped.
        assert_eq!(group.skips.len(), 1);
        assert_eq!(group.skips[0].reason, SkipReason::ListingUnavailable);
        assert!(report.findings.is_empty());
    }

    #[tokio::test]
    async fn test_group_pause_between_groups_only() {
        let dir = tempfile::tempdir().unwrap();
        let groups = vec![
            SourceGroup::new("a", "A").with_current("https://a.example.gov/"),
            SourceGroup::new("b", "B").with_current("https://b.example.gov/"),
            SourceGroup::new("c", "C").with_current("https://c.example.gov/"),
        ];
        let config = MinerConfig::new(groups).with_base_dir(dir.path()).with_max_attempts(1);
        let delay = RecordingDelay::new();

        let coordinator = MiningCoordinator::new(config, catalog(), MockTransport::new(), delay.clone(), plain_pipeline());
        coordinator.run().await;

        assert_eq!(delay.count(DelayKind::GroupPause), 2);
        assert_eq!(delay.count(DelayKind::Listing), 3);
    }

    #[tokio::test]
    async fn test_cancelled_run_fetches_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let mock = MockTransport::new().with_page(CURRENT, listing_html(&[("/docs/a.pdf", "A")]));
        let coordinator = MiningCoordinator::new(config(dir.path()), catalog(), mock.clone(), NoDelay, plain_pipeline());

        coordinator.cancellation_token().cancel();
        let report = coordinator.run().await;

        assert!(report.cancelled);
        assert_eq!(mock.request_count(), 0);
        assert_eq!(report.group("highway").unwrap().stage, GroupStage::Pending);
    }

    #[tokio::test]
    async fn test_discover_lists_without_downloading() {
        let dir = tempfile::tempdir().unwrap();
        let mock = MockTransport::new()
            .with_page(CURRENT, listing_html(&[("/docs/a.pdf", "A"), ("/docs/b.pdf", "B")]))
            .with_status(ARCHIVE, 403);

        let coordinator = MiningCoordinator::new(config(dir.path()), catalog(), mock.clone(), NoDelay, plain_pipeline());
        let discovered = coordinator.discover().await;

        assert_eq!(discovered.len(), 1);
        assert_eq!(discovered[0].documents.len(), 2);
        assert_eq!(discovered[0].skips[0].last_status, Some(403));
        assert_eq!(mock.count_for("https://county.example.gov/docs/a.pdf"), 0);
    }

    #[tokio::test]
    async fn test_analyze_directory_groups_by_folder() {
        let dir = tempfile::tempdir().unwrap();
        let highway = dir.path().join("highway");
        let finance = dir.path().join("finance");
        std::fs::create_dir_all(&highway).unwrap();
        std::fs::create_dir_all(&finance).unwrap();
        std::fs::write(highway.join("minutes-02-06-2024.PDF"), MINUTES).unwrap();
        std::fs::write(highway.join("notes.txt"), MINUTES).unwrap();
        std::fs::write(finance.join("budget.pdf"), "short").unwrap();

        let coordinator = MiningCoordinator::new(
            config(dir.path()),
            catalog(),
            MockTransport::new(),
            NoDelay,
            plain_pipeline(),
        );
        let report = coordinator.analyze_directory(dir.path()).await.unwrap();

        let names: Vec<_> = report.groups.iter().map(|g| g.name.as_str()).collect();
        assert_eq!(names, vec!["finance", "highway"]);
        assert_eq!(report.group("finance").unwrap().stats.no_text, 1);
        assert_eq!(report.group("highway").unwrap().stats.cache_hits, 0);

        let finding = report
            .findings
            .iter()
            .find(|f| f.pattern == r"\btrailer\s+removal\b")
            .unwrap();
        assert_eq!(finding.group, "highway");
        assert_eq!(finding.date, "02-06-2024");
        assert!(finding.url.starts_with("file://"));
    }

    #[tokio::test]
    async fn test_analyze_directory_reads_cache_layout() {
        let dir = tempfile::tempdir().unwrap();
        for (group, bucket, file) in [
            ("highway", "current", "highway-01-05-2024.pdf"),
            ("highway", "archive", "highway-03-03-2019.pdf"),
            ("finance", "current", "finance-02-06-2024.pdf"),
        ] {
            let folder = dir.path().join(group).join(bucket);
            std::fs::create_dir_all(&folder).unwrap();
            std::fs::write(folder.join(file), MINUTES).unwrap();
        }

        let coordinator = MiningCoordinator::new(
            config(dir.path()),
            catalog(),
            MockTransport::new(),
            NoDelay,
            plain_pipeline(),
        );
        let report = coordinator.analyze_directory(dir.path()).await.unwrap();

        let names: Vec<_> = report.groups.iter().map(|g| g.name.as_str()).collect();
        assert_eq!(names, vec!["finance", "highway"]);
        assert_eq!(report.group("highway").unwrap().stats.documents_found, 2);
        assert_eq!(report.findings_for("finance").count(), report.findings_for("highway").count() / 2);
        assert!(report.findings.iter().all(|f| f.group == "finance" || f.group == "highway"));

        // Pointing at one group's directory keeps its name.
        let single = coordinator
            .analyze_directory(&dir.path().join("highway"))
            .await
            .unwrap();
        let names: Vec<_> = single.groups.iter().map(|g| g.name.as_str()).collect();
        assert_eq!(names, vec!["highway"]);
    }

    #[test]
    fn test_local_labels_and_buckets() {
        let root = Path::new("/data/minutes");
        let label = |p: &str| local_group_label(root, &root.join(p));
        assert_eq!(label("highway/current/a.pdf"), "highway");
        assert_eq!(label("highway/a.pdf"), "highway");
        assert_eq!(label("a.pdf"), "minutes");
        assert_eq!(label("archive/a.pdf"), "minutes");

        assert_eq!(local_bucket(&root.join("highway/archive/a.pdf")), Bucket::Archive);
        assert_eq!(local_bucket(&root.join("highway/a.pdf")), Bucket::Current);
    }

    /// Cancels the run from inside extraction, then reads the document as text.
    struct CancelDuringExtract {
        cancel: CancellationToken,
    }

    impl ExtractionStrategy for CancelDuringExtract {
        fn name(&self) -> &'static str {
            "cancel_during_extract"
        }

        fn extract(&self, document: &[u8]) -> StrategyOutcome {
            self.cancel.cancel();
            PlainTextStrategy.extract(document)
        }
    }

    #[tokio::test]
    async fn test_cancel_mid_run_records_in_flight_document() {
        let dir = tempfile::tempdir().unwrap();
        let doc_a = "https://county.example.gov/docs/a.pdf";
        let doc_b = "https://county.example.gov/docs/b.pdf";
        let mock = MockTransport::new()
            .with_page(CURRENT, listing_html(&[("/docs/a.pdf", "A"), ("/docs/b.pdf", "B")]))
            .with_page(doc_a, MINUTES)
            .with_page(doc_b, MINUTES);

        let cancel = CancellationToken::new();
        let pipeline = ExtractionPipeline::new(vec![Arc::new(CancelDuringExtract {
            cancel: cancel.clone(),
        })]);
        let config = MinerConfig::new(vec![SourceGroup::new("highway", "Highway Committee").with_current(CURRENT)])
            .with_base_dir(dir.path())
            .without_delays()
            .with_workers(1);
        let coordinator =
            MiningCoordinator::new(config, catalog(), mock.clone(), NoDelay, pipeline).with_cancellation(cancel);

        let report = coordinator.run().await;

        assert!(report.cancelled);
        assert!(!report.findings.is_empty());
        assert!(report.findings.iter().all(|f| f.filename == "a.pdf"));

        let group = report.group("highway").unwrap();
        assert_eq!(group.stage, GroupStage::Done);
        assert_eq!(group.stats.extracted, 1);
        assert_eq!(group.skips.len(), 1);
        assert_eq!(group.skips[0].url, doc_b);
        assert_eq!(group.skips[0].reason, SkipReason::Cancelled);
        assert_eq!(mock.count_for(doc_b), 0);
    }

    #[test]
    fn test_unreadable_file_is_skip() {
        let error = std::io::Error::from(std::io::ErrorKind::PermissionDenied);
        let skip = unreadable(
            Path::new("/cache/highway/archive/a.pdf"),
            "https://county.example.gov/docs/a.pdf",
            Bucket::Archive,
            &error,
        );
        assert_eq!(skip.reason, SkipReason::CacheRead);
        assert_eq!(skip.bucket, Bucket::Archive);
        assert_eq!(skip.last_status, None);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_unreadable_cached_file_is_skipped_not_no_text() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let doc = "https://county.example.gov/docs/locked.pdf";
        let cached = dir.path().join("highway/current/locked.pdf");
        std::fs::create_dir_all(cached.parent().unwrap()).unwrap();
        std::fs::write(&cached, MINUTES).unwrap();
        std::fs::set_permissions(&cached, std::fs::Permissions::from_mode(0o000)).unwrap();
        if std::fs::read(&cached).is_ok() {
            // Privileged users bypass file modes; nothing to observe here.
            return;
        }

        let mock = MockTransport::new()
            .with_page(CURRENT, listing_html(&[("/docs/locked.pdf", "Locked")]))
            .with_page(doc, MINUTES);
        let coordinator = MiningCoordinator::new(config(dir.path()), catalog(), mock.clone(), NoDelay, plain_pipeline());
        let report = coordinator.run().await;

        let group = report.group("highway").unwrap();
        assert_eq!(group.stats.no_text, 0);
        assert_eq!(mock.count_for(doc), 0);
        let skip = group.skips.iter().find(|s| s.url == doc).unwrap();
        assert_eq!(skip.reason, SkipReason::CacheRead);
    }

    #[tokio::test]
    async fn test_analyze_directory_rejects_file() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("a.pdf");
        std::fs::write(&file, "x").unwrap();

        let coordinator = MiningCoordinator::new(config(dir.path()), catalog(), MockTransport::new(), NoDelay, plain_pipeline());
        assert!(coordinator.analyze_directory(&file).await.is_err());
    }
}
