//! End-to-end runs of the mining coordinator against scripted hosts.

use std::sync::Arc;

use minutes_miner::testing::{listing_html, MockReply, MockTransport, PlainTextStrategy};
use minutes_miner::{
    default_catalog_spec, Bucket, ExtractionPipeline, ExtractionStrategy, GroupStage, MinerConfig,
    MiningCoordinator, NoDelay, PatternCatalog, SkipReason, SourceGroup,
};

const A_CURRENT: &str = "https://a.example.gov/committee/";
const A_ARCHIVE: &str = "https://a.example.gov/committee/archive/";
const B_CURRENT: &str = "https://b.example.gov/highway/";
const B_DOC_1: &str = "https://b.example.gov/docs/minutes-01-05-2024.pdf";
const B_DOC_2: &str = "https://b.example.gov/docs/minutes-02-02-2024.pdf";

const TRAILER_PAGE: &str =
    "...the Highway Department received a complaint about a trailer removal incident...";
const ETHICS_PAGE: &str =
    "Members reviewed the schedule for ethics training and the employee handbook revisions.";

fn groups() -> Vec<SourceGroup> {
    vec![
        SourceGroup::new("poisoned", "Poisoned Committee")
            .with_current(A_CURRENT)
            .with_archive(A_ARCHIVE),
        SourceGroup::new("highway", "Highway Committee").with_current(B_CURRENT),
    ]
}

fn healthy_b(mock: MockTransport) -> MockTransport {
    mock.with_page(
        B_CURRENT,
        listing_html(&[
            ("/docs/minutes-01-05-2024.pdf", "Jan 5 Minutes"),
            ("/docs/minutes-02-02-2024.pdf", "Feb 2 Minutes"),
        ]),
    )
    .with_page(B_DOC_1, TRAILER_PAGE)
    .with_page(B_DOC_2, format!("Roll call and approval of agenda items for the evening.\u{c}{ETHICS_PAGE}"))
}

fn coordinator(
    config: MinerConfig,
    mock: MockTransport,
) -> MiningCoordinator<MockTransport, NoDelay> {
    let catalog = PatternCatalog::compile(&config.catalog).unwrap();
    let pipeline = ExtractionPipeline::new(vec![Arc::new(PlainTextStrategy) as Arc<dyn ExtractionStrategy>]);
    MiningCoordinator::new(config, catalog, mock, NoDelay, pipeline)
}

#[tokio::test]
async fn poisoned_group_does_not_stop_later_groups() {
    let dir = tempfile::tempdir().unwrap();
    let mock = healthy_b(
        MockTransport::new()
            .with_status(A_CURRENT, 403)
            .with_script(A_ARCHIVE, vec![MockReply::timeout(A_ARCHIVE)]),
    );
    let config = MinerConfig::new(groups()).with_base_dir(dir.path()).without_delays();

    let report = coordinator(config, mock.clone()).run().await;

    let poisoned = report.group("poisoned").unwrap();
    assert_eq!(poisoned.stage, GroupStage::Done);
    assert_eq!(poisoned.stats.documents_found, 0);
    assert_eq!(poisoned.skips.len(), 2);
    assert!(poisoned.skips.iter().all(|s| s.reason == SkipReason::ListingUnavailable));
    assert_eq!(poisoned.skips[0].bucket, Bucket::Current);
    assert_eq!(poisoned.skips[0].last_status, Some(403));
    assert_eq!(poisoned.skips[1].last_status, None);
    assert_eq!(mock.count_for(A_CURRENT), 3);

    let highway = report.group("highway").unwrap();
    assert_eq!(highway.stats.documents_found, 2);
    assert_eq!(highway.stats.downloaded, 2);
    assert!(highway.skips.is_empty());

    let trailer = report
        .findings
        .iter()
        .find(|f| f.pattern == r"\btrailer\s+removal\b")
        .expect("trailer removal finding");
    assert_eq!(trailer.tier, "priority_1");
    assert_eq!(trailer.group, "Highway Committee");
    assert_eq!(trailer.filename, "minutes-01-05-2024.pdf");
    assert_eq!(trailer.date, "01-05-2024");
    assert_eq!(trailer.url, B_DOC_1);

    let ethics = report
        .findings
        .iter()
        .find(|f| f.pattern == r"\bethics\s+training\b")
        .expect("ethics training finding");
    assert_eq!(ethics.page, 2);
    assert_eq!(ethics.date, "02-02-2024");

    assert!(report.findings.iter().all(|f| f.group == "Highway Committee"));
    assert!(report.tier_count("priority_1") >= 2);
}

#[tokio::test]
async fn total_fetch_failure_still_completes() {
    let dir = tempfile::tempdir().unwrap();
    let config = MinerConfig::new(groups())
        .with_base_dir(dir.path())
        .without_delays()
        .with_max_attempts(2);

    let report = coordinator(config, MockTransport::new()).run().await;

    assert!(report.findings.is_empty());
    assert_eq!(report.skips().count(), 3);
    assert!(report.groups.iter().all(|g| g.stage == GroupStage::Done));
}

#[tokio::test]
async fn second_run_is_served_from_cache() {
    let dir = tempfile::tempdir().unwrap();
    let config = MinerConfig::new(vec![groups().remove(1)])
        .with_base_dir(dir.path())
        .without_delays();

    let first_mock = healthy_b(MockTransport::new());
    let first = coordinator(config.clone(), first_mock.clone()).run().await;

    let second_mock = healthy_b(MockTransport::new());
    let second = coordinator(config, second_mock.clone()).run().await;

    assert_eq!(first_mock.count_for(B_DOC_1), 1);
    assert_eq!(second_mock.count_for(B_DOC_1), 0);
    assert_eq!(second_mock.count_for(B_DOC_2), 0);
    assert_eq!(second_mock.count_for(B_CURRENT), 1);

    let stats = &second.group("highway").unwrap().stats;
    assert_eq!(stats.cache_hits, 2);
    assert_eq!(stats.downloaded, 0);

    // Same input, same findings in the same order.
    assert_eq!(first.findings, second.findings);
}

#[tokio::test]
async fn concurrent_workers_keep_listing_order() {
    let dir = tempfile::tempdir().unwrap();
    let links: Vec<(String, String)> = (1..=8)
        .map(|i| (format!("/docs/m{i}.pdf"), format!("Meeting {i}")))
        .collect();
    let borrowed: Vec<(&str, &str)> = links.iter().map(|(h, t)| (h.as_str(), t.as_str())).collect();

    let mut mock = MockTransport::new().with_page(B_CURRENT, listing_html(&borrowed));
    for i in 1..=8 {
        mock = mock.with_page(
            format!("https://b.example.gov/docs/m{i}.pdf"),
            format!("Item {i}: discussion of the trailer removal request from residents on Main Street."),
        );
    }

    let config = MinerConfig::new(vec![groups().remove(1)])
        .with_base_dir(dir.path())
        .without_delays()
        .with_workers(4);
    let report = coordinator(config, mock).run().await;

    let files: Vec<_> = report
        .findings
        .iter()
        .filter(|f| f.pattern == r"\btrailer\s+removal\b")
        .map(|f| f.filename.clone())
        .collect();
    let expected: Vec<_> = (1..=8).map(|i| format!("m{i}.pdf")).collect();
    assert_eq!(files, expected);
}

#[test]
fn default_config_carries_builtin_catalog() {
    let config = MinerConfig::default();
    let catalog = PatternCatalog::compile(&config.catalog).unwrap();
    assert_eq!(catalog.tiers().len(), default_catalog_spec().tiers.len());
    assert_eq!(config.groups.len(), 7);
}
