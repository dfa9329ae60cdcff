//! Keyword classification over extracted pages.
//!
//! Output order is fixed: page, then tier, then pattern within the tier,
//! then match start offset. Overlapping matches from different patterns
//! are all kept.

use tracing::debug;

use super::catalog::PatternCatalog;
use crate::types::document::{DocumentMeta, ExtractedPage};
use crate::types::finding::Finding;

/// Characters of context taken on each side of a match.
pub const CONTEXT_CHARS: usize = 300;

/// Scan every page against every pattern and emit one finding per match.
pub fn classify(pages: &[ExtractedPage], meta: &DocumentMeta, catalog: &PatternCatalog) -> Vec<Finding> {
    let mut findings = Vec::new();

    for page in pages {
        let before = findings.len();
        for tier in catalog.tiers() {
            for pattern in &tier.patterns {
                for m in pattern.regex.find_iter(&page.text) {
                    findings.push(Finding {
                        group: meta.group_name.clone(),
                        filename: meta.filename.clone(),
                        date: meta.date.clone(),
                        page: page.number,
                        tier: tier.name.clone(),
                        pattern: pattern.source.clone(),
                        matched_text: m.as_str().to_string(),
                        context: context_window(&page.text, m.start(), m.end(), CONTEXT_CHARS),
                        url: meta.url.clone(),
                    });
                }
            }
        }

        let found = findings.len() - before;
        if found > 0 {
            debug!(filename = %meta.filename, page = page.number, findings = found, "Findings on page");
        }
    }

    findings
}

/// Text from `radius` characters before `start` to `radius` characters
/// after `end`, clipped to the page, with whitespace runs collapsed.
///
/// `start` and `end` are byte offsets on char boundaries.
pub fn context_window(text: &str, start: usize, end: usize, radius: usize) -> String {
    let from = if radius == 0 {
        start
    } else {
        text[..start]
            .char_indices()
            .rev()
            .nth(radius - 1)
            .map_or(0, |(i, _)| i)
    };
    let to = text[end..]
        .char_indices()
        .nth(radius)
        .map_or(text.len(), |(i, _)| end + i);

    text[from..to].split_whitespace().collect::<Vec<_>>().join(" ")
}
