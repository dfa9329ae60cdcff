//! Secondary text-layer extraction via `lopdf`.
//!
//! More tolerant of odd structure than the primary reader, and reads one
//! page at a time, so a page whose content stream is broken is skipped
//! without losing the rest.

use lopdf::Document;
use tracing::{debug, warn};

use crate::traits::extractor::{ExtractionStrategy, StrategyOutcome};
use crate::types::document::ExtractedPage;

#[derive(Debug, Clone, Copy, Default)]
pub struct LopdfTextStrategy;

impl ExtractionStrategy for LopdfTextStrategy {
    fn name(&self) -> &'static str {
        "lopdf"
    }

    fn extract(&self, document: &[u8]) -> StrategyOutcome {
        let doc = match Document::load_mem(document) {
            Ok(doc) => doc,
            Err(error) => return StrategyOutcome::Failed(error.to_string()),
        };

        let numbers: Vec<u32> = doc.get_pages().keys().copied().collect();
        let mut pages = Vec::new();

        for number in &numbers {
            match doc.extract_text(&[*number]) {
                Ok(text) => pages.extend(ExtractedPage::retain(*number, text)),
                Err(error) => {
                    warn!(strategy = self.name(), page = number, error = %error, "Page extraction failed, skipping");
                }
            }
        }

        debug!(strategy = self.name(), total = numbers.len(), retained = pages.len(), "Text layer read");
        StrategyOutcome::from_pages(pages)
    }
}
