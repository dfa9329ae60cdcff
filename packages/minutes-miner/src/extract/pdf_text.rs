//! Primary text-layer extraction via `pdf-extract`.
//!
//! Handles layout-heavy documents well but is strict about structure:
//! malformed pages error out or panic inside the parser. The document is
//! loaded once and rendered page by page, so a bad page is logged and
//! skipped while the rest are kept. Only a document that cannot be
//! loaded at all is `Failed`.

use lopdf::Document;
use pdf_extract::{output_doc_page, OutputError, PlainTextOutput};
use std::panic::{self, AssertUnwindSafe};
use tracing::{debug, warn};

use crate::traits::extractor::{ExtractionStrategy, StrategyOutcome};
use crate::types::document::ExtractedPage;

#[derive(Debug, Clone, Copy, Default)]
pub struct PdfTextStrategy;

impl PdfTextStrategy {
    /// Render one page's text layer, containing parser panics.
    fn page_text(doc: &Document, number: u32) -> Result<String, String> {
        let result = panic::catch_unwind(AssertUnwindSafe(|| {
            let mut text = String::new();
            {
                let mut output = PlainTextOutput::new(&mut text);
                output_doc_page(doc, &mut output, number)?;
            }
            Ok::<_, OutputError>(text)
        }));

        match result {
            Ok(Ok(text)) => Ok(text),
            Ok(Err(error)) => Err(error.to_string()),
            Err(_) => Err("parser panicked".to_string()),
        }
    }
}

impl ExtractionStrategy for PdfTextStrategy {
    fn name(&self) -> &'static str {
        "pdf_extract"
    }

    fn extract(&self, document: &[u8]) -> StrategyOutcome {
        let doc = match panic::catch_unwind(AssertUnwindSafe(|| Document::load_mem(document))) {
            Ok(Ok(doc)) => doc,
            Ok(Err(error)) => return StrategyOutcome::Failed(error.to_string()),
            Err(_) => return StrategyOutcome::Failed("parser panicked".to_string()),
        };

        let numbers: Vec<u32> = doc.get_pages().keys().copied().collect();
        let mut pages = Vec::new();

        for number in &numbers {
            match Self::page_text(&doc, *number) {
                Ok(text) => pages.extend(ExtractedPage::retain(*number, text)),
                Err(reason) => {
                    warn!(strategy = self.name(), page = number, reason = %reason, "Page extraction failed, skipping");
                }
            }
        }

        debug!(strategy = self.name(), total = numbers.len(), retained = pages.len(), "Text layer read");
        StrategyOutcome::from_pages(pages)
    }
}
