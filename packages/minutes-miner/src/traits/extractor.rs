//! Extraction strategy trait and its explicit outcome variants.

use crate::types::document::ExtractedPage;

/// Result of running one strategy over one document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StrategyOutcome {
    /// At least one page passed the retention threshold
    Pages(Vec<ExtractedPage>),
    /// The strategy ran cleanly but retained nothing
    Empty,
    /// The strategy could not process the document at all
    Failed(String),
}

impl StrategyOutcome {
    /// `Pages` with an empty vec collapses to `Empty`.
    pub fn from_pages(pages: Vec<ExtractedPage>) -> Self {
        if pages.is_empty() {
            StrategyOutcome::Empty
        } else {
            StrategyOutcome::Pages(pages)
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            StrategyOutcome::Pages(_) => "pages",
            StrategyOutcome::Empty => "empty",
            StrategyOutcome::Failed(_) => "failed",
        }
    }
}

/// One way of turning document bytes into pages.
///
/// Implementations are synchronous and CPU-bound; the pipeline runs
/// them on the blocking pool. A failure on one page must be logged and
/// skipped, not turned into `Failed` for the whole document.
pub trait ExtractionStrategy: Send + Sync {
    /// Strategy name for logging and reports.
    fn name(&self) -> &'static str;

    /// True for strategies that read rendered images rather than a text layer.
    fn is_ocr(&self) -> bool {
        false
    }

    fn extract(&self, document: &[u8]) -> StrategyOutcome;
}
