//! Ordered fallback over extraction strategies.
//!
//! Strategies run in order; the first to retain at least one page wins
//! and the rest are never invoked. A document that no strategy could
//! read is `NoText`, which is distinct from a fetch failure.

use std::sync::Arc;
use tracing::{debug, info, warn};

use super::lopdf_text::LopdfTextStrategy;
use super::ocr::OcrStrategy;
use super::pdf_text::PdfTextStrategy;
use crate::traits::extractor::{ExtractionStrategy, StrategyOutcome};
use crate::types::document::ExtractedPage;

/// What one strategy produced during a pipeline run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StrategyAttempt {
    pub strategy: &'static str,

    /// `pages`, `empty`, or `failed`
    pub outcome: &'static str,

    /// Failure message when the outcome is `failed`
    pub detail: Option<String>,
}

/// Result of extracting one document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Extraction {
    /// Some strategy retained pages
    Text {
        strategy: &'static str,
        pages: Vec<ExtractedPage>,
        attempts: Vec<StrategyAttempt>,
    },
    /// Every strategy ran and none retained a page
    NoText { attempts: Vec<StrategyAttempt> },
}

impl Extraction {
    /// Retained pages; empty for `NoText`.
    pub fn pages(&self) -> &[ExtractedPage] {
        match self {
            Extraction::Text { pages, .. } => pages,
            Extraction::NoText { .. } => &[],
        }
    }

    pub fn into_pages(self) -> Vec<ExtractedPage> {
        match self {
            Extraction::Text { pages, .. } => pages,
            Extraction::NoText { .. } => Vec::new(),
        }
    }

    /// Name of the strategy that produced the pages.
    pub fn strategy(&self) -> Option<&'static str> {
        match self {
            Extraction::Text { strategy, .. } => Some(*strategy),
            Extraction::NoText { .. } => None,
        }
    }

    pub fn attempts(&self) -> &[StrategyAttempt] {
        match self {
            Extraction::Text { attempts, .. } | Extraction::NoText { attempts } => attempts,
        }
    }

    pub fn has_text(&self) -> bool {
        matches!(self, Extraction::Text { .. })
    }
}

/// Strategies in fallback order.
#[derive(Clone)]
pub struct ExtractionPipeline {
    strategies: Vec<Arc<dyn ExtractionStrategy>>,
}

impl ExtractionPipeline {
    pub fn new(strategies: Vec<Arc<dyn ExtractionStrategy>>) -> Self {
        Self { strategies }
    }

    /// Primary text layer, secondary text layer, then OCR.
    pub fn standard() -> Self {
        Self::new(vec![
            Arc::new(PdfTextStrategy),
            Arc::new(LopdfTextStrategy),
            Arc::new(OcrStrategy::default()),
        ])
    }

    /// Strategy names in order.
    pub fn strategy_names(&self) -> Vec<&'static str> {
        self.strategies.iter().map(|s| s.name()).collect()
    }

    /// Run the fallback chain over one document.
    pub fn extract(&self, document: &[u8]) -> Extraction {
        let mut attempts = Vec::with_capacity(self.strategies.len());

        for (index, strategy) in self.strategies.iter().enumerate() {
            if index > 0 {
                if strategy.is_ocr() {
                    info!(strategy = strategy.name(), "No text layer recovered, falling back to OCR");
                } else {
                    debug!(strategy = strategy.name(), "Falling back to next strategy");
                }
            }

            let outcome = strategy.extract(document);
            let detail = match &outcome {
                StrategyOutcome::Failed(reason) => {
                    warn!(strategy = strategy.name(), reason = %reason, "Extraction strategy failed");
                    Some(reason.clone())
                }
                _ => None,
            };
            attempts.push(StrategyAttempt {
                strategy: strategy.name(),
                outcome: outcome.label(),
                detail,
            });

            if let StrategyOutcome::Pages(pages) = outcome {
                debug!(strategy = strategy.name(), pages = pages.len(), "Text recovered");
                return Extraction::Text {
                    strategy: strategy.name(),
                    pages,
                    attempts,
                };
            }
        }

        Extraction::NoText { attempts }
    }

    /// Run `extract` on the blocking pool.
    ///
    /// A panic inside a strategy is reported as `NoText` for this
    /// document only.
    pub async fn extract_blocking(self: &Arc<Self>, document: Vec<u8>) -> Extraction {
        let pipeline = Arc::clone(self);
        match tokio::task::spawn_blocking(move || pipeline.extract(&document)).await {
            Ok(extraction) => extraction,
            Err(error) => {
                warn!(error = %error, "Extraction task aborted");
                Extraction::NoText {
                    attempts: vec![StrategyAttempt {
                        strategy: "pipeline",
                        outcome: "failed",
                        detail: Some(error.to_string()),
                    }],
                }
            }
        }
    }
}
