//! Public Meeting Document Miner
//!
//! Retrieves meeting documents posted on committee listing pages, recovers
//! their text, and classifies passages against a tiered keyword catalog.
//!
//! # Design Philosophy
//!
//! - Never abort a run because one host or document is hostile
//! - Download once; the on-disk cache makes every run re-runnable
//! - Deterministic output for identical input
//! - Network, clock, and extractors sit behind traits for testing
//!
//! # Usage
//!
//! ```rust,ignore
//! use minutes_miner::{
//!     ExtractionPipeline, JitterDelay, MinerConfig, MiningCoordinator,
//!     PatternCatalog, ReqwestTransport,
//! };
//!
//! let config = MinerConfig::from_env()?;
//! let catalog = PatternCatalog::compile(&config.catalog)?;
//! let delay = JitterDelay::new(config.delays.clone());
//!
//! let coordinator = MiningCoordinator::new(
//!     config,
//!     catalog,
//!     ReqwestTransport::new()?,
//!     delay,
//!     ExtractionPipeline::standard(),
//! );
//! let report = coordinator.run().await;
//! report.write_json("results".as_ref()).await?;
//! ```
//!
//! # Modules
//!
//! - [`traits`] - Core trait abstractions (Transport, Delay, ExtractionStrategy, OCR)
//! - [`types`] - Configuration, documents, findings
//! - [`locator`] - Document links from listing HTML
//! - [`fetch`] - Retrying fetch engine, document cache, reqwest transport
//! - [`extract`] - Text extraction strategies and their fallback pipeline
//! - [`classify`] - Pattern catalog and keyword classification
//! - [`pipeline`] - Mining coordinator and run report
//! - [`testing`] - Mock implementations for testing

pub mod classify;
pub mod error;
pub mod extract;
pub mod fetch;
pub mod locator;
pub mod pipeline;
pub mod testing;
pub mod traits;
pub mod types;

// Re-export core types at crate root
pub use classify::{classify, default_catalog_spec, PatternCatalog};
pub use error::{
    CatalogError, ConfigError, FailureReason, FetchFailure, MinerError, OcrError, Result,
    TransportError,
};
pub use extract::{Extraction, ExtractionPipeline};
pub use fetch::{DocumentCache, FetchEngine, FetchTarget, JitterDelay, NoDelay, ReqwestTransport};
pub use locator::DocumentLocator;
pub use pipeline::{DiscoveredGroup, GroupReport, GroupStage, MiningCoordinator, MiningReport};
pub use traits::{
    delay::{Delay, DelayKind},
    extractor::{ExtractionStrategy, StrategyOutcome},
    ocr::{PageRenderer, TextRecognizer},
    transport::{FetchRequest, FetchResponse, ResourceKind, Transport},
};
pub use types::{
    config::{Bucket, CatalogSpec, MinerConfig, SourceGroup, TierSpec},
    document::{DocumentMeta, DocumentRef, ExtractedPage},
    finding::{Finding, SkipReason, SkipRecord},
};
