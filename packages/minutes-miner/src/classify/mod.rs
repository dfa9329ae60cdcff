//! Keyword classification: a compiled tier catalog and the scanner over it.

pub mod catalog;
pub mod engine;

pub use catalog::{default_catalog_spec, CompiledPattern, PatternCatalog, Tier};
pub use engine::{classify, context_window, CONTEXT_CHARS};
