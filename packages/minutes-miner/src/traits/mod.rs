//! Core trait abstractions.
//!
//! These are the seams where tests substitute deterministic
//! implementations: the network, the clock, the text extractors, and the
//! optical recognition tools.

pub mod delay;
pub mod extractor;
pub mod ocr;
pub mod transport;
