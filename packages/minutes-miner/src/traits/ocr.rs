//! Optical recognition collaborators.
//!
//! OCR is split in two so either half can be swapped: a renderer that
//! rasterizes each page of a document, and a recognizer that reads text
//! from one raster image.

use std::path::{Path, PathBuf};

use crate::error::OcrResult;

/// One rasterized page on disk.
#[derive(Debug, Clone)]
pub struct RenderedPage {
    /// 1-based page number
    pub number: u32,
    pub image: PathBuf,
}

/// Rasterizes every page of a document into `scratch`.
pub trait PageRenderer: Send + Sync {
    fn render(&self, document: &[u8], scratch: &Path) -> OcrResult<Vec<RenderedPage>>;
}

/// Reads text from a single raster image.
pub trait TextRecognizer: Send + Sync {
    fn recognize(&self, image: &Path) -> OcrResult<String>;
}
