//! Optical recognition fallback for image-only documents.
//!
//! Each page is rasterized into a scratch directory, then read back by
//! the recognizer. The scratch directory is removed when extraction ends.

use std::path::{Path, PathBuf};
use std::process::Command;
use tracing::{debug, warn};

use crate::error::{OcrError, OcrResult};
use crate::traits::extractor::{ExtractionStrategy, StrategyOutcome};
use crate::traits::ocr::{PageRenderer, RenderedPage, TextRecognizer};
use crate::types::document::ExtractedPage;

/// Render every page, recognize each image, keep pages over the threshold.
pub struct OcrStrategy<R: PageRenderer, X: TextRecognizer> {
    renderer: R,
    recognizer: X,
}

impl Default for OcrStrategy<PdftoppmRenderer, TesseractRecognizer> {
    fn default() -> Self {
        Self::new(PdftoppmRenderer::default(), TesseractRecognizer::default())
    }
}

impl<R: PageRenderer, X: TextRecognizer> OcrStrategy<R, X> {
    pub fn new(renderer: R, recognizer: X) -> Self {
        Self { renderer, recognizer }
    }
}

impl<R: PageRenderer, X: TextRecognizer> ExtractionStrategy for OcrStrategy<R, X> {
    fn name(&self) -> &'static str {
        "ocr"
    }

    fn is_ocr(&self) -> bool {
        true
    }

    fn extract(&self, document: &[u8]) -> StrategyOutcome {
        let scratch = match tempfile::tempdir() {
            Ok(dir) => dir,
            Err(error) => return StrategyOutcome::Failed(format!("scratch dir: {error}")),
        };

        let rendered = match self.renderer.render(document, scratch.path()) {
            Ok(rendered) => rendered,
            Err(error) => return StrategyOutcome::Failed(error.to_string()),
        };

        let mut pages = Vec::new();
        for page in &rendered {
            match self.recognizer.recognize(&page.image) {
                Ok(text) => pages.extend(ExtractedPage::retain(page.number, text)),
                Err(error) => {
                    warn!(page = page.number, error = %error, "Recognition failed, skipping page");
                }
            }
        }

        debug!(rendered = rendered.len(), retained = pages.len(), "OCR finished");
        StrategyOutcome::from_pages(pages)
    }
}

/// Rasterizes with poppler's `pdftoppm`.
#[derive(Debug, Clone)]
pub struct PdftoppmRenderer {
    /// Executable name or path
    pub program: PathBuf,

    /// Render resolution
    pub dpi: u32,
}

impl Default for PdftoppmRenderer {
    fn default() -> Self {
        Self {
            program: PathBuf::from("pdftoppm"),
            dpi: 300,
        }
    }
}

impl PageRenderer for PdftoppmRenderer {
    fn render(&self, document: &[u8], scratch: &Path) -> OcrResult<Vec<RenderedPage>> {
        let input = scratch.join("input.pdf");
        std::fs::write(&input, document)?;

        let output = Command::new(&self.program)
            .arg("-r")
            .arg(self.dpi.to_string())
            .arg("-png")
            .arg(&input)
            .arg(scratch.join("page"))
            .output()
            .map_err(|source| OcrError::ToolUnavailable {
                tool: "pdftoppm",
                source,
            })?;

        if !output.status.success() {
            return Err(OcrError::ToolFailed {
                tool: "pdftoppm",
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        collect_rendered(scratch)
    }
}

/// Finds `page-<n>.png` files; pdftoppm zero-pads `<n>` by page count.
fn collect_rendered(scratch: &Path) -> OcrResult<Vec<RenderedPage>> {
    let mut pages = Vec::new();
    for entry in std::fs::read_dir(scratch)? {
        let path = entry?.path();
        if path.extension().and_then(|e| e.to_str()) != Some("png") {
            continue;
        }
        let number = path
            .file_stem()
            .and_then(|s| s.to_str())
            .and_then(|s| s.strip_prefix("page-"))
            .and_then(|n| n.parse::<u32>().ok());
        if let Some(number) = number {
            pages.push(RenderedPage { number, image: path });
        }
    }
    pages.sort_by_key(|p| p.number);
    Ok(pages)
}

/// Reads images with the `tesseract` CLI.
#[derive(Debug, Clone)]
pub struct TesseractRecognizer {
    pub program: PathBuf,

    /// Tesseract language code
    pub language: String,
}

impl Default for TesseractRecognizer {
    fn default() -> Self {
        Self {
            program: PathBuf::from("tesseract"),
            language: "eng".to_string(),
        }
    }
}

impl TextRecognizer for TesseractRecognizer {
    fn recognize(&self, image: &Path) -> OcrResult<String> {
        let output = Command::new(&self.program)
            .arg(image)
            .arg("stdout")
            .arg("-l")
            .arg(&self.language)
            .output()
            .map_err(|source| OcrError::ToolUnavailable {
                tool: "tesseract",
                source,
            })?;

        if !output.status.success() {
            return Err(OcrError::ToolFailed {
                tool: "tesseract",
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}
