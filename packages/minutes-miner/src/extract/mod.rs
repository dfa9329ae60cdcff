//! Text extraction: strategies and the fallback pipeline that orders them.

pub mod lopdf_text;
pub mod ocr;
pub mod pdf_text;
pub mod pipeline;

pub use lopdf_text::LopdfTextStrategy;
pub use ocr::{OcrStrategy, PdftoppmRenderer, TesseractRecognizer};
pub use pdf_text::PdfTextStrategy;
pub use pipeline::{Extraction, ExtractionPipeline, StrategyAttempt};
