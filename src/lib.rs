//! # pdftrans
//!
//! Layout-preserving translation of English PDF documents into Chinese
//! Word documents.
//!
//! ## Quick Start
//!
//! ```no_run
//! use std::sync::Arc;
//! use pdftrans::{FontAsset, GenerationConfig, Pipeline, PipelineOptions, Translator};
//!
//! fn main() -> pdftrans::Result<()> {
//!     // Any `Fn(&str, &GenerationConfig) -> Result<String>` is an engine
//!     let engine: Arc<dyn Translator> = Arc::new(|text: &str, _: &GenerationConfig| {
//!         Ok::<_, pdftrans::Error>(format!("[zh] {}", text))
//!     });
//!     let font = FontAsset::load("C:/Windows/Fonts/simsun.ttc", None)?;
//!
//!     let pipeline = Pipeline::new(engine, font, PipelineOptions::default())?;
//!     let report = pipeline.translate_file("paper.pdf", "paper_translated.docx")?;
//!     println!("{} pages, {} warnings", report.stats.page_count, report.warning_count());
//!     Ok(())
//! }
//! ```
//!
//! ## Stages
//!
//! - [`parser`]: positioned text and image spans from page content streams
//! - [`classify`]: paragraphs, list items, tables and images in reading order
//! - [`translate`]: the translation gate (passthrough, retry, fallback, timeout)
//! - [`compose`]: element layout and DOCX output with a CJK font
//! - [`pipeline`]: pages within a document, documents within a batch
//!
//! Every stage except the engine call is deterministic: the same input and
//! options always produce the same blocks.

pub mod classify;
pub mod compose;
pub mod detect;
pub mod error;
pub mod model;
pub mod parser;
pub mod pipeline;
pub mod report;
pub mod translate;

// Re-export commonly used types
pub use classify::{classify_page, ClassifierConfig};
pub use compose::{ComposeOptions, ComposedDocument, FontAsset, StyleTier};
pub use detect::{detect_format_from_bytes, PdfFormat};
pub use error::{Error, Result};
pub use model::{
    Alignment, BBox, Block, Document, ListItem, ListMarker, NumberPunctuation, NumberStyle, Page,
    Span, Table, TableCell, TextBlock, TranslatedBlock, TranslatedPage, TranslatedText,
    TranslationOutcome,
};
pub use parser::{ExtractOptions, Extractor, LopdfBackend};
pub use pipeline::{CancellationToken, Pipeline, PipelineOptions, ProgressObserver};
pub use report::{BatchReport, DocumentReport, DocumentStats, Warning, WarningKind};
pub use translate::{Device, GateOptions, GenerationConfig, TranslationGate, Translator};

use std::path::Path;

/// Extract and classify a PDF file without translating it.
///
/// Unreadable pages come out empty. Useful for inspecting how a document
/// will be structured before paying for translation.
///
/// # Example
///
/// ```no_run
/// use pdftrans::{extract_document, ClassifierConfig, ExtractOptions};
///
/// let doc = extract_document("paper.pdf", &ExtractOptions::default(), &ClassifierConfig::default()).unwrap();
/// for page in &doc.pages {
///     println!("page {}: {} blocks", page.number, page.block_count());
/// }
/// ```
pub fn extract_document<P: AsRef<Path>>(
    path: P,
    extract: &ExtractOptions,
    classifier: &ClassifierConfig,
) -> Result<Document> {
    let data = std::fs::read(path)?;
    extract_document_bytes(&data, extract, classifier)
}

/// Extract and classify a PDF held in memory.
pub fn extract_document_bytes(
    data: &[u8],
    extract: &ExtractOptions,
    classifier: &ClassifierConfig,
) -> Result<Document> {
    let backend = LopdfBackend::load_bytes(data)?;
    log::debug!("Extracting {}", backend.format());
    let extractor = Extractor::new(&backend, extract.clone());

    let mut doc = Document::new();
    for number in extractor.page_numbers() {
        let page = match extractor.spans(number) {
            Ok(spans) => {
                let geometry = *spans.geometry();
                classify_page(&geometry, spans, classifier)
            }
            Err(e) => {
                log::warn!("Failed to extract text from page {}: {}", number, e);
                let (width, height) = extractor
                    .geometry(number)
                    .map(|g| (g.width, g.height))
                    .unwrap_or((612.0, 792.0));
                Page::new(number, width, height)
            }
        };
        doc.pages.push(page);
    }
    Ok(doc)
}
