//! Per-document and per-batch summaries.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::model::{TranslatedBlock, TranslatedPage, TranslatedText, TranslationOutcome};

/// What kind of recovered problem a warning records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WarningKind {
    /// A page could not be read and was emitted empty
    ExtractionFailed,
    /// A block kept its source text after the engine failed
    TranslationFallback,
    /// A block could not be composed and was left out
    BlockSkipped,
    /// An image repeated earlier bytes and was embedded only once
    DuplicateImage,
}

impl WarningKind {
    /// Whether the warning counts toward the document's warning total.
    /// Duplicate images are notes, not failures.
    pub fn is_failure(&self) -> bool {
        !matches!(self, WarningKind::DuplicateImage)
    }
}

/// A non-fatal problem tied to a page and, where known, a block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Warning {
    /// Page number (1-indexed)
    pub page: u32,
    /// Block index within the page
    #[serde(skip_serializing_if = "Option::is_none")]
    pub block: Option<usize>,
    pub kind: WarningKind,
    pub message: String,
}

impl Warning {
    pub fn new(page: u32, block: Option<usize>, kind: WarningKind, message: impl Into<String>) -> Self {
        Self {
            page,
            block,
            kind,
            message: message.into(),
        }
    }
}

/// Counts collected while translating one document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentStats {
    /// Total number of pages processed
    pub page_count: u32,

    pub paragraph_count: u32,
    pub list_item_count: u32,
    pub table_count: u32,
    pub image_count: u32,

    /// Text blocks left as-is (already target language or nothing to translate)
    pub passthrough_count: u32,

    /// Text blocks translated by the engine
    pub translated_count: u32,

    /// Text blocks that kept their source text after engine failure
    pub fallback_count: u32,

    /// Blocks dropped by the composer
    pub skipped_count: u32,

    /// Images embedded once despite repeating
    pub duplicate_image_count: u32,
}

impl DocumentStats {
    pub fn new() -> Self {
        Self::default()
    }

    /// Count the blocks and translation outcomes of a page.
    pub fn add_page(&mut self, page: &TranslatedPage) {
        self.page_count += 1;
        for block in &page.blocks {
            match block {
                TranslatedBlock::Paragraph { .. } => self.paragraph_count += 1,
                TranslatedBlock::ListItem { .. } => self.list_item_count += 1,
                TranslatedBlock::Table { .. } => self.table_count += 1,
                TranslatedBlock::Image(_) => self.image_count += 1,
            }
            for text in block.translations() {
                self.add_outcome(text);
            }
        }
    }

    pub fn add_outcome(&mut self, text: &TranslatedText) {
        match text.outcome {
            TranslationOutcome::Passthrough => self.passthrough_count += 1,
            TranslationOutcome::Translated => self.translated_count += 1,
            TranslationOutcome::Fallback { .. } => self.fallback_count += 1,
        }
    }

    pub fn add_skipped(&mut self) {
        self.skipped_count += 1;
    }

    pub fn add_duplicate_image(&mut self) {
        self.duplicate_image_count += 1;
    }

    /// Merge another stats instance into this one.
    pub fn merge(&mut self, other: &DocumentStats) {
        self.page_count += other.page_count;
        self.paragraph_count += other.paragraph_count;
        self.list_item_count += other.list_item_count;
        self.table_count += other.table_count;
        self.image_count += other.image_count;
        self.passthrough_count += other.passthrough_count;
        self.translated_count += other.translated_count;
        self.fallback_count += other.fallback_count;
        self.skipped_count += other.skipped_count;
        self.duplicate_image_count += other.duplicate_image_count;
    }
}

/// Result summary for one translated document.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DocumentReport {
    pub input: Option<PathBuf>,
    pub output: Option<PathBuf>,
    pub stats: DocumentStats,
    pub warnings: Vec<Warning>,
}

impl DocumentReport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn warn(&mut self, warning: Warning) {
        self.warnings.push(warning);
    }

    /// Number of warnings that record a failure.
    pub fn warning_count(&self) -> usize {
        self.warnings.iter().filter(|w| w.kind.is_failure()).count()
    }

    pub fn warnings_of(&self, kind: WarningKind) -> impl Iterator<Item = &Warning> {
        self.warnings.iter().filter(move |w| w.kind == kind)
    }
}

/// A document that could not be produced.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileFailure {
    pub input: PathBuf,
    pub error: String,
}

/// Result summary for a batch run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BatchReport {
    pub documents: Vec<DocumentReport>,
    pub failures: Vec<FileFailure>,
    /// Whether the batch stopped early on request
    pub cancelled: bool,
}

impl BatchReport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Totals over every successful document.
    pub fn totals(&self) -> DocumentStats {
        let mut totals = DocumentStats::new();
        for doc in &self.documents {
            totals.merge(&doc.stats);
        }
        totals
    }

    pub fn succeeded(&self) -> usize {
        self.documents.len()
    }

    pub fn failed(&self) -> usize {
        self.failures.len()
    }
}
