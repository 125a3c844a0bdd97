//! Page and document containers, before and after translation.

use serde::{Deserialize, Serialize};

use super::{Block, ImageBlock, ListItem, Table, TextBlock};

/// A classified page.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Page {
    /// Page number (1-indexed)
    pub number: u32,

    /// Page width in points (1 point = 1/72 inch)
    pub width: f32,

    /// Page height in points
    pub height: f32,

    /// Most common text size on the page
    pub body_font_size: f32,

    /// Leftmost text edge, used as the reference for indentation
    pub text_left: f32,

    /// Blocks in reading order
    pub blocks: Vec<Block>,
}

impl Page {
    /// Create an empty page with the given dimensions.
    pub fn new(number: u32, width: f32, height: f32) -> Self {
        Self {
            number,
            width,
            height,
            body_font_size: 0.0,
            text_left: 0.0,
            blocks: Vec::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    pub fn block_count(&self) -> usize {
        self.blocks.len()
    }
}

/// All classified pages of one source file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Document {
    pub pages: Vec<Page>,
}

impl Document {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    pub fn blocks(&self) -> impl Iterator<Item = &Block> {
        self.pages.iter().flat_map(|p| p.blocks.iter())
    }
}

/// How a piece of text made it into the output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum TranslationOutcome {
    /// Already in the target language, or nothing to translate
    Passthrough,
    /// Engine output accepted
    Translated,
    /// Engine failed or degenerated; original text kept
    Fallback { reason: String },
}

/// Output text for one text block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TranslatedText {
    pub text: String,
    #[serde(flatten)]
    pub outcome: TranslationOutcome,
}

impl TranslatedText {
    pub fn passthrough(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            outcome: TranslationOutcome::Passthrough,
        }
    }

    pub fn translated(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            outcome: TranslationOutcome::Translated,
        }
    }

    pub fn fallback(original: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            text: original.into(),
            outcome: TranslationOutcome::Fallback {
                reason: reason.into(),
            },
        }
    }

    pub fn is_fallback(&self) -> bool {
        matches!(self.outcome, TranslationOutcome::Fallback { .. })
    }
}

/// A block together with its translated text.
///
/// Tables keep their grid; `cells[row][column]` is `None` exactly where the
/// source cell is an empty placeholder.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TranslatedBlock {
    Paragraph {
        block: TextBlock,
        translation: TranslatedText,
    },
    ListItem {
        item: ListItem,
        translation: TranslatedText,
    },
    Table {
        table: Table,
        cells: Vec<Vec<Option<TranslatedText>>>,
    },
    Image(ImageBlock),
}

impl TranslatedBlock {
    /// Translations carried by this block, in reading order.
    pub fn translations(&self) -> Vec<&TranslatedText> {
        match self {
            TranslatedBlock::Paragraph { translation, .. }
            | TranslatedBlock::ListItem { translation, .. } => vec![translation],
            TranslatedBlock::Table { cells, .. } => cells.iter().flatten().flatten().collect(),
            TranslatedBlock::Image(_) => Vec::new(),
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            TranslatedBlock::Paragraph { .. } => "paragraph",
            TranslatedBlock::ListItem { .. } => "list_item",
            TranslatedBlock::Table { .. } => "table",
            TranslatedBlock::Image(_) => "image",
        }
    }
}

/// A translated page, ready for composition.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranslatedPage {
    pub number: u32,
    pub width: f32,
    pub height: f32,
    pub body_font_size: f32,
    pub text_left: f32,
    pub blocks: Vec<TranslatedBlock>,
}
