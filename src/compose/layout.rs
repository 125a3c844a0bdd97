//! Mapping translated blocks onto output elements.
//!
//! The composer produces a [`ComposedDocument`]: a flat, serializable list
//! of output elements plus the list numbering definitions they refer to.
//! The DOCX writer only renders this outline, so everything that decides
//! structure (order, tiers, numbering, image sizes) is testable without
//! unpacking a document.

use std::collections::HashMap;
use std::io::Cursor;

use md5::{Digest, Md5};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::model::{
    Alignment, ImageBlock, ListItem, ListMarker, NumberPunctuation, NumberStyle, Table, TextBlock,
    TranslatedBlock,
    TranslatedPage, TranslatedText,
};
use crate::report::{Warning, WarningKind};

use super::{ComposeOptions, StyleTier};

/// Points to twentieths of a point.
pub const TWIPS_PER_POINT: f32 = 20.0;
/// Points to English Metric Units.
pub const EMU_PER_POINT: f32 = 12_700.0;

/// Indentation added per list level, in twips.
const LIST_INDENT_STEP: i32 = 360;

/// Page setup carried into the writer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageLayout {
    pub width: f32,
    pub height: f32,
    pub margin: f32,
}

/// A paragraph of output text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParagraphElement {
    pub text: String,
    pub tier: StyleTier,
    pub bold: bool,
    pub italic: bool,
    pub alignment: Alignment,
    /// Left indent in twips
    pub indent: i32,
}

/// Numbering format of an output list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ListFormat {
    Bullet,
    Decimal,
    LowerLetter,
    UpperLetter,
}

impl ListFormat {
    fn for_marker(marker: &ListMarker) -> Self {
        match marker {
            ListMarker::Bullet { .. } => ListFormat::Bullet,
            ListMarker::Numbered { style, .. } => match style {
                NumberStyle::Decimal => ListFormat::Decimal,
                NumberStyle::LowerAlpha => ListFormat::LowerLetter,
                NumberStyle::UpperAlpha => ListFormat::UpperLetter,
            },
        }
    }

    /// Format name as written in the numbering definition.
    pub fn num_fmt(&self) -> &'static str {
        match self {
            ListFormat::Bullet => "bullet",
            ListFormat::Decimal => "decimal",
            ListFormat::LowerLetter => "lowerLetter",
            ListFormat::UpperLetter => "upperLetter",
        }
    }

}

/// Level text for a marker: the bullet glyph, or the number placeholder
/// `%1` inside the marker's punctuation.
fn level_text(marker: &ListMarker) -> String {
    match marker {
        ListMarker::Bullet { glyph } => glyph.to_string(),
        ListMarker::Numbered { punctuation, .. } => match punctuation {
            NumberPunctuation::Period => "%1.".to_string(),
            NumberPunctuation::Parenthesis => "%1)".to_string(),
            NumberPunctuation::Enclosed => "(%1)".to_string(),
        },
    }
}

/// One numbering definition; a new one starts whenever a list restarts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ListDefinition {
    /// Numbering id (1-based)
    pub id: usize,
    pub format: ListFormat,
    pub start: u32,
    /// Marker pattern, such as `•`, `%1.` or `(%1)`
    pub level_text: String,
}

/// An image ready to embed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageElement {
    /// PNG bytes
    #[serde(skip)]
    pub png: Vec<u8>,
    /// MD5 of the source image bytes
    pub digest: String,
    pub width_px: u32,
    pub height_px: u32,
    /// Display size in EMU
    pub width_emu: u32,
    pub height_emu: u32,
    /// Left indent in twips
    pub indent: i32,
}

/// One output element, in document order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "element", rename_all = "snake_case")]
pub enum DocElement {
    PageBreak,
    PageHeading {
        page: u32,
    },
    Paragraph(ParagraphElement),
    ListItem {
        paragraph: ParagraphElement,
        numbering: usize,
        depth: u8,
    },
    Table {
        /// `None` marks an empty placeholder cell
        rows: Vec<Vec<Option<String>>>,
        /// Column widths in twips
        widths: Vec<u32>,
    },
    Image(ImageElement),
}

/// The composed output: elements plus numbering definitions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComposedDocument {
    pub layout: PageLayout,
    pub elements: Vec<DocElement>,
    pub lists: Vec<ListDefinition>,
}

impl ComposedDocument {
    /// Outline as JSON (image bytes omitted).
    pub fn outline_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn tables(&self) -> impl Iterator<Item = &Vec<Vec<Option<String>>>> {
        self.elements.iter().filter_map(|e| match e {
            DocElement::Table { rows, .. } => Some(rows),
            _ => None,
        })
    }

    pub fn images(&self) -> impl Iterator<Item = &ImageElement> {
        self.elements.iter().filter_map(|e| match e {
            DocElement::Image(image) => Some(image),
            _ => None,
        })
    }

    /// Text of every paragraph and list item, in order.
    pub fn paragraph_texts(&self) -> Vec<&str> {
        self.elements
            .iter()
            .filter_map(|e| match e {
                DocElement::Paragraph(p) | DocElement::ListItem { paragraph: p, .. } => {
                    Some(p.text.as_str())
                }
                _ => None,
            })
            .collect()
    }
}

/// An open list at one nesting depth.
struct OpenList {
    id: usize,
    format: ListFormat,
    level_text: String,
    next_value: u32,
}

/// Builds a [`ComposedDocument`] page by page.
pub struct Composer<'a> {
    options: &'a ComposeOptions,
    elements: Vec<DocElement>,
    lists: Vec<ListDefinition>,
    /// Open list per depth; `None` where a depth was skipped
    open_lists: Vec<Option<OpenList>>,
    seen_images: HashMap<String, u32>,
    pages: u32,
}

impl<'a> Composer<'a> {
    pub fn new(options: &'a ComposeOptions) -> Self {
        Self {
            options,
            elements: Vec::new(),
            lists: Vec::new(),
            open_lists: Vec::new(),
            seen_images: HashMap::new(),
            pages: 0,
        }
    }

    /// Append one page. Returns warnings for blocks that were skipped.
    pub fn compose_page(&mut self, page: &TranslatedPage) -> Vec<Warning> {
        let mut warnings = Vec::new();

        if self.pages > 0 {
            self.elements.push(DocElement::PageBreak);
        }
        self.pages += 1;
        if self.options.page_labels {
            self.elements.push(DocElement::PageHeading { page: page.number });
        }

        for (index, block) in page.blocks.iter().enumerate() {
            match block {
                TranslatedBlock::Paragraph { block, translation } => {
                    self.open_lists.clear();
                    let element = self.paragraph(page, block, translation);
                    self.elements.push(DocElement::Paragraph(element));
                }
                TranslatedBlock::ListItem { item, translation } => {
                    self.list_item(page, item, translation);
                }
                TranslatedBlock::Table { table, cells } => {
                    self.open_lists.clear();
                    self.table(table, cells);
                }
                TranslatedBlock::Image(image) => {
                    self.open_lists.clear();
                    match self.image(image) {
                        Ok(Some(element)) => self.elements.push(DocElement::Image(element)),
                        Ok(None) => warnings.push(Warning::new(
                            page.number,
                            Some(index),
                            WarningKind::DuplicateImage,
                            "identical image already embedded",
                        )),
                        Err(e) => {
                            log::warn!("Skipping image on page {}: {}", page.number, e);
                            warnings.push(Warning::new(
                                page.number,
                                Some(index),
                                WarningKind::BlockSkipped,
                                e.to_string(),
                            ));
                        }
                    }
                }
            }
        }

        warnings
    }

    /// Finish composition.
    pub fn finish(self) -> ComposedDocument {
        ComposedDocument {
            layout: PageLayout {
                width: self.options.page_width,
                height: self.options.page_height,
                margin: self.options.margin,
            },
            elements: self.elements,
            lists: self.lists,
        }
    }

    fn paragraph(
        &self,
        page: &TranslatedPage,
        block: &TextBlock,
        translation: &TranslatedText,
    ) -> ParagraphElement {
        let tier = StyleTier::for_size(block.font.size, page.body_font_size);
        let indent = match block.alignment {
            Alignment::Left => self.indent_for(page, block.bbox.x0),
            Alignment::Center | Alignment::Right => 0,
        };
        ParagraphElement {
            text: translation.text.clone(),
            tier,
            bold: block.font.bold || tier.is_heading(),
            italic: block.font.italic,
            alignment: block.alignment,
            indent,
        }
    }

    /// Source offset from the page's text edge, scaled onto the output
    /// content width. Never more than half the content width.
    fn indent_for(&self, page: &TranslatedPage, x0: f32) -> i32 {
        let source_width = (page.width - 2.0 * page.text_left).max(page.width * 0.5);
        let scale = self.options.content_width() / source_width;
        let offset = ((x0 - page.text_left) * scale).clamp(0.0, self.options.content_width() / 2.0);
        (offset * TWIPS_PER_POINT).round() as i32
    }

    fn list_item(&mut self, page: &TranslatedPage, item: &ListItem, translation: &TranslatedText) {
        let depth = usize::from(item.depth);
        let format = ListFormat::for_marker(&item.marker);
        let level_text = level_text(&item.marker);
        let value = match item.marker {
            ListMarker::Bullet { .. } => 1,
            ListMarker::Numbered { value, .. } => value,
        };

        self.open_lists.truncate(depth + 1);
        let open = self.open_lists.get_mut(depth).and_then(Option::as_mut).filter(|open| {
            open.format == format
                && open.level_text == level_text
                && (format == ListFormat::Bullet || open.next_value == value)
        });

        let id = match open {
            Some(open) => {
                open.next_value += 1;
                open.id
            }
            None => {
                let id = self.lists.len() + 1;
                self.lists.push(ListDefinition {
                    id,
                    format,
                    start: value,
                    level_text: level_text.clone(),
                });
                self.open_lists.resize_with(depth + 1, || None);
                self.open_lists[depth] = Some(OpenList {
                    id,
                    format,
                    level_text,
                    next_value: value + 1,
                });
                id
            }
        };

        let mut paragraph = self.paragraph(page, &item.body, translation);
        paragraph.alignment = Alignment::Left;
        paragraph.indent = LIST_INDENT_STEP * 2 + LIST_INDENT_STEP * item.depth as i32;
        self.elements.push(DocElement::ListItem {
            paragraph,
            numbering: id,
            depth: item.depth,
        });
    }

    fn table(&mut self, table: &Table, cells: &[Vec<Option<TranslatedText>>]) {
        let rows: Vec<Vec<Option<String>>> = cells
            .iter()
            .map(|row| {
                row.iter()
                    .map(|cell| cell.as_ref().map(|t| t.text.clone()))
                    .collect()
            })
            .collect();

        let source = table.column_widths();
        let total: f32 = source.iter().sum::<f32>().max(1.0);
        let content = self.options.content_width() * TWIPS_PER_POINT;
        let widths = source
            .iter()
            .map(|w| ((w / total) * content).round().max(1.0) as u32)
            .collect();

        self.elements.push(DocElement::Table { rows, widths });
    }

    /// Build an image element, or `None` for a repeated image.
    fn image(&mut self, block: &ImageBlock) -> Result<Option<ImageElement>> {
        let span = &block.image;
        let digest = format!("{:x}", Md5::digest(&span.data.bytes));
        if self.options.dedupe_images {
            if let Some(page) = self.seen_images.get(&digest) {
                log::debug!("Image {} already embedded from page {}", digest, page);
                return Ok(None);
            }
        }

        if span.data.mime_type == "application/octet-stream" {
            return Err(Error::Compose(format!(
                "unsupported raw image layout ({}x{})",
                span.data.width, span.data.height
            )));
        }
        let decoded = image::load_from_memory(&span.data.bytes)?;
        let (width_px, height_px) = (decoded.width(), decoded.height());
        if width_px == 0 || height_px == 0 {
            return Err(Error::Compose("image has no pixels".to_string()));
        }
        let mut png = Vec::new();
        decoded.write_to(&mut Cursor::new(&mut png), image::ImageFormat::Png)?;

        let content_width = self.options.content_width();
        let content_height = self.options.content_height();
        let mut width = span.normalized.width() * content_width;
        if width <= 0.0 {
            width = content_width;
        }
        let mut height = width * height_px as f32 / width_px as f32;
        if height > content_height {
            width *= content_height / height;
            height = content_height;
        }
        let offset = (span.normalized.x0 * content_width).clamp(0.0, (content_width - width).max(0.0));

        self.seen_images.insert(digest.clone(), self.pages);
        Ok(Some(ImageElement {
            png,
            digest,
            width_px,
            height_px,
            width_emu: (width * EMU_PER_POINT).round() as u32,
            height_emu: (height * EMU_PER_POINT).round() as u32,
            indent: (offset * TWIPS_PER_POINT).round() as i32,
        }))
    }
}
