//! Classified blocks: paragraphs, list items, tables and images.

use serde::{Deserialize, Serialize};

use super::text::{join_line_spans, join_lines};
use super::{BBox, FontDescriptor, ImageSpan, TextSpan};

/// Horizontal alignment of a text block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Alignment {
    #[default]
    Left,
    Center,
    Right,
}

/// A run of text spans that belong together (paragraph body, list item
/// body, or table cell).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextBlock {
    /// Spans in reading order
    pub spans: Vec<TextSpan>,
    /// Union of the span boxes
    pub bbox: BBox,
    /// Text as it will be translated
    pub text: String,
    /// Dominant font (weighted by character count)
    pub font: FontDescriptor,
    pub alignment: Alignment,
}

impl TextBlock {
    /// Build a block from lines of spans that are already in reading order.
    pub fn from_lines(lines: Vec<Vec<TextSpan>>) -> Self {
        let line_texts: Vec<String> = lines.iter().map(|l| join_line_spans(l)).collect();
        let text = join_lines(&line_texts);
        let spans: Vec<TextSpan> = lines.into_iter().flatten().collect();
        Self::with_text(spans, text)
    }

    /// Build a block whose text differs from the raw span text (e.g., a list
    /// item with its marker removed).
    pub fn with_text(spans: Vec<TextSpan>, text: String) -> Self {
        let bbox = BBox::union_all(spans.iter().map(|s| &s.bbox)).unwrap_or_default();
        let font = dominant_font(&spans);
        Self {
            spans,
            bbox,
            text,
            font,
            alignment: Alignment::Left,
        }
    }

    pub fn with_alignment(mut self, alignment: Alignment) -> Self {
        self.alignment = alignment;
        self
    }

    pub fn is_empty(&self) -> bool {
        self.text.trim().is_empty()
    }
}

/// Font used by most characters; bold/italic only if the majority is.
fn dominant_font(spans: &[TextSpan]) -> FontDescriptor {
    let Some(first) = spans.first() else {
        return FontDescriptor::from_font_name("", 0.0);
    };

    let mut total = 0usize;
    let mut bold = 0usize;
    let mut italic = 0usize;
    let mut weighted_size = 0.0f32;
    let mut best = first;
    let mut best_len = 0usize;

    for span in spans {
        let n = span.text.chars().filter(|c| !c.is_whitespace()).count();
        total += n;
        weighted_size += span.font.size * n as f32;
        if span.font.bold {
            bold += n;
        }
        if span.font.italic {
            italic += n;
        }
        if n > best_len {
            best = span;
            best_len = n;
        }
    }

    let size = if total > 0 {
        weighted_size / total as f32
    } else {
        first.font.size
    };

    FontDescriptor {
        family: best.font.family.clone(),
        size,
        bold: total > 0 && bold * 2 > total,
        italic: total > 0 && italic * 2 > total,
    }
}

/// Numbering style of an ordered list marker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NumberStyle {
    Decimal,
    LowerAlpha,
    UpperAlpha,
}

/// Punctuation around an ordered marker's number.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NumberPunctuation {
    /// `3.`
    #[default]
    Period,
    /// `3)`
    Parenthesis,
    /// `(3)`
    Enclosed,
}

/// Detected list marker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ListMarker {
    /// Bullet glyph such as `•` or `-`
    Bullet { glyph: char },
    /// Ordered marker such as `3.` or `b)`
    Numbered {
        value: u32,
        style: NumberStyle,
        #[serde(default)]
        punctuation: NumberPunctuation,
    },
}

/// A list item: body text plus marker and nesting depth.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ListItem {
    /// Body with the marker stripped from `text`; `spans` keep the marker glyphs
    pub body: TextBlock,
    pub marker: ListMarker,
    /// Nesting depth, 0 for top level
    pub depth: u8,
}

/// One cell of a table grid.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableCell {
    pub row: usize,
    pub column: usize,
    /// `None` for an explicit empty placeholder
    pub content: Option<TextBlock>,
}

impl TableCell {
    pub fn text(&self) -> &str {
        self.content.as_ref().map(|c| c.text.as_str()).unwrap_or("")
    }
}

/// A rectangular grid of cells.
///
/// Every row has `columns.len()` cells, ordered by column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Table {
    pub rows: Vec<Vec<TableCell>>,
    /// Left edge of each column in page points
    pub columns: Vec<f32>,
    pub bbox: BBox,
}

impl Table {
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    /// Column widths derived from the column edges and the table's right edge.
    pub fn column_widths(&self) -> Vec<f32> {
        (0..self.columns.len())
            .map(|i| {
                let end = self.columns.get(i + 1).copied().unwrap_or(self.bbox.x1);
                (end - self.columns[i]).max(1.0)
            })
            .collect()
    }

    pub fn cells(&self) -> impl Iterator<Item = &TableCell> {
        self.rows.iter().flatten()
    }
}

/// An image placed on the page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageBlock {
    pub image: ImageSpan,
}

/// A classified block of page content.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Block {
    Paragraph(TextBlock),
    ListItem(ListItem),
    Table(Table),
    Image(ImageBlock),
}

impl Block {
    pub fn bbox(&self) -> &BBox {
        match self {
            Block::Paragraph(p) => &p.bbox,
            Block::ListItem(l) => &l.body.bbox,
            Block::Table(t) => &t.bbox,
            Block::Image(i) => &i.image.bbox,
        }
    }

    /// Short role name used in logs and reports.
    pub fn kind(&self) -> &'static str {
        match self {
            Block::Paragraph(_) => "paragraph",
            Block::ListItem(_) => "list_item",
            Block::Table(_) => "table",
            Block::Image(_) => "image",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn span(text: &str, x0: f32, y0: f32, font: &str) -> TextSpan {
        let width = text.chars().count() as f32 * 6.0;
        TextSpan::new(
            text,
            BBox::new(x0, y0, x0 + width, y0 + 12.0),
            FontDescriptor::from_font_name(font, 12.0),
        )
    }

    #[test]
    fn test_text_block_bbox_is_union() {
        let block = TextBlock::from_lines(vec![
            vec![span("First", 72.0, 100.0, "Helvetica")],
            vec![span("second line", 72.0, 114.0, "Helvetica")],
        ]);
        assert_eq!(block.text, "First second line");
        assert_eq!(block.bbox, BBox::new(72.0, 100.0, 72.0 + 66.0, 126.0));
    }

    #[test]
    fn test_dominant_font_bold_majority() {
        let block = TextBlock::from_lines(vec![vec![
            span("Bold heading", 0.0, 0.0, "Helvetica-Bold"),
            span("x", 80.0, 0.0, "Helvetica"),
        ]]);
        assert!(block.font.bold);
        assert_eq!(block.font.family, "Helvetica-Bold");
    }

    #[test]
    fn test_table_column_widths() {
        let table = Table {
            rows: vec![],
            columns: vec![72.0, 200.0],
            bbox: BBox::new(72.0, 0.0, 300.0, 50.0),
        };
        assert_eq!(table.column_widths(), vec![128.0, 100.0]);
    }
}
