//! Positioned content spans produced by the extractor.

use serde::{Deserialize, Serialize};

use super::BBox;

/// Font information attached to a text span.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FontDescriptor {
    /// Base font name with any subset prefix removed (e.g., "Helvetica-Bold")
    pub family: String,
    /// Effective font size in points
    pub size: f32,
    /// Whether the font appears to be bold
    pub bold: bool,
    /// Whether the font appears to be italic
    pub italic: bool,
}

impl FontDescriptor {
    /// Build a descriptor, deriving weight and style from the font name.
    pub fn from_font_name(name: &str, size: f32) -> Self {
        let family = strip_subset_prefix(name).to_string();
        let lower = family.to_lowercase();
        let bold = lower.contains("bold") || lower.contains("black") || lower.contains("heavy");
        let italic = lower.contains("italic") || lower.contains("oblique");
        Self {
            family,
            size,
            bold,
            italic,
        }
    }

    /// Apply the bold/italic bits of a /FontDescriptor /Flags value.
    pub fn with_flags(mut self, flags: i64) -> Self {
        // ForceBold is bit 19, Italic is bit 7.
        if flags & (1 << 18) != 0 {
            self.bold = true;
        }
        if flags & (1 << 6) != 0 {
            self.italic = true;
        }
        self
    }
}

/// Remove a "ABCDEF+" subset tag from a base font name.
fn strip_subset_prefix(name: &str) -> &str {
    match name.split_once('+') {
        Some((tag, rest)) if tag.len() == 6 && tag.chars().all(|c| c.is_ascii_uppercase()) => rest,
        _ => name,
    }
}

/// A run of text drawn with a single font at a single position.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextSpan {
    pub text: String,
    pub bbox: BBox,
    pub font: FontDescriptor,
}

impl TextSpan {
    pub fn new(text: impl Into<String>, bbox: BBox, font: FontDescriptor) -> Self {
        Self {
            text: text.into(),
            bbox,
            font,
        }
    }
}

/// Decoded image payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageData {
    /// Encoded bytes (PNG, JPEG, ...), or raw samples when `mime_type`
    /// is `application/octet-stream`
    pub bytes: Vec<u8>,
    pub mime_type: String,
    /// Original pixel width
    pub width: u32,
    /// Original pixel height
    pub height: u32,
}

/// An image drawn on the page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageSpan {
    pub data: ImageData,
    /// Placement box in page points
    pub bbox: BBox,
    /// Placement box in the 0..1 unit square of the page
    pub normalized: BBox,
}

/// A minimal unit of positioned page content.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Span {
    Text(TextSpan),
    Image(ImageSpan),
}

impl Span {
    pub fn bbox(&self) -> &BBox {
        match self {
            Span::Text(t) => &t.bbox,
            Span::Image(i) => &i.bbox,
        }
    }

    pub fn is_text(&self) -> bool {
        matches!(self, Span::Text(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_font_descriptor_from_name() {
        let f = FontDescriptor::from_font_name("Helvetica-Bold", 12.0);
        assert!(f.bold);
        assert!(!f.italic);

        let f = FontDescriptor::from_font_name("ABCDEF+Times-Italic", 10.0);
        assert_eq!(f.family, "Times-Italic");
        assert!(f.italic);

        let f = FontDescriptor::from_font_name("Abc+Courier", 10.0);
        assert_eq!(f.family, "Abc+Courier");
    }

    #[test]
    fn test_font_flags() {
        let f = FontDescriptor::from_font_name("F1", 12.0).with_flags(1 << 18);
        assert!(f.bold);
        let f = FontDescriptor::from_font_name("F1", 12.0).with_flags(1 << 6);
        assert!(f.italic);
    }
}
