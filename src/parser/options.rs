//! Extraction options.

use serde::{Deserialize, Serialize};

/// Options for span extraction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractOptions {
    /// Whether to decode image XObjects into image spans
    pub extract_images: bool,

    /// Maximum nesting of Form XObjects that will be followed
    pub max_form_depth: usize,

    /// Glyph width (1/1000 em) assumed when a font carries no /Widths
    pub default_glyph_width: f32,

    /// Images smaller than this (in points, either side) are dropped as decoration
    pub min_image_extent: f32,
}

impl ExtractOptions {
    /// Create new extract options with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Enable or disable image extraction.
    pub fn with_images(mut self, extract: bool) -> Self {
        self.extract_images = extract;
        self
    }

    /// Extract text only.
    pub fn text_only(mut self) -> Self {
        self.extract_images = false;
        self
    }

    /// Set the Form XObject nesting limit.
    pub fn with_max_form_depth(mut self, depth: usize) -> Self {
        self.max_form_depth = depth;
        self
    }

    /// Set the minimum kept image size in points.
    pub fn with_min_image_extent(mut self, extent: f32) -> Self {
        self.min_image_extent = extent;
        self
    }
}

impl Default for ExtractOptions {
    fn default() -> Self {
        Self {
            extract_images: true,
            max_form_depth: 8,
            default_glyph_width: 500.0,
            min_image_extent: 2.0,
        }
    }
}
