//! Output page setup.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// A4 width in points.
pub const A4_WIDTH: f32 = 595.3;
/// A4 height in points.
pub const A4_HEIGHT: f32 = 841.9;

/// Options for composing the output document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ComposeOptions {
    /// Output page width in points
    pub page_width: f32,
    /// Output page height in points
    pub page_height: f32,
    /// Margin on every side in points
    pub margin: f32,
    /// Embed identical images only once per document
    pub dedupe_images: bool,
    /// Emit a "Page N" heading at the start of every source page
    pub page_labels: bool,
}

impl Default for ComposeOptions {
    fn default() -> Self {
        Self {
            page_width: A4_WIDTH,
            page_height: A4_HEIGHT,
            margin: 72.0,
            dedupe_images: true,
            page_labels: false,
        }
    }
}

impl ComposeOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the page size in points.
    pub fn with_page_size(mut self, width: f32, height: f32) -> Self {
        self.page_width = width;
        self.page_height = height;
        self
    }

    pub fn with_margin(mut self, margin: f32) -> Self {
        self.margin = margin;
        self
    }

    pub fn with_dedupe_images(mut self, dedupe: bool) -> Self {
        self.dedupe_images = dedupe;
        self
    }

    pub fn with_page_labels(mut self, labels: bool) -> Self {
        self.page_labels = labels;
        self
    }

    /// Width available to content, in points.
    pub fn content_width(&self) -> f32 {
        self.page_width - 2.0 * self.margin
    }

    /// Height available to content, in points.
    pub fn content_height(&self) -> f32 {
        self.page_height - 2.0 * self.margin
    }

    pub fn validate(&self) -> Result<()> {
        if !(self.margin >= 0.0 && self.content_width() > 36.0 && self.content_height() > 36.0) {
            return Err(Error::Config(format!(
                "page {}x{} with margin {} leaves no room for content",
                self.page_width, self.page_height, self.margin
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_a4() {
        let options = ComposeOptions::default();
        assert_eq!(options.page_width, A4_WIDTH);
        assert!((options.content_width() - 451.3).abs() < 0.01);
        assert!(options.validate().is_ok());
    }

    #[test]
    fn test_margin_too_large() {
        let options = ComposeOptions::new().with_margin(300.0);
        assert!(options.validate().is_err());
    }
}
