//! Output style tiers.

use serde::{Deserialize, Serialize};

/// A fixed output style level. Source font sizes map onto these by their
/// ratio to the page's body size, so small size variations in the source
/// don't produce unstable styling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StyleTier {
    Title,
    Heading1,
    Heading2,
    Body,
    Small,
}

impl StyleTier {
    pub const ALL: [StyleTier; 5] = [
        StyleTier::Title,
        StyleTier::Heading1,
        StyleTier::Heading2,
        StyleTier::Body,
        StyleTier::Small,
    ];

    /// Tier for a block of `size` points on a page whose body text is `body_size`.
    pub fn for_size(size: f32, body_size: f32) -> Self {
        if body_size <= 0.0 || size <= 0.0 {
            return StyleTier::Body;
        }
        let ratio = size / body_size;
        if ratio >= 1.8 {
            StyleTier::Title
        } else if ratio >= 1.4 {
            StyleTier::Heading1
        } else if ratio >= 1.15 {
            StyleTier::Heading2
        } else if ratio <= 0.85 {
            StyleTier::Small
        } else {
            StyleTier::Body
        }
    }

    /// Output font size in points.
    pub fn point_size(&self) -> f32 {
        match self {
            StyleTier::Title => 22.0,
            StyleTier::Heading1 => 16.0,
            StyleTier::Heading2 => 14.0,
            StyleTier::Body => 11.0,
            StyleTier::Small => 9.0,
        }
    }

    /// Output size in half-points, as the document format stores it.
    pub fn half_points(&self) -> usize {
        (self.point_size() * 2.0).round() as usize
    }

    pub fn style_id(&self) -> &'static str {
        match self {
            StyleTier::Title => "Title",
            StyleTier::Heading1 => "Heading1",
            StyleTier::Heading2 => "Heading2",
            StyleTier::Body => "Normal",
            StyleTier::Small => "Small",
        }
    }

    pub fn style_name(&self) -> &'static str {
        match self {
            StyleTier::Title => "Title",
            StyleTier::Heading1 => "heading 1",
            StyleTier::Heading2 => "heading 2",
            StyleTier::Body => "Normal",
            StyleTier::Small => "Small Text",
        }
    }

    /// Headings are always bold.
    pub fn is_heading(&self) -> bool {
        matches!(self, StyleTier::Title | StyleTier::Heading1 | StyleTier::Heading2)
    }
}
