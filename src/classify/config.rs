//! Classifier thresholds.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Geometric thresholds used to turn spans into blocks.
///
/// All distances are in points; factors are relative to the font size of
/// the line being examined. Every boundary comparison is inclusive: a value
/// exactly on a threshold counts as "within".
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassifierConfig {
    /// Spans whose vertical centers differ by at most this fraction of the
    /// span height share a line. The default is half a line height rather
    /// than a full one: with solid leading, consecutive lines have centers
    /// one line height apart and a full band would merge them.
    pub line_band_factor: f32,

    /// Consecutive lines whose centers are at most this many font sizes
    /// apart may belong to the same paragraph
    pub line_spacing_factor: f32,

    /// Maximum left-edge drift between lines of one paragraph
    pub indent_tolerance: f32,

    /// Font size change (points) that starts a new block
    pub font_size_jump: f32,

    /// Horizontal gap that splits a line into separate cells
    pub cell_gap: f32,

    /// Maximum distance between a cell's left edge and its column anchor
    pub column_tolerance: f32,

    /// Minimum consecutive rows for a table region
    pub min_table_rows: usize,

    /// Minimum distinct columns for a table region
    pub min_table_columns: usize,

    /// Lines split into more cells than this are treated as prose
    pub max_table_columns: usize,

    /// A vertical gap larger than this many font sizes ends a table region
    pub table_row_gap_factor: f32,

    /// Horizontal offset per list nesting level
    pub list_indent_step: f32,

    /// Deepest list nesting level reported
    pub max_list_depth: u8,

    /// Maximum offset of a block center from the text column center for the
    /// block to count as centered
    pub center_tolerance: f32,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            line_band_factor: 0.5,
            line_spacing_factor: 1.6,
            indent_tolerance: 20.0,
            font_size_jump: 1.0,
            cell_gap: 10.0,
            column_tolerance: 8.0,
            min_table_rows: 2,
            min_table_columns: 2,
            max_table_columns: 10,
            table_row_gap_factor: 2.5,
            list_indent_step: 18.0,
            max_list_depth: 8,
            center_tolerance: 12.0,
        }
    }
}

impl ClassifierConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_line_band_factor(mut self, factor: f32) -> Self {
        self.line_band_factor = factor;
        self
    }

    pub fn with_line_spacing_factor(mut self, factor: f32) -> Self {
        self.line_spacing_factor = factor;
        self
    }

    pub fn with_indent_tolerance(mut self, points: f32) -> Self {
        self.indent_tolerance = points;
        self
    }

    pub fn with_cell_gap(mut self, points: f32) -> Self {
        self.cell_gap = points;
        self
    }

    pub fn with_column_tolerance(mut self, points: f32) -> Self {
        self.column_tolerance = points;
        self
    }

    /// Set the accepted column count range for tables.
    pub fn with_table_columns(mut self, min: usize, max: usize) -> Self {
        self.min_table_columns = min;
        self.max_table_columns = max;
        self
    }

    pub fn with_min_table_rows(mut self, rows: usize) -> Self {
        self.min_table_rows = rows;
        self
    }

    pub fn with_list_indent_step(mut self, points: f32) -> Self {
        self.list_indent_step = points;
        self
    }

    /// Reject values that would make classification meaningless.
    pub fn validate(&self) -> Result<()> {
        let positive = [
            ("line_band_factor", self.line_band_factor),
            ("line_spacing_factor", self.line_spacing_factor),
            ("cell_gap", self.cell_gap),
            ("list_indent_step", self.list_indent_step),
            ("table_row_gap_factor", self.table_row_gap_factor),
        ];
        for (name, value) in positive {
            if !(value.is_finite() && value > 0.0) {
                return Err(Error::Config(format!("{} must be positive, got {}", name, value)));
            }
        }
        let non_negative = [
            ("indent_tolerance", self.indent_tolerance),
            ("font_size_jump", self.font_size_jump),
            ("column_tolerance", self.column_tolerance),
            ("center_tolerance", self.center_tolerance),
        ];
        for (name, value) in non_negative {
            if !(value.is_finite() && value >= 0.0) {
                return Err(Error::Config(format!("{} must not be negative, got {}", name, value)));
            }
        }
        if self.min_table_rows < 2 || self.min_table_columns < 2 {
            return Err(Error::Config(
                "tables need at least two rows and two columns".to_string(),
            ));
        }
        if self.max_table_columns < self.min_table_columns {
            return Err(Error::Config(format!(
                "max_table_columns ({}) is below min_table_columns ({})",
                self.max_table_columns, self.min_table_columns
            )));
        }
        Ok(())
    }
}
