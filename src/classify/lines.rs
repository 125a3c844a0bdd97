//! Line grouping and font statistics.

use std::collections::HashMap;

use crate::model::text::join_line_spans;
use crate::model::{BBox, TextSpan};

use super::ClassifierConfig;

/// Spans sharing one baseline band, sorted left to right.
#[derive(Debug, Clone)]
pub(crate) struct Line {
    pub spans: Vec<TextSpan>,
    pub bbox: BBox,
    /// Character-weighted average font size
    pub font_size: f32,
}

impl Line {
    fn from_spans(mut spans: Vec<TextSpan>) -> Self {
        spans.sort_by(|a, b| a.bbox.x0.total_cmp(&b.bbox.x0));
        let bbox = BBox::union_all(spans.iter().map(|s| &s.bbox)).unwrap_or_default();

        let mut chars = 0usize;
        let mut weighted = 0.0f32;
        for span in &spans {
            let n = span.text.chars().filter(|c| !c.is_whitespace()).count().max(1);
            chars += n;
            weighted += span.font.size * n as f32;
        }
        let font_size = if chars > 0 {
            weighted / chars as f32
        } else {
            bbox.height()
        };

        Self {
            spans,
            bbox,
            font_size,
        }
    }

    pub fn text(&self) -> String {
        join_line_spans(&self.spans)
    }

    pub fn x0(&self) -> f32 {
        self.bbox.x0
    }

    pub fn center_y(&self) -> f32 {
        self.bbox.center_y()
    }

    /// Character count excluding whitespace.
    pub fn weight(&self) -> usize {
        self.spans
            .iter()
            .map(|s| s.text.chars().filter(|c| !c.is_whitespace()).count())
            .sum()
    }

    /// Split the line wherever the horizontal gap reaches `gap`.
    pub fn segments(&self, gap: f32) -> Vec<&[TextSpan]> {
        let mut segments = Vec::new();
        let mut start = 0;
        for i in 1..self.spans.len() {
            if self.spans[i].bbox.x0 - self.spans[i - 1].bbox.x1 >= gap {
                segments.push(&self.spans[start..i]);
                start = i;
            }
        }
        if start < self.spans.len() {
            segments.push(&self.spans[start..]);
        }
        segments
    }
}

/// Group text spans into lines, top to bottom.
///
/// A span joins the current line when its vertical center lies within
/// `line_band_factor` × height of the line's running center.
pub(crate) fn group_lines(mut spans: Vec<TextSpan>, config: &ClassifierConfig) -> Vec<Line> {
    spans.retain(|s| !s.text.trim().is_empty());
    spans.sort_by(|a, b| {
        a.bbox
            .center_y()
            .total_cmp(&b.bbox.center_y())
            .then(a.bbox.x0.total_cmp(&b.bbox.x0))
    });

    let mut lines = Vec::new();
    let mut current: Vec<TextSpan> = Vec::new();
    let mut center_sum = 0.0f32;
    let mut band_height = 0.0f32;

    for span in spans {
        if !current.is_empty() {
            let center = center_sum / current.len() as f32;
            let tolerance = config.line_band_factor * band_height.max(span.bbox.height());
            if (span.bbox.center_y() - center).abs() > tolerance {
                lines.push(Line::from_spans(std::mem::take(&mut current)));
                center_sum = 0.0;
                band_height = 0.0;
            }
        }
        center_sum += span.bbox.center_y();
        band_height = band_height.max(span.bbox.height());
        current.push(span);
    }
    if !current.is_empty() {
        lines.push(Line::from_spans(current));
    }

    lines
}

/// Font size histogram used to find the body text size.
#[derive(Debug, Default)]
pub(crate) struct FontStatistics {
    size_histogram: HashMap<i32, usize>,
}

impl FontStatistics {
    /// Record `weight` characters set at `size`.
    pub fn add_size(&mut self, size: f32, weight: usize) {
        let key = (size * 10.0).round() as i32;
        *self.size_histogram.entry(key).or_insert(0) += weight;
    }

    /// Most common size, or 12pt when nothing was recorded.
    pub fn body_size(&self) -> f32 {
        self.size_histogram
            .iter()
            // Ties go to the smaller size so the result is deterministic.
            .max_by(|(ka, ca), (kb, cb)| ca.cmp(cb).then(kb.cmp(ka)))
            .map(|(key, _)| *key as f32 / 10.0)
            .unwrap_or(12.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::FontDescriptor;

    fn make_span(text: &str, x: f32, y: f32) -> TextSpan {
        TextSpan::new(
            text,
            BBox::new(x, y, x + text.len() as f32 * 6.0, y + 12.0),
            FontDescriptor::from_font_name("Helvetica", 12.0),
        )
    }

    #[test]
    fn test_group_into_lines() {
        let spans = vec![
            make_span("B1", 60.0, 100.0),
            make_span("A2", 10.0, 115.0),
            make_span("A1", 10.0, 100.0),
            make_span("B2", 60.0, 115.0),
        ];
        let lines = group_lines(spans, &ClassifierConfig::default());
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0].text(), "A1 B1");
        assert_eq!(lines[1].text(), "A2 B2");
    }

    #[test]
    fn test_band_boundary_is_inclusive() {
        // 12pt tall spans, band = 0.5 * 12 = 6pt
        let spans = vec![make_span("a", 10.0, 100.0), make_span("b", 40.0, 106.0)];
        let lines = group_lines(spans, &ClassifierConfig::default());
        assert_eq!(lines.len(), 1);

        let spans = vec![make_span("a", 10.0, 100.0), make_span("b", 40.0, 106.5)];
        let lines = group_lines(spans, &ClassifierConfig::default());
        assert_eq!(lines.len(), 2);
    }

    #[test]
    fn test_solid_leading_keeps_lines_apart() {
        // 12pt lines set 12pt apart
        let spans = vec![make_span("first", 10.0, 100.0), make_span("second", 10.0, 112.0)];
        let lines = group_lines(spans.clone(), &ClassifierConfig::default());
        assert_eq!(lines.len(), 2);

        let full_height = ClassifierConfig::default().with_line_band_factor(1.0);
        assert_eq!(group_lines(spans, &full_height).len(), 1);
    }

    #[test]
    fn test_whitespace_spans_dropped() {
        let spans = vec![make_span("  ", 10.0, 100.0), make_span("x", 40.0, 100.0)];
        let lines = group_lines(spans, &ClassifierConfig::default());
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].spans.len(), 1);
    }

    #[test]
    fn test_segments_split_at_gap() {
        let spans = vec![
            make_span("Name", 10.0, 100.0),
            make_span("Value", 100.0, 100.0),
            make_span("more", 132.0, 100.0),
        ];
        let lines = group_lines(spans, &ClassifierConfig::default());
        let segments = lines[0].segments(10.0);
        assert_eq!(segments.len(), 2);
        assert_eq!(segments[1].len(), 2);
    }

    #[test]
    fn test_body_size() {
        let mut stats = FontStatistics::default();
        stats.add_size(11.0, 400);
        stats.add_size(18.0, 20);
        stats.add_size(9.0, 30);
        assert_eq!(stats.body_size(), 11.0);
        assert_eq!(FontStatistics::default().body_size(), 12.0);
    }
}
