//! Merging prose lines into paragraphs and list items.

use crate::model::text::join_lines;
use crate::model::{Alignment, BBox, Block, ListItem, ListMarker, TextBlock};

use super::lines::Line;
use super::lists::detect_marker;
use super::ClassifierConfig;

/// Horizontal extent of the page's text.
#[derive(Debug, Clone, Copy)]
pub(crate) struct TextColumn {
    pub left: f32,
    pub right: f32,
}

impl TextColumn {
    pub fn from_lines<'a>(lines: impl IntoIterator<Item = &'a Line>) -> Option<Self> {
        let bbox = BBox::union_all(lines.into_iter().map(|l| &l.bbox))?;
        Some(Self {
            left: bbox.x0,
            right: bbox.x1,
        })
    }

    fn width(&self) -> f32 {
        self.right - self.left
    }
}

enum Pending {
    Paragraph(Vec<Line>),
    ListItem {
        marker: ListMarker,
        depth: u8,
        marker_x: f32,
        /// Left edge of the item's text after the marker
        body_x: f32,
        /// First line with the marker removed
        first_text: String,
        lines: Vec<Line>,
    },
}

impl Pending {
    fn last_line(&self) -> Option<&Line> {
        match self {
            Pending::Paragraph(lines) | Pending::ListItem { lines, .. } => lines.last(),
        }
    }

    fn push(&mut self, line: Line) {
        match self {
            Pending::Paragraph(lines) | Pending::ListItem { lines, .. } => lines.push(line),
        }
    }
}

/// Group consecutive prose lines into paragraph and list item blocks.
pub(crate) fn group_blocks(
    lines: Vec<Line>,
    column: &TextColumn,
    config: &ClassifierConfig,
) -> Vec<Block> {
    let mut blocks = Vec::new();
    let mut pending: Option<Pending> = None;

    for line in lines {
        if let Some((marker, rest)) = detect_marker(&line.text()) {
            if let Some(done) = pending.take() {
                blocks.extend(finish(done, column, config));
            }
            let offset = (line.x0() - column.left).max(0.0);
            let depth = ((offset / config.list_indent_step).round() as u32)
                .min(u32::from(config.max_list_depth)) as u8;
            let body_x = body_x(&line, &rest, config);
            pending = Some(Pending::ListItem {
                marker,
                depth,
                marker_x: line.x0(),
                body_x,
                first_text: rest,
                lines: vec![line],
            });
            continue;
        }

        let joins = pending.as_ref().is_some_and(|p| continues(p, &line, config));
        match pending.as_mut() {
            Some(current) if joins => current.push(line),
            _ => {
                if let Some(done) = pending.take() {
                    blocks.extend(finish(done, column, config));
                }
                pending = Some(Pending::Paragraph(vec![line]));
            }
        }
    }

    if let Some(done) = pending {
        blocks.extend(finish(done, column, config));
    }

    blocks
}

/// Whether `next` continues the block being built.
fn continues(current: &Pending, next: &Line, config: &ClassifierConfig) -> bool {
    let Some(prev) = current.last_line() else {
        return false;
    };

    let spacing = next.center_y() - prev.center_y();
    if spacing > config.line_spacing_factor * prev.font_size {
        return false;
    }
    if (next.font_size - prev.font_size).abs() > config.font_size_jump {
        return false;
    }
    if is_bold_line(prev) != is_bold_line(next) {
        return false;
    }

    match current {
        Pending::Paragraph(lines) => {
            let drift = next.x0() - prev.x0();
            if drift.abs() <= config.indent_tolerance {
                return true;
            }
            // First-line indent: the second line starts left of the first.
            lines.len() == 1 && drift < 0.0 && -drift <= config.indent_tolerance * 3.0
        }
        Pending::ListItem { marker_x, body_x, .. } => {
            // Wrapped lines hang under the body; a line back at the marker
            // starts a new block.
            let hang = (marker_x + body_x) / 2.0;
            let limit = (body_x + config.indent_tolerance)
                .max(marker_x + config.list_indent_step * 2.0);
            next.x0() > hang && next.x0() <= limit
        }
    }
}

/// Left edge of a list item's body text on its first line.
///
/// A marker drawn as its own span ends where the next span starts. A marker
/// sharing a span with the body is located by its share of the span's
/// characters. Without either, the body is one indent step past the marker.
fn body_x(line: &Line, body: &str, config: &ClassifierConfig) -> f32 {
    let marker_x = line.x0();
    let Some(first) = line.spans.first() else {
        return marker_x + config.list_indent_step;
    };

    let text = line.text();
    let marker_chars = text.trim().chars().count().saturating_sub(body.chars().count());
    let first_chars = first.text.trim_start().chars().count();
    if marker_chars > 0 && marker_chars < first_chars {
        let skipped = first.text.chars().count() - first_chars;
        let per_char = first.bbox.width() / first.text.chars().count().max(1) as f32;
        return first.bbox.x0 + per_char * (skipped + marker_chars) as f32;
    }
    match line.spans.get(1) {
        Some(second) => second.bbox.x0,
        None => marker_x + config.list_indent_step,
    }
}

fn is_bold_line(line: &Line) -> bool {
    line.spans.iter().all(|s| s.font.bold)
}

fn finish(pending: Pending, column: &TextColumn, config: &ClassifierConfig) -> Option<Block> {
    match pending {
        Pending::Paragraph(lines) => {
            let block = TextBlock::from_lines(lines.into_iter().map(|l| l.spans).collect());
            if block.is_empty() {
                return None;
            }
            let alignment = detect_alignment(&block.bbox, column, config);
            Some(Block::Paragraph(block.with_alignment(alignment)))
        }
        Pending::ListItem {
            marker,
            depth,
            first_text,
            lines,
            ..
        } => {
            let mut texts = vec![first_text];
            texts.extend(lines.iter().skip(1).map(Line::text));
            let text = join_lines(&texts);
            let spans = lines.into_iter().flat_map(|l| l.spans).collect();
            Some(Block::ListItem(ListItem {
                body: TextBlock::with_text(spans, text),
                marker,
                depth,
            }))
        }
    }
}

/// Alignment of a block relative to the page's text column.
fn detect_alignment(bbox: &BBox, column: &TextColumn, config: &ClassifierConfig) -> Alignment {
    let width = column.width();
    if width <= 0.0 || bbox.width() >= width * 0.9 {
        return Alignment::Left;
    }

    let left_gap = bbox.x0 - column.left;
    let right_gap = column.right - bbox.x1;

    if left_gap > config.indent_tolerance
        && (left_gap - right_gap).abs() <= 2.0 * config.center_tolerance
    {
        return Alignment::Center;
    }
    if right_gap <= config.center_tolerance && left_gap > width * 0.3 {
        return Alignment::Right;
    }
    Alignment::Left
}
