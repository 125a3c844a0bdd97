//! Structure classification: spans in, ordered blocks out.
//!
//! Classification is a pure function of a page's spans, its geometry and a
//! [`ClassifierConfig`]. The same input always yields the same blocks.
//!
//! The steps are:
//! 1. group text spans into lines by vertical band
//! 2. find table regions among runs of multi-cell lines
//! 3. merge the remaining lines into paragraphs and list items
//! 4. interleave images by their top edge

mod config;
mod lines;
mod lists;
mod paragraphs;
mod tables;

pub use config::ClassifierConfig;

use crate::model::{Block, ImageBlock, ImageSpan, Page, Span, TextSpan};
use crate::parser::PageGeometry;

use lines::{group_lines, FontStatistics};
use paragraphs::{group_blocks, TextColumn};
use tables::detect_tables;

/// Classify the spans of one page into ordered blocks.
pub fn classify_page(
    geometry: &PageGeometry,
    spans: impl IntoIterator<Item = Span>,
    config: &ClassifierConfig,
) -> Page {
    let mut texts: Vec<TextSpan> = Vec::new();
    let mut images: Vec<ImageSpan> = Vec::new();
    for span in spans {
        match span {
            Span::Text(t) => texts.push(t),
            Span::Image(i) => images.push(i),
        }
    }

    let lines = group_lines(texts, config);

    let mut stats = FontStatistics::default();
    for line in &lines {
        stats.add_size(line.font_size, line.weight());
    }

    let regions = detect_tables(&lines, config);
    let in_table = |i: usize| regions.iter().any(|r| (r.start..r.end).contains(&i));
    let column = TextColumn::from_lines(
        lines
            .iter()
            .enumerate()
            .filter(|(i, _)| !in_table(*i))
            .map(|(_, l)| l),
    )
    .or_else(|| TextColumn::from_lines(&lines))
    .unwrap_or(TextColumn {
        left: 0.0,
        right: geometry.width,
    });

    let mut blocks = Vec::new();
    let mut prose = Vec::new();
    let mut regions = regions.into_iter().peekable();
    for (i, line) in lines.into_iter().enumerate() {
        if let Some((start, end)) = regions.peek().map(|r| (r.start, r.end)) {
            if i >= start {
                if i == start {
                    blocks.extend(group_blocks(std::mem::take(&mut prose), &column, config));
                }
                if i + 1 == end {
                    if let Some(region) = regions.next() {
                        blocks.push(Block::Table(region.table));
                    }
                }
                continue;
            }
        }
        prose.push(line);
    }
    blocks.extend(group_blocks(prose, &column, config));

    let blocks = interleave_images(blocks, images);
    log::debug!(
        "Page {}: {} blocks (body size {:.1})",
        geometry.number,
        blocks.len(),
        stats.body_size()
    );

    Page {
        number: geometry.number,
        width: geometry.width,
        height: geometry.height,
        body_font_size: stats.body_size(),
        text_left: column.left,
        blocks,
    }
}

/// Insert image blocks before the first block that starts below them.
fn interleave_images(blocks: Vec<Block>, mut images: Vec<ImageSpan>) -> Vec<Block> {
    if images.is_empty() {
        return blocks;
    }
    images.sort_by(|a, b| {
        a.bbox
            .y0
            .total_cmp(&b.bbox.y0)
            .then(a.bbox.x0.total_cmp(&b.bbox.x0))
    });

    let mut result = Vec::with_capacity(blocks.len() + images.len());
    let mut images = images.into_iter().peekable();
    for block in blocks {
        while let Some(image) = images.next_if(|img| img.bbox.y0 < block.bbox().y0) {
            result.push(Block::Image(ImageBlock { image }));
        }
        result.push(block);
    }
    result.extend(images.map(|image| Block::Image(ImageBlock { image })));
    result
}
