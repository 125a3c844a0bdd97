//! Translation gate and page translation.
//!
//! Every text-bearing block (paragraph, list item body, table cell) is an
//! independent job. Jobs of a page run in parallel on the current rayon
//! pool; results are put back in the original block order.

mod config;
mod engine;
mod gate;
pub mod script;

pub use config::{Device, GateOptions, GenerationConfig};
pub use engine::Translator;
pub use gate::{collapse_whitespace, fold_compatibility, TranslationGate};

use rayon::prelude::*;

use crate::model::{Block, Page, TranslatedBlock, TranslatedPage, TranslatedText};

/// Translate every text block of a page.
///
/// Call inside `ThreadPool::install` to bound the number of concurrent
/// engine calls.
pub fn translate_page(page: Page, gate: &TranslationGate) -> TranslatedPage {
    let results: Vec<TranslatedText> = {
        let jobs: Vec<&str> = page
            .blocks
            .iter()
            .flat_map(|block| -> Vec<&str> {
                match block {
                    Block::Paragraph(p) => vec![p.text.as_str()],
                    Block::ListItem(item) => vec![item.body.text.as_str()],
                    Block::Table(table) => table
                        .cells()
                        .filter_map(|c| c.content.as_ref().map(|b| b.text.as_str()))
                        .collect(),
                    Block::Image(_) => Vec::new(),
                }
            })
            .collect();
        log::debug!("Page {}: translating {} text blocks", page.number, jobs.len());
        jobs.par_iter().map(|text| gate.process(text)).collect()
    };
    let mut results = results.into_iter();
    let mut next = || results.next().unwrap_or_else(|| TranslatedText::passthrough(""));

    let blocks = page
        .blocks
        .into_iter()
        .map(|block| match block {
            Block::Paragraph(p) => TranslatedBlock::Paragraph {
                block: p,
                translation: next(),
            },
            Block::ListItem(item) => TranslatedBlock::ListItem {
                item,
                translation: next(),
            },
            Block::Table(table) => {
                let cells = table
                    .rows
                    .iter()
                    .map(|row| {
                        row.iter()
                            .map(|cell| cell.content.as_ref().map(|_| next()))
                            .collect()
                    })
                    .collect();
                TranslatedBlock::Table { table, cells }
            }
            Block::Image(image) => TranslatedBlock::Image(image),
        })
        .collect();

    TranslatedPage {
        number: page.number,
        width: page.width,
        height: page.height,
        body_font_size: page.body_font_size,
        text_left: page.text_left,
        blocks,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use crate::error::Result;
    use crate::model::{BBox, FontDescriptor, Table, TableCell, TextBlock, TextSpan};

    fn text_block(text: &str) -> TextBlock {
        TextBlock::from_lines(vec![vec![TextSpan::new(
            text,
            BBox::new(0.0, 0.0, 50.0, 12.0),
            FontDescriptor::from_font_name("Helvetica", 12.0),
        )]])
    }

    fn cell(row: usize, column: usize, text: Option<&str>) -> TableCell {
        TableCell {
            row,
            column,
            content: text.map(text_block),
        }
    }

    #[test]
    fn test_translate_page_keeps_order_and_grid() {
        let mut page = Page::new(1, 612.0, 792.0);
        page.blocks = vec![
            Block::Paragraph(text_block("first")),
            Block::Table(Table {
                rows: vec![
                    vec![cell(0, 0, Some("a")), cell(0, 1, Some("b"))],
                    vec![cell(1, 0, Some("c")), cell(1, 1, None)],
                ],
                columns: vec![0.0, 100.0],
                bbox: BBox::new(0.0, 20.0, 200.0, 60.0),
            }),
            Block::Paragraph(text_block("last")),
        ];

        let engine = |text: &str, _: &GenerationConfig| -> Result<String> { Ok(format!("译{}", text)) };
        let gate = TranslationGate::new(
            Arc::new(engine),
            GenerationConfig::default(),
            GateOptions::default().with_require_target_script(true),
        );
        let translated = translate_page(page, &gate);

        assert_eq!(translated.blocks.len(), 3);
        let texts: Vec<&str> = translated
            .blocks
            .iter()
            .flat_map(|b| b.translations())
            .map(|t| t.text.as_str())
            .collect();
        assert_eq!(texts, vec!["译first", "译a", "译b", "译c", "译last"]);
        match &translated.blocks[1] {
            TranslatedBlock::Table { cells, .. } => {
                assert_eq!(cells.len(), 2);
                assert!(cells[1][1].is_none());
            }
            other => panic!("unexpected {:?}", other),
        }
    }
}
