//! DOCX serialization of a composed document.

use std::io::{Seek, Write};

use docx_rs::{
    AbstractNumbering, AlignmentType, BreakType, Docx, IndentLevel, Level, LevelJc, LevelText,
    LineSpacing, NumberFormat, Numbering, NumberingId, PageMargin, Paragraph, Pic, Run, RunFonts,
    SpecialIndentType, Start, Style, StyleType, Table, TableCell, TableRow,
};

use crate::error::{Error, Result};
use crate::model::Alignment;

use super::layout::{
    ComposedDocument, DocElement, ImageElement, ListDefinition, ParagraphElement, TWIPS_PER_POINT,
};
use super::{FontAsset, StyleTier};

/// Hanging indent of list paragraphs, in twips.
const LIST_HANGING: i32 = 360;

/// Write `doc` as a DOCX package, with every run set in `font`.
pub fn write_docx<W: Write + Seek>(doc: &ComposedDocument, font: &FontAsset, writer: W) -> Result<()> {
    build_docx(doc, font)
        .build()
        .pack(writer)
        .map_err(|e| Error::Write(format!("failed to pack document: {}", e)))?;
    Ok(())
}

/// Build the in-memory document.
pub fn build_docx(doc: &ComposedDocument, font: &FontAsset) -> Docx {
    let fonts = run_fonts(&font.family);
    let margin = twips(doc.layout.margin) as i32;

    let mut docx = Docx::new()
        .page_size(twips(doc.layout.width), twips(doc.layout.height))
        .page_margin(
            PageMargin::new()
                .top(margin)
                .bottom(margin)
                .left(margin)
                .right(margin),
        )
        .default_fonts(fonts.clone())
        .default_size(StyleTier::Body.half_points());

    for tier in StyleTier::ALL {
        let mut style = Style::new(tier.style_id(), StyleType::Paragraph)
            .name(tier.style_name())
            .size(tier.half_points());
        if tier.is_heading() {
            style = style.bold();
        }
        docx = docx.add_style(style);
    }

    for list in &doc.lists {
        docx = docx
            .add_abstract_numbering(abstract_numbering(list))
            .add_numbering(Numbering::new(list.id, list.id));
    }

    for element in &doc.elements {
        docx = match element {
            DocElement::PageBreak => docx.add_paragraph(
                Paragraph::new().add_run(Run::new().add_break(BreakType::Page)),
            ),
            DocElement::PageHeading { page } => docx.add_paragraph(
                Paragraph::new()
                    .style(StyleTier::Heading2.style_id())
                    .add_run(
                        Run::new()
                            .add_text(format!("Page {}", page))
                            .bold()
                            .size(StyleTier::Heading2.half_points())
                            .fonts(fonts.clone()),
                    ),
            ),
            DocElement::Paragraph(p) => docx.add_paragraph(paragraph(p, &fonts)),
            DocElement::ListItem {
                paragraph: p,
                numbering,
                ..
            } => docx.add_paragraph(
                paragraph(p, &fonts)
                    .numbering(NumberingId::new(*numbering), IndentLevel::new(0))
                    .indent(
                        Some(p.indent),
                        Some(SpecialIndentType::Hanging(LIST_HANGING)),
                        None,
                        None,
                    ),
            ),
            DocElement::Table { rows, widths } => docx.add_table(table(rows, widths, &fonts)),
            DocElement::Image(image) => docx.add_paragraph(image_paragraph(image)),
        };
    }

    docx
}

fn twips(points: f32) -> u32 {
    (points * TWIPS_PER_POINT).round().max(0.0) as u32
}

fn run_fonts(family: &str) -> RunFonts {
    RunFonts::new()
        .east_asia(family)
        .ascii(family)
        .hi_ansi(family)
        .cs(family)
}

fn text_run(text: &str, size: usize, fonts: &RunFonts) -> Run {
    Run::new().add_text(text).size(size).fonts(fonts.clone())
}

fn paragraph(p: &ParagraphElement, fonts: &RunFonts) -> Paragraph {
    let mut run = text_run(&p.text, p.tier.half_points(), fonts);
    if p.bold {
        run = run.bold();
    }
    if p.italic {
        run = run.italic();
    }

    let mut para = Paragraph::new()
        .style(p.tier.style_id())
        .align(alignment(p.alignment))
        .line_spacing(compact())
        .add_run(run);
    if p.indent > 0 {
        para = para.indent(Some(p.indent), None, None, None);
    }
    para
}

/// No space before or after.
fn compact() -> LineSpacing {
    LineSpacing::new().before(0).after(0)
}

fn alignment(alignment: Alignment) -> AlignmentType {
    match alignment {
        Alignment::Left => AlignmentType::Left,
        Alignment::Center => AlignmentType::Center,
        Alignment::Right => AlignmentType::Right,
    }
}

fn abstract_numbering(list: &ListDefinition) -> AbstractNumbering {
    AbstractNumbering::new(list.id).add_level(
        Level::new(
            0,
            Start::new(list.start as usize),
            NumberFormat::new(list.format.num_fmt()),
            LevelText::new(list.level_text.as_str()),
            LevelJc::new("left"),
        )
        .indent(
            Some(LIST_HANGING * 2),
            Some(SpecialIndentType::Hanging(LIST_HANGING)),
            None,
            None,
        ),
    )
}

fn table(rows: &[Vec<Option<String>>], widths: &[u32], fonts: &RunFonts) -> Table {
    let body = StyleTier::Body.half_points();
    let rows = rows
        .iter()
        .map(|row| {
            let cells = row
                .iter()
                .map(|cell| {
                    let mut para = Paragraph::new().line_spacing(compact());
                    if let Some(text) = cell {
                        para = para.add_run(text_run(text, body, fonts));
                    }
                    TableCell::new().add_paragraph(para)
                })
                .collect();
            TableRow::new(cells)
        })
        .collect();

    Table::new(rows).set_grid(widths.iter().map(|w| *w as usize).collect())
}

fn image_paragraph(image: &ImageElement) -> Paragraph {
    let pic = Pic::new(&image.png).size(image.width_emu, image.height_emu);
    let mut para = Paragraph::new().add_run(Run::new().add_image(pic));
    if image.indent > 0 {
        para = para.indent(Some(image.indent), None, None, None);
    }
    para
}
