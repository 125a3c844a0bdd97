//! Extraction and classification of generated PDFs, without translation.

mod common;

use common::{build_pdf, PageBuilder};
use pdftrans::{
    extract_document_bytes, Alignment, Block, ClassifierConfig, ExtractOptions, ListMarker,
};

fn blocks(pdf: &[u8]) -> Vec<Block> {
    let doc = extract_document_bytes(pdf, &ExtractOptions::default(), &ClassifierConfig::default())
        .unwrap();
    assert_eq!(doc.page_count(), 1);
    doc.pages.into_iter().next().unwrap().blocks
}

fn kinds(blocks: &[Block]) -> Vec<&'static str> {
    blocks.iter().map(Block::kind).collect()
}

#[test]
fn test_wrapped_lines_form_one_paragraph() {
    let pdf = build_pdf(vec![PageBuilder::new()
        .text("The quick brown fox jumps over", 72, 700)
        .text("the lazy dog near the river.", 72, 686)]);
    let blocks = blocks(&pdf);

    assert_eq!(kinds(&blocks), vec!["paragraph"]);
    let Block::Paragraph(p) = &blocks[0] else {
        panic!("expected paragraph");
    };
    assert_eq!(p.text, "The quick brown fox jumps over the lazy dog near the river.");
}

#[test]
fn test_distant_lines_are_separate_paragraphs() {
    let pdf = build_pdf(vec![PageBuilder::new()
        .text("First paragraph.", 72, 700)
        .text("Second paragraph.", 72, 640)]);
    assert_eq!(kinds(&blocks(&pdf)), vec!["paragraph", "paragraph"]);
}

#[test]
fn test_heading_size_splits_block() {
    let pdf = build_pdf(vec![PageBuilder::new()
        .text_sized("Introduction", 72, 720, 18)
        .text("Body text follows the heading.", 72, 700)]);
    let blocks = blocks(&pdf);

    assert_eq!(kinds(&blocks), vec!["paragraph", "paragraph"]);
    let Block::Paragraph(heading) = &blocks[0] else {
        panic!("expected paragraph");
    };
    assert_eq!(heading.font.size, 18.0);
}

#[test]
fn test_bullet_list() {
    let pdf = build_pdf(vec![PageBuilder::new()
        .text("- apples", 72, 700)
        .text("- pears", 72, 686)
        .text("- plums", 72, 672)]);
    let blocks = blocks(&pdf);

    assert_eq!(kinds(&blocks), vec!["list_item", "list_item", "list_item"]);
    let Block::ListItem(item) = &blocks[1] else {
        panic!("expected list item");
    };
    assert_eq!(item.body.text, "pears");
    assert_eq!(item.marker, ListMarker::Bullet { glyph: '-' });
    assert_eq!(item.depth, 0);
}

#[test]
fn test_list_wrap_and_following_paragraph() {
    let pdf = build_pdf(vec![PageBuilder::new()
        .text("1. Install the package", 72, 700)
        .text("2. Run the command and", 72, 686)
        .text("wait for it", 90, 672)
        .text("After that, restart.", 72, 658)]);
    let blocks = blocks(&pdf);

    assert_eq!(kinds(&blocks), vec!["list_item", "list_item", "paragraph"]);
    let Block::ListItem(item) = &blocks[1] else {
        panic!("expected list item");
    };
    assert_eq!(item.body.text, "Run the command and wait for it");
    let Block::Paragraph(p) = &blocks[2] else {
        panic!("expected paragraph");
    };
    assert_eq!(p.text, "After that, restart.");
}

#[test]
fn test_table_grid_has_placeholder() {
    let pdf = build_pdf(vec![PageBuilder::new()
        .text("Name", 72, 700)
        .text("Score", 250, 700)
        .text("Grade", 400, 700)
        .text("Alice", 72, 684)
        .text("90", 250, 684)
        .text("A", 400, 684)
        .text("Bob", 72, 668)
        .text("B", 400, 668)]);
    let blocks = blocks(&pdf);

    assert_eq!(kinds(&blocks), vec!["table"]);
    let Block::Table(table) = &blocks[0] else {
        panic!("expected table");
    };
    assert_eq!(table.row_count(), 3);
    assert_eq!(table.column_count(), 3);
    assert!(table.rows.iter().all(|row| row.len() == 3));
    assert!(table.rows[2][1].content.is_none());
    assert_eq!(table.rows[2][2].text(), "B");
}

#[test]
fn test_single_row_is_not_table() {
    let pdf = build_pdf(vec![PageBuilder::new()
        .text("Name", 72, 700)
        .text("Score", 250, 700)]);
    let kinds = kinds(&blocks(&pdf));
    assert!(!kinds.contains(&"table"));
}

#[test]
fn test_image_between_paragraphs() {
    let pdf = build_pdf(vec![PageBuilder::new()
        .text("Above the figure.", 72, 740)
        .image(72, 500, 200, 150, 2, 2, 200)
        .text("Below the figure.", 72, 400)]);
    let blocks = blocks(&pdf);

    assert_eq!(kinds(&blocks), vec!["paragraph", "image", "paragraph"]);
    let Block::Image(image) = &blocks[1] else {
        panic!("expected image");
    };
    assert_eq!(image.image.data.mime_type, "image/png");
    assert_eq!((image.image.data.width, image.image.data.height), (2, 2));
}

#[test]
fn test_centered_title() {
    // body column spans 72..336; the 72pt wide title sits in its middle
    let pdf = build_pdf(vec![PageBuilder::new()
        .text("Left margin text that spans the page width.", 72, 740)
        .text("Centre title", 168, 700)
        .text("More body text that spans the page width.", 72, 660)]);
    let blocks = blocks(&pdf);

    assert_eq!(blocks.len(), 3);
    let Block::Paragraph(title) = &blocks[1] else {
        panic!("expected paragraph");
    };
    assert_eq!(title.alignment, Alignment::Center);
}

#[test]
fn test_extraction_is_deterministic() {
    let pdf = build_pdf(vec![
        PageBuilder::new()
            .text("1. First step.", 72, 700)
            .text("2. Second step.", 72, 686)
            .text("Name", 72, 600)
            .text("Score", 250, 600)
            .text("Alice", 72, 584)
            .text("90", 250, 584),
        PageBuilder::new().text("Another page.", 72, 700),
    ]);
    let options = ExtractOptions::default();
    let config = ClassifierConfig::default();
    let a = extract_document_bytes(&pdf, &options, &config).unwrap();
    let b = extract_document_bytes(&pdf, &options, &config).unwrap();
    assert_eq!(
        serde_json::to_value(&a).unwrap(),
        serde_json::to_value(&b).unwrap()
    );
}
