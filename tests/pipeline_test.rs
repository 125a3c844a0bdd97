//! End-to-end tests: PDF bytes in, composed document and DOCX out.

mod common;

use std::io::Cursor;
use std::sync::Arc;
use std::time::Duration;

use common::{build_pdf, document_xml, font, prefix_engine, CountingEngine, PageBuilder, SlowEngine};
use pdftrans::compose::{DocElement, EMU_PER_POINT, TWIPS_PER_POINT};
use pdftrans::{
    CancellationToken, Error, FontAsset, GateOptions, GenerationConfig, Pipeline, PipelineOptions,
    Result, Translator, WarningKind,
};

fn pipeline(engine: Arc<dyn Translator>) -> Pipeline {
    Pipeline::new(engine, font(), PipelineOptions::default()).unwrap()
}

fn hello_pdf() -> Vec<u8> {
    build_pdf(vec![PageBuilder::new().text("Hello world.", 72, 700)])
}

fn element_kinds(elements: &[DocElement]) -> Vec<&'static str> {
    elements
        .iter()
        .map(|e| match e {
            DocElement::PageBreak => "page_break",
            DocElement::PageHeading { .. } => "page_heading",
            DocElement::Paragraph(_) => "paragraph",
            DocElement::ListItem { .. } => "list_item",
            DocElement::Table { .. } => "table",
            DocElement::Image(_) => "image",
        })
        .collect()
}

#[test]
fn test_single_paragraph() {
    let (doc, report) = pipeline(prefix_engine()).process_bytes(&hello_pdf()).unwrap();

    assert_eq!(doc.paragraph_texts(), vec!["译文 Hello world."]);
    assert_eq!(doc.tables().count(), 0);
    assert_eq!(doc.images().count(), 0);
    assert_eq!(report.stats.page_count, 1);
    assert_eq!(report.stats.translated_count, 1);
    assert_eq!(report.warning_count(), 0);
}

#[test]
fn test_three_by_two_table() {
    let pdf = build_pdf(vec![PageBuilder::new()
        .text("Name", 72, 700)
        .text("Quantity", 300, 700)
        .text("Apples", 72, 684)
        .text("12", 300, 684)
        .text("Pears", 72, 668)
        .text("7", 300, 668)]);
    let (doc, report) = pipeline(prefix_engine()).process_bytes(&pdf).unwrap();

    assert_eq!(report.stats.table_count, 1);
    let tables: Vec<_> = doc.tables().collect();
    assert_eq!(tables.len(), 1);
    let rows = tables[0];
    assert_eq!(rows.len(), 3);
    assert!(rows.iter().all(|row| row.len() == 2));
    assert_eq!(rows[0][0].as_deref(), Some("译文 Name"));
    // numbers pass through untouched
    assert_eq!(rows[1][1].as_deref(), Some("12"));
}

#[test]
fn test_right_half_image() {
    let pdf = build_pdf(vec![PageBuilder::new().image(300, 400, 300, 150, 4, 2, 90)]);
    let options = PipelineOptions::default();
    let content = options.compose.content_width();
    let (doc, report) = pipeline(prefix_engine()).process_bytes(&pdf).unwrap();

    assert_eq!(report.stats.image_count, 1);
    let images: Vec<_> = doc.images().collect();
    assert_eq!(images.len(), 1);
    let image = images[0];
    assert_eq!(image.width_emu, (content * 0.5 * EMU_PER_POINT).round() as u32);
    assert_eq!(image.height_emu, (content * 0.25 * EMU_PER_POINT).round() as u32);
    assert_eq!(image.indent, (content * 0.5 * TWIPS_PER_POINT).round() as i32);
}

#[test]
fn test_one_timeout_among_ten_blocks() {
    let mut page = PageBuilder::new();
    for i in 0..10 {
        let text = if i == 6 {
            "This sentence will stall the engine.".to_string()
        } else {
            format!("Sentence {} of the report.", i)
        };
        page = page.text(&text, 72, 740 - i * 40);
    }
    let pdf = build_pdf(vec![page]);

    let engine = Arc::new(SlowEngine {
        trigger: "stall",
        delay: Duration::from_millis(1500),
    });
    // the stalled call and its retry keep two engine slots busy
    let options = PipelineOptions::default()
        .with_concurrency(4)
        .with_gate(GateOptions::default().with_timeout(Duration::from_millis(100)));
    let pipeline = Pipeline::new(engine, font(), options).unwrap();
    let (doc, report) = pipeline.process_bytes(&pdf).unwrap();

    assert_eq!(report.stats.paragraph_count, 10);
    assert_eq!(report.stats.translated_count, 9);
    assert_eq!(report.stats.fallback_count, 1);
    assert_eq!(report.warning_count(), 1);

    let fallback: Vec<_> = report.warnings_of(WarningKind::TranslationFallback).collect();
    assert_eq!(fallback[0].block, Some(6));
    let texts = doc.paragraph_texts();
    assert_eq!(texts[6], "This sentence will stall the engine.");
    assert_eq!(texts[0], "译文 Sentence 0 of the report.");
}

#[test]
fn test_target_language_text_never_reaches_engine() {
    let pdf = build_pdf(vec![PageBuilder::new()
        .text("Hello world.", 72, 700)
        .text("2024 - 2025", 72, 640)]);
    let engine = Arc::new(CountingEngine::default());
    let pipeline = Pipeline::new(engine.clone(), font(), PipelineOptions::default()).unwrap();
    let (doc, report) = pipeline.process_bytes(&pdf).unwrap();

    assert_eq!(engine.calls(), 1);
    assert_eq!(report.stats.passthrough_count, 1);
    assert_eq!(doc.paragraph_texts(), vec!["译文 Hello world.", "2024 - 2025"]);
}

#[test]
fn test_degenerate_output_falls_back() {
    let engine: Arc<dyn Translator> =
        Arc::new(|_: &str, _: &GenerationConfig| -> Result<String> { Ok(String::new()) });
    let (doc, report) = pipeline(engine).process_bytes(&hello_pdf()).unwrap();

    assert_eq!(doc.paragraph_texts(), vec!["Hello world."]);
    assert_eq!(report.stats.fallback_count, 1);
    assert_eq!(report.warnings_of(WarningKind::TranslationFallback).count(), 1);
}

#[test]
fn test_block_order_and_page_breaks() {
    let pdf = build_pdf(vec![
        PageBuilder::new()
            .text("Results are shown below.", 72, 740)
            .text("Name", 72, 700)
            .text("Score", 300, 700)
            .text("Alice", 72, 684)
            .text("90", 300, 684)
            .text("That concludes the report.", 72, 620),
        PageBuilder::new().text("Second page text.", 72, 700),
    ]);
    let (doc, _) = pipeline(prefix_engine()).process_bytes(&pdf).unwrap();

    assert_eq!(
        element_kinds(&doc.elements),
        vec!["paragraph", "table", "paragraph", "page_break", "paragraph"]
    );
}

#[test]
fn test_numbered_list() {
    let pdf = build_pdf(vec![PageBuilder::new()
        .text("1. Prepare the samples.", 72, 700)
        .text("2. Measure the results.", 72, 686)]);
    let (doc, report) = pipeline(prefix_engine()).process_bytes(&pdf).unwrap();

    assert_eq!(report.stats.list_item_count, 2);
    assert_eq!(
        doc.paragraph_texts(),
        vec!["译文 Prepare the samples.", "译文 Measure the results."]
    );
    assert_eq!(doc.lists.len(), 1);
    assert_eq!(doc.lists[0].start, 1);
    assert_eq!(doc.lists[0].level_text, "%1.");
}

#[test]
fn test_unreadable_page_is_empty() {
    let pdf = build_pdf(vec![
        PageBuilder::new().text("First page.", 72, 700),
        PageBuilder::new().broken(),
        PageBuilder::new().text("Third page.", 72, 700),
    ]);
    let (doc, report) = pipeline(prefix_engine()).process_bytes(&pdf).unwrap();

    assert_eq!(report.stats.page_count, 3);
    let failed: Vec<_> = report.warnings_of(WarningKind::ExtractionFailed).collect();
    assert_eq!(failed.len(), 1);
    assert_eq!(failed[0].page, 2);
    assert_eq!(doc.paragraph_texts(), vec!["译文 First page.", "译文 Third page."]);
    assert_eq!(
        doc.elements.iter().filter(|e| **e == DocElement::PageBreak).count(),
        2
    );
}

#[test]
fn test_repeated_runs_are_identical() {
    let pdf = build_pdf(vec![
        PageBuilder::new()
            .text("Title of the paper", 72, 740)
            .text("Name", 72, 700)
            .text("Score", 300, 700)
            .text("Alice", 72, 684)
            .text("90", 300, 684)
            .image(72, 300, 200, 100, 2, 2, 10),
        PageBuilder::new()
            .text("1. First step.", 72, 700)
            .text("2. Second step.", 72, 686),
    ]);
    let pipeline = pipeline(prefix_engine());

    let (first_doc, _) = pipeline.process_bytes(&pdf).unwrap();
    let (second_doc, _) = pipeline.process_bytes(&pdf).unwrap();
    assert_eq!(first_doc, second_doc);
    assert_eq!(first_doc.outline_json().unwrap(), second_doc.outline_json().unwrap());

    let mut first = Cursor::new(Vec::new());
    pipeline.translate_bytes(&pdf, &mut first).unwrap();
    let mut second = Cursor::new(Vec::new());
    pipeline.translate_bytes(&pdf, &mut second).unwrap();
    assert_eq!(
        visible_text(&document_xml(first.get_ref())),
        visible_text(&document_xml(second.get_ref()))
    );
}

/// Text content of document XML, markup removed.
fn visible_text(xml: &str) -> String {
    let tags = regex::Regex::new(r"<[^>]*>").unwrap();
    tags.replace_all(xml, "|").to_string()
}

#[test]
fn test_translate_file_writes_docx() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("hello.pdf");
    let output = dir.path().join("hello_translated.docx");
    std::fs::write(&input, hello_pdf()).unwrap();

    let report = pipeline(prefix_engine()).translate_file(&input, &output).unwrap();
    assert_eq!(report.output.as_deref(), Some(output.as_path()));

    let bytes = std::fs::read(&output).unwrap();
    assert_eq!(&bytes[..2], b"PK");
    let xml = document_xml(&bytes);
    assert!(xml.contains("译文 Hello world."));
    assert!(xml.contains("SimSun"));
    assert!(!dir.path().join("hello_translated.docx.part").exists());
}

#[test]
fn test_non_pdf_input_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("report.pdf");
    let output = dir.path().join("report_translated.docx");
    std::fs::write(&input, b"PK\x03\x04\x14\x00\x06\x00 word document").unwrap();

    let result = pipeline(prefix_engine()).translate_file(&input, &output);
    assert!(matches!(result, Err(Error::UnknownFormat)));
    assert!(!output.exists());
}

#[test]
fn test_batch_continues_past_failures() {
    let dir = tempfile::tempdir().unwrap();
    let out = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("a_good.pdf"), hello_pdf()).unwrap();
    std::fs::write(dir.path().join("b_bad.pdf"), b"not a pdf at all").unwrap();
    std::fs::write(dir.path().join("c_good.PDF"), hello_pdf()).unwrap();
    std::fs::write(dir.path().join("notes.txt"), b"ignored").unwrap();

    let batch = pipeline(prefix_engine())
        .translate_dir(dir.path(), Some(out.path()))
        .unwrap();

    assert_eq!(batch.succeeded(), 2);
    assert_eq!(batch.failed(), 1);
    assert!(!batch.cancelled);
    assert!(batch.failures[0].input.ends_with("b_bad.pdf"));
    assert!(out.path().join("a_good_translated.docx").exists());
    assert!(out.path().join("c_good_translated.docx").exists());
    assert!(!out.path().join("b_bad_translated.docx").exists());
    assert_eq!(batch.totals().page_count, 2);
}

#[test]
fn test_cancelled_batch_stops() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("a.pdf"), hello_pdf()).unwrap();

    let token = CancellationToken::new();
    let pipeline = pipeline(prefix_engine()).with_cancellation(token.clone());
    token.cancel();
    let batch = pipeline.translate_dir(dir.path(), None).unwrap();

    assert!(batch.cancelled);
    assert_eq!(batch.succeeded(), 0);
    assert!(!dir.path().join("a_translated.docx").exists());
}

#[test]
fn test_missing_font_is_fatal_before_processing() {
    let result = FontAsset::load("/nonexistent/fonts/simsun.ttc", None);
    assert!(matches!(result, Err(Error::FontAsset(_))));
}

#[test]
fn test_sequential_matches_parallel() {
    let pdf = build_pdf(vec![
        PageBuilder::new().text("Page one.", 72, 700),
        PageBuilder::new().text("Page two.", 72, 700),
        PageBuilder::new().text("Page three.", 72, 700),
    ]);
    let parallel = pipeline(prefix_engine()).process_bytes(&pdf).unwrap().0;
    let sequential = Pipeline::new(prefix_engine(), font(), PipelineOptions::default().sequential())
        .unwrap()
        .process_bytes(&pdf)
        .unwrap()
        .0;
    assert_eq!(parallel, sequential);
}
