//! Shared helpers: in-memory PDFs built with lopdf and stub engines.

#![allow(dead_code)]

use std::io::{Cursor, Read};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Dictionary, Document, Object, ObjectId, Stream};

use pdftrans::{FontAsset, GenerationConfig, Result, Translator};

pub const PAGE_WIDTH: i64 = 600;
pub const PAGE_HEIGHT: i64 = 800;

/// One page (or Form XObject body) under construction.
#[derive(Default)]
pub struct PageBuilder {
    ops: Vec<Operation>,
    images: Vec<(String, Stream)>,
    forms: Vec<(String, [i64; 6], PageBuilder)>,
    broken: bool,
}

impl PageBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Show `text` in 12pt Helvetica with its baseline at (`x`, `y`) in PDF space.
    pub fn text(self, text: &str, x: i64, y: i64) -> Self {
        self.text_sized(text, x, y, 12)
    }

    pub fn text_sized(mut self, text: &str, x: i64, y: i64, size: i64) -> Self {
        self.ops.extend([
            Operation::new("BT", vec![]),
            Operation::new("Tf", vec!["F1".into(), size.into()]),
            Operation::new(
                "Tm",
                vec![1.into(), 0.into(), 0.into(), 1.into(), x.into(), y.into()],
            ),
            Operation::new("Tj", vec![Object::string_literal(text)]),
            Operation::new("ET", vec![]),
        ]);
        self
    }

    /// Draw a `px_w`x`px_h` RGB image into the rectangle (`x`, `y`, `w`, `h`) in PDF space.
    pub fn image(mut self, x: i64, y: i64, w: i64, h: i64, px_w: i64, px_h: i64, shade: u8) -> Self {
        let name = format!("Im{}", self.images.len() + 1);
        let samples = vec![shade; (px_w * px_h * 3) as usize];
        let stream = Stream::new(
            dictionary! {
                "Type" => "XObject",
                "Subtype" => "Image",
                "Width" => px_w,
                "Height" => px_h,
                "ColorSpace" => "DeviceRGB",
                "BitsPerComponent" => 8,
            },
            samples,
        );
        self.ops.extend([
            Operation::new("q", vec![]),
            Operation::new(
                "cm",
                vec![w.into(), 0.into(), 0.into(), h.into(), x.into(), y.into()],
            ),
            Operation::new("Do", vec![Object::Name(name.clone().into_bytes())]),
            Operation::new("Q", vec![]),
        ]);
        self.images.push((name, stream));
        self
    }

    /// Append content operators as they are.
    pub fn raw(mut self, ops: Vec<Operation>) -> Self {
        self.ops.extend(ops);
        self
    }

    /// Draw `inner` as a Form XObject with the given `/Matrix`, wrapped in
    /// `q`/`Q`. The form carries its own resources.
    pub fn form(mut self, matrix: [i64; 6], inner: PageBuilder) -> Self {
        let name = format!("Fm{}", self.forms.len() + 1);
        self.ops.extend([
            Operation::new("q", vec![]),
            Operation::new("Do", vec![Object::Name(name.clone().into_bytes())]),
            Operation::new("Q", vec![]),
        ]);
        self.forms.push((name, matrix, inner));
        self
    }

    /// Give the page an unreadable content entry.
    pub fn broken(mut self) -> Self {
        self.broken = true;
        self
    }
}

/// Build a PDF with the given pages.
pub fn build_pdf(pages: Vec<PageBuilder>) -> Vec<u8> {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();
    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica",
    });

    let mut kids = Vec::new();
    for page in pages {
        let xobjects = add_xobjects(&mut doc, font_id, page.images, page.forms);
        let resources_id = doc.add_object(dictionary! {
            "Font" => dictionary! { "F1" => font_id },
            "XObject" => xobjects,
        });

        let contents: Object = if page.broken {
            Object::Integer(5)
        } else {
            let content = Content { operations: page.ops };
            let id = doc.add_object(Stream::new(dictionary! {}, content.encode().unwrap()));
            id.into()
        };

        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => contents,
            "Resources" => resources_id,
        });
        kids.push(Object::from(page_id));
    }

    let count = kids.len() as i64;
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => count,
            "MediaBox" => vec![0.into(), 0.into(), PAGE_WIDTH.into(), PAGE_HEIGHT.into()],
        }),
    );
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    let mut out = Vec::new();
    doc.save_to(&mut out).unwrap();
    out
}

/// Store images and forms, returning the XObject resource dictionary that
/// names them.
fn add_xobjects(
    doc: &mut Document,
    font_id: ObjectId,
    images: Vec<(String, Stream)>,
    forms: Vec<(String, [i64; 6], PageBuilder)>,
) -> Dictionary {
    let mut xobjects = Dictionary::new();
    for (name, stream) in images {
        let id = doc.add_object(stream);
        xobjects.set(name.into_bytes(), id);
    }
    for (name, matrix, inner) in forms {
        let inner_xobjects = add_xobjects(doc, font_id, inner.images, inner.forms);
        let content = Content { operations: inner.ops };
        let stream = Stream::new(
            dictionary! {
                "Type" => "XObject",
                "Subtype" => "Form",
                "BBox" => vec![0.into(), 0.into(), PAGE_WIDTH.into(), PAGE_HEIGHT.into()],
                "Matrix" => matrix.iter().map(|&v| Object::Integer(v)).collect::<Vec<_>>(),
                "Resources" => dictionary! {
                    "Font" => dictionary! { "F1" => font_id },
                    "XObject" => inner_xobjects,
                },
            },
            content.encode().unwrap(),
        );
        let id = doc.add_object(stream);
        xobjects.set(name.into_bytes(), id);
    }
    xobjects
}

/// Font referenced by name; no file needed.
pub fn font() -> FontAsset {
    FontAsset::named("SimSun")
}

/// Deterministic engine: prefixes the text with a Chinese marker.
pub fn prefix_engine() -> Arc<dyn Translator> {
    Arc::new(|text: &str, _: &GenerationConfig| -> Result<String> { Ok(format!("译文 {}", text)) })
}

/// Engine that counts its calls and answers like [`prefix_engine`].
#[derive(Default)]
pub struct CountingEngine {
    pub calls: AtomicUsize,
}

impl CountingEngine {
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl Translator for CountingEngine {
    fn translate(&self, text: &str, _config: &GenerationConfig) -> Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(format!("译文 {}", text))
    }

    fn name(&self) -> &str {
        "counting"
    }
}

/// Engine that hangs on any text containing `trigger`.
pub struct SlowEngine {
    pub trigger: &'static str,
    pub delay: Duration,
}

impl Translator for SlowEngine {
    fn translate(&self, text: &str, _config: &GenerationConfig) -> Result<String> {
        if text.contains(self.trigger) {
            std::thread::sleep(self.delay);
        }
        Ok(format!("译文 {}", text))
    }
}

/// `word/document.xml` of a DOCX package.
pub fn document_xml(docx: &[u8]) -> String {
    let mut archive = zip::ZipArchive::new(Cursor::new(docx)).unwrap();
    let mut xml = String::new();
    archive
        .by_name("word/document.xml")
        .unwrap()
        .read_to_string(&mut xml)
        .unwrap();
    xml
}
