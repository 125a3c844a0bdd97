//! PDF backend layer.
//!
//! Wraps `lopdf::Document` and exposes the handful of lookups the span
//! extractor needs: page enumeration, page geometry, content streams and
//! resource dictionaries (with inheritance through the page tree).

use std::collections::BTreeMap;

use lopdf::{Dictionary, Document as LopdfDocument, Object, ObjectId, Stream};

use crate::detect::{detect_format_from_bytes, PdfFormat};
use crate::error::{Error, Result};

/// Page identifier: (object number, generation number).
pub type PageId = ObjectId;

/// Default page size (US Letter) when no MediaBox can be found.
const DEFAULT_MEDIA_BOX: [f32; 4] = [0.0, 0.0, 612.0, 792.0];

/// Maximum number of references followed when resolving an object.
const MAX_REFERENCE_CHAIN: usize = 16;

/// Physical size of a page.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageGeometry {
    /// Page number (1-indexed)
    pub number: u32,
    /// Lower-left corner of the MediaBox
    pub origin_x: f32,
    pub origin_y: f32,
    pub width: f32,
    pub height: f32,
}

impl PageGeometry {
    /// Convert a point in PDF user space (bottom-up) into top-down page space.
    pub fn to_page_space(&self, x: f32, y: f32) -> (f32, f32) {
        (x - self.origin_x, self.origin_y + self.height - y)
    }
}

/// A value from a PDF content stream operand.
#[derive(Debug, Clone, PartialEq)]
pub enum PdfValue {
    Integer(i64),
    Real(f32),
    Name(Vec<u8>),
    Str(Vec<u8>),
    Array(Vec<PdfValue>),
    Other,
}

impl PdfValue {
    pub fn as_number(&self) -> Option<f32> {
        match self {
            PdfValue::Integer(i) => Some(*i as f32),
            PdfValue::Real(r) => Some(*r),
            _ => None,
        }
    }
}

/// A single operation from a PDF content stream.
#[derive(Debug, Clone)]
pub struct ContentOp {
    pub operator: String,
    pub operands: Vec<PdfValue>,
}

impl ContentOp {
    /// Numeric operand at `index`, or `default` if missing or not a number.
    pub fn number(&self, index: usize, default: f32) -> f32 {
        self.operands
            .get(index)
            .and_then(PdfValue::as_number)
            .unwrap_or(default)
    }

    pub fn name(&self, index: usize) -> Option<&[u8]> {
        match self.operands.get(index) {
            Some(PdfValue::Name(n)) => Some(n.as_slice()),
            _ => None,
        }
    }
}

/// Simple text decoding fallback when no encoding is available.
pub fn decode_text_simple(bytes: &[u8]) -> String {
    // UTF-16BE with BOM
    if bytes.len() >= 2 && bytes[0] == 0xFE && bytes[1] == 0xFF {
        let utf16: Vec<u16> = bytes[2..]
            .chunks_exact(2)
            .map(|c| u16::from_be_bytes([c[0], c[1]]))
            .collect();
        return String::from_utf16_lossy(&utf16);
    }

    if let Ok(s) = std::str::from_utf8(bytes) {
        return s.to_string();
    }

    // Latin-1
    bytes.iter().map(|&b| b as char).collect()
}

/// Backend over a loaded `lopdf::Document`.
pub struct LopdfBackend {
    doc: LopdfDocument,
    format: PdfFormat,
}

impl LopdfBackend {
    /// Load from an in-memory byte slice.
    pub fn load_bytes(data: &[u8]) -> Result<Self> {
        let format = detect_format_from_bytes(data)?;
        let doc = LopdfDocument::load_mem(data)?;
        if doc.is_encrypted() {
            return Err(Error::Encrypted);
        }
        Ok(Self { doc, format })
    }

    /// Header version and linearization, as detected before parsing.
    pub fn format(&self) -> &PdfFormat {
        &self.format
    }

    /// Return all pages as (page_number → PageId).
    pub fn pages(&self) -> BTreeMap<u32, PageId> {
        self.doc.get_pages()
    }

    /// Look up a page by number.
    pub fn page_id(&self, number: u32) -> Result<PageId> {
        let pages = self.doc.get_pages();
        pages
            .get(&number)
            .copied()
            .ok_or(Error::PageOutOfRange(number, pages.len() as u32))
    }

    /// Follow references until a direct object is reached.
    pub fn resolve<'a>(&'a self, obj: &'a Object) -> &'a Object {
        let mut current = obj;
        for _ in 0..MAX_REFERENCE_CHAIN {
            match current {
                Object::Reference(id) => match self.doc.get_object(*id) {
                    Ok(next) => current = next,
                    Err(_) => return current,
                },
                _ => return current,
            }
        }
        current
    }

    /// Resolve an object to a dictionary (a stream yields its dictionary).
    pub fn dict<'a>(&'a self, obj: &'a Object) -> Option<&'a Dictionary> {
        match self.resolve(obj) {
            Object::Dictionary(d) => Some(d),
            Object::Stream(s) => Some(&s.dict),
            _ => None,
        }
    }

    /// Resolve an object to a stream.
    pub fn stream<'a>(&'a self, obj: &'a Object) -> Option<&'a Stream> {
        match self.resolve(obj) {
            Object::Stream(s) => Some(s),
            _ => None,
        }
    }

    /// Look up `key` on a page, walking up the page tree for inherited attributes.
    fn inherited(&self, page: PageId, key: &[u8]) -> Option<&Object> {
        let mut node = self.doc.get_dictionary(page).ok();
        for _ in 0..MAX_REFERENCE_CHAIN {
            let dict = node?;
            if let Ok(value) = dict.get(key) {
                return Some(value);
            }
            node = dict.get(b"Parent").ok().and_then(|p| self.dict(p));
        }
        None
    }

    /// MediaBox-derived geometry for a page.
    pub fn page_geometry(&self, number: u32) -> Result<PageGeometry> {
        let page = self.page_id(number)?;
        let media_box = self
            .inherited(page, b"MediaBox")
            .and_then(|obj| match self.resolve(obj) {
                Object::Array(arr) if arr.len() >= 4 => {
                    let mut values = [0.0f32; 4];
                    for (slot, item) in values.iter_mut().zip(arr.iter()) {
                        *slot = self.resolve(item).as_float().ok()?;
                    }
                    Some(values)
                }
                _ => None,
            })
            .unwrap_or(DEFAULT_MEDIA_BOX);

        let [x0, y0, x1, y1] = media_box;
        let width = (x1 - x0).abs();
        let height = (y1 - y0).abs();
        if width < 1.0 || height < 1.0 {
            return Err(Error::Extraction {
                page: number,
                message: format!("degenerate MediaBox {:?}", media_box),
            });
        }

        Ok(PageGeometry {
            number,
            origin_x: x0.min(x1),
            origin_y: y0.min(y1),
            width,
            height,
        })
    }

    /// Resource dictionary of a page (possibly inherited).
    pub fn page_resources(&self, page: PageId) -> Option<&Dictionary> {
        self.inherited(page, b"Resources").and_then(|r| self.dict(r))
    }

    /// Raw stream bytes, decompressed when a filter is present.
    pub fn stream_content(&self, stream: &Stream) -> Result<Vec<u8>> {
        if stream.dict.has(b"Filter") {
            stream
                .decompressed_content()
                .map_err(|e| Error::PdfParse(e.to_string()))
        } else {
            Ok(stream.content.clone())
        }
    }

    /// Return the concatenated content stream bytes for a page.
    pub fn page_content(&self, page: PageId) -> Result<Vec<u8>> {
        let page_dict = self.doc.get_dictionary(page)?;
        let contents = match page_dict.get(b"Contents") {
            Ok(c) => self.resolve(c),
            // A page without content is valid and simply empty.
            Err(_) => return Ok(Vec::new()),
        };

        match contents {
            Object::Stream(s) => self.stream_content(s),
            Object::Array(arr) => {
                let mut content = Vec::new();
                for obj in arr {
                    if let Some(s) = self.stream(obj) {
                        content.extend_from_slice(&self.stream_content(s)?);
                        content.push(b'\n');
                    }
                }
                Ok(content)
            }
            _ => Err(Error::PdfParse("Invalid content stream".to_string())),
        }
    }

    /// Parse raw content stream bytes into a sequence of operations.
    pub fn decode_content(&self, data: &[u8]) -> Result<Vec<ContentOp>> {
        let content =
            lopdf::content::Content::decode(data).map_err(|e| Error::PdfParse(e.to_string()))?;

        Ok(content
            .operations
            .into_iter()
            .map(|op| ContentOp {
                operands: op.operands.iter().map(convert_object).collect(),
                operator: op.operator,
            })
            .collect())
    }

    /// Decode a shown string with the font's encoding, falling back to
    /// simple decoding when the font or encoding is unavailable.
    pub fn decode_text(&self, font: Option<&Dictionary>, bytes: &[u8]) -> String {
        if let Some(font_dict) = font {
            if let Ok(enc) = font_dict.get_font_encoding(&self.doc) {
                if let Ok(text) = LopdfDocument::decode_text(&enc, bytes) {
                    return text;
                }
            }
        }
        decode_text_simple(bytes)
    }
}

/// Convert a `lopdf::Object` to [`PdfValue`].
fn convert_object(obj: &Object) -> PdfValue {
    match obj {
        Object::Integer(i) => PdfValue::Integer(*i),
        Object::Real(r) => PdfValue::Real(*r as f32),
        Object::Name(n) => PdfValue::Name(n.clone()),
        Object::String(b, _) => PdfValue::Str(b.clone()),
        Object::Array(arr) => PdfValue::Array(arr.iter().map(convert_object).collect()),
        _ => PdfValue::Other,
    }
}
