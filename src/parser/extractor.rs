//! Glyph/box extraction from page content streams.
//!
//! [`SpanIter`] walks a page's content operators lazily and yields text and
//! image spans in the order they are drawn. It tracks the graphics state
//! stack (`q`/`Q`/`cm`), the text state (`Tf`, `TL`, `Tc`, `Tw`, `Tz`,
//! `Ts`), the text and line matrices, and descends into Form XObjects.

use std::collections::VecDeque;

use lopdf::Dictionary;

use crate::error::{Error, Result};
use crate::model::{BBox, ImageSpan, Matrix, Span, TextSpan};
use crate::model::text::is_spaceless_script_char;

use super::backend::{ContentOp, LopdfBackend, PageGeometry, PdfValue};
use super::fonts::FontMetrics;
use super::images::decode_image_xobject;
use super::options::ExtractOptions;

/// TJ adjustment (in 1/1000 em) beyond which a word space is assumed.
const TJ_SPACE_THRESHOLD: f32 = 200.0;

/// Approximate ascender/descender as a fraction of the font size.
const ASCENT: f32 = 0.8;
const DESCENT: f32 = 0.2;

/// Entry point for span extraction from a loaded document.
pub struct Extractor<'a> {
    backend: &'a LopdfBackend,
    options: ExtractOptions,
}

impl<'a> Extractor<'a> {
    pub fn new(backend: &'a LopdfBackend, options: ExtractOptions) -> Self {
        Self { backend, options }
    }

    /// Page numbers in document order.
    pub fn page_numbers(&self) -> Vec<u32> {
        self.backend.pages().keys().copied().collect()
    }

    pub fn geometry(&self, page: u32) -> Result<PageGeometry> {
        self.backend.page_geometry(page)
    }

    /// Lazily extract the spans of one page.
    ///
    /// Fails only if the page itself cannot be located or its content
    /// stream cannot be decoded. Problems further down (a broken image, a
    /// missing font, a corrupt form) are logged and skipped.
    pub fn spans(&self, page: u32) -> Result<SpanIter<'a>> {
        let extraction_error = |e: Error| Error::Extraction {
            page,
            message: e.to_string(),
        };

        let geometry = self.backend.page_geometry(page).map_err(extraction_error)?;
        let page_id = self.backend.page_id(page).map_err(extraction_error)?;
        let content = self.backend.page_content(page_id).map_err(extraction_error)?;
        let ops = self.backend.decode_content(&content).map_err(extraction_error)?;
        let resources = self.backend.page_resources(page_id);

        log::debug!("Page {}: {} content operations", page, ops.len());

        Ok(SpanIter {
            backend: self.backend,
            options: self.options.clone(),
            geometry,
            frames: vec![Frame {
                ops: ops.into_iter(),
                resources,
                stack_base: 0,
            }],
            state: GraphicsState::default(),
            stack: Vec::new(),
            text_matrix: Matrix::IDENTITY,
            line_matrix: Matrix::IDENTITY,
            pending: VecDeque::new(),
        })
    }
}

#[derive(Debug, Clone)]
struct TextState {
    font_name: Vec<u8>,
    size: f32,
    leading: f32,
    char_spacing: f32,
    word_spacing: f32,
    /// Horizontal scaling as a fraction (Tz / 100)
    scale: f32,
    rise: f32,
}

impl Default for TextState {
    fn default() -> Self {
        Self {
            font_name: Vec::new(),
            size: 12.0,
            leading: 0.0,
            char_spacing: 0.0,
            word_spacing: 0.0,
            scale: 1.0,
            rise: 0.0,
        }
    }
}

#[derive(Debug, Clone, Default)]
struct GraphicsState {
    ctm: Matrix,
    text: TextState,
}

/// One content stream being walked: the page itself or a Form XObject.
struct Frame<'a> {
    ops: std::vec::IntoIter<ContentOp>,
    resources: Option<&'a Dictionary>,
    /// Graphics stack depth when the frame was entered
    stack_base: usize,
}

/// Lazy, finite iterator over the spans of one page.
pub struct SpanIter<'a> {
    backend: &'a LopdfBackend,
    options: ExtractOptions,
    geometry: PageGeometry,
    frames: Vec<Frame<'a>>,
    state: GraphicsState,
    stack: Vec<GraphicsState>,
    text_matrix: Matrix,
    line_matrix: Matrix,
    pending: VecDeque<Span>,
}

impl<'a> SpanIter<'a> {
    pub fn geometry(&self) -> &PageGeometry {
        &self.geometry
    }

    fn resources(&self) -> Option<&'a Dictionary> {
        self.frames.last().and_then(|f| f.resources)
    }

    /// Look up a named entry in a resource category (`Font`, `XObject`).
    fn resource(&self, category: &[u8], name: &[u8]) -> Option<&'a lopdf::Object> {
        let backend = self.backend;
        let resources = self.resources()?;
        let group = backend.dict(resources.get(category).ok()?)?;
        group.get(name).ok()
    }

    fn current_font(&self) -> (Option<&'a Dictionary>, FontMetrics) {
        let backend = self.backend;
        let name = &self.state.text.font_name;
        let fallback = self.options.default_glyph_width;
        match self.resource(b"Font", name).and_then(|o| backend.dict(o)) {
            Some(dict) => (
                Some(dict),
                FontMetrics::from_dict(backend, name, dict, fallback),
            ),
            None => (None, FontMetrics::unknown(name, fallback)),
        }
    }

    fn execute(&mut self, op: ContentOp) {
        match op.operator.as_str() {
            "q" => self.stack.push(self.state.clone()),
            "Q" => {
                let base = self.frames.last().map(|f| f.stack_base).unwrap_or(0);
                if self.stack.len() > base {
                    if let Some(state) = self.stack.pop() {
                        self.state = state;
                    }
                }
            }
            "cm" if op.operands.len() >= 6 => {
                let m = matrix_from(&op);
                self.state.ctm = m.then(&self.state.ctm);
            }
            "BT" => {
                self.text_matrix = Matrix::IDENTITY;
                self.line_matrix = Matrix::IDENTITY;
            }
            "Tf" => {
                if let Some(name) = op.name(0) {
                    self.state.text.font_name = name.to_vec();
                }
                self.state.text.size = op.number(1, self.state.text.size);
            }
            "TL" => self.state.text.leading = op.number(0, 0.0),
            "Tc" => self.state.text.char_spacing = op.number(0, 0.0),
            "Tw" => self.state.text.word_spacing = op.number(0, 0.0),
            "Tz" => self.state.text.scale = op.number(0, 100.0) / 100.0,
            "Ts" => self.state.text.rise = op.number(0, 0.0),
            "Td" => self.move_line(op.number(0, 0.0), op.number(1, 0.0)),
            "TD" => {
                let ty = op.number(1, 0.0);
                self.state.text.leading = -ty;
                self.move_line(op.number(0, 0.0), ty);
            }
            "Tm" if op.operands.len() >= 6 => {
                self.text_matrix = matrix_from(&op);
                self.line_matrix = self.text_matrix;
            }
            "T*" => self.next_line(),
            "Tj" => {
                if let Some(string @ PdfValue::Str(_)) = op.operands.first() {
                    self.show(std::slice::from_ref(string));
                }
            }
            "TJ" => {
                if let Some(PdfValue::Array(items)) = op.operands.first() {
                    self.show(items);
                }
            }
            "'" => {
                self.next_line();
                if let Some(string @ PdfValue::Str(_)) = op.operands.first() {
                    self.show(std::slice::from_ref(string));
                }
            }
            "\"" => {
                self.state.text.word_spacing = op.number(0, 0.0);
                self.state.text.char_spacing = op.number(1, 0.0);
                self.next_line();
                if let Some(string @ PdfValue::Str(_)) = op.operands.get(2) {
                    self.show(std::slice::from_ref(string));
                }
            }
            "Do" => {
                if let Some(name) = op.name(0) {
                    let name = name.to_vec();
                    self.draw_xobject(&name);
                }
            }
            _ => {}
        }
    }

    fn move_line(&mut self, tx: f32, ty: f32) {
        self.line_matrix = Matrix::translation(tx, ty).then(&self.line_matrix);
        self.text_matrix = self.line_matrix;
    }

    fn next_line(&mut self) {
        let leading = if self.state.text.leading != 0.0 {
            self.state.text.leading
        } else {
            // No TL set: assume single spacing.
            self.state.text.size * 1.2
        };
        self.move_line(0.0, -leading);
    }

    /// Show a sequence of strings and TJ adjustments as one span.
    fn show(&mut self, items: &[PdfValue]) {
        let (font_dict, metrics) = self.current_font();
        let ts = self.state.text.clone();

        let mut text = String::new();
        let mut advance = 0.0f32;

        for item in items {
            match item {
                PdfValue::Str(bytes) => {
                    text.push_str(&self.backend.decode_text(font_dict, bytes));
                    for code in metrics.codes(bytes) {
                        let mut w = metrics.glyph_width(code) / 1000.0 * ts.size + ts.char_spacing;
                        if code == 32 && !metrics.two_byte {
                            w += ts.word_spacing;
                        }
                        advance += w * ts.scale;
                    }
                }
                other => {
                    let Some(adjust) = other.as_number() else {
                        continue;
                    };
                    advance -= adjust / 1000.0 * ts.size * ts.scale;
                    // Large negative adjustments are word breaks.
                    if -adjust > TJ_SPACE_THRESHOLD {
                        if let Some(last) = text.chars().last() {
                            if !last.is_whitespace() && !is_spaceless_script_char(last) {
                                text.push(' ');
                            }
                        }
                    }
                }
            }
        }

        let start_matrix = self.text_matrix;
        self.text_matrix = Matrix::translation(advance, 0.0).then(&self.text_matrix);

        let text = text.trim().to_string();
        if text.is_empty() {
            return;
        }

        let device = start_matrix.then(&self.state.ctm);
        let size = ts.size * device.vertical_scale();
        if size <= 0.0 {
            return;
        }
        let (x_start, baseline) = device.apply(0.0, ts.rise);
        let (x_end, _) = device.apply(advance, ts.rise);

        let (x0, top) = self
            .geometry
            .to_page_space(x_start.min(x_end), baseline + size * ASCENT);
        let (x1, bottom) = self
            .geometry
            .to_page_space(x_start.max(x_end), baseline - size * DESCENT);

        self.pending.push_back(Span::Text(TextSpan::new(
            text,
            BBox::new(x0, top, x1, bottom),
            metrics.descriptor(size),
        )));
    }

    fn draw_xobject(&mut self, name: &[u8]) {
        let backend = self.backend;
        let Some(stream) = self
            .resource(b"XObject", name)
            .and_then(|o| backend.stream(o))
        else {
            log::debug!(
                "Page {}: XObject {} not found",
                self.geometry.number,
                String::from_utf8_lossy(name)
            );
            return;
        };

        let subtype = stream
            .dict
            .get(b"Subtype")
            .ok()
            .and_then(|o| backend.resolve(o).as_name().ok());

        match subtype {
            Some(b"Image") => self.draw_image(name, stream),
            Some(b"Form") => self.enter_form(name, stream),
            _ => {}
        }
    }

    fn draw_image(&mut self, name: &[u8], stream: &'a lopdf::Stream) {
        if !self.options.extract_images {
            return;
        }
        let is_mask = stream
            .dict
            .get(b"ImageMask")
            .ok()
            .and_then(|o| o.as_bool().ok())
            .unwrap_or(false);
        if is_mask {
            return;
        }

        // Images occupy the unit square in their own space.
        let ctm = self.state.ctm;
        let corners = [
            ctm.apply(0.0, 0.0),
            ctm.apply(1.0, 0.0),
            ctm.apply(0.0, 1.0),
            ctm.apply(1.0, 1.0),
        ];
        let (min_x, max_x, min_y, max_y) = corners.iter().fold(
            (f32::MAX, f32::MIN, f32::MAX, f32::MIN),
            |(a, b, c, d), &(x, y)| (a.min(x), b.max(x), c.min(y), d.max(y)),
        );
        let (x0, y0) = self.geometry.to_page_space(min_x, max_y);
        let (x1, y1) = self.geometry.to_page_space(max_x, min_y);
        let bbox = BBox::new(x0, y0, x1, y1);

        if bbox.width() < self.options.min_image_extent || bbox.height() < self.options.min_image_extent
        {
            return;
        }

        match decode_image_xobject(self.backend, stream) {
            Ok(data) => {
                let normalized = bbox.normalized(self.geometry.width, self.geometry.height);
                self.pending.push_back(Span::Image(ImageSpan {
                    data,
                    bbox,
                    normalized,
                }));
            }
            Err(e) => log::warn!(
                "Page {}: skipping image {}: {}",
                self.geometry.number,
                String::from_utf8_lossy(name),
                e
            ),
        }
    }

    fn enter_form(&mut self, name: &[u8], stream: &'a lopdf::Stream) {
        let backend = self.backend;
        if self.frames.len() > self.options.max_form_depth {
            log::warn!(
                "Page {}: form {} nested too deeply, skipped",
                self.geometry.number,
                String::from_utf8_lossy(name)
            );
            return;
        }

        let ops = match backend
            .stream_content(stream)
            .and_then(|data| backend.decode_content(&data))
        {
            Ok(ops) => ops,
            Err(e) => {
                log::warn!(
                    "Page {}: skipping form {}: {}",
                    self.geometry.number,
                    String::from_utf8_lossy(name),
                    e
                );
                return;
            }
        };

        let form_matrix = stream
            .dict
            .get(b"Matrix")
            .ok()
            .and_then(|o| match backend.resolve(o) {
                lopdf::Object::Array(arr) if arr.len() >= 6 => {
                    let mut m = [0.0f32; 6];
                    for (slot, v) in m.iter_mut().zip(arr) {
                        *slot = backend.resolve(v).as_float().ok()?;
                    }
                    Some(Matrix(m))
                }
                _ => None,
            })
            .unwrap_or(Matrix::IDENTITY);

        let resources = stream
            .dict
            .get(b"Resources")
            .ok()
            .and_then(|o| backend.dict(o))
            .or(self.resources());

        self.stack.push(self.state.clone());
        self.state.ctm = form_matrix.then(&self.state.ctm);
        self.frames.push(Frame {
            ops: ops.into_iter(),
            resources,
            stack_base: self.stack.len(),
        });
    }

    fn leave_form(&mut self) {
        if let Some(frame) = self.frames.pop() {
            self.stack.truncate(frame.stack_base);
            if !self.frames.is_empty() {
                if let Some(state) = self.stack.pop() {
                    self.state = state;
                }
            }
        }
    }
}

impl Iterator for SpanIter<'_> {
    type Item = Span;

    fn next(&mut self) -> Option<Span> {
        loop {
            if let Some(span) = self.pending.pop_front() {
                return Some(span);
            }
            let next_op = self.frames.last_mut()?.ops.next();
            match next_op {
                Some(op) => self.execute(op),
                None => self.leave_form(),
            }
        }
    }
}

fn matrix_from(op: &ContentOp) -> Matrix {
    Matrix([
        op.number(0, 1.0),
        op.number(1, 0.0),
        op.number(2, 0.0),
        op.number(3, 1.0),
        op.number(4, 0.0),
        op.number(5, 0.0),
    ])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_matrix_from_operands() {
        let op = ContentOp {
            operator: "cm".to_string(),
            operands: vec![
                PdfValue::Integer(2),
                PdfValue::Integer(0),
                PdfValue::Integer(0),
                PdfValue::Real(2.0),
                PdfValue::Integer(10),
                PdfValue::Integer(20),
            ],
        };
        assert_eq!(matrix_from(&op), Matrix([2.0, 0.0, 0.0, 2.0, 10.0, 20.0]));
    }
}
