//! Font dictionary lookups needed for glyph positioning.

use lopdf::{Dictionary, Object};

use crate::model::FontDescriptor;

use super::backend::LopdfBackend;

/// Width and naming information for one font resource.
#[derive(Debug, Clone)]
pub struct FontMetrics {
    /// BaseFont name, or the resource name if absent
    pub base_font: String,
    /// /FontDescriptor /Flags, 0 if absent
    pub flags: i64,
    first_char: i64,
    widths: Vec<f32>,
    default_width: f32,
    /// Composite (Type0) fonts use two-byte codes
    pub two_byte: bool,
}

impl FontMetrics {
    /// Read metrics from a font dictionary.
    pub fn from_dict(
        backend: &LopdfBackend,
        resource_name: &[u8],
        dict: &Dictionary,
        fallback_width: f32,
    ) -> Self {
        let base_font = dict
            .get(b"BaseFont")
            .ok()
            .and_then(|o| backend.resolve(o).as_name().ok())
            .map(|n| String::from_utf8_lossy(n).to_string())
            .unwrap_or_else(|| String::from_utf8_lossy(resource_name).to_string());

        let two_byte = matches!(
            dict.get(b"Subtype").ok().and_then(|o| backend.resolve(o).as_name().ok()),
            Some(b"Type0")
        );

        // Composite fonts keep their descriptor and default width on the descendant.
        let descendant = if two_byte {
            dict.get(b"DescendantFonts")
                .ok()
                .and_then(|o| match backend.resolve(o) {
                    Object::Array(arr) => arr.first(),
                    _ => None,
                })
                .and_then(|o| backend.dict(o))
        } else {
            None
        };
        let metrics_dict = descendant.unwrap_or(dict);

        let descriptor = metrics_dict
            .get(b"FontDescriptor")
            .ok()
            .and_then(|o| backend.dict(o));
        let flags = descriptor
            .and_then(|d| d.get(b"Flags").ok())
            .and_then(|o| backend.resolve(o).as_i64().ok())
            .unwrap_or(0);

        let number = |o: &Object| backend.resolve(o).as_float().ok();

        let (first_char, widths, default_width) = if two_byte {
            let dw = metrics_dict
                .get(b"DW")
                .ok()
                .and_then(number)
                .unwrap_or(1000.0);
            (0, Vec::new(), dw)
        } else {
            let first_char = dict
                .get(b"FirstChar")
                .ok()
                .and_then(|o| backend.resolve(o).as_i64().ok())
                .unwrap_or(0);
            let widths = dict
                .get(b"Widths")
                .ok()
                .and_then(|o| match backend.resolve(o) {
                    Object::Array(arr) => Some(arr.iter().map(|w| number(w).unwrap_or(0.0)).collect()),
                    _ => None,
                })
                .unwrap_or_default();
            let missing = descriptor
                .and_then(|d| d.get(b"MissingWidth").ok())
                .and_then(number)
                .filter(|w| *w > 0.0)
                .unwrap_or(fallback_width);
            (first_char, widths, missing)
        };

        Self {
            base_font,
            flags,
            first_char,
            widths,
            default_width,
            two_byte,
        }
    }

    /// Metrics used when a font resource cannot be found.
    pub fn unknown(name: &[u8], fallback_width: f32) -> Self {
        Self {
            base_font: String::from_utf8_lossy(name).to_string(),
            flags: 0,
            first_char: 0,
            widths: Vec::new(),
            default_width: fallback_width,
            two_byte: false,
        }
    }

    /// Split shown bytes into character codes.
    pub fn codes(&self, bytes: &[u8]) -> Vec<u32> {
        if self.two_byte {
            bytes
                .chunks(2)
                .map(|c| match c {
                    [hi, lo] => u32::from(*hi) << 8 | u32::from(*lo),
                    [b] => u32::from(*b),
                    _ => 0,
                })
                .collect()
        } else {
            bytes.iter().map(|&b| u32::from(b)).collect()
        }
    }

    /// Glyph width in 1/1000 text space units.
    pub fn glyph_width(&self, code: u32) -> f32 {
        let index = i64::from(code) - self.first_char;
        if index >= 0 {
            if let Some(w) = self.widths.get(index as usize) {
                if *w > 0.0 {
                    return *w;
                }
            }
        }
        self.default_width
    }

    pub fn descriptor(&self, size: f32) -> FontDescriptor {
        FontDescriptor::from_font_name(&self.base_font, size).with_flags(self.flags)
    }
}
