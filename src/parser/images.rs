//! Image XObject decoding.

use std::io::Cursor;

use image::{DynamicImage, GrayImage, ImageFormat, RgbImage};
use lopdf::{Object, Stream};

use crate::error::{Error, Result};
use crate::model::ImageData;

use super::backend::LopdfBackend;

/// Decode an image XObject into bytes the composer can embed.
///
/// JPEG data is passed through untouched. Flate/LZW/unfiltered 8-bit Gray
/// or RGB samples are re-encoded as PNG. Anything else is kept as raw
/// samples tagged `application/octet-stream`.
pub fn decode_image_xobject(backend: &LopdfBackend, stream: &Stream) -> Result<ImageData> {
    let dict = &stream.dict;

    let width = dict_u32(backend, dict.get(b"Width").ok())
        .ok_or_else(|| Error::Image("missing /Width".to_string()))?;
    let height = dict_u32(backend, dict.get(b"Height").ok())
        .ok_or_else(|| Error::Image("missing /Height".to_string()))?;
    if width == 0 || height == 0 {
        return Err(Error::Image(format!("empty image {}x{}", width, height)));
    }

    let filter = dict
        .get(b"Filter")
        .ok()
        .map(|f| backend.resolve(f))
        .and_then(|f| match f {
            Object::Name(n) => Some(String::from_utf8_lossy(n).to_string()),
            Object::Array(arr) => arr
                .last()
                .and_then(|o| o.as_name().ok())
                .map(|n| String::from_utf8_lossy(n).to_string()),
            _ => None,
        })
        .unwrap_or_default();

    match filter.as_str() {
        "DCTDecode" => Ok(ImageData {
            bytes: stream.content.clone(),
            mime_type: "image/jpeg".to_string(),
            width,
            height,
        }),
        "JPXDecode" => Ok(ImageData {
            bytes: stream.content.clone(),
            mime_type: "image/jp2".to_string(),
            width,
            height,
        }),
        "FlateDecode" | "LZWDecode" | "" => {
            let samples = backend.stream_content(stream)?;
            let bits = dict_u32(backend, dict.get(b"BitsPerComponent").ok()).unwrap_or(8);
            let components = color_components(backend, dict.get(b"ColorSpace").ok());
            match encode_png(&samples, width, height, bits, components) {
                Some(bytes) => Ok(ImageData {
                    bytes,
                    mime_type: "image/png".to_string(),
                    width,
                    height,
                }),
                None => Ok(ImageData {
                    bytes: samples,
                    mime_type: "application/octet-stream".to_string(),
                    width,
                    height,
                }),
            }
        }
        other => Err(Error::Image(format!("unsupported image filter {}", other))),
    }
}

fn dict_u32(backend: &LopdfBackend, obj: Option<&Object>) -> Option<u32> {
    obj.and_then(|o| backend.resolve(o).as_i64().ok())
        .and_then(|v| u32::try_from(v).ok())
}

/// Number of color components for common color spaces, `None` if unknown.
fn color_components(backend: &LopdfBackend, obj: Option<&Object>) -> Option<u32> {
    let obj = backend.resolve(obj?);
    let name = match obj {
        Object::Name(n) => n.as_slice(),
        Object::Array(arr) => {
            let family = arr.first()?.as_name().ok()?;
            if family == b"ICCBased" {
                let n = backend
                    .dict(arr.get(1)?)
                    .and_then(|d| d.get(b"N").ok())
                    .and_then(|n| backend.resolve(n).as_i64().ok())?;
                return u32::try_from(n).ok();
            }
            family
        }
        _ => return None,
    };
    match name {
        b"DeviceGray" | b"CalGray" => Some(1),
        b"DeviceRGB" | b"CalRGB" => Some(3),
        _ => None,
    }
}

/// Re-encode 8-bit Gray/RGB samples as PNG.
fn encode_png(
    samples: &[u8],
    width: u32,
    height: u32,
    bits: u32,
    components: Option<u32>,
) -> Option<Vec<u8>> {
    if bits != 8 {
        return None;
    }
    let pixels = width as usize * height as usize;
    let image = match components? {
        1 if samples.len() >= pixels => {
            DynamicImage::ImageLuma8(GrayImage::from_raw(width, height, samples[..pixels].to_vec())?)
        }
        3 if samples.len() >= pixels * 3 => DynamicImage::ImageRgb8(RgbImage::from_raw(
            width,
            height,
            samples[..pixels * 3].to_vec(),
        )?),
        _ => return None,
    };

    let mut out = Vec::new();
    image
        .write_to(&mut Cursor::new(&mut out), ImageFormat::Png)
        .ok()?;
    Some(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_png_rgb() {
        let samples = vec![255u8; 2 * 2 * 3];
        let png = encode_png(&samples, 2, 2, 8, Some(3)).unwrap();
        assert_eq!(&png[..4], b"\x89PNG");
    }

    #[test]
    fn test_encode_png_rejects_short_data() {
        assert!(encode_png(&[0u8; 5], 2, 2, 8, Some(3)).is_none());
        assert!(encode_png(&[0u8; 12], 2, 2, 1, Some(3)).is_none());
        assert!(encode_png(&[0u8; 12], 2, 2, 8, None).is_none());
    }
}
