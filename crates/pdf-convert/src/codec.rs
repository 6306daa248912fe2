//! Thin adapter over the `image` crate
//!
//! Everything that touches encoded image bytes goes through here so that
//! decode failures surface as [`ConvertError::UnsupportedImageKind`].

use std::io::Cursor;

use image::codecs::jpeg::JpegEncoder;
use image::{DynamicImage, ImageFormat, ImageReader, RgbImage};

use crate::constants::PAGE_BACKGROUND_RGB;
use crate::types::{ConvertError, Dimensions, Result, SourceImage};

/// Resolve a declared MIME type to a decodable format
pub fn image_format(mime: &str) -> Result<ImageFormat> {
    let lower = mime.trim().to_ascii_lowercase();
    let normalized = match lower.as_str() {
        "image/jpg" | "image/pjpeg" => "image/jpeg",
        other => other,
    };

    match ImageFormat::from_mime_type(normalized) {
        Some(format) if format.reading_enabled() => Ok(format),
        Some(_) => Err(ConvertError::unsupported(mime, "no decoder is available")),
        None => Err(ConvertError::unsupported(mime, "not a known image type")),
    }
}

/// Read the pixel dimensions from the image header without decoding pixels
pub fn probe_dimensions(image: &SourceImage) -> Result<Dimensions> {
    let format = image_format(image.mime())?;
    let (width, height) = ImageReader::with_format(Cursor::new(image.bytes()), format)
        .into_dimensions()
        .map_err(|e| ConvertError::unsupported(image.mime(), format!("{}: {}", image.name(), e)))?;
    Ok(Dimensions::new(width, height))
}

/// Fully decode an image as its declared type
pub fn decode(image: &SourceImage) -> Result<DynamicImage> {
    let format = image_format(image.mime())?;
    image::load_from_memory_with_format(image.bytes(), format)
        .map_err(|e| ConvertError::unsupported(image.mime(), format!("{}: {}", image.name(), e)))
}

/// Composite any alpha channel over the page background
pub(crate) fn flatten(image: &DynamicImage) -> RgbImage {
    if !image.color().has_alpha() {
        return image.to_rgb8();
    }

    let rgba = image.to_rgba8();
    let mut out = RgbImage::new(rgba.width(), rgba.height());
    for (dst, src) in out.pixels_mut().zip(rgba.pixels()) {
        let alpha = src[3] as u32;
        for c in 0..3 {
            let bg = PAGE_BACKGROUND_RGB[c] as u32;
            dst[c] = ((src[c] as u32 * alpha + bg * (255 - alpha) + 127) / 255) as u8;
        }
    }
    out
}

/// Baseline JPEG at `quality` (1..=100)
pub(crate) fn encode_jpeg(image: &RgbImage, quality: u8) -> Result<Vec<u8>> {
    let mut out = Vec::new();
    JpegEncoder::new_with_quality(&mut out, quality.clamp(1, 100)).encode_image(image)?;
    Ok(out)
}

/// Frame header of a JPEG stream
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct JpegFrame {
    pub width: u32,
    pub height: u32,
    pub components: u8,
}

/// Read the first start-of-frame header of a JPEG stream.
///
/// Walks the marker segments up to the first SOF. Returns `None` for
/// anything that does not look like a JPEG stream.
pub(crate) fn jpeg_frame(bytes: &[u8]) -> Option<JpegFrame> {
    if bytes.get(..2)? != [0xFF, 0xD8] {
        return None;
    }

    let mut pos = 2;
    while pos + 4 <= bytes.len() {
        if bytes[pos] != 0xFF {
            return None;
        }
        let marker = bytes[pos + 1];
        match marker {
            // Fill bytes
            0xFF => {
                pos += 1;
                continue;
            }
            // Standalone markers without a length
            0x01 | 0xD0..=0xD7 => {
                pos += 2;
                continue;
            }
            0xD9 | 0xDA => return None,
            _ => {}
        }

        let length = u16::from_be_bytes([bytes[pos + 2], bytes[pos + 3]]) as usize;
        let is_frame = matches!(marker, 0xC0..=0xCF) && !matches!(marker, 0xC4 | 0xC8 | 0xCC);
        if is_frame {
            // length(2) precision(1) height(2) width(2) components(1)
            let header = bytes.get(pos + 5..pos + 10)?;
            return Some(JpegFrame {
                height: u16::from_be_bytes([header[0], header[1]]) as u32,
                width: u16::from_be_bytes([header[2], header[3]]) as u32,
                components: header[4],
            });
        }
        pos += 2 + length;
    }
    None
}
