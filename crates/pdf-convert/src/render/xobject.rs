//! Image XObjects for assembled pages
//!
//! Encoding happens off the document so it can run on the worker pool; the
//! finished streams are then added to the output document in page order.

use lopdf::{Dictionary, Document, Object, ObjectId, Stream};

use crate::codec::{self, JpegFrame};
use crate::constants::EMBED_JPEG_QUALITY;
use crate::types::{EmbedKind, Result, SourceImage};

/// An encoded image ready to be added to a document
#[derive(Debug)]
pub struct ImageXObject {
    image: Stream,
    smask: Option<Stream>,
    width: u32,
    height: u32,
}

impl ImageXObject {
    /// Encode `image` according to its embed kind.
    ///
    /// - JPEG sources with one or three components are passed through as is
    /// - PNG and WebP sources are stored losslessly, alpha in a soft mask
    /// - everything else is re-encoded as JPEG
    pub fn encode(image: &SourceImage, kind: EmbedKind) -> Result<Self> {
        match kind {
            EmbedKind::Jpeg => match codec::jpeg_frame(image.bytes()) {
                Some(frame) if can_pass_through(&frame) => {
                    Ok(Self::jpeg_passthrough(image, frame))
                }
                other => {
                    log::debug!("{}: JPEG frame {:?}, re-encoding", image.name(), other);
                    Self::lossy(image)
                }
            },
            EmbedKind::Png | EmbedKind::Webp => Self::lossless(image),
            EmbedKind::LossyFallback => Self::lossy(image),
        }
    }

    /// The stream's own frame header decides `/Width` and `/Height`
    fn jpeg_passthrough(image: &SourceImage, frame: JpegFrame) -> Self {
        if let Some(declared) = image.dimensions() {
            if (declared.width, declared.height) != (frame.width, frame.height) {
                log::warn!(
                    "{}: declared {}x{} but the JPEG frame is {}x{}",
                    image.name(),
                    declared.width,
                    declared.height,
                    frame.width,
                    frame.height
                );
            }
        }

        let color_space = if frame.components == 1 {
            "DeviceGray"
        } else {
            "DeviceRGB"
        };
        let dict = image_dict(frame.width, frame.height, color_space, Some("DCTDecode"));
        Self {
            image: Stream::new(dict, image.bytes().to_vec()).with_compression(false),
            smask: None,
            width: frame.width,
            height: frame.height,
        }
    }

    fn lossless(image: &SourceImage) -> Result<Self> {
        let decoded = codec::decode(image)?;
        let (width, height) = (decoded.width(), decoded.height());

        let smask = if decoded.color().has_alpha() {
            let alpha: Vec<u8> = decoded.to_rgba8().pixels().map(|p| p[3]).collect();
            // Fully opaque images do not need a mask
            if alpha.iter().all(|&a| a == 255) {
                None
            } else {
                let dict = image_dict(width, height, "DeviceGray", None);
                Some(flate_stream(dict, alpha)?)
            }
        } else {
            None
        };

        let rgb = decoded.to_rgb8().into_raw();
        Ok(Self {
            image: flate_stream(image_dict(width, height, "DeviceRGB", None), rgb)?,
            smask,
            width,
            height,
        })
    }

    fn lossy(image: &SourceImage) -> Result<Self> {
        let decoded = codec::decode(image)?;
        let rgb = codec::flatten(&decoded);
        let (width, height) = rgb.dimensions();
        let jpeg = codec::encode_jpeg(&rgb, EMBED_JPEG_QUALITY)?;
        let dict = image_dict(width, height, "DeviceRGB", Some("DCTDecode"));
        Ok(Self {
            image: Stream::new(dict, jpeg).with_compression(false),
            smask: None,
            width,
            height,
        })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn has_soft_mask(&self) -> bool {
        self.smask.is_some()
    }

    /// Add the image (and its mask) to `doc`, returning the image's id
    pub fn add_to(self, doc: &mut Document) -> ObjectId {
        let mut image = self.image;
        if let Some(smask) = self.smask {
            let smask_id = doc.add_object(smask);
            image.dict.set("SMask", Object::Reference(smask_id));
        }
        doc.add_object(image)
    }
}

/// DCT streams are kept only for gray or RGB frames with a known size
fn can_pass_through(frame: &JpegFrame) -> bool {
    matches!(frame.components, 1 | 3) && frame.width > 0 && frame.height > 0
}

fn image_dict(width: u32, height: u32, color_space: &str, filter: Option<&str>) -> Dictionary {
    let mut dict = Dictionary::new();
    dict.set("Type", Object::Name(b"XObject".to_vec()));
    dict.set("Subtype", Object::Name(b"Image".to_vec()));
    dict.set("Width", Object::Integer(width as i64));
    dict.set("Height", Object::Integer(height as i64));
    dict.set("ColorSpace", Object::Name(color_space.as_bytes().to_vec()));
    dict.set("BitsPerComponent", Object::Integer(8));
    if let Some(filter) = filter {
        dict.set("Filter", Object::Name(filter.as_bytes().to_vec()));
    }
    dict
}

fn flate_stream(dict: Dictionary, raw: Vec<u8>) -> Result<Stream> {
    let mut stream = Stream::new(dict, raw);
    stream.compress()?;
    Ok(stream)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{DynamicImage, ImageFormat, Rgba, RgbaImage};
    use std::io::Cursor;

    fn encoded(image: DynamicImage, format: ImageFormat) -> Vec<u8> {
        let mut bytes = Vec::new();
        image.write_to(&mut Cursor::new(&mut bytes), format).unwrap();
        bytes
    }

    fn dict_size(xobject: &ImageXObject) -> (i64, i64) {
        let dict = &xobject.image.dict;
        (
            dict.get(b"Width").unwrap().as_i64().unwrap(),
            dict.get(b"Height").unwrap().as_i64().unwrap(),
        )
    }

    #[test]
    fn test_passthrough_size_comes_from_frame() {
        let bytes = encoded(DynamicImage::new_rgb8(40, 20), ImageFormat::Jpeg);
        let image = SourceImage::new("a.jpg", "image/jpeg", bytes.clone())
            .with_dimensions(20, 40);

        let xobject = ImageXObject::encode(&image, EmbedKind::Jpeg).unwrap();
        assert_eq!((xobject.width(), xobject.height()), (40, 20));
        assert_eq!(dict_size(&xobject), (40, 20));
        assert_eq!(xobject.image.content, bytes);
    }

    #[test]
    fn test_soft_mask_only_for_real_transparency() {
        let mut rgba = RgbaImage::from_pixel(4, 4, Rgba([10, 20, 30, 255]));
        let opaque = SourceImage::new(
            "opaque.png",
            "image/png",
            encoded(DynamicImage::ImageRgba8(rgba.clone()), ImageFormat::Png),
        );
        let xobject = ImageXObject::encode(&opaque, EmbedKind::Png).unwrap();
        assert!(!xobject.has_soft_mask());

        rgba.put_pixel(0, 0, Rgba([0, 0, 0, 0]));
        let clear = SourceImage::new(
            "clear.png",
            "image/png",
            encoded(DynamicImage::ImageRgba8(rgba), ImageFormat::Png),
        );
        let xobject = ImageXObject::encode(&clear, EmbedKind::Png).unwrap();
        assert!(xobject.has_soft_mask());
        assert_eq!(dict_size(&xobject), (4, 4));
    }
}
