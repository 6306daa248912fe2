use crate::codec;
use crate::types::*;
use image::RgbaImage;
use image::imageops::FilterType;

/// A small RGBA thumbnail of a staged image
#[derive(Debug, Clone)]
pub struct Preview {
    pub image: RgbaImage,
}

impl Preview {
    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    pub fn byte_len(&self) -> usize {
        self.image.as_raw().len()
    }
}

/// Generate a preview of an image
/// The longer side is at most `max_edge` pixels; smaller images are not enlarged
pub fn generate_preview(image: &SourceImage, max_edge: u32) -> Result<Preview> {
    if max_edge == 0 {
        return Err(ConvertError::Config(
            "Preview size must be positive".to_string(),
        ));
    }

    let decoded = codec::decode(image)?;
    let thumbnail = if decoded.width().max(decoded.height()) <= max_edge {
        decoded.to_rgba8()
    } else {
        decoded
            .resize(max_edge, max_edge, FilterType::Triangle)
            .to_rgba8()
    };

    Ok(Preview { image: thumbnail })
}
