//! Lossy image recompression

use std::sync::Arc;

use image::imageops::FilterType;

use crate::codec;
use crate::naming::compressed_file_name;
use crate::options::RecompressOptions;
use crate::types::{ConvertError, Dimensions, Result, SourceImage};
use crate::worker::WorkerPool;

const JPEG_MIME: &str = "image/jpeg";

/// Result of recompressing one image
#[derive(Debug, Clone)]
pub struct Recompressed {
    pub image: SourceImage,
    pub original_bytes: usize,
    pub compressed_bytes: usize,
}

impl Recompressed {
    /// `(original - compressed) / original * 100`; negative when the output grew
    pub fn reduction_percent(&self) -> f64 {
        reduction_percent(self.original_bytes, self.compressed_bytes)
    }
}

/// An image the batch could not recompress
#[derive(Debug)]
pub struct FailedItem {
    pub index: usize,
    pub name: String,
    pub error: ConvertError,
}

#[derive(Debug, Default)]
pub struct BatchOutcome {
    pub succeeded: Vec<Recompressed>,
    pub failed: Vec<FailedItem>,
}

impl BatchOutcome {
    pub fn total_original_bytes(&self) -> usize {
        self.succeeded.iter().map(|r| r.original_bytes).sum()
    }

    pub fn total_compressed_bytes(&self) -> usize {
        self.succeeded.iter().map(|r| r.compressed_bytes).sum()
    }

    pub fn total_reduction_percent(&self) -> f64 {
        reduction_percent(self.total_original_bytes(), self.total_compressed_bytes())
    }
}

fn reduction_percent(original: usize, compressed: usize) -> f64 {
    if original == 0 {
        return 0.0;
    }
    (original as f64 - compressed as f64) / original as f64 * 100.0
}

/// Size of an image scaled so its longer side is at most `max_dimension`
pub fn bounded_dimensions(dims: Dimensions, max_dimension: u32) -> Dimensions {
    if dims.longest_side() <= max_dimension {
        return dims;
    }
    let scale = max_dimension as f64 / dims.longest_side() as f64;
    let shorter = |side: u32| ((side as f64 * scale).round() as u32).max(1);
    if dims.width >= dims.height {
        Dimensions::new(max_dimension, shorter(dims.height))
    } else {
        Dimensions::new(shorter(dims.width), max_dimension)
    }
}

/// Re-encode `image` as JPEG, downscaling it first when its longer side
/// exceeds `max_dimension`.
///
/// `quality` is a fraction in `(0, 1]`. Output that ends up larger than the
/// input is still returned.
pub fn recompress(image: &SourceImage, quality: f32, max_dimension: u32) -> Result<Recompressed> {
    if !(quality > 0.0 && quality <= 1.0) {
        return Err(ConvertError::Config(format!(
            "Quality must be in (0, 1], got {}",
            quality
        )));
    }
    if max_dimension == 0 {
        return Err(ConvertError::Config(
            "Maximum dimension must be positive".to_string(),
        ));
    }

    let decoded = codec::decode(image)?;
    let source = Dimensions::new(decoded.width(), decoded.height());
    let target = bounded_dimensions(source, max_dimension);
    let resized = if target == source {
        decoded
    } else {
        decoded.resize_exact(target.width, target.height, FilterType::Lanczos3)
    };

    let jpeg_quality = (quality * 100.0).round() as u8;
    let bytes = codec::encode_jpeg(&codec::flatten(&resized), jpeg_quality)?;

    let result = Recompressed {
        original_bytes: image.len(),
        compressed_bytes: bytes.len(),
        image: SourceImage::new(compressed_file_name(image.name()), JPEG_MIME, bytes)
            .with_dimensions(target.width, target.height),
    };
    log::debug!(
        "{}: {}x{} -> {}x{}, {} -> {} bytes ({:.1}%)",
        image.name(),
        source.width,
        source.height,
        target.width,
        target.height,
        result.original_bytes,
        result.compressed_bytes,
        result.reduction_percent()
    );
    Ok(result)
}

/// Recompress every image on `pool`.
///
/// Invalid options fail the call up front; after that each image succeeds
/// or fails on its own and results keep input order.
pub async fn recompress_batch(
    pool: &WorkerPool,
    images: &[Arc<SourceImage>],
    options: &RecompressOptions,
) -> Result<BatchOutcome> {
    options.validate()?;
    let RecompressOptions {
        quality,
        max_dimension_px,
    } = *options;

    let handles: Vec<_> = images
        .iter()
        .map(|image| {
            let image = Arc::clone(image);
            pool.dispatch(move || recompress(&image, quality, max_dimension_px))
        })
        .collect();

    let mut outcome = BatchOutcome::default();
    for (index, (image, handle)) in images.iter().zip(handles).enumerate() {
        match handle.join().await {
            Ok(result) => outcome.succeeded.push(result),
            Err(error) => {
                log::warn!("Failed to compress {}: {}", image.name(), error);
                outcome.failed.push(FailedItem {
                    index,
                    name: image.name().to_string(),
                    error,
                });
            }
        }
    }

    log::info!(
        "Compressed {} of {} image(s), saved {:.1}%",
        outcome.succeeded.len(),
        images.len(),
        outcome.total_reduction_percent()
    );
    Ok(outcome)
}
