//! Single-page composition

use std::sync::Arc;

use crate::codec;
use crate::types::{ConvertError, Dimensions, EmbedKind, FitMode, Result, SourceImage};

use super::{PageGeometry, PlacementRect, fit};

/// One assembled page: a white background, the margins, and one placed image
#[derive(Debug, Clone)]
pub struct Page {
    image: Arc<SourceImage>,
    source_dimensions: Dimensions,
    geometry: PageGeometry,
    fit_mode: FitMode,
    placement: PlacementRect,
    embed_kind: EmbedKind,
}

impl Page {
    pub fn image(&self) -> &Arc<SourceImage> {
        &self.image
    }

    /// Pixel dimensions of the source image
    pub fn source_dimensions(&self) -> Dimensions {
        self.source_dimensions
    }

    pub fn geometry(&self) -> &PageGeometry {
        &self.geometry
    }

    pub fn fit_mode(&self) -> FitMode {
        self.fit_mode
    }

    /// Image rectangle in page coordinates (mm, top-left origin).
    ///
    /// Under [`FitMode::Cover`] this may extend past [`Page::clip_rect`].
    pub fn placement(&self) -> PlacementRect {
        self.placement
    }

    /// The usable area; nothing is drawn outside of it
    pub fn clip_rect(&self) -> PlacementRect {
        self.geometry.usable_rect()
    }

    /// Part of the placement that ends up visible after clipping
    pub fn visible_rect(&self) -> PlacementRect {
        let clip = self.clip_rect();
        let x = self.placement.x.max(clip.x);
        let y = self.placement.y.max(clip.y);
        let right = self.placement.right().min(clip.right());
        let bottom = self.placement.bottom().min(clip.bottom());
        PlacementRect::new(x, y, (right - x).max(0.0), (bottom - y).max(0.0))
    }

    pub fn embed_kind(&self) -> EmbedKind {
        self.embed_kind
    }
}

/// Build one page for `image`.
///
/// Reads the image header when the dimensions were not supplied at
/// admission. Fails with [`ConvertError::UnsupportedImageKind`] when the
/// declared MIME type cannot be decoded.
pub fn compose_page(
    image: &Arc<SourceImage>,
    geometry: &PageGeometry,
    mode: FitMode,
) -> Result<Page> {
    // Resolving the format rejects unknown MIME types even if dimensions are known
    codec::image_format(image.mime())?;

    let dims = match image.dimensions() {
        Some(dims) => dims,
        None => codec::probe_dimensions(image)?,
    };
    if dims.width == 0 || dims.height == 0 {
        return Err(ConvertError::unsupported(
            image.mime(),
            format!("{} has zero-sized dimensions", image.name()),
        ));
    }

    let usable = geometry.usable_rect();
    let placement = fit(
        dims.width as f32,
        dims.height as f32,
        usable.width,
        usable.height,
        mode,
    )
    .offset(usable.x, usable.y);

    log::debug!(
        "Placed {} ({}x{} px) at {:.2},{:.2} size {:.2}x{:.2} mm",
        image.name(),
        dims.width,
        dims.height,
        placement.x,
        placement.y,
        placement.width,
        placement.height
    );

    Ok(Page {
        image: Arc::clone(image),
        source_dimensions: dims,
        geometry: *geometry,
        fit_mode: mode,
        placement,
        embed_kind: image.embed_kind(),
    })
}
