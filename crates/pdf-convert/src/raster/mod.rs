//! Page rasterization
//!
//! Any page that knows its size and can paint itself at a scale implements
//! [`RasterPage`]. Assembled pages render natively through `image`; pages of
//! arbitrary PDFs render through pdfium when the `pdfium` feature is on.

mod native;
#[cfg(feature = "pdfium")]
mod pdfium;

use image::RgbaImage;
use tokio::sync::mpsc;

use crate::constants::MAX_SURFACE_PIXELS;
use crate::options::check_render_scale;
use crate::types::{ConvertError, Result};
use crate::worker::WorkerPool;

#[cfg(feature = "pdfium")]
pub use pdfium::{PdfiumPage, PdfiumRenderer, init_pdfium, load_pdf_pages};

/// A page that can be rendered to pixels
pub trait RasterPage: Send + Sync + 'static {
    /// Page size in PDF points (1/72 inch)
    fn page_size_pt(&self) -> (f32, f32);

    /// Paint the page onto a surface of [`surface_size`] pixels
    fn render(&self, scale: f32) -> Result<RgbaImage>;
}

/// One item of a multi-page rasterization
#[derive(Debug)]
pub struct RasterizedPage {
    pub page_index: usize,
    pub result: Result<RgbaImage>,
}

/// Pixel size of a page rendered at `scale`: `floor(points * scale)` per axis
pub fn surface_size(page_size_pt: (f32, f32), scale: f32) -> (u32, u32) {
    let (w, h) = page_size_pt;
    let to_px = |pt: f32| {
        let px = (pt as f64 * scale as f64).floor();
        px.clamp(0.0, u32::MAX as f64) as u32
    };
    (to_px(w), to_px(h))
}

/// Render a single page
pub fn rasterize<P: RasterPage + ?Sized>(page: &P, scale: f32) -> Result<RgbaImage> {
    check_render_scale(scale)?;
    page.render(scale)
}

/// Render every page on `pool`, streaming results as they finish.
///
/// Items arrive in completion order, tagged with their index. A failed page
/// does not stop the others. Dropping the receiver abandons pages that have
/// not started yet.
pub fn rasterize_pages<P: RasterPage>(
    pool: &WorkerPool,
    pages: Vec<P>,
    scale: f32,
) -> Result<mpsc::UnboundedReceiver<RasterizedPage>> {
    check_render_scale(scale)?;

    let (tx, rx) = mpsc::unbounded_channel();
    for (page_index, page) in pages.into_iter().enumerate() {
        let handle = pool.dispatch(move || page.render(scale));
        let tx = tx.clone();
        tokio::spawn(async move {
            tokio::select! {
                _ = tx.closed() => {
                    log::debug!("Receiver gone, abandoning page {}", page_index);
                }
                result = handle.join() => {
                    let result = result.map_err(|e| e.at_page(page_index));
                    if let Err(e) = &result {
                        log::warn!("Page {} failed to render: {}", page_index, e);
                    }
                    let _ = tx.send(RasterizedPage { page_index, result });
                }
            }
        });
    }

    Ok(rx)
}

/// Byte length of a `width` x `height` RGBA surface, refusing sizes that
/// cannot be backed
pub(crate) fn check_surface(width: u32, height: u32) -> Result<usize> {
    if width == 0 || height == 0 {
        return Err(surface_failure(format!(
            "empty {}x{} surface",
            width, height
        )));
    }
    let pixels = (width as u64) * (height as u64);
    if pixels > MAX_SURFACE_PIXELS {
        return Err(surface_failure(format!(
            "{}x{} surface exceeds the {} pixel limit",
            width, height, MAX_SURFACE_PIXELS
        )));
    }
    usize::try_from(pixels * 4)
        .map_err(|_| surface_failure(format!("{}x{} surface is too large", width, height)))
}

/// Allocate a white surface
pub(crate) fn allocate_surface(width: u32, height: u32) -> Result<RgbaImage> {
    let len = check_surface(width, height)?;
    let mut buffer = Vec::new();
    if let Err(e) = buffer.try_reserve_exact(len) {
        return Err(surface_failure(format!(
            "cannot allocate {}x{} surface: {}",
            width, height, e
        )));
    }
    buffer.resize(len, 255);

    RgbaImage::from_raw(width, height, buffer).ok_or_else(|| {
        surface_failure(format!(
            "surface buffer does not match {}x{}",
            width, height
        ))
    })
}

fn surface_failure(reason: String) -> ConvertError {
    ConvertError::PageRenderFailure {
        page_index: 0,
        reason,
    }
}

impl ConvertError {
    /// Attach the page index to a render failure
    pub(crate) fn at_page(self, index: usize) -> Self {
        match self {
            ConvertError::PageRenderFailure { reason, .. } => ConvertError::PageRenderFailure {
                page_index: index,
                reason,
            },
            other => other,
        }
    }
}
