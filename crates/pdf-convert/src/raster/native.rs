//! Native renderer for assembled pages

use image::RgbaImage;
use image::imageops::{self, FilterType};

use crate::codec;
use crate::constants::mm_to_pt;
use crate::layout::Page;
use crate::types::{ConvertError, Result};

use super::{RasterPage, allocate_surface, surface_size};

impl RasterPage for Page {
    fn page_size_pt(&self) -> (f32, f32) {
        self.geometry().page_size_pt()
    }

    fn render(&self, scale: f32) -> Result<RgbaImage> {
        let (width, height) = surface_size(self.page_size_pt(), scale);
        let mut canvas = allocate_surface(width, height)?;

        let visible = self.visible_rect();
        if visible.width <= 0.0 || visible.height <= 0.0 {
            return Ok(canvas);
        }

        let to_px = |mm: f32| (mm_to_pt(mm) as f64 * scale as f64).round() as i64;
        let left = to_px(visible.x);
        let top = to_px(visible.y);
        let target_w = (to_px(visible.right()) - left).max(1) as u32;
        let target_h = (to_px(visible.bottom()) - top).max(1) as u32;

        let decoded = codec::decode(self.image()).map_err(|e| ConvertError::PageRenderFailure {
            page_index: 0,
            reason: e.to_string(),
        })?;

        // Only the part of the source inside the clip is resized
        let placement = self.placement();
        let (src_w, src_h) = (decoded.width() as f32, decoded.height() as f32);
        let crop_x = ((visible.x - placement.x) / placement.width * src_w).floor().max(0.0) as u32;
        let crop_y = ((visible.y - placement.y) / placement.height * src_h).floor().max(0.0) as u32;
        let crop_w = (visible.width / placement.width * src_w).round().max(1.0) as u32;
        let crop_h = (visible.height / placement.height * src_h).round().max(1.0) as u32;
        let crop_w = crop_w.min(decoded.width().saturating_sub(crop_x)).max(1);
        let crop_h = crop_h.min(decoded.height().saturating_sub(crop_y)).max(1);

        let cropped = decoded.crop_imm(crop_x, crop_y, crop_w, crop_h);
        let resized = cropped.resize_exact(target_w, target_h, FilterType::Lanczos3).to_rgba8();

        log::debug!(
            "Rendering {} into {}x{} px at {},{} on a {}x{} surface",
            self.image().name(),
            target_w,
            target_h,
            left,
            top,
            width,
            height
        );

        imageops::overlay(&mut canvas, &resized, left, top);
        Ok(canvas)
    }
}
