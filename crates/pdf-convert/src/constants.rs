//! Shared constants for conversion
//!
//! This module centralizes magic numbers and the ranges of the
//! configuration surface.

use std::ops::RangeInclusive;

// =============================================================================
// Unit Conversion
// =============================================================================

/// Points per millimeter (1 inch = 72 points, 1 inch = 25.4mm)
pub const POINTS_PER_MM: f32 = 72.0 / 25.4; // ≈ 2.83465

/// Convert millimeters to points
#[inline]
pub fn mm_to_pt(mm: f32) -> f32 {
    mm * POINTS_PER_MM
}

// =============================================================================
// Assembly
// =============================================================================

pub const MARGIN_RANGE_MM: RangeInclusive<f32> = 5.0..=30.0;
pub const SPACING_RANGE_MM: RangeInclusive<f32> = 0.0..=20.0;

pub const DEFAULT_MARGIN_MM: f32 = 10.0;
pub const DEFAULT_SPACING_MM: f32 = 5.0;

/// JPEG quality used when an image has to be re-encoded for embedding
pub const EMBED_JPEG_QUALITY: u8 = 92;

/// Page background (white)
pub const PAGE_BACKGROUND_RGB: [u8; 3] = [255, 255, 255];

pub const DEFAULT_ASSEMBLY_NAME: &str = "images-to-pdf";
pub const DEFAULT_MERGE_NAME: &str = "merged-document";

/// Producer string written to the PDF Info dictionary
pub const PDF_PRODUCER: &str = concat!("pdf-convert ", env!("CARGO_PKG_VERSION"));

// =============================================================================
// Rasterization
// =============================================================================

/// Render scale that keeps extracted pages legible
pub const DEFAULT_RENDER_SCALE: f32 = 2.0;

/// Largest raster surface the renderer agrees to allocate, in pixels
pub const MAX_SURFACE_PIXELS: u64 = 16_384 * 16_384;

// =============================================================================
// Recompression
// =============================================================================

pub const QUALITY_RANGE: RangeInclusive<f32> = 0.1..=1.0;
pub const MAX_DIMENSION_RANGE_PX: RangeInclusive<u32> = 100..=4096;

pub const DEFAULT_QUALITY: f32 = 0.8;
pub const DEFAULT_MAX_DIMENSION_PX: u32 = 1920;

// =============================================================================
// Ingestion / previews
// =============================================================================

pub const PDF_MIME: &str = "application/pdf";
pub const PDF_MAGIC: &[u8] = b"%PDF-";

/// Longest edge of a staged-image preview thumbnail
pub const PREVIEW_MAX_EDGE_PX: u32 = 256;
