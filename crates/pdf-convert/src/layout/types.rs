//! Layout data types for page assembly
//!
//! All lengths are millimetres. Rectangles use a top-left origin, the way
//! the page is read; the PDF writer flips them into PDF user space.

use crate::constants::mm_to_pt;
use crate::types::{ConvertError, Orientation, PaperSize, Result};

/// A rectangle on the page, in millimetres, origin at the top-left corner
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PlacementRect {
    /// Left edge
    pub x: f32,
    /// Top edge (measured downwards from the top of the page)
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl PlacementRect {
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Shift the rectangle by the given offsets
    pub fn offset(self, dx: f32, dy: f32) -> Self {
        Self {
            x: self.x + dx,
            y: self.y + dy,
            ..self
        }
    }

    /// Right edge x coordinate
    pub fn right(&self) -> f32 {
        self.x + self.width
    }

    /// Bottom edge y coordinate
    pub fn bottom(&self) -> f32 {
        self.y + self.height
    }

    pub fn aspect_ratio(&self) -> f32 {
        self.width / self.height
    }
}

/// Physical page description used to build every page of a document.
///
/// Construct through [`PageGeometry::new`] or [`PageGeometry::from_paper`];
/// both reject margins that leave no usable area.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageGeometry {
    page_width_mm: f32,
    page_height_mm: f32,
    margin_mm: f32,
    spacing_mm: f32,
}

impl PageGeometry {
    pub fn new(
        page_width_mm: f32,
        page_height_mm: f32,
        margin_mm: f32,
        spacing_mm: f32,
    ) -> Result<Self> {
        let geometry = Self {
            page_width_mm,
            page_height_mm,
            margin_mm,
            spacing_mm,
        };
        geometry.validate()?;
        Ok(geometry)
    }

    pub fn from_paper(
        paper: PaperSize,
        orientation: Orientation,
        margin_mm: f32,
        spacing_mm: f32,
    ) -> Result<Self> {
        let (w, h) = paper.dimensions_with_orientation(orientation);
        Self::new(w, h, margin_mm, spacing_mm)
    }

    fn validate(&self) -> Result<()> {
        // NaN fails every comparison below, so it is rejected too
        if !(self.page_width_mm > 0.0 && self.page_height_mm > 0.0) {
            return Err(ConvertError::InvalidGeometry(format!(
                "page size must be positive, got {} x {} mm",
                self.page_width_mm, self.page_height_mm
            )));
        }
        if !(self.margin_mm >= 0.0) {
            return Err(ConvertError::InvalidGeometry(format!(
                "margin must not be negative, got {} mm",
                self.margin_mm
            )));
        }
        if !(self.spacing_mm >= 0.0) {
            return Err(ConvertError::InvalidGeometry(format!(
                "spacing must not be negative, got {} mm",
                self.spacing_mm
            )));
        }
        if !(self.usable_width_mm() > 0.0 && self.usable_height_mm() > 0.0) {
            return Err(ConvertError::InvalidGeometry(format!(
                "a {} mm margin leaves no usable area on a {} x {} mm page",
                self.margin_mm, self.page_width_mm, self.page_height_mm
            )));
        }
        Ok(())
    }

    pub fn page_width_mm(&self) -> f32 {
        self.page_width_mm
    }

    pub fn page_height_mm(&self) -> f32 {
        self.page_height_mm
    }

    pub fn margin_mm(&self) -> f32 {
        self.margin_mm
    }

    pub fn spacing_mm(&self) -> f32 {
        self.spacing_mm
    }

    pub fn usable_width_mm(&self) -> f32 {
        self.page_width_mm - 2.0 * self.margin_mm
    }

    pub fn usable_height_mm(&self) -> f32 {
        self.page_height_mm - 2.0 * self.margin_mm
    }

    /// The page area inside the margins
    pub fn usable_rect(&self) -> PlacementRect {
        PlacementRect::new(
            self.margin_mm,
            self.margin_mm,
            self.usable_width_mm(),
            self.usable_height_mm(),
        )
    }

    /// Page size in PDF points
    pub fn page_size_pt(&self) -> (f32, f32) {
        (mm_to_pt(self.page_width_mm), mm_to_pt(self.page_height_mm))
    }
}
