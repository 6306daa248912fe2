use crate::constants::*;
use crate::layout::PageGeometry;
use crate::types::*;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Page setup for images-to-PDF assembly
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct AssemblyOptions {
    pub page_size: PaperSize,
    pub orientation: Orientation,
    pub margin_mm: f32,
    pub spacing_mm: f32,
    pub fit_mode: FitMode,
}

impl Default for AssemblyOptions {
    fn default() -> Self {
        Self {
            page_size: PaperSize::A4,
            orientation: Orientation::Portrait,
            margin_mm: DEFAULT_MARGIN_MM,
            spacing_mm: DEFAULT_SPACING_MM,
            fit_mode: FitMode::Contain,
        }
    }
}

impl AssemblyOptions {
    /// Validate the options
    pub fn validate(&self) -> Result<()> {
        if !MARGIN_RANGE_MM.contains(&self.margin_mm) {
            return Err(ConvertError::Config(format!(
                "Margin must be between {} and {} mm, got {}",
                MARGIN_RANGE_MM.start(),
                MARGIN_RANGE_MM.end(),
                self.margin_mm
            )));
        }
        if !SPACING_RANGE_MM.contains(&self.spacing_mm) {
            return Err(ConvertError::Config(format!(
                "Spacing must be between {} and {} mm, got {}",
                SPACING_RANGE_MM.start(),
                SPACING_RANGE_MM.end(),
                self.spacing_mm
            )));
        }
        Ok(())
    }

    /// Validate and derive the page geometry
    pub fn geometry(&self) -> Result<PageGeometry> {
        self.validate()?;
        PageGeometry::from_paper(
            self.page_size,
            self.orientation,
            self.margin_mm,
            self.spacing_mm,
        )
    }

    /// Load options from JSON file
    #[cfg(feature = "serde")]
    pub async fn load(path: impl AsRef<std::path::Path>) -> Result<Self> {
        json::load(path).await
    }

    /// Save options to JSON file
    #[cfg(feature = "serde")]
    pub async fn save(&self, path: impl AsRef<std::path::Path>) -> Result<()> {
        json::save(self, path).await
    }
}

/// Settings for lossy image recompression
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct RecompressOptions {
    /// JPEG quality as a fraction (0.1 ..= 1.0)
    pub quality: f32,
    /// Longest allowed side in pixels
    pub max_dimension_px: u32,
}

impl Default for RecompressOptions {
    fn default() -> Self {
        Self {
            quality: DEFAULT_QUALITY,
            max_dimension_px: DEFAULT_MAX_DIMENSION_PX,
        }
    }
}

impl RecompressOptions {
    pub fn validate(&self) -> Result<()> {
        if !QUALITY_RANGE.contains(&self.quality) {
            return Err(ConvertError::Config(format!(
                "Quality must be between {} and {}, got {}",
                QUALITY_RANGE.start(),
                QUALITY_RANGE.end(),
                self.quality
            )));
        }
        if !MAX_DIMENSION_RANGE_PX.contains(&self.max_dimension_px) {
            return Err(ConvertError::Config(format!(
                "Maximum dimension must be between {} and {} px, got {}",
                MAX_DIMENSION_RANGE_PX.start(),
                MAX_DIMENSION_RANGE_PX.end(),
                self.max_dimension_px
            )));
        }
        Ok(())
    }

    #[cfg(feature = "serde")]
    pub async fn load(path: impl AsRef<std::path::Path>) -> Result<Self> {
        json::load(path).await
    }

    #[cfg(feature = "serde")]
    pub async fn save(&self, path: impl AsRef<std::path::Path>) -> Result<()> {
        json::save(self, path).await
    }
}

/// Settings for page rasterization
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct RasterOptions {
    /// Pixels per PDF point
    pub render_scale: f32,
}

impl Default for RasterOptions {
    fn default() -> Self {
        Self {
            render_scale: DEFAULT_RENDER_SCALE,
        }
    }
}

impl RasterOptions {
    pub fn validate(&self) -> Result<()> {
        check_render_scale(self.render_scale)
    }

    #[cfg(feature = "serde")]
    pub async fn load(path: impl AsRef<std::path::Path>) -> Result<Self> {
        json::load(path).await
    }

    #[cfg(feature = "serde")]
    pub async fn save(&self, path: impl AsRef<std::path::Path>) -> Result<()> {
        json::save(self, path).await
    }
}

pub(crate) fn check_render_scale(scale: f32) -> Result<()> {
    if scale.is_finite() && scale > 0.0 {
        Ok(())
    } else {
        Err(ConvertError::Config(format!(
            "Render scale must be a positive number, got {}",
            scale
        )))
    }
}

#[cfg(feature = "serde")]
mod json {
    use super::*;
    use serde::Serialize;
    use serde::de::DeserializeOwned;
    use std::path::Path;

    pub(super) async fn load<T: DeserializeOwned>(path: impl AsRef<Path>) -> Result<T> {
        let bytes = tokio::fs::read(path).await?;
        serde_json::from_slice(&bytes)
            .map_err(|e| ConvertError::Config(format!("Failed to parse config: {}", e)))
    }

    pub(super) async fn save<T: Serialize>(value: &T, path: impl AsRef<Path>) -> Result<()> {
        let json = serde_json::to_string_pretty(value)
            .map_err(|e| ConvertError::Config(format!("Failed to serialize config: {}", e)))?;
        tokio::fs::write(path, json).await?;
        Ok(())
    }
}
