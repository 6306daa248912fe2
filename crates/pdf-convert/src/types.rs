use std::fmt;
use std::sync::Arc;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConvertError {
    #[error("No input images")]
    EmptyInput,
    #[error("At least 2 documents are required, got {found}")]
    InsufficientInput { found: usize },
    #[error("Unsupported image kind {mime:?}: {reason}")]
    UnsupportedImageKind { mime: String, reason: String },
    #[error("Source document #{index} could not be parsed: {reason}")]
    CorruptSource { index: usize, reason: String },
    #[error("Failed to render page {page_index}: {reason}")]
    PageRenderFailure { page_index: usize, reason: String },
    #[error("Invalid page geometry: {0}")]
    InvalidGeometry(String),
    #[error("Invalid configuration: {0}")]
    Config(String),
    #[error("PDF error: {0}")]
    Pdf(#[from] lopdf::Error),
    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Task join error: {0}")]
    TaskJoin(#[from] tokio::task::JoinError),
    #[error("Worker pool dropped the job before it produced a result")]
    WorkerGone,
}

pub type Result<T> = std::result::Result<T, ConvertError>;

/// Short, user-facing summary of an error. Diagnostic detail stays in the logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    NothingToProcess,
    NotEnoughFiles,
    UnsupportedFile,
    DamagedFile,
    RenderFailed,
    BadSettings,
    Internal,
}

impl ErrorCategory {
    pub fn message(self) -> &'static str {
        match self {
            ErrorCategory::NothingToProcess => "Add at least one image first.",
            ErrorCategory::NotEnoughFiles => "Add at least two PDF files to merge.",
            ErrorCategory::UnsupportedFile => "One of the files is not a supported image.",
            ErrorCategory::DamagedFile => "One of the PDF files could not be read.",
            ErrorCategory::RenderFailed => "A page could not be rendered.",
            ErrorCategory::BadSettings => "The page settings leave no room for the image.",
            ErrorCategory::Internal => "Something went wrong while processing the files.",
        }
    }
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.message())
    }
}

impl ConvertError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            ConvertError::EmptyInput => ErrorCategory::NothingToProcess,
            ConvertError::InsufficientInput { .. } => ErrorCategory::NotEnoughFiles,
            ConvertError::UnsupportedImageKind { .. } | ConvertError::Image(_) => {
                ErrorCategory::UnsupportedFile
            }
            ConvertError::CorruptSource { .. } | ConvertError::Pdf(_) => {
                ErrorCategory::DamagedFile
            }
            ConvertError::PageRenderFailure { .. } => ErrorCategory::RenderFailed,
            ConvertError::InvalidGeometry(_) | ConvertError::Config(_) => {
                ErrorCategory::BadSettings
            }
            ConvertError::Io(_) | ConvertError::TaskJoin(_) | ConvertError::WorkerGone => {
                ErrorCategory::Internal
            }
        }
    }

    pub(crate) fn unsupported(mime: &str, reason: impl fmt::Display) -> Self {
        ConvertError::UnsupportedImageKind {
            mime: mime.to_string(),
            reason: reason.to_string(),
        }
    }
}

/// Paper orientation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum Orientation {
    /// Portrait: height > width
    #[default]
    Portrait,
    /// Landscape: width > height
    Landscape,
}

/// Supported page sizes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum PaperSize {
    #[default]
    A4,
    Letter,
}

impl PaperSize {
    /// Get base dimensions (always portrait)
    pub fn dimensions_mm(self) -> (f32, f32) {
        match self {
            PaperSize::A4 => (210.0, 297.0),
            PaperSize::Letter => (215.9, 279.4),
        }
    }

    /// Get dimensions with orientation applied
    pub fn dimensions_with_orientation(self, orientation: Orientation) -> (f32, f32) {
        let (w, h) = self.dimensions_mm();
        match orientation {
            Orientation::Portrait => (w, h),
            Orientation::Landscape => (h, w),
        }
    }
}

/// How a source image is scaled into the usable rectangle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum FitMode {
    /// Whole image visible, blank space allowed
    #[default]
    Contain,
    /// Usable area completely filled, overflow clipped
    Cover,
}

/// How an image is stored inside the generated PDF.
///
/// Derived from the declared MIME type. Anything the table does not name
/// lands on [`EmbedKind::LossyFallback`], which is written as JPEG.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EmbedKind {
    Png,
    Webp,
    Jpeg,
    #[default]
    LossyFallback,
}

impl EmbedKind {
    pub fn from_mime(mime: &str) -> Self {
        let lower = mime.to_ascii_lowercase();
        if lower.contains("png") {
            EmbedKind::Png
        } else if lower.contains("webp") {
            EmbedKind::Webp
        } else if lower.contains("jpeg") || lower.contains("jpg") {
            EmbedKind::Jpeg
        } else {
            EmbedKind::default()
        }
    }

    /// Lossless kinds keep every pixel; the rest go through a JPEG stream.
    pub fn is_lossless(self) -> bool {
        matches!(self, EmbedKind::Png | EmbedKind::Webp)
    }
}

/// Pixel dimensions of a raster image
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Dimensions {
    pub width: u32,
    pub height: u32,
}

impl Dimensions {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    pub fn longest_side(self) -> u32 {
        self.width.max(self.height)
    }
}

/// An image admitted into a working set.
///
/// The payload is shared and never mutated; cloning is cheap.
#[derive(Debug, Clone)]
pub struct SourceImage {
    name: String,
    mime: String,
    bytes: Arc<[u8]>,
    dimensions: Option<Dimensions>,
}

impl SourceImage {
    pub fn new(
        name: impl Into<String>,
        mime: impl Into<String>,
        bytes: impl Into<Arc<[u8]>>,
    ) -> Self {
        Self {
            name: name.into(),
            mime: mime.into(),
            bytes: bytes.into(),
            dimensions: None,
        }
    }

    /// Attach dimensions that are already known (e.g. from the ingestion layer).
    pub fn with_dimensions(mut self, width: u32, height: u32) -> Self {
        self.dimensions = Some(Dimensions::new(width, height));
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn mime(&self) -> &str {
        &self.mime
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub fn dimensions(&self) -> Option<Dimensions> {
        self.dimensions
    }

    pub fn embed_kind(&self) -> EmbedKind {
        EmbedKind::from_mime(&self.mime)
    }
}
