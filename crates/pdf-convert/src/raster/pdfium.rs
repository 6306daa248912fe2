//! Rendering pages of arbitrary PDFs through pdfium
//!
//! Pdfium is not thread safe, so a single render thread owns the library
//! for as long as any [`PdfiumRenderer`] or [`PdfiumPage`] refers to it.
//! Pool workers hand it jobs and wait for the reply.

use std::sync::Arc;
use std::sync::mpsc;
use std::thread;

use image::RgbaImage;
use pdfium_render::prelude::*;

use crate::types::{ConvertError, Result};

use super::{RasterPage, check_surface, surface_size};

/// Initialize Pdfium, trying the vendored library first, then falling back to system
pub fn init_pdfium() -> std::result::Result<Pdfium, PdfiumError> {
    // Vendored copy relative to the working directory (workspace root under cargo)
    let vendor_path = std::env::current_dir().ok().and_then(|mut p| {
        p.push("vendor/pdfium/lib");
        if p.exists() { Some(p) } else { None }
    });

    if let Some(vendor_path) = vendor_path {
        if let Ok(binding) =
            Pdfium::bind_to_library(Pdfium::pdfium_platform_library_name_at_path(&vendor_path))
        {
            return Ok(Pdfium::new(binding));
        }
    }

    Pdfium::bind_to_system_library().map(Pdfium::new)
}

enum Job {
    PageSizes {
        bytes: Arc<Vec<u8>>,
        reply: mpsc::Sender<std::result::Result<Vec<(f32, f32)>, String>>,
    },
    Render {
        bytes: Arc<Vec<u8>>,
        index: u16,
        width: u32,
        height: u32,
        reply: mpsc::Sender<Result<RgbaImage>>,
    },
}

/// Handle to the pdfium render thread. The thread exits when the last
/// handle (including every page loaded through it) is dropped.
#[derive(Debug, Clone)]
pub struct PdfiumRenderer {
    jobs: mpsc::Sender<Job>,
}

impl PdfiumRenderer {
    /// Start the render thread and bind the library on it.
    ///
    /// Blocks until pdfium is bound. Fails with
    /// [`ConvertError::PageRenderFailure`] if no library can be loaded.
    pub fn spawn() -> Result<Self> {
        let (jobs, job_rx) = mpsc::channel::<Job>();
        let (ready_tx, ready_rx) = mpsc::channel();

        thread::Builder::new()
            .name("pdfium".to_string())
            .spawn(move || {
                let pdfium = match init_pdfium() {
                    Ok(pdfium) => {
                        let _ = ready_tx.send(Ok(()));
                        pdfium
                    }
                    Err(e) => {
                        let _ = ready_tx.send(Err(e.to_string()));
                        return;
                    }
                };

                for job in job_rx {
                    match job {
                        Job::PageSizes { bytes, reply } => {
                            let _ = reply.send(page_sizes(&pdfium, &bytes));
                        }
                        Job::Render {
                            bytes,
                            index,
                            width,
                            height,
                            reply,
                        } => {
                            let _ = reply.send(render_page(&pdfium, &bytes, index, width, height));
                        }
                    }
                }
                log::debug!("Pdfium render thread stopped");
            })?;

        match ready_rx.recv() {
            Ok(Ok(())) => Ok(Self { jobs }),
            Ok(Err(reason)) => Err(ConvertError::PageRenderFailure {
                page_index: 0,
                reason: format!("pdfium is unavailable: {}", reason),
            }),
            Err(_) => Err(ConvertError::WorkerGone),
        }
    }

    /// Open `bytes` and describe every page in it
    pub fn load_pages(&self, bytes: Vec<u8>) -> Result<Vec<PdfiumPage>> {
        let bytes = Arc::new(bytes);
        let (reply, reply_rx) = mpsc::channel();
        self.send(Job::PageSizes {
            bytes: Arc::clone(&bytes),
            reply,
        })?;
        let sizes = reply_rx
            .recv()
            .map_err(|_| ConvertError::WorkerGone)?
            .map_err(|reason| ConvertError::CorruptSource { index: 0, reason })?;

        let pages = sizes
            .into_iter()
            .enumerate()
            .map(|(index, size_pt)| {
                let index = u16::try_from(index).map_err(|_| ConvertError::CorruptSource {
                    index: 0,
                    reason: format!("page {} is beyond what pdfium can address", index + 1),
                })?;
                Ok(PdfiumPage {
                    renderer: self.clone(),
                    bytes: Arc::clone(&bytes),
                    index,
                    size_pt,
                })
            })
            .collect::<Result<Vec<_>>>()?;
        log::debug!("Loaded {} page(s) through pdfium", pages.len());
        Ok(pages)
    }

    fn send(&self, job: Job) -> Result<()> {
        self.jobs.send(job).map_err(|_| ConvertError::WorkerGone)
    }
}

/// Start a render thread and describe every page of `bytes`
pub fn load_pdf_pages(bytes: Vec<u8>) -> Result<Vec<PdfiumPage>> {
    PdfiumRenderer::spawn()?.load_pages(bytes)
}

/// One page of a PDF held in memory, rendered on its renderer's thread
#[derive(Debug, Clone)]
pub struct PdfiumPage {
    renderer: PdfiumRenderer,
    bytes: Arc<Vec<u8>>,
    index: u16,
    size_pt: (f32, f32),
}

impl PdfiumPage {
    pub fn index(&self) -> usize {
        self.index as usize
    }
}

impl RasterPage for PdfiumPage {
    fn page_size_pt(&self) -> (f32, f32) {
        self.size_pt
    }

    fn render(&self, scale: f32) -> Result<RgbaImage> {
        let (width, height) = surface_size(self.size_pt, scale);
        check_surface(width, height).map_err(|e| e.at_page(self.index()))?;

        let (reply, reply_rx) = mpsc::channel();
        self.renderer.send(Job::Render {
            bytes: Arc::clone(&self.bytes),
            index: self.index,
            width,
            height,
            reply,
        })?;
        reply_rx
            .recv()
            .map_err(|_| ConvertError::WorkerGone)?
            .map_err(|e| e.at_page(self.index()))
    }
}

fn page_sizes(pdfium: &Pdfium, bytes: &[u8]) -> std::result::Result<Vec<(f32, f32)>, String> {
    let document = pdfium
        .load_pdf_from_byte_slice(bytes, None)
        .map_err(|e| e.to_string())?;
    let sizes = document
        .pages()
        .iter()
        .map(|page| (page.width().value, page.height().value))
        .collect();
    Ok(sizes)
}

fn render_page(
    pdfium: &Pdfium,
    bytes: &[u8],
    index: u16,
    width: u32,
    height: u32,
) -> Result<RgbaImage> {
    let failure = |e: PdfiumError| ConvertError::PageRenderFailure {
        page_index: index as usize,
        reason: e.to_string(),
    };

    let document = pdfium
        .load_pdf_from_byte_slice(bytes, None)
        .map_err(failure)?;
    let page = document.pages().get(index).map_err(failure)?;

    let config = PdfRenderConfig::new().set_target_size(width as i32, height as i32);
    let bitmap = page.render_with_config(&config).map_err(failure)?;
    let rgba_data = bitmap.as_rgba_bytes().to_vec();
    let (out_w, out_h) = (bitmap.width() as u32, bitmap.height() as u32);

    RgbaImage::from_raw(out_w, out_h, rgba_data).ok_or_else(|| {
        ConvertError::PageRenderFailure {
            page_index: index as usize,
            reason: format!("pdfium returned a malformed {}x{} bitmap", out_w, out_h),
        }
    })
}
