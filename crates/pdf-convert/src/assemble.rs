//! Images-to-PDF assembly

use std::sync::Arc;

use lopdf::Document;

use crate::io::document_to_bytes;
use crate::layout::{Page, PageGeometry, compose_page};
use crate::render::{ImageXObject, finish_document, render_page};
use crate::types::{ConvertError, FitMode, Result, SourceImage};
use crate::worker::WorkerPool;

/// An ordered set of composed pages sharing one geometry
#[derive(Debug, Clone)]
pub struct AssembledDocument {
    pages: Vec<Page>,
    geometry: PageGeometry,
}

impl AssembledDocument {
    pub fn pages(&self) -> &[Page] {
        &self.pages
    }

    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    pub fn geometry(&self) -> &PageGeometry {
        &self.geometry
    }

    /// Build the PDF on the current thread
    pub fn to_pdf(&self, title: Option<&str>) -> Result<Document> {
        let images = self
            .pages
            .iter()
            .map(|page| ImageXObject::encode(page.image(), page.embed_kind()))
            .collect::<Result<Vec<_>>>()?;
        Ok(self.build(images, title))
    }

    /// Encode page images on the worker pool and serialize the PDF
    pub async fn write_pdf(&self, pool: &WorkerPool, title: Option<&str>) -> Result<Vec<u8>> {
        let handles: Vec<_> = self
            .pages
            .iter()
            .map(|page| {
                let image = Arc::clone(page.image());
                let kind = page.embed_kind();
                pool.dispatch(move || ImageXObject::encode(&image, kind))
            })
            .collect();

        let mut images = Vec::with_capacity(handles.len());
        for handle in handles {
            images.push(handle.join().await?);
        }

        let doc = self.build(images, title);
        let bytes = pool.dispatch(move || document_to_bytes(doc)).join().await?;
        log::info!(
            "Wrote {} page(s), {} bytes",
            self.pages.len(),
            bytes.len()
        );
        Ok(bytes)
    }

    fn build(&self, images: Vec<ImageXObject>, title: Option<&str>) -> Document {
        let mut output = Document::with_version("1.7");
        let pages_tree_id = output.new_object_id();

        let page_ids: Vec<_> = self
            .pages
            .iter()
            .zip(images)
            .map(|(page, image)| render_page(&mut output, page, image, pages_tree_id))
            .collect();

        finish_document(&mut output, pages_tree_id, &page_ids, title);
        output
    }
}

/// Lay out one page per image, in input order.
///
/// Pages are composed concurrently on `pool`. Any failure fails the whole
/// assembly; pages not yet composed are abandoned.
pub async fn assemble(
    pool: &WorkerPool,
    images: &[Arc<SourceImage>],
    geometry: PageGeometry,
    mode: FitMode,
) -> Result<AssembledDocument> {
    if images.is_empty() {
        return Err(ConvertError::EmptyInput);
    }

    log::debug!(
        "Composing {} page(s) on {} worker(s)",
        images.len(),
        pool.size()
    );
    let handles: Vec<_> = images
        .iter()
        .map(|image| {
            let image = Arc::clone(image);
            pool.dispatch(move || compose_page(&image, &geometry, mode))
        })
        .collect();

    let mut pages = Vec::with_capacity(handles.len());
    for handle in handles {
        pages.push(handle.join().await?);
    }

    log::info!("Assembled {} page(s)", pages.len());
    Ok(AssembledDocument { pages, geometry })
}
