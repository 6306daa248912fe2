//! Reading inputs from disk and writing documents back

use std::path::Path;

use image::ImageFormat;
use lopdf::Document;

use crate::constants::PDF_MIME;
use crate::ingest::IncomingFile;
use crate::types::*;

/// Load a single PDF document
pub async fn load_pdf(path: impl AsRef<Path>) -> Result<Document> {
    let path = path.as_ref().to_owned();
    let bytes = tokio::fs::read(&path).await?;
    let doc = tokio::task::spawn_blocking(move || Document::load_mem(&bytes)).await??;
    Ok(doc)
}

/// Load multiple PDF documents
pub async fn load_multiple_pdfs(paths: &[impl AsRef<Path>]) -> Result<Vec<Document>> {
    let mut documents = Vec::new();
    for path in paths {
        documents.push(load_pdf(path).await?);
    }
    Ok(documents)
}

/// Save a document to disk
pub async fn save_pdf(doc: Document, path: impl AsRef<Path>) -> Result<()> {
    let path = path.as_ref().to_owned();
    let bytes = tokio::task::spawn_blocking(move || document_to_bytes(doc)).await??;
    tokio::fs::write(&path, bytes).await?;
    Ok(())
}

/// Serialize a document to PDF bytes
pub fn document_to_bytes(mut doc: Document) -> Result<Vec<u8>> {
    let mut writer = Vec::new();
    doc.save_to(&mut writer)?;
    Ok(writer)
}

/// Read a file, declaring its MIME type from the extension.
///
/// Unknown extensions are declared as `application/octet-stream`, which the
/// ingestion filter then skips.
pub async fn read_incoming(path: impl AsRef<Path>) -> Result<IncomingFile> {
    let path = path.as_ref();
    let bytes = tokio::fs::read(path).await?;
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    Ok(IncomingFile::new(name, mime_from_path(path), bytes))
}

pub fn mime_from_path(path: &Path) -> &'static str {
    let is_pdf = path
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("pdf"));
    if is_pdf {
        return PDF_MIME;
    }
    ImageFormat::from_path(path)
        .map(|format| format.to_mime_type())
        .unwrap_or("application/octet-stream")
}
