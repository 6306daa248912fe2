//! Admission of incoming files by declared type

use crate::constants::{PDF_MAGIC, PDF_MIME};
use crate::types::SourceImage;

/// A file as handed over by the caller
#[derive(Debug, Clone)]
pub struct IncomingFile {
    pub name: String,
    pub mime: String,
    pub bytes: Vec<u8>,
}

impl IncomingFile {
    pub fn new(name: impl Into<String>, mime: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            mime: mime.into(),
            bytes,
        }
    }

    pub fn into_source_image(self) -> SourceImage {
        SourceImage::new(self.name, self.mime, self.bytes)
    }
}

/// Which kind of file an operation accepts
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MimeFamily {
    /// `image/*`
    Image,
    /// `application/pdf`
    Pdf,
}

/// How far to trust a declared PDF type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SniffPolicy {
    #[default]
    DeclaredType,
    /// Also require the `%PDF-` header
    MagicBytes,
}

#[derive(Debug, Default)]
pub struct Ingested {
    pub accepted: Vec<IncomingFile>,
    pub skipped: usize,
}

impl MimeFamily {
    pub fn accepts(self, file: &IncomingFile, policy: SniffPolicy) -> bool {
        let mime = file.mime.trim().to_ascii_lowercase();
        match self {
            MimeFamily::Image => mime.starts_with("image/"),
            MimeFamily::Pdf => {
                mime == PDF_MIME
                    && (policy == SniffPolicy::DeclaredType || file.bytes.starts_with(PDF_MAGIC))
            }
        }
    }
}

/// Keep the files that belong to `family`, counting the rest
pub fn ingest(files: Vec<IncomingFile>, family: MimeFamily, policy: SniffPolicy) -> Ingested {
    let mut ingested = Ingested::default();
    for file in files {
        if family.accepts(&file, policy) {
            ingested.accepted.push(file);
        } else {
            log::warn!("Skipping {} ({}): not {:?}", file.name, file.mime, family);
            ingested.skipped += 1;
        }
    }
    ingested
}

#[cfg(test)]
mod tests {
    use super::*;

    fn file(name: &str, mime: &str, bytes: &[u8]) -> IncomingFile {
        IncomingFile::new(name, mime, bytes.to_vec())
    }

    #[test]
    fn test_image_family() {
        let files = vec![
            file("a.png", "image/png", b""),
            file("b.pdf", "application/pdf", b"%PDF-1.7"),
            file("c.JPG", "IMAGE/JPEG", b""),
            file("d.txt", "text/plain", b""),
        ];
        let result = ingest(files, MimeFamily::Image, SniffPolicy::default());
        let names: Vec<_> = result.accepted.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, vec!["a.png", "c.JPG"]);
        assert_eq!(result.skipped, 2);
    }

    #[test]
    fn test_pdf_declared_type_is_trusted() {
        let files = vec![
            file("a.pdf", "application/pdf", b"not really"),
            file("b.png", "image/png", b"%PDF-1.4"),
        ];
        let result = ingest(files, MimeFamily::Pdf, SniffPolicy::DeclaredType);
        assert_eq!(result.accepted.len(), 1);
        assert_eq!(result.accepted[0].name, "a.pdf");
        assert_eq!(result.skipped, 1);
    }

    #[test]
    fn test_pdf_magic_bytes_policy() {
        let files = vec![
            file("a.pdf", "application/pdf", b"not really"),
            file("b.pdf", "application/pdf", b"%PDF-1.4\n..."),
        ];
        let result = ingest(files, MimeFamily::Pdf, SniffPolicy::MagicBytes);
        assert_eq!(result.accepted.len(), 1);
        assert_eq!(result.accepted[0].name, "b.pdf");
        assert_eq!(result.skipped, 1);
    }
}
